use std::path::PathBuf;

const DB_ENV: &str = "CAREER_DB";
const LOG_ENV: &str = "CAREER_LOG";
const DB_FILE: &str = "career.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
}

impl Config {
    /// `--db` wins over `CAREER_DB`, which wins over the platform data dir.
    pub fn resolve(cli_db: Option<PathBuf>) -> Self {
        Self::resolve_with(cli_db, |key| std::env::var(key).ok())
    }

    fn resolve_with(cli_db: Option<PathBuf>, env: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = cli_db
            .or_else(|| env(DB_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(default_db_path);
        let log_level = env(LOG_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "warn".to_string());
        Self { db_path, log_level }
    }
}

fn default_db_path() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "career") {
        proj_dirs.data_dir().join(DB_FILE)
    } else {
        PathBuf::from(DB_FILE)
    }
}
