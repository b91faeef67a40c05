mod config;
mod db;
mod models;
mod store;
mod tui;
mod views;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use config::Config;
use db::Database;
use models::{
    ApplicationPatch, ApplicationStatus, CompanyPatch, JobPatch, NewApplication, NewCompany,
    NewJob, NewResume, ResumeContent, ResumeFile, ResumePatch,
};
use std::path::{Path, PathBuf};
use store::{Deletion, EntityStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use views::{ApplicationFilter, Dashboard, JobFilter};

#[derive(Parser)]
#[command(name = "career")]
#[command(about = "Track companies, job postings, resumes, and applications")]
struct Cli {
    /// Path to the data file (defaults to $CAREER_DB or the platform data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage job postings
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Manage resumes
    Resume {
        #[command(subcommand)]
        command: ResumeCommands,
    },

    /// Manage applications
    App {
        #[command(subcommand)]
        command: AppCommands,
    },

    /// Show totals, status breakdown, recent activity, and deadlines
    Dashboard,

    /// Browse jobs interactively
    Browse {
        /// Match title, company, or location
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by status
        #[arg(long)]
        status: Option<ApplicationStatus>,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Add a job posting
    Add {
        /// Job title
        title: String,

        /// Company name
        #[arg(short, long)]
        company: String,

        #[command(flatten)]
        fields: JobFields,
    },

    /// List jobs
    List {
        /// Match title, company, or location
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by status (saved, applied, interviewing, offer, rejected, withdrawn)
        #[arg(long)]
        status: Option<ApplicationStatus>,
    },

    /// Show job details
    Show {
        /// Job ID (or unique prefix)
        id: String,
    },

    /// Change job fields
    Update {
        /// Job ID (or unique prefix)
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        company: Option<String>,

        #[command(flatten)]
        fields: JobFields,

        /// Remove the application deadline
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,

        /// Remove the salary
        #[arg(long, conflicts_with = "salary")]
        clear_salary: bool,

        /// Remove the notes
        #[arg(long, conflicts_with = "notes")]
        clear_notes: bool,

        /// Remove all responsibilities
        #[arg(long, conflicts_with = "responsibilities")]
        clear_responsibilities: bool,

        /// Remove all qualifications
        #[arg(long, conflicts_with = "qualifications")]
        clear_qualifications: bool,
    },

    /// Set job status
    Status {
        /// Job ID (or unique prefix)
        id: String,

        /// New status
        status: ApplicationStatus,
    },

    /// Delete a job and its applications
    Delete {
        /// Job ID (or unique prefix)
        id: String,
    },
}

#[derive(Args)]
struct JobFields {
    #[arg(short, long)]
    location: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    /// Responsibility (repeatable)
    #[arg(long = "responsibility")]
    responsibilities: Vec<String>,

    /// Qualification (repeatable)
    #[arg(long = "qualification")]
    qualifications: Vec<String>,

    /// Date posted (YYYY-MM-DD)
    #[arg(long)]
    posted: Option<NaiveDate>,

    /// Application deadline (YYYY-MM-DD)
    #[arg(long)]
    deadline: Option<NaiveDate>,

    #[arg(long)]
    salary: Option<String>,

    /// Posting URL
    #[arg(short, long)]
    url: Option<String>,

    #[arg(long)]
    status: Option<ApplicationStatus>,

    #[arg(short, long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Add a company
    Add {
        /// Company name
        name: String,

        #[arg(short, long, default_value = "")]
        website: String,

        /// Careers page URL
        #[arg(long, default_value = "")]
        careers_url: String,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List companies
    List {
        /// Match company name
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show company details and its jobs
    Show {
        /// Company ID (or unique prefix)
        id: String,
    },

    /// Change company fields
    Update {
        /// Company ID (or unique prefix)
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        website: Option<String>,

        #[arg(long)]
        careers_url: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        /// Remove the notes
        #[arg(long, conflicts_with = "notes")]
        clear_notes: bool,
    },

    /// Delete a company
    Delete {
        /// Company ID (or unique prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum ResumeCommands {
    /// Add a resume
    Add {
        /// Name for this resume
        name: String,

        /// Structured content as JSON
        #[arg(short, long)]
        content: Option<PathBuf>,

        /// Document to attach (PDF, DOCX, ...)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List resumes
    List,

    /// Show a resume
    Show {
        /// Resume ID (or unique prefix)
        id: String,
    },

    /// Rename a resume or replace its content
    Update {
        /// Resume ID (or unique prefix)
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// Structured content as JSON
        #[arg(short, long)]
        content: Option<PathBuf>,
    },

    /// Attach a document to a resume
    Attach {
        /// Resume ID (or unique prefix)
        id: String,

        /// Document path
        file: PathBuf,
    },

    /// Remove the attached document
    Detach {
        /// Resume ID (or unique prefix)
        id: String,
    },

    /// Write the attached document to disk
    Export {
        /// Resume ID (or unique prefix)
        id: String,

        /// Output path (defaults to the original file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a resume and its applications
    Delete {
        /// Resume ID (or unique prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum AppCommands {
    /// Track an application
    Add {
        /// Job ID (or unique prefix)
        #[arg(short, long)]
        job: String,

        /// Resume ID (or unique prefix)
        #[arg(short, long)]
        resume: String,

        #[arg(long, default_value = "applied")]
        status: ApplicationStatus,

        /// Date applied (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        applied: Option<NaiveDate>,

        #[arg(long)]
        follow_up: Option<NaiveDate>,

        #[arg(long)]
        interview: Option<NaiveDate>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List applications
    List {
        #[arg(long)]
        status: Option<ApplicationStatus>,

        /// Only applications for this job
        #[arg(short, long)]
        job: Option<String>,

        /// Only applications sent with this resume
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Show application details
    Show {
        /// Application ID (or unique prefix)
        id: String,
    },

    /// Change application fields
    Update {
        /// Application ID (or unique prefix)
        id: String,

        /// Move to another job (ID or unique prefix)
        #[arg(short, long)]
        job: Option<String>,

        /// Switch to another resume (ID or unique prefix)
        #[arg(short, long)]
        resume: Option<String>,

        #[arg(long)]
        status: Option<ApplicationStatus>,

        #[arg(long)]
        applied: Option<NaiveDate>,

        #[arg(long)]
        follow_up: Option<NaiveDate>,

        #[arg(long)]
        interview: Option<NaiveDate>,

        #[arg(short, long)]
        notes: Option<String>,

        #[arg(long, conflicts_with = "follow_up")]
        clear_follow_up: bool,

        #[arg(long, conflicts_with = "interview")]
        clear_interview: bool,

        #[arg(long, conflicts_with = "notes")]
        clear_notes: bool,
    },

    /// Delete an application
    Delete {
        /// Application ID (or unique prefix)
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.db);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.log_level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db = Database::open(&config.db_path)?;
    let mut store = EntityStore::load(&db)?;
    info!(
        path = %db.path().display(),
        jobs = store.jobs().len(),
        applications = store.applications().len(),
        "store loaded"
    );

    match cli.command {
        Commands::Job { command } => job_command(command, &mut store, &db)?,
        Commands::Company { command } => company_command(command, &mut store, &db)?,
        Commands::Resume { command } => resume_command(command, &mut store, &db)?,
        Commands::App { command } => app_command(command, &mut store, &db)?,
        Commands::Dashboard => print_dashboard(&store),
        Commands::Browse { search, status } => {
            tui::run_browse(&mut store, &db, &JobFilter { search, status })?;
        }
    }

    Ok(())
}

fn job_command(command: JobCommands, store: &mut EntityStore, db: &Database) -> Result<()> {
    match command {
        JobCommands::Add {
            title,
            company,
            fields,
        } => {
            let new = NewJob {
                location: fields.location.unwrap_or_default(),
                description: fields.description.unwrap_or_default(),
                responsibilities: clean_list(fields.responsibilities),
                qualifications: clean_list(fields.qualifications),
                date_posted: fields.posted.unwrap_or_else(|| Utc::now().date_naive()),
                application_deadline: fields.deadline,
                salary: fields.salary,
                url: fields.url.unwrap_or_default(),
                status: fields.status.unwrap_or(ApplicationStatus::Saved),
                notes: fields.notes,
                ..NewJob::new(title, company)
            };
            let id = store.add_job(new);
            store.save(db)?;
            println!("Added job {}", id);
        }

        JobCommands::List { search, status } => {
            let jobs = JobFilter { search, status }.apply(store.jobs());
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<10} {:<13} {:<30} {:<20} {:<12}",
                    "ID", "STATUS", "TITLE", "COMPANY", "DEADLINE"
                );
                println!("{}", "-".repeat(89));
                for job in jobs {
                    let deadline = job
                        .application_deadline
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<10} {:<13} {:<30} {:<20} {:<12}",
                        short_id(&job.id),
                        job.status,
                        truncate(&job.title, 28),
                        truncate(&job.company, 18),
                        deadline
                    );
                }
            }
        }

        JobCommands::Show { id } => match find_by_id(store.jobs(), &id, |j| &j.id) {
            Some(job) => {
                println!("Job {}", job.id);
                println!("Title: {}", job.title);
                println!("Company: {}", job.company);
                if !job.location.is_empty() {
                    println!("Location: {}", job.location);
                }
                println!("Status: {}", job.status);
                println!("Posted: {}", job.date_posted);
                if let Some(deadline) = job.application_deadline {
                    println!("Deadline: {}", deadline);
                }
                if let Some(salary) = &job.salary {
                    println!("Salary: {}", salary);
                }
                if !job.url.is_empty() {
                    println!("URL: {}", job.url);
                }
                if let Some(notes) = &job.notes {
                    println!("Notes: {}", notes);
                }
                println!("Created: {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));
                println!("Updated: {}", job.updated_at.format("%Y-%m-%d %H:%M:%S"));
                if !job.description.is_empty() {
                    println!("\n--- Description ---\n{}", job.description);
                }
                print_list("Responsibilities", &job.responsibilities);
                print_list("Qualifications", &job.qualifications);

                let applications = views::applications_for_job(store, &job.id);
                if !applications.is_empty() {
                    println!("\nApplications ({}):", applications.len());
                    for app in applications {
                        let labels = views::application_labels(store, app);
                        println!(
                            "  {} - {} on {} with {}",
                            short_id(&app.id),
                            app.status,
                            app.applied_date,
                            labels.resume
                        );
                    }
                }
            }
            None => println!("Job '{}' not found.", id),
        },

        JobCommands::Update {
            id,
            title,
            company,
            fields,
            clear_deadline,
            clear_salary,
            clear_notes,
            clear_responsibilities,
            clear_qualifications,
        } => {
            let Some(full_id) = find_by_id(store.jobs(), &id, |j| &j.id).map(|j| j.id.clone()) else {
                println!("Job '{}' not found.", id);
                return Ok(());
            };
            let patch = JobPatch {
                title,
                company,
                location: fields.location,
                description: fields.description,
                responsibilities: list_update(fields.responsibilities, clear_responsibilities),
                qualifications: list_update(fields.qualifications, clear_qualifications),
                date_posted: fields.posted,
                application_deadline: clearable(fields.deadline, clear_deadline),
                salary: clearable(fields.salary, clear_salary),
                url: fields.url,
                status: fields.status,
                notes: clearable(fields.notes, clear_notes),
            };
            store.update_job(&full_id, patch);
            store.save(db)?;
            println!("Updated job {}", full_id);
        }

        JobCommands::Status { id, status } => {
            let Some(full_id) = find_by_id(store.jobs(), &id, |j| &j.id).map(|j| j.id.clone()) else {
                println!("Job '{}' not found.", id);
                return Ok(());
            };
            store.update_job(&full_id, JobPatch::status(status));
            store.save(db)?;
            println!("Marked job {} as {}.", short_id(&full_id), status);
        }

        JobCommands::Delete { id } => {
            let Some(full_id) = find_by_id(store.jobs(), &id, |j| &j.id).map(|j| j.id.clone()) else {
                println!("Job '{}' not found.", id);
                return Ok(());
            };
            let deletion = store.delete_job(&full_id);
            store.save(db)?;
            report_deletion("job", &full_id, deletion);
        }
    }
    Ok(())
}

fn company_command(command: CompanyCommands, store: &mut EntityStore, db: &Database) -> Result<()> {
    match command {
        CompanyCommands::Add {
            name,
            website,
            careers_url,
            notes,
        } => {
            let id = store.add_company(NewCompany {
                name,
                website,
                careers_url,
                notes,
            });
            store.save(db)?;
            println!("Added company {}", id);
        }

        CompanyCommands::List { search } => {
            let companies = views::search_companies(store, search.as_deref().unwrap_or(""));
            if companies.is_empty() {
                println!("No companies found.");
            } else {
                println!("{:<10} {:<28} {:<30} {:>5}", "ID", "NAME", "WEBSITE", "JOBS");
                println!("{}", "-".repeat(76));
                for company in companies {
                    println!(
                        "{:<10} {:<28} {:<30} {:>5}",
                        short_id(&company.id),
                        truncate(&company.name, 26),
                        truncate(&company.website, 28),
                        views::jobs_for_company(store, company).len()
                    );
                }
            }
        }

        CompanyCommands::Show { id } => match find_by_id(store.companies(), &id, |c| &c.id) {
            Some(company) => {
                println!("Company {}", company.id);
                println!("Name: {}", company.name);
                if !company.website.is_empty() {
                    println!("Website: {}", company.website);
                }
                if !company.careers_url.is_empty() {
                    println!("Careers: {}", company.careers_url);
                }
                if let Some(notes) = &company.notes {
                    println!("Notes: {}", notes);
                }
                println!("Created: {}", company.created_at.format("%Y-%m-%d %H:%M:%S"));
                let jobs = views::jobs_for_company(store, company);
                if !jobs.is_empty() {
                    println!("\nJobs ({}):", jobs.len());
                    for job in jobs {
                        println!("  {} - {} ({})", short_id(&job.id), job.title, job.status);
                    }
                }
            }
            None => println!("Company '{}' not found.", id),
        },

        CompanyCommands::Update {
            id,
            name,
            website,
            careers_url,
            notes,
            clear_notes,
        } => {
            let Some(full_id) = find_by_id(store.companies(), &id, |c| &c.id).map(|c| c.id.clone()) else {
                println!("Company '{}' not found.", id);
                return Ok(());
            };
            store.update_company(
                &full_id,
                CompanyPatch {
                    name,
                    website,
                    careers_url,
                    notes: clearable(notes, clear_notes),
                },
            );
            store.save(db)?;
            println!("Updated company {}", full_id);
        }

        CompanyCommands::Delete { id } => {
            let Some(full_id) = find_by_id(store.companies(), &id, |c| &c.id).map(|c| c.id.clone()) else {
                println!("Company '{}' not found.", id);
                return Ok(());
            };
            let deletion = store.delete_company(&full_id);
            store.save(db)?;
            report_deletion("company", &full_id, deletion);
        }
    }
    Ok(())
}

fn resume_command(command: ResumeCommands, store: &mut EntityStore, db: &Database) -> Result<()> {
    match command {
        ResumeCommands::Add {
            name,
            content,
            file,
        } => {
            let content = match content {
                Some(path) => read_resume_content(&path)?,
                None => ResumeContent::default(),
            };
            let file = file.as_deref().map(read_attachment).transpose()?;
            let id = store.add_resume(NewResume {
                name: name.clone(),
                content,
                file,
            });
            store.save(db)?;
            println!("Added resume '{}' ({})", name, id);
        }

        ResumeCommands::List => {
            if store.resumes().is_empty() {
                println!("No resumes found.");
            } else {
                println!("{:<10} {:<24} {:<20} {:>5} {:<20}", "ID", "NAME", "FILE", "APPS", "UPDATED");
                println!("{}", "-".repeat(83));
                for resume in store.resumes() {
                    let file = resume.file.as_ref().map(|f| f.name.as_str()).unwrap_or("-");
                    println!(
                        "{:<10} {:<24} {:<20} {:>5} {:<20}",
                        short_id(&resume.id),
                        truncate(&resume.name, 22),
                        truncate(file, 18),
                        views::applications_for_resume(store, &resume.id).len(),
                        resume.updated_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }

        ResumeCommands::Show { id } => match find_by_id(store.resumes(), &id, |r| &r.id) {
            Some(resume) => {
                println!("Resume '{}' ({})", resume.name, resume.id);
                if let Some(file) = &resume.file {
                    println!("File: {} ({})", file.name, file.media_type);
                }
                println!("Created: {}", resume.created_at.format("%Y-%m-%d %H:%M:%S"));
                println!("Updated: {}", resume.updated_at.format("%Y-%m-%d %H:%M:%S"));
                print_resume_content(&resume.content);

                let applications = views::applications_for_resume(store, &resume.id);
                if !applications.is_empty() {
                    println!("\nApplications ({}):", applications.len());
                    for app in applications {
                        let labels = views::application_labels(store, app);
                        println!(
                            "  {} - {} at {} ({})",
                            short_id(&app.id),
                            labels.position,
                            labels.company,
                            app.status
                        );
                    }
                }
            }
            None => println!("Resume '{}' not found.", id),
        },

        ResumeCommands::Update { id, name, content } => {
            let Some(full_id) = find_by_id(store.resumes(), &id, |r| &r.id).map(|r| r.id.clone()) else {
                println!("Resume '{}' not found.", id);
                return Ok(());
            };
            let content = content.as_deref().map(read_resume_content).transpose()?;
            store.update_resume(
                &full_id,
                ResumePatch {
                    name,
                    content,
                    file: None,
                },
            );
            store.save(db)?;
            println!("Updated resume {}", full_id);
        }

        ResumeCommands::Attach { id, file } => {
            let Some(full_id) = find_by_id(store.resumes(), &id, |r| &r.id).map(|r| r.id.clone()) else {
                println!("Resume '{}' not found.", id);
                return Ok(());
            };
            let attachment = read_attachment(&file)?;
            let name = attachment.name.clone();
            store.update_resume(
                &full_id,
                ResumePatch {
                    file: Some(Some(attachment)),
                    ..ResumePatch::default()
                },
            );
            store.save(db)?;
            println!("Attached '{}' to resume {}", name, short_id(&full_id));
        }

        ResumeCommands::Detach { id } => {
            let Some(full_id) = find_by_id(store.resumes(), &id, |r| &r.id).map(|r| r.id.clone()) else {
                println!("Resume '{}' not found.", id);
                return Ok(());
            };
            store.update_resume(
                &full_id,
                ResumePatch {
                    file: Some(None),
                    ..ResumePatch::default()
                },
            );
            store.save(db)?;
            println!("Removed attachment from resume {}", short_id(&full_id));
        }

        ResumeCommands::Export { id, output } => {
            let Some(resume) = find_by_id(store.resumes(), &id, |r| &r.id) else {
                println!("Resume '{}' not found.", id);
                return Ok(());
            };
            let Some(file) = &resume.file else {
                println!("Resume '{}' has no attached file.", resume.name);
                return Ok(());
            };
            let bytes = decode_attachment(file)?;
            let out_path = output.unwrap_or_else(|| PathBuf::from(&file.name));
            std::fs::write(&out_path, &bytes)
                .with_context(|| format!("Failed to write to {}", out_path.display()))?;
            println!("Saved {} bytes to {}", bytes.len(), out_path.display());
        }

        ResumeCommands::Delete { id } => {
            let Some(full_id) = find_by_id(store.resumes(), &id, |r| &r.id).map(|r| r.id.clone()) else {
                println!("Resume '{}' not found.", id);
                return Ok(());
            };
            let deletion = store.delete_resume(&full_id);
            store.save(db)?;
            report_deletion("resume", &full_id, deletion);
        }
    }
    Ok(())
}

fn app_command(command: AppCommands, store: &mut EntityStore, db: &Database) -> Result<()> {
    match command {
        AppCommands::Add {
            job,
            resume,
            status,
            applied,
            follow_up,
            interview,
            notes,
        } => {
            // References are not required to exist; unmatched ids are stored verbatim.
            let job_id = resolve_reference(store.jobs(), &job, |j| &j.id);
            let resume_id = resolve_reference(store.resumes(), &resume, |r| &r.id);
            let id = store.add_application(NewApplication {
                job_id,
                resume_id,
                status,
                applied_date: applied.unwrap_or_else(|| Utc::now().date_naive()),
                follow_up_date: follow_up,
                interview_date: interview,
                notes,
            });
            store.save(db)?;
            println!("Added application {}", id);
        }

        AppCommands::List {
            status,
            job,
            resume,
        } => {
            let filter = ApplicationFilter {
                status,
                job_id: job.map(|j| resolve_reference(store.jobs(), &j, |j| &j.id)),
                resume_id: resume.map(|r| resolve_reference(store.resumes(), &r, |r| &r.id)),
            };
            let applications = filter.apply(store.applications());
            if applications.is_empty() {
                println!("No applications found.");
            } else {
                println!(
                    "{:<10} {:<13} {:<26} {:<18} {:<11} {:<16}",
                    "ID", "STATUS", "POSITION", "COMPANY", "APPLIED", "RESUME"
                );
                println!("{}", "-".repeat(99));
                for app in applications {
                    let labels = views::application_labels(store, app);
                    println!(
                        "{:<10} {:<13} {:<26} {:<18} {:<11} {:<16}",
                        short_id(&app.id),
                        app.status,
                        truncate(labels.position, 24),
                        truncate(labels.company, 16),
                        app.applied_date.to_string(),
                        truncate(labels.resume, 16)
                    );
                }
            }
        }

        AppCommands::Show { id } => match find_by_id(store.applications(), &id, |a| &a.id) {
            Some(app) => {
                let labels = views::application_labels(store, app);
                println!("Application {}", app.id);
                println!("Position: {}", labels.position);
                println!("Company: {}", labels.company);
                println!("Resume: {}", labels.resume);
                println!("Status: {}", app.status);
                println!("Applied: {}", app.applied_date);
                if let Some(date) = app.follow_up_date {
                    println!("Follow up: {}", date);
                }
                if let Some(date) = app.interview_date {
                    println!("Interview: {}", date);
                }
                if let Some(notes) = &app.notes {
                    println!("Notes: {}", notes);
                }
                println!("Created: {}", app.created_at.format("%Y-%m-%d %H:%M:%S"));
                println!("Updated: {}", app.updated_at.format("%Y-%m-%d %H:%M:%S"));
            }
            None => println!("Application '{}' not found.", id),
        },

        AppCommands::Update {
            id,
            job,
            resume,
            status,
            applied,
            follow_up,
            interview,
            notes,
            clear_follow_up,
            clear_interview,
            clear_notes,
        } => {
            let Some(full_id) = find_by_id(store.applications(), &id, |a| &a.id).map(|a| a.id.clone()) else {
                println!("Application '{}' not found.", id);
                return Ok(());
            };
            let job_id = job.map(|j| resolve_reference(store.jobs(), &j, |j| &j.id));
            let resume_id = resume.map(|r| resolve_reference(store.resumes(), &r, |r| &r.id));
            store.update_application(
                &full_id,
                ApplicationPatch {
                    job_id,
                    resume_id,
                    status,
                    applied_date: applied,
                    follow_up_date: clearable(follow_up, clear_follow_up),
                    interview_date: clearable(interview, clear_interview),
                    notes: clearable(notes, clear_notes),
                },
            );
            store.save(db)?;
            println!("Updated application {}", full_id);
        }

        AppCommands::Delete { id } => {
            let Some(full_id) = find_by_id(store.applications(), &id, |a| &a.id).map(|a| a.id.clone()) else {
                println!("Application '{}' not found.", id);
                return Ok(());
            };
            let deletion = store.delete_application(&full_id);
            store.save(db)?;
            report_deletion("application", &full_id, deletion);
        }
    }
    Ok(())
}

fn print_dashboard(store: &EntityStore) {
    let dashboard = Dashboard::build(store);

    println!("Jobs:         {}", dashboard.total_jobs);
    println!("Applications: {}", dashboard.total_applications);
    println!("Resumes:      {}", dashboard.total_resumes);
    println!("Companies:    {}", dashboard.total_companies);

    println!("\nApplication status:");
    for (status, count) in &dashboard.status_counts {
        println!("  {:<13} {:>4}", status, count);
    }

    println!("\nRecent applications:");
    if dashboard.recent_applications.is_empty() {
        println!("  (none)");
    }
    for app in &dashboard.recent_applications {
        let labels = views::application_labels(store, app);
        println!(
            "  {:<13} {} at {} (updated {})",
            app.status,
            labels.position,
            labels.company,
            app.updated_at.format("%Y-%m-%d")
        );
    }

    println!("\nUpcoming deadlines:");
    if dashboard.upcoming_deadlines.is_empty() {
        println!("  (none)");
    }
    for job in &dashboard.upcoming_deadlines {
        if let Some(deadline) = job.application_deadline {
            println!("  {}  {} at {}", deadline, job.title, job.company);
        }
    }
}

fn print_resume_content(content: &ResumeContent) {
    let info = &content.personal_info;
    if !info.name.is_empty() {
        println!("\n{}", info.name);
        let contact: Vec<&str> = [&info.email, &info.phone, &info.location]
            .into_iter()
            .map(String::as_str)
            .chain(
                [&info.website, &info.linkedin, &info.github]
                    .into_iter()
                    .filter_map(|v| v.as_deref()),
            )
            .filter(|v| !v.is_empty())
            .collect();
        if !contact.is_empty() {
            println!("{}", contact.join(" | "));
        }
    }
    if !content.summary.is_empty() {
        println!("\n--- Summary ---\n{}", content.summary);
    }
    if !content.experience.is_empty() {
        println!("\n--- Experience ---");
        for exp in &content.experience {
            println!(
                "{} at {} ({})",
                exp.title,
                exp.company,
                date_range(&exp.start_date, exp.end_date.as_deref(), exp.current)
            );
            for achievement in &exp.achievements {
                println!("  - {}", achievement);
            }
        }
    }
    if !content.education.is_empty() {
        println!("\n--- Education ---");
        for edu in &content.education {
            println!(
                "{} in {}, {} ({})",
                edu.degree,
                edu.field,
                edu.institution,
                date_range(&edu.start_date, edu.end_date.as_deref(), edu.current)
            );
        }
    }
    if !content.skills.is_empty() {
        println!("\n--- Skills ---\n{}", content.skills.join(", "));
    }
    if !content.certifications.is_empty() {
        println!("\n--- Certifications ---");
        for cert in &content.certifications {
            println!("{} ({}, {})", cert.name, cert.issuer, cert.date);
        }
    }
    if !content.projects.is_empty() {
        println!("\n--- Projects ---");
        for project in &content.projects {
            println!("{}: {}", project.name, project.description);
            if !project.technologies.is_empty() {
                println!("  {}", project.technologies.join(", "));
            }
        }
    }
}

fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n--- {} ---", heading);
    for item in items {
        println!("  - {}", item);
    }
}

fn report_deletion(kind: &str, id: &str, deletion: Deletion) {
    if deletion.cascaded_applications > 0 {
        println!(
            "Deleted {} {} and {} application(s).",
            kind,
            short_id(id),
            deletion.cascaded_applications
        );
    } else {
        println!("Deleted {} {}.", kind, short_id(id));
    }
}

fn read_resume_content(path: &Path) -> Result<ResumeContent> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resume content: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid resume content JSON: {}", path.display()))
}

fn read_attachment(path: &Path) -> Result<ResumeFile> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read resume file: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());
    Ok(ResumeFile {
        media_type: media_type_for(path).to_string(),
        name,
        data: BASE64.encode(bytes),
    })
}

fn decode_attachment(file: &ResumeFile) -> Result<Vec<u8>> {
    BASE64
        .decode(file.data.as_bytes())
        .with_context(|| format!("Attachment '{}' is not valid base64", file.name))
}

fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}

/// Exact id, or a prefix that matches exactly one entity.
fn find_by_id<'a, T>(items: &'a [T], query: &str, id: impl Fn(&T) -> &String) -> Option<&'a T> {
    if let Some(item) = items.iter().find(|item| id(*item) == query) {
        return Some(item);
    }
    let mut matches = items.iter().filter(|item| id(*item).starts_with(query));
    match (matches.next(), matches.next()) {
        (Some(item), None) if !query.is_empty() => Some(item),
        _ => None,
    }
}

fn resolve_reference<T>(items: &[T], query: &str, id: impl Fn(&T) -> &String) -> String {
    find_by_id(items, query, &id)
        .map(|item| id(item).clone())
        .unwrap_or_else(|| query.to_string())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    if items.is_empty() { None } else { Some(items) }
}

fn list_update(items: Vec<String>, clear: bool) -> Option<Vec<String>> {
    if clear { Some(Vec::new()) } else { non_empty(clean_list(items)) }
}

fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

fn date_range(start: &str, end: Option<&str>, current: bool) -> String {
    match (end, current) {
        (_, true) => format!("{} - present", start),
        (Some(end), false) => format!("{} - {}", start, end),
        (None, false) => start.to_string(),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
