use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::Database;
use crate::models::{
    Application, ApplicationPatch, Company, CompanyPatch, Job, JobPatch, NewApplication,
    NewCompany, NewJob, NewResume, Resume, ResumePatch,
};

pub const STORAGE_KEY: &str = "career-tracker-storage";
const STORAGE_VERSION: u32 = 0;

/// The four collections, exactly as they are persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collections {
    pub jobs: Vec<Job>,
    pub resumes: Vec<Resume>,
    pub applications: Vec<Application>,
    pub companies: Vec<Company>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    state: Collections,
    #[serde(default)]
    version: u32,
}

/// Result of a delete: whether the target existed and how many
/// applications went with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deletion {
    pub removed: bool,
    pub cascaded_applications: usize,
}

/// In-memory owner of all tracker data. Mutations never fail; persistence
/// is explicit through [`EntityStore::load`] and [`EntityStore::save`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    data: Collections,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collections(data: Collections) -> Self {
        Self { data }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.data.jobs
    }

    pub fn resumes(&self) -> &[Resume] {
        &self.data.resumes
    }

    pub fn applications(&self) -> &[Application] {
        &self.data.applications
    }

    pub fn companies(&self) -> &[Company] {
        &self.data.companies
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.data.jobs.iter().find(|j| j.id == id)
    }

    pub fn resume(&self, id: &str) -> Option<&Resume> {
        self.data.resumes.iter().find(|r| r.id == id)
    }

    pub fn application(&self, id: &str) -> Option<&Application> {
        self.data.applications.iter().find(|a| a.id == id)
    }

    pub fn company(&self, id: &str) -> Option<&Company> {
        self.data.companies.iter().find(|c| c.id == id)
    }

    // --- Persistence ---

    /// Reads the store from `db`. An absent or unreadable record yields an
    /// empty store; only storage failures are errors.
    pub fn load(db: &Database) -> Result<Self> {
        let Some(raw) = db.read(STORAGE_KEY)? else {
            debug!("no saved state, starting empty");
            return Ok(Self::new());
        };
        Ok(Self::from_json(&raw))
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        let json = self.to_json()?;
        db.write(STORAGE_KEY, &json)
    }

    pub fn to_json(&self) -> Result<String> {
        let envelope = Envelope {
            state: self.data.clone(),
            version: STORAGE_VERSION,
        };
        serde_json::to_string(&envelope).context("Failed to serialize store")
    }

    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<Envelope>(raw) {
            Ok(envelope) if envelope.version > STORAGE_VERSION => {
                warn!(version = envelope.version, "saved state is from a newer version, starting empty");
                Self::new()
            }
            Ok(envelope) => Self::from_collections(envelope.state),
            Err(e) => {
                warn!(error = %e, "saved state is malformed, starting empty");
                Self::new()
            }
        }
    }

    // --- Jobs ---

    pub fn add_job(&mut self, new: NewJob) -> String {
        let id = new_id();
        let now = Utc::now();
        self.data.jobs.push(Job {
            id: id.clone(),
            title: new.title,
            company: new.company,
            location: new.location,
            description: new.description,
            responsibilities: new.responsibilities,
            qualifications: new.qualifications,
            date_posted: new.date_posted,
            application_deadline: new.application_deadline,
            salary: new.salary,
            url: new.url,
            status: new.status,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        });
        debug!(%id, "job added");
        id
    }

    /// Returns false when no job has `id`.
    pub fn update_job(&mut self, id: &str, patch: JobPatch) -> bool {
        let Some(job) = self.data.jobs.iter_mut().find(|j| j.id == id) else {
            debug!(id, "update of unknown job ignored");
            return false;
        };
        patch.apply(job);
        job.updated_at = touch(job.updated_at);
        debug!(id, "job updated");
        true
    }

    /// Removes the job and every application pointing at it. Applications
    /// are dropped even when the job itself is already gone.
    pub fn delete_job(&mut self, id: &str) -> Deletion {
        let removed = remove_where(&mut self.data.jobs, |j| j.id == id) > 0;
        let cascaded_applications = remove_where(&mut self.data.applications, |a| a.job_id == id);
        debug!(id, removed, cascaded_applications, "job deleted");
        Deletion {
            removed,
            cascaded_applications,
        }
    }

    // --- Resumes ---

    pub fn add_resume(&mut self, new: NewResume) -> String {
        let id = new_id();
        let now = Utc::now();
        self.data.resumes.push(Resume {
            id: id.clone(),
            name: new.name,
            content: new.content,
            file: new.file,
            created_at: now,
            updated_at: now,
        });
        debug!(%id, "resume added");
        id
    }

    pub fn update_resume(&mut self, id: &str, patch: ResumePatch) -> bool {
        let Some(resume) = self.data.resumes.iter_mut().find(|r| r.id == id) else {
            debug!(id, "update of unknown resume ignored");
            return false;
        };
        patch.apply(resume);
        resume.updated_at = touch(resume.updated_at);
        debug!(id, "resume updated");
        true
    }

    /// Removes the résumé and every application that was sent with it.
    pub fn delete_resume(&mut self, id: &str) -> Deletion {
        let removed = remove_where(&mut self.data.resumes, |r| r.id == id) > 0;
        let cascaded_applications = remove_where(&mut self.data.applications, |a| a.resume_id == id);
        debug!(id, removed, cascaded_applications, "resume deleted");
        Deletion {
            removed,
            cascaded_applications,
        }
    }

    // --- Applications ---

    /// Job and résumé ids are stored as given, existing or not.
    pub fn add_application(&mut self, new: NewApplication) -> String {
        let id = new_id();
        let now = Utc::now();
        self.data.applications.push(Application {
            id: id.clone(),
            job_id: new.job_id,
            resume_id: new.resume_id,
            status: new.status,
            applied_date: new.applied_date,
            follow_up_date: new.follow_up_date,
            interview_date: new.interview_date,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        });
        debug!(%id, "application added");
        id
    }

    pub fn update_application(&mut self, id: &str, patch: ApplicationPatch) -> bool {
        let Some(application) = self.data.applications.iter_mut().find(|a| a.id == id) else {
            debug!(id, "update of unknown application ignored");
            return false;
        };
        patch.apply(application);
        application.updated_at = touch(application.updated_at);
        debug!(id, "application updated");
        true
    }

    pub fn delete_application(&mut self, id: &str) -> Deletion {
        let removed = remove_where(&mut self.data.applications, |a| a.id == id) > 0;
        debug!(id, removed, "application deleted");
        Deletion {
            removed,
            cascaded_applications: 0,
        }
    }

    // --- Companies ---

    pub fn add_company(&mut self, new: NewCompany) -> String {
        let id = new_id();
        let now = Utc::now();
        self.data.companies.push(Company {
            id: id.clone(),
            name: new.name,
            website: new.website,
            careers_url: new.careers_url,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        });
        debug!(%id, "company added");
        id
    }

    pub fn update_company(&mut self, id: &str, patch: CompanyPatch) -> bool {
        let Some(company) = self.data.companies.iter_mut().find(|c| c.id == id) else {
            debug!(id, "update of unknown company ignored");
            return false;
        };
        patch.apply(company);
        company.updated_at = touch(company.updated_at);
        debug!(id, "company updated");
        true
    }

    /// Jobs name their company in free text, so nothing cascades.
    pub fn delete_company(&mut self, id: &str) -> Deletion {
        let removed = remove_where(&mut self.data.companies, |c| c.id == id) > 0;
        debug!(id, removed, "company deleted");
        Deletion {
            removed,
            cascaded_applications: 0,
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// updated_at never moves backwards, even if the wall clock does.
fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

fn remove_where<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> usize {
    let before = items.len();
    items.retain(|item| !pred(item));
    before - items.len()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ApplicationStatus, ResumeContent, ResumeFile};
    use chrono::NaiveDate;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn new_application(job_id: &str, resume_id: &str) -> NewApplication {
        NewApplication {
            job_id: job_id.to_string(),
            resume_id: resume_id.to_string(),
            status: ApplicationStatus::Applied,
            applied_date: date(2024, 1, 1),
            follow_up_date: None,
            interview_date: None,
            notes: None,
        }
    }

    pub(crate) fn new_resume(name: &str) -> NewResume {
        NewResume {
            name: name.to_string(),
            content: ResumeContent::default(),
            file: None,
        }
    }

    pub(crate) fn new_company(name: &str) -> NewCompany {
        NewCompany {
            name: name.to_string(),
            website: format!("https://{}.example", name.to_lowercase()),
            careers_url: format!("https://{}.example/careers", name.to_lowercase()),
            notes: None,
        }
    }

    #[test]
    fn test_add_assigns_unique_ids_and_equal_timestamps() {
        let mut store = EntityStore::new();
        let a = store.add_job(NewJob::new("Engineer", "Acme"));
        let b = store.add_job(NewJob::new("Engineer", "Acme"));
        assert_ne!(a, b);

        for job in store.jobs() {
            assert_eq!(job.created_at, job.updated_at);
        }

        let c = store.add_company(new_company("Acme"));
        let company = store.company(&c).unwrap();
        assert_eq!(company.created_at, company.updated_at);
    }

    #[test]
    fn test_update_merges_and_bumps_updated_at() {
        let mut store = EntityStore::new();
        let id = store.add_job(NewJob::new("Engineer", "Acme"));
        let before = store.job(&id).unwrap().clone();

        assert!(store.update_job(&id, JobPatch::status(ApplicationStatus::Interviewing)));

        let after = store.job(&id).unwrap();
        assert_eq!(after.status, ApplicationStatus::Interviewing);
        assert_eq!(after.title, before.title);
        assert_eq!(after.company, before.company);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn test_update_unknown_id_is_a_no_op() {
        let mut store = EntityStore::new();
        store.add_job(NewJob::new("Engineer", "Acme"));
        let snapshot = store.clone();

        assert!(!store.update_job("missing", JobPatch::status(ApplicationStatus::Offer)));
        assert!(!store.update_company("missing", CompanyPatch::default()));
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_update_unknown_application_or_resume_is_a_no_op() {
        let mut store = EntityStore::new();
        let resume = store.add_resume(new_resume("General"));
        store.add_application(new_application("j1", &resume));
        let snapshot = store.clone();

        let patch = ApplicationPatch {
            status: Some(ApplicationStatus::Offer),
            ..ApplicationPatch::default()
        };
        assert!(!store.update_application("missing", patch));
        assert!(!store.update_resume("missing", ResumePatch::default()));
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_update_resume_renames_and_clears_file() {
        let mut store = EntityStore::new();
        let id = store.add_resume(NewResume {
            file: Some(ResumeFile {
                name: "cv.pdf".to_string(),
                media_type: "application/pdf".to_string(),
                data: "JVBERi0=".to_string(),
            }),
            ..new_resume("General")
        });
        let before = store.resume(&id).unwrap().clone();

        assert!(store.update_resume(
            &id,
            ResumePatch {
                name: Some("Backend".to_string()),
                file: Some(None),
                ..ResumePatch::default()
            },
        ));

        let after = store.resume(&id).unwrap();
        assert_eq!(after.name, "Backend");
        assert!(after.file.is_none());
        assert_eq!(after.content, before.content);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn test_reassigned_application_follows_new_job() {
        let mut store = EntityStore::new();
        let j1 = store.add_job(NewJob::new("Engineer", "Acme"));
        let j2 = store.add_job(NewJob::new("Designer", "Globex"));
        let a1 = store.add_application(new_application(&j1, "r1"));

        assert!(store.update_application(
            &a1,
            ApplicationPatch {
                job_id: Some(j2.clone()),
                resume_id: Some("r2".to_string()),
                ..ApplicationPatch::default()
            },
        ));
        let moved = store.application(&a1).unwrap();
        assert_eq!(moved.job_id, j2);
        assert_eq!(moved.resume_id, "r2");

        assert_eq!(store.delete_job(&j1).cascaded_applications, 0);
        assert!(store.application(&a1).is_some());

        assert_eq!(store.delete_job(&j2).cascaded_applications, 1);
        assert!(store.application(&a1).is_none());
    }

    #[test]
    fn test_delete_application_removes_only_the_target() {
        let mut store = EntityStore::new();
        let job = store.add_job(NewJob::new("Engineer", "Acme"));
        let resume = store.add_resume(new_resume("General"));
        let a1 = store.add_application(new_application(&job, &resume));
        let a2 = store.add_application(new_application(&job, &resume));

        let deletion = store.delete_application(&a1);

        assert_eq!(deletion, Deletion { removed: true, cascaded_applications: 0 });
        assert!(store.application(&a1).is_none());
        assert!(store.application(&a2).is_some());
        assert!(store.job(&job).is_some());
        assert!(store.resume(&resume).is_some());

        let missing = store.delete_application("missing");
        assert!(!missing.removed);
        assert_eq!(store.applications().len(), 1);
    }

    #[test]
    fn test_update_company_keeps_other_fields() {
        let mut store = EntityStore::new();
        let c1 = store.add_company(new_company("Acme"));

        store.update_company(
            &c1,
            CompanyPatch {
                notes: Some(Some("called HR".to_string())),
                ..CompanyPatch::default()
            },
        );

        let company = store.company(&c1).unwrap();
        assert_eq!(company.notes.as_deref(), Some("called HR"));
        assert_eq!(company.name, "Acme");
        assert_eq!(company.website, "https://acme.example");
    }

    #[test]
    fn test_delete_job_cascades_to_its_applications() {
        let mut store = EntityStore::new();
        let j1 = store.add_job(NewJob::new("Engineer", "Acme"));
        let j2 = store.add_job(NewJob::new("Designer", "Globex"));
        let a1 = store.add_application(new_application(&j1, "r1"));
        let a2 = store.add_application(new_application(&j2, "r1"));

        let deletion = store.delete_job(&j1);

        assert_eq!(deletion, Deletion { removed: true, cascaded_applications: 1 });
        assert!(store.job(&j1).is_none());
        assert!(store.application(&a1).is_none());
        assert!(store.application(&a2).is_some());
        assert!(store.job(&j2).is_some());
    }

    #[test]
    fn test_delete_resume_cascades_to_its_applications() {
        let mut store = EntityStore::new();
        let job = store.add_job(NewJob::new("Engineer", "Acme"));
        let r1 = store.add_resume(new_resume("General"));
        let r2 = store.add_resume(new_resume("Backend"));
        let a1 = store.add_application(new_application(&job, &r1));
        let a2 = store.add_application(new_application(&job, &r2));

        let deletion = store.delete_resume(&r1);

        assert!(deletion.removed);
        assert_eq!(deletion.cascaded_applications, 1);
        assert!(store.resume(&r1).is_none());
        assert!(store.application(&a1).is_none());
        assert!(store.application(&a2).is_some());
    }

    #[test]
    fn test_delete_missing_job_still_drops_dangling_applications() {
        let mut store = EntityStore::new();
        store.add_application(new_application("ghost", "r1"));

        let deletion = store.delete_job("ghost");

        assert!(!deletion.removed);
        assert_eq!(deletion.cascaded_applications, 1);
        assert!(store.applications().is_empty());
    }

    #[test]
    fn test_delete_company_touches_nothing_else() {
        let mut store = EntityStore::new();
        let c1 = store.add_company(new_company("Acme"));
        let job = store.add_job(NewJob::new("Engineer", "Acme"));
        let resume = store.add_resume(new_resume("General"));
        store.add_application(new_application(&job, &resume));
        let before = store.clone();

        assert!(store.delete_company(&c1).removed);

        assert!(store.companies().is_empty());
        assert_eq!(store.jobs(), before.jobs());
        assert_eq!(store.resumes(), before.resumes());
        assert_eq!(store.applications(), before.applications());
    }

    #[test]
    fn test_delete_job_scenario() {
        let mut store = EntityStore::new();
        let j1 = store.add_job(NewJob::new("Engineer", "Acme"));
        let a1 = store.add_application(NewApplication {
            status: ApplicationStatus::Applied,
            applied_date: date(2024, 1, 1),
            ..new_application(&j1, "r1")
        });
        assert!(store.application(&a1).is_some());

        store.delete_job(&j1);

        assert!(store.applications().iter().all(|a| a.id != a1));
    }

    #[test]
    fn test_json_round_trip() {
        let mut store = EntityStore::new();
        let job = store.add_job(NewJob {
            application_deadline: Some(date(2024, 3, 1)),
            salary: Some("$120k - $150k".to_string()),
            responsibilities: vec!["Build things".to_string()],
            ..NewJob::new("Engineer", "Acme")
        });
        let resume = store.add_resume(new_resume("General"));
        store.add_application(new_application(&job, &resume));
        store.add_company(new_company("Acme"));

        let json = store.to_json().unwrap();
        assert_eq!(EntityStore::from_json(&json), store);
    }

    #[test]
    fn test_from_json_falls_back_to_empty() {
        assert_eq!(EntityStore::from_json("not json"), EntityStore::new());
        assert_eq!(EntityStore::from_json(r#"{"jobs": []}"#), EntityStore::new());
        assert_eq!(
            EntityStore::from_json(r#"{"state": {}, "version": 99}"#),
            EntityStore::new()
        );
    }

    #[test]
    fn test_from_json_accepts_partial_state() {
        let store = EntityStore::from_json(r#"{"state": {"companies": []}, "version": 0}"#);
        assert_eq!(store, EntityStore::new());
    }

    #[test]
    fn test_save_and_load_through_database() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(EntityStore::load(&db).unwrap(), EntityStore::new());

        let mut store = EntityStore::new();
        let j1 = store.add_job(NewJob::new("Engineer", "Acme"));
        store.add_application(new_application(&j1, "r1"));
        store.save(&db).unwrap();

        let loaded = EntityStore::load(&db).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_malformed_record_is_empty() {
        let db = Database::open_in_memory().unwrap();
        db.write(STORAGE_KEY, "{\"state\": 42}").unwrap();
        assert_eq!(EntityStore::load(&db).unwrap(), EntityStore::new());
    }
}
