use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Saved,
    Applied,
    Interviewing,
    Offer,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Saved,
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Saved => "Saved",
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Interviewing => "Interviewing",
            ApplicationStatus::Offer => "Offer",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Withdrawn => "Withdrawn",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                anyhow!(
                    "Unknown status '{}'. Expected one of: saved, applied, interviewing, offer, rejected, withdrawn",
                    s
                )
            })
    }
}

// --- Entities ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String, // free text, matched against Company::name
    pub location: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    pub date_posted: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    pub url: String,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: String,
    pub name: String,
    pub content: ResumeContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<ResumeFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An uploaded résumé document. `data` is base64 and opaque to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFile {
    pub name: String,
    pub media_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeContent {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub certifications: Vec<Certification>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub current: bool,
    pub description: String,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub location: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certification {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub technologies: Vec<String>,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub resume_id: String,
    pub status: ApplicationStatus,
    pub applied_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub website: String,
    pub careers_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Creation inputs (everything except id and timestamps) ---

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    pub date_posted: NaiveDate,
    pub application_deadline: Option<NaiveDate>,
    pub salary: Option<String>,
    pub url: String,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
}

impl NewJob {
    /// A saved job posted today with every other field blank.
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: String::new(),
            description: String::new(),
            responsibilities: Vec::new(),
            qualifications: Vec::new(),
            date_posted: Utc::now().date_naive(),
            application_deadline: None,
            salary: None,
            url: String::new(),
            status: ApplicationStatus::Saved,
            notes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub name: String,
    pub content: ResumeContent,
    pub file: Option<ResumeFile>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: String,
    pub resume_id: String,
    pub status: ApplicationStatus,
    pub applied_date: NaiveDate,
    pub follow_up_date: Option<NaiveDate>,
    pub interview_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub website: String,
    pub careers_url: String,
    pub notes: Option<String>,
}

// --- Partial updates ---
//
// `None` leaves a field alone. For optional entity fields the inner option
// is the new value, so `Some(None)` clears it.

#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub responsibilities: Option<Vec<String>>,
    pub qualifications: Option<Vec<String>>,
    pub date_posted: Option<NaiveDate>,
    pub application_deadline: Option<Option<NaiveDate>>,
    pub salary: Option<Option<String>>,
    pub url: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub notes: Option<Option<String>>,
}

impl JobPatch {
    pub fn status(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, job: &mut Job) {
        set(&mut job.title, self.title);
        set(&mut job.company, self.company);
        set(&mut job.location, self.location);
        set(&mut job.description, self.description);
        set(&mut job.responsibilities, self.responsibilities);
        set(&mut job.qualifications, self.qualifications);
        set(&mut job.date_posted, self.date_posted);
        set(&mut job.application_deadline, self.application_deadline);
        set(&mut job.salary, self.salary);
        set(&mut job.url, self.url);
        set(&mut job.status, self.status);
        set(&mut job.notes, self.notes);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResumePatch {
    pub name: Option<String>,
    pub content: Option<ResumeContent>,
    pub file: Option<Option<ResumeFile>>,
}

impl ResumePatch {
    pub(crate) fn apply(self, resume: &mut Resume) {
        set(&mut resume.name, self.name);
        set(&mut resume.content, self.content);
        set(&mut resume.file, self.file);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
    pub job_id: Option<String>,
    pub resume_id: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub applied_date: Option<NaiveDate>,
    pub follow_up_date: Option<Option<NaiveDate>>,
    pub interview_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

impl ApplicationPatch {
    pub(crate) fn apply(self, application: &mut Application) {
        set(&mut application.job_id, self.job_id);
        set(&mut application.resume_id, self.resume_id);
        set(&mut application.status, self.status);
        set(&mut application.applied_date, self.applied_date);
        set(&mut application.follow_up_date, self.follow_up_date);
        set(&mut application.interview_date, self.interview_date);
        set(&mut application.notes, self.notes);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub website: Option<String>,
    pub careers_url: Option<String>,
    pub notes: Option<Option<String>>,
}

impl CompanyPatch {
    pub(crate) fn apply(self, company: &mut Company) {
        set(&mut company.name, self.name);
        set(&mut company.website, self.website);
        set(&mut company.careers_url, self.careers_url);
        set(&mut company.notes, self.notes);
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("applied".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::Applied);
        assert_eq!("OFFER".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::Offer);
        assert_eq!(" Withdrawn ".parse::<ApplicationStatus>().unwrap(), ApplicationStatus::Withdrawn);
        assert!("ghosted".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&ApplicationStatus::Interviewing).unwrap();
        assert_eq!(json, "\"Interviewing\"");
        let status: ApplicationStatus = serde_json::from_str("\"Rejected\"").unwrap();
        assert_eq!(status, ApplicationStatus::Rejected);
    }

    #[test]
    fn test_job_patch_leaves_absent_fields() {
        let now = Utc::now();
        let mut job = Job {
            id: "j1".to_string(),
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            description: String::new(),
            responsibilities: vec!["Ship".to_string()],
            qualifications: Vec::new(),
            date_posted: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            application_deadline: NaiveDate::from_ymd_opt(2024, 2, 1),
            salary: Some("$150k".to_string()),
            url: String::new(),
            status: ApplicationStatus::Saved,
            notes: Some("referral".to_string()),
            created_at: now,
            updated_at: now,
        };

        JobPatch {
            title: Some("Staff Engineer".to_string()),
            salary: Some(None),
            ..JobPatch::default()
        }
        .apply(&mut job);

        assert_eq!(job.title, "Staff Engineer");
        assert_eq!(job.salary, None);
        assert_eq!(job.company, "Acme");
        assert_eq!(job.responsibilities, vec!["Ship".to_string()]);
        assert_eq!(job.notes.as_deref(), Some("referral"));
        assert_eq!(job.application_deadline, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_resume_content_tolerates_missing_sections() {
        let content: ResumeContent =
            serde_json::from_str(r#"{"personalInfo": {"name": "Ada"}, "skills": ["Rust"]}"#).unwrap();
        assert_eq!(content.personal_info.name, "Ada");
        assert_eq!(content.skills, vec!["Rust".to_string()]);
        assert!(content.experience.is_empty());
        assert!(content.personal_info.github.is_none());
    }
}
