//! Read-only views derived from the raw collections: dashboard aggregates,
//! list filters and reference resolution. Nothing here mutates the store.

use std::collections::BTreeMap;

use crate::models::{Application, ApplicationStatus, Company, Job};
use crate::store::EntityStore;

pub const UNKNOWN_POSITION: &str = "Unknown Position";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_RESUME: &str = "Unknown Resume";

const DASHBOARD_LIMIT: usize = 5;

pub struct Dashboard<'a> {
    pub total_jobs: usize,
    pub total_applications: usize,
    pub total_resumes: usize,
    pub total_companies: usize,
    /// Every status is present, zero when unused.
    pub status_counts: BTreeMap<ApplicationStatus, usize>,
    /// Most recently updated first.
    pub recent_applications: Vec<&'a Application>,
    /// Nearest deadline first; jobs without a deadline are left out.
    pub upcoming_deadlines: Vec<&'a Job>,
}

impl<'a> Dashboard<'a> {
    pub fn build(store: &'a EntityStore) -> Self {
        let mut status_counts: BTreeMap<ApplicationStatus, usize> =
            ApplicationStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for app in store.applications() {
            *status_counts.entry(app.status).or_default() += 1;
        }

        let mut recent_applications: Vec<&Application> = store.applications().iter().collect();
        recent_applications.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        recent_applications.truncate(DASHBOARD_LIMIT);

        let mut upcoming_deadlines: Vec<&Job> = store
            .jobs()
            .iter()
            .filter(|j| j.application_deadline.is_some())
            .collect();
        upcoming_deadlines.sort_by_key(|j| j.application_deadline);
        upcoming_deadlines.truncate(DASHBOARD_LIMIT);

        Self {
            total_jobs: store.jobs().len(),
            total_applications: store.applications().len(),
            total_resumes: store.resumes().len(),
            total_companies: store.companies().len(),
            status_counts,
            recent_applications,
            upcoming_deadlines,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [&job.title, &job.company, &job.location]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
        };
        let matches_status = self.status.is_none_or(|s| s == job.status);
        matches_search && matches_status
    }

    pub fn apply<'a>(&self, jobs: &'a [Job]) -> Vec<&'a Job> {
        jobs.iter().filter(|j| self.matches(j)).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub job_id: Option<String>,
    pub resume_id: Option<String>,
}

impl ApplicationFilter {
    pub fn matches(&self, app: &Application) -> bool {
        self.status.is_none_or(|s| s == app.status)
            && self.job_id.as_deref().is_none_or(|id| id == app.job_id)
            && self.resume_id.as_deref().is_none_or(|id| id == app.resume_id)
    }

    pub fn apply<'a>(&self, applications: &'a [Application]) -> Vec<&'a Application> {
        applications.iter().filter(|a| self.matches(a)).collect()
    }
}

pub fn search_companies<'a>(store: &'a EntityStore, term: &str) -> Vec<&'a Company> {
    let term = term.trim().to_lowercase();
    store
        .companies()
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&term))
        .collect()
}

/// Jobs whose free-text company equals the company's name, ignoring case.
pub fn jobs_for_company<'a>(store: &'a EntityStore, company: &Company) -> Vec<&'a Job> {
    let name = company.name.to_lowercase();
    store
        .jobs()
        .iter()
        .filter(|j| j.company.to_lowercase() == name)
        .collect()
}

pub fn applications_for_job<'a>(store: &'a EntityStore, job_id: &str) -> Vec<&'a Application> {
    ApplicationFilter {
        job_id: Some(job_id.to_string()),
        ..ApplicationFilter::default()
    }
    .apply(store.applications())
}

pub fn applications_for_resume<'a>(store: &'a EntityStore, resume_id: &str) -> Vec<&'a Application> {
    ApplicationFilter {
        resume_id: Some(resume_id.to_string()),
        ..ApplicationFilter::default()
    }
    .apply(store.applications())
}

/// Display names for an application's references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationLabels<'a> {
    pub position: &'a str,
    pub company: &'a str,
    pub resume: &'a str,
}

pub fn application_labels<'a>(store: &'a EntityStore, app: &Application) -> ApplicationLabels<'a> {
    let job = store.job(&app.job_id);
    ApplicationLabels {
        position: job.map_or(UNKNOWN_POSITION, |j| j.title.as_str()),
        company: job.map_or(UNKNOWN_COMPANY, |j| j.company.as_str()),
        resume: store
            .resume(&app.resume_id)
            .map_or(UNKNOWN_RESUME, |r| r.name.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationPatch, NewApplication, NewJob};
    use crate::store::tests::{date, new_application, new_company, new_resume};

    fn job(title: &str, company: &str, location: &str) -> NewJob {
        NewJob {
            location: location.to_string(),
            ..NewJob::new(title, company)
        }
    }

    #[test]
    fn test_dashboard_counts_every_status() {
        let mut store = EntityStore::new();
        let j = store.add_job(NewJob::new("Engineer", "Acme"));
        store.add_application(new_application(&j, "r1"));
        store.add_application(new_application(&j, "r1"));
        store.add_application(NewApplication {
            status: ApplicationStatus::Offer,
            ..new_application(&j, "r1")
        });

        let dashboard = Dashboard::build(&store);

        assert_eq!(dashboard.total_jobs, 1);
        assert_eq!(dashboard.total_applications, 3);
        assert_eq!(dashboard.total_resumes, 0);
        assert_eq!(dashboard.status_counts.len(), 6);
        assert_eq!(dashboard.status_counts[&ApplicationStatus::Applied], 2);
        assert_eq!(dashboard.status_counts[&ApplicationStatus::Offer], 1);
        assert_eq!(dashboard.status_counts[&ApplicationStatus::Withdrawn], 0);
    }

    #[test]
    fn test_dashboard_recent_applications_newest_first() {
        let mut store = EntityStore::new();
        let ids: Vec<String> = (0..7)
            .map(|_| store.add_application(new_application("j", "r")))
            .collect();
        // Touch the first one so it becomes the most recent.
        store.update_application(
            &ids[0],
            ApplicationPatch {
                status: Some(ApplicationStatus::Interviewing),
                ..ApplicationPatch::default()
            },
        );

        let dashboard = Dashboard::build(&store);

        assert_eq!(dashboard.recent_applications.len(), 5);
        assert_eq!(dashboard.recent_applications[0].id, ids[0]);
        for pair in dashboard.recent_applications.windows(2) {
            assert!(pair[0].updated_at >= pair[1].updated_at);
        }
    }

    #[test]
    fn test_dashboard_upcoming_deadlines() {
        let mut store = EntityStore::new();
        store.add_job(NewJob::new("No deadline", "Acme"));
        for day in [20, 5, 12, 1, 28, 9] {
            store.add_job(NewJob {
                application_deadline: Some(date(2024, 6, day)),
                ..NewJob::new(format!("Due {}", day), "Acme")
            });
        }

        let dashboard = Dashboard::build(&store);

        let titles: Vec<&str> = dashboard
            .upcoming_deadlines
            .iter()
            .map(|j| j.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Due 1", "Due 5", "Due 9", "Due 12", "Due 20"]);
    }

    #[test]
    fn test_job_filter_search_and_status() {
        let mut store = EntityStore::new();
        store.add_job(job("Backend Engineer", "Acme", "Berlin"));
        store.add_job(job("Designer", "Globex", "Remote"));
        let offer = store.add_job(NewJob {
            status: ApplicationStatus::Offer,
            ..job("Platform Engineer", "Initech", "remote")
        });

        let by_title = JobFilter {
            search: Some("engineer".to_string()),
            status: None,
        };
        assert_eq!(by_title.apply(store.jobs()).len(), 2);

        let by_location = JobFilter {
            search: Some("REMOTE".to_string()),
            status: None,
        };
        assert_eq!(by_location.apply(store.jobs()).len(), 2);

        let by_company = JobFilter {
            search: Some("glob".to_string()),
            status: None,
        };
        assert_eq!(by_company.apply(store.jobs())[0].title, "Designer");

        let by_status = JobFilter {
            search: Some("remote".to_string()),
            status: Some(ApplicationStatus::Offer),
        };
        let matched = by_status.apply(store.jobs());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, offer);

        assert_eq!(JobFilter::default().apply(store.jobs()).len(), 3);
    }

    #[test]
    fn test_company_search_and_jobs_for_company() {
        let mut store = EntityStore::new();
        let acme = store.add_company(new_company("Acme"));
        store.add_company(new_company("Globex"));
        store.add_job(NewJob::new("Engineer", "ACME"));
        store.add_job(NewJob::new("Designer", "Acme Corp"));

        assert_eq!(search_companies(&store, "ac").len(), 1);
        assert_eq!(search_companies(&store, "").len(), 2);

        let company = store.company(&acme).unwrap();
        let jobs = jobs_for_company(&store, company);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Engineer");
    }

    #[test]
    fn test_applications_for_job_and_resume() {
        let mut store = EntityStore::new();
        let j1 = store.add_job(NewJob::new("Engineer", "Acme"));
        let j2 = store.add_job(NewJob::new("Designer", "Globex"));
        let r1 = store.add_resume(new_resume("General"));
        store.add_application(new_application(&j1, &r1));
        store.add_application(new_application(&j2, &r1));
        store.add_application(new_application(&j2, "other"));

        assert_eq!(applications_for_job(&store, &j1).len(), 1);
        assert_eq!(applications_for_job(&store, &j2).len(), 2);
        assert_eq!(applications_for_resume(&store, &r1).len(), 2);

        let filter = ApplicationFilter {
            job_id: Some(j2.clone()),
            resume_id: Some(r1.clone()),
            status: Some(ApplicationStatus::Applied),
        };
        assert_eq!(filter.apply(store.applications()).len(), 1);
    }

    #[test]
    fn test_application_labels_fall_back_for_dangling_references() {
        let mut store = EntityStore::new();
        let j1 = store.add_job(NewJob::new("Engineer", "Acme"));
        let r1 = store.add_resume(new_resume("General"));
        let known = store.add_application(new_application(&j1, &r1));
        let dangling = store.add_application(new_application("gone", "also-gone"));

        let labels = application_labels(&store, store.application(&known).unwrap());
        assert_eq!(
            labels,
            ApplicationLabels {
                position: "Engineer",
                company: "Acme",
                resume: "General"
            }
        );

        let labels = application_labels(&store, store.application(&dangling).unwrap());
        assert_eq!(labels.position, UNKNOWN_POSITION);
        assert_eq!(labels.company, UNKNOWN_COMPANY);
        assert_eq!(labels.resume, UNKNOWN_RESUME);
    }
}
