mod academics;
mod admin;
mod analytics;
mod grading;
mod results;
pub mod seed;
mod students;
mod uploads;

pub use academics::{ClassInput, ClassPatch, DepartmentInput, ProgramInput, SubjectFilter, SubjectInput, SubjectPatch};
pub use admin::{AdminUserInput, AdminUserPatch, AnnouncementInput, NotificationInput};
pub use grading::{GradeLevelInput, GradeLevelPatch, GradingSystemInput, GradingSystemPatch};
pub use results::{ResultFilter, ResultInput};
pub use students::{filter_students, StudentFilter, StudentInput, StudentPatch};
pub use uploads::{BulkUploadAdvance, BulkUploadInput};

use serde_json::json;

use crate::grading::{GradeError, GradingSystem};
use crate::model::{
    ActivityEntry, ActivityKind, AdminUser, Announcement, BulkUpload, ClassLevel, Department,
    Publication, ResultRecord, Student, Subject,
};
use crate::permissions::PermissionError;
use crate::session::{Session, SessionError};
use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{message}")]
    Invalid { field: String, message: String },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error(transparent)]
    Grade(#[from] GradeError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error("{0:#}")]
    Io(#[from] anyhow::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Invalid { .. } => "bad_params",
            StoreError::NotFound { .. } => "not_found",
            StoreError::Conflict(_) => "conflict",
            StoreError::InvalidTransition(_) => "invalid_transition",
            StoreError::Grade(GradeError::OutOfRange { .. }) => "grade_out_of_range",
            StoreError::Grade(GradeError::NoActiveSystem) => "conflict",
            StoreError::Grade(_) => "bad_params",
            StoreError::Session(SessionError::MissingField(_)) => "bad_params",
            StoreError::Session(SessionError::InvalidTransition(_)) => "invalid_transition",
            StoreError::Session(SessionError::PasswordMismatch) => "password_mismatch",
            StoreError::Permission(_) => "bad_params",
            StoreError::Io(_) => "io_failed",
        }
    }

    /// Field hints let the UI place the message next to the offending input.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            StoreError::Invalid { field, .. } => Some(json!({ "field": field })),
            StoreError::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
            StoreError::Grade(GradeError::InvalidScore(_)) => Some(json!({ "field": "score" })),
            StoreError::Grade(GradeError::InvalidScale(_)) => {
                Some(json!({ "field": "gradeScale" }))
            }
            StoreError::Grade(GradeError::OutOfRange { score, system }) => {
                Some(json!({ "score": score, "gradingSystem": system }))
            }
            StoreError::Session(SessionError::MissingField(f)) => Some(json!({ "field": f })),
            StoreError::Session(SessionError::PasswordMismatch) => {
                Some(json!({ "field": "confirmPassword" }))
            }
            _ => None,
        }
    }
}

pub(crate) fn invalid(field: &str, message: impl Into<String>) -> StoreError {
    StoreError::Invalid {
        field: field.to_string(),
        message: message.into(),
    }
}

pub(crate) fn not_found(entity: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, StoreError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(invalid(field, format!("{field} is required")));
    }
    Ok(v.to_string())
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub(crate) fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// The whole application state. Every mutation goes through a method here.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub departments: Vec<Department>,
    pub classes: Vec<ClassLevel>,
    pub subjects: Vec<Subject>,
    pub students: Vec<Student>,
    pub grading_systems: Vec<GradingSystem>,
    pub results: Vec<ResultRecord>,
    pub bulk_uploads: Vec<BulkUpload>,
    pub admin_users: Vec<AdminUser>,
    pub announcements: Vec<Announcement>,
    pub publications: Vec<Publication>,
    pub activity: Vec<ActivityEntry>,
    pub settings: Settings,
    pub session: Session,
}

impl Store {
    /// Built-in grading systems and default settings, nothing else.
    pub fn empty() -> Self {
        Self {
            grading_systems: crate::grading::builtin_systems(),
            ..Self::default()
        }
    }

    fn actor(&self) -> String {
        match self.session.user_id() {
            Some(u) => u.to_string(),
            None => "System".to_string(),
        }
    }

    pub(crate) fn record(&mut self, action: &str, details: impl Into<String>, kind: ActivityKind) {
        let details = details.into();
        tracing::info!(action, details = %details, "store mutation");
        let entry = ActivityEntry {
            action: action.to_string(),
            user: self.actor(),
            details,
            timestamp: timestamp(),
            kind,
        };
        self.activity.push(entry);
    }

    pub fn recent_activity(&self, limit: usize) -> Vec<&ActivityEntry> {
        self.activity.iter().rev().take(limit).collect()
    }

    pub fn export_activity_csv(&self, out_path: &std::path::Path) -> Result<usize, StoreError> {
        use anyhow::Context;

        let mut csv = String::from("timestamp,action,user,details,type\n");
        for e in &self.activity {
            let kind = match e.kind {
                ActivityKind::Success => "success",
                ActivityKind::Info => "info",
                ActivityKind::Warning => "warning",
            };
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_quote(&e.timestamp),
                csv_quote(&e.action),
                csv_quote(&e.user),
                csv_quote(&e.details),
                kind
            ));
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
        std::fs::write(out_path, csv)
            .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))?;
        Ok(self.activity.len())
    }

    pub fn update_settings(
        &mut self,
        section: crate::settings::SettingsSection,
        patch: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<serde_json::Value, StoreError> {
        self.settings
            .update(section, patch)
            .map_err(|msg| invalid(section.key(), msg))?;
        let keys: Vec<&str> = patch.keys().map(String::as_str).collect();
        self.record(
            "Settings Updated",
            format!("{}: {}", section.key(), keys.join(", ")),
            ActivityKind::Info,
        );
        Ok(self.settings.section(section))
    }

    // Session transitions live on the store so every view change is auditable.

    pub fn login(&mut self, user_id: &str, password: &str, admin: bool) -> Result<(), StoreError> {
        self.session.login(user_id, password, admin)?;
        let who = if admin { "Admin" } else { "Student" };
        self.record(&format!("{who} Login"), format!("{user_id} logged in"), ActivityKind::Info);
        Ok(())
    }

    pub fn logout(&mut self) {
        if self.session.is_logged_in() {
            self.record("Logout", "user logged out", ActivityKind::Info);
        }
        self.session.logout();
    }
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(invalid("name", "name is required").code(), "bad_params");
        assert_eq!(not_found("student", "x").code(), "not_found");
        assert_eq!(
            StoreError::from(GradeError::OutOfRange {
                score: 12.0,
                system: "S".into()
            })
            .code(),
            "grade_out_of_range"
        );
        assert_eq!(
            StoreError::from(SessionError::PasswordMismatch).code(),
            "password_mismatch"
        );
        assert_eq!(
            StoreError::from(anyhow::anyhow!("disk full")).code(),
            "io_failed"
        );
    }

    #[test]
    fn login_and_logout_are_recorded() {
        let mut store = Store::empty();
        store.login("STU001", "pw", false).expect("login");
        store.logout();
        let actions: Vec<&str> = store.activity.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["Student Login", "Logout"]);
        assert_eq!(store.activity[1].user, "STU001");
    }

    #[test]
    fn csv_quote_escapes_commas_and_quotes() {
        assert_eq!(csv_quote("plain"), "plain");
        assert_eq!(csv_quote("a,b"), "\"a,b\"");
        assert_eq!(csv_quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
