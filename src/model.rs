use serde::{Deserialize, Serialize};

use crate::permissions::{AdminPermission, AdminRole};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    pub department_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    pub description: String,
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Form {
    #[serde(rename = "Form 1")]
    One,
    #[serde(rename = "Form 2")]
    Two,
    #[serde(rename = "Form 3")]
    Three,
}

impl Form {
    pub fn as_str(self) -> &'static str {
        match self {
            Form::One => "Form 1",
            Form::Two => "Form 2",
            Form::Three => "Form 3",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassLevel {
    pub id: String,
    pub form: Form,
    pub track: String,
    pub department_id: String,
    pub program_id: String,
    pub capacity: u32,
    pub current_enrollment: u32,
}

impl ClassLevel {
    /// Display label used on result slips and publishing lists, e.g. "Form 1 - Science A".
    pub fn label(&self) -> String {
        format!("{} - {}", self.form.as_str(), self.track)
    }

    pub fn enrollment_status(&self) -> EnrollmentStatus {
        if self.capacity == 0 {
            return EnrollmentStatus::Full;
        }
        let pct = 100.0 * f64::from(self.current_enrollment) / f64::from(self.capacity);
        if pct >= 90.0 {
            EnrollmentStatus::Full
        } else if pct >= 75.0 {
            EnrollmentStatus::High
        } else {
            EnrollmentStatus::Available
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Full,
    High,
    Available,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Core,
    Elective,
}

impl SubjectType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "core" => Some(Self::Core),
            "elective" => Some(Self::Elective),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    pub department_id: String,
    #[serde(rename = "type")]
    pub kind: SubjectType,
    pub description: String,
    pub assigned_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Suspended,
    Graduated,
    Transferred,
}

impl StudentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "graduated" => Some(Self::Graduated),
            "transferred" => Some(Self::Transferred),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Graduated => "graduated",
            Self::Transferred => "transferred",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub student_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub parent_email: String,
    #[serde(default)]
    pub parent_phone: String,
    pub department_id: String,
    pub program_id: String,
    pub class_id: String,
    pub form: Form,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub admission_date: String,
    pub status: StudentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: String,
    pub student_id: String,
    pub subject_id: String,
    pub class_id: String,
    pub semester: String,
    pub score: f64,
    pub grade: String,
    pub points: f64,
    pub remarks: String,
    pub teacher_id: String,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// pending -> processing -> completed | failed. Terminal states never move.
    pub fn can_advance_to(self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpload {
    pub id: String,
    pub file_name: String,
    pub class_id: String,
    pub subject_id: String,
    pub uploaded_by: String,
    pub uploaded_at: String,
    pub status: UploadStatus,
    pub total_records: u32,
    pub processed_records: u32,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_subjects: Option<Vec<String>>,
    pub permissions: Vec<AdminPermission>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementType {
    General,
    ResultPublished,
    Urgent,
    Event,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    AllStudents,
    SpecificClass,
    Parents,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementType,
    pub target_audience: Audience,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ids: Option<Vec<String>>,
    pub created_at: String,
    pub status: AnnouncementStatus,
    pub created_by: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Channels {
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub in_app: bool,
}

impl Channels {
    pub fn enabled(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.email {
            out.push("email");
        }
        if self.sms {
            out.push("sms");
        }
        if self.in_app {
            out.push("inApp");
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: String,
    pub class_id: String,
    pub semester: String,
    pub published_at: String,
    pub students_notified: u32,
    pub total_students: u32,
    pub channels: Channels,
    pub status: AnnouncementStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Success,
    Info,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub action: String,
    pub user: String,
    pub details: String,
    pub timestamp: String,
    pub kind: ActivityKind,
}
