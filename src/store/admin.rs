use serde::{Deserialize, Serialize};

use crate::model::{
    ActivityKind, AdminUser, Announcement, AnnouncementStatus, AnnouncementType, Audience,
    Channels, Publication, Student,
};
use crate::permissions::{self, parse_resource, Action, AdminPermission, AdminRole};

use super::{invalid, new_id, not_found, required, timestamp, today, Store, StoreError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserInput {
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub assigned_subjects: Option<Vec<String>>,
    /// Omitted means "start from the role template".
    #[serde(default)]
    pub permissions: Option<Vec<AdminPermission>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<AdminRole>,
    pub department_id: Option<String>,
    pub assigned_subjects: Option<Vec<String>>,
    pub permissions: Option<Vec<AdminPermission>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementInput {
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default = "general")]
    pub kind: AnnouncementType,
    #[serde(default = "all_students")]
    pub target_audience: Audience,
    #[serde(default)]
    pub class_ids: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<AnnouncementStatus>,
}

fn general() -> AnnouncementType {
    AnnouncementType::General
}

fn all_students() -> Audience {
    Audience::AllStudents
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationInput {
    pub audience: Audience,
    #[serde(default)]
    pub class_ids: Option<Vec<String>>,
    pub message: String,
    pub channels: Channels,
}

/// Outcome of one recipient on one channel. Nothing leaves the process.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub recipient: String,
    pub student_id: String,
    pub channel: &'static str,
    pub address: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingClass {
    pub class_id: String,
    pub label: String,
    pub semester: String,
    pub total_students: usize,
    pub students_with_results: usize,
    pub subject_count: usize,
    pub results_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

fn check_permissions(perms: &[AdminPermission]) -> Result<(), StoreError> {
    for p in perms {
        parse_resource(&p.resource)?;
    }
    Ok(())
}

impl Store {
    pub fn admin_user(&self, id: &str) -> Result<&AdminUser, StoreError> {
        self.admin_users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found("admin user", id))
    }

    fn admin_user_index(&self, id: &str) -> Result<usize, StoreError> {
        self.admin_users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| not_found("admin user", id))
    }

    fn check_admin_email(&self, email: &str, except: Option<&str>) -> Result<String, StoreError> {
        let email = required("email", email)?;
        if !email.contains('@') {
            return Err(invalid("email", "email must contain '@'"));
        }
        if self
            .admin_users
            .iter()
            .any(|u| Some(u.id.as_str()) != except && u.email.eq_ignore_ascii_case(&email))
        {
            return Err(StoreError::Conflict(format!("{email} is already registered")));
        }
        Ok(email)
    }

    fn super_admin_count(&self) -> usize {
        self.admin_users
            .iter()
            .filter(|u| u.role == AdminRole::SuperAdmin)
            .count()
    }

    fn guard_last_super_admin(&self, idx: usize, next_role: Option<AdminRole>) -> Result<(), StoreError> {
        let user = &self.admin_users[idx];
        let demoted = user.role == AdminRole::SuperAdmin && next_role != Some(AdminRole::SuperAdmin);
        if demoted && self.super_admin_count() == 1 {
            return Err(StoreError::Conflict(
                "at least one super admin must remain".into(),
            ));
        }
        Ok(())
    }

    pub fn create_admin_user(&mut self, input: AdminUserInput) -> Result<AdminUser, StoreError> {
        let name = required("name", &input.name)?;
        let email = self.check_admin_email(&input.email, None)?;
        let permissions = match input.permissions {
            Some(p) => {
                check_permissions(&p)?;
                p
            }
            None => input.role.template(),
        };
        let user = AdminUser {
            id: new_id(),
            name,
            email,
            role: input.role,
            department_id: input.department_id,
            assigned_subjects: input.assigned_subjects,
            permissions,
        };
        self.admin_users.push(user.clone());
        self.record(
            "Admin User Created",
            format!("{} ({})", user.name, user.role.as_str()),
            ActivityKind::Success,
        );
        Ok(user)
    }

    /// A role change without explicit permissions re-applies the role template.
    pub fn update_admin_user(&mut self, id: &str, patch: AdminUserPatch) -> Result<AdminUser, StoreError> {
        let idx = self.admin_user_index(id)?;
        let mut next = self.admin_users[idx].clone();
        if let Some(n) = patch.name.as_deref() {
            next.name = required("name", n)?;
        }
        if let Some(e) = patch.email.as_deref() {
            next.email = self.check_admin_email(e, Some(id))?;
        }
        if patch.department_id.is_some() {
            next.department_id = patch.department_id;
        }
        if patch.assigned_subjects.is_some() {
            next.assigned_subjects = patch.assigned_subjects;
        }
        if let Some(role) = patch.role {
            self.guard_last_super_admin(idx, Some(role))?;
            if role != next.role && patch.permissions.is_none() {
                next.permissions = role.template();
            }
            next.role = role;
        }
        if let Some(p) = patch.permissions {
            check_permissions(&p)?;
            next.permissions = p;
        }
        self.admin_users[idx] = next.clone();
        self.record("Admin User Updated", next.name.clone(), ActivityKind::Info);
        Ok(next)
    }

    pub fn delete_admin_user(&mut self, id: &str) -> Result<(), StoreError> {
        let idx = self.admin_user_index(id)?;
        self.guard_last_super_admin(idx, None)?;
        let removed = self.admin_users.remove(idx);
        self.record("Admin User Deleted", removed.name, ActivityKind::Warning);
        Ok(())
    }

    /// Sets the role and overwrites the permission set with its template.
    pub fn apply_role_template(&mut self, id: &str, role: AdminRole) -> Result<AdminUser, StoreError> {
        let idx = self.admin_user_index(id)?;
        self.guard_last_super_admin(idx, Some(role))?;
        let user = &mut self.admin_users[idx];
        user.role = role;
        user.permissions = role.template();
        let out = user.clone();
        self.record(
            "Role Template Applied",
            format!("{} is now {}", out.name, role.as_str()),
            ActivityKind::Info,
        );
        Ok(out)
    }

    pub fn toggle_admin_permission(
        &mut self,
        id: &str,
        resource: &str,
        action: Action,
        on: bool,
    ) -> Result<AdminUser, StoreError> {
        let resource = parse_resource(resource)?;
        let idx = self.admin_user_index(id)?;
        let user = &mut self.admin_users[idx];
        permissions::toggle(&mut user.permissions, resource, action, on);
        let out = user.clone();
        self.record(
            "Permission Changed",
            format!(
                "{} {} {}:{}",
                out.name,
                if on { "granted" } else { "revoked" },
                resource,
                action.as_str()
            ),
            ActivityKind::Info,
        );
        Ok(out)
    }

    pub fn check_admin_permission(&self, id: &str, resource: &str, action: Action) -> Result<bool, StoreError> {
        let resource = parse_resource(resource)?;
        Ok(permissions::allows(
            &self.admin_user(id)?.permissions,
            resource,
            action,
        ))
    }

    fn author(&self) -> String {
        self.session.user_id().unwrap_or("Admin").to_string()
    }

    fn check_class_ids(&self, ids: &[String]) -> Result<(), StoreError> {
        for c in ids {
            if self.class(c).is_err() {
                return Err(invalid("classIds", format!("unknown class {c}")));
            }
        }
        Ok(())
    }

    /// Newest first; ties keep the most recently created on top.
    pub fn list_announcements(&self, status: Option<AnnouncementStatus>) -> Vec<&Announcement> {
        let mut out: Vec<&Announcement> = self
            .announcements
            .iter()
            .rev()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn create_announcement(&mut self, input: AnnouncementInput) -> Result<Announcement, StoreError> {
        let title = required("title", &input.title)?;
        let message = required("message", &input.message)?;
        let class_ids = match input.target_audience {
            Audience::SpecificClass => {
                let ids = input.class_ids.unwrap_or_default();
                if ids.is_empty() {
                    return Err(invalid("classIds", "choose at least one class"));
                }
                self.check_class_ids(&ids)?;
                Some(ids)
            }
            _ => None,
        };
        let announcement = Announcement {
            id: new_id(),
            title,
            message,
            kind: input.kind,
            target_audience: input.target_audience,
            class_ids,
            created_at: today(),
            status: input.status.unwrap_or(AnnouncementStatus::Published),
            created_by: self.author(),
        };
        self.announcements.push(announcement.clone());
        self.record(
            "Announcement Created",
            announcement.title.clone(),
            ActivityKind::Success,
        );
        Ok(announcement)
    }

    pub fn publish_announcement(&mut self, id: &str) -> Result<Announcement, StoreError> {
        let Some(a) = self.announcements.iter_mut().find(|a| a.id == id) else {
            return Err(not_found("announcement", id));
        };
        if a.status == AnnouncementStatus::Published {
            return Err(StoreError::InvalidTransition(
                "announcement is already published".into(),
            ));
        }
        a.status = AnnouncementStatus::Published;
        let out = a.clone();
        self.record("Announcement Published", out.title.clone(), ActivityKind::Success);
        Ok(out)
    }

    pub fn delete_announcement(&mut self, id: &str) -> Result<(), StoreError> {
        let Some(idx) = self.announcements.iter().position(|a| a.id == id) else {
            return Err(not_found("announcement", id));
        };
        let removed = self.announcements.remove(idx);
        self.record("Announcement Deleted", removed.title, ActivityKind::Warning);
        Ok(())
    }

    fn publishing_row(&self, class_id: &str, semester: &str) -> Result<PublishingClass, StoreError> {
        let class = self.class(class_id)?;
        let students = self.class_students(class_id);
        let subjects = self.subjects_for_class(class_id);
        let complete = |s: &Student| {
            subjects.iter().all(|sub| {
                self.results.iter().any(|r| {
                    r.student_id == s.id && r.subject_id == sub.id && r.semester == semester
                })
            })
        };
        let with_results = students
            .iter()
            .filter(|s| {
                self.results
                    .iter()
                    .any(|r| r.student_id == s.id && r.semester == semester)
            })
            .count();
        let ready = !students.is_empty()
            && !subjects.is_empty()
            && students.iter().all(|s| complete(s));
        Ok(PublishingClass {
            class_id: class.id.clone(),
            label: class.label(),
            semester: semester.to_string(),
            total_students: students.len(),
            students_with_results: with_results,
            subject_count: subjects.len(),
            results_ready: ready,
            published_at: self
                .publications
                .iter()
                .find(|p| p.class_id == class_id && p.semester == semester)
                .map(|p| p.published_at.clone()),
        })
    }

    pub fn publishing_classes(&self, semester: Option<&str>) -> Result<Vec<PublishingClass>, StoreError> {
        let semester = self.semester_or_current(semester);
        self.classes
            .iter()
            .map(|c| self.publishing_row(&c.id, &semester))
            .collect()
    }

    /// Publishes a complete class. Delivery is logged per channel and an
    /// in-app announcement is created for the class.
    pub fn publish_results(
        &mut self,
        class_id: &str,
        semester: Option<&str>,
        channels: Channels,
    ) -> Result<Publication, StoreError> {
        let semester = self.semester_or_current(semester);
        let row = self.publishing_row(class_id, &semester)?;
        let enabled = channels.enabled();
        if enabled.is_empty() {
            return Err(invalid("channels", "select at least one notification channel"));
        }
        if !row.results_ready {
            return Err(StoreError::Conflict(format!(
                "{}: {} of {} students have complete results for {semester}",
                row.label, row.students_with_results, row.total_students
            )));
        }
        if row.published_at.is_some() {
            return Err(StoreError::Conflict(format!(
                "{} results for {semester} are already published",
                row.label
            )));
        }

        for &channel in &enabled {
            tracing::info!(
                class = %row.label,
                semester = %semester,
                channel,
                recipients = row.total_students,
                "result notification logged"
            );
        }

        let publication = Publication {
            id: new_id(),
            class_id: class_id.to_string(),
            semester: semester.clone(),
            published_at: timestamp(),
            students_notified: u32::try_from(row.total_students).unwrap_or(u32::MAX),
            total_students: u32::try_from(row.total_students).unwrap_or(u32::MAX),
            channels,
            status: AnnouncementStatus::Published,
        };
        self.publications.push(publication.clone());

        let announcement = Announcement {
            id: new_id(),
            title: format!("{} Results Published", row.label),
            message: format!(
                "Results for {semester} are now available. Log in to view your result slip."
            ),
            kind: AnnouncementType::ResultPublished,
            target_audience: Audience::SpecificClass,
            class_ids: Some(vec![class_id.to_string()]),
            created_at: today(),
            status: AnnouncementStatus::Published,
            created_by: self.author(),
        };
        self.announcements.push(announcement);
        self.record(
            "Results Published",
            format!(
                "{} for {semester} via {}",
                row.label,
                enabled.join(", ")
            ),
            ActivityKind::Success,
        );
        Ok(publication)
    }

    pub fn publications_newest_first(&self) -> Vec<&Publication> {
        let mut out: Vec<&Publication> = self.publications.iter().rev().collect();
        out.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        out
    }

    fn recipients(&self, audience: Audience, class_ids: Option<&[String]>) -> Result<Vec<&Student>, StoreError> {
        match audience {
            Audience::SpecificClass => {
                let ids = class_ids.unwrap_or_default();
                if ids.is_empty() {
                    return Err(invalid("classIds", "choose at least one class"));
                }
                self.check_class_ids(ids)?;
                Ok(self
                    .students
                    .iter()
                    .filter(|s| ids.contains(&s.class_id))
                    .collect())
            }
            Audience::AllStudents | Audience::Parents => Ok(self.students.iter().collect()),
        }
    }

    pub fn send_notification(&mut self, input: NotificationInput) -> Result<Vec<Delivery>, StoreError> {
        let message = required("message", &input.message)?;
        let enabled = input.channels.enabled();
        if enabled.is_empty() {
            return Err(invalid("channels", "select at least one notification channel"));
        }
        let parents = input.audience == Audience::Parents;
        let mut out = Vec::new();
        for s in self.recipients(input.audience, input.class_ids.as_deref())? {
            let recipient = if parents && !s.guardian_name.is_empty() {
                s.guardian_name.clone()
            } else {
                s.name.clone()
            };
            for &channel in &enabled {
                let address = match (channel, parents) {
                    ("email", false) => s.email.clone(),
                    ("email", true) => s.parent_email.clone(),
                    ("sms", false) => s.phone.clone(),
                    ("sms", true) => s.parent_phone.clone(),
                    _ => s.student_id.clone(),
                };
                let status = if address.is_empty() { "skipped" } else { "logged" };
                tracing::info!(channel, address = %address, status, "notification");
                out.push(Delivery {
                    recipient: recipient.clone(),
                    student_id: s.student_id.clone(),
                    channel,
                    address,
                    status,
                });
            }
        }
        let logged = out.iter().filter(|d| d.status == "logged").count();
        self.record(
            "Notification Sent",
            format!("{logged} deliveries logged: {message}"),
            ActivityKind::Info,
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed::{self, DEMO_SEMESTER};
    use crate::store::ResultInput;

    fn email_only() -> Channels {
        Channels {
            email: true,
            sms: false,
            in_app: false,
        }
    }

    #[test]
    fn new_teacher_gets_exactly_the_template() {
        let mut store = seed::demo().expect("seed");
        let u = store
            .create_admin_user(AdminUserInput {
                name: "Kofi Mensah".into(),
                email: "kofi@meghis.edu".into(),
                role: AdminRole::Teacher,
                department_id: None,
                assigned_subjects: None,
                permissions: None,
            })
            .expect("create");
        assert_eq!(
            serde_json::to_value(&u.permissions).expect("json"),
            serde_json::json!([
                { "resource": "students", "actions": ["read"] },
                { "resource": "results", "actions": ["create", "read", "update"] }
            ])
        );
    }

    #[test]
    fn last_super_admin_is_protected() {
        let mut store = seed::demo().expect("seed");
        assert_eq!(store.delete_admin_user("1").expect_err("last").code(), "conflict");
        assert!(store
            .apply_role_template("1", AdminRole::Teacher)
            .is_err());
        store
            .apply_role_template("2", AdminRole::SuperAdmin)
            .expect("promote");
        store.delete_admin_user("1").expect("no longer last");
    }

    #[test]
    fn toggle_then_check() {
        let mut store = seed::demo().expect("seed");
        assert!(!store
            .check_admin_permission("4", "classes", Action::Read)
            .expect("check"));
        store
            .toggle_admin_permission("4", "classes", Action::Read, true)
            .expect("on");
        assert!(store
            .check_admin_permission("4", "classes", Action::Read)
            .expect("check"));
        let u = store
            .toggle_admin_permission("4", "classes", Action::Read, false)
            .expect("off");
        assert!(u.permissions.iter().all(|p| p.resource != "classes"));
        assert!(store
            .toggle_admin_permission("4", "library", Action::Read, true)
            .is_err());
    }

    #[test]
    fn specific_class_announcement_needs_classes() {
        let mut store = seed::demo().expect("seed");
        let e = store
            .create_announcement(AnnouncementInput {
                title: "Lab day".into(),
                message: "Bring coats".into(),
                kind: AnnouncementType::Event,
                target_audience: Audience::SpecificClass,
                class_ids: None,
                status: None,
            })
            .expect_err("no classes");
        assert_eq!(e.details(), Some(serde_json::json!({ "field": "classIds" })));
    }

    #[test]
    fn draft_then_publish() {
        let mut store = seed::demo().expect("seed");
        let a = store
            .create_announcement(AnnouncementInput {
                title: "Sports day".into(),
                message: "Friday".into(),
                kind: AnnouncementType::Event,
                target_audience: Audience::AllStudents,
                class_ids: None,
                status: Some(AnnouncementStatus::Draft),
            })
            .expect("draft");
        assert_eq!(store.list_announcements(None)[0].id, a.id);
        assert_eq!(store.list_announcements(Some(AnnouncementStatus::Draft)).len(), 1);
        store.publish_announcement(&a.id).expect("publish");
        assert_eq!(
            store.publish_announcement(&a.id).expect_err("twice").code(),
            "invalid_transition"
        );
    }

    #[test]
    fn publishing_requires_complete_results() {
        let mut store = seed::demo().expect("seed");
        let rows = store.publishing_classes(None).expect("rows");
        let ready: Vec<&str> = rows
            .iter()
            .filter(|r| r.results_ready)
            .map(|r| r.class_id.as_str())
            .collect();
        assert_eq!(ready, vec!["1", "3"]);

        let e = store.publish_results("2", None, email_only()).expect_err("chemistry missing");
        assert_eq!(e.code(), "conflict");

        store
            .enter_result(ResultInput {
                student_id: "STU002".into(),
                subject_id: "3".into(),
                class_id: None,
                semester: None,
                score: 70.0,
                teacher_id: None,
            })
            .expect("enter");
        let before = store.announcements.len();
        let p = store.publish_results("2", None, email_only()).expect("publish");
        assert_eq!(p.semester, DEMO_SEMESTER);
        assert_eq!(p.students_notified, 1);
        assert_eq!(store.announcements.len(), before + 1);
        assert!(store.publish_results("2", None, email_only()).is_err());
    }

    #[test]
    fn publishing_needs_a_channel() {
        let mut store = seed::demo().expect("seed");
        let e = store
            .publish_results("1", None, Channels::default())
            .expect_err("no channel");
        assert_eq!(e.details(), Some(serde_json::json!({ "field": "channels" })));
    }

    #[test]
    fn notifications_to_parents_use_parent_contacts() {
        let mut store = seed::demo().expect("seed");
        let out = store
            .send_notification(NotificationInput {
                audience: Audience::Parents,
                class_ids: None,
                message: "Meeting on Friday".into(),
                channels: Channels {
                    email: true,
                    sms: true,
                    in_app: false,
                },
            })
            .expect("send");
        assert_eq!(out.len(), 12);
        assert_eq!(out[0].recipient, "John Johnson");
        assert_eq!(out[0].address, "parent1@email.com");
        assert!(out.iter().all(|d| d.status == "logged"));
    }
}
