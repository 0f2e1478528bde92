use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "read" => Some(Self::Read),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

pub const RESOURCES: [&str; 7] = [
    "students",
    "results",
    "departments",
    "subjects",
    "classes",
    "users",
    "notifications",
];

const ALL_ACTIONS: &[Action] = &[Action::Create, Action::Read, Action::Update, Action::Delete];

type Template = &'static [(&'static str, &'static [Action])];

const SUPER_ADMIN: Template = &[
    ("students", ALL_ACTIONS),
    ("results", ALL_ACTIONS),
    ("departments", ALL_ACTIONS),
    ("subjects", ALL_ACTIONS),
    ("classes", ALL_ACTIONS),
    ("users", ALL_ACTIONS),
    ("notifications", ALL_ACTIONS),
];

const ACADEMIC_ADMIN: Template = &[
    ("students", &[Action::Read, Action::Update]),
    ("results", &[Action::Create, Action::Read, Action::Update]),
    ("subjects", &[Action::Create, Action::Read, Action::Update]),
    ("classes", &[Action::Read, Action::Update]),
];

const DEPARTMENT_HEAD: Template = &[
    ("students", &[Action::Read]),
    ("results", &[Action::Read]),
    ("subjects", &[Action::Read]),
];

const TEACHER: Template = &[
    ("students", &[Action::Read]),
    ("results", &[Action::Create, Action::Read, Action::Update]),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    AcademicAdmin,
    DepartmentHead,
    Teacher,
}

impl AdminRole {
    pub const ALL: [AdminRole; 4] = [
        AdminRole::SuperAdmin,
        AdminRole::AcademicAdmin,
        AdminRole::DepartmentHead,
        AdminRole::Teacher,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(Self::SuperAdmin),
            "academic_admin" => Some(Self::AcademicAdmin),
            "department_head" => Some(Self::DepartmentHead),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::AcademicAdmin => "academic_admin",
            Self::DepartmentHead => "department_head",
            Self::Teacher => "teacher",
        }
    }

    fn table(self) -> Template {
        match self {
            Self::SuperAdmin => SUPER_ADMIN,
            Self::AcademicAdmin => ACADEMIC_ADMIN,
            Self::DepartmentHead => DEPARTMENT_HEAD,
            Self::Teacher => TEACHER,
        }
    }

    pub fn template(self) -> Vec<AdminPermission> {
        self.table()
            .iter()
            .map(|(resource, actions)| AdminPermission {
                resource: (*resource).to_string(),
                actions: actions.to_vec(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminPermission {
    pub resource: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

pub fn parse_role(s: &str) -> Result<AdminRole, PermissionError> {
    AdminRole::parse(s).ok_or_else(|| PermissionError::UnknownRole(s.to_string()))
}

pub fn parse_resource(s: &str) -> Result<&'static str, PermissionError> {
    RESOURCES
        .iter()
        .copied()
        .find(|r| *r == s)
        .ok_or_else(|| PermissionError::UnknownResource(s.to_string()))
}

pub fn parse_action(s: &str) -> Result<Action, PermissionError> {
    Action::parse(s).ok_or_else(|| PermissionError::UnknownAction(s.to_string()))
}

/// Adds or removes exactly one action on one resource entry.
///
/// Enabling an action on a resource with no entry creates `{resource, [action]}`.
/// Disabling the last action of a resource drops its entry.
pub fn toggle(perms: &mut Vec<AdminPermission>, resource: &str, action: Action, on: bool) {
    match perms.iter().position(|p| p.resource == resource) {
        Some(idx) => {
            let entry = &mut perms[idx];
            if on {
                if !entry.actions.contains(&action) {
                    entry.actions.push(action);
                }
            } else {
                entry.actions.retain(|a| *a != action);
                if entry.actions.is_empty() {
                    perms.remove(idx);
                }
            }
        }
        None if on => perms.push(AdminPermission {
            resource: resource.to_string(),
            actions: vec![action],
        }),
        None => {}
    }
}

pub fn allows(perms: &[AdminPermission], resource: &str, action: Action) -> bool {
    perms
        .iter()
        .find(|p| p.resource == resource)
        .map(|p| p.actions.contains(&action))
        .unwrap_or(false)
}
