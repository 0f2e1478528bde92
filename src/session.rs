use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Settings,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AdminTab {
    #[default]
    Overview,
    Departments,
    Classes,
    Subjects,
    Students,
    Grading,
    Results,
    Publishing,
    Announcements,
    Roles,
    Analytics,
}

impl AdminTab {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "overview" => Some(Self::Overview),
            "departments" => Some(Self::Departments),
            "classes" => Some(Self::Classes),
            "subjects" => Some(Self::Subjects),
            "students" => Some(Self::Students),
            "grading" => Some(Self::Grading),
            "results" => Some(Self::Results),
            "publishing" => Some(Self::Publishing),
            "announcements" => Some(Self::Announcements),
            "roles" => Some(Self::Roles),
            "analytics" => Some(Self::Analytics),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn { role: Role, user_id: String },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("cannot {0}")]
    InvalidTransition(&'static str),
    #[error("new password and confirmation do not match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub auth: AuthState,
    pub view: View,
    pub admin_tab: AdminTab,
    /// Which login form is showing while logged out.
    pub admin_login: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            auth: AuthState::LoggedOut,
            view: View::Dashboard,
            admin_tab: AdminTab::Overview,
            admin_login: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub current_view: View,
    pub admin_tab: AdminTab,
    pub admin_login: bool,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        matches!(self.auth, AuthState::LoggedIn { .. })
    }

    pub fn role(&self) -> Option<Role> {
        match &self.auth {
            AuthState::LoggedIn { role, .. } => Some(*role),
            AuthState::LoggedOut => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.auth {
            AuthState::LoggedIn { user_id, .. } => Some(user_id.as_str()),
            AuthState::LoggedOut => None,
        }
    }

    /// Credentials are accepted as-is; only presence is checked.
    pub fn login(&mut self, user_id: &str, password: &str, admin: bool) -> Result<(), SessionError> {
        if self.is_logged_in() {
            return Err(SessionError::InvalidTransition("log in while already logged in"));
        }
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(SessionError::MissingField("userId"));
        }
        if password.is_empty() {
            return Err(SessionError::MissingField("password"));
        }
        let role = if admin { Role::Admin } else { Role::Student };
        *self = Session {
            auth: AuthState::LoggedIn {
                role,
                user_id: user_id.to_string(),
            },
            ..Session::default()
        };
        Ok(())
    }

    pub fn logout(&mut self) {
        *self = Session::default();
    }

    pub fn toggle_settings(&mut self) -> Result<View, SessionError> {
        if !self.is_logged_in() {
            return Err(SessionError::InvalidTransition("open settings while logged out"));
        }
        self.view = match self.view {
            View::Dashboard => View::Settings,
            View::Settings => View::Dashboard,
        };
        Ok(self.view)
    }

    pub fn select_tab(&mut self, tab: AdminTab) -> Result<(), SessionError> {
        if self.role() != Some(Role::Admin) {
            return Err(SessionError::InvalidTransition("select an admin tab without an admin session"));
        }
        self.admin_tab = tab;
        Ok(())
    }

    pub fn toggle_login_mode(&mut self) -> Result<bool, SessionError> {
        if self.is_logged_in() {
            return Err(SessionError::InvalidTransition("switch login form while logged in"));
        }
        self.admin_login = !self.admin_login;
        Ok(self.admin_login)
    }

    pub fn change_password(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), SessionError> {
        if !self.is_logged_in() {
            return Err(SessionError::InvalidTransition("change password while logged out"));
        }
        if current.is_empty() {
            return Err(SessionError::MissingField("currentPassword"));
        }
        if new.is_empty() {
            return Err(SessionError::MissingField("newPassword"));
        }
        if new != confirm {
            return Err(SessionError::PasswordMismatch);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: if self.is_logged_in() { "loggedIn" } else { "loggedOut" },
            role: self.role(),
            user_id: self.user_id().map(str::to_string),
            current_view: self.view,
            admin_tab: self.admin_tab,
            admin_login: self.admin_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_login_then_logout_resets_view() {
        let mut s = Session::default();
        s.login("STU001", "secret", false).expect("login");
        assert_eq!(s.role(), Some(Role::Student));
        assert_eq!(s.view, View::Dashboard);

        assert_eq!(s.toggle_settings(), Ok(View::Settings));
        s.logout();
        assert_eq!(s, Session::default());
        assert_eq!(s.snapshot().current_view, View::Dashboard);
    }

    #[test]
    fn login_requires_both_fields() {
        let mut s = Session::default();
        assert_eq!(s.login("  ", "x", false), Err(SessionError::MissingField("userId")));
        assert_eq!(s.login("STU001", "", false), Err(SessionError::MissingField("password")));
        assert!(!s.is_logged_in());
    }

    #[test]
    fn double_login_is_rejected() {
        let mut s = Session::default();
        s.login("admin", "pw", true).expect("login");
        assert!(matches!(
            s.login("admin", "pw", true),
            Err(SessionError::InvalidTransition(_))
        ));
    }

    #[test]
    fn tabs_are_admin_only() {
        let mut s = Session::default();
        s.login("STU001", "pw", false).expect("login");
        assert!(s.select_tab(AdminTab::Grading).is_err());
        s.logout();
        s.login("admin", "pw", true).expect("login");
        s.select_tab(AdminTab::Grading).expect("select");
        assert_eq!(s.admin_tab, AdminTab::Grading);
        s.toggle_settings().expect("toggle");
        assert_eq!(s.admin_tab, AdminTab::Grading);
        assert!(s.is_logged_in());
    }

    #[test]
    fn login_mode_toggles_only_when_logged_out() {
        let mut s = Session::default();
        assert_eq!(s.toggle_login_mode(), Ok(true));
        s.login("admin", "pw", s.admin_login).expect("login");
        assert_eq!(s.role(), Some(Role::Admin));
        assert!(s.toggle_login_mode().is_err());
        s.logout();
        assert!(!s.admin_login);
    }

    #[test]
    fn password_change_checks_confirmation() {
        let mut s = Session::default();
        s.login("STU001", "pw", false).expect("login");
        assert_eq!(
            s.change_password("pw", "new-secret", "new-secrt"),
            Err(SessionError::PasswordMismatch)
        );
        assert_eq!(s.change_password("pw", "new-secret", "new-secret"), Ok(()));
    }
}
