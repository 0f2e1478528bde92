pub mod academics;
pub mod analytics;
pub mod announcements;
pub mod core;
pub mod grading;
pub mod results;
pub mod roles;
pub mod session;
pub mod settings;
pub mod students;
pub mod uploads;
