//! Demo dataset the UI starts with when `RESULTSD_SEED=demo`.

use crate::model::{
    ActivityEntry, ActivityKind, AdminUser, Announcement, AnnouncementStatus, AnnouncementType,
    Audience, BulkUpload, ClassLevel, Department, Form, Program, Student, StudentStatus, Subject,
    SubjectType, UploadStatus,
};
use crate::permissions::{Action, AdminPermission, AdminRole};

use super::{ResultInput, Store, StoreError};

pub const DEMO_SEMESTER: &str = "2023/2024 - Semester 2";
const PREVIOUS_SEMESTER: &str = "2023/2024 - Semester 1";

fn program(id: &str, dept: &str, name: &str, description: &str) -> Program {
    Program {
        id: id.into(),
        name: name.into(),
        department_id: dept.into(),
        description: description.into(),
    }
}

fn departments() -> Vec<Department> {
    let dept = |id: &str, name: &str, description: &str, programs: Vec<Program>| Department {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        programs,
    };
    vec![
        dept(
            "1",
            "General Science",
            "Mathematics, Physics, Chemistry, Biology focus",
            vec![
                program("1", "1", "Pure Science", "Advanced science subjects"),
                program("2", "1", "Applied Science", "Practical science applications"),
            ],
        ),
        dept(
            "2",
            "General Arts",
            "Languages, Literature, History, Geography focus",
            vec![
                program("3", "2", "Humanities", "Literature and social studies"),
                program("4", "2", "Languages", "Modern and classical languages"),
            ],
        ),
        dept(
            "3",
            "Business",
            "Commerce, Economics, Accounting focus",
            vec![
                program("5", "3", "Commerce", "Business and trade studies"),
                program("6", "3", "Economics", "Economic theory and practice"),
            ],
        ),
        dept(
            "4",
            "Technical",
            "Engineering, Technology, Computer Science focus",
            vec![
                program("7", "4", "Engineering", "Basic engineering principles"),
                program("8", "4", "ICT", "Information and Communication Technology"),
            ],
        ),
        dept(
            "5",
            "Visual Arts",
            "Art, Design, Creative studies focus",
            vec![
                program("9", "5", "Fine Arts", "Painting, sculpture, drawing"),
                program("10", "5", "Graphic Design", "Digital and print design"),
            ],
        ),
    ]
}

fn classes() -> Vec<ClassLevel> {
    let class = |id: &str, form: Form, track: &str, dept: &str, prog: &str, cap: u32, cur: u32| {
        ClassLevel {
            id: id.into(),
            form,
            track: track.into(),
            department_id: dept.into(),
            program_id: prog.into(),
            capacity: cap,
            current_enrollment: cur,
        }
    };
    vec![
        class("1", Form::One, "Science A", "1", "1", 40, 35),
        class("2", Form::One, "Science B", "1", "1", 40, 38),
        class("3", Form::Two, "Arts A", "2", "3", 35, 32),
        class("4", Form::Three, "Business A", "3", "5", 30, 28),
        class("5", Form::Two, "Technical A", "4", "7", 25, 22),
    ]
}

fn subjects() -> Vec<Subject> {
    let subject = |id: &str,
                   name: &str,
                   code: &str,
                   dept: &str,
                   kind: SubjectType,
                   description: &str,
                   classes: &[&str]| Subject {
        id: id.into(),
        name: name.into(),
        code: code.into(),
        department_id: dept.into(),
        kind,
        description: description.into(),
        assigned_classes: classes.iter().map(|c| (*c).to_string()).collect(),
        teacher_id: None,
    };
    vec![
        subject("1", "Mathematics", "MATH101", "1", SubjectType::Core, "Core mathematics including algebra and geometry", &["1", "2"]),
        subject("2", "Physics", "PHYS101", "1", SubjectType::Core, "Introduction to mechanics and thermodynamics", &["1", "2"]),
        subject("3", "Chemistry", "CHEM101", "1", SubjectType::Core, "Basic chemistry principles and reactions", &["1", "2"]),
        subject("4", "Biology", "BIO101", "1", SubjectType::Elective, "Life sciences and biological processes", &["1"]),
        subject("5", "English Literature", "ENG101", "2", SubjectType::Core, "Poetry, prose, and drama analysis", &["3"]),
        subject("6", "History", "HIST101", "2", SubjectType::Core, "World history and African studies", &["3"]),
        subject("7", "Economics", "ECON101", "3", SubjectType::Core, "Microeconomics and macroeconomics basics", &["4"]),
        subject("8", "Computer Science", "CS101", "4", SubjectType::Core, "Programming fundamentals and algorithms", &["5"]),
    ]
}

struct StudentSeed {
    id: &'static str,
    name: &'static str,
    number: &'static str,
    class_id: &'static str,
    dob: &'static str,
    guardian: &'static str,
    admitted: &'static str,
    status: StudentStatus,
}

fn students(classes: &[ClassLevel]) -> Vec<Student> {
    let seeds = [
        StudentSeed { id: "1", name: "Sarah Johnson", number: "STU001", class_id: "1", dob: "2005-03-15", guardian: "John Johnson", admitted: "2022-09-01", status: StudentStatus::Active },
        StudentSeed { id: "2", name: "Michael Chen", number: "STU002", class_id: "2", dob: "2005-05-20", guardian: "Lisa Chen", admitted: "2022-09-01", status: StudentStatus::Active },
        StudentSeed { id: "3", name: "Emily Davis", number: "STU003", class_id: "3", dob: "2006-01-10", guardian: "Robert Davis", admitted: "2023-09-01", status: StudentStatus::Suspended },
        StudentSeed { id: "4", name: "John Doe", number: "STU004", class_id: "1", dob: "2005-08-02", guardian: "Mary Doe", admitted: "2023-09-01", status: StudentStatus::Active },
        StudentSeed { id: "5", name: "Jane Smith", number: "STU005", class_id: "1", dob: "2005-11-23", guardian: "Peter Smith", admitted: "2023-09-01", status: StudentStatus::Active },
        StudentSeed { id: "6", name: "Bob Johnson", number: "STU006", class_id: "3", dob: "2006-04-30", guardian: "Alice Johnson", admitted: "2023-09-01", status: StudentStatus::Active },
    ];

    seeds
        .iter()
        .enumerate()
        .filter_map(|(idx, s)| {
            let class = classes.iter().find(|c| c.id == s.class_id)?;
            let handle = s.name.to_ascii_lowercase().replace(' ', ".");
            Some(Student {
                id: s.id.into(),
                name: s.name.into(),
                student_id: s.number.into(),
                email: format!("{handle}@email.com"),
                phone: format!("+12345678{:02}", 90 + idx),
                parent_email: format!("parent{}@email.com", idx + 1),
                parent_phone: format!("+12345678{:02}", 99 - idx),
                department_id: class.department_id.clone(),
                program_id: class.program_id.clone(),
                class_id: class.id.clone(),
                form: class.form,
                date_of_birth: s.dob.into(),
                address: format!("{} Main St", 100 + idx * 111),
                guardian_name: s.guardian.into(),
                admission_date: s.admitted.into(),
                status: s.status,
            })
        })
        .collect()
}

fn admin_users() -> Vec<AdminUser> {
    vec![
        AdminUser {
            id: "1".into(),
            name: "John Administrator".into(),
            email: "admin@meghis.edu".into(),
            role: AdminRole::SuperAdmin,
            department_id: None,
            assigned_subjects: None,
            permissions: AdminRole::SuperAdmin.template(),
        },
        AdminUser {
            id: "2".into(),
            name: "Sarah Academic Head".into(),
            email: "academic@meghis.edu".into(),
            role: AdminRole::AcademicAdmin,
            department_id: None,
            assigned_subjects: None,
            permissions: AdminRole::AcademicAdmin.template(),
        },
        AdminUser {
            id: "3".into(),
            name: "Michael Science Head".into(),
            email: "science.head@meghis.edu".into(),
            role: AdminRole::DepartmentHead,
            department_id: Some("1".into()),
            assigned_subjects: None,
            permissions: vec![
                AdminPermission {
                    resource: "students".into(),
                    actions: vec![Action::Read],
                },
                AdminPermission {
                    resource: "results".into(),
                    actions: vec![Action::Read],
                },
            ],
        },
        AdminUser {
            id: "4".into(),
            name: "Emily Mathematics Teacher".into(),
            email: "math.teacher@meghis.edu".into(),
            role: AdminRole::Teacher,
            department_id: None,
            assigned_subjects: Some(vec!["1".into(), "2".into()]),
            permissions: AdminRole::Teacher.template(),
        },
    ]
}

fn announcements() -> Vec<Announcement> {
    vec![
        Announcement {
            id: "1".into(),
            title: "Semester Results Published".into(),
            message: "The results for Semester 2 are now available. Students can log in to view their results.".into(),
            kind: AnnouncementType::ResultPublished,
            target_audience: Audience::AllStudents,
            class_ids: None,
            created_at: "2024-01-15".into(),
            status: AnnouncementStatus::Published,
            created_by: "Admin".into(),
        },
        Announcement {
            id: "2".into(),
            title: "Parent-Teacher Meeting".into(),
            message: "Parent-teacher meetings scheduled for next week. Please check the schedule.".into(),
            kind: AnnouncementType::Event,
            target_audience: Audience::Parents,
            class_ids: None,
            created_at: "2024-01-14".into(),
            status: AnnouncementStatus::Published,
            created_by: "Admin".into(),
        },
    ]
}

fn bulk_uploads() -> Vec<BulkUpload> {
    vec![
        BulkUpload {
            id: "1".into(),
            file_name: "mathematics_form1_results.csv".into(),
            class_id: "1".into(),
            subject_id: "1".into(),
            uploaded_by: "admin001".into(),
            uploaded_at: "2024-01-15 10:30:00".into(),
            status: UploadStatus::Completed,
            total_records: 28,
            processed_records: 28,
            errors: Vec::new(),
        },
        BulkUpload {
            id: "2".into(),
            file_name: "physics_form1_results.xlsx".into(),
            class_id: "1".into(),
            subject_id: "2".into(),
            uploaded_by: "teacher002".into(),
            uploaded_at: "2024-01-14 14:20:00".into(),
            status: UploadStatus::Failed,
            total_records: 28,
            processed_records: 15,
            errors: vec![
                "Invalid score format in row 16".into(),
                "Missing student ID in row 23".into(),
            ],
        },
    ]
}

fn activity() -> Vec<ActivityEntry> {
    let entry = |action: &str, user: &str, details: &str, ts: &str, kind: ActivityKind| ActivityEntry {
        action: action.into(),
        user: user.into(),
        details: details.into(),
        timestamp: ts.into(),
        kind,
    };
    vec![
        entry("System Update", "System", "Grading system configuration updated", "2024-01-15 14:10:00", ActivityKind::Info),
        entry("Failed Login", "Unknown", "Failed login attempt with student ID: STU999", "2024-01-15 14:15:00", ActivityKind::Warning),
        entry("Admin Login", "Dr. Patricia Mensah", "Super admin logged in", "2024-01-15 14:20:00", ActivityKind::Info),
        entry("Student Login", "Sarah Johnson (STU001)", "Student logged in successfully", "2024-01-15 14:25:00", ActivityKind::Info),
        entry("Result Upload", "Mr. Kwame Asante", "Uploaded Mathematics results for Form 2A", "2024-01-15 14:30:00", ActivityKind::Success),
    ]
}

// (student, subject, semester, score)
const SCORES: &[(&str, &str, &str, f64)] = &[
    ("1", "1", DEMO_SEMESTER, 92.0),
    ("1", "2", DEMO_SEMESTER, 88.0),
    ("1", "3", DEMO_SEMESTER, 85.0),
    ("1", "4", DEMO_SEMESTER, 90.0),
    ("4", "1", DEMO_SEMESTER, 64.0),
    ("4", "2", DEMO_SEMESTER, 71.0),
    ("4", "3", DEMO_SEMESTER, 58.0),
    ("4", "4", DEMO_SEMESTER, 66.0),
    ("5", "1", DEMO_SEMESTER, 81.0),
    ("5", "2", DEMO_SEMESTER, 77.0),
    ("5", "3", DEMO_SEMESTER, 93.0),
    ("5", "4", DEMO_SEMESTER, 74.0),
    ("2", "1", DEMO_SEMESTER, 78.0),
    ("2", "2", DEMO_SEMESTER, 81.0),
    ("3", "5", DEMO_SEMESTER, 45.0),
    ("3", "6", DEMO_SEMESTER, 52.0),
    ("6", "5", DEMO_SEMESTER, 68.0),
    ("6", "6", DEMO_SEMESTER, 73.0),
    ("1", "1", PREVIOUS_SEMESTER, 87.0),
    ("1", "2", PREVIOUS_SEMESTER, 84.0),
];

/// The original demo school: five departments, five classes, eight subjects, six
/// students and a semester of results.
pub fn demo() -> Result<Store, StoreError> {
    let mut store = Store::empty();
    store.departments = departments();
    store.classes = classes();
    store.subjects = subjects();
    store.students = students(&store.classes);
    store.admin_users = admin_users();
    store.announcements = announcements();
    store.bulk_uploads = bulk_uploads();

    for (student, subject, semester, score) in SCORES {
        store.enter_result(ResultInput {
            student_id: (*student).to_string(),
            subject_id: (*subject).to_string(),
            class_id: None,
            semester: Some((*semester).to_string()),
            score: *score,
            teacher_id: Some("seed".to_string()),
        })?;
    }

    store.activity = activity();
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_seed_is_consistent() {
        let store = demo().expect("seed");
        assert_eq!(store.departments.len(), 5);
        assert_eq!(store.students.len(), 6);
        assert_eq!(store.results.len(), SCORES.len());
        for s in &store.students {
            assert!(store.classes.iter().any(|c| c.id == s.class_id));
        }
        let defaults = store.grading_systems.iter().filter(|g| g.is_default).count();
        assert_eq!(defaults, 1);
        assert_eq!(store.activity.len(), 5);
    }
}
