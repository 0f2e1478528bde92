use serde::Deserialize;

use crate::model::{ActivityKind, Student, StudentStatus};

use super::{invalid, new_id, not_found, required, today, Store, StoreError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn active(v: &Option<String>) -> Option<&str> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "all")
}

/// AND of every active predicate. `search` matches name or school number
/// case-insensitively; an absent or `"all"` value switches a predicate off.
pub fn filter_students<'a>(students: &'a [Student], filter: &StudentFilter) -> Vec<&'a Student> {
    let search = active(&filter.search).map(str::to_lowercase);
    let class_id = active(&filter.class_id);
    let status = active(&filter.status).map(StudentStatus::parse);

    students
        .iter()
        .filter(|s| match &search {
            Some(q) => {
                s.name.to_lowercase().contains(q.as_str())
                    || s.student_id.to_lowercase().contains(q.as_str())
            }
            None => true,
        })
        .filter(|s| class_id.map_or(true, |c| s.class_id == c))
        .filter(|s| match status {
            // An unknown status value matches nobody.
            Some(wanted) => wanted == Some(s.status),
            None => true,
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub name: String,
    pub student_id: String,
    pub class_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub parent_email: String,
    #[serde(default)]
    pub parent_phone: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub admission_date: Option<String>,
    #[serde(default)]
    pub status: Option<StudentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub class_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub parent_email: Option<String>,
    pub parent_phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub admission_date: Option<String>,
    pub status: Option<StudentStatus>,
}

fn check_email(field: &str, v: &str) -> Result<String, StoreError> {
    let v = v.trim();
    if !v.is_empty() && !v.contains('@') {
        return Err(invalid(field, format!("{field} must contain '@'")));
    }
    Ok(v.to_string())
}

fn check_date(field: &str, v: &str) -> Result<String, StoreError> {
    let v = v.trim();
    if !v.is_empty() && chrono::NaiveDate::parse_from_str(v, "%Y-%m-%d").is_err() {
        return Err(invalid(field, format!("{field} must be a YYYY-MM-DD date")));
    }
    Ok(v.to_string())
}

impl Store {
    /// Looks a student up by internal id or by school number (`STU001`).
    pub fn student(&self, key: &str) -> Result<&Student, StoreError> {
        self.students
            .iter()
            .find(|s| s.id == key)
            .or_else(|| {
                self.students
                    .iter()
                    .find(|s| s.student_id.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| not_found("student", key))
    }

    fn student_index(&self, key: &str) -> Result<usize, StoreError> {
        let id = self.student(key)?.id.clone();
        self.students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found("student", key))
    }

    pub fn class_students(&self, class_id: &str) -> Vec<&Student> {
        self.students.iter().filter(|s| s.class_id == class_id).collect()
    }

    fn check_number_unique(&self, number: &str, except: Option<&str>) -> Result<(), StoreError> {
        if self
            .students
            .iter()
            .any(|s| Some(s.id.as_str()) != except && s.student_id.eq_ignore_ascii_case(number))
        {
            return Err(StoreError::Conflict(format!(
                "student ID {number} is already in use"
            )));
        }
        Ok(())
    }

    fn check_seat(&self, class_id: &str) -> Result<(), StoreError> {
        let class = self
            .class(class_id)
            .map_err(|_| invalid("classId", format!("unknown class {class_id}")))?;
        if class.current_enrollment >= class.capacity {
            return Err(StoreError::Conflict(format!(
                "{} is full ({}/{})",
                class.label(),
                class.current_enrollment,
                class.capacity
            )));
        }
        Ok(())
    }

    pub fn create_student(&mut self, input: StudentInput) -> Result<Student, StoreError> {
        let name = required("name", &input.name)?;
        let number = required("studentId", &input.student_id)?;
        self.check_number_unique(&number, None)?;
        self.check_seat(&input.class_id)?;
        let class = self.class(&input.class_id)?.clone();

        let student = Student {
            id: new_id(),
            name,
            student_id: number,
            email: check_email("email", &input.email)?,
            phone: input.phone.trim().to_string(),
            parent_email: check_email("parentEmail", &input.parent_email)?,
            parent_phone: input.parent_phone.trim().to_string(),
            department_id: class.department_id.clone(),
            program_id: class.program_id.clone(),
            class_id: class.id.clone(),
            form: class.form,
            date_of_birth: check_date("dateOfBirth", &input.date_of_birth)?,
            address: input.address.trim().to_string(),
            guardian_name: input.guardian_name.trim().to_string(),
            admission_date: match input.admission_date.as_deref() {
                Some(d) if !d.trim().is_empty() => check_date("admissionDate", d)?,
                _ => today(),
            },
            status: input.status.unwrap_or(StudentStatus::Active),
        };

        self.class_mut(&class.id)?.current_enrollment += 1;
        self.students.push(student.clone());
        self.record(
            "Student Created",
            format!("{} ({}) added to {}", student.name, student.student_id, class.label()),
            ActivityKind::Success,
        );
        Ok(student)
    }

    pub fn update_student(&mut self, key: &str, patch: StudentPatch) -> Result<Student, StoreError> {
        let idx = self.student_index(key)?;
        let mut next = self.students[idx].clone();
        let old_class = next.class_id.clone();

        if let Some(v) = patch.name.as_deref() {
            next.name = required("name", v)?;
        }
        if let Some(v) = patch.student_id.as_deref() {
            let number = required("studentId", v)?;
            self.check_number_unique(&number, Some(&next.id))?;
            next.student_id = number;
        }
        if let Some(v) = patch.email.as_deref() {
            next.email = check_email("email", v)?;
        }
        if let Some(v) = patch.parent_email.as_deref() {
            next.parent_email = check_email("parentEmail", v)?;
        }
        if let Some(v) = patch.phone {
            next.phone = v.trim().to_string();
        }
        if let Some(v) = patch.parent_phone {
            next.parent_phone = v.trim().to_string();
        }
        if let Some(v) = patch.date_of_birth.as_deref() {
            next.date_of_birth = check_date("dateOfBirth", v)?;
        }
        if let Some(v) = patch.admission_date.as_deref() {
            next.admission_date = check_date("admissionDate", v)?;
        }
        if let Some(v) = patch.address {
            next.address = v.trim().to_string();
        }
        if let Some(v) = patch.guardian_name {
            next.guardian_name = v.trim().to_string();
        }
        if let Some(v) = patch.status {
            next.status = v;
        }

        let moving = patch
            .class_id
            .as_deref()
            .filter(|c| *c != old_class)
            .map(str::to_string);
        if let Some(new_class) = &moving {
            self.check_seat(new_class)?;
            let class = self.class(new_class)?;
            next.class_id = class.id.clone();
            next.department_id = class.department_id.clone();
            next.program_id = class.program_id.clone();
            next.form = class.form;
        }

        if let Some(new_class) = &moving {
            if let Ok(c) = self.class_mut(&old_class) {
                c.current_enrollment = c.current_enrollment.saturating_sub(1);
            }
            self.class_mut(new_class)?.current_enrollment += 1;
        }
        self.students[idx] = next.clone();
        let details = match &moving {
            Some(c) => format!("{} moved to {}", next.name, self.class_label(c)),
            None => format!("{} ({})", next.name, next.student_id),
        };
        self.record("Student Updated", details, ActivityKind::Info);
        Ok(next)
    }

    pub fn set_student_status(&mut self, key: &str, status: StudentStatus) -> Result<Student, StoreError> {
        let idx = self.student_index(key)?;
        self.students[idx].status = status;
        let out = self.students[idx].clone();
        self.record(
            "Student Status Changed",
            format!("{} is now {}", out.student_id, status.as_str()),
            ActivityKind::Info,
        );
        Ok(out)
    }

    /// Removes the student, their results and their seat in the class.
    pub fn delete_student(&mut self, key: &str) -> Result<usize, StoreError> {
        let idx = self.student_index(key)?;
        let student = self.students.remove(idx);
        let before = self.results.len();
        self.results.retain(|r| r.student_id != student.id);
        let removed = before - self.results.len();
        if let Ok(c) = self.class_mut(&student.class_id) {
            c.current_enrollment = c.current_enrollment.saturating_sub(1);
        }
        self.record(
            "Student Deleted",
            format!("{} ({}), {removed} results removed", student.name, student.student_id),
            ActivityKind::Warning,
        );
        Ok(removed)
    }
}
