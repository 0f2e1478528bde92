use serde::Deserialize;
use std::collections::HashSet;

use crate::model::{ActivityKind, ClassLevel, Department, Form, Program, Subject, SubjectType};

use super::{invalid, new_id, not_found, required, Store, StoreError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInput {
    pub form: Form,
    pub track: String,
    pub department_id: String,
    pub program_id: String,
    pub capacity: u32,
    #[serde(default)]
    pub current_enrollment: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPatch {
    pub form: Option<Form>,
    pub track: Option<String>,
    pub department_id: Option<String>,
    pub program_id: Option<String>,
    pub capacity: Option<u32>,
    pub current_enrollment: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInput {
    pub name: String,
    pub code: String,
    pub department_id: String,
    #[serde(rename = "type")]
    pub kind: SubjectType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_classes: Vec<String>,
    #[serde(default)]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub department_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<SubjectType>,
    pub description: Option<String>,
    pub assigned_classes: Option<Vec<String>>,
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectFilter {
    pub class_id: Option<String>,
    pub department_id: Option<String>,
    pub kind: Option<SubjectType>,
}

impl Store {
    pub fn department(&self, id: &str) -> Result<&Department, StoreError> {
        self.departments
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found("department", id))
    }

    fn department_mut(&mut self, id: &str) -> Result<&mut Department, StoreError> {
        self.departments
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found("department", id))
    }

    pub fn department_name(&self, id: &str) -> String {
        self.department(id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    pub fn create_department(&mut self, input: DepartmentInput) -> Result<Department, StoreError> {
        let name = required("name", input.name.as_deref().unwrap_or(""))?;
        if self
            .departments
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(&name))
        {
            return Err(StoreError::Conflict(format!("department '{name}' already exists")));
        }
        let dept = Department {
            id: new_id(),
            name,
            description: input.description.unwrap_or_default().trim().to_string(),
            programs: Vec::new(),
        };
        self.departments.push(dept.clone());
        self.record("Department Created", dept.name.clone(), ActivityKind::Success);
        Ok(dept)
    }

    pub fn update_department(&mut self, id: &str, patch: DepartmentInput) -> Result<Department, StoreError> {
        let name = match patch.name.as_deref() {
            Some(n) => Some(required("name", n)?),
            None => None,
        };
        if let Some(n) = &name {
            if self
                .departments
                .iter()
                .any(|d| d.id != id && d.name.eq_ignore_ascii_case(n))
            {
                return Err(StoreError::Conflict(format!("department '{n}' already exists")));
            }
        }
        let dept = self.department_mut(id)?;
        if let Some(n) = name {
            dept.name = n;
        }
        if let Some(d) = patch.description {
            dept.description = d.trim().to_string();
        }
        let out = dept.clone();
        self.record("Department Updated", out.name.clone(), ActivityKind::Info);
        Ok(out)
    }

    pub fn delete_department(&mut self, id: &str) -> Result<(), StoreError> {
        let name = self.department(id)?.name.clone();
        let in_use = self.classes.iter().any(|c| c.department_id == id)
            || self.subjects.iter().any(|s| s.department_id == id)
            || self.students.iter().any(|s| s.department_id == id);
        if in_use {
            return Err(StoreError::Conflict(format!(
                "department '{name}' still has classes, subjects or students"
            )));
        }
        self.departments.retain(|d| d.id != id);
        self.record("Department Deleted", name, ActivityKind::Warning);
        Ok(())
    }

    pub fn add_program(&mut self, department_id: &str, input: ProgramInput) -> Result<Program, StoreError> {
        let name = required("name", input.name.as_deref().unwrap_or(""))?;
        let dept = self.department_mut(department_id)?;
        if dept.programs.iter().any(|p| p.name.eq_ignore_ascii_case(&name)) {
            return Err(StoreError::Conflict(format!("program '{name}' already exists")));
        }
        let program = Program {
            id: new_id(),
            name,
            department_id: department_id.to_string(),
            description: input.description.unwrap_or_default().trim().to_string(),
        };
        dept.programs.push(program.clone());
        self.record("Program Added", program.name.clone(), ActivityKind::Success);
        Ok(program)
    }

    pub fn update_program(
        &mut self,
        department_id: &str,
        program_id: &str,
        patch: ProgramInput,
    ) -> Result<Program, StoreError> {
        let name = match patch.name.as_deref() {
            Some(n) => Some(required("name", n)?),
            None => None,
        };
        let dept = self.department_mut(department_id)?;
        let program = dept
            .programs
            .iter_mut()
            .find(|p| p.id == program_id)
            .ok_or_else(|| not_found("program", program_id))?;
        if let Some(n) = name {
            program.name = n;
        }
        if let Some(d) = patch.description {
            program.description = d.trim().to_string();
        }
        let out = program.clone();
        self.record("Program Updated", out.name.clone(), ActivityKind::Info);
        Ok(out)
    }

    pub fn remove_program(&mut self, department_id: &str, program_id: &str) -> Result<(), StoreError> {
        let in_use = self.classes.iter().any(|c| c.program_id == program_id)
            || self.students.iter().any(|s| s.program_id == program_id);
        let dept = self.department_mut(department_id)?;
        let Some(idx) = dept.programs.iter().position(|p| p.id == program_id) else {
            return Err(not_found("program", program_id));
        };
        if in_use {
            return Err(StoreError::Conflict(
                "program is still referenced by classes or students".into(),
            ));
        }
        let removed = dept.programs.remove(idx);
        self.record("Program Removed", removed.name, ActivityKind::Warning);
        Ok(())
    }

    fn check_program(&self, department_id: &str, program_id: &str) -> Result<(), StoreError> {
        let dept = self
            .department(department_id)
            .map_err(|_| invalid("departmentId", format!("unknown department {department_id}")))?;
        if !dept.programs.iter().any(|p| p.id == program_id) {
            return Err(invalid(
                "programId",
                format!("program {program_id} does not belong to {}", dept.name),
            ));
        }
        Ok(())
    }

    pub fn class(&self, id: &str) -> Result<&ClassLevel, StoreError> {
        self.classes
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("class", id))
    }

    pub(crate) fn class_mut(&mut self, id: &str) -> Result<&mut ClassLevel, StoreError> {
        self.classes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("class", id))
    }

    pub fn class_label(&self, id: &str) -> String {
        self.class(id)
            .map(ClassLevel::label)
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    pub fn program_name(&self, department_id: &str, program_id: &str) -> String {
        self.department(department_id)
            .ok()
            .and_then(|d| d.programs.iter().find(|p| p.id == program_id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn create_class(&mut self, input: ClassInput) -> Result<ClassLevel, StoreError> {
        let track = required("track", &input.track)?;
        self.check_program(&input.department_id, &input.program_id)?;
        check_capacity(input.capacity, input.current_enrollment)?;
        if self
            .classes
            .iter()
            .any(|c| c.form == input.form && c.track.eq_ignore_ascii_case(&track))
        {
            return Err(StoreError::Conflict(format!(
                "{} - {track} already exists",
                input.form.as_str()
            )));
        }
        let class = ClassLevel {
            id: new_id(),
            form: input.form,
            track,
            department_id: input.department_id,
            program_id: input.program_id,
            capacity: input.capacity,
            current_enrollment: input.current_enrollment,
        };
        self.classes.push(class.clone());
        self.record("Class Created", class.label(), ActivityKind::Success);
        Ok(class)
    }

    pub fn update_class(&mut self, id: &str, patch: ClassPatch) -> Result<ClassLevel, StoreError> {
        let mut next = self.class(id)?.clone();
        if let Some(f) = patch.form {
            next.form = f;
        }
        if let Some(t) = patch.track.as_deref() {
            next.track = required("track", t)?;
        }
        if let Some(d) = patch.department_id {
            next.department_id = d;
        }
        if let Some(p) = patch.program_id {
            next.program_id = p;
        }
        if let Some(c) = patch.capacity {
            next.capacity = c;
        }
        if let Some(e) = patch.current_enrollment {
            next.current_enrollment = e;
        }
        self.check_program(&next.department_id, &next.program_id)?;
        check_capacity(next.capacity, next.current_enrollment)?;
        let seated = self.class_students(id).len() as u32;
        if next.capacity < seated {
            return Err(StoreError::Conflict(format!(
                "{} has {seated} students seated; capacity {} is too low",
                next.label(),
                next.capacity
            )));
        }
        if next.current_enrollment < seated {
            return Err(StoreError::Conflict(format!(
                "{} has {seated} students seated; enrollment {} is too low",
                next.label(),
                next.current_enrollment
            )));
        }

        let class = self.class_mut(id)?;
        *class = next.clone();
        // Students carry their class's placement.
        for s in self.students.iter_mut().filter(|s| s.class_id == id) {
            s.form = next.form;
            s.department_id = next.department_id.clone();
            s.program_id = next.program_id.clone();
        }
        self.record("Class Updated", next.label(), ActivityKind::Info);
        Ok(next)
    }

    pub fn delete_class(&mut self, id: &str) -> Result<(), StoreError> {
        let label = self.class(id)?.label();
        if self.students.iter().any(|s| s.class_id == id) {
            return Err(StoreError::Conflict(format!(
                "class {label} still has students assigned"
            )));
        }
        self.classes.retain(|c| c.id != id);
        for s in &mut self.subjects {
            s.assigned_classes.retain(|c| c != id);
        }
        self.record("Class Deleted", label, ActivityKind::Warning);
        Ok(())
    }

    pub fn subject(&self, id: &str) -> Result<&Subject, StoreError> {
        self.subjects
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("subject", id))
    }

    fn subject_mut(&mut self, id: &str) -> Result<&mut Subject, StoreError> {
        self.subjects
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("subject", id))
    }

    pub fn list_subjects(&self, filter: &SubjectFilter) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|s| {
                filter
                    .class_id
                    .as_ref()
                    .map_or(true, |c| s.assigned_classes.contains(c))
            })
            .filter(|s| {
                filter
                    .department_id
                    .as_ref()
                    .map_or(true, |d| &s.department_id == d)
            })
            .filter(|s| filter.kind.map_or(true, |k| s.kind == k))
            .collect()
    }

    pub fn subjects_for_class(&self, class_id: &str) -> Vec<&Subject> {
        self.list_subjects(&SubjectFilter {
            class_id: Some(class_id.to_string()),
            ..SubjectFilter::default()
        })
    }

    fn check_subject_refs(&self, department_id: &str, classes: &[String]) -> Result<(), StoreError> {
        if self.department(department_id).is_err() {
            return Err(invalid(
                "departmentId",
                format!("unknown department {department_id}"),
            ));
        }
        for c in classes {
            if self.class(c).is_err() {
                return Err(invalid("assignedClasses", format!("unknown class {c}")));
            }
        }
        Ok(())
    }

    fn check_code_unique(&self, code: &str, except: Option<&str>) -> Result<(), StoreError> {
        if self
            .subjects
            .iter()
            .any(|s| Some(s.id.as_str()) != except && s.code.eq_ignore_ascii_case(code))
        {
            return Err(StoreError::Conflict(format!("subject code {code} is already used")));
        }
        Ok(())
    }

    pub fn create_subject(&mut self, input: SubjectInput) -> Result<Subject, StoreError> {
        let name = required("name", &input.name)?;
        let code = required("code", &input.code)?.to_ascii_uppercase();
        let mut classes = input.assigned_classes;
        dedup_classes(&mut classes);
        self.check_subject_refs(&input.department_id, &classes)?;
        self.check_code_unique(&code, None)?;
        let subject = Subject {
            id: new_id(),
            name,
            code,
            department_id: input.department_id,
            kind: input.kind,
            description: input.description.trim().to_string(),
            assigned_classes: classes,
            teacher_id: input.teacher_id,
        };
        self.subjects.push(subject.clone());
        self.record(
            "Subject Created",
            format!("{} ({})", subject.name, subject.code),
            ActivityKind::Success,
        );
        Ok(subject)
    }

    pub fn update_subject(&mut self, id: &str, patch: SubjectPatch) -> Result<Subject, StoreError> {
        let mut next = self.subject(id)?.clone();
        if let Some(n) = patch.name.as_deref() {
            next.name = required("name", n)?;
        }
        if let Some(c) = patch.code.as_deref() {
            next.code = required("code", c)?.to_ascii_uppercase();
        }
        if let Some(d) = patch.department_id {
            next.department_id = d;
        }
        if let Some(k) = patch.kind {
            next.kind = k;
        }
        if let Some(d) = patch.description {
            next.description = d.trim().to_string();
        }
        if let Some(mut c) = patch.assigned_classes {
            dedup_classes(&mut c);
            next.assigned_classes = c;
        }
        if patch.teacher_id.is_some() {
            next.teacher_id = patch.teacher_id;
        }
        self.check_subject_refs(&next.department_id, &next.assigned_classes)?;
        self.check_code_unique(&next.code, Some(id))?;

        *self.subject_mut(id)? = next.clone();
        self.record("Subject Updated", next.name.clone(), ActivityKind::Info);
        Ok(next)
    }

    pub fn delete_subject(&mut self, id: &str) -> Result<(), StoreError> {
        let name = self.subject(id)?.name.clone();
        if self.results.iter().any(|r| r.subject_id == id) {
            return Err(StoreError::Conflict(format!(
                "subject {name} has recorded results"
            )));
        }
        self.subjects.retain(|s| s.id != id);
        self.record("Subject Deleted", name, ActivityKind::Warning);
        Ok(())
    }

    pub fn assign_subject_class(&mut self, subject_id: &str, class_id: &str) -> Result<Subject, StoreError> {
        self.class(class_id)?;
        let subject = self.subject_mut(subject_id)?;
        if !subject.assigned_classes.iter().any(|c| c == class_id) {
            subject.assigned_classes.push(class_id.to_string());
        }
        let out = subject.clone();
        let label = self.class_label(class_id);
        self.record("Subject Assigned", format!("{} -> {label}", out.name), ActivityKind::Info);
        Ok(out)
    }

    pub fn unassign_subject_class(&mut self, subject_id: &str, class_id: &str) -> Result<Subject, StoreError> {
        let subject = self.subject_mut(subject_id)?;
        subject.assigned_classes.retain(|c| c != class_id);
        let out = subject.clone();
        self.record("Subject Unassigned", out.name.clone(), ActivityKind::Info);
        Ok(out)
    }
}

/// Drops repeated class ids, keeping first occurrences in order.
fn dedup_classes(classes: &mut Vec<String>) {
    let mut seen = HashSet::new();
    classes.retain(|c| seen.insert(c.clone()));
}

fn check_capacity(capacity: u32, enrollment: u32) -> Result<(), StoreError> {
    if capacity == 0 {
        return Err(invalid("capacity", "capacity must be greater than zero"));
    }
    if enrollment > capacity {
        return Err(invalid(
            "currentEnrollment",
            format!("enrollment {enrollment} exceeds capacity {capacity}"),
        ));
    }
    Ok(())
}
