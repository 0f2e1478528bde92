use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::grading::{active_system, competition_ranks, mean, round_1, PassStatus};
use crate::model::{ActivityKind, ResultRecord, Student};
use crate::slip::{self, ResultSlip, SlipSubject};

use super::{invalid, new_id, not_found, required, timestamp, Store, StoreError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInput {
    pub student_id: String,
    pub subject_id: String,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFilter {
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
}

/// One line of the result-entry grid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub student_id: String,
    pub student_number: String,
    pub name: String,
    pub status: crate::model::StudentStatus,
    pub result: Option<ResultRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipOutput {
    pub file_name: String,
    pub html: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleOutput {
    pub path: String,
    pub bundle_format: String,
    pub entry_count: usize,
    pub slip_count: usize,
}

impl Store {
    pub(crate) fn semester_or_current(&self, semester: Option<&str>) -> String {
        match semester.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.to_string(),
            None => self.settings.current_term(),
        }
    }

    /// Grades with the default system and upserts on (student, subject, semester).
    pub fn enter_result(&mut self, input: ResultInput) -> Result<ResultRecord, StoreError> {
        let student = self.student(&input.student_id)?.clone();
        let class_id = match input.class_id.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() && c != student.class_id => {
                return Err(invalid(
                    "classId",
                    format!("{} is not enrolled in class {c}", student.student_id),
                ))
            }
            _ => student.class_id.clone(),
        };
        let subject = self.subject(&input.subject_id)?.clone();
        if !subject.assigned_classes.contains(&class_id) {
            return Err(invalid(
                "subjectId",
                format!(
                    "{} is not taught in {}",
                    subject.name,
                    self.class_label(&class_id)
                ),
            ));
        }
        let semester = self.semester_or_current(input.semester.as_deref());
        let outcome = active_system(&self.grading_systems)?.grade(input.score)?;
        let teacher_id = match input.teacher_id.as_deref() {
            Some(t) => required("teacherId", t)?,
            None => self.session.user_id().unwrap_or("System").to_string(),
        };

        let existing = self.results.iter().position(|r| {
            r.student_id == student.id && r.subject_id == subject.id && r.semester == semester
        });
        let record = ResultRecord {
            id: existing
                .map(|i| self.results[i].id.clone())
                .unwrap_or_else(new_id),
            student_id: student.id.clone(),
            subject_id: subject.id.clone(),
            class_id,
            semester,
            score: input.score,
            grade: outcome.grade,
            points: outcome.points,
            remarks: outcome.remark,
            teacher_id,
            uploaded_at: timestamp(),
        };
        let action = match existing {
            Some(i) => {
                self.results[i] = record.clone();
                "Result Updated"
            }
            None => {
                self.results.push(record.clone());
                "Result Entered"
            }
        };
        self.record(
            action,
            format!(
                "{} {}: {} ({})",
                student.student_id, subject.name, record.score, record.grade
            ),
            ActivityKind::Success,
        );
        Ok(record)
    }

    pub fn list_results(&self, filter: &ResultFilter) -> Vec<&ResultRecord> {
        // Accept the school number as well as the internal id.
        let student = filter
            .student_id
            .as_deref()
            .map(|k| self.student(k).map(|s| s.id.clone()).unwrap_or_else(|_| k.to_string()));
        self.results
            .iter()
            .filter(|r| filter.class_id.as_ref().map_or(true, |c| &r.class_id == c))
            .filter(|r| filter.subject_id.as_ref().map_or(true, |s| &r.subject_id == s))
            .filter(|r| student.as_ref().map_or(true, |s| &r.student_id == s))
            .filter(|r| filter.semester.as_ref().map_or(true, |s| &r.semester == s))
            .collect()
    }

    pub fn delete_result(&mut self, id: &str) -> Result<ResultRecord, StoreError> {
        let Some(idx) = self.results.iter().position(|r| r.id == id) else {
            return Err(not_found("result", id));
        };
        let removed = self.results.remove(idx);
        self.record(
            "Result Deleted",
            format!("result {} for student {}", removed.id, removed.student_id),
            ActivityKind::Warning,
        );
        Ok(removed)
    }

    /// Recomputes grade, points and remarks with the current default system.
    /// All-or-nothing: one uncovered score leaves every record untouched.
    pub fn regrade(&mut self, semester: Option<&str>) -> Result<usize, StoreError> {
        let system = active_system(&self.grading_systems)?.clone();
        let mut next = self.results.clone();
        let mut changed = 0;
        for r in next
            .iter_mut()
            .filter(|r| semester.map_or(true, |s| r.semester == s))
        {
            let g = system.grade(r.score)?;
            if g.grade != r.grade || g.points != r.points || g.remark != r.remarks {
                r.grade = g.grade;
                r.points = g.points;
                r.remarks = g.remark;
                changed += 1;
            }
        }
        self.results = next;
        self.record(
            "Results Regraded",
            format!("{changed} results regraded with {}", system.name),
            ActivityKind::Info,
        );
        Ok(changed)
    }

    pub fn roster(
        &self,
        class_id: &str,
        subject_id: &str,
        semester: Option<&str>,
    ) -> Result<Vec<RosterRow>, StoreError> {
        self.class(class_id)?;
        let subject = self.subject(subject_id)?;
        if !subject.assigned_classes.iter().any(|c| c == class_id) {
            return Err(invalid(
                "subjectId",
                format!("{} is not taught in {}", subject.name, self.class_label(class_id)),
            ));
        }
        let semester = self.semester_or_current(semester);
        Ok(self
            .class_students(class_id)
            .into_iter()
            .map(|s| RosterRow {
                student_id: s.id.clone(),
                student_number: s.student_id.clone(),
                name: s.name.clone(),
                status: s.status,
                result: self
                    .results
                    .iter()
                    .find(|r| {
                        r.student_id == s.id && r.subject_id == subject_id && r.semester == semester
                    })
                    .cloned(),
            })
            .collect())
    }

    /// Semesters with at least one result, newest label first.
    pub fn semesters(&self) -> Vec<String> {
        let mut set: BTreeSet<String> = self.results.iter().map(|r| r.semester.clone()).collect();
        set.insert(self.settings.current_term());
        set.into_iter().rev().collect()
    }

    pub fn student_semesters(&self, student_id: &str) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .results
            .iter()
            .filter(|r| r.student_id == student_id)
            .map(|r| r.semester.as_str())
            .collect();
        set.into_iter().rev().map(str::to_string).collect()
    }

    /// A student's results for a semester, in subject catalogue order.
    pub(crate) fn student_results(&self, student_id: &str, semester: &str) -> Vec<&ResultRecord> {
        let mut rows: Vec<&ResultRecord> = self
            .results
            .iter()
            .filter(|r| r.student_id == student_id && r.semester == semester)
            .collect();
        let order = |subject_id: &str| {
            self.subjects
                .iter()
                .position(|s| s.id == subject_id)
                .unwrap_or(usize::MAX)
        };
        rows.sort_by_key(|r| order(&r.subject_id));
        rows
    }

    /// (internal student id, unrounded average) for every student of the class
    /// with at least one result in the semester.
    pub(crate) fn class_averages(&self, class_id: &str, semester: &str) -> Vec<(String, f64)> {
        self.class_students(class_id)
            .into_iter()
            .filter_map(|s| {
                let scores: Vec<f64> = self
                    .student_results(&s.id, semester)
                    .iter()
                    .map(|r| r.score)
                    .collect();
                mean(&scores).map(|avg| (s.id.clone(), avg))
            })
            .collect()
    }

    pub fn summary(&self, student_key: &str, semester: Option<&str>) -> Result<ResultSlip, StoreError> {
        let student = self.student(student_key)?;
        let semester = self.semester_or_current(semester);
        Ok(self.build_slip(student, &semester))
    }

    fn build_slip(&self, student: &Student, semester: &str) -> ResultSlip {
        let rows = self.student_results(&student.id, semester);
        let subjects: Vec<SlipSubject> = rows
            .iter()
            .map(|r| SlipSubject {
                name: self
                    .subject(&r.subject_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|_| r.subject_id.clone()),
                score: r.score,
                grade: r.grade.clone(),
                remarks: r.remarks.clone(),
            })
            .collect();
        let scores: Vec<f64> = rows.iter().map(|r| r.score).collect();
        let total_score: f64 = scores.iter().sum();
        let average = mean(&scores).unwrap_or(0.0);
        let ranks = competition_ranks(&self.class_averages(&student.class_id, semester));

        ResultSlip {
            name: student.name.clone(),
            student_id: student.student_id.clone(),
            class: self.class_label(&student.class_id),
            semester: semester.to_string(),
            subjects,
            total_score,
            average: round_1(average),
            position: ranks.get(&student.id).copied().unwrap_or(0),
            total_students: self.class_students(&student.class_id).len(),
            status: PassStatus::from_average(average, self.settings.pass_mark()),
        }
    }

    /// Renders the HTML slip; with `out_dir` the file is also written there.
    pub fn slip(
        &self,
        student_key: &str,
        semester: Option<&str>,
        out_dir: Option<&Path>,
    ) -> Result<SlipOutput, StoreError> {
        let summary = self.summary(student_key, semester)?;
        if summary.subjects.is_empty() {
            return Err(StoreError::Conflict(format!(
                "{} has no results for {}",
                summary.student_id, summary.semester
            )));
        }
        let html = slip::render(&self.settings.school_name(), &summary);
        let path = match out_dir {
            Some(dir) => Some(slip::write_slip(dir, &summary, &html)?),
            None => None,
        };
        Ok(SlipOutput {
            file_name: slip::file_name(&summary.student_id, &summary.semester),
            sha256: slip::sha256_hex(html.as_bytes()),
            html,
            path: path.map(|p| p.to_string_lossy().to_string()),
        })
    }

    /// One slip per student of the class who has results, zipped with a manifest.
    pub fn slip_bundle(
        &mut self,
        class_id: &str,
        semester: Option<&str>,
        out_path: &Path,
    ) -> Result<BundleOutput, StoreError> {
        let label = self.class(class_id)?.label();
        let semester = self.semester_or_current(semester);
        let slips: Vec<ResultSlip> = self
            .class_students(class_id)
            .into_iter()
            .map(|s| self.build_slip(s, &semester))
            .filter(|s| !s.subjects.is_empty())
            .collect();
        if slips.is_empty() {
            return Err(StoreError::Conflict(format!(
                "{label} has no results for {semester}"
            )));
        }
        let summary = slip::write_bundle(
            out_path,
            &label,
            &semester,
            &self.settings.school_name(),
            &slips,
        )?;
        self.record(
            "Result Slips Exported",
            format!("{} slips for {label}", slips.len()),
            ActivityKind::Success,
        );
        Ok(BundleOutput {
            path: out_path.to_string_lossy().to_string(),
            bundle_format: summary.bundle_format,
            entry_count: summary.entry_count,
            slip_count: slips.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::GradeError;
    use crate::store::seed::{self, DEMO_SEMESTER};

    fn entry(student: &str, subject: &str, score: f64) -> ResultInput {
        ResultInput {
            student_id: student.into(),
            subject_id: subject.into(),
            class_id: None,
            semester: None,
            score,
            teacher_id: None,
        }
    }

    #[test]
    fn entering_twice_updates_in_place() {
        let mut store = seed::demo().expect("seed");
        let before = store.results.len();
        let r = store.enter_result(entry("STU002", "3", 79.5)).expect("enter");
        assert_eq!(r.grade, "B");
        assert_eq!(r.semester, DEMO_SEMESTER);
        assert_eq!(store.results.len(), before + 1);

        let again = store.enter_result(entry("2", "3", 80.0)).expect("update");
        assert_eq!(again.id, r.id);
        assert_eq!(again.grade, "A");
        assert_eq!(store.results.len(), before + 1);
    }

    #[test]
    fn subject_must_be_taught_in_the_class() {
        let mut store = seed::demo().expect("seed");
        let e = store.enter_result(entry("STU002", "4", 70.0)).expect_err("biology not in 1B");
        assert_eq!(e.details(), Some(serde_json::json!({ "field": "subjectId" })));
    }

    #[test]
    fn scores_outside_zero_to_hundred_are_rejected() {
        let mut store = seed::demo().expect("seed");
        let e = store.enter_result(entry("STU001", "1", 101.0)).expect_err("range");
        assert!(matches!(e, StoreError::Grade(GradeError::InvalidScore(_))));
    }

    #[test]
    fn summary_ranks_within_the_class() {
        let store = seed::demo().expect("seed");
        let s = store.summary("STU001", None).expect("summary");
        assert_eq!(
            s.subjects.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["Mathematics", "Physics", "Chemistry", "Biology"]
        );
        assert_eq!(s.total_score, 355.0);
        assert_eq!(s.average, 88.8);
        assert_eq!(s.position, 1);
        assert_eq!(s.total_students, 3);
        assert_eq!(s.status, PassStatus::Pass);
        assert_eq!(s.class, "Form 1 - Science A");

        let john = store.summary("STU004", None).expect("summary");
        assert_eq!(john.position, 3);
    }

    #[test]
    fn failing_average_uses_pass_mark() {
        let mut store = seed::demo().expect("seed");
        let emily = store.summary("STU003", None).expect("summary");
        assert_eq!(emily.average, 48.5);
        assert_eq!(emily.status, PassStatus::Fail);

        let mut patch = serde_json::Map::new();
        patch.insert("passMark".into(), serde_json::json!(45));
        store
            .settings
            .update(crate::settings::SettingsSection::Grading, &patch)
            .expect("settings");
        assert_eq!(
            store.summary("STU003", None).expect("summary").status,
            PassStatus::Pass
        );
    }

    #[test]
    fn regrade_follows_the_new_default() {
        let mut store = seed::demo().expect("seed");
        store.set_default_grading_system("2").expect("default");
        let changed = store.regrade(Some(DEMO_SEMESTER)).expect("regrade");
        assert!(changed > 0);
        let math = store
            .results
            .iter()
            .find(|r| r.student_id == "1" && r.subject_id == "1" && r.semester == DEMO_SEMESTER)
            .expect("result");
        assert_eq!(math.grade, "A");
        assert_eq!(math.points, 4.0);
    }

    #[test]
    fn roster_lists_every_student_of_the_class() {
        let store = seed::demo().expect("seed");
        let rows = store.roster("2", "3", None).expect("roster");
        assert_eq!(rows.len(), 1);
        assert!(rows[0].result.is_none());
    }

    #[test]
    fn slip_without_results_is_a_conflict() {
        let store = seed::demo().expect("seed");
        let e = store
            .slip("STU001", Some("2022/2023 - Semester 1"), None)
            .expect_err("empty");
        assert_eq!(e.code(), "conflict");
        let ok = store.slip("STU001", None, None).expect("slip");
        assert_eq!(ok.file_name, "STU001_2023/2024_-_Semester_2_Result.html");
        assert_eq!(ok.sha256.len(), 64);
    }
}
