use serde::Serialize;
use std::collections::HashSet;

use crate::grading::{active_system, mean, round_1};
use crate::model::ActivityEntry;
use crate::slip::ResultSlip;

use super::{Store, StoreError};

const TOP_PERFORMER_LIMIT: usize = 5;
const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub name: String,
    pub student_id: String,
    pub class: String,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_students: usize,
    pub total_classes: usize,
    pub current_semester: String,
    pub results_uploaded: usize,
    pub pending_results: usize,
    pub recent_activity: Vec<ActivityEntry>,
    pub top_performers: Vec<TopPerformer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub subject: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub summary: ResultSlip,
    pub chart: Vec<ChartPoint>,
    pub semesters: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Difficulty {
    High,
    Medium,
    Low,
}

impl Difficulty {
    pub fn from_average(average: f64) -> Self {
        if average < 70.0 {
            Difficulty::High
        } else if average < 80.0 {
            Difficulty::Medium
        } else {
            Difficulty::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPerformance {
    pub class_id: String,
    pub class: String,
    pub average: f64,
    pub pass_rate: f64,
    pub students: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPerformance {
    pub subject_id: String,
    pub subject: String,
    pub average: f64,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub semester: String,
    pub pass_rate: f64,
    pub average_score: f64,
    pub top_performers: usize,
    pub at_risk: usize,
    pub class_performance: Vec<ClassPerformance>,
    pub subject_performance: Vec<SubjectPerformance>,
    pub grade_distribution: Vec<GradeCount>,
}

fn pass_rate(averages: &[f64], pass_mark: f64) -> f64 {
    if averages.is_empty() {
        return 0.0;
    }
    let passed = averages.iter().filter(|a| **a >= pass_mark).count();
    round_1(100.0 * passed as f64 / averages.len() as f64)
}

impl Store {
    /// Every (student, assigned subject) pair of the semester minus what is entered.
    fn pending_results(&self, semester: &str) -> usize {
        let expected: usize = self
            .classes
            .iter()
            .map(|c| self.class_students(&c.id).len() * self.subjects_for_class(&c.id).len())
            .sum();
        let entered: HashSet<(&str, &str)> = self
            .results
            .iter()
            .filter(|r| r.semester == semester)
            .filter(|r| {
                self.student(&r.student_id).ok().is_some_and(|s| {
                    self.subjects
                        .iter()
                        .any(|sub| sub.id == r.subject_id && sub.assigned_classes.contains(&s.class_id))
                })
            })
            .map(|r| (r.student_id.as_str(), r.subject_id.as_str()))
            .collect();
        expected.saturating_sub(entered.len())
    }

    /// (student id, average) across the whole school for a semester.
    fn school_averages(&self, semester: &str) -> Vec<(String, f64)> {
        self.classes
            .iter()
            .flat_map(|c| self.class_averages(&c.id, semester))
            .collect()
    }

    pub fn admin_dashboard(&self) -> AdminDashboard {
        let semester = self.settings.current_term();
        let mut ranked = self.school_averages(&semester);
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let top_performers = ranked
            .iter()
            .take(TOP_PERFORMER_LIMIT)
            .filter_map(|(id, avg)| {
                let s = self.student(id).ok()?;
                Some(TopPerformer {
                    name: s.name.clone(),
                    student_id: s.student_id.clone(),
                    class: self.class_label(&s.class_id),
                    average: round_1(*avg),
                })
            })
            .collect();

        AdminDashboard {
            total_students: self.students.len(),
            total_classes: self.classes.len(),
            results_uploaded: self.results.iter().filter(|r| r.semester == semester).count(),
            pending_results: self.pending_results(&semester),
            current_semester: semester,
            recent_activity: self
                .recent_activity(RECENT_ACTIVITY_LIMIT)
                .into_iter()
                .cloned()
                .collect(),
            top_performers,
        }
    }

    pub fn student_dashboard(&self, student_key: &str, semester: Option<&str>) -> Result<StudentDashboard, StoreError> {
        let student = self.student(student_key)?;
        let summary = self.summary(student_key, semester)?;
        let chart = summary
            .subjects
            .iter()
            .map(|s| ChartPoint {
                subject: s.name.clone(),
                score: s.score,
            })
            .collect();
        Ok(StudentDashboard {
            semesters: self.student_semesters(&student.id),
            summary,
            chart,
        })
    }

    pub fn analytics_overview(&self, semester: Option<&str>) -> AnalyticsOverview {
        let semester = self.semester_or_current(semester);
        let pass_mark = self.settings.pass_mark();
        let averages: Vec<f64> = self
            .school_averages(&semester)
            .into_iter()
            .map(|(_, a)| a)
            .collect();
        let results: Vec<_> = self.results.iter().filter(|r| r.semester == semester).collect();
        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();

        let class_performance = self
            .classes
            .iter()
            .filter_map(|c| {
                let avgs: Vec<f64> = self
                    .class_averages(&c.id, &semester)
                    .into_iter()
                    .map(|(_, a)| a)
                    .collect();
                let average = mean(&avgs)?;
                Some(ClassPerformance {
                    class_id: c.id.clone(),
                    class: c.label(),
                    average: round_1(average),
                    pass_rate: pass_rate(&avgs, pass_mark),
                    students: self.class_students(&c.id).len(),
                })
            })
            .collect();

        let subject_performance = self
            .subjects
            .iter()
            .filter_map(|sub| {
                let s: Vec<f64> = results
                    .iter()
                    .filter(|r| r.subject_id == sub.id)
                    .map(|r| r.score)
                    .collect();
                let average = round_1(mean(&s)?);
                Some(SubjectPerformance {
                    subject_id: sub.id.clone(),
                    subject: sub.name.clone(),
                    average,
                    difficulty: Difficulty::from_average(average),
                })
            })
            .collect();

        let grade_distribution = active_system(&self.grading_systems)
            .map(|sys| {
                sys.ordered_grades()
                    .into_iter()
                    .map(|grade| GradeCount {
                        count: results.iter().filter(|r| r.grade == grade).count(),
                        grade,
                    })
                    .collect()
            })
            .unwrap_or_default();

        AnalyticsOverview {
            pass_rate: pass_rate(&averages, pass_mark),
            average_score: mean(&scores).map(round_1).unwrap_or(0.0),
            top_performers: averages
                .iter()
                .filter(|a| **a >= self.settings.top_performer_min())
                .count(),
            at_risk: averages
                .iter()
                .filter(|a| **a < self.settings.at_risk_below())
                .count(),
            semester,
            class_performance,
            subject_performance,
            grade_distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed;

    #[test]
    fn dashboard_counts_pending_pairs() {
        let store = seed::demo().expect("seed");
        let d = store.admin_dashboard();
        assert_eq!(d.total_students, 6);
        assert_eq!(d.total_classes, 5);
        assert_eq!(d.results_uploaded, 18);
        // class 1: 3x4, class 2: 1x3, class 3: 2x2; only Michael's chemistry is missing
        assert_eq!(d.pending_results, 1);
        assert_eq!(d.top_performers[0].student_id, "STU001");
        assert_eq!(d.recent_activity.len(), 5);
    }

    #[test]
    fn difficulty_thresholds() {
        assert_eq!(Difficulty::from_average(69.9), Difficulty::High);
        assert_eq!(Difficulty::from_average(70.0), Difficulty::Medium);
        assert_eq!(Difficulty::from_average(80.0), Difficulty::Low);
    }

    #[test]
    fn overview_uses_settings_thresholds() {
        let store = seed::demo().expect("seed");
        let o = store.analytics_overview(None);
        // averages: 88.75, 64.75, 81.25, 79.5, 48.5, 70.5
        assert_eq!(o.top_performers, 2);
        assert_eq!(o.at_risk, 1);
        assert_eq!(o.pass_rate, 83.3);
        let dist: Vec<(&str, usize)> = o
            .grade_distribution
            .iter()
            .map(|g| (g.grade.as_str(), g.count))
            .collect();
        assert_eq!(dist.iter().map(|(_, c)| c).sum::<usize>(), 18);
        assert_eq!(dist[0].0, "A");
        let econ = o.subject_performance.iter().find(|s| s.subject == "Economics");
        assert!(econ.is_none());
    }

    #[test]
    fn student_dashboard_lists_semesters() {
        let store = seed::demo().expect("seed");
        let d = store.student_dashboard("STU001", None).expect("dashboard");
        assert_eq!(
            d.semesters,
            vec!["2023/2024 - Semester 2", "2023/2024 - Semester 1"]
        );
        assert_eq!(d.chart.len(), 4);
        let prev = store
            .student_dashboard("STU001", Some("2023/2024 - Semester 1"))
            .expect("dashboard");
        assert_eq!(prev.summary.subjects.len(), 2);
    }
}
