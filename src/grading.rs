use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeScale {
    pub id: String,
    pub grade: String,
    pub min_score: f64,
    pub max_score: f64,
    pub points: f64,
    pub remark: String,
}

impl GradeScale {
    fn contains(&self, score: f64) -> bool {
        self.min_score <= score && score <= self.max_score
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradingSystem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub grade_scale: Vec<GradeScale>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeOutcome {
    pub grade: String,
    pub points: f64,
    pub remark: String,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum GradeError {
    #[error("score must be a number between 0 and 100 (got {0})")]
    InvalidScore(f64),
    #[error("score {score} is not covered by grading system '{system}'")]
    OutOfRange { score: f64, system: String },
    #[error("invalid grade scale: {0}")]
    InvalidScale(String),
    #[error("no default grading system is configured")]
    NoActiveSystem,
}

pub fn validate_score(score: f64) -> Result<(), GradeError> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(GradeError::InvalidScore(score));
    }
    Ok(())
}

impl GradingSystem {
    /// Maps a score to its tier.
    ///
    /// The tier whose inclusive `[minScore, maxScore]` range contains the score wins; if
    /// several do, the highest `maxScore` is taken. Fractional scores that land in the
    /// gap between integer-bounded tiers (79.5 between B 70-79 and A 80-100) are graded
    /// by their floor, so a threshold cascade and its range table agree.
    pub fn grade(&self, score: f64) -> Result<GradeOutcome, GradeError> {
        validate_score(score)?;
        let tier = self.tier_for(score).or_else(|| {
            if score.fract() != 0.0 {
                self.tier_for(score.floor())
            } else {
                None
            }
        });
        match tier {
            Some(t) => Ok(GradeOutcome {
                grade: t.grade.clone(),
                points: t.points,
                remark: t.remark.clone(),
            }),
            None => Err(GradeError::OutOfRange {
                score,
                system: self.name.clone(),
            }),
        }
    }

    fn tier_for(&self, score: f64) -> Option<&GradeScale> {
        self.grade_scale
            .iter()
            .filter(|t| t.contains(score))
            .max_by(|a, b| {
                a.max_score
                    .partial_cmp(&b.max_score)
                    .unwrap_or(Ordering::Equal)
            })
    }

    /// Tiers ordered from the highest band down, the way grade distributions are shown.
    pub fn ordered_grades(&self) -> Vec<String> {
        let mut tiers: Vec<&GradeScale> = self.grade_scale.iter().collect();
        tiers.sort_by(|a, b| {
            b.min_score
                .partial_cmp(&a.min_score)
                .unwrap_or(Ordering::Equal)
        });
        tiers.into_iter().map(|t| t.grade.clone()).collect()
    }
}

pub fn validate_scale(scale: &[GradeScale]) -> Result<(), GradeError> {
    if scale.is_empty() {
        return Err(GradeError::InvalidScale(
            "at least one grade level is required".into(),
        ));
    }
    for t in scale {
        if t.grade.trim().is_empty() {
            return Err(GradeError::InvalidScale(format!(
                "level {} has an empty grade letter",
                t.id
            )));
        }
        let in_bounds = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_bounds(t.min_score) || !in_bounds(t.max_score) {
            return Err(GradeError::InvalidScale(format!(
                "grade {} must have bounds within 0..100",
                t.grade
            )));
        }
        if t.min_score > t.max_score {
            return Err(GradeError::InvalidScale(format!(
                "grade {} has minScore above maxScore",
                t.grade
            )));
        }
        if !t.points.is_finite() || t.points < 0.0 {
            return Err(GradeError::InvalidScale(format!(
                "grade {} has invalid points",
                t.grade
            )));
        }
    }

    let mut sorted: Vec<&GradeScale> = scale.iter().collect();
    sorted.sort_by(|a, b| {
        a.min_score
            .partial_cmp(&b.min_score)
            .unwrap_or(Ordering::Equal)
    });
    for pair in sorted.windows(2) {
        if pair[1].min_score <= pair[0].max_score {
            return Err(GradeError::InvalidScale(format!(
                "grades {} and {} overlap",
                pair[0].grade, pair[1].grade
            )));
        }
    }
    Ok(())
}

pub fn active_system(systems: &[GradingSystem]) -> Result<&GradingSystem, GradeError> {
    systems
        .iter()
        .find(|s| s.is_default)
        .ok_or(GradeError::NoActiveSystem)
}

fn tier(id: String, grade: &str, min: f64, max: f64, points: f64, remark: &str) -> GradeScale {
    GradeScale {
        id,
        grade: grade.to_string(),
        min_score: min,
        max_score: max,
        points,
        remark: remark.to_string(),
    }
}

/// A-F scale used as the default and as the template for newly created systems.
pub fn standard_scale(id_prefix: &str) -> Vec<GradeScale> {
    let id = |n: u32| format!("{id_prefix}{n}");
    vec![
        tier(id(1), "A", 80.0, 100.0, 4.0, "Excellent"),
        tier(id(2), "B", 70.0, 79.0, 3.0, "Very Good"),
        tier(id(3), "C", 60.0, 69.0, 2.0, "Good"),
        tier(id(4), "D", 50.0, 59.0, 1.0, "Fair"),
        tier(id(5), "F", 0.0, 49.0, 0.0, "Needs Improvement"),
    ]
}

pub fn advanced_scale(id_prefix: &str) -> Vec<GradeScale> {
    let id = |n: u32| format!("{id_prefix}{n}");
    vec![
        tier(id(6), "A+", 95.0, 100.0, 4.5, "Outstanding"),
        tier(id(7), "A", 85.0, 94.0, 4.0, "Excellent"),
        tier(id(8), "B+", 75.0, 84.0, 3.5, "Very Good"),
        tier(id(9), "B", 65.0, 74.0, 3.0, "Good"),
        tier(id(10), "C", 55.0, 64.0, 2.0, "Fair"),
        tier(id(11), "F", 0.0, 54.0, 0.0, "Unsatisfactory"),
    ]
}

pub fn builtin_systems() -> Vec<GradingSystem> {
    vec![
        GradingSystem {
            id: "1".into(),
            name: "Standard Grading".into(),
            description: "Traditional A-F grading system".into(),
            grade_scale: standard_scale(""),
            is_default: true,
        },
        GradingSystem {
            id: "2".into(),
            name: "Advanced Placement".into(),
            description: "Enhanced grading for advanced courses".into(),
            grade_scale: advanced_scale(""),
            is_default: false,
        },
    ]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PassStatus {
    Pass,
    Fail,
}

impl PassStatus {
    pub fn from_average(average: f64, pass_mark: f64) -> Self {
        if average >= pass_mark {
            PassStatus::Pass
        } else {
            PassStatus::Fail
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PassStatus::Pass => "PASS",
            PassStatus::Fail => "FAIL",
        }
    }
}

pub fn round_1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Competition ranking ("1224"): equal values share a position and the next
/// distinct value skips ahead by the size of the tie.
pub fn competition_ranks(values: &[(String, f64)]) -> HashMap<String, usize> {
    let mut sorted: Vec<&(String, f64)> = values.iter().collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut out = HashMap::new();
    let mut position = 0usize;
    let mut prev: Option<f64> = None;
    for (idx, (key, value)) in sorted.into_iter().enumerate() {
        if prev != Some(*value) {
            position = idx + 1;
            prev = Some(*value);
        }
        out.insert(key.clone(), position);
    }
    out
}
