use serde::Deserialize;

use crate::grading::{
    active_system, standard_scale, validate_scale, GradeOutcome, GradeScale, GradingSystem,
};
use crate::model::ActivityKind;

use super::{new_id, not_found, required, Store, StoreError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeLevelInput {
    pub grade: String,
    pub min_score: f64,
    pub max_score: f64,
    pub points: f64,
    #[serde(default)]
    pub remark: String,
}

impl GradeLevelInput {
    fn into_level(self) -> GradeScale {
        GradeScale {
            id: new_id(),
            grade: self.grade.trim().to_string(),
            min_score: self.min_score,
            max_score: self.max_score,
            points: self.points,
            remark: self.remark.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeLevelPatch {
    pub grade: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub points: Option<f64>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingSystemInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub grade_scale: Option<Vec<GradeLevelInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingSystemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub grade_scale: Option<Vec<GradeLevelInput>>,
}

impl Store {
    pub fn grading_system(&self, id: &str) -> Result<&GradingSystem, StoreError> {
        self.grading_systems
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found("grading system", id))
    }

    fn grading_system_mut(&mut self, id: &str) -> Result<&mut GradingSystem, StoreError> {
        self.grading_systems
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found("grading system", id))
    }

    /// New systems start from the A-F template unless a scale is supplied.
    pub fn create_grading_system(&mut self, input: GradingSystemInput) -> Result<GradingSystem, StoreError> {
        let name = required("name", &input.name)?;
        let grade_scale = match input.grade_scale {
            Some(levels) => levels.into_iter().map(GradeLevelInput::into_level).collect(),
            None => {
                let mut scale = standard_scale("");
                for level in &mut scale {
                    level.id = new_id();
                }
                scale
            }
        };
        validate_scale(&grade_scale)?;
        let system = GradingSystem {
            id: new_id(),
            name,
            description: input.description.trim().to_string(),
            grade_scale,
            // The first system ever created becomes the default.
            is_default: self.grading_systems.is_empty(),
        };
        self.grading_systems.push(system.clone());
        self.record("Grading System Created", system.name.clone(), ActivityKind::Success);
        Ok(system)
    }

    pub fn update_grading_system(
        &mut self,
        id: &str,
        patch: GradingSystemPatch,
    ) -> Result<GradingSystem, StoreError> {
        let mut next = self.grading_system(id)?.clone();
        if let Some(n) = patch.name.as_deref() {
            next.name = required("name", n)?;
        }
        if let Some(d) = patch.description {
            next.description = d.trim().to_string();
        }
        if let Some(levels) = patch.grade_scale {
            next.grade_scale = levels.into_iter().map(GradeLevelInput::into_level).collect();
        }
        validate_scale(&next.grade_scale)?;
        *self.grading_system_mut(id)? = next.clone();
        self.record("Grading System Updated", next.name.clone(), ActivityKind::Info);
        Ok(next)
    }

    pub fn delete_grading_system(&mut self, id: &str) -> Result<(), StoreError> {
        let system = self.grading_system(id)?;
        if system.is_default {
            return Err(StoreError::Conflict(format!(
                "'{}' is the default grading system; make another system the default first",
                system.name
            )));
        }
        let name = system.name.clone();
        self.grading_systems.retain(|g| g.id != id);
        self.record("Grading System Deleted", name, ActivityKind::Warning);
        Ok(())
    }

    /// Exactly one system carries the default flag afterwards.
    pub fn set_default_grading_system(&mut self, id: &str) -> Result<GradingSystem, StoreError> {
        self.grading_system(id)?;
        for g in &mut self.grading_systems {
            g.is_default = g.id == id;
        }
        let out = self.grading_system(id)?.clone();
        self.record("Default Grading System", out.name.clone(), ActivityKind::Info);
        Ok(out)
    }

    pub fn add_grade_level(
        &mut self,
        system_id: &str,
        level: GradeLevelInput,
    ) -> Result<GradingSystem, StoreError> {
        let mut next = self.grading_system(system_id)?.clone();
        let level = level.into_level();
        let grade = level.grade.clone();
        next.grade_scale.push(level);
        validate_scale(&next.grade_scale)?;
        *self.grading_system_mut(system_id)? = next.clone();
        self.record(
            "Grade Level Added",
            format!("{grade} in {}", next.name),
            ActivityKind::Info,
        );
        Ok(next)
    }

    pub fn update_grade_level(
        &mut self,
        system_id: &str,
        level_id: &str,
        patch: GradeLevelPatch,
    ) -> Result<GradingSystem, StoreError> {
        let mut next = self.grading_system(system_id)?.clone();
        let level = next
            .grade_scale
            .iter_mut()
            .find(|l| l.id == level_id)
            .ok_or_else(|| not_found("grade level", level_id))?;
        if let Some(g) = patch.grade {
            level.grade = g.trim().to_string();
        }
        if let Some(v) = patch.min_score {
            level.min_score = v;
        }
        if let Some(v) = patch.max_score {
            level.max_score = v;
        }
        if let Some(v) = patch.points {
            level.points = v;
        }
        if let Some(r) = patch.remark {
            level.remark = r.trim().to_string();
        }
        validate_scale(&next.grade_scale)?;
        *self.grading_system_mut(system_id)? = next.clone();
        self.record("Grade Level Updated", next.name.clone(), ActivityKind::Info);
        Ok(next)
    }

    pub fn remove_grade_level(&mut self, system_id: &str, level_id: &str) -> Result<GradingSystem, StoreError> {
        let mut next = self.grading_system(system_id)?.clone();
        let before = next.grade_scale.len();
        next.grade_scale.retain(|l| l.id != level_id);
        if next.grade_scale.len() == before {
            return Err(not_found("grade level", level_id));
        }
        validate_scale(&next.grade_scale)?;
        *self.grading_system_mut(system_id)? = next.clone();
        self.record("Grade Level Removed", next.name.clone(), ActivityKind::Warning);
        Ok(next)
    }

    /// Grades a score against the named system, or the default one.
    pub fn compute_grade(&self, score: f64, system_id: Option<&str>) -> Result<GradeOutcome, StoreError> {
        let system = match system_id {
            Some(id) => self.grading_system(id)?,
            None => active_system(&self.grading_systems)?,
        };
        Ok(system.grade(score)?)
    }
}
