use serde::Deserialize;

use crate::model::{ActivityKind, BulkUpload, UploadStatus};

use super::{invalid, new_id, not_found, required, timestamp, Store, StoreError};

const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUploadInput {
    pub file_name: String,
    pub class_id: String,
    pub subject_id: String,
    #[serde(default)]
    pub total_records: u32,
}

/// A status report from whoever is processing the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUploadAdvance {
    pub status: UploadStatus,
    #[serde(default)]
    pub processed_records: Option<u32>,
    #[serde(default)]
    pub total_records: Option<u32>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Store {
    pub fn bulk_uploads_newest_first(&self) -> Vec<&BulkUpload> {
        let mut out: Vec<&BulkUpload> = self.bulk_uploads.iter().collect();
        out.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        out
    }

    pub fn create_bulk_upload(&mut self, input: BulkUploadInput) -> Result<BulkUpload, StoreError> {
        let file_name = required("fileName", &input.file_name)?;
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(invalid(
                "fileName",
                "only .csv, .xlsx and .xls files are accepted",
            ));
        }
        self.class(&input.class_id)?;
        let subject = self.subject(&input.subject_id)?;
        if !subject.assigned_classes.contains(&input.class_id) {
            return Err(invalid(
                "subjectId",
                format!("{} is not taught in class {}", subject.name, input.class_id),
            ));
        }

        let upload = BulkUpload {
            id: new_id(),
            file_name,
            class_id: input.class_id,
            subject_id: input.subject_id,
            uploaded_by: self.session.user_id().unwrap_or("System").to_string(),
            uploaded_at: timestamp(),
            status: UploadStatus::Pending,
            total_records: input.total_records,
            processed_records: 0,
            errors: Vec::new(),
        };
        self.bulk_uploads.push(upload.clone());
        self.record("Result Upload", upload.file_name.clone(), ActivityKind::Info);
        Ok(upload)
    }

    pub fn advance_bulk_upload(&mut self, id: &str, step: BulkUploadAdvance) -> Result<BulkUpload, StoreError> {
        let Some(idx) = self.bulk_uploads.iter().position(|u| u.id == id) else {
            return Err(not_found("bulk upload", id));
        };
        let mut next = self.bulk_uploads[idx].clone();
        if !next.status.can_advance_to(step.status) {
            return Err(StoreError::InvalidTransition(format!(
                "upload cannot move from {} to {}",
                next.status.as_str(),
                step.status.as_str()
            )));
        }
        if let Some(total) = step.total_records {
            next.total_records = total;
        }
        let errors: Vec<String> = step
            .errors
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        next.processed_records = match (step.status, step.processed_records) {
            (UploadStatus::Completed, None) => next.total_records,
            (_, Some(p)) => p,
            (_, None) => next.processed_records,
        };
        if next.processed_records > next.total_records {
            return Err(invalid(
                "processedRecords",
                format!(
                    "processed {} exceeds total {}",
                    next.processed_records, next.total_records
                ),
            ));
        }
        if step.status == UploadStatus::Failed && errors.is_empty() {
            return Err(invalid("errors", "a failed upload needs at least one error"));
        }
        next.errors.extend(errors);
        next.status = step.status;

        self.bulk_uploads[idx] = next.clone();
        let kind = match next.status {
            UploadStatus::Failed => ActivityKind::Warning,
            UploadStatus::Completed => ActivityKind::Success,
            _ => ActivityKind::Info,
        };
        self.record(
            "Upload Status",
            format!(
                "{} is {} ({}/{})",
                next.file_name,
                next.status.as_str(),
                next.processed_records,
                next.total_records
            ),
            kind,
        );
        Ok(next)
    }
}
