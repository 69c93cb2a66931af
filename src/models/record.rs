use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::user::Role;

/// Clinical category of a record. Each variant has a registered payload
/// validator; the tag is immutable once a record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordType {
    Vitals,
    VisitNote,
    Diagnosis,
    LabResult,
    Medication,
    Immunization,
    Allergy,
    Attachment,
}

impl RecordType {
    pub const ALL: [RecordType; 8] = [
        RecordType::Vitals,
        RecordType::VisitNote,
        RecordType::Diagnosis,
        RecordType::LabResult,
        RecordType::Medication,
        RecordType::Immunization,
        RecordType::Allergy,
        RecordType::Attachment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Vitals => "vitals",
            RecordType::VisitNote => "visitNote",
            RecordType::Diagnosis => "diagnosis",
            RecordType::LabResult => "labResult",
            RecordType::Medication => "medication",
            RecordType::Immunization => "immunization",
            RecordType::Allergy => "allergy",
            RecordType::Attachment => "attachment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vitals" => Some(RecordType::Vitals),
            "visitNote" => Some(RecordType::VisitNote),
            "diagnosis" => Some(RecordType::Diagnosis),
            "labResult" => Some(RecordType::LabResult),
            "medication" => Some(RecordType::Medication),
            "immunization" => Some(RecordType::Immunization),
            "allergy" => Some(RecordType::Allergy),
            "attachment" => Some(RecordType::Attachment),
            _ => None,
        }
    }
}

/// Authorship stamp, taken from the authenticated caller at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBy {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

/// A versioned, soft-deletable clinical record owned by a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalRecord {
    pub record_id: String,
    pub patient_id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub payload: Value,
    pub created_by: CreatedBy,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fhir_ref: Option<Value>,
    pub revision: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
