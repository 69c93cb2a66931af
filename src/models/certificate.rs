use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Certificate status. Transitions only move forward:
/// DRAFT → SIGNED → REVOKED (revoking an unsigned draft is allowed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertStatus {
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "SIGNED")]
    Signed,
    #[serde(rename = "REVOKED")]
    Revoked,
}

impl CertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CertStatus::Draft => "DRAFT",
            CertStatus::Signed => "SIGNED",
            CertStatus::Revoked => "REVOKED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(CertStatus::Draft),
            "SIGNED" => Some(CertStatus::Signed),
            "REVOKED" => Some(CertStatus::Revoked),
            _ => None,
        }
    }

    /// Position in the forward-only lifecycle.
    pub fn rank(self) -> u8 {
        match self {
            CertStatus::Draft => 0,
            CertStatus::Signed => 1,
            CertStatus::Revoked => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertType {
    DrivingLicenceMedical,
    ImmigrationMedical,
}

impl CertType {
    pub fn as_str(self) -> &'static str {
        match self {
            CertType::DrivingLicenceMedical => "DrivingLicenceMedical",
            CertType::ImmigrationMedical => "ImmigrationMedical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DrivingLicenceMedical" => Some(CertType::DrivingLicenceMedical),
            "ImmigrationMedical" => Some(CertType::ImmigrationMedical),
            _ => None,
        }
    }
}

/// A medical certificate. `verify_code` is assigned at creation and is
/// immutable and globally unique thereafter; `qr_payload` is the public
/// verification URL derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub certificate_id: String,
    pub patient_id: String,
    #[serde(rename = "type")]
    pub cert_type: CertType,
    pub status: CertStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_payload: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
