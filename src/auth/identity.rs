//! Authenticated caller identity.
//!
//! A tagged variant rather than a role field plus optional linkage: a
//! patient identity cannot exist without its linked patient id.

use serde::Serialize;

use crate::auth::token::Claims;
use crate::models::user::Role;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Identity {
    Clinician {
        id: String,
        username: String,
    },
    Admin {
        id: String,
        username: String,
    },
    Patient {
        id: String,
        username: String,
        #[serde(rename = "linkedPatientId")]
        linked_patient_id: String,
    },
}

impl Identity {
    /// Build an identity from verified claims. Patient claims without a
    /// linked patient id are rejected — such a token violates the data
    /// model and must not authenticate.
    pub fn from_claims(claims: &Claims) -> Option<Identity> {
        match claims.role {
            Role::Clinician => Some(Identity::Clinician {
                id: claims.sub.clone(),
                username: claims.username.clone(),
            }),
            Role::Admin => Some(Identity::Admin {
                id: claims.sub.clone(),
                username: claims.username.clone(),
            }),
            Role::Patient => claims.linked_patient_id.as_ref().map(|pid| Identity::Patient {
                id: claims.sub.clone(),
                username: claims.username.clone(),
                linked_patient_id: pid.clone(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Identity::Clinician { id, .. }
            | Identity::Admin { id, .. }
            | Identity::Patient { id, .. } => id,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Identity::Clinician { username, .. }
            | Identity::Admin { username, .. }
            | Identity::Patient { username, .. } => username,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Clinician { .. } => Role::Clinician,
            Identity::Admin { .. } => Role::Admin,
            Identity::Patient { .. } => Role::Patient,
        }
    }

    pub fn linked_patient_id(&self) -> Option<&str> {
        match self {
            Identity::Patient {
                linked_patient_id, ..
            } => Some(linked_patient_id),
            _ => None,
        }
    }
}
