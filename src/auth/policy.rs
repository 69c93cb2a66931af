//! Request-scoped authorization decisions.
//!
//! The 401-vs-403 distinction matters: `Unauthorized` means no usable
//! identity was presented, `Forbidden` means the identity is known but
//! may not act on the resource.

use crate::auth::identity::Identity;
use crate::models::user::Role;

/// Role a route requires. Admin always satisfies either; a clinician
/// requirement does not grant patient self-service and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    Clinician,
    Admin,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PolicyError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
}

fn role_satisfies(role: Role, required: RequiredRole) -> bool {
    match required {
        // Admin is a superset for clinical operations.
        RequiredRole::Clinician => matches!(role, Role::Clinician | Role::Admin),
        RequiredRole::Admin => matches!(role, Role::Admin),
    }
}

/// Require the exact role (admin passing a clinician requirement).
/// Patients never pass — writes are staff-only.
pub fn require_role(
    identity: Option<&Identity>,
    required: RequiredRole,
) -> Result<(), PolicyError> {
    let identity = identity.ok_or(PolicyError::Unauthorized)?;
    if role_satisfies(identity.role(), required) {
        Ok(())
    } else {
        Err(PolicyError::Forbidden)
    }
}

/// Require the role, or patient self-scope: a patient caller passes only
/// when `resource_patient_id` is present and equals their own linkage.
pub fn authorize(
    identity: Option<&Identity>,
    required: RequiredRole,
    resource_patient_id: Option<&str>,
) -> Result<(), PolicyError> {
    let identity = identity.ok_or(PolicyError::Unauthorized)?;

    if role_satisfies(identity.role(), required) {
        return Ok(());
    }

    if let (Some(own), Some(candidate)) = (identity.linked_patient_id(), resource_patient_id) {
        if own == candidate {
            return Ok(());
        }
    }
    Err(PolicyError::Forbidden)
}
