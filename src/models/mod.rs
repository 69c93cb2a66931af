pub mod certificate;
pub mod patient;
pub mod record;
pub mod user;

pub use certificate::{CertStatus, CertType, Certificate};
pub use patient::{Patient, Sex};
pub use record::{ClinicalRecord, CreatedBy, RecordType};
pub use user::{Role, User, UserSummary};
