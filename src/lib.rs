//! medcert — REST backend for patient records and verifiable medical
//! certificates.
//!
//! Clinicians and admins manage patients, typed clinical records, and
//! certificate lifecycles; patients self-register and read their own
//! data; anyone can verify a certificate from its opaque code.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod registry;
pub mod verifycode;
