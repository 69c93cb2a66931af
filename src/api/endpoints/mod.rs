pub mod auth;
pub mod certificates;
pub mod health;
pub mod patients;
pub mod records;
pub mod verify;
