//! API endpoint handlers.
//!
//! Handlers stay thin: parse the request, hop onto the blocking pool,
//! call into `screening` / `store` / `access`, and shape the JSON reply.

pub mod admin;
pub mod diagnoses;
pub mod forms;
pub mod health;
pub mod history;
