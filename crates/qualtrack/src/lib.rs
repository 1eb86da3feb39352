//! Tracking of construction-industry business qualifications held by
//! partner companies: issuing agencies, validity windows, renewal
//! deadlines, and per-industry grading detail.

pub mod accounts;
pub mod assist;
pub mod config;
pub mod error;
pub mod memory;
pub mod notify;
pub mod qualifications;
pub mod telemetry;
