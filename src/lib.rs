//! Row-level-security smoke test.
//!
//! Provisions two throwaway users against a Supabase-style backend, has one
//! write and read its own rows, has the other try to read them, and reports
//! whether the data API kept them apart.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod rest;
pub mod runner;
pub mod util;

pub use config::Config;
pub use error::{AppError, Result};
pub use report::{RunReport, StepOutcome};
pub use runner::{CheckMode, RunOptions, SmokeTest, exit_code};
