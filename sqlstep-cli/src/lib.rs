//! sqlstep CLI - apply ordered, tamper-checked SQL migration scripts.
//!
//! The binary wraps [`sqlstep_migrate::Reconciler`] over the PostgreSQL
//! gateway from `sqlstep-postgres`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
