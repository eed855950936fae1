//! Payroll execution engine.
//!
//! This crate computes each employee's pay for a period from approved pay
//! components (pay grades, allowances and tax rules), flags per-employee
//! exceptions, and carries the resulting payroll run through a role-gated
//! approval workflow that ends in payslips.
//!
//! - [`config`]: approval-gated configuration records and YAML loading
//! - [`calculation`]: pure pay computation and exception detection
//! - [`engine`]: run creation, draft generation and corrections
//! - [`workflow`]: the role × action table and run state machine
//! - [`api`]: the axum HTTP surface

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod workflow;
