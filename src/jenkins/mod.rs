//! Jenkins admin API: crumb issuer, user lookup, account creation and role
//! assignment.

pub mod client;

pub mod http;

pub mod script;

pub use client::{CreateOutcome, CrumbToken, JenkinsAdminClient};
