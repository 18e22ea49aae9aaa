//! HTTP service for the RISE participant survey.
//!
//! Serves the survey workflow endpoints (session creation, conversation logging and
//! linking, form submission, completion) backed by a PostgREST database with optional
//! webhook forwarding, plus one endpoint per `rise-capabilities` toolkit.

pub mod app;
pub mod config;
pub mod error;
pub mod outbound;
pub mod persistence;
pub mod routes;
pub mod session_id;
pub mod telemetry;
pub mod webhook;

#[cfg(test)]
mod testing;
