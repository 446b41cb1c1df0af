//! Shared utilities and common types for the QueryDesk backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Credential redaction for surfaced error messages
//! - Common validation logic for request payloads

pub mod redact;
pub mod validation;
