//! Core data types for Fareline

pub mod fare;
pub mod rate_policy;
pub mod ride;
