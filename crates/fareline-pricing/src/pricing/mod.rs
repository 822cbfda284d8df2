//! Pricing module
//!
//! Provides data-driven fare calculation with:
//! - A copy-on-write ride-class registry
//! - Pure fare policy evaluation
//! - The request pipeline that ties them to the ledger

pub mod engine;
pub mod policy;
pub mod registry;

pub use engine::{FareEngine, FareStage};
pub use policy::compute_fare;
pub use registry::{PolicyEntry, RegistrySnapshot, RideClassRegistry};
