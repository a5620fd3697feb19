//! Fixed-rate control loop around the rule engine.
//!
//! This crate provides:
//! - [`ControllerConfig`] with range checks for the loop parameters
//! - The [`ParameterSource`] seam for sampling and a [`SimulatedDevice`]
//!   implementing both sampling and action dispatch
//! - Rolling latency tracking and periodic/final run statistics
//! - [`Controller`], the poll → evaluate → dispatch → sleep loop with dry-run,
//!   hot-reload and cooperative cancellation
//!
//! The `rule-controller` binary wires these together behind a CLI.

pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod gate;
pub mod latency;
pub mod shutdown;
pub mod source;
pub mod summary;

pub use config::ControllerConfig;
pub use controller::{Controller, LoopExit, RunReport};
pub use device::SimulatedDevice;
pub use error::ControllerError;
pub use shutdown::ShutdownSignal;
pub use source::{ParameterSource, SamplerError};
pub use summary::{PeriodicStats, RunSummary};
