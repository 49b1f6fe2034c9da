//! Infrastructure layer.
//!
//! Configuration and the composition root that wires adapters to the
//! application services.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation

pub mod bootstrap;
pub mod config;
