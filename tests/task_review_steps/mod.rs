//! Step definitions for delivery review scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
