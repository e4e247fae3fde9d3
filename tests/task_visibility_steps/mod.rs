//! Step definitions for task visibility scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
