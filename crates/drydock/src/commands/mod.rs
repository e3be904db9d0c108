//! Command implementations
//!
//! This module contains the implementation behind the CLI surface.

pub mod run;
