// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod api;
pub mod comparison;
pub mod report;

pub use api::*;
pub use comparison::*;
pub use report::*;
