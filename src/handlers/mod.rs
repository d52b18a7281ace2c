// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod compare;
pub mod health;
pub mod images;
pub mod index;

pub use compare::config as compare_config;
pub use health::config as health_config;
pub use images::config as images_config;
pub use index::config as index_config;
