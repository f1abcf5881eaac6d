//! # Domain Models
//!
//! Pure types shared by the package decoder, the type registry and their consumers.
//! Keep it lean: no I/O and no heavy logic, just data and small naming helpers.

pub mod config;
pub mod naming;
pub mod package;
pub mod registry;
pub mod types;

/// Key of the built-in namespace whose types keep their bare names.
pub const DEFAULT_DOMAIN: &str = "default";
