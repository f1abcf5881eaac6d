//! Kernel utilities shared across slices.
//! Keep this crate lightweight; today it only owns layered config loading.
//!
//! ## Config loading
//! ```rust,no_run
//! use casefile_kernel::config::load_config;
//! use casefile_kernel::domain::config::CasefileConfig;
//!
//! let cfg: CasefileConfig = load_config(Some("casefile.toml")).unwrap_or_default();
//! # let _ = cfg;
//! ```
pub mod config;

pub use casefile_domain as domain;
