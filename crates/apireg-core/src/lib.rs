//! Registration logic for the external API setting registry.
//!
//! Requests flow through [`validation`] into the [`provider`], which derives
//! the composite key and performs a single conditional insert against an
//! injected [`store::SettingStore`]. The [`handler`] module adapts the
//! provider to the HTTP layer.
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handler;
pub mod provider;
pub mod store;
pub mod validation;

pub use config::ApiRegConfig;
pub use handler::ApiRegProviderHandler;
pub use provider::ApiRegProvider;
