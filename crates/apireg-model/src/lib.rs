//! Model types for the external API setting registry.
//!
//! This crate holds the validated [`Setting`] entity, the composite
//! [`SettingKey`] under which settings are stored, the HTTP operations the
//! registry exposes, and the error type shared by the HTTP and core layers.
//! All wire types use camelCase JSON field names.
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod key;
pub mod operations;
pub mod output;
pub mod types;

pub use error::{ApiRegError, ApiRegErrorCode};
pub use key::SettingKey;
pub use operations::ApiRegOperation;
pub use types::{ApiDetails, Setting, SettingRecord};
