//! Registry operation enum.

use std::fmt;

/// All operations exposed by the registry HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiRegOperation {
    /// `POST /settings`: register a new setting.
    CreateSetting,
    /// `GET /settings/{settingId}`: list the records of one setting.
    GetSetting,
}

impl ApiRegOperation {
    /// Returns the operation name string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateSetting => "CreateSetting",
            Self::GetSetting => "GetSetting",
        }
    }
}

impl fmt::Display for ApiRegOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
