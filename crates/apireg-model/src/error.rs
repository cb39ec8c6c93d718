//! Registry error types.
//!
//! Every failure that reaches the HTTP boundary is an [`ApiRegError`]. The
//! error code decides the status; the message is what the caller sees, so
//! server-side codes carry fixed, generic messages and keep the real cause in
//! [`ApiRegError::source`] for logging.

use std::fmt;

/// Well-known registry error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum ApiRegErrorCode {
    /// Request body missing, malformed, or lacking required fields.
    #[default]
    ValidationError,
    /// A setting with the same `(settingId, baseUrl)` already exists.
    DuplicateSetting,
    /// Transient store failure; the request can be retried unchanged.
    StoreUnavailable,
    /// Any failure not classified above.
    InternalError,
    /// No route matches the request path.
    NotFound,
    /// The requested setting has no records.
    SettingNotFound,
    /// The route exists but not for this method.
    MethodNotAllowed,
    /// Request body exceeds the configured limit.
    PayloadTooLarge,
}

impl ApiRegErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::DuplicateSetting => "DuplicateSetting",
            Self::StoreUnavailable => "StoreUnavailable",
            Self::InternalError => "InternalError",
            Self::NotFound => "NotFound",
            Self::SettingNotFound => "SettingNotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::PayloadTooLarge => "PayloadTooLarge",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::ValidationError => http::StatusCode::BAD_REQUEST,
            Self::DuplicateSetting => http::StatusCode::CONFLICT,
            Self::StoreUnavailable => http::StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound | Self::SettingNotFound => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Returns the message sent to callers when none is supplied.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Missing required fields",
            Self::DuplicateSetting => "Setting already exists",
            Self::StoreUnavailable => "Unable to add item",
            Self::InternalError => "Internal server error",
            Self::NotFound => "Not found",
            Self::SettingNotFound => "Setting not found",
            Self::MethodNotAllowed => "Method not allowed",
            Self::PayloadTooLarge => "Request body too large",
        }
    }

    /// Whether the caller may retry the identical request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable)
    }
}

impl fmt::Display for ApiRegErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registry error response.
#[derive(Debug)]
pub struct ApiRegError {
    /// The error code.
    pub code: ApiRegErrorCode,
    /// The message returned to the caller.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any. Never sent to the caller.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ApiRegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiRegError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for ApiRegError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl ApiRegError {
    /// Create a new error carrying the code's default message.
    #[must_use]
    pub fn new(code: ApiRegErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    /// Create a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ApiRegErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the response is a server-side failure.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code.is_server_error()
    }

    // -- Convenience constructors --

    /// Validation failure with a specific message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(ApiRegErrorCode::ValidationError, message)
    }

    /// Validation failure naming the missing fields.
    #[must_use]
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::validation(format!(
            "{}: {}",
            ApiRegErrorCode::ValidationError.default_message(),
            fields.join(", ")
        ))
    }

    /// Conditional insert rejected because the key already exists.
    #[must_use]
    pub fn duplicate() -> Self {
        Self::new(ApiRegErrorCode::DuplicateSetting)
    }

    /// Transient store failure.
    #[must_use]
    pub fn store_unavailable() -> Self {
        Self::new(ApiRegErrorCode::StoreUnavailable)
    }

    /// Unexpected internal failure.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::new(ApiRegErrorCode::InternalError)
    }

    /// No route for the request path.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(ApiRegErrorCode::NotFound)
    }

    /// Lookup returned no records.
    #[must_use]
    pub fn setting_not_found() -> Self {
        Self::new(ApiRegErrorCode::SettingNotFound)
    }

    /// Route exists for a different method.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(ApiRegErrorCode::MethodNotAllowed)
    }

    /// Body exceeds the size limit.
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::new(ApiRegErrorCode::PayloadTooLarge)
    }
}
