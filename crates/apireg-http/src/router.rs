//! Registry request router.
//!
//! The registry exposes a single resource:
//!
//! ```text
//! POST /settings               -> CreateSetting
//! GET  /settings/{settingId}   -> GetSetting
//! ```
//!
//! The `{settingId}` segment is percent-decoded before it reaches the
//! handler. Known paths hit with the wrong method yield 405, anything else 404.

use percent_encoding::percent_decode_str;

use apireg_model::error::ApiRegError;
use apireg_model::operations::ApiRegOperation;

/// Path of the settings collection.
const SETTINGS_PATH: &str = "/settings";

/// Routing result handed to the handler together with the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingContext {
    /// The resolved operation.
    pub operation: ApiRegOperation,
    /// Decoded `{settingId}` path segment, for item routes.
    pub setting_id: Option<String>,
}

impl RoutingContext {
    fn collection(operation: ApiRegOperation) -> Self {
        Self {
            operation,
            setting_id: None,
        }
    }
}

/// Resolve a registry operation from the request method and path.
pub fn resolve_operation(
    method: &http::Method,
    path: &str,
) -> Result<RoutingContext, ApiRegError> {
    let path = path.strip_suffix('/').unwrap_or(path);

    if path == SETTINGS_PATH {
        return if *method == http::Method::POST {
            Ok(RoutingContext::collection(ApiRegOperation::CreateSetting))
        } else {
            Err(ApiRegError::method_not_allowed())
        };
    }

    let Some(segment) = path
        .strip_prefix(SETTINGS_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Err(ApiRegError::not_found());
    };

    if segment.is_empty() || segment.contains('/') {
        return Err(ApiRegError::not_found());
    }

    if *method != http::Method::GET {
        return Err(ApiRegError::method_not_allowed());
    }

    let setting_id = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| ApiRegError::validation("Setting id in path is not valid UTF-8"))?
        .into_owned();

    Ok(RoutingContext {
        operation: ApiRegOperation::GetSetting,
        setting_id: Some(setting_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use apireg_model::error::ApiRegErrorCode;

    #[test]
    fn test_should_resolve_create_setting() {
        let ctx = resolve_operation(&http::Method::POST, "/settings").unwrap();
        assert_eq!(ctx.operation, ApiRegOperation::CreateSetting);
        assert_eq!(ctx.setting_id, None);
    }

    #[test]
    fn test_should_accept_trailing_slash() {
        let ctx = resolve_operation(&http::Method::POST, "/settings/").unwrap();
        assert_eq!(ctx.operation, ApiRegOperation::CreateSetting);
    }

    #[test]
    fn test_should_resolve_get_setting_with_decoded_id() {
        let ctx = resolve_operation(&http::Method::GET, "/settings/team%23a").unwrap();
        assert_eq!(ctx.operation, ApiRegOperation::GetSetting);
        assert_eq!(ctx.setting_id.as_deref(), Some("team#a"));
    }

    #[test]
    fn test_should_reject_wrong_method_on_known_routes() {
        let err = resolve_operation(&http::Method::GET, "/settings").unwrap_err();
        assert_eq!(err.code, ApiRegErrorCode::MethodNotAllowed);

        let err = resolve_operation(&http::Method::DELETE, "/settings/s1").unwrap_err();
        assert_eq!(err.code, ApiRegErrorCode::MethodNotAllowed);
    }

    #[test]
    fn test_should_return_not_found_for_unknown_paths() {
        for path in ["/", "/setting", "/settingsx", "/settings/a/b", "/other/s1"] {
            let err = resolve_operation(&http::Method::GET, path).unwrap_err();
            assert_eq!(err.code, ApiRegErrorCode::NotFound, "path: {path}");
        }
    }

    #[test]
    fn test_should_reject_invalid_utf8_in_segment() {
        let err = resolve_operation(&http::Method::GET, "/settings/%FF").unwrap_err();
        assert_eq!(err.code, ApiRegErrorCode::ValidationError);
    }
}
