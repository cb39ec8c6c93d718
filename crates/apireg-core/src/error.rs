//! Store error to registry error mapping.

use apireg_model::error::ApiRegError;

use crate::store::StoreError;

/// Convert a store failure into the registry error returned to the caller.
///
/// A failed existence condition is a duplicate, transient failures are
/// "unavailable", and everything else is internal. The store error is kept as
/// the source for logging; its text never reaches the response body.
#[must_use]
pub fn store_error_to_apireg(e: StoreError) -> ApiRegError {
    match e {
        StoreError::ConditionalCheckFailed(_) => ApiRegError::duplicate().with_source(e),
        StoreError::Unavailable { .. } => ApiRegError::store_unavailable().with_source(e),
        StoreError::Internal { .. } => ApiRegError::internal_error().with_source(e),
    }
}
