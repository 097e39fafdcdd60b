use thiserror::Error;

/// Result type alias for endpoint resolution
pub type Result<T> = std::result::Result<T, ExposureError>;

/// Configuration defects surfaced while resolving endpoints.
///
/// None of these are recoverable locally: resolution for a type either
/// completes or aborts with one of these errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExposureError {
    /// The naming convention (or the prefix generators) produced no route names
    #[error("no route names could be generated for `{service}`")]
    NoRouteNames { service: String },

    /// A known declarative marker could not be interpreted
    #[error("malformed `#[{marker}]` on {owner}: {reason}")]
    MalformedMarker {
        marker: String,
        owner: String,
        reason: String,
    },

    /// The requested service type is not declared in the scanned sources
    #[error("type `{0}` is not declared in the scanned sources")]
    UnknownType(String),

    /// Two descriptors claim the same route and method name
    #[error("endpoint `{route}` -> `{method}` is registered more than once")]
    DuplicateEndpoint { route: String, method: String },
}

impl ExposureError {
    pub(crate) fn malformed(
        marker: impl Into<String>,
        owner: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ExposureError::MalformedMarker {
            marker: marker.into(),
            owner: owner.into(),
            reason: reason.into(),
        }
    }
}
