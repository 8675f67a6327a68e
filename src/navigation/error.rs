use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::LocationError;
use crate::routing::{BackendError, RoutingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    LocationUnavailable,
    InvalidRoute,
    RoutingUnavailable,
    NetworkTransient,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LocationUnavailable => "location_unavailable",
            ErrorKind::InvalidRoute => "invalid_route",
            ErrorKind::RoutingUnavailable => "routing_unavailable",
            ErrorKind::NetworkTransient => "network_transient",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("current location unavailable: {0}")]
    LocationUnavailable(#[from] LocationError),
    #[error("route {route_id} has {count} coordinate(s), at least 2 required")]
    InvalidRoute { route_id: String, count: usize },
    #[error("routing unavailable: {0}")]
    RoutingUnavailable(#[from] RoutingError),
    #[error("navigation status push failed: {0}")]
    NetworkTransient(#[from] BackendError),
    #[error("navigation start was superseded before it completed")]
    Cancelled,
}

impl NavigationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NavigationError::LocationUnavailable(_) => ErrorKind::LocationUnavailable,
            NavigationError::InvalidRoute { .. } => ErrorKind::InvalidRoute,
            NavigationError::RoutingUnavailable(_) => ErrorKind::RoutingUnavailable,
            NavigationError::NetworkTransient(_) => ErrorKind::NetworkTransient,
            NavigationError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_errors_map_to_kinds() {
        assert_eq!(
            NavigationError::from(LocationError::PermissionDenied).kind(),
            ErrorKind::LocationUnavailable
        );
        assert_eq!(
            NavigationError::from(RoutingError::Timeout).kind(),
            ErrorKind::RoutingUnavailable
        );
        assert_eq!(
            NavigationError::from(BackendError::Timeout).kind(),
            ErrorKind::NetworkTransient
        );
    }

    #[test]
    fn invalid_route_message_names_route() {
        let err = NavigationError::InvalidRoute {
            route_id: "blue-hills".into(),
            count: 1,
        };
        assert_eq!(
            err.to_string(),
            "route blue-hills has 1 coordinate(s), at least 2 required"
        );
        assert_eq!(err.kind().as_str(), "invalid_route");
    }
}
