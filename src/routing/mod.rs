//! 路线计算与导航后端的能力边界。

mod error;
mod types;

pub mod config;
pub mod http;

pub use config::BackendConfig;
pub use error::{BackendError, RoutingError};
pub use http::HttpBackend;
pub use types::{
    Coordinate, EmergencyUpdate, GuidanceStep, NavigationStatus, RouteAlternative, RoutePreferences,
    RouteRequest, RouteResult, RouteSegment, TravelMode,
};

use async_trait::async_trait;

#[async_trait]
pub trait RoutingClient: Send + Sync {
    async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResult, RoutingError>;
}

/// 导航过程中的后端接口：状态上报与紧急改道。
#[async_trait]
pub trait NavigationBackend: Send + Sync {
    async fn update_navigation_status(&self, status: &NavigationStatus)
        -> Result<(), BackendError>;

    async fn trigger_emergency_route(&self, route_id: &str) -> Result<EmergencyUpdate, BackendError>;
}
