//! Trailguide Core Library
//!
//! This crate guides a user along a selected route: it turns routing steps and a
//! live location stream into navigation progress, spoken guidance and an
//! emergency fallback that works even when the backend is unreachable.

pub mod guidance;
pub mod location;
pub mod navigation;
pub mod routing;
pub mod telemetry;

pub use guidance::{GuidanceAnnouncer, TracingAnnouncer};
pub use location::{ChannelLocationProvider, LocationProvider, LocationSample};
pub use navigation::{
    EmergencyOutcome, EngineState, ErrorKind, NavigationConfig, NavigationEngine, NavigationError,
    RouteDescriptor,
};
pub use routing::{GuidanceStep, HttpBackend, NavigationBackend, RoutingClient};
