//! 逐向导航引擎：会话状态机、定位驱动的步骤推进与紧急降级。

mod constants;
mod engine;
mod runtime;

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod types;

pub use config::{EmergencyFallbackConfig, NavigationConfig};
pub use engine::{EmergencyOutcome, NavigationEngine};
pub use error::{ErrorKind, NavigationError};
pub use lifecycle::{
    EmergencySource, NavigationLifecyclePayload, NavigationLifecycleUpdate, NavigationPhase,
};
pub use types::{EngineState, NavigationSession, RouteDescriptor, SessionOrigin};
