//! 导航生命周期广播负载定义。

use std::time::SystemTime;

use super::error::ErrorKind;

/// 导航状态机的阶段划分。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    Navigating,
    StepAdvanced,
    Emergency,
    Completed,
    Stopped,
    Failed,
}

impl NavigationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationPhase::Navigating => "navigating",
            NavigationPhase::StepAdvanced => "step_advanced",
            NavigationPhase::Emergency => "emergency",
            NavigationPhase::Completed => "completed",
            NavigationPhase::Stopped => "stopped",
            NavigationPhase::Failed => "failed",
        }
    }
}

/// 紧急状态的来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencySource {
    Backend,
    Fallback,
}

impl EmergencySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencySource::Backend => "backend",
            EmergencySource::Fallback => "fallback",
        }
    }
}

/// 生命周期事件的附加信息。
#[derive(Debug, Clone, Default)]
pub enum NavigationLifecyclePayload {
    #[default]
    None,
    Started(StartedPayload),
    StepAdvanced(StepPayload),
    Emergency(EmergencyPayload),
    Failed(FailurePayload),
}

#[derive(Debug, Clone)]
pub struct StartedPayload {
    pub step_count: usize,
    pub remaining_distance: f64,
    pub estimated_time: f64,
}

#[derive(Debug, Clone)]
pub struct StepPayload {
    pub step_index: usize,
    pub instruction: String,
}

#[derive(Debug, Clone)]
pub struct EmergencyPayload {
    pub source: EmergencySource,
    pub next_direction: String,
}

#[derive(Debug, Clone)]
pub struct FailurePayload {
    pub kind: ErrorKind,
    pub error: String,
}

/// 生命周期事件。
#[derive(Debug, Clone)]
pub struct NavigationLifecycleUpdate {
    pub route_id: Option<String>,
    pub phase: NavigationPhase,
    pub issued_at: SystemTime,
    pub payload: NavigationLifecyclePayload,
}

impl NavigationLifecycleUpdate {
    /// 构造一个空载荷的事件。
    pub fn new(route_id: Option<String>, phase: NavigationPhase) -> Self {
        Self {
            route_id,
            phase,
            issued_at: SystemTime::now(),
            payload: NavigationLifecyclePayload::None,
        }
    }

    pub fn started<S: Into<String>>(
        route_id: S,
        step_count: usize,
        remaining_distance: f64,
        estimated_time: f64,
    ) -> Self {
        Self {
            payload: NavigationLifecyclePayload::Started(StartedPayload {
                step_count,
                remaining_distance,
                estimated_time,
            }),
            ..Self::new(Some(route_id.into()), NavigationPhase::Navigating)
        }
    }

    pub fn step_advanced<S: Into<String>>(
        route_id: S,
        step_index: usize,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            payload: NavigationLifecyclePayload::StepAdvanced(StepPayload {
                step_index,
                instruction: instruction.into(),
            }),
            ..Self::new(Some(route_id.into()), NavigationPhase::StepAdvanced)
        }
    }

    pub fn emergency<S: Into<String>>(
        route_id: S,
        source: EmergencySource,
        next_direction: impl Into<String>,
    ) -> Self {
        Self {
            payload: NavigationLifecyclePayload::Emergency(EmergencyPayload {
                source,
                next_direction: next_direction.into(),
            }),
            ..Self::new(Some(route_id.into()), NavigationPhase::Emergency)
        }
    }

    /// 声明启动失败。
    pub fn failed<S: Into<String>>(route_id: S, kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            payload: NavigationLifecyclePayload::Failed(FailurePayload {
                kind,
                error: error.into(),
            }),
            ..Self::new(Some(route_id.into()), NavigationPhase::Failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_helper_sets_payload() {
        let update = NavigationLifecycleUpdate::started("route", 2, 130.0, 80.0);

        assert_eq!(update.phase, NavigationPhase::Navigating);
        assert_eq!(update.route_id.as_deref(), Some("route"));
        match update.payload {
            NavigationLifecyclePayload::Started(payload) => {
                assert_eq!(payload.step_count, 2);
                assert_eq!(payload.remaining_distance, 130.0);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn emergency_helper_records_source() {
        let update = NavigationLifecycleUpdate::emergency(
            "route",
            EmergencySource::Fallback,
            "Head to nearest exit point",
        );

        match update.payload {
            NavigationLifecyclePayload::Emergency(payload) => {
                assert_eq!(payload.source, EmergencySource::Fallback);
                assert_eq!(payload.next_direction, "Head to nearest exit point");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn failed_helper_sets_error() {
        let update = NavigationLifecycleUpdate::failed(
            "route",
            ErrorKind::RoutingUnavailable,
            "routing request timed out",
        );

        assert_eq!(update.phase, NavigationPhase::Failed);
        match update.payload {
            NavigationLifecyclePayload::Failed(payload) => {
                assert_eq!(payload.kind, ErrorKind::RoutingUnavailable);
                assert_eq!(payload.error, "routing request timed out");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn phase_labels_are_stable() {
        assert_eq!(NavigationPhase::StepAdvanced.as_str(), "step_advanced");
        assert_eq!(EmergencySource::Backend.as_str(), "backend");
    }
}
