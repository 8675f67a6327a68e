use serde::Serialize;
use tracing::{info, warn};

pub(crate) const TARGET: &str = "telemetry::navigation";
pub(crate) const EVENT_STARTED: &str = "navigation_started";
pub(crate) const EVENT_START_FAILED: &str = "navigation_start_failed";
pub(crate) const EVENT_STEP_ADVANCED: &str = "navigation_step_advanced";
pub(crate) const EVENT_FINISHED: &str = "navigation_finished";
pub(crate) const EVENT_EMERGENCY: &str = "navigation_emergency";
pub(crate) const EVENT_STATUS_PUSH_FAILED: &str = "navigation_status_push_failed";

#[derive(Debug, Serialize)]
pub struct NavigationStartedEvent<'a> {
    pub route_id: &'a str,
    pub mode: &'static str,
    pub step_count: usize,
    pub remaining_distance: f64,
    pub estimated_time: f64,
}

#[derive(Debug, Serialize)]
pub struct NavigationStartFailedEvent<'a> {
    pub route_id: &'a str,
    pub kind: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StepAdvancedEvent<'a> {
    pub route_id: &'a str,
    pub step_index: usize,
    pub step_count: usize,
}

#[derive(Debug, Serialize)]
pub struct NavigationFinishedEvent<'a> {
    pub route_id: &'a str,
    pub outcome: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EmergencyEvent<'a> {
    pub route_id: &'a str,
    pub source: &'static str,
    pub reason: Option<String>,
}

pub fn record_navigation_started(
    route_id: &str,
    mode: &'static str,
    step_count: usize,
    remaining_distance: f64,
    estimated_time: f64,
) {
    let event = NavigationStartedEvent {
        route_id,
        mode,
        step_count,
        remaining_distance,
        estimated_time,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_STARTED,
            route_id,
            mode,
            step_count,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_STARTED,
            %err,
            "failed to encode navigation start event"
        ),
    }
}

pub fn record_navigation_start_failed(route_id: &str, kind: &'static str, error: String) {
    let event = NavigationStartFailedEvent {
        route_id,
        kind,
        error,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => warn!(
            target: TARGET,
            event = EVENT_START_FAILED,
            route_id,
            kind,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_START_FAILED,
            %err,
            "failed to encode navigation start failure event"
        ),
    }
}

pub fn record_step_advanced(route_id: &str, step_index: usize, step_count: usize) {
    let event = StepAdvancedEvent {
        route_id,
        step_index,
        step_count,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_STEP_ADVANCED,
            route_id,
            step_index,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_STEP_ADVANCED,
            %err,
            "failed to encode step advance event"
        ),
    }
}

pub fn record_navigation_finished(route_id: &str, outcome: &'static str) {
    let event = NavigationFinishedEvent { route_id, outcome };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_FINISHED,
            route_id,
            outcome,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_FINISHED,
            %err,
            "failed to encode navigation finish event"
        ),
    }
}

pub fn record_emergency(route_id: &str, source: &'static str, reason: Option<String>) {
    let event = EmergencyEvent {
        route_id,
        source,
        reason,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => warn!(
            target: TARGET,
            event = EVENT_EMERGENCY,
            route_id,
            source,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_EMERGENCY,
            %err,
            "failed to encode emergency event"
        ),
    }
}

/// 状态上报失败只记日志，不进入状态机。
pub fn record_status_push_failure(route_id: &str, kind: &'static str, error: String) {
    warn!(
        target: TARGET,
        event = EVENT_STATUS_PUSH_FAILED,
        route_id,
        kind,
        %error,
        "navigation status push failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_event_encodes_snake_case_fields() {
        let event = NavigationStartedEvent {
            route_id: "route-1",
            mode: "foot",
            step_count: 2,
            remaining_distance: 130.0,
            estimated_time: 80.0,
        };
        let payload = serde_json::to_value(&event).expect("encode event");
        assert_eq!(payload["route_id"], "route-1");
        assert_eq!(payload["step_count"], 2);
    }
}
