use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::guidance::format::{format_distance, format_duration};
use crate::location::LocationSample;
use crate::routing::{Coordinate, EmergencyUpdate, GuidanceStep, TravelMode};

use super::config::EmergencyFallbackConfig;
use super::error::ErrorKind;

/// 启动导航的输入：已选定路线的标识与坐标序列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub route_id: String,
    pub coordinates: Vec<Coordinate>,
}

impl RouteDescriptor {
    pub fn new<S: Into<String>>(route_id: S, coordinates: Vec<Coordinate>) -> Self {
        Self {
            route_id: route_id.into(),
            coordinates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOrigin {
    /// 由路线计算结果构建。
    Route,
    /// 紧急降级时合成，不随定位自动推进。
    EmergencyFallback,
}

/// 一次活跃的导航会话。
///
/// 步骤顺序固定，`current_step_index` 单调不减；索引到达末尾即会话结束，
/// 因此可观测的会话总满足 `current_step_index < steps.len()`。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSession {
    route_id: String,
    steps: Vec<GuidanceStep>,
    current_step_index: usize,
    mode: TravelMode,
    started_at: SystemTime,
    origin: SessionOrigin,
    next_direction: String,
    remaining_distance: f64,
    estimated_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    emergency_route: Option<Value>,
}

impl NavigationSession {
    pub(crate) fn from_route(
        route_id: String,
        steps: Vec<GuidanceStep>,
        mode: TravelMode,
    ) -> Self {
        let mut session = Self {
            route_id,
            steps,
            current_step_index: 0,
            mode,
            started_at: SystemTime::now(),
            origin: SessionOrigin::Route,
            next_direction: String::new(),
            remaining_distance: 0.0,
            estimated_time: 0.0,
            emergency_route: None,
        };
        session.refresh_progress();
        session
    }

    pub(crate) fn emergency_fallback(config: &EmergencyFallbackConfig, mode: TravelMode) -> Self {
        let step = GuidanceStep::new(
            config.next_direction.clone(),
            config.remaining_distance,
            config.estimated_time,
        );
        let mut session = Self {
            route_id: config.route_id.clone(),
            steps: vec![step],
            current_step_index: 0,
            mode,
            started_at: SystemTime::now(),
            origin: SessionOrigin::EmergencyFallback,
            next_direction: String::new(),
            remaining_distance: 0.0,
            estimated_time: 0.0,
            emergency_route: None,
        };
        session.apply_fallback(config);
        session
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    pub fn steps(&self) -> &[GuidanceStep] {
        &self.steps
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn current_step(&self) -> Option<&GuidanceStep> {
        self.steps.get(self.current_step_index)
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn origin(&self) -> SessionOrigin {
        self.origin
    }

    pub fn next_direction(&self) -> &str {
        &self.next_direction
    }

    pub fn remaining_distance(&self) -> f64 {
        self.remaining_distance
    }

    pub fn estimated_time(&self) -> f64 {
        self.estimated_time
    }

    pub fn emergency_route(&self) -> Option<&Value> {
        self.emergency_route.as_ref()
    }

    /// 单行进度摘要，例如 `Turn right onto Oak Ave · 130 m · 1m`。
    pub fn progress_line(&self) -> String {
        format!(
            "{} · {} · {}",
            self.next_direction,
            format_distance(self.remaining_distance),
            format_duration(self.estimated_time)
        )
    }

    /// 从当前步骤到终点的声明距离与时长之和。
    pub fn remaining_totals(&self) -> (f64, f64) {
        self.steps
            .iter()
            .skip(self.current_step_index)
            .fold((0.0, 0.0), |(distance, duration), step| {
                (
                    distance + step.distance_meters,
                    duration + step.duration_seconds,
                )
            })
    }

    pub(crate) fn refresh_progress(&mut self) {
        let (distance, duration) = self.remaining_totals();
        self.remaining_distance = distance;
        self.estimated_time = duration;
        self.next_direction = self
            .current_step()
            .map(|step| step.instruction_text.clone())
            .unwrap_or_default();
    }

    /// 推进一步；已处于最后一步时返回 `false`，由调用方结束会话。
    pub(crate) fn advance(&mut self, refresh: bool) -> bool {
        if self.current_step_index + 1 >= self.steps.len() {
            return false;
        }

        self.current_step_index += 1;
        if refresh {
            self.refresh_progress();
        }
        true
    }

    pub(crate) fn apply_emergency(&mut self, update: EmergencyUpdate) {
        if let Some(direction) = update.next_direction {
            self.next_direction = direction;
        }
        if let Some(distance) = update.remaining_distance {
            self.remaining_distance = distance;
        }
        if let Some(time) = update.estimated_time {
            self.estimated_time = time;
        }
        if let Some(route) = update.emergency_route {
            self.emergency_route = Some(route);
        }
    }

    pub(crate) fn apply_fallback(&mut self, config: &EmergencyFallbackConfig) {
        self.next_direction = config.next_direction.clone();
        self.remaining_distance = config.remaining_distance;
        self.estimated_time = config.estimated_time;
        self.emergency_route = Some(json!({
            "source": "fallback",
            "nextDirection": config.next_direction,
            "instruction": config.safety_instruction,
        }));
    }
}

/// 对外可观测的引擎状态快照。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub is_navigating: bool,
    pub is_emergency: bool,
    pub current_session: Option<NavigationSession>,
    pub last_known_location: Option<LocationSample>,
    pub last_error: Option<ErrorKind>,
    pub voice_enabled: bool,
}

impl EngineState {
    pub(crate) fn idle(voice_enabled: bool) -> Self {
        Self {
            is_navigating: false,
            is_emergency: false,
            current_session: None,
            last_known_location: None,
            last_error: None,
            voice_enabled,
        }
    }

    /// 回到空闲默认值；语音开关是用户偏好，保持不变。
    pub(crate) fn reset(&mut self) {
        *self = Self::idle(self.voice_enabled);
    }

    pub fn is_idle(&self) -> bool {
        !self.is_navigating && !self.is_emergency && self.current_session.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step_session() -> NavigationSession {
        NavigationSession::from_route(
            "route-1".into(),
            vec![
                GuidanceStep::new("Head north on Main St", 100.0, 60.0),
                GuidanceStep::new("Turn right onto Oak Ave", 30.0, 20.0),
            ],
            TravelMode::Foot,
        )
    }

    #[test]
    fn progress_sums_remaining_steps() {
        let mut session = two_step_session();
        assert_eq!(session.remaining_distance(), 130.0);
        assert_eq!(session.estimated_time(), 80.0);
        assert_eq!(session.next_direction(), "Head north on Main St");

        assert!(session.advance(true));
        assert_eq!(session.current_step_index(), 1);
        assert_eq!(session.remaining_distance(), 30.0);
        assert_eq!(session.progress_line(), "Turn right onto Oak Ave · 30 m · 0m");

        assert!(!session.advance(true));
        assert_eq!(session.current_step_index(), 1);
    }

    #[test]
    fn emergency_update_only_overrides_present_fields() {
        let mut session = two_step_session();
        session.apply_emergency(EmergencyUpdate {
            next_direction: Some("Take the fire road south".into()),
            remaining_distance: None,
            estimated_time: Some(12.0),
            emergency_route: Some(json!({ "exit": "north gate" })),
        });

        assert_eq!(session.next_direction(), "Take the fire road south");
        assert_eq!(session.remaining_distance(), 130.0);
        assert_eq!(session.estimated_time(), 12.0);
        assert_eq!(session.emergency_route(), Some(&json!({ "exit": "north gate" })));
        assert_eq!(session.steps().len(), 2);
    }

    #[test]
    fn fallback_session_carries_canonical_payload() {
        let session = NavigationSession::emergency_fallback(
            &EmergencyFallbackConfig::default(),
            TravelMode::Foot,
        );

        assert_eq!(session.origin(), SessionOrigin::EmergencyFallback);
        assert_eq!(session.next_direction(), "Head to nearest exit point");
        assert_eq!(session.remaining_distance(), 0.5);
        assert_eq!(session.estimated_time(), 15.0);
        assert_eq!(session.current_step_index(), 0);
        assert!(session.current_step().is_some());
        let route = session.emergency_route().expect("fallback route payload");
        assert_eq!(route["source"], "fallback");
    }

    #[test]
    fn reset_keeps_voice_preference() {
        let mut state = EngineState::idle(false);
        state.is_navigating = true;
        state.last_error = Some(ErrorKind::RoutingUnavailable);
        state.reset();
        assert_eq!(state, EngineState::idle(false));
        assert!(state.is_idle());
    }
}
