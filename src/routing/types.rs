use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::location::LocationSample;

/// 路线端点坐标。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// 出行方式，取值封闭。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Foot,
    Hiking,
    Cycling,
    Driving,
    Transit,
    Multimodal,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Foot => "foot",
            TravelMode::Hiking => "hiking",
            TravelMode::Cycling => "cycling",
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
            TravelMode::Multimodal => "multimodal",
        }
    }
}

/// 一个机动动作及其到下一动作的距离与时长。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceStep {
    #[serde(alias = "instruction")]
    pub instruction_text: String,
    #[serde(default, alias = "distance")]
    pub distance_meters: f64,
    #[serde(default, alias = "duration")]
    pub duration_seconds: f64,
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
}

impl GuidanceStep {
    pub fn new<S: Into<String>>(
        instruction_text: S,
        distance_meters: f64,
        duration_seconds: f64,
    ) -> Self {
        Self {
            instruction_text: instruction_text.into(),
            distance_meters,
            duration_seconds,
            street_name: None,
        }
    }

    pub fn on_street<S: Into<String>>(mut self, street_name: S) -> Self {
        self.street_name = Some(street_name.into());
        self
    }
}

/// 路线计算偏好，原样透传给后端。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutePreferences {
    pub alternatives: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for RoutePreferences {
    fn default() -> Self {
        Self {
            alternatives: 1,
            difficulty: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
    pub preferences: RoutePreferences,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    #[serde(default, alias = "distance")]
    pub distance_meters: f64,
    #[serde(default, alias = "duration")]
    pub duration_seconds: f64,
    #[serde(default)]
    pub steps: Vec<GuidanceStep>,
}

/// 一条候选路线。后端可按分段返回步骤，也可直接给出 `steps`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAlternative {
    #[serde(default, alias = "distance")]
    pub distance_meters: f64,
    #[serde(default, alias = "duration")]
    pub duration_seconds: f64,
    #[serde(default)]
    pub segments: Vec<RouteSegment>,
    #[serde(default)]
    pub steps: Vec<GuidanceStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    #[serde(default)]
    pub routes: Vec<RouteAlternative>,
}

impl RouteResult {
    /// 将首条候选路线的全部分段展平为一个有序步骤序列。
    pub fn flatten_steps(self) -> Vec<GuidanceStep> {
        let Some(first) = self.routes.into_iter().next() else {
            return Vec::new();
        };

        if first.segments.is_empty() {
            return first.steps;
        }

        first
            .segments
            .into_iter()
            .flat_map(|segment| segment.steps)
            .collect()
    }
}

/// 导航状态上报载荷。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationStatus {
    pub route_id: String,
    pub current_location: LocationSample,
    /// Unix 毫秒时间戳。
    pub timestamp: u64,
}

/// 紧急改道接口的返回，缺省字段不覆盖会话已有值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyUpdate {
    #[serde(default)]
    pub next_direction: Option<String>,
    #[serde(default)]
    pub remaining_distance: Option<f64>,
    #[serde(default)]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub emergency_route: Option<Value>,
}
