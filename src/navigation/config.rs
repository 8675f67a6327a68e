use serde::{Deserialize, Serialize};

use crate::location::LocationOptions;
use crate::routing::{RoutePreferences, TravelMode};

use super::constants::{
    DEFAULT_ADVANCE_THRESHOLD_METERS, FALLBACK_ESTIMATED_TIME, FALLBACK_NEXT_DIRECTION,
    FALLBACK_REMAINING_DISTANCE, FALLBACK_ROUTE_ID, FALLBACK_SAFETY_INSTRUCTION,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub travel_mode: TravelMode,
    pub preferences: RoutePreferences,
    /// 当前步骤声明距离严格小于该值时推进一步。
    pub advance_threshold_meters: f64,
    pub voice_enabled: bool,
    pub current_location: LocationOptions,
    pub watch: LocationOptions,
    pub emergency: EmergencyFallbackConfig,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            travel_mode: TravelMode::Foot,
            preferences: RoutePreferences::default(),
            advance_threshold_meters: DEFAULT_ADVANCE_THRESHOLD_METERS,
            voice_enabled: true,
            current_location: LocationOptions::single_shot(),
            watch: LocationOptions::continuous(),
            emergency: EmergencyFallbackConfig::default(),
        }
    }
}

/// 紧急后端不可用时使用的固定载荷。
///
/// 距离与时间沿用历史数值，单位未定义。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyFallbackConfig {
    pub route_id: String,
    pub next_direction: String,
    pub remaining_distance: f64,
    pub estimated_time: f64,
    pub safety_instruction: String,
}

impl Default for EmergencyFallbackConfig {
    fn default() -> Self {
        Self {
            route_id: FALLBACK_ROUTE_ID.to_string(),
            next_direction: FALLBACK_NEXT_DIRECTION.to_string(),
            remaining_distance: FALLBACK_REMAINING_DISTANCE,
            estimated_time: FALLBACK_ESTIMATED_TIME,
            safety_instruction: FALLBACK_SAFETY_INSTRUCTION.to_string(),
        }
    }
}
