//! 定位服务能力边界。
//!
//! 引擎只依赖 [`LocationProvider`]：单次定位用于启动导航，持续监听用于推进步骤。

mod channel;

pub use channel::ChannelLocationProvider;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// 一次定位读数，引擎只保留最近一次。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, alias = "accuracy")]
    pub accuracy_meters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl LocationSample {
    pub fn new(lat: f64, lon: f64, accuracy_meters: f64) -> Self {
        Self {
            lat,
            lon,
            accuracy_meters,
            heading: None,
            speed: None,
        }
    }

    pub fn with_motion(mut self, heading: Option<f64>, speed: Option<f64>) -> Self {
        self.heading = heading;
        self.speed = speed;
        self
    }
}

/// 平台定位接口的请求参数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// 可接受的缓存定位最大时长。
    pub maximum_age: Duration,
}

impl LocationOptions {
    pub fn single_shot() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::from_millis(60_000),
        }
    }

    pub fn continuous() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::from_millis(5_000),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("location request timed out")]
    Timeout,
}

impl LocationError {
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "permission_denied",
            LocationError::Unavailable { .. } => "unavailable",
            LocationError::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchId(pub u64);

pub type LocationEvent = Result<LocationSample, LocationError>;

/// 一个已打开的持续定位订阅。
///
/// 事件按投递顺序排队；订阅被 `clear_watch` 清除或被新订阅替换后通道关闭。
#[derive(Debug)]
pub struct LocationWatch {
    pub id: WatchId,
    pub events: mpsc::Receiver<LocationEvent>,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(
        &self,
        options: &LocationOptions,
    ) -> Result<LocationSample, LocationError>;

    /// 打开持续监听。已有订阅时先停止旧订阅。
    fn watch(&self, options: &LocationOptions) -> Result<LocationWatch, LocationError>;

    fn clear_watch(&self, id: WatchId);
}
