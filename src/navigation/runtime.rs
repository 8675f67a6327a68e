use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::location::LocationEvent;
use crate::routing::{NavigationBackend, NavigationStatus};
use crate::telemetry::events::record_status_push_failure;

use super::engine::EngineInner;
use super::error::NavigationError;

/// 逐个消费定位事件：第 N 个读数处理完之前不会读取第 N+1 个。
pub(crate) fn spawn_sample_pump(
    engine: Weak<EngineInner>,
    epoch: u64,
    mut events: mpsc::Receiver<LocationEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let Some(engine) = engine.upgrade() else {
                break;
            };

            match event {
                Ok(sample) => engine.handle_sample(Some(epoch), sample).await,
                Err(err) => engine.record_watch_error(epoch, err).await,
            }
        }

        debug!(target: "navigation_engine", epoch, "location watch drained");
    })
}

/// 状态上报脱离状态机执行，结果只进日志。
pub(crate) fn spawn_status_push(backend: Arc<dyn NavigationBackend>, status: NavigationStatus) {
    tokio::spawn(async move {
        match backend.update_navigation_status(&status).await {
            Ok(()) => debug!(
                target: "navigation_engine",
                route_id = %status.route_id,
                "navigation status pushed"
            ),
            Err(err) => {
                let err = NavigationError::from(err);
                record_status_push_failure(&status.route_id, err.kind().as_str(), err.to_string());
            }
        }
    });
}

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis().min(u64::MAX as u128) as u64)
        .unwrap_or(0)
}
