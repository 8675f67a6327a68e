use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{
    LocationError, LocationEvent, LocationOptions, LocationProvider, LocationSample, LocationWatch,
    WatchId,
};

const DEFAULT_CAPACITY: usize = 32;

/// 由调用方手动投喂定位的提供者，用于回放轨迹、手动注入与测试。
///
/// 同一时间最多一个活跃订阅；新的 `watch` 会关闭旧订阅。
pub struct ChannelLocationProvider {
    capacity: usize,
    current: Mutex<Result<LocationSample, LocationError>>,
    active: Mutex<Option<(WatchId, mpsc::Sender<LocationEvent>)>>,
    next_id: AtomicU64,
    opened: AtomicU64,
}

impl std::fmt::Debug for ChannelLocationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelLocationProvider")
            .field("capacity", &self.capacity)
            .field("active_watches", &self.active_watches())
            .finish_non_exhaustive()
    }
}

impl ChannelLocationProvider {
    pub fn new(current: LocationSample) -> Self {
        Self::with_current(Ok(current))
    }

    pub fn with_current(current: Result<LocationSample, LocationError>) -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            current: Mutex::new(current),
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
            opened: AtomicU64::new(0),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn set_current(&self, current: Result<LocationSample, LocationError>) {
        *lock(&self.current) = current;
    }

    /// 向活跃订阅投递一个读数；没有订阅时返回 `false`。
    pub async fn push(&self, sample: LocationSample) -> bool {
        *lock(&self.current) = Ok(sample);
        self.deliver(Ok(sample)).await
    }

    pub async fn push_error(&self, error: LocationError) -> bool {
        self.deliver(Err(error)).await
    }

    pub fn active_watches(&self) -> usize {
        usize::from(lock(&self.active).is_some())
    }

    /// 自创建以来打开过的订阅总数。
    pub fn watches_opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    async fn deliver(&self, event: LocationEvent) -> bool {
        let sender = match lock(&self.active).as_ref() {
            Some((_, sender)) => sender.clone(),
            None => return false,
        };

        if let Err(err) = sender.send(event).await {
            warn!(
                target: "location_provider",
                %err,
                "location watch closed before delivery"
            );
            return false;
        }
        true
    }
}

#[async_trait]
impl LocationProvider for ChannelLocationProvider {
    async fn current_location(
        &self,
        _options: &LocationOptions,
    ) -> Result<LocationSample, LocationError> {
        lock(&self.current).clone()
    }

    fn watch(&self, options: &LocationOptions) -> Result<LocationWatch, LocationError> {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::channel(self.capacity);

        let previous = lock(&self.active).replace((id, tx));
        if let Some((previous_id, _)) = previous {
            warn!(
                target: "location_provider",
                previous = previous_id.0,
                replacement = id.0,
                "replacing active location watch"
            );
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        info!(
            target: "location_provider",
            watch_id = id.0,
            high_accuracy = options.high_accuracy,
            max_age_ms = options.maximum_age.as_millis() as u64,
            "location watch opened"
        );

        Ok(LocationWatch { id, events: rx })
    }

    fn clear_watch(&self, id: WatchId) {
        let mut active = lock(&self.active);
        if matches!(active.as_ref(), Some((current, _)) if *current == id) {
            active.take();
            info!(target: "location_provider", watch_id = id.0, "location watch cleared");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64) -> LocationSample {
        LocationSample::new(lat, -71.0, 5.0)
    }

    #[tokio::test]
    async fn new_watch_closes_previous_subscription() {
        let provider = ChannelLocationProvider::new(sample(42.0));
        let mut first = provider
            .watch(&LocationOptions::continuous())
            .expect("first watch");
        let mut second = provider
            .watch(&LocationOptions::continuous())
            .expect("second watch");

        assert_eq!(provider.active_watches(), 1);
        assert_eq!(provider.watches_opened(), 2);
        assert!(first.events.recv().await.is_none());

        assert!(provider.push(sample(42.1)).await);
        let event = second.events.recv().await.expect("sample delivered");
        assert_eq!(event, Ok(sample(42.1)));
    }

    #[tokio::test]
    async fn clear_watch_ignores_stale_ids() {
        let provider = ChannelLocationProvider::new(sample(42.0));
        let first = provider
            .watch(&LocationOptions::continuous())
            .expect("first watch");
        let second = provider
            .watch(&LocationOptions::continuous())
            .expect("second watch");

        provider.clear_watch(first.id);
        assert_eq!(provider.active_watches(), 1);

        provider.clear_watch(second.id);
        assert_eq!(provider.active_watches(), 0);
        assert!(!provider.push(sample(42.2)).await);
    }

    #[tokio::test]
    async fn current_location_reports_configured_error() {
        let provider = ChannelLocationProvider::with_current(Err(LocationError::PermissionDenied));
        let result = provider
            .current_location(&LocationOptions::single_shot())
            .await;
        assert_eq!(result, Err(LocationError::PermissionDenied));
    }
}
