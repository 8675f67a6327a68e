use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::guidance::GuidanceAnnouncer;
use crate::location::{LocationError, LocationProvider, LocationSample, WatchId};
use crate::routing::{
    BackendError, EmergencyUpdate, HttpBackend, NavigationBackend, NavigationStatus, RouteRequest,
    RoutingClient,
};
use crate::telemetry::events::{
    record_emergency, record_navigation_finished, record_navigation_start_failed,
    record_navigation_started, record_step_advanced,
};

use super::config::NavigationConfig;
use super::constants::LIFECYCLE_CHANNEL_CAPACITY;
use super::error::{ErrorKind, NavigationError};
use super::lifecycle::{EmergencySource, NavigationLifecycleUpdate, NavigationPhase};
use super::runtime::{self, unix_millis};
use super::types::{EngineState, NavigationSession, RouteDescriptor, SessionOrigin};

/// `trigger_emergency` 的结果。任何分支都不会向调用方报错。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyOutcome {
    /// 后端返回了紧急路线并已合并到会话。
    Rerouted,
    /// 使用了固定的降级载荷。
    Fallback,
    /// 调用期间会话已被停止或替换，结果被丢弃。
    Discarded,
}

/// 导航引擎句柄，克隆后共享同一份状态。
#[derive(Clone)]
pub struct NavigationEngine {
    inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    config: NavigationConfig,
    routing: Arc<dyn RoutingClient>,
    backend: Arc<dyn NavigationBackend>,
    location: Arc<dyn LocationProvider>,
    announcer: Arc<dyn GuidanceAnnouncer>,
    shared: Mutex<EngineShared>,
    lifecycle_tx: broadcast::Sender<NavigationLifecycleUpdate>,
}

struct EngineShared {
    state: EngineState,
    /// 每次 start/stop/结束都会递增；携带旧值的异步结果一律丢弃。
    epoch: u64,
    watch: Option<ActiveWatch>,
}

struct ActiveWatch {
    id: WatchId,
    pump: JoinHandle<()>,
}

impl std::fmt::Debug for NavigationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationEngine")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl NavigationEngine {
    pub fn new(
        config: NavigationConfig,
        routing: Arc<dyn RoutingClient>,
        backend: Arc<dyn NavigationBackend>,
        location: Arc<dyn LocationProvider>,
        announcer: Arc<dyn GuidanceAnnouncer>,
    ) -> Self {
        let (lifecycle_tx, _) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        let state = EngineState::idle(config.voice_enabled);

        Self {
            inner: Arc::new(EngineInner {
                config,
                routing,
                backend,
                location,
                announcer,
                shared: Mutex::new(EngineShared {
                    state,
                    epoch: 0,
                    watch: None,
                }),
                lifecycle_tx,
            }),
        }
    }

    /// 路线计算与导航后端共用同一个 HTTP 客户端。
    pub fn with_http_backend(
        config: NavigationConfig,
        backend: HttpBackend,
        location: Arc<dyn LocationProvider>,
        announcer: Arc<dyn GuidanceAnnouncer>,
    ) -> Self {
        let backend = Arc::new(backend);
        Self::new(config, backend.clone(), backend, location, announcer)
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.inner.config
    }

    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<NavigationLifecycleUpdate> {
        self.inner.lifecycle_tx.subscribe()
    }

    pub async fn state(&self) -> EngineState {
        self.inner.shared.lock().await.state.clone()
    }

    pub async fn start(&self, route: RouteDescriptor) -> Result<(), NavigationError> {
        let inner = &self.inner;
        let epoch = {
            let mut shared = inner.shared.lock().await;
            if shared.watch.is_some() || shared.state.current_session.is_some() {
                info!(
                    target: "navigation_engine",
                    route_id = %route.route_id,
                    "tearing down previous session before start"
                );
            }
            inner.teardown(&mut shared, NavigationPhase::Stopped);
            shared.epoch
        };

        let current = match inner
            .location
            .current_location(&inner.config.current_location)
            .await
        {
            Ok(sample) => sample,
            Err(err) => return Err(inner.fail_start(epoch, &route.route_id, err.into()).await),
        };

        if route.coordinates.len() < 2 {
            let err = NavigationError::InvalidRoute {
                route_id: route.route_id.clone(),
                count: route.coordinates.len(),
            };
            return Err(inner.fail_start(epoch, &route.route_id, err).await);
        }

        let request = RouteRequest {
            origin: route.coordinates[0],
            destination: route.coordinates[route.coordinates.len() - 1],
            mode: inner.config.travel_mode,
            preferences: inner.config.preferences.clone(),
        };

        let steps = match inner.routing.compute_route(&request).await {
            Ok(result) => result.flatten_steps(),
            Err(err) => return Err(inner.fail_start(epoch, &route.route_id, err.into()).await),
        };

        let mut shared = inner.shared.lock().await;
        if shared.epoch != epoch {
            info!(
                target: "navigation_engine",
                route_id = %route.route_id,
                "discarding start result superseded by stop"
            );
            return Err(NavigationError::Cancelled);
        }

        shared.state.last_known_location = Some(current);

        if steps.is_empty() {
            info!(
                target: "navigation_engine",
                route_id = %route.route_id,
                "routing returned no steps, route already complete"
            );
            inner.emit_lifecycle(NavigationLifecycleUpdate::new(
                Some(route.route_id.clone()),
                NavigationPhase::Completed,
            ));
            record_navigation_finished(&route.route_id, NavigationPhase::Completed.as_str());
            return Ok(());
        }

        let watch = match inner.location.watch(&inner.config.watch) {
            Ok(watch) => watch,
            Err(err) => {
                drop(shared);
                return Err(inner.fail_start(epoch, &route.route_id, err.into()).await);
            }
        };

        let session =
            NavigationSession::from_route(route.route_id, steps, inner.config.travel_mode);
        let pump = runtime::spawn_sample_pump(Arc::downgrade(inner), epoch, watch.events);
        shared.watch = Some(ActiveWatch { id: watch.id, pump });

        if shared.state.voice_enabled {
            if let Some(step) = session.current_step() {
                inner.announcer.announce(&step.instruction_text);
            }
        }

        record_navigation_started(
            session.route_id(),
            session.mode().as_str(),
            session.steps().len(),
            session.remaining_distance(),
            session.estimated_time(),
        );
        inner.emit_lifecycle(NavigationLifecycleUpdate::started(
            session.route_id(),
            session.steps().len(),
            session.remaining_distance(),
            session.estimated_time(),
        ));

        shared.state.current_session = Some(session);
        shared.state.is_navigating = true;
        shared.state.is_emergency = false;
        Ok(())
    }

    /// 手动注入一个定位读数，效果与定位流投递相同。
    pub async fn update_location(&self, sample: LocationSample) {
        self.inner.handle_sample(None, sample).await;
    }

    pub async fn next_step(&self) {
        let mut shared = self.inner.shared.lock().await;
        self.inner.advance(&mut shared);
    }

    /// 进入紧急状态。后端失败时降级为固定载荷，从不向调用方报错。
    pub async fn trigger_emergency(&self) -> EmergencyOutcome {
        let inner = &self.inner;
        let (epoch, backend_route) = {
            let shared = inner.shared.lock().await;
            let route_id = shared
                .state
                .current_session
                .as_ref()
                .filter(|session| session.origin() == SessionOrigin::Route)
                .map(|session| session.route_id().to_string());
            (shared.epoch, route_id)
        };

        let response = match &backend_route {
            Some(route_id) => Some(inner.backend.trigger_emergency_route(route_id).await),
            None => None,
        };

        let mut shared = inner.shared.lock().await;
        if shared.epoch != epoch {
            warn!(
                target: "navigation_engine",
                route_id = backend_route.as_deref().unwrap_or_default(),
                "discarding emergency result for a session that is no longer active"
            );
            return EmergencyOutcome::Discarded;
        }

        let outcome = inner.apply_emergency(&mut shared, response);
        shared.state.is_navigating = true;
        shared.state.is_emergency = true;
        outcome
    }

    pub async fn stop(&self) {
        let mut shared = self.inner.shared.lock().await;
        self.inner.teardown(&mut shared, NavigationPhase::Stopped);
    }

    /// 切换语音播报，返回切换后的值。
    pub async fn toggle_voice(&self) -> bool {
        let mut shared = self.inner.shared.lock().await;
        shared.state.voice_enabled = !shared.state.voice_enabled;
        let enabled = shared.state.voice_enabled;

        if enabled {
            if let Some(step) = shared
                .state
                .current_session
                .as_ref()
                .and_then(NavigationSession::current_step)
            {
                self.inner.announcer.announce(&step.instruction_text);
            }
        }

        debug!(target: "navigation_engine", enabled, "voice guidance toggled");
        enabled
    }

    pub async fn clear_error(&self) {
        self.inner.shared.lock().await.state.last_error = None;
    }
}

impl EngineInner {
    pub(crate) async fn handle_sample(&self, epoch: Option<u64>, sample: LocationSample) {
        let mut shared = self.shared.lock().await;
        if let Some(epoch) = epoch {
            if epoch != shared.epoch {
                debug!(
                    target: "navigation_engine",
                    epoch,
                    "dropping sample from superseded watch"
                );
                return;
            }
        }

        shared.state.last_known_location = Some(sample);
        if !shared.state.is_navigating {
            return;
        }

        let is_emergency = shared.state.is_emergency;
        let threshold = self.config.advance_threshold_meters;
        let Some(session) = shared.state.current_session.as_mut() else {
            return;
        };

        if session.origin() == SessionOrigin::EmergencyFallback {
            return;
        }

        if !is_emergency {
            session.refresh_progress();
        }

        runtime::spawn_status_push(
            Arc::clone(&self.backend),
            NavigationStatus {
                route_id: session.route_id().to_string(),
                current_location: sample,
                timestamp: unix_millis(),
            },
        );

        let should_advance = session
            .current_step()
            .map(|step| step.distance_meters < threshold)
            .unwrap_or(false);

        if should_advance {
            self.advance(&mut shared);
        }
    }

    pub(crate) async fn record_watch_error(&self, epoch: u64, err: LocationError) {
        let mut shared = self.shared.lock().await;
        if epoch != shared.epoch {
            return;
        }

        warn!(
            target: "navigation_engine",
            %err,
            code = err.as_str(),
            "location watch reported an error"
        );
        shared.state.last_error = Some(ErrorKind::LocationUnavailable);
    }

    fn advance(&self, shared: &mut EngineShared) {
        let voice_enabled = shared.state.voice_enabled;
        let is_emergency = shared.state.is_emergency;
        let Some(session) = shared.state.current_session.as_mut() else {
            return;
        };

        if !session.advance(!is_emergency) {
            info!(
                target: "navigation_engine",
                route_id = session.route_id(),
                "final step reached, navigation complete"
            );
            self.teardown(shared, NavigationPhase::Completed);
            return;
        }

        let index = session.current_step_index();
        let instruction = session
            .current_step()
            .map(|step| step.instruction_text.clone())
            .unwrap_or_default();

        if voice_enabled {
            self.announcer.announce(&instruction);
        }

        record_step_advanced(session.route_id(), index, session.steps().len());
        self.emit_lifecycle(NavigationLifecycleUpdate::step_advanced(
            session.route_id(),
            index,
            instruction,
        ));
    }

    fn apply_emergency(
        &self,
        shared: &mut EngineShared,
        response: Option<Result<EmergencyUpdate, BackendError>>,
    ) -> EmergencyOutcome {
        let fallback = &self.config.emergency;
        let (source, reason) = match shared.state.current_session.as_mut() {
            Some(session) => match response {
                Some(Ok(update)) => {
                    session.apply_emergency(update);
                    (EmergencySource::Backend, None)
                }
                Some(Err(err)) => {
                    warn!(
                        target: "navigation_engine",
                        route_id = session.route_id(),
                        %err,
                        "emergency route unavailable, applying fallback guidance"
                    );
                    session.apply_fallback(fallback);
                    (EmergencySource::Fallback, Some(err.to_string()))
                }
                None => {
                    session.apply_fallback(fallback);
                    (EmergencySource::Fallback, None)
                }
            },
            None => {
                // 合成会话取代任何仍在等待路线的 start。
                shared.epoch = shared.epoch.wrapping_add(1);
                shared.state.current_session = Some(NavigationSession::emergency_fallback(
                    fallback,
                    self.config.travel_mode,
                ));
                (EmergencySource::Fallback, Some("no active session".to_string()))
            }
        };

        let Some(session) = shared.state.current_session.as_ref() else {
            return EmergencyOutcome::Fallback;
        };

        if shared.state.voice_enabled {
            self.announcer.announce(session.next_direction());
        }

        record_emergency(session.route_id(), source.as_str(), reason);
        self.emit_lifecycle(NavigationLifecycleUpdate::emergency(
            session.route_id(),
            source,
            session.next_direction(),
        ));

        match source {
            EmergencySource::Backend => EmergencyOutcome::Rerouted,
            EmergencySource::Fallback => EmergencyOutcome::Fallback,
        }
    }

    /// 释放定位订阅并回到空闲状态；可重复调用。
    fn teardown(&self, shared: &mut EngineShared, phase: NavigationPhase) {
        if let Some(watch) = shared.watch.take() {
            self.location.clear_watch(watch.id);
            watch.pump.abort();
        }

        let route_id = shared
            .state
            .current_session
            .as_ref()
            .map(|session| session.route_id().to_string());
        let was_active = route_id.is_some() || shared.state.is_navigating;

        shared.state.reset();
        shared.epoch = shared.epoch.wrapping_add(1);

        if was_active {
            if let Some(route_id) = &route_id {
                record_navigation_finished(route_id, phase.as_str());
            }
            self.emit_lifecycle(NavigationLifecycleUpdate::new(route_id, phase));
        }
    }

    async fn fail_start(
        &self,
        epoch: u64,
        route_id: &str,
        err: NavigationError,
    ) -> NavigationError {
        let mut shared = self.shared.lock().await;
        if shared.epoch != epoch {
            debug!(
                target: "navigation_engine",
                route_id,
                %err,
                "start failed after being superseded"
            );
            return NavigationError::Cancelled;
        }

        shared.state.last_error = Some(err.kind());
        record_navigation_start_failed(route_id, err.kind().as_str(), err.to_string());
        self.emit_lifecycle(NavigationLifecycleUpdate::failed(
            route_id,
            err.kind(),
            err.to_string(),
        ));
        err
    }

    fn emit_lifecycle(&self, update: NavigationLifecycleUpdate) {
        if self.lifecycle_tx.receiver_count() == 0 {
            return;
        }

        if let Err(err) = self.lifecycle_tx.send(update) {
            warn!(
                target: "navigation_engine",
                %err,
                "failed to broadcast lifecycle update"
            );
        }
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(watch) = self.shared.get_mut().watch.take() {
            self.location.clear_watch(watch.id);
            watch.pump.abort();
        }
    }
}
