//! 基于 ureq 的后端客户端。
//!
//! ureq 为阻塞 IO，请求统一放到 `spawn_blocking` 中执行。

use std::io;

use anyhow::Result as AnyhowResult;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::config::BackendConfig;
use super::error::{BackendError, RoutingError};
use super::types::{EmergencyUpdate, NavigationStatus, RouteRequest, RouteResult};
use super::{NavigationBackend, RoutingClient};

const CALCULATE_ROUTE_PATH: &str = "/calculateRoute";

#[derive(Clone)]
pub struct HttpBackend {
    config: BackendConfig,
    agent: ureq::Agent,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .build();
        Self { config, agent }
    }

    pub fn from_env() -> AnyhowResult<Self> {
        Ok(Self::new(BackendConfig::from_env()?))
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn execute(
        &self,
        method: &'static str,
        path: String,
        body: Option<String>,
    ) -> Result<String, RoutingError> {
        let agent = self.agent.clone();
        let url = self.config.endpoint(&path);
        debug!(target: "routing_client", method, %url, "sending backend request");

        let task = tokio::task::spawn_blocking(move || {
            let request = agent
                .request(method, &url)
                .set("Content-Type", "application/json")
                .set("Accept", "application/json");
            let response = match body {
                Some(body) => request.send_string(&body),
                None => request.call(),
            };

            match response {
                Ok(response) => response
                    .into_string()
                    .map_err(|err| RoutingError::decode(err.to_string())),
                Err(ureq::Error::Status(code, response)) => Err(RoutingError::Status {
                    code,
                    message: error_message(response),
                }),
                Err(ureq::Error::Transport(transport)) => Err(classify_transport(&transport)),
            }
        });

        match task.await {
            Ok(result) => result,
            Err(err) => Err(RoutingError::network(format!("request task failed: {err}"))),
        }
    }
}

#[async_trait]
impl RoutingClient for HttpBackend {
    async fn compute_route(&self, request: &RouteRequest) -> Result<RouteResult, RoutingError> {
        let body = json!({
            "origin": request.origin,
            "destination": request.destination,
            "mode": request.mode,
            "preferences": request.preferences,
            "alternatives": request.preferences.alternatives,
        });

        let raw = self
            .execute("POST", CALCULATE_ROUTE_PATH.to_string(), Some(body.to_string()))
            .await?;

        serde_json::from_str(&raw).map_err(|err| {
            warn!(target: "routing_client", %err, "failed to decode route result");
            RoutingError::decode(err.to_string())
        })
    }
}

#[async_trait]
impl NavigationBackend for HttpBackend {
    async fn update_navigation_status(
        &self,
        status: &NavigationStatus,
    ) -> Result<(), BackendError> {
        let body = serde_json::to_string(status)
            .map_err(|err| BackendError::Decode {
                reason: err.to_string(),
            })?;
        let path = format!("/navigation/{}/status", encode_path_segment(&status.route_id));
        self.execute("PUT", path, Some(body)).await?;
        Ok(())
    }

    async fn trigger_emergency_route(&self, route_id: &str) -> Result<EmergencyUpdate, BackendError> {
        let path = format!("/navigation/{}/emergency", encode_path_segment(route_id));
        let raw = self.execute("POST", path, None).await?;

        if raw.trim().is_empty() {
            return Ok(EmergencyUpdate::default());
        }

        serde_json::from_str(&raw).map_err(|err| BackendError::Decode {
            reason: err.to_string(),
        })
    }
}

fn error_message(response: ureq::Response) -> String {
    let status_text = response.status_text().to_string();
    response
        .into_string()
        .ok()
        .and_then(|body| serde_json::from_str::<Value>(&body).ok())
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(status_text)
}

fn classify_transport(transport: &ureq::Transport) -> RoutingError {
    let timed_out = std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map(|err| matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
        .unwrap_or(false);

    if timed_out {
        RoutingError::Timeout
    } else {
        RoutingError::network(transport.to_string())
    }
}

fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationSample;
    use crate::routing::{Coordinate, RoutePreferences, TravelMode};
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept connection");
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .expect("write response");
            request
        });
        (format!("http://{addr}"), handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let read = stream.read(&mut chunk).expect("read request");
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);

            let Some(header_end) = buffer.windows(4).position(|window| window == b"\r\n\r\n")
            else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buffer[..header_end]).to_ascii_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn backend(base_url: String) -> HttpBackend {
        HttpBackend::new(BackendConfig {
            base_url,
            request_timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn computes_route_from_backend_response() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"routes":[{"segments":[{"steps":[{"instructionText":"Head north","distanceMeters":100,"durationSeconds":60}]}]}]}"#,
        );
        let request = RouteRequest {
            origin: Coordinate::new(42.36, -71.06),
            destination: Coordinate::new(42.21, -71.11),
            mode: TravelMode::Foot,
            preferences: RoutePreferences::default(),
        };

        let result = backend(base_url)
            .compute_route(&request)
            .await
            .expect("route computed");
        let raw_request = server.join().expect("server thread");

        assert!(raw_request.starts_with("POST /calculateRoute"));
        assert!(raw_request.contains(r#""mode":"foot""#));
        let steps = result.flatten_steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].distance_meters, 100.0);
    }

    #[tokio::test]
    async fn maps_error_status_with_backend_message() {
        let (base_url, server) =
            serve_once("503 Service Unavailable", r#"{"message":"maintenance window"}"#);
        let err = backend(base_url)
            .trigger_emergency_route("route-1")
            .await
            .expect_err("503 must fail");
        server.join().expect("server thread");

        assert_eq!(
            err,
            BackendError::Status {
                code: 503,
                message: "maintenance window".into()
            }
        );
    }

    #[tokio::test]
    async fn pushes_status_to_encoded_route_path() {
        let (base_url, server) = serve_once("204 No Content", "");
        let status = NavigationStatus {
            route_id: "blue hills/1".into(),
            current_location: LocationSample::new(42.2, -71.1, 4.0),
            timestamp: 1_700_000_000_000,
        };

        backend(base_url)
            .update_navigation_status(&status)
            .await
            .expect("status accepted");
        let raw_request = server.join().expect("server thread");

        assert!(raw_request.starts_with("PUT /navigation/blue%20hills%2F1/status"));
        assert!(raw_request.contains(r#""routeId":"blue hills/1""#));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("address");
        drop(listener);

        let err = backend(format!("http://{addr}"))
            .trigger_emergency_route("route-1")
            .await
            .expect_err("closed port must fail");
        assert!(matches!(err, BackendError::Network { .. } | BackendError::Timeout));
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(encode_path_segment("trail-7_a.b~c"), "trail-7_a.b~c");
        assert_eq!(encode_path_segment("a b/c"), "a%20b%2Fc");
    }
}
