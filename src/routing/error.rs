use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("routing backend unreachable: {reason}")]
    Network { reason: String },
    #[error("routing backend returned status {code}: {message}")]
    Status { code: u16, message: String },
    #[error("routing request timed out")]
    Timeout,
    #[error("routing response could not be decoded: {reason}")]
    Decode { reason: String },
}

impl RoutingError {
    pub fn network<S: Into<String>>(reason: S) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    pub fn decode<S: Into<String>>(reason: S) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}

/// 导航后端（状态上报、紧急改道）的调用失败。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("navigation backend unreachable: {reason}")]
    Network { reason: String },
    #[error("navigation backend returned status {code}: {message}")]
    Status { code: u16, message: String },
    #[error("navigation backend request timed out")]
    Timeout,
    #[error("navigation backend response could not be decoded: {reason}")]
    Decode { reason: String },
}

impl BackendError {
    pub fn network<S: Into<String>>(reason: S) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }
}

impl From<RoutingError> for BackendError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::Network { reason } => BackendError::Network { reason },
            RoutingError::Status { code, message } => BackendError::Status { code, message },
            RoutingError::Timeout => BackendError::Timeout,
            RoutingError::Decode { reason } => BackendError::Decode { reason },
        }
    }
}
