//! 错误类型

use thiserror::Error;

/// 积分失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// 初始状态含 NaN/Inf
    NonFiniteInitialState,
    /// 积分过程中出现 NaN/Inf
    NonFiniteState,
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("metric is singular at the evaluation point")]
    SingularMetric,

    #[error("geodesic integration failed at step {step}: {reason:?}")]
    IntegrationFailed { step: usize, reason: FailureReason },

    #[error("invalid observation sequence: {0}")]
    InvalidObservationSequence(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeometryError>;
