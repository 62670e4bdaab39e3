//! 数值参数配置
//!
//! 构造时传入，之后只读。

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};

/// 有限差分默认步长 h
pub const DEFAULT_FD_STEP: f64 = 1e-5;

/// 测地线积分默认固有时步长 dτ
pub const DEFAULT_PROPER_TIME_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// 度规偏导数的中心差分步长
    pub fd_step: f64,
    /// RK4 固有时步长
    pub proper_time_step: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            fd_step: DEFAULT_FD_STEP,
            proper_time_step: DEFAULT_PROPER_TIME_STEP,
        }
    }
}

impl GeometryConfig {
    pub fn new(fd_step: f64, proper_time_step: f64) -> Self {
        Self {
            fd_step,
            proper_time_step,
        }
    }

    /// 从 JSON 解析并校验
    ///
    /// 缺省字段使用默认值: `{"proper_time_step": 0.001}`
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: GeometryConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fd_step.is_finite() || self.fd_step <= 0.0 {
            return Err(GeometryError::InvalidConfig(format!(
                "fd_step must be finite and > 0, got {}",
                self.fd_step
            )));
        }
        if !self.proper_time_step.is_finite() || self.proper_time_step <= 0.0 {
            return Err(GeometryError::InvalidConfig(format!(
                "proper_time_step must be finite and > 0, got {}",
                self.proper_time_step
            )));
        }
        Ok(())
    }
}
