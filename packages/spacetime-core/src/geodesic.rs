//! 测地线积分 (经典四阶 Runge-Kutta)
//!
//! 一阶化的测地线方程:
//!   dx^λ/dτ = u^λ
//!   du^λ/dτ = −Γ^λ_μν u^μ u^ν
//!
//! 每个 RK4 阶段都在阶段位置重新计算联络。积分器不跨调用保存状态。
//!
//! 安全约束:
//! - 步数钳制在 [1, 100000]，步长钳制在 [1e-8, 1.0]
//! - 初始或中间状态出现 NaN/Inf 时整次调用失败，不返回部分结果

use tracing::debug;

use crate::config::{GeometryConfig, DEFAULT_FD_STEP};
use crate::connection::ConnectionCalculator;
use crate::error::{FailureReason, GeometryError, Result};
use crate::metric::Metric;
use crate::types::{PhaseState, Point, TangentVector};

pub const MIN_STEPS: usize = 1;
pub const MAX_STEPS: usize = 100_000;
pub const MIN_STEP_SIZE: f64 = 1e-8;
pub const MAX_STEP_SIZE: f64 = 1.0;

#[inline]
pub fn clamp_steps(steps: usize) -> usize {
    steps.clamp(MIN_STEPS, MAX_STEPS)
}

/// NaN 视为最小步长
#[inline]
pub fn clamp_step_size(dt: f64) -> f64 {
    if dt.is_nan() {
        MIN_STEP_SIZE
    } else {
        dt.clamp(MIN_STEP_SIZE, MAX_STEP_SIZE)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeodesicIntegrator {
    fd_step: f64,
}

impl Default for GeodesicIntegrator {
    fn default() -> Self {
        Self::new(DEFAULT_FD_STEP)
    }
}

impl GeodesicIntegrator {
    /// - fd_step: 联络计算的差分步长
    pub fn new(fd_step: f64) -> Self {
        Self { fd_step }
    }

    pub fn with_config(cfg: &GeometryConfig) -> Self {
        Self::new(cfg.fd_step)
    }

    pub fn fd_step(&self) -> f64 {
        self.fd_step
    }

    /// 积分 `steps` 步，返回终态
    pub fn solve(&self, initial: PhaseState, metric: &Metric, steps: usize, step_size: f64) -> Result<PhaseState> {
        let mut last = initial;
        self.run(initial, metric, steps, step_size, |s| last = *s)?;
        Ok(last)
    }

    /// 积分并返回完整轨迹 (长度 = 钳制后步数 + 1，含初态)
    pub fn trajectory(
        &self,
        initial: PhaseState,
        metric: &Metric,
        steps: usize,
        step_size: f64,
    ) -> Result<Vec<PhaseState>> {
        let mut out = Vec::with_capacity(clamp_steps(steps) + 1);
        out.push(initial);
        self.run(initial, metric, steps, step_size, |s| out.push(*s))?;
        Ok(out)
    }

    /// g_μν u^μ u^ν: 负为类时，零为类光，正为类空
    pub fn norm_squared(&self, metric: &Metric, x: &Point, u: &TangentVector) -> f64 {
        metric.interval(x, u)
    }

    fn run<F>(&self, initial: PhaseState, metric: &Metric, steps: usize, step_size: f64, mut on_step: F) -> Result<()>
    where
        F: FnMut(&PhaseState),
    {
        if !initial.is_finite() {
            debug!("geodesic: non-finite initial state");
            return Err(GeometryError::IntegrationFailed {
                step: 0,
                reason: FailureReason::NonFiniteInitialState,
            });
        }

        let n = clamp_steps(steps);
        let h = clamp_step_size(step_size);
        if n != steps || h != step_size {
            debug!(steps, n, step_size, h, "geodesic: clamped integration parameters");
        }

        let cs = ConnectionCalculator::new(metric.clone(), self.fd_step);
        let mut state = initial;
        for step in 1..=n {
            state = rk4_step(&cs, &state, h);
            if !state.is_finite() {
                debug!(step, "geodesic: non-finite state");
                return Err(GeometryError::IntegrationFailed {
                    step,
                    reason: FailureReason::NonFiniteState,
                });
            }
            on_step(&state);
        }
        Ok(())
    }
}

/// (x, u) -> (dx/dτ, du/dτ)
#[inline]
fn derivative(cs: &ConnectionCalculator, s: &PhaseState) -> PhaseState {
    PhaseState {
        position: s.velocity,
        velocity: cs.acceleration(&s.position, &s.velocity),
    }
}

fn rk4_step(cs: &ConnectionCalculator, s: &PhaseState, h: f64) -> PhaseState {
    let k1 = derivative(cs, s);
    let k2 = derivative(cs, &s.offset(0.5 * h, &k1));
    let k3 = derivative(cs, &s.offset(0.5 * h, &k2));
    let k4 = derivative(cs, &s.offset(h, &k3));

    let w = h / 6.0;
    PhaseState {
        position: s.position + (k1.position + k2.position * 2.0 + k3.position * 2.0 + k4.position) * w,
        velocity: s.velocity + (k1.velocity + k2.velocity * 2.0 + k3.velocity * 2.0 + k4.velocity) * w,
    }
}
