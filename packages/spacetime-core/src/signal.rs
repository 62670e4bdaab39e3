//! 测地线偏离信号
//!
//! 从前两条观测估计初始切向量，沿测地线自由下落积分 (n − 1) 步，
//! 逐条比较实际观测与预测位置的空间距离:
//!
//!   deviation_i = ||actual_i[1..4] − predicted_i[1..4]||₂
//!
//! 时间分量不参与偏离计算。
//!
//! 约定:
//! - 空输入 → 空输出; 单条 → {0, 0, valid}
//! - 前两条含非有限值 → 每条输出无效样本
//! - 积分失败 → 每条输出无效样本，不返回部分序列

use tracing::{debug, warn};

use crate::config::{GeometryConfig, DEFAULT_FD_STEP};
use crate::error::{GeometryError, Result};
use crate::geodesic::{clamp_step_size, GeodesicIntegrator};
use crate::metric::Metric;
use crate::types::{all_finite, DeviationSample, Observation, PhaseState, Point, TangentVector};

/// 位移长度低于该值视为退化
const DEGENERATE_DISPLACEMENT: f64 = f64::EPSILON * 100.0;

#[derive(Debug, Clone)]
pub struct DeviationSignalBuilder {
    metric: Metric,
    integrator: GeodesicIntegrator,
    step: f64,
}

impl DeviationSignalBuilder {
    /// - metric: 背景度规
    /// - step_size: 固有时步长 (按积分器规则钳制)
    pub fn new(metric: Metric, step_size: f64) -> Self {
        Self::with_config(metric, &GeometryConfig::new(DEFAULT_FD_STEP, step_size))
    }

    pub fn with_config(metric: Metric, cfg: &GeometryConfig) -> Self {
        Self {
            metric,
            integrator: GeodesicIntegrator::with_config(cfg),
            step: clamp_step_size(cfg.proper_time_step),
        }
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// 实际使用的固有时步长
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn compute(&self, observations: &[Observation]) -> Vec<DeviationSample> {
        let points: Vec<Point> = observations.iter().map(Observation::to_point).collect();
        self.compute_points(&points)
    }

    pub fn compute_points(&self, points: &[Point]) -> Vec<DeviationSample> {
        let n = points.len();
        match n {
            0 => return Vec::new(),
            1 => return vec![DeviationSample::valid(0.0, 0.0)],
            _ => {}
        }

        let trajectory = match self.predict(points) {
            Ok(t) => t,
            Err(e) => {
                warn!(n, error = %e, "deviation signal abandoned");
                return (0..n).map(|i| DeviationSample::invalid(self.proper_time(i))).collect();
            }
        };

        points
            .iter()
            .enumerate()
            .map(|(i, actual)| {
                let tau = self.proper_time(i);
                // 超出钳制后轨迹长度的样本无预测点
                let Some(predicted) = trajectory.get(i) else {
                    return DeviationSample::invalid(tau);
                };
                if !all_finite(actual) || !all_finite(&predicted.position) {
                    return DeviationSample::invalid(tau);
                }
                let d = spatial_deviation(actual, &predicted.position);
                if d.is_finite() {
                    DeviationSample::valid(d, tau)
                } else {
                    DeviationSample::invalid(tau)
                }
            })
            .collect()
    }

    #[inline]
    fn proper_time(&self, i: usize) -> f64 {
        i as f64 * self.step
    }

    /// 从 points[0] 出发的测地线轨迹 (len = n 或钳制后的长度)
    fn predict(&self, points: &[Point]) -> Result<Vec<PhaseState>> {
        let (p0, p1) = (&points[0], &points[1]);
        if !all_finite(p0) || !all_finite(p1) {
            return Err(GeometryError::InvalidObservationSequence(
                "first two observations must be finite".to_string(),
            ));
        }

        let u0 = estimate_velocity(p0, p1);
        self.integrator
            .trajectory(PhaseState::new(*p0, u0), &self.metric, points.len() - 1, self.step)
    }
}

/// 由前两点位移估计单位切向量; 退化时退回时间轴方向 e₀
pub fn estimate_velocity(p0: &Point, p1: &Point) -> TangentVector {
    let u = p1 - p0;
    let norm = u.norm();
    if !norm.is_finite() || norm < DEGENERATE_DISPLACEMENT {
        debug!(norm, "degenerate displacement, using time axis");
        return TangentVector::new(1.0, 0.0, 0.0, 0.0);
    }
    u / norm
}

/// 空间分量 [1..4] 的欧氏距离
pub fn spatial_deviation(actual: &Point, predicted: &Point) -> f64 {
    (actual.fixed_rows::<3>(1) - predicted.fixed_rows::<3>(1)).norm()
}
