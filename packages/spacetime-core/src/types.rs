//! 基础值类型
//!
//! 坐标布局: [0] 时间, [1] 价格, [2] 成交量, [3] 动量

use nalgebra::{Matrix4, Vector4};

/// 流形维度 (1 时间 + 3 空间)
pub const DIM: usize = 4;

/// 流形上的点
pub type Point = Vector4<f64>;

/// 切向量 dx/dτ
pub type TangentVector = Vector4<f64>;

/// 度规矩阵 g_μν
pub type MetricMatrix = Matrix4<f64>;

#[inline]
pub(crate) fn all_finite(v: &Vector4<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// 单条市场观测
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Observation {
    pub time: f64,
    pub price: f64,
    pub volume: f64,
    pub momentum: f64,
}

impl Observation {
    pub fn new(time: f64, price: f64, volume: f64, momentum: f64) -> Self {
        Self {
            time,
            price,
            volume,
            momentum,
        }
    }

    /// 嵌入为流形上的点
    #[inline]
    pub fn to_point(&self) -> Point {
        Point::new(self.time, self.price, self.volume, self.momentum)
    }

    pub fn is_finite(&self) -> bool {
        all_finite(&self.to_point())
    }
}

impl From<Observation> for Point {
    fn from(obs: Observation) -> Self {
        obs.to_point()
    }
}

/// 相空间状态 (位置, 速度)
///
/// RK4 每一步都产生新的状态，不原地修改。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseState {
    pub position: Point,
    pub velocity: TangentVector,
}

impl PhaseState {
    pub fn new(position: Point, velocity: TangentVector) -> Self {
        Self { position, velocity }
    }

    /// 位置与速度全部为有限值
    pub fn is_finite(&self) -> bool {
        all_finite(&self.position) && all_finite(&self.velocity)
    }

    /// self + s * other
    #[inline]
    pub(crate) fn offset(&self, s: f64, other: &PhaseState) -> PhaseState {
        PhaseState {
            position: self.position + other.position * s,
            velocity: self.velocity + other.velocity * s,
        }
    }
}

/// 每条观测对应的测地线偏离
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationSample {
    /// ||actual[1..4] - predicted[1..4]||₂, 无效时为 0
    pub deviation: f64,
    /// 固有时 τ = i * step
    pub proper_time: f64,
    pub valid: bool,
}

impl DeviationSample {
    pub fn valid(deviation: f64, proper_time: f64) -> Self {
        Self {
            deviation,
            proper_time,
            valid: true,
        }
    }

    pub fn invalid(proper_time: f64) -> Self {
        Self {
            deviation: 0.0,
            proper_time,
            valid: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_to_point_layout() {
        let obs = Observation::new(1.0, 100.0, 1000.0, 0.5);
        let p = obs.to_point();
        assert_eq!(p[0], 1.0);
        assert_eq!(p[1], 100.0);
        assert_eq!(p[2], 1000.0);
        assert_eq!(p[3], 0.5);
        assert!(obs.is_finite());
    }

    #[test]
    fn test_phase_state_offset() {
        let a = PhaseState::new(Point::repeat(1.0), TangentVector::repeat(1.0));
        let b = PhaseState::new(Point::repeat(2.0), TangentVector::repeat(3.0));
        let c = a.offset(0.5, &b);
        assert_eq!(c.position, Point::repeat(2.0));
        assert_eq!(c.velocity, TangentVector::repeat(2.5));
    }

    #[test]
    fn test_phase_state_non_finite() {
        let mut s = PhaseState::new(Point::zeros(), TangentVector::zeros());
        assert!(s.is_finite());
        s.velocity[2] = f64::INFINITY;
        assert!(!s.is_finite());
    }
}
