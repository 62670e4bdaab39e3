//! 度规张量 g_μν
//!
//! 签名约定 (-,+,+,+): 分量 0 为类时 (市场时间)，1..3 为类空 (价格/成交量/动量)。
//! 空间块承载资产协方差结构。
//!
//! 两种表示:
//! - `Field`: 闭包形式，随位置变化 (也用于参数固定的解析度规)
//! - `Constant`: 原始 4x4 矩阵，与位置无关
//!
//! 调用方只通过 `evaluate` 取值，不区分底层表示。

use core::fmt;
use std::sync::Arc;

use nalgebra::{Matrix3, SymmetricEigen};

use crate::error::{GeometryError, Result};
use crate::types::{MetricMatrix, Point, TangentVector, DIM};

/// 特征值零判定容差
pub const METRIC_SINGULARITY_EPSILON: f64 = 1e-14;

/// 类光判定带宽
pub const FLOAT_EPSILON: f64 = 1e-12;

/// 位置相关的度规函数
pub type MetricFn = dyn Fn(&Point) -> MetricMatrix + Send + Sync;

#[derive(Clone)]
pub enum Metric {
    Field(Arc<MetricFn>),
    Constant(MetricMatrix),
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Field(_) => write!(f, "Metric::Field(<fn>)"),
            Metric::Constant(g) => f.debug_tuple("Metric::Constant").field(g).finish(),
        }
    }
}

/// 间隔的因果类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalKind {
    /// ds² < 0
    Timelike,
    /// |ds²| <= FLOAT_EPSILON
    Lightlike,
    /// ds² > 0
    Spacelike,
}

impl IntervalKind {
    pub fn classify(interval: f64) -> Self {
        if interval.abs() <= FLOAT_EPSILON {
            IntervalKind::Lightlike
        } else if interval < 0.0 {
            IntervalKind::Timelike
        } else {
            IntervalKind::Spacelike
        }
    }

    /// 类时与类光都视为因果相连
    pub fn is_causal(&self) -> bool {
        matches!(self, IntervalKind::Timelike | IntervalKind::Lightlike)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalKind::Timelike => "timelike",
            IntervalKind::Lightlike => "lightlike",
            IntervalKind::Spacelike => "spacelike",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Metric {
    /// 任意位置相关度规
    ///
    /// 闭包捕获的数据在度规生命周期内必须视为不可变，积分时可能被多线程并发调用。
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Point) -> MetricMatrix + Send + Sync + 'static,
    {
        Metric::Field(Arc::new(f))
    }

    /// 与位置无关的原始矩阵
    pub fn constant(g: MetricMatrix) -> Self {
        Metric::Constant(g)
    }

    /// 平直度规 diag(-t², s², s², s²)
    pub fn minkowski(time_scale: f64, spatial_scale: f64) -> Self {
        Self::diagonal(time_scale, [spatial_scale; 3])
    }

    /// 对角度规 diag(-t², σ1², σ2², σ3²)
    pub fn diagonal(time_scale: f64, vol: [f64; 3]) -> Self {
        let mut g = MetricMatrix::zeros();
        g[(0, 0)] = -(time_scale * time_scale);
        for (i, v) in vol.iter().enumerate() {
            g[(i + 1, i + 1)] = v * v;
        }
        Self::from_fn(move |_| g)
    }

    /// 协方差度规: block-diag(-t², Σ)
    pub fn from_covariance(time_scale: f64, cov: Matrix3<f64>) -> Self {
        let mut g = MetricMatrix::zeros();
        g[(0, 0)] = -(time_scale * time_scale);
        g.fixed_view_mut::<3, 3>(1, 1).copy_from(&cov);
        Self::from_fn(move |_| g)
    }

    /// 在 x 处求值
    #[inline]
    pub fn evaluate(&self, x: &Point) -> MetricMatrix {
        match self {
            Metric::Field(f) => f(x),
            Metric::Constant(g) => *g,
        }
    }

    /// 是否为 `Constant` 表示
    ///
    /// 只反映存储形式; `minkowski` 等工厂返回的 `Field` 同样与位置无关，但这里为 false。
    pub fn is_constant(&self) -> bool {
        matches!(self, Metric::Constant(_))
    }

    /// 逆度规 g^μν
    ///
    /// 全主元 LU 分解; 主元相对最大主元低于 `DIM * ε` 视为奇异。
    pub fn invert(&self, x: &Point) -> Result<MetricMatrix> {
        let g = self.evaluate(x);
        if g.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::SingularMetric);
        }

        let lu = g.full_piv_lu();
        if !lu.is_invertible() {
            return Err(GeometryError::SingularMetric);
        }

        let u = lu.u();
        let max_pivot = (0..DIM).map(|i| u[(i, i)].abs()).fold(0.0_f64, f64::max);
        if max_pivot == 0.0 {
            return Err(GeometryError::SingularMetric);
        }
        let threshold = f64::EPSILON * DIM as f64 * max_pivot;
        if (0..DIM).any(|i| u[(i, i)].abs() <= threshold) {
            return Err(GeometryError::SingularMetric);
        }

        let inv = lu.try_inverse().ok_or(GeometryError::SingularMetric)?;
        if inv.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::SingularMetric);
        }
        Ok(inv)
    }

    /// 恰好一个负特征值、三个正特征值
    pub fn is_lorentzian(&self, x: &Point) -> bool {
        let g = self.evaluate(x);
        if g.iter().any(|v| !v.is_finite()) {
            return false;
        }

        let eigen = SymmetricEigen::new(g);
        let mut neg = 0;
        let mut pos = 0;
        for ev in eigen.eigenvalues.iter() {
            if *ev < -METRIC_SINGULARITY_EPSILON {
                neg += 1;
            } else if *ev > METRIC_SINGULARITY_EPSILON {
                pos += 1;
            }
        }
        neg == 1 && pos == 3
    }

    /// 签名快速检查: 有限, g00 < 0, 空间对角 > 0
    ///
    /// 仅作诊断，不是任何计算的前置条件。
    pub fn is_valid(&self, x: &Point) -> bool {
        let g = self.evaluate(x);
        if g.iter().any(|v| !v.is_finite()) {
            return false;
        }
        g[(0, 0)] < 0.0 && (1..DIM).all(|i| g[(i, i)] > 0.0)
    }

    /// ds² = vᵀ g(x) v
    pub fn interval(&self, x: &Point, v: &TangentVector) -> f64 {
        let g = self.evaluate(x);
        v.dot(&(g * v))
    }

    pub fn classify(&self, x: &Point, v: &TangentVector) -> IntervalKind {
        IntervalKind::classify(self.interval(x, v))
    }
}
