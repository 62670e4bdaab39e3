//! Levi-Civita 联络 (Christoffel 符号)
//!
//! Γ^λ_μν = ½ g^λσ (∂_μ g_νσ + ∂_ν g_μσ − ∂_σ g_μν)
//!
//! 偏导数用中心差分: ∂_σ g ≈ (g(x + h·e_σ) − g(x − h·e_σ)) / 2h
//!
//! 所有度规走同一条数值路径，平直度规不做特殊处理。

use tracing::trace;

use crate::config::DEFAULT_FD_STEP;
use crate::metric::Metric;
use crate::types::{MetricMatrix, Point, TangentVector, DIM};

/// Γ[λ] 为 4x4 矩阵，`get(λ, μ, ν)` = Γ^λ_μν
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionArray {
    coefficients: [MetricMatrix; DIM],
}

impl Default for ConnectionArray {
    fn default() -> Self {
        Self::zeros()
    }
}

impl ConnectionArray {
    pub fn zeros() -> Self {
        Self {
            coefficients: [MetricMatrix::zeros(); DIM],
        }
    }

    #[inline]
    pub fn get(&self, lambda: usize, mu: usize, nu: usize) -> f64 {
        self.coefficients[lambda][(mu, nu)]
    }

    pub fn coefficients(&self) -> &[MetricMatrix; DIM] {
        &self.coefficients
    }

    pub fn max_abs(&self) -> f64 {
        self.coefficients
            .iter()
            .flat_map(|m| m.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    pub fn is_zero(&self, tol: f64) -> bool {
        self.max_abs() < tol
    }

    /// result^λ = Σ_{μ,ν} Γ^λ_μν u^μ u^ν
    ///
    /// 测地线方程右端 (取负前)。
    pub fn contract(&self, u: &TangentVector) -> TangentVector {
        let mut out = TangentVector::zeros();
        for lambda in 0..DIM {
            // uᵀ Γ[λ] u
            out[lambda] = u.dot(&(self.coefficients[lambda] * u));
        }
        out
    }
}

/// 在给定度规上计算联络
///
/// 奇异点返回全零联络 (局部视为平直)，不向上传播错误。
#[derive(Debug, Clone)]
pub struct ConnectionCalculator {
    metric: Metric,
    h: f64,
}

impl ConnectionCalculator {
    /// - metric: 度规
    /// - h: 差分步长; 非有限或非正时退回默认值
    pub fn new(metric: Metric, h: f64) -> Self {
        let h = if h.is_finite() && h > 0.0 { h } else { DEFAULT_FD_STEP };
        Self { metric, h }
    }

    pub fn with_default_step(metric: Metric) -> Self {
        Self::new(metric, DEFAULT_FD_STEP)
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    pub fn step(&self) -> f64 {
        self.h
    }

    /// ∂g_μν/∂x^σ, O(h²) 中心差分
    pub fn metric_derivative(&self, x: &Point, sigma: usize) -> MetricMatrix {
        let mut xp = *x;
        let mut xm = *x;
        xp[sigma] += self.h;
        xm[sigma] -= self.h;
        (self.metric.evaluate(&xp) - self.metric.evaluate(&xm)) / (2.0 * self.h)
    }

    /// 计算 x 处全部 64 个 Γ^λ_μν
    pub fn compute(&self, x: &Point) -> ConnectionArray {
        let g_inv = match self.metric.invert(x) {
            Ok(inv) => inv,
            Err(_) => {
                trace!(?x, "singular metric, using zero connection");
                return ConnectionArray::zeros();
            }
        };

        // dg[σ](μ, ν) = ∂_σ g_μν
        let dg: [MetricMatrix; DIM] = std::array::from_fn(|sigma| self.metric_derivative(x, sigma));

        let mut out = ConnectionArray::zeros();
        for lambda in 0..DIM {
            for mu in 0..DIM {
                for nu in 0..DIM {
                    let mut sum = 0.0;
                    for sigma in 0..DIM {
                        let bracket = dg[mu][(nu, sigma)] + dg[nu][(mu, sigma)] - dg[sigma][(mu, nu)];
                        sum += g_inv[(lambda, sigma)] * bracket;
                    }
                    out.coefficients[lambda][(mu, nu)] = 0.5 * sum;
                }
            }
        }
        out
    }

    /// 测地线加速度 a^λ = −Γ^λ_μν u^μ u^ν
    #[inline]
    pub fn acceleration(&self, x: &Point, u: &TangentVector) -> TangentVector {
        -self.compute(x).contract(u)
    }
}
