//! spacetime-core: 金融时空流形上的测地线计算库
//!
//! 把 (time, price, volume, momentum) 观测视为 4 维时空中的点:
//! - `metric`: 度规场 g(x) 及其求逆、符号检查
//! - `connection`: 有限差分 Christoffel 符号
//! - `geodesic`: RK4 测地线积分
//! - `signal`: 测地线偏离信号
//!
//! 支持 FFI 调用 (C ABI)

pub mod config;
pub mod connection;
pub mod error;
pub mod ffi;
pub mod geodesic;
pub mod metric;
pub mod signal;
pub mod types;

pub use config::GeometryConfig;
pub use connection::{ConnectionArray, ConnectionCalculator};
pub use error::{FailureReason, GeometryError, Result};
pub use geodesic::GeodesicIntegrator;
pub use metric::{IntervalKind, Metric};
pub use signal::DeviationSignalBuilder;
pub use types::{DeviationSample, MetricMatrix, Observation, PhaseState, Point, TangentVector, DIM};
