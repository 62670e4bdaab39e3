//! C FFI 接口
//!
//! 供 Go、Python 等语言通过 CGO/ctypes 调用
//!
//! 观测点以 `len * 4` 个连续 double 传入，顺序为
//! (time, price, volume, momentum)；`out` 需可写 `len` 个样本。
//! 所有函数返回写入的样本数，空指针、`len == 0` 或 `len * 4` 溢出时返回 0。

use std::os::raw::c_double;

use crate::metric::Metric;
use crate::signal::DeviationSignalBuilder;
use crate::types::{DeviationSample, Point, DIM};

/// C 接口的偏离样本
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StcDeviationSample {
    pub deviation: c_double,
    pub proper_time: c_double,
    /// 1 = 有效, 0 = 无效
    pub valid: u8,
}

impl From<&DeviationSample> for StcDeviationSample {
    fn from(s: &DeviationSample) -> Self {
        StcDeviationSample {
            deviation: s.deviation,
            proper_time: s.proper_time,
            valid: s.valid as u8,
        }
    }
}

/// `len * DIM` 个 double 超出可寻址范围时返回 None
unsafe fn read_points(points: *const c_double, len: usize) -> Option<Vec<Point>> {
    let n = len.checked_mul(DIM)?;
    if n > isize::MAX as usize / std::mem::size_of::<c_double>() {
        return None;
    }
    let raw = std::slice::from_raw_parts(points, n);
    Some(raw.chunks_exact(DIM).map(Point::from_column_slice).collect())
}

unsafe fn write_samples(samples: &[DeviationSample], out: *mut StcDeviationSample) -> usize {
    let out = std::slice::from_raw_parts_mut(out, samples.len());
    for (dst, src) in out.iter_mut().zip(samples) {
        *dst = src.into();
    }
    samples.len()
}

unsafe fn run(
    builder: &DeviationSignalBuilder,
    points: *const c_double,
    len: usize,
    out: *mut StcDeviationSample,
) -> usize {
    if points.is_null() || out.is_null() || len == 0 {
        return 0;
    }
    let Some(pts) = read_points(points, len) else {
        return 0;
    };
    let samples = builder.compute_points(&pts);
    write_samples(&samples, out)
}

// ============= 一次性计算 =============

/// 平直度规 diag(-time_scale², s², s², s²) 上的偏离信号
#[no_mangle]
pub unsafe extern "C" fn stc_deviation_compute_flat(
    points: *const c_double,
    len: usize,
    time_scale: c_double,
    spatial_scale: c_double,
    step: c_double,
    out: *mut StcDeviationSample,
) -> usize {
    let builder = DeviationSignalBuilder::new(Metric::minkowski(time_scale, spatial_scale), step);
    run(&builder, points, len, out)
}

/// 对角度规 diag(-time_scale², σ1², σ2², σ3²)，`vols` 指向 3 个 double
#[no_mangle]
pub unsafe extern "C" fn stc_deviation_compute_diagonal(
    points: *const c_double,
    len: usize,
    time_scale: c_double,
    vols: *const c_double,
    step: c_double,
    out: *mut StcDeviationSample,
) -> usize {
    if vols.is_null() {
        return 0;
    }
    let v = std::slice::from_raw_parts(vols, 3);
    let builder = DeviationSignalBuilder::new(Metric::diagonal(time_scale, [v[0], v[1], v[2]]), step);
    run(&builder, points, len, out)
}

// ============= 生命周期 =============

/// 创建偏离信号构造器，`vols` 为空时返回空指针
#[no_mangle]
pub unsafe extern "C" fn stc_builder_new_diagonal(
    time_scale: c_double,
    vols: *const c_double,
    step: c_double,
) -> *mut DeviationSignalBuilder {
    if vols.is_null() {
        return std::ptr::null_mut();
    }
    let v = std::slice::from_raw_parts(vols, 3);
    let builder = DeviationSignalBuilder::new(Metric::diagonal(time_scale, [v[0], v[1], v[2]]), step);
    Box::into_raw(Box::new(builder))
}

/// 销毁构造器
#[no_mangle]
pub unsafe extern "C" fn stc_builder_free(ptr: *mut DeviationSignalBuilder) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

// ============= 计算 =============

#[no_mangle]
pub unsafe extern "C" fn stc_builder_compute(
    ptr: *const DeviationSignalBuilder,
    points: *const c_double,
    len: usize,
    out: *mut StcDeviationSample,
) -> usize {
    if ptr.is_null() {
        return 0;
    }
    run(&*ptr, points, len, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_points(n: usize) -> Vec<f64> {
        (0..n)
            .flat_map(|i| [i as f64, 100.0 + i as f64 * 0.01, 1000.0, 0.0])
            .collect()
    }

    #[test]
    fn test_compute_flat() {
        let pts = flat_points(10);
        let mut out = vec![StcDeviationSample::default(); 10];
        let n = unsafe { stc_deviation_compute_flat(pts.as_ptr(), 10, 1.0, 1.0, 0.01, out.as_mut_ptr()) };
        assert_eq!(n, 10);
        assert_eq!(out[0].deviation, 0.0);
        for (i, s) in out.iter().enumerate() {
            assert_eq!(s.valid, 1);
            assert!(s.deviation.is_finite());
            assert!((s.proper_time - i as f64 * 0.01).abs() < 1e-15);
        }
    }

    #[test]
    fn test_null_pointers() {
        let pts = flat_points(3);
        let mut out = vec![StcDeviationSample::default(); 3];
        unsafe {
            assert_eq!(stc_deviation_compute_flat(std::ptr::null(), 3, 1.0, 1.0, 0.01, out.as_mut_ptr()), 0);
            assert_eq!(stc_deviation_compute_flat(pts.as_ptr(), 3, 1.0, 1.0, 0.01, std::ptr::null_mut()), 0);
            assert_eq!(stc_deviation_compute_flat(pts.as_ptr(), 0, 1.0, 1.0, 0.01, out.as_mut_ptr()), 0);
            assert_eq!(
                stc_deviation_compute_diagonal(pts.as_ptr(), 3, 1.0, std::ptr::null(), 0.01, out.as_mut_ptr()),
                0
            );
            assert!(stc_builder_new_diagonal(1.0, std::ptr::null(), 0.01).is_null());
            assert_eq!(stc_builder_compute(std::ptr::null(), pts.as_ptr(), 3, out.as_mut_ptr()), 0);
            stc_builder_free(std::ptr::null_mut());
        }
    }

    #[test]
    fn test_oversized_len_rejected() {
        let pts = flat_points(2);
        let mut out = vec![StcDeviationSample::default(); 2];
        unsafe {
            assert_eq!(stc_deviation_compute_flat(pts.as_ptr(), usize::MAX, 1.0, 1.0, 0.01, out.as_mut_ptr()), 0);
            assert_eq!(stc_deviation_compute_flat(pts.as_ptr(), usize::MAX / DIM, 1.0, 1.0, 0.01, out.as_mut_ptr()), 0);
        }
        assert_eq!(out, vec![StcDeviationSample::default(); 2]);
    }

    #[test]
    fn test_builder_lifecycle_matches_one_shot() {
        let pts = flat_points(20);
        let vols = [0.2, 0.5, 1.0];
        let mut a = vec![StcDeviationSample::default(); 20];
        let mut b = vec![StcDeviationSample::default(); 20];
        unsafe {
            let n = stc_deviation_compute_diagonal(pts.as_ptr(), 20, 1.0, vols.as_ptr(), 0.01, a.as_mut_ptr());
            assert_eq!(n, 20);

            let h = stc_builder_new_diagonal(1.0, vols.as_ptr(), 0.01);
            assert!(!h.is_null());
            assert_eq!(stc_builder_compute(h, pts.as_ptr(), 20, b.as_mut_ptr()), 20);
            stc_builder_free(h);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_leading_point() {
        let mut pts = flat_points(4);
        pts[1] = f64::NAN;
        let mut out = vec![StcDeviationSample { deviation: 9.0, proper_time: 9.0, valid: 1 }; 4];
        let n = unsafe { stc_deviation_compute_flat(pts.as_ptr(), 4, 1.0, 1.0, 0.01, out.as_mut_ptr()) };
        assert_eq!(n, 4);
        for s in &out {
            assert_eq!(s.valid, 0);
            assert_eq!(s.deviation, 0.0);
        }
    }
}
