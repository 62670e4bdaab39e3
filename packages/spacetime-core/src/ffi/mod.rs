//! FFI 模块
//!
//! - `c_api`: C ABI (供 Go / Python ctypes 等调用)

pub mod c_api;
