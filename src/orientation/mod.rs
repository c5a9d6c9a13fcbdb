//! # 取向计算模块
//!
//! 晶粒取向相关的数值工具。
//!
//! ## 子模块
//! - `matrix`: 3×3 矩阵运算
//! - `euler`: Bunge Euler 角与角度归一化
//! - `ubi`: UBI → U, B 分解
//! - `symmetry`: 晶系旋转群与取向差
//!
//! ## 依赖关系
//! - 被 `models/`, `parsers/`, `analysis/` 使用

pub mod euler;
pub mod matrix;
pub mod symmetry;
pub mod ubi;

pub use euler::{normalized_angle_180, normalized_angle_360, EulerAngles};
pub use matrix::Matrix3;
pub use symmetry::CrystalSystem;
