//! # 3×3 矩阵运算
//!
//! 取向矩阵 (U, B, UBI) 所需的最小线性代数工具集，
//! 矩阵按行存储：`m[row][col]`。
//!
//! ## 依赖关系
//! - 被 `orientation/`, `parsers/`, `models/grain.rs` 使用
//! - 无外部模块依赖

use crate::error::{GrainkitError, Result};

/// 3×3 矩阵（行优先）
pub type Matrix3 = [[f64; 3]; 3];

/// 单位矩阵
pub const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// 矩阵乘法 a · b
pub fn mat_mul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// 转置
pub fn transpose(m: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in m.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            out[j][i] = *value;
        }
    }
    out
}

/// 行列式
pub fn determinant(m: &Matrix3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 迹
pub fn trace(m: &Matrix3) -> f64 {
    m[0][0] + m[1][1] + m[2][2]
}

/// 逆矩阵（伴随矩阵法）
pub fn inverse(m: &Matrix3) -> Result<Matrix3> {
    let det = determinant(m);
    if det.abs() < 1e-12 || !det.is_finite() {
        return Err(GrainkitError::SingularMatrix(format!(
            "determinant is {:e}",
            det
        )));
    }

    Ok([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ])
}

/// Cholesky 分解：返回下三角 L，满足 m = L · Lᵀ
///
/// 要求 m 对称正定。
pub fn cholesky(m: &Matrix3) -> Result<Matrix3> {
    let mut l = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let d = m[i][i] - sum;
                if d <= 0.0 || !d.is_finite() {
                    return Err(GrainkitError::SingularMatrix(
                        "matrix is not positive definite".to_string(),
                    ));
                }
                l[i][j] = d.sqrt();
            } else {
                l[i][j] = (m[i][j] - sum) / l[j][j];
            }
        }
    }
    Ok(l)
}

/// 逐元素近似比较，语义同 numpy.allclose：|a - b| <= atol + rtol * |b|
pub fn allclose(a: &Matrix3, b: &Matrix3, rtol: f64, atol: f64) -> bool {
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .all(|(x, y)| (x - y).abs() <= atol + rtol * y.abs())
}

/// 多行文本形式，用于报告文件
pub fn format_matrix(m: &Matrix3) -> String {
    m.iter()
        .map(|row| format!("[{:>11.8} {:>11.8} {:>11.8}]", row[0], row[1], row[2]))
        .collect::<Vec<_>>()
        .join("\n")
}
