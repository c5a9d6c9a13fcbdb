//! # UBI 分解
//!
//! 由 UBI = (U·B)⁻¹ 求取向矩阵 U 与晶胞矩阵 B。
//!
//! B 取 Busing–Levy 上三角形式（对角元为正）：
//! ```text
//! UB  = inverse(UBI)
//! G*  = UBᵀ · UB = Bᵀ · B      (倒易度规张量)
//! L   = cholesky(G*)           (下三角, L · Lᵀ = G*)
//! B   = Lᵀ
//! U   = UB · B⁻¹
//! ```
//! 于是 `B = inverse(UBI · U)` 严格成立，U 为正交矩阵。
//!
//! ## 依赖关系
//! - 被 `parsers/` 使用
//! - 使用 `orientation/matrix.rs`

use crate::error::{GrainkitError, Result};
use crate::orientation::matrix::{self, Matrix3};

/// 由 UBI 求 U
pub fn ubi_to_u(ubi: &Matrix3) -> Result<Matrix3> {
    if matrix::determinant(ubi) <= 0.0 {
        return Err(GrainkitError::DegenerateOrientation(
            "UBI is left-handed or singular".to_string(),
        ));
    }

    let ub = matrix::inverse(ubi)?;
    let metric = matrix::mat_mul(&matrix::transpose(&ub), &ub);
    let b = matrix::transpose(&matrix::cholesky(&metric)?);
    Ok(matrix::mat_mul(&ub, &matrix::inverse(&b)?))
}

/// B = inverse(UBI · U)
pub fn b_from_u_ubi(u: &Matrix3, ubi: &Matrix3) -> Result<Matrix3> {
    matrix::inverse(&matrix::mat_mul(ubi, u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::euler::{u_from_euler, EulerAngles};

    /// 立方晶胞 a = 4.2 Å 的 B（含 2π 前的倒易长度）
    fn cubic_b(a: f64) -> Matrix3 {
        [[1.0 / a, 0.0, 0.0], [0.0, 1.0 / a, 0.0], [0.0, 0.0, 1.0 / a]]
    }

    #[test]
    fn test_ubi_to_u_recovers_orientation() {
        let u = u_from_euler(&EulerAngles::new(25.0, 40.0, 75.0));
        let b = cubic_b(4.2);
        let ubi = matrix::inverse(&matrix::mat_mul(&u, &b)).unwrap();

        let u2 = ubi_to_u(&ubi).unwrap();
        assert!(matrix::allclose(&u, &u2, 1e-9, 1e-12));

        let b2 = b_from_u_ubi(&u2, &ubi).unwrap();
        assert!(matrix::allclose(&b, &b2, 1e-9, 1e-12));
    }

    #[test]
    fn test_ubi_to_u_triclinic_cell_gives_rotation() {
        // 上三角 B（三斜晶胞）
        let b = [[0.25, 0.03, -0.02], [0.0, 0.21, 0.04], [0.0, 0.0, 0.18]];
        let u = u_from_euler(&EulerAngles::new(-60.0, 120.0, 10.0));
        let ubi = matrix::inverse(&matrix::mat_mul(&u, &b)).unwrap();

        let u2 = ubi_to_u(&ubi).unwrap();
        let utu = matrix::mat_mul(&matrix::transpose(&u2), &u2);
        assert!(matrix::allclose(&utu, &matrix::IDENTITY, 1e-9, 1e-12));
        assert!((matrix::determinant(&u2) - 1.0).abs() < 1e-9);
        assert!(matrix::allclose(&u, &u2, 1e-9, 1e-12));
    }

    #[test]
    fn test_ubi_to_u_rejects_left_handed() {
        let ubi = [[-4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]];
        assert!(ubi_to_u(&ubi).is_err());
    }
}
