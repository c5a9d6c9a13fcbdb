//! # Euler 角工具
//!
//! Bunge 约定 (φ1, Φ, φ2) 的 Euler 角与取向矩阵 U 之间的转换，
//! 以及角度归一化。
//!
//! ## 约定
//! ```text
//! U = | c1c2 - s1s2cΦ   -c1s2 - s1c2cΦ    s1sΦ |
//!     | s1c2 + c1s2cΦ   -s1s2 + c1c2cΦ   -c1sΦ |
//!     | s2sΦ             c2sΦ             cΦ   |
//! ```
//!
//! ## 依赖关系
//! - 被 `models/grain.rs`, `parsers/ubi.rs`, `analysis/` 使用
//! - 使用 `orientation/matrix.rs`

use crate::error::{GrainkitError, Result};
use crate::orientation::matrix::{self, Matrix3};

use serde::Serialize;

/// sinΦ 低于该值时视为退化取向
const SIN_PHI_EPS: f64 = 1e-8;

/// Bunge Euler 角（度）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EulerAngles {
    pub phi1: f64,
    #[serde(rename = "Phi")]
    pub phi: f64,
    pub phi2: f64,
}

impl EulerAngles {
    pub fn new(phi1: f64, phi: f64, phi2: f64) -> Self {
        EulerAngles { phi1, phi, phi2 }
    }
}

/// 将角度归一化到 [0, 360)
pub fn normalized_angle_360(angle: f64) -> f64 {
    let a = angle - (angle / 360.0).floor() * 360.0;
    // 极小的负数会被舍入到 360.0
    if a >= 360.0 {
        a - 360.0
    } else {
        a
    }
}

/// 将角度归一化到 [-180, 180)
pub fn normalized_angle_180(angle: f64) -> f64 {
    let a = angle - ((angle + 180.0) / 360.0).floor() * 360.0;
    if a >= 180.0 {
        a - 360.0
    } else {
        a
    }
}

/// 从取向矩阵 U 提取 Bunge Euler 角
///
/// Φ = 0° 或 180° 时 φ1 与 φ2 不可区分，返回 `DegenerateOrientation`。
pub fn euler_from_u(u: &Matrix3) -> Result<EulerAngles> {
    let phi = u[2][2].clamp(-1.0, 1.0).acos();
    let s = phi.sin();
    if s.abs() < SIN_PHI_EPS || !s.is_finite() {
        return Err(GrainkitError::DegenerateOrientation(format!(
            "Phi = {:.4}°, phi1 and phi2 are not separable",
            phi.to_degrees()
        )));
    }

    let phi1 = (u[0][2] / s).atan2(-u[1][2] / s);
    let phi2 = (u[2][0] / s).atan2(u[2][1] / s);

    Ok(EulerAngles {
        phi1: phi1.to_degrees(),
        phi: phi.to_degrees(),
        phi2: phi2.to_degrees(),
    })
}

/// 从 Bunge Euler 角构造取向矩阵 U
pub fn u_from_euler(angles: &EulerAngles) -> Matrix3 {
    let (s1, c1) = angles.phi1.to_radians().sin_cos();
    let (sp, cp) = angles.phi.to_radians().sin_cos();
    let (s2, c2) = angles.phi2.to_radians().sin_cos();

    [
        [c1 * c2 - s1 * s2 * cp, -c1 * s2 - s1 * c2 * cp, s1 * sp],
        [s1 * c2 + c1 * s2 * cp, -s1 * s2 + c1 * c2 * cp, -c1 * sp],
        [s2 * sp, c2 * sp, cp],
    ]
}

/// U · inverse(U(euler)) 是否为单位矩阵（numpy.allclose 默认容差）
pub fn euler_matches_u(u: &Matrix3, angles: &EulerAngles) -> Result<bool> {
    let c = consistency_matrix(u, angles)?;
    Ok(matrix::allclose(&c, &matrix::IDENTITY, 1e-5, 1e-8))
}

/// U · inverse(U(euler))，一致时应为单位矩阵
pub fn consistency_matrix(u: &Matrix3, angles: &EulerAngles) -> Result<Matrix3> {
    let u2 = u_from_euler(angles);
    Ok(matrix::mat_mul(u, &matrix::inverse(&u2)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_angle_360() {
        assert!((normalized_angle_360(0.0) - 0.0).abs() < 1e-12);
        assert!((normalized_angle_360(370.0) - 10.0).abs() < 1e-12);
        assert!((normalized_angle_360(-10.0) - 350.0).abs() < 1e-12);
        assert!((normalized_angle_360(-730.0) - 350.0).abs() < 1e-9);
        assert!((normalized_angle_360(360.0) - 0.0).abs() < 1e-12);
        assert!(normalized_angle_360(-1e-20) < 360.0);
    }

    #[test]
    fn test_normalized_angle_180() {
        assert!((normalized_angle_180(180.0) - (-180.0)).abs() < 1e-12);
        assert!((normalized_angle_180(190.0) - (-170.0)).abs() < 1e-12);
        assert!((normalized_angle_180(-190.0) - 170.0).abs() < 1e-12);
        assert!((normalized_angle_180(45.0) - 45.0).abs() < 1e-12);
        assert!((normalized_angle_180(-180.0) - (-180.0)).abs() < 1e-12);
    }

    #[test]
    fn test_normalization_idempotent() {
        let samples = [
            -1080.5, -359.9, -180.0, -179.999, -0.1, 0.0, 0.1, 89.5, 179.999, 180.0, 359.99,
            360.0, 725.25, 1e6,
        ];
        for &x in &samples {
            let a = normalized_angle_360(x);
            assert!((0.0..360.0).contains(&a), "{} -> {}", x, a);
            assert_eq!(normalized_angle_360(a), a);

            let b = normalized_angle_180(x);
            assert!((-180.0..180.0).contains(&b), "{} -> {}", x, b);
            assert_eq!(normalized_angle_180(b), b);
        }
    }

    #[test]
    fn test_euler_round_trip() {
        let cases = [
            EulerAngles::new(30.0, 45.0, 60.0),
            EulerAngles::new(-120.0, 100.0, 170.0),
            EulerAngles::new(179.0, 5.0, -5.0),
            EulerAngles::new(0.0, 90.0, 0.0),
        ];
        for angles in &cases {
            let u = u_from_euler(angles);
            let extracted = euler_from_u(&u).unwrap();
            assert!((extracted.phi1 - angles.phi1).abs() < 1e-9);
            assert!((extracted.phi - angles.phi).abs() < 1e-9);
            assert!((extracted.phi2 - angles.phi2).abs() < 1e-9);
            assert!(euler_matches_u(&u, &extracted).unwrap());
        }
    }

    #[test]
    fn test_euler_degenerate() {
        assert!(matches!(
            euler_from_u(&matrix::IDENTITY),
            Err(GrainkitError::DegenerateOrientation(_))
        ));
    }

    #[test]
    fn test_euler_mismatch_detected() {
        let u = u_from_euler(&EulerAngles::new(10.0, 20.0, 30.0));
        assert!(!euler_matches_u(&u, &EulerAngles::new(10.0, 20.0, 35.0)).unwrap());
    }
}
