//! # 晶体对称性与取向差
//!
//! 七大晶系的纯旋转点群（由生成元闭包得到），
//! 以及两取向之间考虑对称等价后的最小取向差。
//!
//! ## 依赖关系
//! - 被 `analysis/comparison.rs` 使用
//! - 使用 `orientation/matrix.rs`

use crate::orientation::matrix::{self, Matrix3, IDENTITY};

/// 晶系（编号 1-7 与 GrainSpotter/xfab 约定一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrystalSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Trigonal,
    Hexagonal,
    Cubic,
}

const TWO_FOLD_X: Matrix3 = [[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]];
const TWO_FOLD_Y: Matrix3 = [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]];
const TWO_FOLD_Z: Matrix3 = [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]];
const FOUR_FOLD_Z: Matrix3 = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
const THREE_FOLD_111: Matrix3 = [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

impl CrystalSystem {
    /// 纯旋转群的阶
    pub fn order(&self) -> usize {
        match self {
            CrystalSystem::Triclinic => 1,
            CrystalSystem::Monoclinic => 2,
            CrystalSystem::Orthorhombic => 4,
            CrystalSystem::Tetragonal => 8,
            CrystalSystem::Trigonal => 6,
            CrystalSystem::Hexagonal => 12,
            CrystalSystem::Cubic => 24,
        }
    }

    fn generators(&self) -> Vec<Matrix3> {
        match self {
            CrystalSystem::Triclinic => vec![],
            CrystalSystem::Monoclinic => vec![TWO_FOLD_Y],
            CrystalSystem::Orthorhombic => vec![TWO_FOLD_Z, TWO_FOLD_X],
            CrystalSystem::Tetragonal => vec![FOUR_FOLD_Z, TWO_FOLD_X],
            CrystalSystem::Trigonal => vec![rotation_z(120.0), TWO_FOLD_X],
            CrystalSystem::Hexagonal => vec![rotation_z(60.0), TWO_FOLD_X],
            CrystalSystem::Cubic => vec![FOUR_FOLD_Z, THREE_FOLD_111],
        }
    }

    /// 该晶系的全部旋转操作（首元素为单位矩阵）
    pub fn rotations(&self) -> Vec<Matrix3> {
        let generators = self.generators();
        let mut group = Vec::with_capacity(self.order());
        group.push(IDENTITY);

        loop {
            let mut added = false;
            for i in 0..group.len() {
                for gen in &generators {
                    let candidate = matrix::mat_mul(&group[i], gen);
                    if !group
                        .iter()
                        .any(|g| matrix::allclose(g, &candidate, 0.0, 1e-9))
                    {
                        group.push(candidate);
                        added = true;
                    }
                }
            }
            if !added {
                break;
            }
        }

        group
    }
}

impl std::fmt::Display for CrystalSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CrystalSystem::Triclinic => "triclinic",
            CrystalSystem::Monoclinic => "monoclinic",
            CrystalSystem::Orthorhombic => "orthorhombic",
            CrystalSystem::Tetragonal => "tetragonal",
            CrystalSystem::Trigonal => "trigonal",
            CrystalSystem::Hexagonal => "hexagonal",
            CrystalSystem::Cubic => "cubic",
        };
        write!(f, "{}", name)
    }
}

fn rotation_z(degrees: f64) -> Matrix3 {
    let (s, c) = degrees.to_radians().sin_cos();
    [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}

/// 旋转矩阵的转角（度）
pub fn rotation_angle(r: &Matrix3) -> f64 {
    ((matrix::trace(r) - 1.0) / 2.0).clamp(-1.0, 1.0).acos().to_degrees()
}

/// 每个对称等价 U1·S 与 U2 之间的取向差（度），顺序同 `rotations()`
pub fn misorientations(u1: &Matrix3, u2: &Matrix3, system: CrystalSystem) -> Vec<f64> {
    let u1t = matrix::transpose(u1);
    system
        .rotations()
        .iter()
        .map(|s| {
            // Δ = U2 · (U1·S)ᵀ
            let delta = matrix::mat_mul(u2, &matrix::mat_mul(&matrix::transpose(s), &u1t));
            rotation_angle(&delta)
        })
        .collect()
}

/// 最小取向差（度）
pub fn min_misorientation(u1: &Matrix3, u2: &Matrix3, system: CrystalSystem) -> f64 {
    misorientations(u1, u2, system)
        .into_iter()
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::euler::{u_from_euler, EulerAngles};

    #[test]
    fn test_group_orders() {
        use CrystalSystem::*;
        for system in [Triclinic, Monoclinic, Orthorhombic, Tetragonal, Trigonal, Hexagonal, Cubic] {
            let rotations = system.rotations();
            assert_eq!(rotations.len(), system.order(), "{}", system);
            for r in &rotations {
                assert!((matrix::determinant(r) - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_identical_orientations() {
        let u = u_from_euler(&EulerAngles::new(12.0, 34.0, 56.0));
        assert!(min_misorientation(&u, &u, CrystalSystem::Triclinic) < 1e-5);
    }

    #[test]
    fn test_small_rotation() {
        let u1 = u_from_euler(&EulerAngles::new(12.0, 34.0, 56.0));
        let u2 = matrix::mat_mul(&rotation_z(1.5), &u1);
        let angle = min_misorientation(&u1, &u2, CrystalSystem::Cubic);
        assert!((angle - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_symmetry_equivalent_cubic() {
        // 绕晶体 c 轴转 90° 对立方晶系是等价取向
        let u1 = u_from_euler(&EulerAngles::new(20.0, 50.0, 10.0));
        let u2 = matrix::mat_mul(&u1, &FOUR_FOLD_Z);
        assert!(min_misorientation(&u1, &u2, CrystalSystem::Cubic) < 1e-5);
        let triclinic = min_misorientation(&u1, &u2, CrystalSystem::Triclinic);
        assert!((triclinic - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_hexagonal_sixty_degrees() {
        let u1 = u_from_euler(&EulerAngles::new(5.0, 70.0, 15.0));
        let u2 = matrix::mat_mul(&u1, &rotation_z(60.0));
        assert!(min_misorientation(&u1, &u2, CrystalSystem::Hexagonal) < 1e-5);
        assert!(min_misorientation(&u1, &u2, CrystalSystem::Trigonal) > 1.0);
    }
}
