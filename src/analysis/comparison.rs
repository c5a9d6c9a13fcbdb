//! # 晶粒比较与去重
//!
//! 基于对称等价最小取向差的晶粒配对：找出同一晶粒的重复指标化结果，
//! 每组只保留峰数最多的一个。
//!
//! ## 依赖关系
//! - 被 `analysis/merge.rs`, `analysis/compare.rs`, `commands/grains.rs` 使用
//! - 使用 `orientation/symmetry.rs`

use crate::models::Grain;
use crate::orientation::symmetry::min_misorientation;
use crate::orientation::CrystalSystem;

use rayon::prelude::*;

/// 一对相同的晶粒（下标指向输入列表）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicatePair {
    pub first: usize,
    pub second: usize,
    pub misorientation: f64,
}

/// 去重结果
#[derive(Debug, Clone)]
pub struct Deduplicated {
    /// 每组保留的晶粒，按组首次出现的顺序
    pub grains: Vec<Grain>,
    /// 每组成员在输入中的下标，首元素为组代表
    pub groups: Vec<Vec<usize>>,
    pub pairs: Vec<DuplicatePair>,
    /// 被移除的晶粒数
    pub removed: usize,
}

/// 找出所有取向差小于 `cutoff` 的晶粒对
pub fn find_duplicate_pairs(
    grains: &[Grain],
    system: CrystalSystem,
    cutoff: f64,
) -> Vec<DuplicatePair> {
    (0..grains.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            ((i + 1)..grains.len()).filter_map(move |j| {
                let angle = min_misorientation(grains[i].u(), grains[j].u(), system);
                (angle < cutoff).then_some(DuplicatePair {
                    first: i,
                    second: j,
                    misorientation: angle,
                })
            })
        })
        .collect()
}

/// 按输入顺序分组：尚未归组的晶粒成为代表，吸收所有与它直接匹配且尚未归组的晶粒
///
/// 匹配关系不传递：A~B、B~C 但 A 与 C 不匹配时，C 自成一组。
fn absorb_groups(n: usize, pairs: &[DuplicatePair]) -> Vec<Vec<usize>> {
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
    for p in pairs {
        neighbours[p.first].push(p.second);
    }

    let mut assigned = vec![false; n];
    let mut groups = Vec::new();
    for i in 0..n {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut group = vec![i];
        for &j in &neighbours[i] {
            if !assigned[j] {
                assigned[j] = true;
                group.push(j);
            }
        }
        groups.push(group);
    }
    groups
}

/// 去除重复晶粒
///
/// 每组中保留峰数最多的一个（峰数相同时保留组代表）。
pub fn remove_double_grains(grains: &[Grain], system: CrystalSystem, cutoff: f64) -> Deduplicated {
    let pairs = find_duplicate_pairs(grains, system, cutoff);
    let groups = absorb_groups(grains.len(), &pairs);

    let kept = groups
        .iter()
        .map(|group| {
            let best = group
                .iter()
                .copied()
                .fold(group[0], |b, i| if grains[i].npeaks() > grains[b].npeaks() { i } else { b });
            grains[best].clone()
        })
        .collect::<Vec<_>>();

    Deduplicated {
        removed: grains.len() - kept.len(),
        grains: kept,
        groups,
        pairs,
    }
}

/// 每个 `targets` 晶粒与 `references` 中所有晶粒的最小取向差矩阵
///
/// 结果的第 i 行对应 `targets[i]`。
pub fn misorientation_table(
    targets: &[Grain],
    references: &[Grain],
    system: CrystalSystem,
) -> Vec<Vec<f64>> {
    targets
        .par_iter()
        .map(|t| {
            references
                .iter()
                .map(|r| min_misorientation(r.u(), t.u(), system))
                .collect()
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn grain_with(index: usize, euler: [f64; 3], npeaks: usize) -> Grain {
    use crate::models::peak::sample_peak;
    use crate::orientation::euler::u_from_euler;
    use crate::orientation::matrix::IDENTITY;
    use crate::orientation::EulerAngles;

    let angles = EulerAngles::new(euler[0], euler[1], euler[2]);
    let peaks = (0..npeaks)
        .map(|k| sample_peak(k + 1, (index * 100 + k) as i64, 8.0))
        .collect();
    Grain::new("test.log", index, u_from_euler(&angles), IDENTITY, IDENTITY)
        .with_euler_angles(angles)
        .with_peaks(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_double_keeps_most_peaks() {
        let grains = vec![
            grain_with(1, [10.0, 20.0, 30.0], 5),
            grain_with(2, [80.0, 40.0, 10.0], 7),
            grain_with(3, [10.5, 20.0, 30.0], 9),
        ];
        let result = remove_double_grains(&grains, CrystalSystem::Triclinic, 2.0);

        assert_eq!(result.pairs.len(), 1);
        assert_eq!((result.pairs[0].first, result.pairs[0].second), (0, 2));
        assert!(result.pairs[0].misorientation < 2.0);
        assert_eq!(result.removed, 1);
        assert_eq!(result.groups, vec![vec![0, 2], vec![1]]);
        // 组内峰数最多的是第 3 个晶粒，位置仍在组代表处
        assert_eq!(result.grains[0].index_in_file(), 3);
        assert_eq!(result.grains[0].npeaks(), 9);
        assert_eq!(result.grains[1].npeaks(), 7);
    }

    #[test]
    fn test_symmetry_equivalent_grains_match() {
        // φ2 + 90° 即 U·Rz(90°)，为立方对称等价取向
        let grains = vec![
            grain_with(1, [10.0, 20.0, 30.0], 5),
            grain_with(2, [10.0, 20.0, 120.0], 4),
        ];
        let triclinic = remove_double_grains(&grains, CrystalSystem::Triclinic, 2.0);
        assert_eq!(triclinic.removed, 0);

        let cubic = remove_double_grains(&grains, CrystalSystem::Cubic, 2.0);
        assert_eq!(cubic.removed, 1);
        assert_eq!(cubic.groups, vec![vec![0, 1]]);
        assert_eq!(cubic.grains[0].npeaks(), 5);
    }

    #[test]
    fn test_chain_is_not_collapsed() {
        // A-B 10°, B-C 11.5°, A-C 21.5°，阈值 12°
        let grains = vec![
            grain_with(1, [0.0, 20.0, 30.0], 5),
            grain_with(2, [10.0, 20.0, 30.0], 9),
            grain_with(3, [21.5, 20.0, 30.0], 7),
        ];
        let result = remove_double_grains(&grains, CrystalSystem::Triclinic, 12.0);

        assert_eq!(result.pairs.len(), 2);
        assert!((result.pairs[0].misorientation - 10.0).abs() < 1e-6);
        assert!((result.pairs[1].misorientation - 11.5).abs() < 1e-6);
        assert_eq!(result.groups, vec![vec![0, 1], vec![2]]);
        assert_eq!(result.removed, 1);
        assert_eq!(result.grains[0].index_in_file(), 2);
        assert_eq!(result.grains[1].index_in_file(), 3);
    }

    #[test]
    fn test_misorientation_table() {
        let refs = vec![grain_with(1, [10.0, 20.0, 30.0], 3)];
        let targets = vec![
            grain_with(1, [10.0, 20.0, 30.0], 3),
            grain_with(2, [100.0, 20.0, 30.0], 3),
        ];
        let table = misorientation_table(&targets, &refs, CrystalSystem::Triclinic);
        assert!(table[0][0] < 1e-6);
        assert!(table[1][0] > 10.0);
    }
}
