//! # 两组晶粒共用的 g-vector
//!
//! 两组晶粒各自去重后，逐对比较它们引用的 GVE ID。共用峰多的晶粒对
//! 通常是同一个晶粒；一个峰出现在多个晶粒中则说明指标化有歧义。
//!
//! ## 依赖关系
//! - 被 `commands/grains.rs` 使用
//! - 使用 `analysis/comparison.rs`

use crate::analysis::comparison::{remove_double_grains, Deduplicated};
use crate::models::Grain;
use crate::orientation::CrystalSystem;

use std::collections::{BTreeMap, HashSet};

/// 一对共用峰的晶粒（下标指向去重后的列表）
#[derive(Debug, Clone, PartialEq)]
pub struct GrainOverlap {
    pub first: usize,
    pub second: usize,
    /// 共用的 GVE ID，升序
    pub gvector_ids: Vec<i64>,
}

/// 一组晶粒的去重结果
#[derive(Debug, Clone)]
pub struct GrainSet {
    pub name: String,
    pub total: usize,
    pub dedup: Deduplicated,
    /// 每对重复晶粒的说明
    pub duplicates: Vec<String>,
}

impl GrainSet {
    fn new(name: &str, grains: &[Grain], system: CrystalSystem, cutoff: f64) -> Self {
        let dedup = remove_double_grains(grains, system, cutoff);
        let duplicates = dedup
            .pairs
            .iter()
            .map(|p| {
                format!(
                    "- {} and {} are identical ({:.2}°)",
                    grains[p.first].name(),
                    grains[p.second].name(),
                    p.misorientation
                )
            })
            .collect();
        GrainSet {
            name: name.to_string(),
            total: grains.len(),
            dedup,
            duplicates,
        }
    }

    fn label(&self, i: usize) -> String {
        format!("{} in {}", self.dedup.grains[i].name(), self.name)
    }

    /// 去重过程的报告行
    pub fn dedup_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Check for doubles in {}", self.name)];
        lines.extend(self.duplicates.iter().cloned());
        lines.push(format!(
            "Found {} grains indexed more than once",
            self.dedup.removed
        ));
        lines.push(format!(
            "New number of grains: {}",
            self.dedup.grains.len()
        ));
        lines
    }
}

/// 共用峰分析结果
#[derive(Debug, Clone)]
pub struct SharedPeaksReport {
    pub first: GrainSet,
    pub second: GrainSet,
    pub overlaps: Vec<GrainOverlap>,
    /// GVE ID -> 引用它的晶粒（去重后的标签，按出现顺序）
    pub peaks: BTreeMap<i64, Vec<String>>,
}

/// 找出两组晶粒之间共用的峰
pub fn shared_peaks(
    first_name: &str,
    first: &[Grain],
    second_name: &str,
    second: &[Grain],
    system: CrystalSystem,
    cutoff: f64,
) -> SharedPeaksReport {
    let first = GrainSet::new(first_name, first, system, cutoff);
    let second = GrainSet::new(second_name, second, system, cutoff);

    let second_ids: Vec<HashSet<i64>> = second
        .dedup
        .grains
        .iter()
        .map(|g| g.gvector_ids().into_iter().collect())
        .collect();

    let mut overlaps = Vec::new();
    let mut peaks: BTreeMap<i64, Vec<String>> = BTreeMap::new();

    for (i, g1) in first.dedup.grains.iter().enumerate() {
        let ids1: HashSet<i64> = g1.gvector_ids().into_iter().collect();
        for (j, ids2) in second_ids.iter().enumerate() {
            let mut common: Vec<i64> = ids1.intersection(ids2).copied().collect();
            if common.is_empty() {
                continue;
            }
            common.sort_unstable();

            for &id in &common {
                let owners = peaks.entry(id).or_default();
                for label in [first.label(i), second.label(j)] {
                    if !owners.contains(&label) {
                        owners.push(label);
                    }
                }
            }
            overlaps.push(GrainOverlap {
                first: i,
                second: j,
                gvector_ids: common,
            });
        }
    }

    SharedPeaksReport {
        first,
        second,
        overlaps,
        peaks,
    }
}

impl SharedPeaksReport {
    /// 每对共用峰晶粒的两行说明
    pub fn overlap_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(2 * self.overlaps.len());
        for o in &self.overlaps {
            lines.push(format!(
                "- Grain {} of {} shares {} peaks with {} of {}",
                self.first.dedup.grains[o.first].name(),
                self.first.name,
                o.gvector_ids.len(),
                self.second.dedup.grains[o.second].name(),
                self.second.name
            ));
            lines.push(format!("Matching peaks (GVE ID): {:?}", o.gvector_ids));
        }
        lines
    }

    /// 每个共用峰出现在哪些晶粒中
    pub fn peak_lines(&self) -> Vec<String> {
        self.peaks
            .iter()
            .map(|(id, owners)| {
                format!(
                    "- peak {} is seen in {} grains: {}",
                    id,
                    owners.len(),
                    owners.join(", ")
                )
            })
            .collect()
    }

    /// 出现在两个以上晶粒中的峰数
    pub fn ambiguous_peaks(&self) -> usize {
        self.peaks.values().filter(|o| o.len() > 2).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::peak::sample_peak;
    use crate::orientation::euler::u_from_euler;
    use crate::orientation::matrix::IDENTITY;
    use crate::orientation::EulerAngles;

    /// `gvector_ids` 即为给定 ID（sample_peak 的 gvector_id = peak_id + 1000）
    fn grain(index: usize, euler: [f64; 3], gvector_ids: &[i64]) -> Grain {
        let peaks = gvector_ids
            .iter()
            .enumerate()
            .map(|(k, &id)| sample_peak(k + 1, id - 1000, 8.0))
            .collect();
        let angles = EulerAngles::new(euler[0], euler[1], euler[2]);
        Grain::new("x.log", index, u_from_euler(&angles), IDENTITY, IDENTITY)
            .with_euler_angles(angles)
            .with_peaks(peaks)
    }

    #[test]
    fn test_shared_peaks_between_runs() {
        let first = vec![
            grain(1, [10.0, 20.0, 30.0], &[1, 2, 3, 4]),
            grain(2, [80.0, 40.0, 10.0], &[5, 6, 7]),
        ];
        let second = vec![
            grain(1, [80.2, 40.0, 10.0], &[6, 7, 8]),
            grain(2, [10.1, 20.0, 30.0], &[3, 2, 9]),
            grain(3, [150.0, 70.0, 200.0], &[4, 7]),
        ];
        let report = shared_peaks("a.log", &first, "b.log", &second, CrystalSystem::Triclinic, 2.0);

        assert_eq!(report.overlaps.len(), 4);
        assert_eq!(
            report.overlaps[0],
            GrainOverlap {
                first: 0,
                second: 1,
                gvector_ids: vec![2, 3],
            }
        );
        assert_eq!(report.overlaps[1].gvector_ids, vec![4]);
        assert_eq!((report.overlaps[2].first, report.overlaps[2].second), (1, 0));
        assert_eq!(report.overlaps[2].gvector_ids, vec![6, 7]);

        let lines = report.overlap_lines();
        assert_eq!(lines[0], "- Grain Grain-1 of a.log shares 2 peaks with Grain-2 of b.log");
        assert_eq!(lines[1], "Matching peaks (GVE ID): [2, 3]");

        assert_eq!(report.peaks.keys().copied().collect::<Vec<_>>(), vec![2, 3, 4, 6, 7]);
        assert_eq!(
            report.peaks[&7],
            vec!["Grain-2 in a.log", "Grain-1 in b.log", "Grain-3 in b.log"]
        );
        assert_eq!(report.ambiguous_peaks(), 1);
        assert_eq!(
            report.peak_lines()[0],
            "- peak 2 is seen in 2 grains: Grain-1 in a.log, Grain-2 in b.log"
        );
    }

    #[test]
    fn test_duplicates_removed_before_matching() {
        // 第一组中两个晶粒取向相同，只保留峰数多的那个
        let first = vec![
            grain(1, [10.0, 20.0, 30.0], &[1, 2]),
            grain(2, [10.3, 20.0, 30.0], &[1, 2, 3]),
        ];
        let second = vec![grain(1, [10.0, 20.0, 30.0], &[1])];
        let report = shared_peaks("a.log", &first, "b.log", &second, CrystalSystem::Triclinic, 2.0);

        assert_eq!(report.first.dedup.grains.len(), 1);
        assert_eq!(report.overlaps.len(), 1);
        assert!(report.overlap_lines()[0].starts_with("- Grain Grain-2 of a.log"));

        let dedup = report.first.dedup_lines();
        assert_eq!(dedup[1], "- Grain-1 and Grain-2 are identical (0.30°)");
        assert_eq!(dedup.last().unwrap(), "New number of grains: 1");
    }

    #[test]
    fn test_no_shared_peaks() {
        let first = vec![grain(1, [10.0, 20.0, 30.0], &[1, 2])];
        let second = vec![grain(1, [10.0, 20.0, 30.0], &[3, 4])];
        let report = shared_peaks("a.log", &first, "b.log", &second, CrystalSystem::Cubic, 2.0);
        assert!(report.overlaps.is_empty());
        assert!(report.peaks.is_empty());
        assert!(report.peak_lines().is_empty());
    }
}
