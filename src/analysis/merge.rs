//! # 多次 GrainSpotter 指标化结果合并
//!
//! 将多个日志中的晶粒合并，去除重复，并统计每个唯一晶粒被指标化的次数。
//!
//! ## 依赖关系
//! - 被 `commands/grains.rs` 使用
//! - 使用 `analysis/comparison.rs`

use crate::analysis::comparison::{remove_double_grains, Deduplicated};
use crate::models::Grain;
use crate::orientation::CrystalSystem;

/// 合并结果
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// 合并前的晶粒总数
    pub total: usize,
    pub dedup: Deduplicated,
    /// 每个唯一晶粒被指标化的次数（即所在组的大小），顺序同 `dedup.grains`
    pub times_indexed: Vec<usize>,
}

impl MergeResult {
    pub fn unique_grains(&self) -> &[Grain] {
        &self.dedup.grains
    }

    /// (指标化次数, 晶粒数)，按次数降序
    pub fn multiplicities(&self) -> Vec<(usize, usize)> {
        let mut counts: Vec<usize> = self.times_indexed.clone();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        counts.dedup();
        counts
            .into_iter()
            .map(|n| (n, self.times_indexed.iter().filter(|&&t| t == n).count()))
            .collect()
    }

    /// 恰好被指标化 `n` 次的唯一晶粒
    pub fn grains_indexed(&self, n: usize) -> Vec<Grain> {
        self.dedup
            .grains
            .iter()
            .zip(&self.times_indexed)
            .filter(|(_, &t)| t == n)
            .map(|(g, _)| g.clone())
            .collect()
    }
}

/// 合并多组晶粒
pub fn merge_grains(lists: Vec<Vec<Grain>>, system: CrystalSystem, cutoff: f64) -> MergeResult {
    let all: Vec<Grain> = lists.into_iter().flatten().collect();
    let dedup = remove_double_grains(&all, system, cutoff);

    let times_indexed = dedup.groups.iter().map(Vec::len).collect();

    MergeResult {
        total: all.len(),
        dedup,
        times_indexed,
    }
}
