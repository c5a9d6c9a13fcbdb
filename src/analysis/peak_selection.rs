//! # 按晶粒筛选峰表
//!
//! - 从 GVE 中删除已经被指标化的 g-vector（供下一轮 GrainSpotter 使用）
//! - 从 FLT 中只保留被指标化的峰，可按晶粒分别输出
//!
//! ## 依赖关系
//! - 被 `commands/peaks.rs` 使用
//! - 使用 `models/peak_table.rs`

use crate::error::{GrainkitError, Result};
use crate::models::{Grain, PeakTable};

/// 删除结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalSummary {
    /// 晶粒中引用的峰数（含重复指标化）
    pub assigned: usize,
    /// 实际删除的行数
    pub removed: usize,
    /// 剩余行数
    pub remaining: usize,
}

/// 从峰表中删除所有被晶粒引用的峰
///
/// 任何一个峰 ID 不在表中都会中止，表不被修改。
pub fn remove_indexed_peaks(grains: &[Grain], table: &mut PeakTable) -> Result<RemovalSummary> {
    let mut ids = Vec::new();
    for grain in grains {
        for id in grain.peak_ids() {
            if !table.contains(id) {
                return Err(GrainkitError::PeakNotFound {
                    id,
                    path: table.source().to_string(),
                    context: Some(grain.name()),
                });
            }
            ids.push(id);
        }
    }

    let removed = table.remove_ids(&ids)?;
    Ok(RemovalSummary {
        assigned: ids.len(),
        removed,
        remaining: table.len(),
    })
}

/// 只保留被晶粒引用的峰，按晶粒顺序排列
pub fn select_grain_peaks(grains: &[Grain], table: &PeakTable) -> Result<PeakTable> {
    let mut ids = Vec::new();
    for grain in grains {
        // 逐个晶粒检查，出错时指明晶粒
        table.select(&grain.peak_ids(), Some(&grain.name()))?;
        ids.extend(grain.peak_ids());
    }
    table.select(&ids, None)
}

/// 每个晶粒一张峰表，键为晶粒名
pub fn per_grain_peak_tables(grains: &[Grain], table: &PeakTable) -> Result<Vec<(String, PeakTable)>> {
    grains
        .iter()
        .map(|g| {
            let name = g.name();
            let sub = table.select(&g.peak_ids(), Some(&name))?;
            Ok((name, sub))
        })
        .collect()
}
