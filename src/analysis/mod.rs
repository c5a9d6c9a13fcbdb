//! # 分析模块
//!
//! 在已解析的晶粒和峰表之上的计算：去重、合并、对比、共用峰、一致性检查、
//! 峰表筛选、指标化统计和 2θ 直方图。不做任何终端输出。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `orientation/`
//! - 子模块: checks, compare, comparison, histogram, merge, peak_selection, shared_peaks, statistics

pub mod checks;
pub mod compare;
pub mod comparison;
pub mod histogram;
pub mod merge;
pub mod peak_selection;
pub mod shared_peaks;
pub mod statistics;
