//! # 数据模型模块
//!
//! 晶粒、已指标化衍射峰、峰表和 GrainSpotter 输入参数的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `analysis/` 和 `commands/` 使用
//! - 子模块: grain, peak, peak_table, gs_input

pub mod grain;
pub mod gs_input;
pub mod peak;
pub mod peak_table;

pub use grain::Grain;
pub use gs_input::GrainSpotterInput;
pub use peak::IndexedPeak;
pub use peak_table::{PeakRow, PeakTable, PeakTableKind, PredictedReflection};
