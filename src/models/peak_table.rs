//! # 峰表数据模型
//!
//! `.flt` 和 `.gve` 文件解析后的峰表。每一行自带 `spot3d_id`，
//! ID → 行号索引在每次修改后重建，行与 ID 始终同步。
//!
//! ## 依赖关系
//! - 被 `parsers/peak_table.rs`, `analysis/` 使用
//! - 使用 `error.rs`

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{GrainkitError, Result};

/// 峰表 ID 列名
pub const ID_COLUMN: &str = "spot3d_id";

/// 峰表格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakTableKind {
    Flt,
    Gve,
}

impl PeakTableKind {
    pub fn extension(&self) -> &'static str {
        match self {
            PeakTableKind::Flt => "flt",
            PeakTableKind::Gve => "gve",
        }
    }
}

impl fmt::Display for PeakTableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

/// 峰表中的一行，值按列顺序保存原始文本
#[derive(Debug, Clone, PartialEq)]
pub struct PeakRow {
    pub spot3d_id: i64,
    pub values: Vec<String>,
}

/// g-vector 的常用字段
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GVector {
    pub id: i64,
    pub ds: f64,
    pub eta: f64,
    pub omega: f64,
}

/// GVE 头部列出的预测衍射 (ds h k l)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedReflection {
    pub ds: f64,
    pub hkl: [i32; 3],
}

impl PredictedReflection {
    /// 2θ（度）
    pub fn two_theta(&self, wavelength: f64) -> f64 {
        2.0 * (wavelength * self.ds / 2.0).asin().to_degrees()
    }
}

/// 峰表
#[derive(Debug, Clone)]
pub struct PeakTable {
    kind: PeakTableKind,
    source: String,
    header: Vec<String>,
    columns: Vec<String>,
    rows: Vec<PeakRow>,
    predicted: Vec<PredictedReflection>,
    index: HashMap<i64, usize>,
}

impl PeakTable {
    /// 由已校验的各部分组装峰表
    pub(crate) fn from_parts(
        kind: PeakTableKind,
        source: impl Into<String>,
        header: Vec<String>,
        columns: Vec<String>,
        rows: Vec<PeakRow>,
        predicted: Vec<PredictedReflection>,
    ) -> Self {
        let mut table = PeakTable {
            kind,
            source: source.into(),
            header,
            columns,
            rows,
            predicted,
            index: HashMap::new(),
        };
        table.rebuild_index();
        table
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, row) in self.rows.iter().enumerate() {
            self.index.entry(row.spot3d_id).or_insert(i);
        }
    }

    pub fn kind(&self) -> PeakTableKind {
        self.kind
    }

    /// 来源文件
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 原样保留的头部文本行
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[PeakRow] {
        &self.rows
    }

    pub fn predicted_reflections(&self) -> &[PredictedReflection] {
        &self.predicted
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按行顺序的 spot3d_id 列表
    #[cfg(test)]
    pub(crate) fn ids(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.spot3d_id).collect()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, id: i64) -> Option<&PeakRow> {
        self.index.get(&id).map(|&i| &self.rows[i])
    }

    /// 按 ID 查找，找不到时返回 `PeakNotFound`
    pub fn lookup(&self, id: i64) -> Result<&PeakRow> {
        self.get(id).ok_or_else(|| GrainkitError::PeakNotFound {
            id,
            path: self.source.clone(),
            context: None,
        })
    }

    /// 读取某个峰的某列数值
    pub fn value_f64(&self, id: i64, column: &str) -> Result<f64> {
        let col = self.require_column(column)?;
        let row = self.lookup(id)?;
        self.parse_cell(row, col)
    }

    fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column).ok_or_else(|| GrainkitError::ParseError {
            format: self.kind.to_string(),
            path: self.source.clone(),
            reason: format!("missing column '{}'", column),
        })
    }

    fn parse_cell(&self, row: &PeakRow, col: usize) -> Result<f64> {
        row.values[col]
            .parse::<f64>()
            .map_err(|_| GrainkitError::ParseError {
                format: self.kind.to_string(),
                path: self.source.clone(),
                reason: format!(
                    "peak {}: column '{}' is not numeric: '{}'",
                    row.spot3d_id, self.columns[col], row.values[col]
                ),
            })
    }

    /// ds, eta, omega 视图
    pub fn gvectors(&self) -> Result<Vec<GVector>> {
        let ds = self.require_column("ds")?;
        let eta = self.require_column("eta")?;
        let omega = self.require_column("omega")?;

        self.rows
            .iter()
            .map(|row| {
                Ok(GVector {
                    id: row.spot3d_id,
                    ds: self.parse_cell(row, ds)?,
                    eta: self.parse_cell(row, eta)?,
                    omega: self.parse_cell(row, omega)?,
                })
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // 修改操作（均重建索引）
    // ─────────────────────────────────────────────────────────────

    /// 删除给定 ID 的峰
    ///
    /// 任一 ID 不存在时返回错误且不做任何修改。
    pub fn remove_ids(&mut self, ids: &[i64]) -> Result<usize> {
        if let Some(&missing) = ids.iter().find(|id| !self.contains(**id)) {
            return Err(GrainkitError::PeakNotFound {
                id: missing,
                path: self.source.clone(),
                context: None,
            });
        }

        let doomed: HashSet<i64> = ids.iter().copied().collect();
        let before = self.rows.len();
        self.rows.retain(|r| !doomed.contains(&r.spot3d_id));
        self.rebuild_index();
        Ok(before - self.rows.len())
    }

    /// 按给定 ID 顺序取出行，组成具有相同头部的新表
    ///
    /// `context` 用于错误信息（如晶粒名）。
    pub fn select(&self, ids: &[i64], context: Option<&str>) -> Result<PeakTable> {
        let rows = ids
            .iter()
            .map(|&id| {
                self.get(id)
                    .cloned()
                    .ok_or_else(|| GrainkitError::PeakNotFound {
                        id,
                        path: self.source.clone(),
                        context: context.map(str::to_string),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PeakTable::from_parts(
            self.kind,
            self.source.clone(),
            self.header.clone(),
            self.columns.clone(),
            rows,
            self.predicted.clone(),
        ))
    }

    /// 追加另一个表中本表没有的峰，返回追加数目
    ///
    /// 值按列名映射到本表的列顺序。
    pub fn merge_missing(&mut self, other: &PeakTable) -> Result<usize> {
        let mapping = self
            .columns
            .iter()
            .map(|c| {
                other.column_index(c).ok_or_else(|| GrainkitError::ParseError {
                    format: other.kind.to_string(),
                    path: other.source.clone(),
                    reason: format!("missing column '{}' present in {}", c, self.source),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut added = 0;
        for row in &other.rows {
            if self.contains(row.spot3d_id) {
                continue;
            }
            let values = mapping.iter().map(|&i| row.values[i].clone()).collect();
            self.rows.push(PeakRow {
                spot3d_id: row.spot3d_id,
                values,
            });
            self.index.insert(row.spot3d_id, self.rows.len() - 1);
            added += 1;
        }
        Ok(added)
    }
}

#[cfg(test)]
pub(crate) fn sample_table(ids: &[i64]) -> PeakTable {
    let columns: Vec<String> = ["ds", "eta", "omega", "spot3d_id"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = ids
        .iter()
        .map(|&id| PeakRow {
            spot3d_id: id,
            values: vec![
                format!("{:.3}", 0.5 + id as f64 / 1000.0),
                "10.0".to_string(),
                "-20.0".to_string(),
                id.to_string(),
            ],
        })
        .collect();
    PeakTable::from_parts(
        PeakTableKind::Gve,
        "test.gve",
        vec!["# ds eta omega spot3d_id".to_string()],
        columns,
        rows,
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let table = sample_table(&[101, 102, 103]);
        assert_eq!(table.lookup(102).unwrap().spot3d_id, 102);
        assert_eq!(table.lookup(102).unwrap().values[3], "102");
        assert!((table.value_f64(103, "ds").unwrap() - 0.603).abs() < 1e-12);

        match table.lookup(999) {
            Err(GrainkitError::PeakNotFound { id, .. }) => assert_eq!(id, 999),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_ids_stay_in_lockstep_after_removal() {
        let mut table = sample_table(&[5, 6, 7, 8, 9]);
        assert_eq!(table.remove_ids(&[6, 8]).unwrap(), 2);

        let ids = table.ids();
        assert_eq!(ids.len(), table.rows().len());
        for (i, row) in table.rows().iter().enumerate() {
            assert_eq!(ids[i], row.spot3d_id);
            assert_eq!(table.lookup(row.spot3d_id).unwrap(), row);
        }
        assert!(table.get(6).is_none());
        assert_eq!(table.lookup(9).unwrap().values[3], "9");
    }

    #[test]
    fn test_remove_missing_id_is_atomic() {
        let mut table = sample_table(&[1, 2, 3]);
        assert!(table.remove_ids(&[1, 42]).is_err());
        assert_eq!(table.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let table = sample_table(&[1, 2, 3]);
        let sub = table.select(&[3, 1], Some("Grain-1")).unwrap();
        assert_eq!(sub.ids(), vec![3, 1]);
        assert_eq!(sub.header(), table.header());

        let err = table.select(&[4], Some("Grain-1")).unwrap_err();
        assert!(err.to_string().contains("Grain-1"));
    }

    #[test]
    fn test_gvectors_and_merge() {
        let mut a = sample_table(&[1, 2]);
        let b = sample_table(&[2, 3]);
        assert_eq!(a.merge_missing(&b).unwrap(), 1);
        assert_eq!(a.ids(), vec![1, 2, 3]);

        let g = a.gvectors().unwrap();
        assert_eq!(g.len(), 3);
        assert!((g[2].ds - 0.503).abs() < 1e-12);
        assert!((g[2].omega + 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_predicted_two_theta() {
        let refl = PredictedReflection {
            ds: 0.5,
            hkl: [1, 1, 1],
        };
        let tth = refl.two_theta(0.3);
        let back = 2.0 * (tth / 2.0).to_radians().sin() / 0.3;
        assert!((back - 0.5).abs() < 1e-12);
    }
}
