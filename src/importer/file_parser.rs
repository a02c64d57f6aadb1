// ==========================================
// 供应商风险决策支持系统 - CSV 解析器
// ==========================================
// 职责: 读取表格文件为原始记录 / 带标签矩阵
// 规则: 表头与单元格去除首尾空白; 完全空白的行跳过
// ==========================================

use crate::domain::matrix::LabeledMatrix;
use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 一行原始记录 (列名 -> 去空白后的文本)
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub line: usize,
    pub values: HashMap<String, String>,
}

impl RawRecord {
    /// 文本值 (列缺失时为空串)
    pub fn text(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    /// 可选文本值 (缺失或空白为 None)
    pub fn opt_text(&self, field: &str) -> Option<String> {
        let v = self.text(field);
        (!v.is_empty()).then(|| v.to_string())
    }
}

/// 一个表格文件的全部记录
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub file: String,
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// 非空表必须包含该列
    pub fn require_column(&self, column: &str) -> ImportResult<()> {
        if self.is_empty() || self.has_column(column) {
            Ok(())
        } else {
            Err(ImportError::MissingColumn {
                file: self.file.clone(),
                column: column.to_string(),
            })
        }
    }

    /// 数值字段: 空白取默认值, 非数值报错
    pub fn number(&self, record: &RawRecord, field: &str, default: f64) -> ImportResult<f64> {
        parse_number(record.text(field), default).ok_or_else(|| ImportError::BadNumber {
            file: self.file.clone(),
            row: record.line,
            field: field.to_string(),
            value: record.text(field).to_string(),
        })
    }

    /// 可选数值字段: 空白为 None, 非数值报错
    pub fn opt_number(&self, record: &RawRecord, field: &str) -> ImportResult<Option<f64>> {
        if record.text(field).is_empty() {
            return Ok(None);
        }
        self.number(record, field, 0.0).map(Some)
    }
}

fn parse_number(raw: &str, default: f64) -> Option<f64> {
    if raw.is_empty() {
        return Some(default);
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser;

impl CsvParser {
    fn open(path: &Path) -> ImportResult<csv::Reader<File>> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        Ok(ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file))
    }

    /// 读取实体表
    pub fn parse_to_raw_records(&self, path: &Path) -> ImportResult<RawTable> {
        let mut reader = Self::open(path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

            let mut values = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    values.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if values.values().all(|v| v.is_empty()) {
                continue;
            }
            records.push(RawRecord { line, values });
        }

        Ok(RawTable {
            file: file_label(path),
            headers,
            records,
        })
    }

    /// 读取矩阵表: 首列为行标签, 表头其余列为列标签; 空单元格为 0
    pub fn parse_matrix(&self, path: &Path) -> ImportResult<LabeledMatrix> {
        let file = file_label(path);
        let mut reader = Self::open(path)?;

        let cols: Vec<String> = reader
            .headers()?
            .iter()
            .skip(1)
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        let mut values = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

            let label = record.get(0).unwrap_or("").trim().to_string();
            let mut row = Vec::with_capacity(cols.len());
            for (j, col) in cols.iter().enumerate() {
                let raw = record.get(j + 1).unwrap_or("").trim();
                let v = parse_number(raw, 0.0).ok_or_else(|| ImportError::BadNumber {
                    file: file.clone(),
                    row: line,
                    field: col.clone(),
                    value: raw.to_string(),
                })?;
                row.push(v);
            }
            rows.push(label);
            values.push(row);
        }

        Ok(LabeledMatrix::from_rows(rows, cols, &values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_records_trimmed_and_blank_rows_skipped() {
        let f = write("event_id , severity\n E1 , 7\n,\nE2,5\n");
        let table = CsvParser.parse_to_raw_records(f.path()).unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].text("event_id"), "E1");
        assert_eq!(table.number(&table.records[1], "severity", 1.0).unwrap(), 5.0);
    }

    #[test]
    fn test_bad_number_reports_line() {
        let f = write("event_id,severity\nE1,abc\n");
        let table = CsvParser.parse_to_raw_records(f.path()).unwrap();
        match table.number(&table.records[0], "severity", 1.0) {
            Err(ImportError::BadNumber { row, field, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "severity");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_matrix_first_column_is_row_label() {
        let f = write(",A1,A2\nE1,2,\nE2,1,3\n");
        let m = CsvParser.parse_matrix(f.path()).unwrap();
        assert_eq!(m.row_labels(), &["E1".to_string(), "E2".to_string()]);
        assert_eq!(m.col_labels(), &["A1".to_string(), "A2".to_string()]);
        assert_eq!(m.get("E1", "A2"), Some(0.0));
        assert_eq!(m.get("E2", "A2"), Some(3.0));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvParser
            .parse_to_raw_records(Path::new("/nonexistent/x.csv"))
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
