// ==========================================
// 供应商风险决策支持系统 - 模板目录加载
// ==========================================
// 职责: 从标准模板文件集读取 Dataset; 为缺失文件写入最小演示数据
// 规则: 文件缺失 -> 空表; 主键为空的行跳过; 空白数值取默认值
// 红线: 只做读表与类型转换, 引用修复由 Dataset::sanitize 负责
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::hor::{MitigationAction, RiskAgent, RiskEvent};
use crate::domain::matrix::LabeledMatrix;
use crate::domain::network::{Criterion, InfluenceEdge, Respondent, Subcriterion};
use crate::domain::supplier::{AllocationSupplier, Plant, Rating, Supplier};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, RawRecord, RawTable};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

// ==========================================
// 模板文件名
// ==========================================
pub mod template_files {
    pub const HOR_EVENTS: &str = "hor_events.csv";
    pub const HOR_AGENTS: &str = "hor_agents.csv";
    pub const HOR_R: &str = "hor_R.csv";
    pub const HOR_ACTIONS: &str = "hor_actions.csv";
    pub const HOR_EFFECTIVENESS: &str = "hor_effectiveness.csv";
    pub const RESPONDENTS: &str = "respondents.csv";
    pub const CRITERIA: &str = "criteria.csv";
    pub const SUBCRITERIA: &str = "subcriteria.csv";
    pub const DEMATEL_EDGES: &str = "dematel_edges.csv";
    pub const SUPPLIERS: &str = "suppliers.csv";
    pub const SUPPLIER_RATINGS: &str = "supplier_ratings.csv";
    pub const ALLOCATION_PLANTS: &str = "allocation_plants.csv";
    pub const ALLOCATION_SUPPLIERS: &str = "allocation_suppliers.csv";

    pub const ALL: [&str; 13] = [
        HOR_EVENTS,
        HOR_AGENTS,
        HOR_R,
        HOR_ACTIONS,
        HOR_EFFECTIVENESS,
        RESPONDENTS,
        CRITERIA,
        SUBCRITERIA,
        DEMATEL_EDGES,
        SUPPLIERS,
        SUPPLIER_RATINGS,
        ALLOCATION_PLANTS,
        ALLOCATION_SUPPLIERS,
    ];
}

use template_files as tf;

fn read_table(dir: &Path, name: &str) -> ImportResult<RawTable> {
    let path = dir.join(name);
    if !path.exists() {
        debug!(file = name, "模板文件缺失，按空表处理");
        return Ok(RawTable {
            file: name.to_string(),
            ..Default::default()
        });
    }
    CsvParser.parse_to_raw_records(&path)
}

fn read_matrix(dir: &Path, name: &str) -> ImportResult<LabeledMatrix> {
    let path = dir.join(name);
    if !path.exists() {
        debug!(file = name, "矩阵文件缺失，按空矩阵处理");
        return Ok(LabeledMatrix::empty());
    }
    CsvParser.parse_matrix(&path)
}

/// 逐行转换; 主键为空的行跳过
fn map_rows<T>(
    table: &RawTable,
    key: &str,
    mut f: impl FnMut(&RawTable, &RawRecord, &str) -> ImportResult<Option<T>>,
) -> ImportResult<Vec<T>> {
    table.require_column(key)?;
    let mut out = Vec::with_capacity(table.records.len());
    for rec in &table.records {
        let id = rec.text(key);
        if id.is_empty() {
            debug!(file = %table.file, line = rec.line, "主键为空，跳过该行");
            continue;
        }
        if let Some(v) = f(table, rec, id)? {
            out.push(v);
        }
    }
    Ok(out)
}

/// 从模板目录加载数据集
///
/// # 参数
/// - `dir`: 模板目录
///
/// # 返回
/// - Ok(Dataset): 未经 sanitize 的数据集
/// - Err: 文件不可读、CSV 损坏、必需列缺失或数值格式错误
pub fn load_template_dir(dir: &Path) -> ImportResult<Dataset> {
    if !dir.is_dir() {
        return Err(ImportError::FileNotFound(dir.display().to_string()));
    }

    let events = map_rows(&read_table(dir, tf::HOR_EVENTS)?, "event_id", |t, r, id| {
        Ok(Some(RiskEvent {
            event_id: id.to_string(),
            name: r.opt_text("name"),
            severity: t.number(r, "severity", 1.0)?,
        }))
    })?;

    let agents = map_rows(&read_table(dir, tf::HOR_AGENTS)?, "agent_id", |t, r, id| {
        Ok(Some(RiskAgent {
            agent_id: id.to_string(),
            name: r.opt_text("name"),
            occurrence: t.number(r, "occurrence", 1.0)?,
        }))
    })?;

    let actions = map_rows(&read_table(dir, tf::HOR_ACTIONS)?, "action_id", |t, r, id| {
        Ok(Some(MitigationAction {
            action_id: id.to_string(),
            name: r.opt_text("name"),
            difficulty: t.number(r, "difficulty", 1.0)?,
            cost: t.number(r, "cost", 0.0)?,
            manhours: t.number(r, "manhours", 0.0)?,
        }))
    })?;

    let respondents = map_rows(
        &read_table(dir, tf::RESPONDENTS)?,
        "respondent_id",
        |t, r, id| {
            Ok(Some(Respondent {
                respondent_id: id.to_string(),
                name: r.opt_text("name"),
                role: r.opt_text("role"),
                weight: t.number(r, "weight", 1.0)?,
            }))
        },
    )?;

    let criteria = map_rows(&read_table(dir, tf::CRITERIA)?, "criterion_id", |_, r, id| {
        Ok(Some(Criterion {
            criterion_id: id.to_string(),
            name: r.opt_text("name"),
        }))
    })?;

    let subcriteria = map_rows(&read_table(dir, tf::SUBCRITERIA)?, "sub_id", |_, r, id| {
        Ok(Some(Subcriterion {
            sub_id: id.to_string(),
            name: r.opt_text("name"),
            criterion_id: r.text("criterion_id").to_string(),
        }))
    })?;

    let edges = map_rows(
        &read_table(dir, tf::DEMATEL_EDGES)?,
        "respondent_id",
        |t, r, id| {
            Ok(Some(InfluenceEdge {
                respondent_id: id.to_string(),
                from_sub: r.text("from_sub").to_string(),
                to_sub: r.text("to_sub").to_string(),
                score: t.number(r, "score", 0.0)?,
            }))
        },
    )?;

    let suppliers = map_rows(&read_table(dir, tf::SUPPLIERS)?, "supplier_id", |_, r, id| {
        Ok(Some(Supplier {
            supplier_id: id.to_string(),
            name: r.opt_text("name"),
            region: r.text("region").to_string(),
        }))
    })?;

    // 评分为空的行视为未评分
    let ratings = map_rows(
        &read_table(dir, tf::SUPPLIER_RATINGS)?,
        "supplier_id",
        |t, r, id| {
            let Some(rating) = t.opt_number(r, "rating")? else {
                return Ok(None);
            };
            Ok(Some(Rating {
                supplier_id: id.to_string(),
                sub_id: r.text("sub_id").to_string(),
                respondent_id: r.text("respondent_id").to_string(),
                rating,
                plant_id: r.opt_text("plant_id"),
                time_period: r.opt_text("time_period"),
                cheese_type: r.opt_text("cheese_type"),
            }))
        },
    )?;

    let plants = map_rows(
        &read_table(dir, tf::ALLOCATION_PLANTS)?,
        "plant_id",
        |t, r, id| Ok(Some(Plant::new(id, t.number(r, "demand", 0.0)?))),
    )?;

    let allocation_suppliers = map_rows(
        &read_table(dir, tf::ALLOCATION_SUPPLIERS)?,
        "supplier_id",
        |t, r, id| {
            Ok(Some(AllocationSupplier {
                supplier_id: id.to_string(),
                capacity: t.number(r, "capacity", 0.0)?,
                unit_cost: t.number(r, "unit_cost", 0.0)?,
                emission_score: t.number(r, "emission_score", 0.0)?,
                quality_score: t.opt_number(r, "quality_score")?,
                region: r.opt_text("region"),
            }))
        },
    )?;

    let data = Dataset {
        events,
        agents,
        risk_matrix: read_matrix(dir, tf::HOR_R)?,
        actions,
        effectiveness: read_matrix(dir, tf::HOR_EFFECTIVENESS)?,
        respondents,
        criteria,
        subcriteria,
        edges,
        suppliers,
        ratings,
        plants,
        allocation_suppliers,
    };

    info!(
        dir = %dir.display(),
        events = data.events.len(),
        agents = data.agents.len(),
        actions = data.actions.len(),
        subcriteria = data.subcriteria.len(),
        suppliers = data.suppliers.len(),
        ratings = data.ratings.len(),
        "模板目录加载完成"
    );
    Ok(data)
}

// ==========================================
// 最小演示模板
// ==========================================

fn write_csv(dir: &Path, name: &str, header: &[&str], rows: Vec<Vec<String>>) -> ImportResult<bool> {
    let path = dir.join(name);
    if path.exists() {
        return Ok(false);
    }
    let mut writer = csv::Writer::from_path(&path)
        .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .flush()
        .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;
    Ok(true)
}

fn strs(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

const DEMO_SUBS: [&str; 6] = ["S1", "S2", "S3", "S4", "S5", "S6"];
const DEMO_RESPONDENTS: [&str; 3] = ["R1", "R2", "R3"];
const DEMO_SUPPLIERS: [&str; 4] = ["SUP1", "SUP2", "SUP3", "SUP4"];

/// 为缺失的模板文件写入确定性的最小演示数据
///
/// # 返回
/// 新写入的文件名列表 (已存在的文件不覆盖)
pub fn ensure_minimal_templates(dir: &Path) -> ImportResult<Vec<String>> {
    fs::create_dir_all(dir)
        .map_err(|e| ImportError::FileWriteError(format!("{}: {}", dir.display(), e)))?;

    let mut written = Vec::new();
    let mut track = |name: &str, created: bool| {
        if created {
            written.push(name.to_string());
        }
    };

    track(
        tf::HOR_EVENTS,
        write_csv(
            dir,
            tf::HOR_EVENTS,
            &["event_id", "name", "severity"],
            vec![
                strs(&["E1", "Risk Event 1", "7"]),
                strs(&["E2", "Risk Event 2", "5"]),
                strs(&["E3", "Risk Event 3", "8"]),
            ],
        )?,
    );

    track(
        tf::HOR_AGENTS,
        write_csv(
            dir,
            tf::HOR_AGENTS,
            &["agent_id", "name", "occurrence"],
            vec![
                strs(&["A1", "Agent 1", "6"]),
                strs(&["A2", "Agent 2", "7"]),
                strs(&["A3", "Agent 3", "5"]),
            ],
        )?,
    );

    track(
        tf::HOR_R,
        write_csv(
            dir,
            tf::HOR_R,
            &["", "A1", "A2", "A3"],
            vec![
                strs(&["E1", "2", "1", "0"]),
                strs(&["E2", "1", "3", "2"]),
                strs(&["E3", "0", "2", "1"]),
            ],
        )?,
    );

    track(
        tf::HOR_ACTIONS,
        write_csv(
            dir,
            tf::HOR_ACTIONS,
            &["action_id", "name", "difficulty", "cost", "manhours"],
            vec![
                strs(&["M1", "Mitigation 1", "3", "100", "40"]),
                strs(&["M2", "Mitigation 2", "2", "150", "60"]),
                strs(&["M3", "Mitigation 3", "4", "80", "35"]),
            ],
        )?,
    );

    // 因子 × 措施 方向, 由对齐器自动转置
    track(
        tf::HOR_EFFECTIVENESS,
        write_csv(
            dir,
            tf::HOR_EFFECTIVENESS,
            &["", "M1", "M2", "M3"],
            vec![
                strs(&["A1", "0.8", "0.5", "0.3"]),
                strs(&["A2", "0.6", "0.9", "0.4"]),
                strs(&["A3", "0.4", "0.7", "0.8"]),
            ],
        )?,
    );

    track(
        tf::RESPONDENTS,
        write_csv(
            dir,
            tf::RESPONDENTS,
            &["respondent_id", "name", "role", "weight"],
            vec![
                strs(&["R1", "Expert 1", "Manager", "1.0"]),
                strs(&["R2", "Expert 2", "Analyst", "0.8"]),
                strs(&["R3", "Expert 3", "Director", "1.2"]),
            ],
        )?,
    );

    track(
        tf::CRITERIA,
        write_csv(
            dir,
            tf::CRITERIA,
            &["criterion_id", "name"],
            vec![
                strs(&["C1", "Quality"]),
                strs(&["C2", "Cost"]),
                strs(&["C3", "Delivery"]),
            ],
        )?,
    );

    track(
        tf::SUBCRITERIA,
        write_csv(
            dir,
            tf::SUBCRITERIA,
            &["sub_id", "name", "criterion_id"],
            vec![
                strs(&["S1", "Quality-A", "C1"]),
                strs(&["S2", "Quality-B", "C1"]),
                strs(&["S3", "Cost-A", "C2"]),
                strs(&["S4", "Cost-B", "C2"]),
                strs(&["S5", "Delivery-A", "C3"]),
                strs(&["S6", "Delivery-B", "C3"]),
            ],
        )?,
    );

    let mut edges = Vec::new();
    for (k, r) in DEMO_RESPONDENTS.iter().enumerate() {
        for (i, from) in DEMO_SUBS.iter().enumerate() {
            for (j, to) in DEMO_SUBS.iter().enumerate() {
                if i != j {
                    let score = (i * 3 + j * 2 + k) % 5;
                    edges.push(vec![
                        r.to_string(),
                        from.to_string(),
                        to.to_string(),
                        score.to_string(),
                    ]);
                }
            }
        }
    }
    track(
        tf::DEMATEL_EDGES,
        write_csv(
            dir,
            tf::DEMATEL_EDGES,
            &["respondent_id", "from_sub", "to_sub", "score"],
            edges,
        )?,
    );

    track(
        tf::SUPPLIERS,
        write_csv(
            dir,
            tf::SUPPLIERS,
            &["supplier_id", "name", "region"],
            vec![
                strs(&["SUP1", "Supplier A", "North"]),
                strs(&["SUP2", "Supplier B", "South"]),
                strs(&["SUP3", "Supplier C", "East"]),
                strs(&["SUP4", "Supplier D", "West"]),
            ],
        )?,
    );

    let mut ratings = Vec::new();
    for (a, sup) in DEMO_SUPPLIERS.iter().enumerate() {
        for (b, sub) in DEMO_SUBS.iter().enumerate() {
            for (c, r) in DEMO_RESPONDENTS.iter().enumerate() {
                let rating = 3 + (a + b + c) % 3;
                ratings.push(vec![
                    sup.to_string(),
                    sub.to_string(),
                    r.to_string(),
                    rating.to_string(),
                    "P1".to_string(),
                    "2024-Q1".to_string(),
                    "Mozzarella".to_string(),
                ]);
            }
        }
    }
    track(
        tf::SUPPLIER_RATINGS,
        write_csv(
            dir,
            tf::SUPPLIER_RATINGS,
            &[
                "supplier_id",
                "sub_id",
                "respondent_id",
                "rating",
                "plant_id",
                "time_period",
                "cheese_type",
            ],
            ratings,
        )?,
    );

    track(
        tf::ALLOCATION_PLANTS,
        write_csv(
            dir,
            tf::ALLOCATION_PLANTS,
            &["plant_id", "demand"],
            vec![strs(&["PlantA", "100"]), strs(&["PlantB", "120"])],
        )?,
    );

    track(
        tf::ALLOCATION_SUPPLIERS,
        write_csv(
            dir,
            tf::ALLOCATION_SUPPLIERS,
            &["supplier_id", "capacity", "unit_cost", "emission_score"],
            vec![
                strs(&["SUP1", "150", "4.5", "0.6"]),
                strs(&["SUP2", "120", "4.2", "0.8"]),
                strs(&["SUP3", "90", "4.0", "1.0"]),
                strs(&["SUP4", "80", "4.1", "0.7"]),
            ],
        )?,
    );

    if !written.is_empty() {
        info!(dir = %dir.display(), files = written.len(), "已写入演示模板");
    }
    Ok(written)
}
