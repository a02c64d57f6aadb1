// ==========================================
// 集成测试辅助模块
// ==========================================

#![allow(dead_code)]

pub mod test_data_builder;

pub use test_data_builder::DatasetBuilder;
