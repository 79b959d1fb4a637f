use std::{collections::HashMap, fmt::Display};

use serde::Deserialize;

use crate::dialect::Dialect;

pub const PARSING_TESTS_FILE: &str = "tests/parsing_tests.toml";
pub const LINEAGE_TESTS_FILE: &str = "tests/lineage_tests.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct TestParsing {
    pub sql: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestParsingData {
    pub tests: Vec<TestParsing>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestColumn {
    pub table: String,
    pub column: String,
}

/// Join targets are compared in order: `joined_with` accumulates targets in
/// predicate discovery order and the tests pin that down.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestJoin {
    pub column: String,
    pub joined_with: Vec<TestColumn>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestLineage {
    pub sql: String,
    pub dialect: Option<Dialect>,
    pub involved_tables: Vec<String>,
    pub clean_table_list: Vec<String>,
    pub table_aliases: HashMap<String, String>,
    pub joins: HashMap<String, Vec<TestJoin>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestCleaning {
    pub raw: String,
    pub cleaned: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestLineageData {
    pub tests: Vec<TestLineage>,
    pub cleaning: Vec<TestCleaning>,
}

impl Display for TestLineageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
