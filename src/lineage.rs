mod binder;
mod graph;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::ast::TablePath;
use crate::cleaner;
use crate::dialect::Dialect;
use crate::lineage::binder::AliasMap;
use crate::parser::extract_clauses;

/// Sentinel used when a table reference carries no schema qualifier.
pub const DEFAULT_SCHEMA: &str = "<default>";

/// A table reference with its optional schema qualifier, normalized at
/// construction: unquoted parts fold to lowercase, quoted parts keep their
/// exact spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedTable {
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedTable {
    pub(crate) fn from_path(path: &TablePath) -> QualifiedTable {
        let name = path
            .parts
            .last()
            .map(|part| part.normalized())
            .unwrap_or_default();
        let schema = if path.parts.len() > 1 {
            Some(
                path.parts[..path.parts.len() - 1]
                    .iter()
                    .map(|part| part.normalized())
                    .collect::<Vec<String>>()
                    .join("."),
            )
        } else {
            None
        };
        QualifiedTable { schema, name }
    }

    /// Rendering with the default-schema sentinel, e.g. `<default>.foo`.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => format!("{}.{}", DEFAULT_SCHEMA, self.name),
        }
    }

    /// Rendering without the sentinel, e.g. `foo` or `db.schema.foo`.
    pub fn clean(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

/// A fully resolved column: the clean table string plus the column spelling
/// exactly as written in the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub table: String,
    pub column: String,
}

/// One source column and every column it was equated with, in predicate
/// discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumnJoin {
    pub table_column: TableColumn,
    pub joined_with: Vec<TableColumn>,
}

/// Serializable bundle of the four lineage views, for the CLI and pipeline
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageReport {
    pub dialect: Dialect,
    pub involved_tables: Vec<String>,
    pub clean_table_list: IndexSet<String>,
    pub table_aliases: IndexMap<String, String>,
    pub table_joins: IndexMap<String, Vec<TableColumnJoin>>,
}

/// Extracts table-level and column-join lineage from one SQL statement.
///
/// Cleaning, clause extraction, alias binding and join-graph building all
/// happen at construction, so the views are consistent snapshots of the same
/// parse. A statement the cleaner recognizes as non-lineage-bearing (a bulk
/// COPY load) constructs successfully with every view empty; genuinely
/// unparsable text fails construction instead.
pub struct LineageParser {
    dialect: Dialect,
    involved_tables: Vec<QualifiedTable>,
    clean_table_list: IndexSet<String>,
    table_aliases: IndexMap<String, String>,
    table_joins: IndexMap<String, Vec<TableColumnJoin>>,
}

impl LineageParser {
    pub fn new(query: &str) -> anyhow::Result<LineageParser> {
        Self::with_dialect(query, Dialect::default())
    }

    pub fn with_dialect(query: &str, dialect: Dialect) -> anyhow::Result<LineageParser> {
        let Some(clean_query) = cleaner::clean_raw_query(query) else {
            log::debug!("Query carries no lineage after cleaning; views are empty");
            return Ok(LineageParser::empty(dialect));
        };

        let clauses = extract_clauses(&clean_query, dialect)?;
        let aliases = AliasMap::bind(&clauses);
        let edges = graph::collect_edges(&clauses, &aliases);

        let mut involved_tables: Vec<QualifiedTable> = vec![];
        for table in aliases.tables() {
            if !involved_tables.contains(table) {
                involved_tables.push(table.clone());
            }
        }
        let clean_table_list = involved_tables.iter().map(|table| table.clean()).collect();

        Ok(LineageParser {
            dialect,
            involved_tables,
            clean_table_list,
            table_aliases: aliases.alias_view(),
            table_joins: graph::group_edges(edges),
        })
    }

    fn empty(dialect: Dialect) -> LineageParser {
        LineageParser {
            dialect,
            involved_tables: vec![],
            clean_table_list: IndexSet::new(),
            table_aliases: IndexMap::new(),
            table_joins: IndexMap::new(),
        }
    }

    /// Pre-cleans raw query text without building lineage. `None` means the
    /// statement carries no lineage at all.
    pub fn clean_raw_query(raw: &str) -> Option<String> {
        cleaner::clean_raw_query(raw)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Distinct tables referenced in FROM/JOIN, in appearance order.
    pub fn involved_tables(&self) -> &[QualifiedTable] {
        &self.involved_tables
    }

    /// The involved tables without the `<default>.` sentinel.
    pub fn clean_table_list(&self) -> &IndexSet<String> {
        &self.clean_table_list
    }

    /// Alias (or bare self-alias) to clean table string. Subquery aliases
    /// are not exposed.
    pub fn table_aliases(&self) -> &IndexMap<String, String> {
        &self.table_aliases
    }

    /// Column-join records keyed by the clean string of the join's source
    /// table (the side appearing earliest in FROM/JOIN order).
    pub fn table_joins(&self) -> &IndexMap<String, Vec<TableColumnJoin>> {
        &self.table_joins
    }

    pub fn report(&self) -> LineageReport {
        LineageReport {
            dialect: self.dialect,
            involved_tables: self
                .involved_tables
                .iter()
                .map(|table| table.qualified())
                .collect(),
            clean_table_list: self.clean_table_list.clone(),
            table_aliases: self.table_aliases.clone(),
            table_joins: self.table_joins.clone(),
        }
    }
}
