//! # sqlin
//!
//! A library for extracting table-level and column-join lineage from raw SQL query text.
//!
//! # Features
//!
//! - Clean raw query text with an ordered set of rewrite rules (escaped newlines, Snowflake `COPY GRANTS`, `MERGE` statements, bulk `COPY` loads).
//! - Extract the tables a statement reads from, with and without a `<default>.` schema placeholder.
//! - Map every alias (and unaliased bare table name) back to the table it binds.
//! - Recover column-level join relations from `ON`, `USING` and `WHERE` predicates, grouped by join source.
//! - Honor per-dialect quoting so `"x"`, `` `x` `` and `[x]` identifiers resolve the way their dialect reads them.
//!
//! # Example
//!
//! ```rust,no_run
//! use sqlin::{dialect::Dialect, lineage::LineageParser};
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!
//!     let sql = r#"
//!         select f.col1, g.col2
//!         from foo f
//!         inner join db.grault g on f.col1 = g.col1
//!         where f.col2 = g.col3
//!     "#;
//!     let lineage = LineageParser::with_dialect(sql, Dialect::Ansi)?;
//!
//!     println!("Involved tables: {:?}", lineage.involved_tables());
//!     println!("Clean table list: {:?}", lineage.clean_table_list());
//!     println!("Aliases: {:?}", lineage.table_aliases());
//!     println!("Joins: {:?}", lineage.table_joins());
//!     Ok(())
//! }
//! ```
pub mod ast;
mod cleaner;
pub mod dialect;
pub mod lineage;
pub mod parser;
pub mod scanner;
pub mod test_utils;
