use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// SQL dialect hint. It only drives identifier-quoting rules in the scanner;
/// the cleaning rules are dialect-independent because each quirk is inert on
/// dialects that cannot produce it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Dialect {
    #[default]
    Ansi,
    Bigquery,
    Hive,
    Mssql,
    Mysql,
    Snowflake,
}

impl Dialect {
    /// Double quotes delimit identifiers rather than string literals.
    pub(crate) fn double_quoted_identifiers(&self) -> bool {
        matches!(self, Dialect::Ansi | Dialect::Mssql | Dialect::Snowflake)
    }

    /// Backticks delimit identifiers.
    pub(crate) fn backtick_identifiers(&self) -> bool {
        matches!(self, Dialect::Bigquery | Dialect::Hive | Dialect::Mysql)
    }

    /// Square brackets delimit identifiers (T-SQL).
    pub(crate) fn bracket_identifiers(&self) -> bool {
        matches!(self, Dialect::Mssql)
    }
}
