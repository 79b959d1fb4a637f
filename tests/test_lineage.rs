use std::collections::{HashMap, HashSet};

use sqlin::{
    dialect::Dialect,
    lineage::LineageParser,
    test_utils::{LINEAGE_TESTS_FILE, TestColumn, TestJoin, TestLineageData},
};

fn load_lineage_data() -> TestLineageData {
    let lineage_data_file =
        std::fs::read_to_string(LINEAGE_TESTS_FILE).expect("Cannot open lineage test cases");
    toml::from_str(&lineage_data_file).expect("Cannot parse test cases defined in toml")
}

#[test]
fn test_lineage() {
    for test in load_lineage_data().tests {
        println!("Testing lineage for SQL: {}", &test.sql);
        let dialect = test.dialect.unwrap_or_default();
        let parser = LineageParser::with_dialect(&test.sql, dialect)
            .unwrap_or_else(|err| panic!("Could not extract lineage due to: {:?}", &err));

        let involved = parser
            .involved_tables()
            .iter()
            .map(|table| table.qualified())
            .collect::<HashSet<_>>();
        assert_eq!(involved, test.involved_tables.iter().cloned().collect());

        let clean_tables = parser
            .clean_table_list()
            .iter()
            .cloned()
            .collect::<HashSet<_>>();
        assert_eq!(clean_tables, test.clean_table_list.iter().cloned().collect());

        let aliases = parser
            .table_aliases()
            .iter()
            .map(|(alias, table)| (alias.clone(), table.clone()))
            .collect::<HashMap<_, _>>();
        assert_eq!(aliases, test.table_aliases);

        // Every record's source table is the key it is grouped under.
        for (table, records) in parser.table_joins() {
            for record in records {
                assert_eq!(&record.table_column.table, table);
            }
        }

        let joins = parser
            .table_joins()
            .iter()
            .map(|(table, records)| {
                (
                    table.clone(),
                    records
                        .iter()
                        .map(|record| TestJoin {
                            column: record.table_column.column.clone(),
                            joined_with: record
                                .joined_with
                                .iter()
                                .map(|target| TestColumn {
                                    table: target.table.clone(),
                                    column: target.column.clone(),
                                })
                                .collect(),
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect::<HashMap<_, _>>();
        assert_eq!(joins, test.joins);
    }
}

#[test]
fn test_cleaning() {
    for test in load_lineage_data().cleaning {
        println!("Testing cleaning for SQL: {}", &test.raw);
        assert_eq!(LineageParser::clean_raw_query(&test.raw), test.cleaned);
    }
}

#[test]
fn test_bulk_copy_yields_empty_views() {
    let parser =
        LineageParser::new("COPY my_schema.my_table FROM 's3://bucket/path/object.csv';").unwrap();
    assert!(parser.involved_tables().is_empty());
    assert!(parser.clean_table_list().is_empty());
    assert!(parser.table_aliases().is_empty());
    assert!(parser.table_joins().is_empty());
}

#[test]
fn test_unparsable_sql_fails_construction() {
    assert!(LineageParser::new("update t set a = 1").is_err());
}

#[test]
fn test_dialect_quoting() {
    let sql = "select t.a from `My Table` t";
    let parser = LineageParser::with_dialect(sql, Dialect::Bigquery).unwrap();
    assert!(parser.clean_table_list().contains("My Table"));
    assert!(LineageParser::with_dialect(sql, Dialect::Ansi).is_err());
}

#[test]
fn test_mssql_bracket_identifiers() {
    let parser = LineageParser::with_dialect(
        "select o.id from [dbo].[Orders] o join dbo.customers c on o.cust_id = c.id",
        Dialect::Mssql,
    )
    .unwrap();
    assert!(parser.clean_table_list().contains("dbo.Orders"));
    assert_eq!(parser.table_joins()["dbo.Orders"][0].joined_with[0].column, "id");
}

#[test]
fn test_double_quotes_read_as_strings_in_mysql() {
    let parser =
        LineageParser::with_dialect(r#"select a from foo where a = "x""#, Dialect::Mysql).unwrap();
    assert_eq!(parser.clean_table_list().len(), 1);
    assert!(parser.table_joins().is_empty());
}
