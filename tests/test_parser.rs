use sqlin::{
    dialect::Dialect,
    parser::extract_clauses,
    test_utils::{PARSING_TESTS_FILE, TestParsingData},
};

fn test_sql(sql: &str) {
    let clauses = extract_clauses(sql, Dialect::Ansi);
    if let Err(err) = &clauses {
        println!("{}", err)
    }
    assert!(clauses.is_ok());
}

#[test]
fn test_should_parse() {
    let parsing_test_file =
        std::fs::read_to_string(PARSING_TESTS_FILE).expect("Cannot open parsing test cases");
    let test_parsing_data: TestParsingData =
        toml::from_str(&parsing_test_file).expect("Cannot parse test cases defined in toml");

    for test in test_parsing_data.tests {
        let sql = &test.sql;
        println!("Testing parsing for SQL: {}", sql);
        test_sql(sql);
        test_sql(&sql.to_uppercase());
        test_sql(&sql.to_lowercase());
    }
}

#[test]
fn test_should_not_parse() {
    let sqls = [
        // FROM without a source
        "select a from",
        // No SELECT body at all
        "update t set a = 1",
        // Unterminated subquery
        "select a from (select b from t",
        // Backticks do not quote identifiers in the default dialect
        "select `a` from foo",
        // Empty select list
        "select from foo",
        // JOIN without a source
        "select a from foo join on foo.x = 1",
        // Dangling dot in a table path
        "select a from db.",
    ];
    for sql in sqls {
        println!("Testing parsing error for SQL: {}", sql);
        assert!(extract_clauses(sql, Dialect::Ansi).is_err())
    }
}

#[test]
fn test_extracted_clause_shapes() {
    let clauses = extract_clauses(
        "select f.a from foo f join bar b on f.a = b.a where f.c = 1",
        Dialect::Ansi,
    )
    .unwrap();
    assert_eq!(clauses.select_items.len(), 1);
    assert_eq!(clauses.from_items.len(), 1);
    assert_eq!(clauses.join_items.len(), 1);
    assert!(clauses.where_predicate.is_some());
}
