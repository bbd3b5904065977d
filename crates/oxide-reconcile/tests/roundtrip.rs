//! Parser/generator round-trips and comparer laws.

use oxide_reconcile::parser::split_column_definitions;
use oxide_reconcile::prelude::*;

fn domains() -> Vec<Domain> {
    vec![
        Domain::new("D_ID", "INTEGER").not_null(),
        Domain::new("D_BIG", "BIGINT"),
        Domain::new("D_FLAG", "BOOLEAN").default("FALSE"),
        Domain::new("D_NAME", "VARCHAR(100)").default("'n/a'").not_null(),
        Domain::new("D_PRICE", "DECIMAL(10,2)").default("0.00"),
        Domain::new("D_RATIO", "DOUBLE PRECISION"),
        Domain::new("D_CODE", "CHAR(3)"),
        Domain::new("D_CREATED", "TIMESTAMP").default("CURRENT_TIMESTAMP").not_null(),
        Domain::new("D_DAY", "DATE"),
        Domain::new("D_NOTES", "BLOB"),
        Domain::new("D_SEP", "CHAR(1)").default("';'"),
        Domain::new("D_AT", "TIMESTAMP(3) WITH TIME ZONE").not_null(),
        Domain::new("D_TAGS", "TEXT[]").default("'{}'"),
    ]
}

#[test]
fn test_domain_round_trip() {
    for domain in domains() {
        let script = generate_domain_script(&domain);
        let parsed = parse_domain(&script).unwrap_or_else(|e| panic!("{script}: {e}"));
        assert_eq!(parsed, domain, "round trip of {script}");
    }
}

#[test]
fn test_table_round_trip() {
    let table = Table::new("ORDER_LINES")
        .column(Column::with_domain("ID", "D_ID").not_null())
        .column(Column::with_type("PRICE", "DECIMAL(10,2)").not_null())
        .column(Column::with_type("QTY", "INTEGER").default("1"))
        .column(Column::with_domain("NOTE", "D_NOTES"))
        .column(Column::with_type("SHIPPED", "DATE"))
        .column(Column::with_type("SHIPPED_AT", "TIMESTAMP WITH TIME ZONE"))
        .column(Column::with_type("CODES", "VARCHAR(5)[]").default("'{a;b}'").not_null());

    let script = generate_table_script(&table).unwrap();
    let parsed = parse_table(&script).unwrap();

    assert_eq!(parsed.name, table.name);
    assert_eq!(parsed.columns.len(), table.columns.len());
    for (parsed, original) in parsed.columns.iter().zip(&table.columns) {
        assert_eq!(parsed.name, original.name);
        assert_eq!(parsed.position, original.position);
        assert_eq!(parsed.nullable, original.nullable);
        assert_eq!(parsed.column_type, original.column_type);
        assert_eq!(parsed.default, original.default);
    }
}

#[test]
fn test_compare_domains_with_itself_is_empty() {
    let domains = domains();
    let changes = compare_domains(&domains, &domains);
    assert!(changes.to_create.is_empty());
    assert!(changes.to_alter.is_empty());
}

#[test]
fn test_compare_tables_with_itself_is_empty() {
    let tables = vec![
        Table::new("USERS")
            .column(Column::with_domain("ID", "D_ID").not_null())
            .column(Column::with_type("EMAIL", "VARCHAR(255)")),
        Table::new("ROLES").column(Column::with_type("NAME", "VARCHAR(50)").default("'user'")),
    ];
    assert!(compare_tables(&tables, &tables).is_empty());
}

#[test]
fn test_drop_not_null_is_the_only_change() {
    let existing = parse_domain("CREATE DOMAIN D_ID AS INTEGER NOT NULL;").unwrap();
    let desired = parse_domain("CREATE DOMAIN D_ID AS INTEGER;").unwrap();

    let changes = compare_domains(&[existing], &[desired]);
    assert!(changes.to_create.is_empty());
    let statements: Vec<String> = changes
        .to_alter
        .iter()
        .flat_map(|a| a.statements())
        .collect();
    assert_eq!(statements, vec!["ALTER DOMAIN D_ID DROP NOT NULL"]);
}

#[test]
fn test_new_column_is_an_add_not_a_create() {
    let existing = parse_table("CREATE TABLE USERS (ID INTEGER);").unwrap();
    let desired = parse_table("CREATE TABLE USERS (ID INTEGER, NAME VARCHAR(100));").unwrap();

    let changes = compare_tables(&[existing], &[desired]);
    assert!(changes.to_create.is_empty());
    assert_eq!(changes.to_alter.len(), 1);
    assert_eq!(changes.to_alter[0].columns_to_add.len(), 1);
    assert_eq!(changes.to_alter[0].columns_to_add[0].name.as_str(), "NAME");
}

#[test]
fn test_split_keeps_type_parameters_together() {
    let parts = split_column_definitions("PRICE DECIMAL(10,2) NOT NULL, QTY INTEGER");
    assert_eq!(parts, vec!["PRICE DECIMAL(10,2) NOT NULL", "QTY INTEGER"]);
}
