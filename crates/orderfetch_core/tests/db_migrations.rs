use orderfetch_core::db::migrations::latest_version;
use orderfetch_core::db::seed::{insert_order, NewOrder, NewOrderLine};
use orderfetch_core::db::{open_db, open_db_in_memory, DbError};
use orderfetch_core::Address;
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["members", "items", "deliveries", "orders", "order_items"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "order_items");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn deleting_an_order_cascades_to_its_lines() {
    let mut conn = open_db_in_memory().unwrap();
    let order = NewOrder::new(
        "userA",
        Address::new("Seoul", "1", "1111"),
        1,
        vec![NewOrderLine::new("JPA1 BOOK", 10_000, 1)],
    );
    let order_id = insert_order(&mut conn, &order).unwrap();

    conn.execute("DELETE FROM orders WHERE id = ?1;", [order_id])
        .unwrap();
    let lines: i64 = conn
        .query_row("SELECT COUNT(*) FROM order_items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(lines, 0);
}

#[test]
fn fixture_orders_without_lines_are_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let order = NewOrder::new("userA", Address::new("Seoul", "1", "1111"), 1, Vec::new());

    let err = insert_order(&mut conn, &order).unwrap_err();
    assert!(matches!(err, DbError::InvalidFixture(_)));
    let orders: i64 = conn
        .query_row("SELECT COUNT(*) FROM orders;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orders, 0);
}

#[test]
fn fixture_members_and_items_are_reused_by_name() {
    let mut conn = open_db_in_memory().unwrap();
    let address = Address::new("Seoul", "1", "1111");
    for _ in 0..2 {
        let order = NewOrder::new(
            "userA",
            address.clone(),
            1,
            vec![NewOrderLine::new("JPA1 BOOK", 10_000, 1)],
        );
        insert_order(&mut conn, &order).unwrap();
    }

    assert_eq!(count_rows(&conn, "members"), 1);
    assert_eq!(count_rows(&conn, "items"), 1);
    assert_eq!(count_rows(&conn, "deliveries"), 2);
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
