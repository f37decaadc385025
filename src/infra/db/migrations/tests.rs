use super::*;

fn memory_conn() -> Connection {
    Connection::open_in_memory().expect("in-memory sqlite")
}

fn table_exists(conn: &Connection, name: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .expect("sqlite_master query")
        > 0
}

#[test]
fn fresh_install_lands_on_latest_version() {
    let mut conn = memory_conn();
    apply_migrations(&mut conn).expect("migrations");

    let version = read_user_version(&conn).expect("user_version");
    assert_eq!(version, LATEST_SCHEMA_VERSION);
    assert!(table_exists(&conn, "auth_session"));
    assert!(table_exists(&conn, "agent_sessions"));
}

#[test]
fn migrations_are_idempotent_across_restarts() {
    let mut conn = memory_conn();
    apply_migrations(&mut conn).expect("first run");
    apply_migrations(&mut conn).expect("second run");

    let version = read_user_version(&conn).expect("user_version");
    assert_eq!(version, LATEST_SCHEMA_VERSION);
}

#[test]
fn v1_install_is_upgraded_to_v2() {
    let mut conn = memory_conn();
    super::baseline_v1::create_baseline_v1(&mut conn).expect("baseline");
    assert_eq!(read_user_version(&conn).expect("user_version"), 1);
    assert!(!table_exists(&conn, "agent_sessions"));

    apply_migrations(&mut conn).expect("upgrade");
    assert_eq!(
        read_user_version(&conn).expect("user_version"),
        LATEST_SCHEMA_VERSION
    );
    assert!(table_exists(&conn, "agent_sessions"));
}

#[test]
fn future_schema_version_is_rejected() {
    let mut conn = memory_conn();
    conn.pragma_update(None, "user_version", MAX_COMPAT_SCHEMA_VERSION + 1)
        .expect("set user_version");

    let err = apply_migrations(&mut conn).expect_err("should reject");
    assert!(err.to_string().contains("unsupported sqlite schema version"));
}

#[test]
fn dev_build_version_is_normalized_back_to_latest() {
    let mut conn = memory_conn();
    apply_migrations(&mut conn).expect("initial");
    conn.pragma_update(None, "user_version", LATEST_SCHEMA_VERSION + 1)
        .expect("bump user_version");

    apply_migrations(&mut conn).expect("normalize");
    assert_eq!(
        read_user_version(&conn).expect("user_version"),
        LATEST_SCHEMA_VERSION
    );
}
