use std::fs;

use tinyrdb::storage::{JsonStore, SnapshotStore, TableSnapshot, Value};
use tinyrdb::{Database, DatabaseConfig, Error};

fn open(dir: &std::path::Path) -> Database {
    Database::open(DatabaseConfig::new().data_dir(dir)).unwrap()
}

#[test]
fn test_reopen_restores_tables_rows_and_indexes() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut db = open(dir.path());
        db.execute_sql("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, score FLOAT)")
            .unwrap();
        db.execute_sql("INSERT INTO users VALUES (1, 'Alice', 9.5)").unwrap();
        db.execute_sql("INSERT INTO users VALUES (2, 'Bob', NULL)").unwrap();
        db.execute_sql("CREATE INDEX idx_name ON users (name)").unwrap();
        db.execute_sql("UPDATE users SET score = 7 WHERE id = 2").unwrap();
        assert!(dir.path().join("users.json").exists());
    }

    let mut db = open(dir.path());
    assert_eq!(db.list_tables(), vec!["users"]);

    let table = db.table("users").unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.index("name").is_some());

    let result = db.execute_sql("SELECT score FROM users WHERE name = 'Bob'").unwrap();
    assert_eq!(result.rows[0].get("score"), Some(&Value::Float(7.0)));

    // Constraints still hold after the restart
    assert!(matches!(
        db.execute_sql("INSERT INTO users VALUES (1, 'Again', NULL)"),
        Err(Error::UniqueConstraintViolation { .. })
    ));
}

#[test]
fn test_drop_removes_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open(dir.path());

    db.execute_sql("CREATE TABLE t (id INTEGER)").unwrap();
    assert!(dir.path().join("t.json").exists());

    db.execute_sql("DROP TABLE t").unwrap();
    assert!(!dir.path().join("t.json").exists());
    assert!(open(dir.path()).list_tables().is_empty());
}

#[test]
fn test_failed_statements_do_not_touch_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open(dir.path());
    db.execute_sql("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
    db.execute_sql("INSERT INTO t VALUES (1)").unwrap();

    let path = dir.path().join("t.json");
    let before = fs::read_to_string(&path).unwrap();
    assert!(db.execute_sql("INSERT INTO t VALUES (1)").is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_unwritable_store_rolls_back_ddl() {
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    let mut db = open(&data);
    db.execute_sql("CREATE TABLE keep (id INTEGER)").unwrap();

    // Swap the data directory for a plain file so every write fails
    fs::remove_dir_all(&data).unwrap();
    fs::write(&data, b"not a directory").unwrap();

    assert!(matches!(
        db.execute_sql("CREATE TABLE t (id INTEGER)"),
        Err(Error::Io(_))
    ));
    assert_eq!(db.list_tables(), vec!["keep"]);
    assert!(matches!(
        db.execute_sql("CREATE TABLE t (id INTEGER)"),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_partial_update_is_persisted() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut db = open(dir.path());
        db.execute_sql("CREATE TABLE c (id INTEGER PRIMARY KEY, code TEXT UNIQUE)")
            .unwrap();
        db.execute_sql("INSERT INTO c VALUES (1, NULL)").unwrap();
        db.execute_sql("INSERT INTO c VALUES (2, NULL)").unwrap();
        assert!(db.execute_sql("UPDATE c SET code = 'X'").is_err());
    }

    let mut db = open(dir.path());
    let result = db.execute_sql("SELECT code FROM c WHERE id = 1").unwrap();
    assert_eq!(result.rows[0].get("code"), Some(&Value::from("X")));
}

#[test]
fn test_invalid_snapshot_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();

    let mut db = Database::new();
    db.execute_sql("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
    db.execute_sql("INSERT INTO t VALUES (1)").unwrap();
    let mut snapshot: TableSnapshot = db.snapshot("t").unwrap();
    snapshot.rows.push(snapshot.rows[0].clone());
    store.save(&snapshot).unwrap();

    assert!(matches!(
        Database::open(DatabaseConfig::new().data_dir(dir.path())),
        Err(Error::UniqueConstraintViolation { .. })
    ));
}

#[test]
fn test_memory_database_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = Database::open(DatabaseConfig::new()).unwrap();
    db.execute_sql("CREATE TABLE t (id INTEGER)").unwrap();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
