use tinyrdb::storage::Value;
use tinyrdb::{Database, Error, QueryResult};

fn run(db: &mut Database, sql: &str) -> QueryResult {
    db.execute_sql(sql)
        .unwrap_or_else(|e| panic!("{sql} failed: {e}"))
}

fn column(result: &QueryResult, name: &str) -> Vec<Value> {
    result
        .rows
        .iter()
        .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

fn blog() -> Database {
    let mut db = Database::new();
    run(
        &mut db,
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT UNIQUE)",
    );
    run(
        &mut db,
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, title TEXT, score FLOAT)",
    );
    run(&mut db, "INSERT INTO users VALUES (1, 'Alice', 'alice@example.com')");
    run(&mut db, "INSERT INTO users VALUES (2, 'Bob', 'bob@example.com')");
    run(&mut db, "INSERT INTO users (id, name) VALUES (3, 'Carol')");
    run(&mut db, "INSERT INTO posts VALUES (10, 1, 'Hello', 4.5)");
    run(&mut db, "INSERT INTO posts VALUES (11, 2, 'Rust', 3)");
    run(&mut db, "INSERT INTO posts VALUES (12, 1, 'Again', NULL)");
    db
}

#[test]
fn test_join_users_posts() {
    let mut db = blog();

    let result = run(
        &mut db,
        "SELECT * FROM users JOIN posts ON users.id = posts.user_id",
    );
    assert_eq!(result.rows.len(), 3);
    assert_eq!(
        column(&result, "users.name"),
        vec![Value::from("Alice"), Value::from("Alice"), Value::from("Bob")]
    );
    assert_eq!(
        column(&result, "posts.title"),
        vec![Value::from("Hello"), Value::from("Again"), Value::from("Rust")]
    );

    let result = run(
        &mut db,
        "SELECT users.name, posts.title FROM users JOIN posts ON users.id = posts.user_id \
         WHERE posts.title = 'Rust'",
    );
    assert_eq!(result.columns, vec!["users.name", "posts.title"]);
    assert_eq!(column(&result, "users.name"), vec![Value::from("Bob")]);
}

#[test]
fn test_delete_then_select() {
    let mut db = blog();

    let result = run(&mut db, "DELETE FROM users WHERE id = 2");
    assert_eq!(result.affected_rows, 1);

    let result = run(&mut db, "SELECT * FROM users WHERE id = 2");
    assert!(result.rows.is_empty());

    let result = run(&mut db, "SELECT id FROM users");
    assert_eq!(column(&result, "id"), vec![Value::Integer(1), Value::Integer(3)]);

    // The key is free again
    run(&mut db, "INSERT INTO users VALUES (2, 'Bobby', NULL)");
    let result = run(&mut db, "SELECT name FROM users WHERE id = 2");
    assert_eq!(column(&result, "name"), vec![Value::from("Bobby")]);
}

#[test]
fn test_drop_then_table_not_found() {
    let mut db = blog();
    run(&mut db, "DROP TABLE posts");

    for sql in [
        "SELECT * FROM posts",
        "INSERT INTO posts VALUES (1, 1, 'x', 1.0)",
        "DROP TABLE posts",
    ] {
        assert!(
            matches!(db.execute_sql(sql), Err(Error::TableNotFound(ref t)) if t == "posts"),
            "{sql}"
        );
    }

    // The name can be reused
    run(&mut db, "CREATE TABLE posts (id INTEGER)");
    assert_eq!(db.list_tables(), vec!["posts", "users"]);
}

#[test]
fn test_unique_and_not_null() {
    let mut db = blog();

    assert!(matches!(
        db.execute_sql("INSERT INTO users VALUES (1, 'Dup', NULL)"),
        Err(Error::UniqueConstraintViolation { ref column, .. }) if column == "id"
    ));
    assert!(matches!(
        db.execute_sql("INSERT INTO users VALUES (4, 'Dup', 'bob@example.com')"),
        Err(Error::UniqueConstraintViolation { ref column, .. }) if column == "email"
    ));
    assert!(matches!(
        db.execute_sql("INSERT INTO users (id) VALUES (5)"),
        Err(Error::NullConstraintViolation(ref c)) if c == "name"
    ));
    assert!(matches!(
        db.execute_sql("INSERT INTO users VALUES (NULL, 'NoKey', NULL)"),
        Err(Error::NullConstraintViolation(ref c)) if c == "id"
    ));

    // Nothing was added by the failed inserts
    assert_eq!(db.table("users").unwrap().len(), 3);

    // Several NULLs in a UNIQUE column are fine
    run(&mut db, "INSERT INTO users (id, name) VALUES (6, 'Dave')");
}

#[test]
fn test_type_checks() {
    let mut db = blog();

    assert!(matches!(
        db.execute_sql("INSERT INTO users VALUES ('one', 'x', NULL)"),
        Err(Error::TypeMismatch { ref column, .. }) if column == "id"
    ));
    assert!(matches!(
        db.execute_sql("UPDATE posts SET score = 'high'"),
        Err(Error::TypeMismatch { .. })
    ));

    // Integers widen into FLOAT columns and match either spelling
    let result = run(&mut db, "SELECT title FROM posts WHERE score = 3.0");
    assert_eq!(column(&result, "title"), vec![Value::from("Rust")]);
    let result = run(&mut db, "SELECT score FROM posts WHERE id = 11");
    assert_eq!(column(&result, "score"), vec![Value::Float(3.0)]);
}

#[test]
fn test_insert_select_round_trip_order() {
    let mut db = Database::new();
    run(&mut db, "CREATE TABLE t (id INTEGER, label TEXT, ok BOOLEAN)");

    let mut expected = Vec::new();
    for i in [5, 3, 9, 1, 7] {
        run(
            &mut db,
            &format!("INSERT INTO t VALUES ({}, 'row{}', {})", i, i, i % 2 == 1),
        );
        expected.push(Value::Integer(i));
    }

    let result = run(&mut db, "SELECT * FROM t");
    assert_eq!(result.columns, vec!["id", "label", "ok"]);
    assert_eq!(column(&result, "id"), expected);
    assert_eq!(result.rows[0].get("label"), Some(&Value::from("row5")));
    assert_eq!(result.rows[0].get("ok"), Some(&Value::Boolean(true)));
}

#[test]
fn test_select_is_idempotent() {
    let mut db = blog();
    let first = run(&mut db, "SELECT * FROM posts WHERE score >= 3");
    let second = run(&mut db, "SELECT * FROM posts WHERE score >= 3");
    assert_eq!(first, second);
    assert_eq!(first.rows.len(), 2);
}

#[test]
fn test_index_and_scan_agree() {
    let mut db = blog();
    run(&mut db, "CREATE INDEX idx_posts_user ON posts (user_id)");

    let indexed = run(&mut db, "SELECT id FROM posts WHERE user_id = 1");
    assert_eq!(column(&indexed, "id"), vec![Value::Integer(10), Value::Integer(12)]);

    run(&mut db, "UPDATE posts SET user_id = 2 WHERE id = 12");
    let indexed = run(&mut db, "SELECT id FROM posts WHERE user_id = 2");
    let scanned = run(&mut db, "SELECT id FROM posts WHERE user_id >= 2");
    assert_eq!(indexed.rows, scanned.rows);
    assert_eq!(column(&indexed, "id"), vec![Value::Integer(11), Value::Integer(12)]);

    run(&mut db, "DELETE FROM posts WHERE user_id = 2");
    assert!(run(&mut db, "SELECT * FROM posts WHERE user_id = 2").rows.is_empty());
    assert_eq!(db.table("posts").unwrap().len(), 1);
}

#[test]
fn test_float_key_index_and_scan_agree() {
    let mut db = Database::new();
    run(&mut db, "CREATE TABLE p (price FLOAT PRIMARY KEY, tag TEXT)");
    run(&mut db, "CREATE TABLE q (price FLOAT, tag TEXT)");
    for table in ["p", "q"] {
        run(&mut db, &format!("INSERT INTO {table} VALUES (0.0, 'zero')"));
        run(&mut db, &format!("INSERT INTO {table} VALUES (2.5, 'other')"));
    }

    assert!(matches!(
        db.execute_sql("INSERT INTO p VALUES (-0.0, 'negative')"),
        Err(Error::UniqueConstraintViolation { ref column, .. }) if column == "price"
    ));
    run(&mut db, "INSERT INTO q VALUES (-0.0, 'negative')");

    let indexed = run(&mut db, "SELECT tag FROM p WHERE price = -0.0");
    let scanned = run(&mut db, "SELECT tag FROM p WHERE price <= 0");
    assert_eq!(indexed.rows, scanned.rows);
    assert_eq!(column(&indexed, "tag"), vec![Value::from("zero")]);

    // Without an index the same rows come back, stored as plain zero
    let plain = run(&mut db, "SELECT price FROM q WHERE price = 0.0");
    assert_eq!(plain.rows.len(), 2);
    assert!(column(&plain, "price")
        .iter()
        .all(|v| matches!(v, Value::Float(f) if f.to_bits() == 0.0f64.to_bits())));
}

#[test]
fn test_update_stops_at_unique_conflict() {
    let mut db = Database::new();
    run(&mut db, "CREATE TABLE codes (id INTEGER PRIMARY KEY, code TEXT UNIQUE)");
    run(&mut db, "INSERT INTO codes VALUES (1, NULL)");
    run(&mut db, "INSERT INTO codes VALUES (2, NULL)");

    // The first row takes the value, the second collides with it
    assert!(matches!(
        db.execute_sql("UPDATE codes SET code = 'X'"),
        Err(Error::UniqueConstraintViolation { .. })
    ));
    let result = run(&mut db, "SELECT code FROM codes");
    assert_eq!(column(&result, "code"), vec![Value::from("X"), Value::Null]);
}

#[test]
fn test_syntax_errors() {
    let mut db = blog();
    for sql in [
        "SELEC * FROM users",
        "SELECT * FROM users WHERE id = 1 OR id = 2",
        "SELECT * FROM users JOIN posts ON users.id = user_id",
        "INSERT INTO users VALUES (1, 'unterminated)",
        "",
    ] {
        assert!(
            matches!(db.execute_sql(sql), Err(Error::SyntaxError { .. })),
            "{sql:?}"
        );
    }
}
