use lazytable::{record, LazyTable, Record, TableConfig, Value};

#[test]
fn expand_types_columns_from_values() -> anyhow::Result<()> {
    let mut t = LazyTable::open_in_memory("t")?;
    t.expand(&record! { "i" => 42, "f" => 3.141, "s" => "magic", "b" => vec![1u8] })?;

    let expected: Vec<&str> = vec!["b", "f", "i", "rowid", "s"];
    assert_eq!(
        t.columns().iter().map(String::as_str).collect::<Vec<_>>(),
        expected
    );

    // Declared types come straight from the values
    let info = t.query("PRAGMA table_info(t)", &[])?;
    let type_of = |name: &str| {
        info.iter()
            .find(|row| row.as_text("name") == Some(name))
            .and_then(|row| row.as_text("type").map(str::to_string))
    };
    assert_eq!(type_of("i").as_deref(), Some("INTEGER"));
    assert_eq!(type_of("f").as_deref(), Some("REAL"));
    assert_eq!(type_of("s").as_deref(), Some("TEXT"));
    assert_eq!(type_of("b").as_deref(), Some("BLOB"));

    t.insert(&record! { "i" => 42, "f" => 3.141, "s" => "magic" })?;
    let row = t.get_one(&record! { "i" => 42 })?.unwrap();
    assert_eq!(row.as_real("f"), Some(3.141));
    assert_eq!(row.as_text("s"), Some("magic"));
    Ok(())
}

#[test]
fn column_names_are_case_insensitive() -> anyhow::Result<()> {
    let mut t = LazyTable::open_in_memory("t")?;
    t.insert(&record! { "Name" => "bob" })?;
    t.insert(&record! { "name" => "alice" })?;

    // Only one column was created
    assert_eq!(t.columns().len(), 2); // rowid + name
    assert_eq!(t.get(&record! { "name" => "alice" })?.len(), 1);
    assert_eq!(t.get(&record! { "NAME" => "bob" })?.len(), 1);
    Ok(())
}

#[test]
fn insert_many_commits_in_batches() -> anyhow::Result<()> {
    let mut t = LazyTable::open_in_memory("t")?;
    let inserted = t.insert_many((0..3000).map(|n| record! { "a" => n }))?;
    assert_eq!(inserted, 3000);

    let rows = t.get(&Record::new())?;
    assert_eq!(rows.len(), 3000);
    assert_eq!(rows[0].as_integer("a"), Some(0));
    assert_eq!(rows[2999].as_integer("a"), Some(2999));
    assert_eq!(rows[2999].rowid(), Some(3000));
    Ok(())
}

#[test]
fn insert_many_expands_schema_mid_stream() -> anyhow::Result<()> {
    let mut t = LazyTable::open_in_memory("t")?;
    let records = vec![
        record! { "a" => 1 },
        record! { "a" => 2, "b" => "late column" },
    ];
    t.insert_many(records)?;
    let row = t.get_one(&record! { "a" => 1 })?.unwrap();
    assert_eq!(row.get("b"), Some(&Value::Null));
    let row = t.get_one(&record! { "a" => 2 })?.unwrap();
    assert_eq!(row.as_text("b"), Some("late column"));
    Ok(())
}

fn index_names(t: &LazyTable) -> anyhow::Result<Vec<String>> {
    let rows = t.query(
        "SELECT name FROM sqlite_master WHERE type = 'index' ORDER BY name",
        &[],
    )?;
    Ok(rows
        .iter()
        .filter_map(|row| row.as_text("name").map(str::to_string))
        .collect())
}

#[test]
fn index_create_and_drop() -> anyhow::Result<()> {
    let mut t = LazyTable::open_in_memory("t")?;
    t.insert(&record! { "a" => 42, "b" => "foo" })?;

    t.index("a")?;
    assert_eq!(index_names(&t)?, vec!["index_t_a".to_string()]);

    t.index_all()?;
    let names = index_names(&t)?;
    assert!(names.contains(&"index_t_b".to_string()));
    assert!(names.contains(&"index_t_rowid".to_string()));

    t.drop_index("a")?;
    assert!(!index_names(&t)?.contains(&"index_t_a".to_string()));

    t.drop_index_all()?;
    assert!(index_names(&t)?.is_empty());

    t.analyze()?;
    Ok(())
}

#[test]
fn index_all_columns_config_indexes_new_columns() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("indexed.db");
    let config = TableConfig::new().with_index_all_columns(true);
    let mut t = LazyTable::open_with_config(&path, "t", config)?;

    t.insert(&record! { "a" => 42 })?;
    assert!(index_names(&t)?.contains(&"index_t_a".to_string()));
    Ok(())
}

#[test]
fn fast_and_unsafe_disables_the_journal() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fast.db");
    let config = TableConfig::new().with_fast_and_unsafe(true);
    let t = LazyTable::open_with_config(&path, "t", config)?;

    let rows = t.query("PRAGMA journal_mode", &[])?;
    assert_eq!(rows[0].as_text("journal_mode"), Some("off"));

    let rows = t.query("PRAGMA synchronous", &[])?;
    assert_eq!(rows[0].as_integer("synchronous"), Some(0));
    Ok(())
}

#[test]
fn file_backed_table_persists_across_handles() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("persist.db");

    let mut t = LazyTable::open(&path, "t")?;
    t.insert(&record! { "name" => "bob", "order" => 42 })?;
    t.close()?;

    let t = LazyTable::open(&path, "t")?;
    let row = t.get_one(&record! { "name" => "bob" })?.unwrap();
    assert_eq!(row.as_integer("order"), Some(42));
    assert!(t.columns().contains("order"));
    Ok(())
}

#[test]
fn refresh_columns_picks_up_external_ddl() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shared.db");

    let mut writer = LazyTable::open(&path, "t")?;
    let mut reader = LazyTable::open(&path, "t")?;

    writer.insert(&record! { "name" => "bob" })?;
    assert!(!reader.columns().contains("name"));

    reader.refresh_columns()?;
    assert!(reader.columns().contains("name"));
    assert_eq!(reader.get(&record! { "name" => "bob" })?.len(), 1);
    Ok(())
}
