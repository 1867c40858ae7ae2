use std::path::Path;
use std::sync::Arc;

use groovy::GroovySupport;
use lsp_core::event_bus::EventBus;
use groovy_lsp_server::{Indexer, SymbolIndex};
use tempfile::TempDir;
use uuid::Uuid;

async fn new_index() -> Arc<SymbolIndex> {
    let db_name = Uuid::new_v4();
    let db_dir = format!("file:{}?mode=memory&cache=shared", db_name);
    Arc::new(SymbolIndex::initialize(&db_dir).await.unwrap())
}

fn new_indexer(index: Arc<SymbolIndex>) -> Indexer {
    let mut indexer = Indexer::new(index, Arc::new(EventBus::new()));
    indexer.register_language("groovy", Arc::new(GroovySupport::new()));
    indexer
}

#[tokio::test]
async fn test_index_single_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("User.groovy");
    std::fs::write(
        &path,
        "package com.example\n\nclass User {\n    String name\n}\n",
    )
    .unwrap();

    let index = new_index().await;
    let indexer = new_indexer(Arc::clone(&index));
    let (symbols, supers) = indexer
        .index_file(&path)
        .expect("indexing failed")
        .expect("file should have produced symbols");
    assert!(supers.is_empty());

    index
        .insert_symbols(&symbols)
        .await
        .expect("insert failed");

    let result = index
        .find_symbol_by_fqn("com.example.User")
        .await
        .expect("query failed");
    let symbol = result.expect("symbol should be found");
    assert_eq!(symbol.short_name, "User");
    assert_eq!(symbol.package_name, "com.example");
    assert_eq!(symbol.symbol_type, "Class");
    assert_eq!(symbol.file_path, path.to_string_lossy());
}

#[tokio::test]
async fn test_index_workspace_search_and_removal() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("Foo.groovy"),
        "class Foo {\n    def bar() {}\n}\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("Baz.groovy"), "class Baz {}\n").unwrap();

    let index = new_index().await;
    let indexer = new_indexer(Arc::clone(&index));
    indexer
        .index_workspace(dir.path(), |_, _| {})
        .await
        .expect("workspace indexing failed");

    let foo_matches = index.search("F", true, 200).await.expect("search failed");
    let foo_names: Vec<_> = foo_matches.iter().map(|s| s.short_name.as_str()).collect();
    assert!(foo_names.contains(&"Foo"));
    assert!(foo_names.contains(&"bar"));

    let baz_matches = index.search("Baz", true, 200).await.expect("search failed");
    assert_eq!(baz_matches.len(), 1);
    assert_eq!(baz_matches[0].short_name, "Baz");

    let foo_path = dir.path().join("Foo.groovy");
    index
        .remove_file(&foo_path.to_string_lossy())
        .await
        .expect("remove failed");

    let foo_matches = index.search("F", true, 200).await.expect("search failed");
    assert!(foo_matches.is_empty());

    let foo_symbols = index
        .file_symbols(&foo_path.to_string_lossy())
        .await
        .expect("query failed");
    assert!(foo_symbols.is_empty());
}

#[tokio::test]
async fn test_index_oversized_file_yields_no_symbols() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Big.groovy");
    // One byte over the 10 MiB cap enforced in `Indexer::index_file`.
    let huge = "x".repeat(10 * 1024 * 1024 + 1);
    std::fs::write(&path, huge).unwrap();

    let index = new_index().await;
    let indexer = new_indexer(index);
    let result = indexer.index_file(&path).expect("indexing should not error");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_index_superclass_mapping() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("Base.groovy"),
        "class Base {}\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("Child.groovy"),
        "class Child extends Base {}\n",
    )
    .unwrap();

    let index = new_index().await;
    let indexer = new_indexer(Arc::clone(&index));
    indexer
        .index_workspace(dir.path(), |_, _| {})
        .await
        .expect("workspace indexing failed");

    let impls = index
        .find_super_impls_by_short_name("Base")
        .await
        .expect("query failed");
    assert!(impls.iter().any(|s| s.short_name == "Child"));
}
