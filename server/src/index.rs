use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;

use crate::models::{
    external_symbol::ExternalSymbol,
    symbol::Symbol,
    symbol_super_mapping::SymbolSuperMapping,
};

/// Workspace-scoped symbol store backed by SQLite. A single writer (the
/// indexer) and many concurrent readers (query handlers) share one pool in
/// WAL mode; `search` results are memoized in a small in-process cache keyed
/// by the literal query string, invalidated whenever the index is written to.
pub struct SymbolIndex {
    pool: SqlitePool,
    search_cache: DashMap<String, Arc<Vec<Symbol>>>,
}

impl SymbolIndex {
    pub async fn initialize(path: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path)).await?;
        sqlx::query("PRAGMA journal_mode = WAL;")
            .execute(&pool)
            .await?;
        sqlx::migrate!("../migrations").run(&pool).await?;
        Ok(Self {
            pool,
            search_cache: DashMap::new(),
        })
    }

    fn invalidate_search_cache(&self) {
        self.search_cache.clear();
    }

    pub async fn insert_symbols(&self, symbols: &[Symbol]) -> Result<(), sqlx::Error> {
        if symbols.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for s in symbols {
            sqlx::query(
                "INSERT INTO symbols (short_name, package_name, fully_qualified_name, parent_name,
             file_path, file_type, symbol_type, modifiers, line_start, line_end,
             char_start, char_end, ident_line_start, ident_line_end, ident_char_start,
             ident_char_end, metadata, last_modified)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&s.short_name)
            .bind(&s.package_name)
            .bind(&s.fully_qualified_name)
            .bind(&s.parent_name)
            .bind(&s.file_path)
            .bind(&s.file_type)
            .bind(&s.symbol_type)
            .bind(&s.modifiers)
            .bind(s.line_start)
            .bind(s.line_end)
            .bind(s.char_start)
            .bind(s.char_end)
            .bind(s.ident_line_start)
            .bind(s.ident_line_end)
            .bind(s.ident_char_start)
            .bind(s.ident_char_end)
            .bind(&s.metadata)
            .bind(s.last_modified)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        self.invalidate_search_cache();
        Ok(())
    }

    pub async fn insert_external_symbols(&self, symbols: &[ExternalSymbol]) -> Result<(), sqlx::Error> {
        if symbols.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for s in symbols {
            sqlx::query(
                "INSERT INTO external_symbols (jar_path, source_file_path, short_name,
             package_name, fully_qualified_name, parent_name, file_type, symbol_type, modifiers,
             line_start, line_end, char_start, char_end, ident_line_start, ident_line_end,
             ident_char_start, ident_char_end, needs_decompilation, metadata, last_modified)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&s.jar_path)
            .bind(&s.source_file_path)
            .bind(&s.short_name)
            .bind(&s.package_name)
            .bind(&s.fully_qualified_name)
            .bind(&s.parent_name)
            .bind(&s.file_type)
            .bind(&s.symbol_type)
            .bind(&s.modifiers)
            .bind(s.line_start)
            .bind(s.line_end)
            .bind(s.char_start)
            .bind(s.char_end)
            .bind(s.ident_line_start)
            .bind(s.ident_line_end)
            .bind(s.ident_char_start)
            .bind(s.ident_char_end)
            .bind(s.needs_decompilation)
            .bind(&s.metadata)
            .bind(s.last_modified)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// `mappings` is (symbol_fqn, super_short_name, super_fqn); shared shape
    /// for both superclass and implemented-interface edges.
    pub async fn insert_symbol_super_mappings(
        &self,
        mappings: Vec<(&str, &str, Option<&str>)>,
    ) -> Result<(), sqlx::Error> {
        if mappings.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for (symbol_fqn, super_short_name, super_fqn) in mappings {
            sqlx::query(
                "INSERT INTO symbol_super_mappings (symbol_fqn, super_short_name, super_fqn)
                 VALUES (?, ?, ?)",
            )
            .bind(symbol_fqn)
            .bind(super_short_name)
            .bind(super_fqn)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Removes every symbol that came from `file_path`, for re-indexing on
    /// save/delete. Runs in one transaction with the `files` row drop so a
    /// crash mid-reindex can't leave a stale file record pointing at
    /// symbols that were already removed (or vice versa).
    pub async fn remove_file(&self, file_path: &str) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM symbols WHERE file_path = ?")
            .bind(file_path)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM files WHERE file_path = ?")
            .bind(file_path)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        self.invalidate_search_cache();
        Ok(())
    }

    /// Records (or refreshes) the file record for `file_path`, used to skip
    /// re-parsing unchanged files on a warm workspace re-open.
    pub async fn upsert_file(
        &self,
        file_path: &str,
        content_hash: &str,
        last_indexed: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO files (file_path, content_hash, last_indexed) VALUES (?, ?, ?)
             ON CONFLICT(file_path) DO UPDATE SET content_hash = excluded.content_hash,
                last_indexed = excluded.last_indexed",
        )
        .bind(file_path)
        .bind(content_hash)
        .bind(last_indexed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The content hash recorded the last time `file_path` was indexed, if
    /// any -- lets the workspace indexer skip re-parsing a file whose
    /// content hasn't changed since.
    pub async fn file_content_hash(&self, file_path: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT content_hash FROM files WHERE file_path = ?")
                .bind(file_path)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(hash,)| hash))
    }

    /// Records (or refreshes) the dependency record for `artifact_path`,
    /// so a warm re-open can skip re-scanning an unchanged JAR.
    pub async fn upsert_dependency(
        &self,
        artifact_path: &str,
        coordinates: Option<&str>,
        last_scanned: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO dependencies (artifact_path, coordinates, last_scanned) VALUES (?, ?, ?)
             ON CONFLICT(artifact_path) DO UPDATE SET coordinates = excluded.coordinates,
                last_scanned = excluded.last_scanned",
        )
        .bind(artifact_path)
        .bind(coordinates)
        .bind(last_scanned)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn has_dependency(&self, artifact_path: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM dependencies WHERE artifact_path = ?")
                .bind(artifact_path)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    pub async fn find_symbol_by_fqn(&self, fqn: &str) -> Result<Option<Symbol>, sqlx::Error> {
        sqlx::query_as::<_, Symbol>(
            "SELECT * FROM symbols WHERE fully_qualified_name = ? LIMIT 1",
        )
        .bind(fqn)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_symbols_by_fqn(&self, fqn: &str) -> Result<Vec<Symbol>, sqlx::Error> {
        sqlx::query_as::<_, Symbol>("SELECT * FROM symbols WHERE fully_qualified_name = ?")
            .bind(fqn)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_external_symbol_by_fqn(
        &self,
        fqn: &str,
    ) -> Result<Option<ExternalSymbol>, sqlx::Error> {
        sqlx::query_as::<_, ExternalSymbol>(
            "SELECT * FROM external_symbols WHERE fully_qualified_name = ? LIMIT 1",
        )
        .bind(fqn)
        .fetch_optional(&self.pool)
        .await
    }

    /// Direct superclass/interface edges recorded for `fqn` (one hop).
    pub async fn find_supers_by_symbol_fqn(
        &self,
        fqn: &str,
    ) -> Result<Vec<Symbol>, sqlx::Error> {
        let mappings = sqlx::query_as::<_, SymbolSuperMapping>(
            "SELECT * FROM symbol_super_mappings WHERE symbol_fqn = ?",
        )
        .bind(fqn)
        .fetch_all(&self.pool)
        .await?;

        let mut supers = Vec::new();
        for mapping in mappings {
            if let Some(super_fqn) = &mapping.super_fqn {
                if let Some(symbol) = self.find_symbol_by_fqn(super_fqn).await? {
                    supers.push(symbol);
                }
            }
        }
        Ok(supers)
    }

    /// Symbols that declare `fqn` as a superclass/interface (the reverse of
    /// [`find_supers_by_symbol_fqn`]), used for goto-implementation.
    pub async fn find_super_impls_by_fqn(&self, fqn: &str) -> Result<Vec<Symbol>, sqlx::Error> {
        sqlx::query_as::<_, Symbol>(
            "SELECT s.* FROM symbols s
             JOIN symbol_super_mappings m ON m.symbol_fqn = s.fully_qualified_name
             WHERE m.super_fqn = ?",
        )
        .bind(fqn)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_super_impls_by_short_name(
        &self,
        short_name: &str,
    ) -> Result<Vec<Symbol>, sqlx::Error> {
        sqlx::query_as::<_, Symbol>(
            "SELECT s.* FROM symbols s
             JOIN symbol_super_mappings m ON m.symbol_fqn = s.fully_qualified_name
             WHERE m.super_short_name = ?",
        )
        .bind(short_name)
        .fetch_all(&self.pool)
        .await
    }

    /// Every symbol defined in `file_path`, e.g. to feed document-symbol
    /// requests or to diff against a freshly parsed file before reindexing.
    pub async fn file_symbols(&self, file_path: &str) -> Result<Vec<Symbol>, sqlx::Error> {
        sqlx::query_as::<_, Symbol>("SELECT * FROM symbols WHERE file_path = ?")
            .bind(file_path)
            .fetch_all(&self.pool)
            .await
    }

    /// Every distinct project source file with at least one indexed symbol;
    /// used by the reference finder to bound its candidate-file scan.
    pub async fn list_indexed_files(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT file_path FROM symbols")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(path,)| path).collect())
    }

    /// Prefix search over symbol names, case-sensitivity controlled by
    /// `case_sensitive` (see `ServerConfig::case_sensitive_search`).
    ///
    /// Matches against `short_name` as well as `fully_qualified_name`: the
    /// former is what makes a name-leading lookup work at all (per §4.6's
    /// key-encoding requirement) for a packaged symbol like
    /// `com.example.User`, whose `fully_qualified_name` doesn't start with
    /// `User`; the latter is kept so a qualified prefix (e.g. a type-member
    /// lookup like `Foo#bar`, or an unpackaged class's own members) still
    /// resolves the way it always has.
    pub async fn search(
        &self,
        prefix: &str,
        case_sensitive: bool,
        limit: i64,
    ) -> Result<Arc<Vec<Symbol>>, sqlx::Error> {
        let cache_key = format!("{}\0{}\0{}", prefix, case_sensitive, limit);
        if let Some(cached) = self.search_cache.get(&cache_key) {
            return Ok(Arc::clone(&cached));
        }

        let results = if case_sensitive {
            let glob = format!("{}*", prefix);
            sqlx::query_as::<_, Symbol>(
                "SELECT * FROM symbols WHERE short_name GLOB ? OR fully_qualified_name GLOB ? LIMIT ?",
            )
            .bind(&glob)
            .bind(&glob)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            let pattern = format!("{}%", prefix);
            sqlx::query_as::<_, Symbol>(
                "SELECT * FROM symbols WHERE short_name LIKE ? OR fully_qualified_name LIKE ? LIMIT ?",
            )
            .bind(&pattern)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };

        let results = Arc::new(results);
        self.search_cache.insert(cache_key, Arc::clone(&results));
        Ok(results)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
