//! The project-local single-writer database.
//!
//! `Store` owns one lazily-opened `rusqlite::Connection`. Each hook
//! process and each lifecycle process is single-threaded (`spec.md`
//! §5), so the connection and its transaction depth live behind plain
//! `RefCell`/`Cell` rather than a `Mutex` — `RefCell` additionally lets
//! nested `transaction()` calls take further shared borrows of the same
//! connection while an outer transaction's closure is still running,
//! which is what makes the nesting-collapses-to-a-savepoint design work
//! without deadlocking on itself.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, Row};

use crate::error::{Result, StoreError};
use crate::identifiers::{validate_column, validate_table};
use crate::layout;
use crate::migrations::MIGRATIONS;

pub struct Store {
    path: PathBuf,
    conn: RefCell<Option<Connection>>,
    tx_depth: Cell<u32>,
}

impl Store {
    /// Open (or lazily prepare to open) the store for a project root.
    /// Does not touch the filesystem until `connect()` is called.
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            path: layout::db_path(project_root),
            conn: RefCell::new(None),
            tx_depth: Cell::new(0),
        }
    }

    /// Open directly against an arbitrary database file path (used by tests).
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: RefCell::new(None),
            tx_depth: Cell::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the containing directory (mode 0700), open the database
    /// (mode 0600), set pragmas, and apply outstanding migrations.
    /// Idempotent: a second call on an already-open store is a no-op.
    pub fn connect(&self) -> Result<()> {
        if self.conn.borrow().is_some() {
            return Ok(());
        }
        self.open_and_migrate()
    }

    pub fn close(&self) {
        *self.conn.borrow_mut() = None;
    }

    fn open_and_migrate(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirFailed {
                path: parent.to_path_buf(),
                source,
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700));
            }
        }

        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::OpenFailed {
            path: self.path.clone(),
            source,
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "busy_timeout", 5000i64)?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600));
        }

        Self::apply_migrations(&conn)?;
        *self.conn.borrow_mut() = Some(conn);
        Ok(())
    }

    fn apply_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )"#,
        )?;
        let current: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for migration in MIGRATIONS {
            if migration.version <= current {
                continue;
            }
            conn.execute_batch("BEGIN")
                .map_err(|source| StoreError::MigrationFailed {
                    version: migration.version,
                    source,
                })?;
            for statement in migration.statements {
                if let Err(source) = conn.execute_batch(statement) {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(StoreError::MigrationFailed {
                        version: migration.version,
                        source,
                    });
                }
            }
            if let Err(source) = conn.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, Utc::now().to_rfc3339()],
            ) {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(StoreError::MigrationFailed {
                    version: migration.version,
                    source,
                });
            }
            conn.execute_batch("COMMIT")
                .map_err(|source| StoreError::MigrationFailed {
                    version: migration.version,
                    source,
                })?;
        }
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.conn.borrow().is_none() {
            self.open_and_migrate()?;
        }
        Ok(())
    }

    /// Insert a row. Every column name is checked against the compiled
    /// allow-list before any SQL is constructed.
    pub fn insert(&self, table: &str, columns: &[(&str, &dyn rusqlite::ToSql)]) -> Result<i64> {
        self.insert_impl(table, columns, false)
    }

    pub fn insert_or_replace(
        &self,
        table: &str,
        columns: &[(&str, &dyn rusqlite::ToSql)],
    ) -> Result<i64> {
        self.insert_impl(table, columns, true)
    }

    fn insert_impl(
        &self,
        table: &str,
        columns: &[(&str, &dyn rusqlite::ToSql)],
        replace: bool,
    ) -> Result<i64> {
        validate_table(table)?;
        for (column, _) in columns {
            validate_column(table, column)?;
        }

        let col_list = columns
            .iter()
            .map(|(c, _)| *c)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
        let sql = format!("{verb} INTO {table} ({col_list}) VALUES ({placeholders})");
        let params: Vec<&dyn rusqlite::ToSql> = columns.iter().map(|(_, v)| *v).collect();

        self.ensure_connected()?;
        let guard = self.conn.borrow();
        let conn = guard.as_ref().expect("connected above");
        conn.execute(&sql, params.as_slice())?;
        Ok(conn.last_insert_rowid())
    }

    /// Update rows. `set` column names are validated against the
    /// allow-list; `where_clause` is a raw SQL fragment supplied by
    /// trusted call sites within this codebase, never built from
    /// external identifiers.
    pub fn update(
        &self,
        table: &str,
        set: &[(&str, &dyn rusqlite::ToSql)],
        where_clause: &str,
        where_params: &[&dyn rusqlite::ToSql],
    ) -> Result<usize> {
        validate_table(table)?;
        for (column, _) in set {
            validate_column(table, column)?;
        }

        let set_list = set
            .iter()
            .enumerate()
            .map(|(i, (c, _))| format!("{c} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {table} SET {set_list} WHERE {where_clause}");

        let mut params: Vec<&dyn rusqlite::ToSql> = set.iter().map(|(_, v)| *v).collect();
        params.extend(where_params.iter().copied());

        self.ensure_connected()?;
        let guard = self.conn.borrow();
        let conn = guard.as_ref().expect("connected above");
        Ok(conn.execute(&sql, params.as_slice())?)
    }

    pub fn delete(
        &self,
        table: &str,
        where_clause: &str,
        where_params: &[&dyn rusqlite::ToSql],
    ) -> Result<usize> {
        validate_table(table)?;
        let sql = format!("DELETE FROM {table} WHERE {where_clause}");
        self.ensure_connected()?;
        let guard = self.conn.borrow();
        let conn = guard.as_ref().expect("connected above");
        Ok(conn.execute(&sql, where_params)?)
    }

    pub fn fetch_one<T>(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        self.ensure_connected()?;
        let guard = self.conn.borrow();
        let conn = guard.as_ref().expect("connected above");
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => Ok(Some(map(row)?)),
            None => Ok(None),
        }
    }

    pub fn fetch_all<T>(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
        map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        self.ensure_connected()?;
        let guard = self.conn.borrow();
        let conn = guard.as_ref().expect("connected above");
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map(row)?);
        }
        Ok(out)
    }

    /// Run `f` inside a transaction. A call to `transaction()` issued
    /// from within another `transaction()`'s closure (on this same
    /// `Store`) opens a `SAVEPOINT` instead of a second `BEGIN` and
    /// releases it rather than committing, so the whole nest behaves as
    /// one atomic unit bounded by the outermost call.
    pub fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.ensure_connected()?;
        let depth = self.tx_depth.get();
        let savepoint = format!("k6s_sp_{depth}");

        {
            let guard = self.conn.borrow();
            let conn = guard.as_ref().expect("connected above");
            if depth == 0 {
                conn.execute_batch("BEGIN")?;
            } else {
                conn.execute_batch(&format!("SAVEPOINT {savepoint}"))?;
            }
        }
        self.tx_depth.set(depth + 1);

        let result = {
            let guard = self.conn.borrow();
            let conn = guard.as_ref().expect("connected above");
            f(conn)
        };
        self.tx_depth.set(depth);

        let guard = self.conn.borrow();
        let conn = guard.as_ref().expect("connected above");
        match &result {
            Ok(_) => {
                if depth == 0 {
                    conn.execute_batch("COMMIT")?;
                } else {
                    conn.execute_batch(&format!("RELEASE {savepoint}"))?;
                }
            }
            Err(_) => {
                if depth == 0 {
                    let _ = conn.execute_batch("ROLLBACK");
                } else {
                    let _ = conn.execute_batch(&format!("ROLLBACK TO {savepoint}"));
                    let _ = conn.execute_batch(&format!("RELEASE {savepoint}"));
                }
            }
        }
        result
    }
}
