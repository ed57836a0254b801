// Relational store collaborators for the structured-query path
//
// SQLite via rusqlite: one connection behind a mutex, schema description
// with sample rows, result rows rendered as text for the narration prompt.

use crate::error::{DataAccessError, SiftError};
use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, ErrorCode};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Sample rows shown per table in the schema description
pub const SAMPLE_ROWS: usize = 3;

/// Describes available tables and columns
pub trait SchemaProvider: Send + Sync {
    fn describe_schema(&self) -> Result<String, SiftError>;
}

/// Runs a data-access statement and renders the result as text
pub trait StatementExecutor: Send + Sync {
    fn execute(&self, statement: &str) -> Result<String, DataAccessError>;
}

// ============================================================================
// SQLite
// ============================================================================

/// SQLite database (single connection with mutex)
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Open or create a database file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        info!("Opening database at: {}", path.display());
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;

        conn.pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database (tests, demos)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DataAccessError> {
        self.conn
            .lock()
            .map_err(|_| DataAccessError::Connection("connection lock poisoned".to_string()))
    }

    /// Create and fill the demo `products` and `orders` tables.
    ///
    /// Existing demo rows are replaced, so this can be re-run.
    pub fn seed_demo(&self) -> Result<()> {
        let conn = self.lock().map_err(anyhow::Error::new)?;
        conn.execute_batch(DEMO_SCHEMA_SQL)
            .context("Failed to seed demo tables")?;
        info!("Seeded demo tables: products, orders");
        Ok(())
    }
}

impl SchemaProvider for SqliteDatabase {
    fn describe_schema(&self) -> Result<String, SiftError> {
        let conn = self
            .lock()
            .map_err(|e| SiftError::Schema(e.to_string()))?;
        let schema_err = |e: rusqlite::Error| SiftError::Schema(e.to_string());

        let mut stmt = conn
            .prepare(
                "SELECT name, sql FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .map_err(schema_err)?;

        let tables = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                ))
            })
            .map_err(schema_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(schema_err)?;

        let mut sections = Vec::with_capacity(tables.len());
        for (name, create_sql) in tables {
            let sample = sample_rows(&conn, &name).map_err(schema_err)?;
            sections.push(format!(
                "{}\n\n/*\n{} rows from {} table:\n{}\n*/",
                create_sql.trim(),
                SAMPLE_ROWS,
                name,
                sample
            ));
        }

        debug!(tables = sections.len(), "Described schema");
        Ok(sections.join("\n\n"))
    }
}

impl StatementExecutor for SqliteDatabase {
    fn execute(&self, statement: &str) -> Result<String, DataAccessError> {
        let conn = self.lock()?;

        // Whitespace and comments are skipped; exactly one statement must remain
        let mut batch = Batch::new(&conn, statement);
        if batch.next().map_err(to_data_access_error)?.is_none() {
            return Err(DataAccessError::Statement("empty statement".to_string()));
        }
        if batch.next().map_err(to_data_access_error)?.is_some() {
            return Err(DataAccessError::Statement(
                "multiple statements are not supported".to_string(),
            ));
        }

        let mut stmt = conn.prepare(statement).map_err(to_data_access_error)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query([]).map_err(to_data_access_error)?;

        let mut rendered = Vec::new();
        while let Some(row) = rows.next().map_err(to_data_access_error)? {
            let values = (0..column_count)
                .map(|i| row.get_ref(i).map(|v| render_value(v, true)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(to_data_access_error)?;
            rendered.push(format!("({})", values.join(", ")));
        }

        if rendered.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("[{}]", rendered.join(", ")))
    }
}

/// Header line plus up to SAMPLE_ROWS tab-separated rows
fn sample_rows(conn: &Connection, table: &str) -> rusqlite::Result<String> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} LIMIT {}",
        quote_identifier(table),
        SAMPLE_ROWS
    ))?;
    let header = stmt.column_names().join("\t");
    let column_count = stmt.column_count();

    let mut lines = vec![header];
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let values = (0..column_count)
            .map(|i| row.get_ref(i).map(|v| render_value(v, false)))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        lines.push(values.join("\t"));
    }

    Ok(lines.join("\n"))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn render_value(value: ValueRef<'_>, quote_text: bool) -> String {
    match value {
        ValueRef::Null => "None".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => format!("{:?}", f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if quote_text {
                format!("'{}'", text.replace('\'', "\\'"))
            } else {
                text.into_owned()
            }
        }
        ValueRef::Blob(bytes) => format!("<blob {} bytes>", bytes.len()),
    }
}

fn to_data_access_error(e: rusqlite::Error) -> DataAccessError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen
            ) =>
        {
            DataAccessError::Connection(e.to_string())
        }
        _ => DataAccessError::Statement(e.to_string()),
    }
}

const DEMO_SCHEMA_SQL: &str = "
BEGIN;
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    price REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    customer_name TEXT NOT NULL,
    product_id INTEGER NOT NULL REFERENCES products(id),
    quantity INTEGER NOT NULL,
    amount REAL NOT NULL,
    status TEXT NOT NULL,
    order_date TEXT NOT NULL
);
DELETE FROM orders;
DELETE FROM products;
INSERT INTO products (id, name, category, price) VALUES
    (1, 'Laptop Pro 14', 'electronics', 1299.00),
    (2, 'Smartphone X', 'electronics', 799.00),
    (3, 'Noise-Cancelling Headphones', 'electronics', 249.50),
    (4, 'Canvas Backpack', 'accessories', 59.90),
    (5, 'Ceramic Coffee Mug', 'home', 12.00);
INSERT INTO orders (id, customer_name, product_id, quantity, amount, status, order_date) VALUES
    (1, 'Asha Rao', 1, 1, 1299.00, 'delivered', DATE('now', '-12 days')),
    (2, 'Li Wei', 5, 4, 48.00, 'delivered', DATE('now', '-6 days')),
    (3, 'Maria Lopez', 3, 1, 249.50, 'shipped', DATE('now', '-2 days')),
    (4, 'Tom Becker', 2, 1, 799.00, 'processing', DATE('now')),
    (5, 'Asha Rao', 4, 2, 119.80, 'processing', DATE('now')),
    (6, 'Noah Smith', 5, 1, 12.00, 'cancelled', DATE('now'));
COMMIT;
";

// ============================================================================
// Fake database
// ============================================================================

/// Fake database for testing: scripted schema and execution result
pub struct FakeDatabase {
    schema: Result<String, String>,
    result: Result<String, DataAccessError>,
    schema_calls: AtomicUsize,
    executed: Mutex<Vec<String>>,
}

impl FakeDatabase {
    pub fn new(schema: &str, result: Result<String, DataAccessError>) -> Self {
        Self {
            schema: Ok(schema.to_string()),
            result,
            schema_calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Schema lookups fail with `message`
    pub fn unavailable(message: &str) -> Self {
        Self {
            schema: Err(message.to_string()),
            result: Err(DataAccessError::Connection(message.to_string())),
            schema_calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> usize {
        self.executed.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Statements passed to `execute`, in order
    pub fn executed_statements(&self) -> Vec<String> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl SchemaProvider for FakeDatabase {
    fn describe_schema(&self) -> Result<String, SiftError> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.schema.clone().map_err(SiftError::Schema)
    }
}

impl StatementExecutor for FakeDatabase {
    fn execute(&self, statement: &str) -> Result<String, DataAccessError> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(statement.to_string());
        }
        self.result.clone()
    }
}
