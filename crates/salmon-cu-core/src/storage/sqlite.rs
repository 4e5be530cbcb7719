use rusqlite::{params_from_iter, Connection, Result};
use tracing::debug;

use super::table::Table;

/// In-memory relational store the extraction queries run against.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.configure_pragmas()?;
        Ok(db)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = OFF;
             PRAGMA case_sensitive_like = OFF;",
        )?;
        debug!("SQLite in-memory store configured");
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create (or replace) a TEXT-typed table mirroring `table` and copy its rows in.
    pub fn load_table(&mut self, table: &Table) -> Result<usize> {
        let columns: Vec<String> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if name.is_empty() {
                    format!("COLUMN_{}", i + 1)
                } else {
                    name.clone()
                }
            })
            .collect();

        let column_defs = columns
            .iter()
            .map(|c| format!("{} TEXT", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {name}; CREATE TABLE {name} ({column_defs});",
            name = quote_ident(&table.name),
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                quote_ident(&table.name),
                placeholders
            ))?;
            for row in &table.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        debug!("Loaded {} rows into '{}'", table.rows.len(), table.name);
        Ok(table.rows.len())
    }

    pub fn has_table(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of `name`, in declared order. Empty when the table is absent.
    pub fn table_columns(&self, name: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(name)))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>>>()?;
        Ok(columns)
    }

    /// Those of `required` that `table` lacks.
    pub fn missing_columns(&self, table: &str, required: &[&str]) -> Result<Vec<String>> {
        let present = self.table_columns(table)?;
        Ok(required
            .iter()
            .filter(|col| !present.iter().any(|p| p == *col))
            .map(|col| col.to_string())
            .collect())
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
