use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::FetchFailure;

pub const UNTITLED: &str = "Untitled";

/// Which document fields feed a [`Record`].
#[derive(Debug, Clone)]
pub struct FieldNames {
    pub image: String,
    pub title: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames {
            image: "imageUrl".to_string(),
            title: "title".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub image_ref: Option<String>,
    pub title: Option<String>,
}

impl Record {
    /// Non-string values count as absent.
    pub fn from_document(id: &str, doc: &Map<String, Value>, fields: &FieldNames) -> Self {
        let text = |key: &str| doc.get(key).and_then(Value::as_str).map(str::to_string);
        Record {
            id: id.to_string(),
            image_ref: text(&fields.image),
            title: text(&fields.title),
        }
    }

    /// A record whose stored body carried no readable fields.
    pub fn bare(id: &str) -> Self {
        Record {
            id: id.to_string(),
            image_ref: None,
            title: None,
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => UNTITLED,
        }
    }
}

pub trait DocumentStore {
    fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, FetchFailure>;
}

// ── SQLite-backed store ──

/// Read-write handle used by `import`. Creates the file and schema on open.
pub struct SqliteStore {
    conn: Connection,
    fields: FieldNames,
}

impl SqliteStore {
    pub fn open(path: &Path, fields: FieldNames) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {:?}", dir))?;
        }
        let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        Self::with_connection(conn, fields)
    }

    pub fn with_connection(conn: Connection, fields: FieldNames) -> Result<Self> {
        init_schema(&conn)?;
        Ok(SqliteStore { conn, fields })
    }

    /// Upserts documents into `collection`; returns how many rows were written.
    pub fn import(&self, collection: &str, docs: &[(String, Value)]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO documents (collection, doc_id, data) VALUES (?1, ?2, ?3)",
            )?;
            for (id, body) in docs {
                count += stmt.execute(params![collection, id, body.to_string()])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl DocumentStore for SqliteStore {
    fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, FetchFailure> {
        fetch_documents(&self.conn, collection, &self.fields)
    }
}

/// Read-only handle used by `scan`. Nothing is opened until `fetch_all`, and
/// the file is never created or modified.
pub struct SqliteReader {
    path: PathBuf,
    fields: FieldNames,
}

impl SqliteReader {
    pub fn new(path: impl Into<PathBuf>, fields: FieldNames) -> Self {
        SqliteReader {
            path: path.into(),
            fields,
        }
    }
}

impl DocumentStore for SqliteReader {
    fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, FetchFailure> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| FetchFailure::Open {
                path: self.path.clone(),
                source,
            })?;
        fetch_documents(&conn, collection, &self.fields)
    }
}

fn fetch_documents(
    conn: &Connection,
    collection: &str,
    fields: &FieldNames,
) -> Result<Vec<Record>, FetchFailure> {
    let mut stmt =
        conn.prepare("SELECT doc_id, data FROM documents WHERE collection = ?1 ORDER BY rowid")?;
    let rows = stmt
        .query_map([collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let records = rows
        .into_iter()
        .map(|(id, data)| match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(doc)) => Record::from_document(&id, &doc, fields),
            _ => {
                warn!(collection, id = %id, "document body is not a JSON object; fields treated as absent");
                Record::bare(&id)
            }
        })
        .collect();
    Ok(records)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            collection  TEXT NOT NULL,
            doc_id      TEXT NOT NULL,
            data        TEXT NOT NULL,
            PRIMARY KEY (collection, doc_id)
        );
        ",
    )?;
    Ok(())
}

// ── Export parsing ──

/// Accepts either an array of objects carrying an `id`, or an object keyed by id.
pub fn parse_export(text: &str) -> Result<Vec<(String, Value)>> {
    let val: Value = serde_json::from_str(text).context("export is not valid JSON")?;
    let mut docs = Vec::new();
    match val {
        Value::Array(arr) => {
            for (i, item) in arr.into_iter().enumerate() {
                let Value::Object(mut obj) = item else {
                    bail!("entry {} is not an object", i);
                };
                let id = match obj.remove("id") {
                    Some(Value::String(s)) if !s.is_empty() => s,
                    Some(Value::Number(n)) => n.to_string(),
                    _ => bail!("entry {} has no usable id", i),
                };
                docs.push((id, Value::Object(obj)));
            }
        }
        Value::Object(map) => {
            for (id, body) in map {
                if !body.is_object() {
                    bail!("document {} is not an object", id);
                }
                docs.push((id, body));
            }
        }
        _ => bail!("export must be a JSON array or object"),
    }
    Ok(docs)
}
