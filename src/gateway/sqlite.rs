/// SQLite implementation of the persistence gateway
///
/// Builds statements from the closed [`Table`] enum and validated column names;
/// every value is bound. Rows come back through `RETURNING *` so callers always
/// see what the database stored (assigned ids, column defaults).
use crate::{
    config::DatabaseConfig,
    gateway::{schema, Batch, Gateway, GatewayError, GatewayResult, Mutation, Row, Selection, Table},
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    query::Query,
    sqlite::{
        Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqlitePool,
        SqlitePoolOptions, SqliteRow,
    },
    Column, Row as _, TypeInfo, ValueRef,
};
use std::{
    str::FromStr,
    time::{Duration, Instant},
};
use uuid::Uuid;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Gateway over a sqlx SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    /// Wrap an existing pool. The schema is not touched.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the configured database and make sure the schema exists
    pub async fn connect(config: &DatabaseConfig) -> GatewayResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Each connection to `:memory:` is its own database
        let max_connections = if config.url.contains(":memory:") {
            1
        } else {
            config.max_connections.max(1)
        };

        tracing::info!(
            "🗄️ Opening database pool: {} (max {} connections)",
            config.url,
            max_connections
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        let gateway = Self::new(pool);
        gateway.init_schema().await?;
        Ok(gateway)
    }

    /// Private in-memory database with the full schema
    pub async fn in_memory() -> GatewayResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        let gateway = Self::new(pool);
        gateway.init_schema().await?;
        Ok(gateway)
    }

    pub async fn init_schema(&self) -> GatewayResult<()> {
        schema::init(&self.pool).await?;
        Ok(())
    }

    /// Close the pool; every later call fails with a pool error
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Gateway for SqliteGateway {
    async fn select(&self, table: Table, selection: &Selection) -> GatewayResult<Vec<Row>> {
        let mut sql = format!("SELECT * FROM {}", table);
        if let Some((column, _)) = &selection.filter {
            sql.push_str(&format!(" WHERE {} = ?", quote_ident(column)?));
        }
        if let Some(column) = &selection.order_by {
            sql.push_str(&format!(" ORDER BY {}", quote_ident(column)?));
        }

        let mut query = sqlx::query(&sql);
        if let Some((_, value)) = &selection.filter {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(&self.pool).await?;
        tracing::debug!("📊 select {}: {} rows", table, rows.len());

        let json_columns = schema::json_columns(table);
        rows.iter().map(|row| decode_row(row, json_columns)).collect()
    }

    async fn insert(&self, table: Table, row: Row) -> GatewayResult<Row> {
        let mut conn = self.pool.acquire().await?;
        let stored = insert_row(&mut conn, table, row).await?;
        tracing::debug!("➕ insert {}: {}", table, row_id(&stored));
        Ok(stored)
    }

    async fn insert_many(&self, table: Table, rows: Vec<Row>) -> GatewayResult<Vec<Row>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            stored.push(insert_row(&mut tx, table, row).await?);
        }
        tx.commit().await?;

        tracing::debug!("➕ insert {}: {} rows", table, stored.len());
        Ok(stored)
    }

    async fn update(&self, table: Table, id: &str, patch: Row) -> GatewayResult<Row> {
        let mut conn = self.pool.acquire().await?;
        let stored = update_row(&mut conn, table, id, patch).await?;
        tracing::debug!("✏️ update {}: {}", table, id);
        Ok(stored)
    }

    async fn delete_where(&self, table: Table, column: &str, value: Value) -> GatewayResult<u64> {
        let mut conn = self.pool.acquire().await?;
        let removed = delete_rows(&mut conn, table, column, &value).await?;
        tracing::debug!("🗑️ delete {} where {} = {}: {} rows", table, column, value, removed);
        Ok(removed)
    }

    async fn upsert(&self, table: Table, rows: Vec<Row>) -> GatewayResult<Vec<Row>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            stored.push(upsert_row(&mut tx, table, row).await?);
        }
        tx.commit().await?;

        tracing::debug!("🔁 upsert {}: {} rows", table, stored.len());
        Ok(stored)
    }

    async fn execute_sql(&self, sql: &str, params: &[Value]) -> GatewayResult<Vec<Row>> {
        let start = Instant::now();

        let mut query = sqlx::query(sql);
        for value in params {
            query = bind_value(query, value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        tracing::debug!(
            sql,
            duration_ms = start.elapsed().as_millis() as u64,
            rows = rows.len(),
            "executed query"
        );

        rows.iter().map(|row| decode_row(row, &[])).collect()
    }

    async fn apply(&self, batch: Batch) -> GatewayResult<()> {
        let count = batch.len();
        let mut tx = self.pool.begin().await?;
        for mutation in batch.into_mutations() {
            apply_mutation(&mut tx, mutation).await?;
        }
        tx.commit().await?;

        tracing::debug!("📦 applied batch of {} mutations", count);
        Ok(())
    }
}

async fn apply_mutation(conn: &mut SqliteConnection, mutation: Mutation) -> GatewayResult<()> {
    match mutation {
        Mutation::Insert { table, row } => {
            insert_row(conn, table, row).await?;
        }
        Mutation::Update { table, id, patch } => {
            update_row(conn, table, &id, patch).await?;
        }
        Mutation::DeleteWhere { table, column, value } => {
            delete_rows(conn, table, &column, &value).await?;
        }
    }
    Ok(())
}

async fn insert_row(conn: &mut SqliteConnection, table: Table, mut row: Row) -> GatewayResult<Row> {
    ensure_id(&mut row);

    let columns = row
        .keys()
        .map(|key| quote_ident(key))
        .collect::<GatewayResult<Vec<_>>>()?;
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        columns.join(", "),
        placeholders
    );

    let query = bind_row(sqlx::query(&sql), table, &row);

    let stored = query.fetch_one(&mut *conn).await?;
    decode_row(&stored, schema::json_columns(table))
}

async fn update_row(
    conn: &mut SqliteConnection,
    table: Table,
    id: &str,
    mut patch: Row,
) -> GatewayResult<Row> {
    // The primary key is never rewritten
    patch.remove("id");

    let stored = if patch.is_empty() {
        let sql = format!("SELECT * FROM {} WHERE id = ?", table);
        sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?
    } else {
        let assignments = patch
            .keys()
            .map(|key| quote_ident(key).map(|column| format!("{} = ?", column)))
            .collect::<GatewayResult<Vec<_>>>()?;
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING *",
            table,
            assignments.join(", ")
        );

        bind_row(sqlx::query(&sql), table, &patch)
            .bind(id).fetch_optional(&mut *conn).await?
    };

    match stored {
        Some(row) => decode_row(&row, schema::json_columns(table)),
        None => Err(GatewayError::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        }),
    }
}

async fn delete_rows(
    conn: &mut SqliteConnection,
    table: Table,
    column: &str,
    value: &Value,
) -> GatewayResult<u64> {
    let sql = format!("DELETE FROM {} WHERE {} = ?", table, quote_ident(column)?);
    let result = bind_value(sqlx::query(&sql), value)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

async fn upsert_row(conn: &mut SqliteConnection, table: Table, mut row: Row) -> GatewayResult<Row> {
    ensure_id(&mut row);

    let mut columns = Vec::with_capacity(row.len());
    let mut updates = Vec::new();
    for key in row.keys() {
        let column = quote_ident(key)?;
        if key != "id" {
            updates.push(format!("{0} = excluded.{0}", column));
        }
        columns.push(column);
    }
    if updates.is_empty() {
        updates.push("\"id\" = excluded.\"id\"".to_string());
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {} RETURNING *",
        table,
        columns.join(", "),
        placeholders,
        updates.join(", ")
    );

    let query = bind_row(sqlx::query(&sql), table, &row);

    let stored = query.fetch_one(&mut *conn).await?;
    decode_row(&stored, schema::json_columns(table))
}

/// Assign a fresh id when the row has none (absent, null or empty)
fn ensure_id(row: &mut Row) {
    let missing = match row.get("id") {
        None | Some(Value::Null) => true,
        Some(Value::String(id)) => id.is_empty(),
        Some(_) => false,
    };
    if missing {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
}

fn row_id(row: &Row) -> &str {
    row.get("id").and_then(Value::as_str).unwrap_or("?")
}

/// Double-quote a column name after checking it is a plain identifier
fn quote_ident(name: &str) -> GatewayResult<String> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(format!("\"{}\"", name))
    } else {
        Err(GatewayError::InvalidColumn(name.to_string()))
    }
}

/// Bind every column of `row` in key order
///
/// Values of the table's JSON columns are always stored as JSON text, so a
/// string such as `"123"` reads back as a string.
fn bind_row<'q>(mut query: SqliteQuery<'q>, table: Table, row: &Row) -> SqliteQuery<'q> {
    let json_columns = schema::json_columns(table);
    for (column, value) in row {
        query = if json_columns.contains(&column.as_str()) {
            query.bind(value.to_string())
        } else {
            bind_value(query, value)
        };
    }
    query
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(flag) => query.bind(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => query.bind(integer),
            None => query.bind(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => query.bind(text.clone()),
        // Arrays and objects are stored as JSON text
        other => query.bind(other.to_string()),
    }
}

/// Convert a result row to JSON using each value's runtime storage class
fn decode_row(row: &SqliteRow, json_columns: &[&str]) -> GatewayResult<Row> {
    let mut record = Row::new();

    for column in row.columns() {
        let index = column.ordinal();
        let name = column.name();
        let raw = row.try_get_raw(index)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage_class = raw.type_info().name().to_string();
            match storage_class.as_str() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" => Value::from(row.try_get::<f64, _>(index)?),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get(index)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => {
                    let text: String = row.try_get(index)?;
                    if json_columns.contains(&name) {
                        serde_json::from_str(&text).unwrap_or(Value::String(text))
                    } else {
                        Value::String(text)
                    }
                }
            }
        };

        record.insert(name.to_string(), value);
    }

    Ok(record)
}
