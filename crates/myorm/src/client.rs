//! The execution facade.
//!
//! A [`Client`] owns a driver connection, the naming convention, and the
//! transaction state. Every operation is a thin composition of the statement
//! builders, the diff engine, and the row mapping engine around a single
//! prepare + query/exec call.
//!
//! A client is a single logical thread: no internal synchronization is
//! provided, and callers needing concurrency must use separate clients, each
//! with its own connection.
//!
//! # Example
//!
//! ```ignore
//! use myorm::{Client, FieldMap, json};
//!
//! let mut db = Client::new(Box::new(conn));
//! let id = db.add("user", &NewUser { name: "alice".into(), age: 30 })?;
//! let user: User = db.fetch_one("SELECT * FROM `user` WHERE `id` = ?", &[json!(id)])?;
//! # Ok::<(), myorm::Error>(())
//! ```

use crate::builder::{self, FieldMap, where_id};
use crate::diff;
use crate::driver::{Connection, Rows};
use crate::error::{Error, Result};
use crate::naming::Naming;
use crate::row::{self, TextRow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Hook producing default fields merged into write operations.
///
/// Explicitly supplied fields win over hook fields with the same column.
pub type FieldHook = Box<dyn Fn() -> FieldMap + Send>;

/// Stateful coordinator of statement execution and transaction scope.
pub struct Client {
    conn: Box<dyn Connection>,
    naming: Naming,
    in_transaction: bool,
    insert_defaults: Option<FieldHook>,
    update_defaults: Option<FieldHook>,
    soft_delete_fields: Option<FieldHook>,
}

impl Client {
    /// Create a client over a driver connection with the default naming.
    pub fn new(conn: Box<dyn Connection>) -> Self {
        Self {
            conn,
            naming: Naming::default(),
            in_transaction: false,
            insert_defaults: None,
            update_defaults: None,
            soft_delete_fields: None,
        }
    }

    /// Replace the naming convention.
    pub fn with_naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    /// Set the hook whose fields are merged into every `add`.
    pub fn insert_defaults(mut self, hook: impl Fn() -> FieldMap + Send + 'static) -> Self {
        self.insert_defaults = Some(Box::new(hook));
        self
    }

    /// Set the hook whose fields are merged into every `update`.
    pub fn update_defaults(mut self, hook: impl Fn() -> FieldMap + Send + 'static) -> Self {
        self.update_defaults = Some(Box::new(hook));
        self
    }

    /// Set the field map written by `soft_delete`.
    pub fn soft_delete_fields(mut self, hook: impl Fn() -> FieldMap + Send + 'static) -> Self {
        self.soft_delete_fields = Some(Box::new(hook));
        self
    }

    /// The active naming convention.
    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    // ==================== Transaction scope ====================

    /// Start a transaction. Errors if one is already open.
    pub fn begin(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(Error::TransactionOpen);
        }
        self.conn.begin()?;
        self.in_transaction = true;
        debug!("transaction begun");
        Ok(())
    }

    /// Commit the open transaction. Errors if none is open.
    pub fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(Error::NoTransaction);
        }
        self.conn.commit()?;
        self.in_transaction = false;
        debug!("transaction committed");
        Ok(())
    }

    /// Roll back the open transaction. Errors if none is open.
    pub fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(Error::NoTransaction);
        }
        self.conn.rollback()?;
        self.in_transaction = false;
        debug!("transaction rolled back");
        Ok(())
    }

    /// Run `body` inside a transaction.
    ///
    /// Begins, invokes `body` with this client, rolls back and propagates the
    /// body's error on failure, commits on success. The body must not close
    /// the transaction itself. This is the recommended way to scope a
    /// transaction; together with [`Drop`] it guarantees the close call on
    /// every exit path, including unwinding.
    pub fn transaction<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.begin()?;
        match body(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(error) => {
                // the body's error propagates, not the rollback's
                if let Err(rollback_error) = self.rollback() {
                    debug!(%rollback_error, "rollback after failed transaction body also failed");
                }
                Err(error)
            }
        }
    }

    // ==================== Execution primitives ====================

    /// Execute a query and hand the rowset to `scan`.
    ///
    /// The statement and rowset are released when `scan` returns, on every
    /// exit path.
    pub fn query<R>(
        &mut self,
        sql: &str,
        args: &[Value],
        scan: impl FnOnce(&mut dyn Rows) -> Result<R>,
    ) -> Result<R> {
        debug!(sql, params = args.len(), "query");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(args)?;
        scan(rows.as_mut())
    }

    /// Execute a non-query statement, returning the affected row count.
    pub fn execute(&mut self, sql: &str, args: &[Value]) -> Result<u64> {
        debug!(sql, params = args.len(), "execute");
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.exec(args)?.rows_affected)
    }

    /// Execute an INSERT statement, returning the auto-increment id.
    pub fn insert(&mut self, sql: &str, args: &[Value]) -> Result<u64> {
        debug!(sql, params = args.len(), "insert");
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.exec(args)?.last_insert_id)
    }

    // ==================== Aggregates ====================

    /// Count rows: scans the first column of the first row as an integer.
    pub fn count(&mut self, sql: &str, args: &[Value]) -> Result<i64> {
        self.query(sql, args, row::first_i64)
    }

    /// Integer sum; a NULL sum (no matching rows) is 0.
    pub fn sum_int(&mut self, sql: &str, args: &[Value]) -> Result<i64> {
        self.query(sql, args, row::first_i64)
    }

    /// Float sum; a NULL sum (no matching rows) is 0.0.
    pub fn sum_float(&mut self, sql: &str, args: &[Value]) -> Result<f64> {
        self.query(sql, args, row::first_f64)
    }

    /// Whether the query matches at least one row.
    pub fn exists(&mut self, sql: &str, args: &[Value]) -> Result<bool> {
        self.query(sql, args, row::has_row)
    }

    // ==================== Fetch ====================

    /// Fetch exactly one record; zero rows is [`Error::NoRows`].
    pub fn fetch_one<T: DeserializeOwned>(&mut self, sql: &str, args: &[Value]) -> Result<T> {
        let naming = self.naming.clone();
        self.query(sql, args, |rows| row::fetch_one(rows, &naming))
    }

    /// Fetch the first record, if any; zero rows is `None`, not an error.
    pub fn fetch_first<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> Result<Option<T>> {
        let naming = self.naming.clone();
        self.query(sql, args, |rows| row::fetch_first(rows, &naming))
    }

    /// Fetch every record; an empty result is an empty vector.
    pub fn fetch_all<T: DeserializeOwned>(&mut self, sql: &str, args: &[Value]) -> Result<Vec<T>> {
        let naming = self.naming.clone();
        self.query(sql, args, |rows| row::fetch_all(rows, &naming))
    }

    /// Fetch every record boxed, for callers keeping records behind pointers.
    pub fn fetch_all_boxed<T: DeserializeOwned>(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Box<T>>> {
        let naming = self.naming.clone();
        self.query(sql, args, |rows| row::fetch_all_boxed(rows, &naming))
    }

    /// Fetch the first row as a generic map keyed by raw column name.
    pub fn fetch_row(&mut self, sql: &str, args: &[Value]) -> Result<Option<FieldMap>> {
        self.query(sql, args, row::first_map)
    }

    /// Fetch every row as a generic map keyed by raw column name.
    pub fn fetch_rows(&mut self, sql: &str, args: &[Value]) -> Result<Vec<FieldMap>> {
        self.query(sql, args, row::all_maps)
    }

    /// Fetch the first row preserving wire text; SQL NULL becomes `None`.
    pub fn fetch_text_row(&mut self, sql: &str, args: &[Value]) -> Result<Option<TextRow>> {
        self.query(sql, args, row::first_text)
    }

    /// Fetch every row preserving wire text.
    pub fn fetch_text_rows(&mut self, sql: &str, args: &[Value]) -> Result<Vec<TextRow>> {
        self.query(sql, args, row::all_text)
    }

    // ==================== CRUD conveniences ====================

    /// Insert a record, returning the auto-increment id.
    ///
    /// The record is flattened field-by-field; column names come from the
    /// naming convention's `field_to_column`.
    pub fn add<T: Serialize>(&mut self, table: &str, record: &T) -> Result<u64> {
        let mut fields = self.record_to_fields(record)?;
        merge_defaults(&mut fields, &self.insert_defaults);
        let sql = builder::insert_into(table, &fields)?;
        self.insert(&sql.text, &sql.args)
    }

    /// Update rows matching `where_clause` with an explicit field map.
    pub fn update(
        &mut self,
        table: &str,
        mut fields: FieldMap,
        where_clause: &str,
        where_args: &[Value],
    ) -> Result<u64> {
        merge_defaults(&mut fields, &self.update_defaults);
        let sql = builder::update(table, &fields, where_clause, where_args)?;
        self.execute(&sql.text, &sql.args)
    }

    /// Update the row with the given primary key.
    pub fn update_by_id(
        &mut self,
        table: &str,
        fields: FieldMap,
        id: impl Into<Value>,
    ) -> Result<u64> {
        self.update(table, fields, where_id(), &[id.into()])
    }

    /// Diff two snapshots of a record and update only the changed columns.
    ///
    /// Equal snapshots produce [`Error::NothingToUpdate`] unless an update
    /// defaults hook contributes fields.
    pub fn update_diff<B, A>(
        &mut self,
        table: &str,
        before: &B,
        after: &A,
        where_clause: &str,
        where_args: &[Value],
    ) -> Result<u64>
    where
        B: Serialize,
        A: Serialize,
    {
        let changed = diff::diff(before, after, &self.naming)?;
        self.update(table, changed, where_clause, where_args)
    }

    /// Diff-based update of the row with the given primary key.
    pub fn update_diff_by_id<B, A>(
        &mut self,
        table: &str,
        before: &B,
        after: &A,
        id: impl Into<Value>,
    ) -> Result<u64>
    where
        B: Serialize,
        A: Serialize,
    {
        self.update_diff(table, before, after, where_id(), &[id.into()])
    }

    /// Delete rows matching `where_clause`; an empty clause deletes all.
    pub fn delete(&mut self, table: &str, where_clause: &str, where_args: &[Value]) -> Result<u64> {
        let sql = builder::delete_from(table, where_clause, where_args)?;
        self.execute(&sql.text, &sql.args)
    }

    /// Delete the row with the given primary key.
    pub fn delete_by_id(&mut self, table: &str, id: impl Into<Value>) -> Result<u64> {
        self.delete(table, where_id(), &[id.into()])
    }

    /// Soft delete: UPDATE with the configured soft-delete field map.
    ///
    /// Errors if no soft-delete hook is configured; a hook returning an
    /// empty map is a no-op.
    pub fn soft_delete(
        &mut self,
        table: &str,
        where_clause: &str,
        where_args: &[Value],
    ) -> Result<u64> {
        let fields = match &self.soft_delete_fields {
            Some(hook) => hook(),
            None => return Err(Error::misuse("soft delete fields are not configured")),
        };
        if fields.is_empty() {
            return Ok(0);
        }
        let sql = builder::update(table, &fields, where_clause, where_args)?;
        self.execute(&sql.text, &sql.args)
    }

    /// Soft delete the row with the given primary key.
    pub fn soft_delete_by_id(&mut self, table: &str, id: impl Into<Value>) -> Result<u64> {
        self.soft_delete(table, where_id(), &[id.into()])
    }

    fn record_to_fields<T: Serialize>(&self, record: &T) -> Result<FieldMap> {
        match serde_json::to_value(record)? {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(field, value)| (self.naming.field_to_column(&field), value))
                .collect()),
            _ => Err(Error::UnsupportedShape(
                "write source is not a struct record".into(),
            )),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // a transaction left open by unwinding must not leak
        if self.in_transaction {
            let _ = self.conn.rollback();
        }
    }
}

fn merge_defaults(fields: &mut FieldMap, hook: &Option<FieldHook>) {
    if let Some(hook) = hook {
        for (column, value) in hook() {
            fields.entry(column).or_insert(value);
        }
    }
}
