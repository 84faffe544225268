//! Driver capability traits.
//!
//! The physical connection, prepared statements, and result cursors are
//! external collaborators; myorm consumes them through these narrow traits.
//! A backend (see the `mysql` module) adapts a concrete driver; tests use an
//! in-memory implementation.
//!
//! Statements and rowsets are scoped to the call that created them — the
//! borrowed trait objects returned by [`Connection::prepare`] and
//! [`Statement::query`] cannot outlive their parent, so release on every
//! exit path is enforced at compile time. All calls are synchronous and a
//! connection must not be shared across threads.

use crate::error::Result;
use serde_json::Value;

/// Column metadata reported by a rowset before any row is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub type_tag: TypeTag,
}

impl Column {
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
        }
    }
}

/// Driver-reported column type family.
///
/// `Decimal` and `Float` drive the byte-string -> float coercion in the row
/// mapping engine; the other tags pass values through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Integer,
    Float,
    Decimal,
    Text,
    Bytes,
    DateTime,
    Other,
}

/// A raw scalar as transported by the driver.
///
/// `Bytes` covers MySQL's byte-string wire encoding, which carries text as
/// well as textual numerics such as DECIMAL.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Int(i64),
    UInt(u64),
    Double(f64),
    Bytes(Vec<u8>),
}

/// Outcome of a non-query statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

/// A cursor over result rows and their column metadata.
pub trait Rows {
    /// Report the result columns. Called once, before any row is consumed.
    fn columns(&mut self) -> Result<Vec<Column>>;

    /// Advance to the next row, returning its values in column order.
    fn next_row(&mut self) -> Result<Option<Vec<RawValue>>>;
}

/// A prepared statement, scoped to the connection that prepared it.
pub trait Statement {
    /// Execute as a query, returning a rowset borrowed from this statement.
    fn query<'a>(&'a mut self, args: &[Value]) -> Result<Box<dyn Rows + 'a>>;

    /// Execute as a non-query statement.
    fn exec(&mut self, args: &[Value]) -> Result<ExecOutcome>;
}

/// A database connection with transaction control.
///
/// While a transaction is open, prepared statements execute within it.
/// Implementations should roll back an open transaction when the connection
/// is dropped.
pub trait Connection {
    /// Prepare a statement for execution.
    fn prepare<'a>(&'a mut self, sql: &str) -> Result<Box<dyn Statement + 'a>>;

    /// Start a transaction.
    fn begin(&mut self) -> Result<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction.
    fn rollback(&mut self) -> Result<()>;
}
