//! # myorm
//!
//! A lightweight MySQL convenience layer for Rust.
//!
//! ## Features
//!
//! - **SQL explicit**: SQL is a first-class citizen (write it, or use the
//!   statement builders for the repetitive INSERT/UPDATE/DELETE shapes)
//! - **Serde mapping**: rows become structs through serde, columns matched to
//!   fields by a pluggable naming convention
//! - **Deterministic statements**: field maps are ordered, so the same input
//!   always renders the same SQL text
//! - **Diff updates**: compare two snapshots of a record and write only the
//!   changed columns
//! - **Transaction-friendly**: explicit begin/commit/rollback plus a scoped
//!   `transaction` closure that cannot leak an open transaction
//!
//! ## Example
//!
//! ```ignore
//! use myorm::{Client, json};
//! use myorm::mysql::MysqlConnection;
//!
//! let conn = MysqlConnection::connect("mysql://root@localhost:3306/app")?;
//! let mut db = Client::new(Box::new(conn));
//!
//! let id = db.add("user", &NewUser { name: "alice".into(), age: 30 })?;
//!
//! let user: User = db.fetch_one(
//!     "SELECT * FROM `user` WHERE `id` = ?",
//!     &[json!(id)],
//! )?;
//!
//! db.transaction(|tx| {
//!     tx.update_by_id("user", myorm::FieldMap::from([
//!         ("age".to_string(), json!(31)),
//!     ]), id)?;
//!     tx.delete("session", "`user_id` = ?", &[json!(id)])
//! })?;
//! # Ok::<(), myorm::Error>(())
//! ```

pub mod builder;
pub mod client;
pub mod diff;
pub mod driver;
pub mod error;
pub mod ident;
pub mod naming;
pub mod row;

pub use builder::{FieldMap, Sql, assignments, delete_from, insert_into, update, where_id};
pub use client::{Client, FieldHook};
pub use diff::diff;
pub use driver::{Column, Connection, ExecOutcome, RawValue, Rows, Statement, TypeTag};
pub use error::{Error, Result};
pub use ident::quote;
pub use naming::{Naming, column_to_field, field_to_column};
pub use row::TextRow;

// Re-export the value types callers hand to every query.
pub use serde_json::{Value, json};

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "mysql")]
pub use mysql::MysqlConnection;
