//! Field-map ordering and statement building.
//!
//! A [`FieldMap`] holds "columns to write" without any caller-imposed order;
//! the builders here iterate it in lexicographic key order, so two maps with
//! the same logical content always produce byte-identical SQL text and the
//! same argument order. That determinism is what makes statement caching and
//! reproducible tests possible downstream.
//!
//! All emitted SQL uses positional `?` placeholders; the argument vector is
//! index-aligned with them.

use crate::error::{Error, Result};
use crate::ident::quote;
use serde_json::Value;
use std::collections::BTreeMap;

/// Unordered column -> value collection for INSERT/UPDATE.
///
/// Backed by a `BTreeMap`, so iteration is lexicographic by key.
pub type FieldMap = BTreeMap<String, Value>;

/// An immutable SQL text / positional argument pair.
///
/// The number of arguments equals the number of `?` placeholders in the text,
/// in left-to-right order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sql {
    pub text: String,
    pub args: Vec<Value>,
}

/// Build a `SET` assignment list from a field map.
///
/// Returns `` `a` = ?, `b` = ? `` in sorted column order together with the
/// index-aligned argument vector. An empty map yields an empty string and an
/// empty vector; callers must check for that before emitting an UPDATE.
pub fn assignments(fields: &FieldMap) -> (String, Vec<Value>) {
    let mut parts = Vec::with_capacity(fields.len());
    let mut args = Vec::with_capacity(fields.len());
    for (column, value) in fields {
        parts.push(format!("{} = ?", quote(column)));
        args.push(value.clone());
    }
    (parts.join(", "), args)
}

/// Build a full INSERT statement.
///
/// Columns are emitted in sorted order:
/// `` INSERT INTO `t` ( `a`, `b` ) VALUES ( ?, ? ) ``.
///
/// An empty table name or an empty field map is a caller error, detected
/// before any SQL is built.
pub fn insert_into(table: &str, fields: &FieldMap) -> Result<Sql> {
    if table.is_empty() {
        return Err(Error::misuse("insert: table name is empty"));
    }
    if fields.is_empty() {
        return Err(Error::misuse("insert: field map is empty"));
    }
    let mut columns = Vec::with_capacity(fields.len());
    let mut args = Vec::with_capacity(fields.len());
    for (column, value) in fields {
        columns.push(quote(column));
        args.push(value.clone());
    }
    let placeholders = vec!["?"; fields.len()].join(", ");
    let text = format!(
        "INSERT INTO {} ( {} ) VALUES ( {} )",
        quote(table),
        columns.join(", "),
        placeholders,
    );
    Ok(Sql { text, args })
}

/// Build a full UPDATE statement.
///
/// The assignment arguments come first, followed by `where_args`. An empty
/// field map is signaled as [`Error::NothingToUpdate`] rather than emitting
/// an UPDATE with no SET clause. An empty `where_clause` updates the whole
/// table; arguments without a clause to hold their placeholders are a caller
/// error.
pub fn update(
    table: &str,
    fields: &FieldMap,
    where_clause: &str,
    where_args: &[Value],
) -> Result<Sql> {
    if table.is_empty() {
        return Err(Error::misuse("update: table name is empty"));
    }
    if where_clause.is_empty() && !where_args.is_empty() {
        return Err(Error::misuse("update: where arguments without a where clause"));
    }
    let (set, mut args) = assignments(fields);
    if set.is_empty() {
        return Err(Error::NothingToUpdate);
    }
    let text = if where_clause.is_empty() {
        format!("UPDATE {} SET {}", quote(table), set)
    } else {
        args.extend_from_slice(where_args);
        format!("UPDATE {} SET {} WHERE ( {} )", quote(table), set, where_clause)
    };
    Ok(Sql { text, args })
}

/// Build a full DELETE statement.
///
/// An empty `where_clause` deletes the whole table; arguments without a
/// clause to hold their placeholders are a caller error.
pub fn delete_from(table: &str, where_clause: &str, where_args: &[Value]) -> Result<Sql> {
    if table.is_empty() {
        return Err(Error::misuse("delete: table name is empty"));
    }
    if where_clause.is_empty() && !where_args.is_empty() {
        return Err(Error::misuse("delete: where arguments without a where clause"));
    }
    if where_clause.is_empty() {
        return Ok(Sql {
            text: format!("DELETE FROM {}", quote(table)),
            args: Vec::new(),
        });
    }
    Ok(Sql {
        text: format!("DELETE FROM {} WHERE ( {} )", quote(table), where_clause),
        args: where_args.to_vec(),
    })
}

/// The primary-key equality fragment used by the `*_by_id` conveniences.
pub fn where_id() -> &'static str {
    "`id` = ?"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn assignments_sorted_lexicographically() {
        let map = fields(&[("b", json!(2)), ("a", json!(1)), ("c", json!(3))]);
        let (set, args) = assignments(&map);
        assert_eq!(set, "`a` = ?, `b` = ?, `c` = ?");
        assert_eq!(args, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn assignments_insertion_order_independent() {
        let forward = fields(&[("name", json!("a")), ("age", json!(1))]);
        let reverse = fields(&[("age", json!(1)), ("name", json!("a"))]);
        assert_eq!(assignments(&forward), assignments(&reverse));
    }

    #[test]
    fn assignments_empty_map() {
        let (set, args) = assignments(&FieldMap::new());
        assert_eq!(set, "");
        assert!(args.is_empty());
    }

    #[test]
    fn insert_sorted_columns_and_args() {
        let map = fields(&[("name", json!("alice")), ("age", json!(30))]);
        let sql = insert_into("user", &map).unwrap();
        assert_eq!(
            sql.text,
            "INSERT INTO `user` ( `age`, `name` ) VALUES ( ?, ? )"
        );
        assert_eq!(sql.args, vec![json!(30), json!("alice")]);
    }

    #[test]
    fn insert_rejects_empty_table() {
        let map = fields(&[("a", json!(1))]);
        assert!(matches!(insert_into("", &map), Err(Error::Misuse(_))));
    }

    #[test]
    fn insert_rejects_empty_fields() {
        assert!(matches!(
            insert_into("user", &FieldMap::new()),
            Err(Error::Misuse(_))
        ));
    }

    #[test]
    fn update_with_where() {
        let map = fields(&[("name", json!("bob")), ("age", json!(31))]);
        let sql = update("user", &map, "`id` = ?", &[json!(7)]).unwrap();
        assert_eq!(
            sql.text,
            "UPDATE `user` SET `age` = ?, `name` = ? WHERE ( `id` = ? )"
        );
        assert_eq!(sql.args, vec![json!(31), json!("bob"), json!(7)]);
    }

    #[test]
    fn update_without_where_covers_whole_table() {
        let map = fields(&[("deleted", json!(1))]);
        let sql = update("user", &map, "", &[]).unwrap();
        assert_eq!(sql.text, "UPDATE `user` SET `deleted` = ?");
    }

    #[test]
    fn update_empty_fields_is_nothing_to_update() {
        let err = update("user", &FieldMap::new(), "`id` = ?", &[json!(1)]).unwrap_err();
        assert!(err.is_nothing_to_update());
    }

    #[test]
    fn delete_with_and_without_where() {
        let sql = delete_from("user", "`id` = ?", &[json!(9)]).unwrap();
        assert_eq!(sql.text, "DELETE FROM `user` WHERE ( `id` = ? )");
        assert_eq!(sql.args, vec![json!(9)]);

        let all = delete_from("user", "", &[]).unwrap();
        assert_eq!(all.text, "DELETE FROM `user`");
        assert!(all.args.is_empty());
    }

    #[test]
    fn where_args_without_a_where_clause_are_a_misuse() {
        let map = fields(&[("name", json!("bob"))]);
        assert!(matches!(
            update("user", &map, "", &[json!(7)]),
            Err(Error::Misuse(_))
        ));
        assert!(matches!(
            delete_from("user", "", &[json!(7)]),
            Err(Error::Misuse(_))
        ));
    }

    #[test]
    fn builders_reject_empty_table() {
        assert!(update("", &fields(&[("a", json!(1))]), "", &[]).is_err());
        assert!(delete_from("", "", &[]).is_err());
    }

    #[test]
    fn raw_expression_columns_pass_through() {
        let map = fields(&[("COALESCE(a, 0)", json!(1))]);
        let (set, _) = assignments(&map);
        assert_eq!(set, "COALESCE(a, 0) = ?");
    }
}
