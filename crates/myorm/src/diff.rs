//! Snapshot diffing: the minimal column set between two versions of a record.
//!
//! Both snapshots are flattened to JSON objects via serde, then compared
//! field-by-field with structural equality — nested composite values compare
//! by content, not identity. The diff is one-directional: a field present in
//! `before` but absent from `after` is never included, because a partial
//! `after` means "no intended change" for the omitted fields, not deletion.

use crate::builder::FieldMap;
use crate::error::{Error, Result};
use crate::naming::Naming;
use serde::Serialize;
use serde_json::{Map, Value};

/// Compute the changed fields between two record snapshots.
///
/// A field of `after` is included iff it is absent from `before` or its value
/// is not deeply equal to the `before` value. Result keys are translated with
/// the convention's `field_to_column`, ready for
/// [`assignments`](crate::builder::assignments).
pub fn diff<B, A>(before: &B, after: &A, naming: &Naming) -> Result<FieldMap>
where
    B: Serialize,
    A: Serialize,
{
    let before = to_object(before, "before")?;
    let after = to_object(after, "after")?;
    let mut changed = FieldMap::new();
    for (field, value) in after {
        if before.get(&field) == Some(&value) {
            continue;
        }
        changed.insert(naming.field_to_column(&field), value);
    }
    Ok(changed)
}

fn to_object<T: Serialize>(record: &T, which: &str) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::UnsupportedShape(format!(
            "{which} snapshot is not a record"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct User {
        id: i64,
        name: String,
    }

    #[test]
    fn unchanged_fields_are_excluded() {
        let before = User { id: 1, name: "a".into() };
        let after = User { id: 1, name: "b".into() };
        let changed = diff(&before, &after, &Naming::default()).unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed["name"], json!("b"));
    }

    #[test]
    fn identical_snapshots_diff_to_empty() {
        let before = User { id: 1, name: "a".into() };
        let after = User { id: 1, name: "a".into() };
        let changed = diff(&before, &after, &Naming::default()).unwrap();
        assert!(changed.is_empty());
    }

    #[derive(Serialize)]
    struct UserWithEmail {
        id: i64,
        name: String,
        email: String,
    }

    #[test]
    fn fields_new_in_after_are_included() {
        let before = User { id: 1, name: "a".into() };
        let after = UserWithEmail {
            id: 1,
            name: "a".into(),
            email: "a@example.com".into(),
        };
        let changed = diff(&before, &after, &Naming::default()).unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed["email"], json!("a@example.com"));
    }

    #[test]
    fn fields_removed_in_after_are_ignored() {
        let before = UserWithEmail {
            id: 1,
            name: "a".into(),
            email: "a@example.com".into(),
        };
        let after = User { id: 1, name: "a".into() };
        let changed = diff(&before, &after, &Naming::default()).unwrap();
        assert!(changed.is_empty());
    }

    #[derive(Serialize)]
    struct Profile {
        id: i64,
        tags: Vec<String>,
    }

    #[test]
    fn nested_values_compare_structurally() {
        let before = Profile { id: 1, tags: vec!["x".into(), "y".into()] };
        let same = Profile { id: 1, tags: vec!["x".into(), "y".into()] };
        assert!(diff(&before, &same, &Naming::default()).unwrap().is_empty());

        let other = Profile { id: 1, tags: vec!["x".into(), "z".into()] };
        let changed = diff(&before, &other, &Naming::default()).unwrap();
        assert_eq!(changed["tags"], json!(["x", "z"]));
    }

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Renamed {
        user_id: i64,
        display_name: String,
    }

    #[test]
    fn result_keys_go_through_field_to_column() {
        let before = Renamed { user_id: 1, display_name: "a".into() };
        let after = Renamed { user_id: 1, display_name: "b".into() };
        let changed = diff(&before, &after, &Naming::default()).unwrap();
        // serde emits "DisplayName"; the diff emits "display_name".
        assert_eq!(changed["display_name"], json!("b"));
    }

    #[test]
    fn non_record_snapshot_is_rejected() {
        let err = diff(&1_i64, &2_i64, &Naming::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)));
    }
}
