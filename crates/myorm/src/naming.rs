//! Column/field name convention translation.
//!
//! Stored columns and in-memory record fields usually follow different naming
//! styles (`user_id` vs `UserId`). The two directions are independent pure
//! functions, bundled into a [`Naming`] value that is threaded through the
//! [`Client`](crate::Client) at construction time — there is no process-wide
//! mutable default.
//!
//! Consecutive capitals collapse into a single word boundary
//! (`"UserID"` -> `"user_id"`), so the two directions are not perfect
//! inverses for acronyms. This follows `heck`'s word splitting.

use heck::{ToSnakeCase, ToUpperCamelCase};
use std::fmt;
use std::sync::Arc;

/// Default column-to-field conversion: `"user_id"` -> `"UserId"`.
pub fn column_to_field(name: &str) -> String {
    name.to_lowercase().to_upper_camel_case()
}

/// Default field-to-column conversion: `"UserId"` -> `"user_id"`.
pub fn field_to_column(name: &str) -> String {
    name.to_snake_case()
}

type Convert = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A pluggable pair of name conversions carried by a client.
#[derive(Clone)]
pub struct Naming {
    column_to_field: Convert,
    field_to_column: Convert,
}

impl Naming {
    /// Create a naming convention from two conversion functions.
    pub fn new<C, F>(column_to_field: C, field_to_column: F) -> Self
    where
        C: Fn(&str) -> String + Send + Sync + 'static,
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            column_to_field: Arc::new(column_to_field),
            field_to_column: Arc::new(field_to_column),
        }
    }

    /// Translate a stored column name into a record field name.
    pub fn column_to_field(&self, name: &str) -> String {
        (self.column_to_field)(name)
    }

    /// Translate a record field name into a stored column name.
    pub fn field_to_column(&self, name: &str) -> String {
        (self.field_to_column)(name)
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(|s| column_to_field(s), |s| field_to_column(s))
    }
}

impl fmt::Debug for Naming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Naming").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_to_field_snake_to_pascal() {
        assert_eq!(column_to_field("user_id"), "UserId");
        assert_eq!(column_to_field("name"), "Name");
        assert_eq!(column_to_field("created_at"), "CreatedAt");
    }

    #[test]
    fn column_to_field_lowercases_first() {
        assert_eq!(column_to_field("USER_ID"), "UserId");
    }

    #[test]
    fn field_to_column_pascal_to_snake() {
        assert_eq!(field_to_column("UserId"), "user_id");
        assert_eq!(field_to_column("Name"), "name");
    }

    #[test]
    fn field_to_column_consecutive_capitals_single_boundary() {
        assert_eq!(field_to_column("UserID"), "user_id");
        assert_eq!(field_to_column("HTTPStatus"), "http_status");
    }

    #[test]
    fn round_trip_simple_pairs() {
        assert_eq!(field_to_column(&column_to_field("user_id")), "user_id");
        assert_eq!(column_to_field(&field_to_column("UserId")), "UserId");
    }

    #[test]
    fn custom_naming_overrides_both_directions() {
        let naming = Naming::new(|s| s.to_uppercase(), |s| s.to_lowercase());
        assert_eq!(naming.column_to_field("abc"), "ABC");
        assert_eq!(naming.field_to_column("ABC"), "abc");
    }
}
