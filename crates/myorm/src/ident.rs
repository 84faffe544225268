//! MySQL identifier quoting.
//!
//! [`quote`] wraps a column or table name in backticks for safe inclusion in
//! SQL text, supporting dotted `table.column` notation. Names containing a
//! function-call marker (`(`) are passed through unchanged so callers may use
//! raw SQL expressions such as `COUNT(x)` where a column is expected.
//!
//! Quoting never fails; passing untrusted input as an identifier is still the
//! caller's responsibility.

/// The MySQL identifier quote character.
pub const BACKTICK: char = '`';

/// Quote an identifier for MySQL.
///
/// - `"name"` -> `` `name` ``
/// - `"t.name"` -> `` `t`.`name` ``
/// - `"COUNT(x)"` -> `COUNT(x)` (unchanged)
pub fn quote(name: &str) -> String {
    if name.contains('(') {
        // function-call expression, leave as-is
        return name.to_string();
    }
    let stripped: String = name.chars().filter(|&c| c != BACKTICK).collect();
    let dotted = stripped.replace('.', "`.`");
    format!("`{dotted}`")
}
