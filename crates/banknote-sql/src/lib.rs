//! SQL text building blocks.
//!
//! DDL and row statements are built as plain strings: warehouses rarely
//! support parameter binding for identifiers, so names are interpolated
//! verbatim. Every identifier goes through [`validate_ident`] first, and
//! values are rendered through the tagged [`Value`] type so quoting is
//! decided by the caller rather than guessed from the runtime type.

mod stmt;
pub use stmt::*;

mod value;
pub use value::*;

#[cfg(test)]
mod tests;

/// An identifier that failed the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier `{ident}` must start with a letter or underscore")]
    BadStart { ident: String },

    #[error("identifier `{ident}` contains disallowed character {ch:?}")]
    BadChar { ident: String, ch: char },
}

/// Check that `name` is safe to interpolate into SQL unquoted.
///
/// Allowed: an ASCII letter or `_`, followed by ASCII letters, digits, `_`
/// or `$`. A single `.` separating two such parts is also accepted so
/// schema-qualified table names (`analytics.original_data`) pass.
///
/// # Example
/// ```
/// use banknote_sql::validate_ident;
/// assert!(validate_ident("original_data").is_ok());
/// assert!(validate_ident("analytics.original_data").is_ok());
/// assert!(validate_ident("x; DROP TABLE y").is_err());
/// ```
pub fn validate_ident(name: &str) -> Result<&str, IdentError> {
    if name.is_empty() {
        return Err(IdentError::Empty);
    }

    for part in name.splitn(2, '.') {
        validate_part(name, part)?;
    }

    Ok(name)
}

fn validate_part(whole: &str, part: &str) -> Result<(), IdentError> {
    let mut chars = part.chars();
    match chars.next() {
        None => {
            return Err(IdentError::BadStart {
                ident: whole.to_owned(),
            });
        }
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        Some(_) => {
            return Err(IdentError::BadStart {
                ident: whole.to_owned(),
            });
        }
    }

    for ch in chars {
        if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '$') {
            return Err(IdentError::BadChar {
                ident: whole.to_owned(),
                ch,
            });
        }
    }

    Ok(())
}

/// A SQL string literal wrapper.
///
/// Display writes the value quoted with single quotes, doubling embedded
/// quotes.
///
/// # Example
/// ```
/// use banknote_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}
