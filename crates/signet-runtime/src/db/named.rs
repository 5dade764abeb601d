//! `:name` parameter compilation and binding.
//!
//! Statements reference arguments by name (`WHERE id=:id`). Before execution
//! every reference is replaced with the dialect's positional placeholder and
//! the value is looked up in the serialized argument struct.

use serde_json::Value;
use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;

use signet_core::storage::{PersistenceError, StorageResult};

/// SQL with positional placeholders and the parameter names in bind order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledStatement {
    pub sql: String,
    pub names: Vec<String>,
}

/// Replace every `:name` with `placeholder(n)`. `::` casts, quoted text and
/// line comments are copied verbatim.
pub(crate) fn compile_named(sql: &str, placeholder: impl Fn(usize) -> String) -> CompiledStatement {
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push(c);
                for next in chars.by_ref() {
                    out.push(next);
                    if next == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                out.push(c);
                for next in chars.by_ref() {
                    out.push(next);
                    if next == '\n' {
                        break;
                    }
                }
            }
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                out.push_str("::");
            }
            ':' if chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || *next == '_') =>
            {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' || next == '.' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // A trailing dot belongs to the surrounding text.
                let trailing = name.len() - name.trim_end_matches('.').len();
                name.truncate(name.len() - trailing);

                names.push(name);
                out.push_str(&placeholder(names.len()));
                out.extend(std::iter::repeat('.').take(trailing));
            }
            _ => out.push(c),
        }
    }

    CompiledStatement { sql: out, names }
}

/// Resolve a dotted path against the serialized arguments.
pub(crate) fn lookup<'v>(args: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(args, |value, segment| value.as_object()?.get(segment))
}

/// Values for `names`, in order. Fails on the first missing name.
pub(crate) fn resolve_values(args: &Value, names: &[String]) -> StorageResult<Vec<Value>> {
    names
        .iter()
        .map(|name| {
            lookup(args, name).cloned().ok_or_else(|| {
                PersistenceError::statement_could_not_be_prepared()
                    .with_message(format!("could not find name [{}] in arguments", name))
            })
        })
        .collect()
}

/// Bind JSON values with the closest native type.
pub(crate) fn bind_values<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    values: &[Value],
) -> Query<'q, Any, AnyArguments<'q>> {
    for value in values {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.clone()),
            other => query.bind(other.to_string()),
        };
    }
    query
}
