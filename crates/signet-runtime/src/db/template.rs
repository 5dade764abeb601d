use minijinja::Environment;
use serde_json::Value;

use signet_core::storage::{PersistenceError, StorageResult};

/// Renders statement bodies as Jinja templates against the serialized
/// arguments.
///
/// Whitespace around block tags is kept as written so inline
/// `{% if %}...{% endif %}` clauses stay separated from the next line.
pub(crate) struct StatementRenderer {
    env: Environment<'static>,
}

impl StatementRenderer {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    pub fn render(&self, stmt_id: &str, template: &str, args: &Value) -> StorageResult<String> {
        self.env.render_str(template, args).map_err(|e| {
            PersistenceError::statement_could_not_be_prepared().with_message(format!(
                "failed rendering statement template. Statement id '{}' ({}) error: {}",
                stmt_id, template, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LIST: &str = "SELECT id FROM admins
{% if filter_group %}
WHERE {{ filter_group.filters | join(' AND ') }}
{% endif %}
{% if order %}
ORDER BY {{ order.by }} {{ order.direction }}
{% endif %}
{% if pagination %}
LIMIT :pagination.limit OFFSET :pagination.offset
{% endif %}";

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_render_without_optional_parts() {
        let renderer = StatementRenderer::new();
        let sql = renderer.render("admin.list", LIST, &json!({})).unwrap();
        assert_eq!(sql.trim(), "SELECT id FROM admins");
    }

    #[test]
    fn test_render_with_filters_order_and_pagination() {
        let renderer = StatementRenderer::new();
        let args = json!({
            "filter_group": {"filters": ["a=:a", "(b='x' OR b='y')"]},
            "order": {"by": "creation_date", "direction": "desc"},
            "pagination": {"limit": 5, "offset": 0}
        });
        let sql = renderer.render("admin.list", LIST, &args).unwrap();
        assert_eq!(
            squash(&sql),
            "SELECT id FROM admins WHERE a=:a AND (b='x' OR b='y') ORDER BY creation_date desc LIMIT :pagination.limit OFFSET :pagination.offset"
        );
    }

    #[test]
    fn test_inline_blocks_keep_line_breaks() {
        let renderer = StatementRenderer::new();
        let template = "SELECT id FROM admins
{% if filter_group %}WHERE {{ filter_group.filters | join(' AND ') }}{% endif %}
{% if order %}ORDER BY {{ order.by }} {{ order.direction }}{% endif %}
{% if pagination %}LIMIT :pagination.limit OFFSET :pagination.offset{% endif %}";
        let args = json!({
            "filter_group": {"filters": ["slot>=:slot"]},
            "order": {"by": "slot", "direction": "desc"},
            "pagination": {"limit": 2, "offset": 0}
        });
        let sql = renderer.render("admin.list", template, &args).unwrap();
        assert_eq!(
            sql,
            "SELECT id FROM admins\nWHERE slot>=:slot\nORDER BY slot desc\nLIMIT :pagination.limit OFFSET :pagination.offset"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = StatementRenderer::new();
        let args = json!({"order": {"by": "last_update", "direction": "asc"}});
        let first = renderer.render("admin.list", LIST, &args).unwrap();
        let second = renderer.render("admin.list", LIST, &args).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_template_fails_to_prepare() {
        let renderer = StatementRenderer::new();
        let err = renderer
            .render("admin.broken", "SELECT {% if %}", &json!({}))
            .unwrap_err();
        assert!(err.is_statement_could_not_be_prepared());
        assert!(err.to_string().contains("admin.broken"));
    }
}
