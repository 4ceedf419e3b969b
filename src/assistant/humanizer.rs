use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use super::store::{NameResolver, Row};

pub const NO_RESULTS: &str = "No results found.";
const MAX_RENDERED_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Lookup {
    User,
    Property,
    Room,
}

/// Foreign-key column, the display column added next to it, and where its
/// names come from.
const ID_COLUMNS: [(&str, &str, Lookup); 5] = [
    ("user_id", "user_name", Lookup::User),
    ("owner_id", "owner_name", Lookup::User),
    ("tenant_id", "tenant_name", Lookup::User),
    ("property_id", "property_name", Lookup::Property),
    ("room_id", "room_name", Lookup::Room),
];

fn id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Adds `*_name` columns for recognised id columns, resolving every distinct
/// id of a kind with a single lookup. Existing columns are never removed.
pub async fn humanize(rows: &mut [Row], resolver: &dyn NameResolver) -> Result<(), sqlx::Error> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut wanted: HashMap<Lookup, BTreeSet<i64>> = HashMap::new();
    for row in rows.iter() {
        for (column, _, lookup) in ID_COLUMNS {
            if let Some(id) = row.get(column).and_then(id_of) {
                wanted.entry(lookup).or_default().insert(id);
            }
        }
    }

    let mut names: HashMap<Lookup, HashMap<i64, String>> = HashMap::new();
    for (lookup, ids) in wanted {
        let ids: Vec<i64> = ids.into_iter().collect();
        let resolved = match lookup {
            Lookup::User => resolver.user_names(&ids).await?,
            Lookup::Property => resolver.property_names(&ids).await?,
            Lookup::Room => resolver.room_labels(&ids).await?,
        };
        tracing::debug!(?lookup, requested = ids.len(), resolved = resolved.len(), "resolved names");
        names.insert(lookup, resolved);
    }

    for row in rows.iter_mut() {
        for (column, name_column, lookup) in ID_COLUMNS {
            let name = row
                .get(column)
                .and_then(id_of)
                .and_then(|id| names.get(&lookup)?.get(&id));
            if let Some(name) = name {
                row.insert(name_column.to_string(), Value::String(name.clone()));
            }
        }
    }

    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_fields(row: &Row, separator: &str) -> String {
    row.iter()
        .map(|(key, value)| format!("{key}: {}", display_value(value)))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Compact text summary of a result set.
pub fn render(rows: &[Row]) -> String {
    match rows {
        [] => NO_RESULTS.to_string(),
        [row] => render_fields(row, "\n"),
        _ => {
            let mut lines: Vec<String> = rows
                .iter()
                .take(MAX_RENDERED_ROWS)
                .enumerate()
                .map(|(i, row)| format!("{}. {}", i + 1, render_fields(row, " | ")))
                .collect();
            if rows.len() > MAX_RENDERED_ROWS {
                lines.push(format!(
                    "\n... and {} more results",
                    rows.len() - MAX_RENDERED_ROWS
                ));
            }
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeResolver {
        users: HashMap<i64, String>,
        properties: HashMap<i64, String>,
        rooms: HashMap<i64, String>,
        calls: Mutex<Vec<(&'static str, Vec<i64>)>>,
    }

    impl FakeResolver {
        fn answer(
            &self,
            kind: &'static str,
            table: &HashMap<i64, String>,
            ids: &[i64],
        ) -> HashMap<i64, String> {
            self.calls.lock().unwrap().push((kind, ids.to_vec()));
            ids.iter()
                .filter_map(|id| table.get(id).map(|n| (*id, n.clone())))
                .collect()
        }
    }

    #[async_trait]
    impl NameResolver for FakeResolver {
        async fn user_names(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error> {
            Ok(self.answer("users", &self.users, ids))
        }
        async fn property_names(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error> {
            Ok(self.answer("properties", &self.properties, ids))
        }
        async fn room_labels(&self, ids: &[i64]) -> Result<HashMap<i64, String>, sqlx::Error> {
            Ok(self.answer("rooms", &self.rooms, ids))
        }
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn known_user_gets_companion_name() {
        let resolver = FakeResolver {
            users: HashMap::from([(5, "Alice".to_string())]),
            ..Default::default()
        };
        let mut rows = vec![row(json!({"user_id": 5}))];

        humanize(&mut rows, &resolver).await.unwrap();

        assert_eq!(rows, vec![row(json!({"user_id": 5, "user_name": "Alice"}))]);
    }

    #[tokio::test]
    async fn unknown_id_leaves_row_untouched() {
        let resolver = FakeResolver::default();
        let mut rows = vec![row(json!({"user_id": 99, "note": "x"}))];

        humanize(&mut rows, &resolver).await.unwrap();

        assert_eq!(rows, vec![row(json!({"user_id": 99, "note": "x"}))]);
    }

    #[tokio::test]
    async fn ids_are_batched_once_per_entity() {
        let resolver = FakeResolver {
            users: HashMap::from([(1, "Owen".to_string()), (2, "Tina".to_string())]),
            rooms: HashMap::from([(7, "Sunrise Dorm - Single".to_string())]),
            ..Default::default()
        };
        let mut rows = vec![
            row(json!({"owner_id": 1, "tenant_id": 2, "room_id": 7})),
            row(json!({"owner_id": 1, "tenant_id": 2, "room_id": 7})),
        ];

        humanize(&mut rows, &resolver).await.unwrap();

        let mut calls = resolver.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec![("rooms", vec![7]), ("users", vec![1, 2])]);
        assert_eq!(rows[1]["owner_name"], "Owen");
        assert_eq!(rows[1]["tenant_name"], "Tina");
        assert_eq!(rows[0]["room_name"], "Sunrise Dorm - Single");
    }

    #[tokio::test]
    async fn empty_result_makes_no_lookups() {
        let resolver = FakeResolver::default();
        let mut rows: Vec<Row> = Vec::new();
        humanize(&mut rows, &resolver).await.unwrap();
        assert!(resolver.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn render_empty() {
        assert_eq!(render(&[]), "No results found.");
    }

    #[test]
    fn render_single_row_one_field_per_line() {
        assert_eq!(render(&[row(json!({"a": 1, "b": 2}))]), "a: 1\nb: 2");
    }

    #[test]
    fn render_strings_unquoted_and_null_literal() {
        assert_eq!(
            render(&[row(json!({"name": "Loft", "end_date": null}))]),
            "name: Loft\nend_date: null"
        );
    }

    #[test]
    fn render_truncates_after_ten_rows() {
        let rows: Vec<Row> = (1..=12).map(|i| row(json!({"id": i, "x": "y"}))).collect();
        let text = render(&rows);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "1. id: 1 | x: y");
        assert_eq!(lines[9], "10. id: 10 | x: y");
        assert!(!text.contains("11. "));
        assert!(text.ends_with("... and 2 more results"));
    }

    #[test]
    fn render_exactly_ten_rows_has_no_notice() {
        let rows: Vec<Row> = (1..=10).map(|i| row(json!({ "id": i }))).collect();
        assert!(!render(&rows).contains("more results"));
    }
}
