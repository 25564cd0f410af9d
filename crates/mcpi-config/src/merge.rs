//! Precedence merge of raw configuration records.
//!
//! Nested objects are merged key by key. The top-level `servers` array is
//! merged by server `name`: a later entry with the same name replaces the
//! earlier one wholesale, new names are appended. Everything else is
//! replaced by the later value.

use serde_json::{Map, Value};

/// Key holding the server list at the top level of a config record.
pub const SERVERS_KEY: &str = "servers";

/// Key holding the defaults record at the top level of a config record.
pub const DEFAULTS_KEY: &str = "defaults";

/// Merge `sources` in increasing precedence on top of an empty base.
pub fn merge_sources<I>(sources: I) -> Value
where
    I: IntoIterator<Item = Map<String, Value>>,
{
    let mut merged = Map::new();
    merged.insert(SERVERS_KEY.to_string(), Value::Array(Vec::new()));
    merged.insert(DEFAULTS_KEY.to_string(), Value::Object(Map::new()));

    for source in sources {
        merge_root(&mut merged, source);
    }

    Value::Object(merged)
}

fn merge_root(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        let merged = match (base.remove(&key), value) {
            (Some(Value::Array(mut existing)), Value::Array(incoming)) if key == SERVERS_KEY => {
                merge_servers(&mut existing, incoming);
                Value::Array(existing)
            }
            (Some(Value::Object(mut existing)), Value::Object(incoming)) => {
                deep_merge(&mut existing, incoming);
                Value::Object(existing)
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
}

/// Recursively merge `overlay` into `base`; later scalars and arrays win.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        let merged = match (base.remove(&key), value) {
            (Some(Value::Object(mut existing)), Value::Object(incoming)) => {
                deep_merge(&mut existing, incoming);
                Value::Object(existing)
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
}

/// Merge server entries by `name`, replacing matches in place.
pub fn merge_servers(base: &mut Vec<Value>, incoming: Vec<Value>) {
    for server in incoming {
        let position = server_name(&server)
            .and_then(|name| base.iter().position(|s| server_name(s) == Some(name)));
        match position {
            Some(index) => base[index] = server,
            None => base.push(server),
        }
    }
}

fn server_name(server: &Value) -> Option<&str> {
    server.get("name").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn empty_sources_yield_base() {
        let merged = merge_sources(Vec::new());
        assert_eq!(merged, json!({"servers": [], "defaults": {}}));
    }

    #[test]
    fn same_name_server_replaced_entirely() {
        let a = obj(json!({"servers": [
            {"name": "shared", "transport": "stdio", "command": "old", "env": {"A": "1"}},
            {"name": "only-a", "transport": "stdio", "command": "a"}
        ]}));
        let b = obj(json!({"servers": [
            {"name": "shared", "transport": "sse", "url": "http://new"},
            {"name": "only-b", "transport": "stdio", "command": "b"}
        ]}));

        let merged = merge_sources([a, b]);
        let servers = merged["servers"].as_array().unwrap();
        assert_eq!(servers.len(), 3);
        assert_eq!(
            servers[0],
            json!({"name": "shared", "transport": "sse", "url": "http://new"})
        );
        assert_eq!(servers[1]["name"], "only-a");
        assert_eq!(servers[2]["name"], "only-b");
    }

    #[test]
    fn defaults_deep_merged() {
        let a = obj(json!({"defaults": {"output": "json", "pretty": true, "nested": {"x": 1, "y": 2}}}));
        let b = obj(json!({"defaults": {"pretty": false, "nested": {"y": 3}}}));
        let merged = merge_sources([a, b]);
        assert_eq!(
            merged["defaults"],
            json!({"output": "json", "pretty": false, "nested": {"x": 1, "y": 3}})
        );
    }

    #[test]
    fn non_server_arrays_replaced_outright() {
        let a = obj(json!({"tags": ["a", "b"]}));
        let b = obj(json!({"tags": ["c"]}));
        let merged = merge_sources([a, b]);
        assert_eq!(merged["tags"], json!(["c"]));
    }

    #[test]
    fn nested_servers_key_is_not_special() {
        let a = obj(json!({"defaults": {"servers": [{"name": "x", "v": 1}]}}));
        let b = obj(json!({"defaults": {"servers": [{"name": "y", "v": 2}]}}));
        let merged = merge_sources([a, b]);
        assert_eq!(merged["defaults"]["servers"], json!([{"name": "y", "v": 2}]));
    }

    #[test]
    fn scalar_overrides_object_and_back() {
        let mut base = obj(json!({"a": {"b": 1}}));
        deep_merge(&mut base, obj(json!({"a": 5})));
        assert_eq!(base["a"], json!(5));
        deep_merge(&mut base, obj(json!({"a": {"c": 2}})));
        assert_eq!(base["a"], json!({"c": 2}));
    }

    #[test]
    fn nameless_servers_appended() {
        let mut base = vec![json!({"transport": "stdio"})];
        merge_servers(&mut base, vec![json!({"transport": "sse"})]);
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn servers_replacing_non_array_value() {
        let a = obj(json!({"servers": "oops"}));
        let b = obj(json!({"servers": [{"name": "x"}]}));
        let merged = merge_sources([a, b]);
        assert_eq!(merged["servers"], json!([{"name": "x"}]));
    }

    #[test]
    fn three_sources_last_wins() {
        let user = obj(json!({"servers": [{"name": "s", "rev": 1}], "defaults": {"output": "json"}}));
        let project = obj(json!({"servers": [{"name": "s", "rev": 2}]}));
        let explicit = obj(json!({"servers": [{"name": "s", "rev": 3}], "defaults": {"pretty": false}}));
        let merged = merge_sources([user, project, explicit]);
        assert_eq!(merged["servers"], json!([{"name": "s", "rev": 3}]));
        assert_eq!(merged["defaults"], json!({"output": "json", "pretty": false}));
    }
}
