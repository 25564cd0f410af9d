//! Flattening of tool, resource and prompt descriptors.

use serde::Serialize;
use serde_json::Value;

/// A tool, resource or prompt as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl Descriptor {
    /// Build from a raw descriptor object.
    ///
    /// A resource without a `name` is named after its `uri`. The schema is
    /// taken from `inputSchema`, or `schema` when that is absent.
    pub fn from_value(raw: &Value) -> Self {
        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
        let present = |key: &str| raw.get(key).filter(|v| !v.is_null()).cloned();

        let uri = text("uri");
        Self {
            name: text("name").or_else(|| uri.clone()).unwrap_or_default(),
            description: text("description").unwrap_or_default(),
            input_schema: present("inputSchema").or_else(|| present("schema")),
            uri,
            mime_type: text("mimeType"),
            arguments: present("arguments"),
        }
    }
}

pub fn normalize_all(items: &[Value]) -> Vec<Descriptor> {
    items.iter().map(Descriptor::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_with_schema() {
        let tool = Descriptor::from_value(&json!({
            "name": "read_file",
            "description": "Read a file",
            "inputSchema": {"type": "object", "required": ["path"]}
        }));
        assert_eq!(tool.name, "read_file");
        assert_eq!(tool.description, "Read a file");
        assert_eq!(tool.input_schema.unwrap()["required"][0], "path");
        assert!(tool.uri.is_none());
    }

    #[test]
    fn schema_key_fallback() {
        let tool = Descriptor::from_value(&json!({"name": "t", "schema": {"type": "object"}}));
        assert_eq!(tool.input_schema, Some(json!({"type": "object"})));
        assert_eq!(tool.description, "");
    }

    #[test]
    fn resource_fields() {
        let resource = Descriptor::from_value(&json!({
            "uri": "file:///tmp/a.txt",
            "name": "a.txt",
            "mimeType": "text/plain"
        }));
        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "a.txt",
                "description": "",
                "uri": "file:///tmp/a.txt",
                "mimeType": "text/plain"
            })
        );
    }

    #[test]
    fn nameless_resource_uses_uri() {
        let resource = Descriptor::from_value(&json!({"uri": "mem://x"}));
        assert_eq!(resource.name, "mem://x");
    }

    #[test]
    fn prompt_arguments_kept() {
        let prompt = Descriptor::from_value(&json!({
            "name": "summarize",
            "arguments": [{"name": "text", "required": true}]
        }));
        assert_eq!(prompt.arguments.unwrap()[0]["name"], "text");
    }

    #[test]
    fn normalize_all_keeps_order() {
        let items = vec![json!({"name": "b"}), json!({"name": "a"})];
        let names: Vec<_> = normalize_all(&items).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
