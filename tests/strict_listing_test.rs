// Integration tests for strict tool listings
// Drives the public API end to end and the binary's --list-tools mode

use std::io::Write;
use std::process::Command;

use kodegen_strict_schema::catalog::{CatalogLister, ToolCatalog};
use kodegen_strict_schema::commands::collect_tools;
use kodegen_strict_schema::{
    install_strict_listing, Installation, StrictOptions, StrictToolLister, ToolRoute, ToolService,
};
use serde_json::{json, Value};

const CATALOG: &str = r#"{
    "tools": [
        {
            "name": "conport_log_decision",
            "description": "Log a decision",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "workspace_id": {"type": "string"},
                    "tags": {"anyOf": [{"type": "array", "items": {"type": "string"}}, {"type": "null"}]},
                    "metadata": {
                        "anyOf": [
                            {"type": "object", "additionalProperties": true},
                            {"type": "null"}
                        ]
                    }
                },
                "required": ["workspace_id"]
            }
        },
        {
            "name": "conport_get_product_context",
            "description": "Read product context",
            "inputSchema": {}
        },
        {
            "name": "conport_batch_log_items",
            "description": "Log several items",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {"type": "object", "properties": {"summary": {"type": "string"}}}
                    },
                    "labels": {
                        "additionalProperties": {
                            "type": "object",
                            "properties": {"color": {"type": "string"}}
                        }
                    },
                    "span": {
                        "type": "array",
                        "items": [{"type": "integer"}, {"type": "object"}]
                    }
                }
            }
        }
    ]
}"#;

fn write_catalog() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(CATALOG.as_bytes()).expect("write catalog");
    file
}

/// Asserts every object-typed node reachable from `schema` is closed
fn assert_strict(schema: &Value, path: &str) {
    let Value::Object(obj) = schema else {
        return;
    };

    if obj.get("type") == Some(&json!("object")) {
        assert_eq!(
            obj.get("additionalProperties"),
            Some(&json!(false)),
            "object schema at {path} is not closed"
        );
    }

    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = obj.get(key) {
            for (i, variant) in variants.iter().enumerate() {
                assert_strict(variant, &format!("{path}/{key}/{i}"));
            }
        }
    }
    if let Some(Value::Object(properties)) = obj.get("properties") {
        for (name, property) in properties {
            assert_strict(property, &format!("{path}/properties/{name}"));
        }
    }
    match obj.get("items") {
        Some(Value::Array(tuple)) => {
            for (i, item) in tuple.iter().enumerate() {
                assert_strict(item, &format!("{path}/items/{i}"));
            }
        }
        Some(items) => assert_strict(items, &format!("{path}/items")),
        None => {}
    }
    if let Some(extra) = obj.get("additionalProperties") {
        assert_strict(extra, &format!("{path}/additionalProperties"));
    }
}

/// A handle whose listing capability is an already-wrapped lister
struct Rewrapped(StrictToolLister<CatalogLister>);

impl ToolService for Rewrapped {
    type Lister = StrictToolLister<CatalogLister>;

    fn tool_lister(&self) -> Option<Self::Lister> {
        Some(self.0.clone())
    }
}

#[tokio::test]
async fn test_catalog_listing_is_strict_end_to_end() {
    let file = write_catalog();
    let catalog = ToolCatalog::from_file(file.path()).expect("load catalog");

    let installation = install_strict_listing(&catalog, &StrictOptions::default());
    assert!(installation.is_installed());
    let route = ToolRoute::from_installation(installation, || catalog.tool_lister());

    let tools = collect_tools(&route).await.expect("collect tools");

    let names: Vec<&str> = tools.iter().map(|t| &*t.name).collect();
    assert_eq!(
        names,
        vec![
            "conport_log_decision",
            "conport_get_product_context",
            "conport_batch_log_items"
        ]
    );

    for tool in &tools {
        assert_strict(&Value::Object(tool.input_schema.as_ref().clone()), &tool.name);
    }
    assert!(tools[1].input_schema.is_empty());
    assert_eq!(
        tools[0].input_schema["properties"]["metadata"]["anyOf"][0]["additionalProperties"],
        json!(false)
    );
    assert_eq!(tools[0].input_schema["required"], json!(["workspace_id"]));

    let batch = &tools[2].input_schema["properties"];
    assert!(batch["labels"].get("type").is_none());
    assert_eq!(
        batch["labels"]["additionalProperties"]["additionalProperties"],
        json!(false)
    );
    assert_eq!(batch["span"]["items"][1]["additionalProperties"], json!(false));
}

#[test]
fn test_schema_valued_additional_properties_are_checked() {
    let open_map = json!({
        "additionalProperties": {"type": "object", "properties": {"color": {"type": "string"}}}
    });

    let caught = std::panic::catch_unwind(|| assert_strict(&open_map, "labels"));

    assert!(caught.is_err(), "an open object under additionalProperties must be reported");
}

#[tokio::test]
async fn test_double_installation_matches_single() {
    let catalog = ToolCatalog::from_json(CATALOG).expect("parse catalog");

    let Installation::Installed(once) = install_strict_listing(&catalog, &StrictOptions::default())
    else {
        panic!("expected installation");
    };
    let Installation::Installed(twice) =
        install_strict_listing(&Rewrapped(once.clone()), &StrictOptions::default())
    else {
        panic!("expected second installation");
    };

    let single = collect_tools(&ToolRoute::Strict(once)).await.expect("single");
    let double = collect_tools(&ToolRoute::Strict(twice)).await.expect("double");

    assert_eq!(single, double);
}

#[test]
fn test_binary_prints_strict_listing() {
    let file = write_catalog();

    let output = Command::new(env!("CARGO_BIN_EXE_kodegen-strict"))
        .arg("--catalog")
        .arg(file.path())
        .arg("--list-tools")
        .env_remove("KODEGEN_STRICT_MAX_DEPTH")
        .env_remove("KODEGEN_STRICT_OUTPUT_SCHEMAS")
        .output()
        .expect("Failed to run kodegen-strict");

    assert!(
        output.status.success(),
        "kodegen-strict --list-tools failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let listing: Value = serde_json::from_slice(&output.stdout).expect("JSON listing on stdout");
    let tools = listing["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 3);
    for tool in tools {
        assert_strict(&tool["inputSchema"], tool["name"].as_str().unwrap_or("?"));
    }
    assert_eq!(
        tools[2]["inputSchema"]["properties"]["items"]["items"]["additionalProperties"],
        json!(false)
    );
}

#[test]
fn test_binary_without_source_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_kodegen-strict"))
        .arg("--list-tools")
        .output()
        .expect("Failed to run kodegen-strict");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("No tool source"),
        "stderr should explain the missing source. Got: {stderr}"
    );
}
