use serde_json::{Map, Value};

type JsonObject = Map<String, Value>;

/// Default nesting limit, matching serde_json's own parser recursion limit.
pub const DEFAULT_MAX_DEPTH: usize = 128;

const ADDITIONAL_PROPERTIES: &str = "additionalProperties";

/// Errors raised while normalizing a schema tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// Schema nesting exceeds the configured limit; the tree was left untouched
    #[error("schema nesting exceeds the maximum depth of {max_depth}")]
    TooDeep { max_depth: usize },
}

/// Forces `additionalProperties: false` on every object-typed subschema.
///
/// Subschemas are reached through `properties`, `items` (single schema or
/// tuple form), schema-valued `additionalProperties`, `anyOf`, `oneOf` and
/// `allOf`. Anything that is not a JSON object is a leaf and passes through
/// unchanged, so malformed fragments are tolerated rather than rejected.
///
/// Normalization is idempotent. Trees nested deeper than `max_depth` are
/// rejected before any node is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaNormalizer {
    max_depth: usize,
}

impl SchemaNormalizer {
    /// Create a normalizer that rejects trees nested deeper than `max_depth`
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Normalize `schema` in place.
    ///
    /// Non-object values are returned unchanged. On error nothing has been
    /// modified.
    pub fn normalize(&self, schema: &mut Value) -> Result<(), NormalizeError> {
        match schema {
            Value::Object(obj) => self.normalize_object(obj),
            _ => Ok(()),
        }
    }

    /// Normalize a schema that is already known to be an object, such as an
    /// MCP tool's `inputSchema`.
    pub fn normalize_object(&self, schema: &mut JsonObject) -> Result<(), NormalizeError> {
        self.check_depth(schema, 1)?;
        rewrite_object(schema);
        Ok(())
    }

    /// Return a normalized copy of `schema`, leaving the input untouched.
    pub fn normalized(&self, schema: &Value) -> Result<Value, NormalizeError> {
        let mut copy = schema.clone();
        self.normalize(&mut copy)?;
        Ok(copy)
    }

    fn check_depth(&self, schema: &JsonObject, depth: usize) -> Result<(), NormalizeError> {
        if depth > self.max_depth {
            return Err(NormalizeError::TooDeep {
                max_depth: self.max_depth,
            });
        }

        for child in subschemas(schema) {
            if let Value::Object(obj) = child {
                self.check_depth(obj, depth + 1)?;
            }
        }

        Ok(())
    }
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Normalize `schema` in place using the default depth limit
pub fn normalize_schema(schema: &mut Value) -> Result<(), NormalizeError> {
    SchemaNormalizer::default().normalize(schema)
}

fn is_object_type(schema: &JsonObject) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("object")
}

fn rewrite(schema: &mut Value) {
    if let Value::Object(obj) = schema {
        rewrite_object(obj);
    }
}

fn rewrite_object(schema: &mut JsonObject) {
    // Any schema-valued additionalProperties is discarded here, so it is
    // never collected as a child below.
    if is_object_type(schema) {
        schema.insert(ADDITIONAL_PROPERTIES.to_string(), Value::Bool(false));
    }

    for child in subschemas_mut(schema) {
        rewrite(child);
    }
}

/// Direct subschemas of `schema`, as `rewrite_object` will visit them.
fn subschemas(schema: &JsonObject) -> Vec<&Value> {
    let object_typed = is_object_type(schema);
    let mut children = Vec::new();

    for (key, value) in schema {
        match (key.as_str(), value) {
            ("anyOf" | "oneOf" | "allOf", Value::Array(variants)) => children.extend(variants),
            ("properties", Value::Object(properties)) => children.extend(properties.values()),
            ("items", Value::Array(tuple)) => children.extend(tuple),
            ("items", items) => children.push(items),
            (ADDITIONAL_PROPERTIES, extra) if extra.is_object() && !object_typed => {
                children.push(extra)
            }
            _ => {}
        }
    }

    children
}

fn subschemas_mut(schema: &mut JsonObject) -> Vec<&mut Value> {
    let mut children = Vec::new();

    for (key, value) in schema.iter_mut() {
        match (key.as_str(), value) {
            ("anyOf" | "oneOf" | "allOf", Value::Array(variants)) => {
                children.extend(variants.iter_mut())
            }
            ("properties", Value::Object(properties)) => children.extend(properties.values_mut()),
            ("items", Value::Array(tuple)) => children.extend(tuple.iter_mut()),
            ("items", items) => children.push(items),
            (ADDITIONAL_PROPERTIES, extra) if extra.is_object() => children.push(extra),
            _ => {}
        }
    }

    children
}
