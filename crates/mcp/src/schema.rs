// Declarative tool input schemas and the generic argument validator

use serde_json::{json, Map, Value};

/// Accepted JSON type of an argument
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Boolean,
    /// Non-negative whole number
    Integer,
    /// String restricted to a fixed set of values
    Enum(&'static [&'static str]),
}

impl FieldKind {
    fn describe(&self) -> String {
        match self {
            Self::String => "a string".to_string(),
            Self::Boolean => "a boolean".to_string(),
            Self::Integer => "a non-negative integer".to_string(),
            Self::Enum(values) => format!("one of {}", values.join(", ")),
        }
    }

    /// Check a value, returning its normalized form
    fn accept(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::String, Value::String(_)) | (Self::Boolean, Value::Bool(_)) => {
                Some(value.clone())
            }
            (Self::Integer, Value::Number(n)) => match n.as_u64() {
                Some(whole) => Some(Value::from(whole)),
                // 10.0 is a whole number too
                None => n
                    .as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                    .map(|f| Value::from(f as u64)),
            },
            (Self::Enum(values), Value::String(s)) if values.contains(&s.as_str()) => {
                Some(value.clone())
            }
            _ => None,
        }
    }
}

/// One declared argument
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    pub description: &'static str,
}

impl FieldSpec {
    fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            description,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::optional(name, FieldKind::String, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::optional(name, FieldKind::Boolean, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::optional(name, FieldKind::Integer, description)
    }

    pub fn one_of(
        name: &'static str,
        values: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self::optional(name, FieldKind::Enum(values), description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value used when the argument is absent
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = match &self.kind {
            FieldKind::String => json!({"type": "string"}),
            FieldKind::Boolean => json!({"type": "boolean"}),
            FieldKind::Integer => json!({"type": "integer", "minimum": 0}),
            FieldKind::Enum(values) => json!({"type": "string", "enum": values}),
        };
        schema["description"] = Value::from(self.description);
        if let Some(default) = &self.default {
            schema["default"] = default.clone();
        }
        schema
    }
}

/// Validation failure, listing every offending argument
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid arguments: {}", .violations.join("; "))]
pub struct SchemaError {
    pub violations: Vec<String>,
}

/// Ordered set of argument declarations for one tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate raw call arguments.
    ///
    /// Absent or `null` arguments are treated as `{}`. Undeclared keys are
    /// dropped and declared defaults fill in absent optional fields.
    pub fn validate(&self, arguments: Option<&Value>) -> Result<ToolArgs, SchemaError> {
        let empty = Map::new();
        let raw = match arguments {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(SchemaError {
                    violations: vec![format!(
                        "arguments must be an object, got {}",
                        json_type_name(other)
                    )],
                })
            }
        };

        let mut values = Map::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            match raw.get(field.name) {
                Some(value) => match field.kind.accept(value) {
                    Some(accepted) => {
                        values.insert(field.name.to_string(), accepted);
                    }
                    None => violations.push(format!(
                        "`{}`: expected {}, got {}",
                        field.name,
                        field.kind.describe(),
                        describe_value(value)
                    )),
                },
                None if field.required => {
                    violations.push(format!("`{}` is required", field.name));
                }
                None => {
                    if let Some(default) = &field.default {
                        values.insert(field.name.to_string(), default.clone());
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(ToolArgs(values))
        } else {
            Err(SchemaError { violations })
        }
    }

    /// JSON Schema advertised in `tools/list`
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }
}

/// Arguments that passed validation, with defaults applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// `true` only when the flag is present and set
    pub fn flag(&self, name: &str) -> bool {
        self.bool(name).unwrap_or(false)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// String argument, ignoring empty values
    pub fn non_empty_str(&self, name: &str) -> Option<&str> {
        self.str(name).filter(|s| !s.is_empty())
    }

    pub fn u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    /// Integer argument, ignoring zero (a zero limit means "no limit")
    pub fn positive_u64(&self, name: &str) -> Option<u64> {
        self.u64(name).filter(|n| *n > 0)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Number(_) | Value::String(_) => format!("{} {}", json_type_name(value), value),
        other => json_type_name(other).to_string(),
    }
}
