//! Tool Registry
//!
//! Holds every tool the server exposes: its MCP descriptor, its ordered
//! parameter list and the handler that runs it. The registry is built once at
//! startup and then shared read-only across transports, the only interior
//! mutability being the random source lent to handlers.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::random::RandomSource;

/// Errors produced by tool registration and invocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    /// A tool with this name is already registered.
    #[error("tool `{name}` is already registered")]
    DuplicateTool { name: String },

    /// No tool with this name is registered.
    #[error("Unknown tool: {name}")]
    NotFound { name: String },

    /// Arguments do not match the tool's declared parameters.
    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

impl ParamType {
    /// JSON Schema `type` keyword for this parameter type.
    pub fn schema_name(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }

    /// Coerce a caller-supplied value into this type.
    ///
    /// Coercion is lax: integral floats and numeric strings are accepted for
    /// integers, and the usual textual spellings (plus 0/1) for booleans.
    /// Strings must already be strings.
    fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ParamType::String, Value::String(_)) => Some(value.clone()),
            (ParamType::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Some(Value::from(i));
                }
                let f = n.as_f64()?;
                let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
                (f.fract() == 0.0 && in_range).then(|| Value::from(f as i64))
            }
            (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (ParamType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParamType::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            (ParamType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Declared parameter of a tool. A parameter with a default is optional.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamType, description: &str, default: impl Into<Value>) -> Self {
        Self {
            default: Some(default.into()),
            ..Self::required(name, kind, description)
        }
    }
}

/// MCP tool descriptor, serialized as-is by `tools/list`.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    /// Unique tool identifier (e.g., "roll_dice")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Arguments after validation: every declared parameter is present and has
/// its declared type.
#[derive(Debug, Clone)]
pub struct Arguments {
    tool: String,
    values: Map<String, Value>,
}

impl Arguments {
    pub fn string(&self, name: &str) -> Result<&str, ToolError> {
        self.get(name)?.as_str().ok_or_else(|| self.mismatch(name, "string"))
    }

    pub fn integer(&self, name: &str) -> Result<i64, ToolError> {
        self.get(name)?.as_i64().ok_or_else(|| self.mismatch(name, "integer"))
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ToolError> {
        self.get(name)?.as_bool().ok_or_else(|| self.mismatch(name, "boolean"))
    }

    fn get(&self, name: &str) -> Result<&Value, ToolError> {
        self.values.get(name).ok_or_else(|| ToolError::InvalidArguments {
            tool: self.tool.clone(),
            reason: format!("missing parameter `{name}`"),
        })
    }

    fn mismatch(&self, name: &str, expected: &str) -> ToolError {
        ToolError::InvalidArguments {
            tool: self.tool.clone(),
            reason: format!("parameter `{name}` is not a {expected}"),
        }
    }
}

/// Tool handler function type definition.
///
/// Handlers receive validated arguments and the shared random source, and
/// return the tool's text result. Precondition failures are part of the
/// text result, `Err` is reserved for argument access failures.
pub type ToolHandler =
    Box<dyn Fn(&Arguments, &mut dyn RandomSource) -> Result<String, ToolError> + Send + Sync>;

struct Entry {
    params: Vec<ParamSpec>,
    handler: ToolHandler,
}

/// Registry of available MCP tools.
pub struct ToolRegistry {
    tools: Vec<MCPTool>,
    entries: HashMap<String, Entry>,
    random: Mutex<Box<dyn RandomSource>>,
}

impl ToolRegistry {
    /// Create an empty registry drawing from `random`.
    pub fn new(random: Box<dyn RandomSource>) -> Self {
        Self {
            tools: Vec::new(),
            entries: HashMap::new(),
            random: Mutex::new(random),
        }
    }

    /// Register a tool under a unique name.
    ///
    /// # Errors
    /// `ToolError::DuplicateTool` if the name is taken.
    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        params: Vec<ParamSpec>,
        handler: ToolHandler,
    ) -> Result<(), ToolError> {
        if self.entries.contains_key(name) {
            return Err(ToolError::DuplicateTool { name: name.to_string() });
        }

        self.tools.push(MCPTool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: input_schema(&params),
        });
        self.entries.insert(name.to_string(), Entry { params, handler });
        Ok(())
    }

    /// Descriptors of all registered tools, in registration order.
    pub fn list(&self) -> &[MCPTool] {
        &self.tools
    }

    /// Validate `arguments` against the tool's parameters, fill in defaults
    /// and run the handler.
    ///
    /// # Errors
    /// `ToolError::NotFound` for an unregistered name,
    /// `ToolError::InvalidArguments` when the arguments do not fit the
    /// declared parameters.
    pub fn invoke(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        let Some(entry) = self.entries.get(name) else {
            warn!(tool = name, "call to unregistered tool");
            return Err(ToolError::NotFound { name: name.to_string() });
        };

        let args = bind_arguments(name, &entry.params, arguments).inspect_err(|e| {
            warn!(tool = name, error = %e, "rejected tool arguments");
        })?;

        debug!(tool = name, "invoking tool");
        (entry.handler)(&args, &mut LockPerDraw(&self.random))
    }
}

/// Lends the shared source to one handler call, taking the lock for each
/// draw only. Handlers that never draw never touch the lock.
struct LockPerDraw<'a>(&'a Mutex<Box<dyn RandomSource>>);

impl LockPerDraw<'_> {
    fn source(&self) -> std::sync::MutexGuard<'_, Box<dyn RandomSource>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RandomSource for LockPerDraw<'_> {
    fn between(&mut self, low: i64, high: i64) -> i64 {
        self.source().between(low, high)
    }

    fn index(&mut self, len: usize) -> usize {
        self.source().index(len)
    }
}

/// JSON Schema for an ordered parameter list.
fn input_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut property = serde_json::json!({
            "type": param.kind.schema_name(),
            "description": param.description,
        });
        match &param.default {
            Some(default) => property["default"] = default.clone(),
            None => required.push(Value::String(param.name.clone())),
        }
        properties.insert(param.name.clone(), property);
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn bind_arguments(tool: &str, params: &[ParamSpec], arguments: Value) -> Result<Arguments, ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason,
    };

    let mut supplied = match arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => return Err(invalid(format!("arguments must be an object, got {other}"))),
    };

    if let Some(unknown) = supplied
        .keys()
        .find(|key| !params.iter().any(|p| &p.name == *key))
    {
        return Err(invalid(format!("unexpected parameter `{unknown}`")));
    }

    let mut values = Map::new();
    for param in params {
        let value = match (supplied.remove(&param.name), &param.default) {
            (Some(value), _) => param.kind.coerce(&value).ok_or_else(|| {
                invalid(format!(
                    "parameter `{}` expects {}, got {value}",
                    param.name,
                    param.kind.schema_name()
                ))
            })?,
            (None, Some(default)) => default.clone(),
            (None, None) => return Err(invalid(format!("missing required parameter `{}`", param.name))),
        };
        values.insert(param.name.clone(), value);
    }

    Ok(Arguments {
        tool: tool.to_string(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::testing::ScriptedSource;
    use serde_json::json;

    fn echo_params() -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("text", ParamType::String, "Text to echo"),
            ParamSpec::optional("times", ParamType::Integer, "Repetitions", 1),
            ParamSpec::optional("shout", ParamType::Boolean, "Uppercase", false),
        ]
    }

    fn echo_handler() -> ToolHandler {
        Box::new(|args: &Arguments, _random: &mut dyn RandomSource| {
            let text = args.string("text")?.repeat(args.integer("times")? as usize);
            Ok(if args.boolean("shout")? { text.to_uppercase() } else { text })
        })
    }

    fn silent() -> ToolHandler {
        Box::new(|_: &Arguments, _: &mut dyn RandomSource| Ok(String::new()))
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new(Box::new(ScriptedSource::new(&[])));
        registry
            .register("echo", "Echo text", echo_params(), echo_handler())
            .unwrap();
        registry
    }

    #[test]
    fn duplicate_registration_errors() {
        let mut registry = registry();
        let err = registry
            .register("echo", "Echo again", echo_params(), echo_handler())
            .unwrap_err();
        assert_eq!(err, ToolError::DuplicateTool { name: "echo".into() });
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn list_keeps_registration_order() {
        let mut registry = registry();
        registry.register("b", "", vec![], silent()).unwrap();
        registry.register("a", "", vec![], silent()).unwrap();
        let names: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["echo", "b", "a"]);
    }

    #[test]
    fn schema_lists_defaults_and_required() {
        let registry = registry();
        let schema = &registry.list()[0].input_schema;
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["text"]));
        assert_eq!(schema["properties"]["times"]["type"], "integer");
        assert_eq!(schema["properties"]["times"]["default"], 1);
        assert_eq!(schema["properties"]["shout"]["default"], false);
        assert!(schema["properties"]["text"].get("default").is_none());
    }

    #[test]
    fn descriptor_serializes_camel_case_schema() {
        let registry = registry();
        let value = serde_json::to_value(&registry.list()[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn defaults_fill_missing_optionals() {
        let registry = registry();
        assert_eq!(registry.invoke("echo", json!({"text": "hi"})).unwrap(), "hi");
        assert_eq!(
            registry.invoke("echo", json!({"text": "hi", "times": 2, "shout": true})).unwrap(),
            "HIHI"
        );
    }

    #[test]
    fn unknown_tool_is_not_found() {
        let err = registry().invoke("nope", json!({})).unwrap_err();
        assert_eq!(err, ToolError::NotFound { name: "nope".into() });
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = registry().invoke("echo", json!({"text": "hi", "volume": 11})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref reason, .. } if reason.contains("volume")));
    }

    #[test]
    fn missing_required_parameter_is_rejected() {
        for arguments in [json!({}), Value::Null] {
            let err = registry().invoke("echo", arguments).unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments { ref reason, .. } if reason.contains("text")));
        }
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = registry().invoke("echo", json!(["hi"])).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn lax_coercion() {
        let registry = registry();
        assert_eq!(
            registry.invoke("echo", json!({"text": "a", "times": "3", "shout": "yes"})).unwrap(),
            "AAA"
        );
        assert_eq!(registry.invoke("echo", json!({"text": "a", "times": 2.0, "shout": 0})).unwrap(), "aa");
    }

    #[test]
    fn wrong_types_are_rejected() {
        let registry = registry();
        for arguments in [
            json!({"text": 5}),
            json!({"text": "a", "times": 2.5}),
            json!({"text": "a", "times": "two"}),
            json!({"text": "a", "shout": "maybe"}),
            json!({"text": "a", "shout": 2}),
            json!({"text": "a", "times": null}),
        ] {
            let err = registry.invoke("echo", arguments.clone()).unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments { .. }), "{arguments} accepted");
        }
    }

    #[test]
    fn handler_receives_the_registry_random_source() {
        let mut registry = ToolRegistry::new(Box::new(ScriptedSource::new(&[4, 2])));
        registry
            .register("draw", "", vec![], Box::new(|_: &Arguments, random: &mut dyn RandomSource| {
                Ok(random.between(1, 6).to_string())
            }))
            .unwrap();
        assert_eq!(registry.invoke("draw", json!({})).unwrap(), "4");
        assert_eq!(registry.invoke("draw", json!({})).unwrap(), "2");
    }

    #[test]
    fn tools_that_never_draw_do_not_wait_on_the_random_source() {
        use std::sync::{Arc, mpsc};
        use std::time::Duration;

        let registry = Arc::new(registry());
        let held = registry.random.lock().unwrap();

        let (tx, rx) = mpsc::channel();
        let worker = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                tx.send(registry.invoke("echo", json!({"text": "hi"}))).unwrap();
            })
        };

        let result = rx.recv_timeout(Duration::from_secs(5));
        drop(held);
        worker.join().unwrap();
        assert_eq!(result.unwrap().unwrap(), "hi");
    }
}
