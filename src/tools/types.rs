//! Core types for the tool dispatch system.
//!
//! Defines [`ToolDefinition`] (the declarative description advertised to the
//! speech model), [`ToolCall`]/[`ToolResponse`] (one dispatch round trip),
//! and the [`ToolHandler`] trait that every bound action implements.

use async_trait::async_trait;

use super::error::ToolError;

/// Argument map for a single tool invocation, as decoded from the model.
///
/// Values are JSON-compatible scalars; the live model serializes structured
/// arguments (arrays, nested objects) as strings that handlers parse
/// explicitly.
pub type ArgMap = serde_json::Map<String, serde_json::Value>;

/// JSON-schema scalar type of one declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParameterKind {
    /// The JSON-schema `type` string for this kind.
    pub fn schema_type(&self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Integer => "integer",
            ParameterKind::Number => "number",
            ParameterKind::Boolean => "boolean",
        }
    }
}

/// Declared shape of one tool parameter.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    /// Scalar type of the parameter.
    pub kind: ParameterKind,
    /// Human-readable description shown to the model.
    pub description: String,
    /// Whether the model must supply this parameter.
    pub required: bool,
}

/// A static, declarative description of one callable action.
///
/// Immutable once registered. The registry exports definitions verbatim, in
/// registration order, whenever the session (re)connects to the model — the
/// model always sees the current capability surface.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    // Declaration order is preserved in the exported schema.
    parameters: Vec<(String, ParameterSpec)>,
}

impl ToolDefinition {
    /// Create a definition with no parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a required parameter.
    pub fn required_param(
        mut self,
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push((
            name.into(),
            ParameterSpec {
                kind,
                description: description.into(),
                required: true,
            },
        ));
        self
    }

    /// Add an optional parameter.
    pub fn optional_param(
        mut self,
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push((
            name.into(),
            ParameterSpec {
                kind,
                description: description.into(),
                required: false,
            },
        ));
        self
    }

    /// The unique tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description of the action.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether `name` is a declared parameter.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|(n, _)| n == name)
    }

    /// Names of required parameters missing from `args`.
    pub fn missing_required(&self, args: &ArgMap) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|(n, spec)| spec.required && !args.contains_key(n))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Export as the declaration shape the live model expects.
    pub fn to_declaration(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for (name, spec) in &self.parameters {
            properties.insert(
                name.clone(),
                serde_json::json!({
                    "type": spec.kind.schema_type(),
                    "description": spec.description,
                }),
            );
            if spec.required {
                required.push(serde_json::Value::String(name.clone()));
            }
        }
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

/// A tool invocation requested by the model. Transient — exists only for
/// the duration of one dispatch.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Opaque call id; echoed exactly in the response so the model can
    /// correlate request and response.
    pub id: String,
    /// Tool name to invoke.
    pub name: String,
    /// Arguments as decoded from the model.
    pub args: ArgMap,
}

/// The structured response for one tool call, sent back to the model.
///
/// `response` is always a JSON object: either the handler's own mapping
/// (which carries at least a human-readable `"result"` string), a denial
/// `{"result": ...}`, or an `{"error": ...}` mapping.
#[derive(Debug, Clone)]
pub struct ToolResponse {
    /// The originating call id, echoed exactly.
    pub id: String,
    /// The tool name.
    pub name: String,
    /// Structured response payload.
    pub response: serde_json::Value,
}

impl ToolResponse {
    /// Build a response from a handler's return value, coercing non-object
    /// values to `{"result": <stringified>}`.
    pub fn from_output(id: String, name: String, output: serde_json::Value) -> Self {
        let response = match output {
            serde_json::Value::Object(map) => serde_json::Value::Object(map),
            serde_json::Value::String(s) => serde_json::json!({ "result": s }),
            other => serde_json::json!({ "result": other.to_string() }),
        };
        Self { id, name, response }
    }

    /// A denial outcome. Denials are informational, not errors — the model
    /// explains the outcome to the user in conversation.
    pub fn denial(id: String, name: String, reason: impl Into<String>) -> Self {
        Self {
            id,
            name,
            response: serde_json::json!({ "result": reason.into() }),
        }
    }

    /// An error outcome wrapping a [`ToolError`].
    pub fn error(id: String, name: String, err: &ToolError) -> Self {
        Self {
            id,
            name,
            response: serde_json::json!({ "error": err.to_string() }),
        }
    }

    /// The `"result"` string, if this is a normal outcome.
    pub fn result_text(&self) -> Option<&str> {
        self.response.get("result").and_then(|v| v.as_str())
    }

    /// The `"error"` string, if this is an error outcome.
    pub fn error_text(&self) -> Option<&str> {
        self.response.get("error").and_then(|v| v.as_str())
    }

    /// Wire shape sent back over the duplex session.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "response": self.response,
        })
    }
}

/// The concrete async implementation bound to a tool name.
///
/// A handler receives arguments already filtered to its declared parameter
/// names and returns either a JSON mapping (with at least a human-readable
/// `"result"` string) or a [`ToolError`]. One invocation is atomic from the
/// registry's point of view. Handlers typically delegate to a shared
/// capability object (calendar store, print station, ...) — the registry
/// neither knows nor cares how a handler obtains its result.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with the given arguments.
    async fn call(&self, args: ArgMap) -> Result<serde_json::Value, ToolError>;
}

/// Adapter implementing [`ToolHandler`] for a plain async closure.
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(ArgMap) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<serde_json::Value, ToolError>> + Send,
{
    async fn call(&self, args: ArgMap) -> Result<serde_json::Value, ToolError> {
        (self.f)(args).await
    }
}

/// Wrap an async closure as a shareable [`ToolHandler`].
pub fn handler_fn<F, Fut>(f: F) -> std::sync::Arc<dyn ToolHandler>
where
    F: Fn(ArgMap) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<serde_json::Value, ToolError>> + Send + 'static,
{
    std::sync::Arc::new(FnHandler { f })
}
