//! Tool definitions and tool calls.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, XaiError};

wire_enum! {
    /// Kind of tool a call targets.
    pub enum ToolCallType {
        /// Unset.
        #[default]
        Invalid = 0 => "TOOL_CALL_TYPE_INVALID",
        /// A function executed by the client.
        Function = 1 => "TOOL_CALL_TYPE_CLIENT_SIDE_TOOL",
        /// Server-side web search.
        WebSearch = 2 => "TOOL_CALL_TYPE_WEB_SEARCH_TOOL",
        /// Server-side X search.
        XSearch = 3 => "TOOL_CALL_TYPE_X_SEARCH_TOOL",
        /// Server-side code execution.
        CodeExecution = 4 => "TOOL_CALL_TYPE_CODE_EXECUTION_TOOL",
        /// Server-side collections search.
        CollectionsSearch = 5 => "TOOL_CALL_TYPE_COLLECTIONS_SEARCH_TOOL",
        /// Remote MCP server.
        Mcp = 6 => "TOOL_CALL_TYPE_MCP_TOOL",
        /// Server-side document search.
        DocumentSearch = 7 => "TOOL_CALL_TYPE_DOCUMENT_SEARCH_TOOL",
    }
}

wire_enum! {
    /// Tool selection mode.
    pub enum ToolMode {
        /// Unset.
        #[default]
        Invalid = 0 => "TOOL_MODE_INVALID",
        /// The model decides.
        Auto = 1 => "TOOL_MODE_AUTO",
        /// Never call tools.
        None = 2 => "TOOL_MODE_NONE",
        /// Always call a tool.
        Required = 3 => "TOOL_MODE_REQUIRED",
    }
}

/// Name and JSON arguments of a function call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments as a JSON string. Streamed calls concatenate fragments.
    pub arguments: String,
}

/// A tool call issued by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCall {
    /// Call identifier.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Position of this call within the output, present on streamed deltas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    /// Tool kind.
    #[serde(rename = "type")]
    pub kind: ToolCallType,
    /// Function payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCall>,
}

impl ToolCall {
    /// A client-side function call.
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            index: None,
            kind: ToolCallType::Function,
            function: Some(FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            }),
        }
    }

    /// The function name, or `""` when there is no function payload.
    pub fn name(&self) -> &str {
        self.function.as_ref().map_or("", |f| f.name.as_str())
    }

    /// The raw JSON arguments, or `""` when absent.
    pub fn arguments_json(&self) -> &str {
        self.function.as_ref().map_or("", |f| f.arguments.as_str())
    }

    /// Decode the JSON arguments into `T`.
    pub fn decode_arguments<T: DeserializeOwned>(&self) -> Result<T> {
        let function = self
            .function
            .as_ref()
            .ok_or_else(|| XaiError::tool_call("tool call does not contain a function"))?;
        if function.arguments.is_empty() {
            return Err(XaiError::tool_call("tool call arguments empty"));
        }
        Ok(serde_json::from_str(&function.arguments)?)
    }
}

/// A client-side function the model may call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,
    /// What the function does.
    pub description: String,
    /// Enforce the parameter schema strictly.
    pub strict: bool,
    /// JSON schema of the parameters, as a string.
    pub parameters: String,
}

/// Server-side web search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearch {
    /// Domains never searched.
    pub excluded_domains: Vec<String>,
    /// Domains searched exclusively.
    pub allowed_domains: Vec<String>,
    /// Let the model look at images found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_image_understanding: Option<bool>,
}

/// Server-side X search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XSearch {
    /// Earliest post date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,
    /// Latest post date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<DateTime<Utc>>,
    /// Handles searched exclusively.
    pub allowed_x_handles: Vec<String>,
    /// Handles never searched.
    pub excluded_x_handles: Vec<String>,
    /// Let the model look at images found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_image_understanding: Option<bool>,
    /// Let the model look at videos found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_video_understanding: Option<bool>,
}

/// Server-side code execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExecution {}

/// Server-side search over document collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsSearch {
    /// Collections to search.
    pub collection_ids: Vec<String>,
    /// Maximum results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

/// Tools served by a remote MCP server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mcp {
    /// Server URL.
    pub server_url: String,
    /// Short label.
    pub server_label: String,
    /// Description shown to the model.
    pub server_description: String,
    /// Restrict to these tools.
    pub allowed_tool_names: Vec<String>,
    /// Authorization header value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
    /// Extra headers sent to the server.
    pub extra_headers: IndexMap<String, String>,
}

/// Server-side document search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSearch {
    /// Maximum results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

/// A tool the model may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Client-side function.
    Function(FunctionDef),
    /// Web search.
    WebSearch(WebSearch),
    /// X search.
    XSearch(XSearch),
    /// Code execution.
    CodeExecution(CodeExecution),
    /// Collections search.
    CollectionsSearch(CollectionsSearch),
    /// MCP server.
    Mcp(Mcp),
    /// Document search.
    DocumentSearch(DocumentSearch),
}

impl Tool {
    /// A client-side function with a JSON schema for its parameters.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self::Function(FunctionDef {
            name: name.into(),
            description: description.into(),
            strict: false,
            parameters: parameters.to_string(),
        })
    }

    /// Whether the tool runs on the server.
    pub fn is_server_side(&self) -> bool {
        !matches!(self, Self::Function(_))
    }

    /// The call kind this tool produces.
    pub fn call_type(&self) -> ToolCallType {
        match self {
            Self::Function(_) => ToolCallType::Function,
            Self::WebSearch(_) => ToolCallType::WebSearch,
            Self::XSearch(_) => ToolCallType::XSearch,
            Self::CodeExecution(_) => ToolCallType::CodeExecution,
            Self::CollectionsSearch(_) => ToolCallType::CollectionsSearch,
            Self::Mcp(_) => ToolCallType::Mcp,
            Self::DocumentSearch(_) => ToolCallType::DocumentSearch,
        }
    }
}

/// Tool selection strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// A selection mode.
    Mode(ToolMode),
    /// Force a specific function.
    FunctionName(String),
}

impl ToolChoice {
    /// Force the model to call `name`.
    pub fn required(name: impl Into<String>) -> Self {
        Self::FunctionName(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct CityArgs {
        city: String,
    }

    #[test]
    fn test_decode_arguments() {
        let call = ToolCall::function("call-1", "lookup_city", r#"{"city":"Paris"}"#);
        let args: CityArgs = call.decode_arguments().unwrap();
        assert_eq!(args.city, "Paris");
        assert_eq!(call.name(), "lookup_city");
        assert_eq!(call.arguments_json(), r#"{"city":"Paris"}"#);
    }

    #[test]
    fn test_decode_arguments_errors() {
        let call = ToolCall::default();
        assert!(matches!(
            call.decode_arguments::<CityArgs>(),
            Err(XaiError::ToolCall(_))
        ));
        assert_eq!(call.arguments_json(), "");

        let call = ToolCall::function("call-1", "f", "");
        assert!(matches!(
            call.decode_arguments::<CityArgs>(),
            Err(XaiError::ToolCall(_))
        ));

        let call = ToolCall::function("call-1", "f", "{\"city\":");
        assert!(matches!(
            call.decode_arguments::<CityArgs>(),
            Err(XaiError::Json(_))
        ));
    }

    #[test]
    fn test_tool_kinds() {
        let tool = Tool::function("f", "d", serde_json::json!({"type": "object"}));
        assert!(!tool.is_server_side());
        assert_eq!(tool.call_type(), ToolCallType::Function);

        let tool = Tool::CodeExecution(CodeExecution::default());
        assert!(tool.is_server_side());
        assert_eq!(tool.call_type(), ToolCallType::CodeExecution);

        let json = serde_json::to_value(Tool::XSearch(XSearch::default())).unwrap();
        assert!(json.get("x_search").is_some());
    }
}
