//! Span naming and `gen_ai.*` attribute assembly.

use opentelemetry::global::{self, BoxedSpan};
use opentelemetry::trace::{Span, SpanKind, Status as SpanStatus, Tracer};
use opentelemetry::{Array, KeyValue, StringValue, Value};
use std::borrow::Cow;

use xai_sdk_core::messages::{
    FinishReason, FormatType, GetCompletionsRequest, MessageRole, ReasoningEffort, ToolCall,
};
use xai_sdk_streaming::Response;

use crate::options::SessionMetadata;

/// Instrumentation scope of every chat span.
pub const TRACER_NAME: &str = "xai-sdk";

const ROLE_NAMES: [&str; 5] = ["invalid_role", "user", "assistant", "system", "tool"];

const FINISH_REASON_NAMES: [&str; 6] = [
    "reason_invalid",
    "reason_max_len",
    "reason_max_context",
    "reason_stop",
    "reason_tool_calls",
    "reason_time_limit",
];

const FORMAT_TYPE_NAMES: [&str; 4] = ["invalid", "text", "json_object", "json_schema"];

const REASONING_EFFORT_NAMES: [&str; 4] = ["invalid", "low", "medium", "high"];

/// Look `value` up in `table`, falling back to the wire name with `prefix`
/// stripped and lowercased.
fn lower(table: &[&'static str], value: i32, wire: &str, prefix: &str) -> Cow<'static, str> {
    match usize::try_from(value).ok().and_then(|i| table.get(i)) {
        Some(name) => Cow::Borrowed(*name),
        None => Cow::Owned(
            wire.strip_prefix(prefix)
                .unwrap_or(wire)
                .to_ascii_lowercase(),
        ),
    }
}

/// Telemetry name of a role, e.g. `user`.
pub fn role_name(role: MessageRole) -> Cow<'static, str> {
    lower(&ROLE_NAMES, role.value(), role.as_str_name(), "ROLE_")
}

/// Telemetry name of a finish reason, e.g. `reason_stop`.
pub fn finish_reason_name(reason: FinishReason) -> Cow<'static, str> {
    lower(&FINISH_REASON_NAMES, reason.value(), reason.as_str_name(), "")
}

/// Telemetry name of a format type, e.g. `json_schema`.
pub fn format_type_name(format: FormatType) -> Cow<'static, str> {
    lower(
        &FORMAT_TYPE_NAMES,
        format.value(),
        format.as_str_name(),
        "FORMAT_TYPE_",
    )
}

/// Telemetry name of a reasoning effort, e.g. `low`.
pub fn reasoning_effort_name(effort: ReasoningEffort) -> Cow<'static, str> {
    lower(
        &REASONING_EFFORT_NAMES,
        effort.value(),
        effort.as_str_name(),
        "EFFORT_",
    )
}

fn string_array(values: impl IntoIterator<Item = String>) -> Value {
    Value::Array(Array::String(
        values.into_iter().map(StringValue::from).collect(),
    ))
}

/// Tool calls as JSON. Encoding is best-effort.
fn encode_tool_calls(calls: &[ToolCall]) -> Option<String> {
    if calls.is_empty() {
        return None;
    }
    serde_json::to_string(calls).ok()
}

/// Attributes describing an outgoing request.
pub fn request_attributes(
    request: &GetCompletionsRequest,
    session: &SessionMetadata,
) -> Vec<KeyValue> {
    let mut attrs = Vec::with_capacity(16 + request.messages.len() * 3);

    let output_type = request
        .response_format
        .as_ref()
        .map_or(Cow::Borrowed("text"), |f| format_type_name(f.format_type));

    attrs.extend([
        KeyValue::new("gen_ai.operation.name", "chat"),
        KeyValue::new("gen_ai.system", "xai"),
        KeyValue::new("gen_ai.output.type", output_type.into_owned()),
        KeyValue::new("gen_ai.request.model", request.model.clone()),
        KeyValue::new("server.port", 443_i64),
        KeyValue::new("gen_ai.request.logprobs", request.logprobs),
        KeyValue::new("gen_ai.request.store_messages", request.store_messages),
        KeyValue::new(
            "gen_ai.request.use_encrypted_content",
            request.use_encrypted_content,
        ),
    ]);

    let floats = [
        ("gen_ai.request.temperature", request.temperature),
        ("gen_ai.request.top_p", request.top_p),
        ("gen_ai.request.frequency_penalty", request.frequency_penalty),
        ("gen_ai.request.presence_penalty", request.presence_penalty),
    ];
    for (key, value) in floats {
        if let Some(v) = value {
            attrs.push(KeyValue::new(key, f64::from(v)));
        }
    }

    let ints = [
        ("gen_ai.request.choice.count", request.n),
        ("gen_ai.request.seed", request.seed),
        ("gen_ai.request.max_tokens", request.max_tokens),
        ("gen_ai.request.top_logprobs", request.top_logprobs),
    ];
    for (key, value) in ints {
        if let Some(v) = value {
            attrs.push(KeyValue::new(key, i64::from(v)));
        }
    }

    if let Some(parallel) = request.parallel_tool_calls {
        attrs.push(KeyValue::new("gen_ai.request.parallel_tool_calls", parallel));
    }
    if let Some(id) = &session.conversation_id {
        attrs.push(KeyValue::new("gen_ai.conversation.id", id.clone()));
    }
    if !request.stop.is_empty() {
        attrs.push(KeyValue::new(
            "gen_ai.request.stop_sequences",
            string_array(request.stop.iter().cloned()),
        ));
    }
    if let Some(effort) = request.reasoning_effort {
        attrs.push(KeyValue::new(
            "gen_ai.request.reasoning_effort",
            reasoning_effort_name(effort).into_owned(),
        ));
    }
    if !request.user.is_empty() {
        attrs.push(KeyValue::new("user_id", request.user.clone()));
    }
    if let Some(previous) = &request.previous_response_id {
        attrs.push(KeyValue::new(
            "gen_ai.request.previous_response_id",
            previous.clone(),
        ));
    }

    for (i, message) in request.messages.iter().enumerate() {
        let prefix = format!("gen_ai.prompt.{i}");
        attrs.push(KeyValue::new(
            format!("{prefix}.role"),
            role_name(message.role).into_owned(),
        ));
        attrs.push(KeyValue::new(format!("{prefix}.content"), message.text()));

        if message.role == MessageRole::Assistant {
            if let Some(encoded) = encode_tool_calls(&message.tool_calls) {
                attrs.push(KeyValue::new(format!("{prefix}.tool_calls"), encoded));
            }
            if !message.encrypted_content.is_empty() {
                attrs.push(KeyValue::new(
                    format!("{prefix}.encrypted_content"),
                    message.encrypted_content.clone(),
                ));
            }
        }
    }

    attrs
}

/// Attributes describing received responses. Response-level fields come
/// from the first response; each response contributes one candidate.
pub fn response_attributes(responses: &[Response]) -> Vec<KeyValue> {
    let Some(first) = responses.first() else {
        return Vec::new();
    };

    let mut attrs = Vec::with_capacity(8 + responses.len() * 4);
    first.inspect(|proto| {
        attrs.extend([
            KeyValue::new("gen_ai.response.id", proto.id.clone()),
            KeyValue::new("gen_ai.response.model", proto.model.clone()),
            KeyValue::new(
                "gen_ai.response.system_fingerprint",
                proto.system_fingerprint.clone(),
            ),
        ]);
        if let Some(usage) = proto.usage {
            attrs.extend([
                KeyValue::new("gen_ai.usage.input_tokens", i64::from(usage.prompt_tokens)),
                KeyValue::new(
                    "gen_ai.usage.output_tokens",
                    i64::from(usage.completion_tokens),
                ),
                KeyValue::new("gen_ai.usage.total_tokens", i64::from(usage.total_tokens)),
                KeyValue::new(
                    "gen_ai.usage.reasoning_tokens",
                    i64::from(usage.reasoning_tokens),
                ),
            ]);
        }
    });

    let mut finish_reasons = Vec::with_capacity(responses.len());
    for (i, response) in responses.iter().enumerate() {
        let prefix = format!("gen_ai.completion.{i}");
        finish_reasons.push(finish_reason_name(response.finish_reason()).into_owned());

        attrs.push(KeyValue::new(
            format!("{prefix}.role"),
            role_name(response.role()).into_owned(),
        ));
        attrs.push(KeyValue::new(format!("{prefix}.content"), response.content()));

        let reasoning = response.reasoning_content();
        if !reasoning.is_empty() {
            attrs.push(KeyValue::new(format!("{prefix}.reasoning_content"), reasoning));
        }
        if let Some(encoded) = encode_tool_calls(&response.tool_calls()) {
            attrs.push(KeyValue::new(format!("{prefix}.tool_calls"), encoded));
        }
    }
    attrs.push(KeyValue::new(
        "gen_ai.response.finish_reasons",
        string_array(finish_reasons),
    ));

    attrs
}

/// Start a client span named `chat.<operation> <model>`.
pub(crate) fn start_span(operation: &str, model: &str, attributes: Vec<KeyValue>) -> BoxedSpan {
    let tracer = global::tracer(TRACER_NAME);
    tracer
        .span_builder(format!("chat.{operation} {model}"))
        .with_kind(SpanKind::Client)
        .with_attributes(attributes)
        .start(&tracer)
}

/// Record `error` on `span` and mark it failed.
pub(crate) fn fail_span(span: &mut BoxedSpan, error: &(dyn std::error::Error + 'static)) {
    span.record_error(error);
    span.set_status(SpanStatus::error(error.to_string()));
}

/// Record a successful result on `span`.
pub(crate) fn succeed_span(span: &mut BoxedSpan, responses: &[Response]) {
    span.set_attributes(response_attributes(responses));
    span.set_status(SpanStatus::Ok);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use xai_sdk_core::messages::{
        assistant, user, CompletionMessage, Content, CompletionOutput, GetChatCompletionResponse,
        ResponseFormat,
    };
    use xai_sdk_core::SamplingUsage;

    fn find<'a>(attrs: &'a [KeyValue], key: &str) -> Option<&'a Value> {
        attrs
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }

    #[rstest]
    #[case(MessageRole::User, "user")]
    #[case(MessageRole::Assistant, "assistant")]
    #[case(MessageRole::InvalidRole, "invalid_role")]
    #[case(MessageRole::Tool, "tool")]
    fn test_role_names(#[case] role: MessageRole, #[case] name: &str) {
        assert_eq!(role_name(role), name);
    }

    #[rstest]
    #[case(FinishReason::Stop, "reason_stop")]
    #[case(FinishReason::ToolCalls, "reason_tool_calls")]
    #[case(FinishReason::Invalid, "reason_invalid")]
    fn test_finish_reason_names(#[case] reason: FinishReason, #[case] name: &str) {
        assert_eq!(finish_reason_name(reason), name);
    }

    #[test]
    fn test_prefix_stripped_names() {
        assert_eq!(format_type_name(FormatType::JsonSchema), "json_schema");
        assert_eq!(format_type_name(FormatType::Text), "text");
        assert_eq!(reasoning_effort_name(ReasoningEffort::Low), "low");
        assert_eq!(reasoning_effort_name(ReasoningEffort::High), "high");
    }

    #[test]
    fn test_lower_fallback() {
        assert_eq!(lower(&[], 9, "ROLE_NEW_KIND", "ROLE_"), "new_kind");
    }

    #[test]
    fn test_request_attributes() {
        let mut request = GetCompletionsRequest::new("grok-4");
        request
            .messages
            .push(user(vec![Content::from("a"), Content::from("b")]));
        request.messages.push(
            assistant("ok").with_tool_calls([ToolCall::function("call-1", "f", "{}")]),
        );
        request.temperature = Some(0.5);
        request.reasoning_effort = Some(ReasoningEffort::Low);
        request.response_format = Some(ResponseFormat::json_schema("{}"));
        request.stop = vec!["END".into()];
        request.user = "u-1".into();

        let session = SessionMetadata {
            conversation_id: Some("conv-1".into()),
        };
        let attrs = request_attributes(&request, &session);

        assert_eq!(
            find(&attrs, "gen_ai.request.model"),
            Some(&Value::from("grok-4"))
        );
        assert_eq!(
            find(&attrs, "gen_ai.output.type"),
            Some(&Value::from("json_schema"))
        );
        assert_eq!(
            find(&attrs, "gen_ai.request.reasoning_effort"),
            Some(&Value::from("low"))
        );
        assert_eq!(
            find(&attrs, "gen_ai.request.temperature"),
            Some(&Value::F64(0.5))
        );
        assert_eq!(find(&attrs, "gen_ai.request.top_p"), None);
        assert_eq!(find(&attrs, "gen_ai.request.seed"), None);
        assert_eq!(
            find(&attrs, "gen_ai.conversation.id"),
            Some(&Value::from("conv-1"))
        );
        assert_eq!(find(&attrs, "user_id"), Some(&Value::from("u-1")));
        assert_eq!(
            find(&attrs, "gen_ai.prompt.0.content"),
            Some(&Value::from("ab"))
        );
        assert_eq!(
            find(&attrs, "gen_ai.prompt.1.role"),
            Some(&Value::from("assistant"))
        );
        assert!(find(&attrs, "gen_ai.prompt.1.tool_calls").is_some());
        assert!(find(&attrs, "gen_ai.prompt.0.tool_calls").is_none());
    }

    #[test]
    fn test_response_attributes() {
        let response = Response::new(
            GetChatCompletionResponse {
                id: "resp-1".into(),
                model: "grok-4".into(),
                usage: Some(SamplingUsage::new(3, 2)),
                outputs: vec![CompletionOutput {
                    index: 0,
                    finish_reason: FinishReason::Stop,
                    message: CompletionMessage {
                        content: "Hello".into(),
                        reasoning_content: "Why".into(),
                        role: MessageRole::Assistant,
                        ..CompletionMessage::default()
                    },
                }],
                ..GetChatCompletionResponse::default()
            },
            Some(0),
        );

        let attrs = response_attributes(&[response]);
        assert_eq!(
            find(&attrs, "gen_ai.response.finish_reasons"),
            Some(&string_array(["reason_stop".to_string()]))
        );
        assert_eq!(
            find(&attrs, "gen_ai.completion.0.content"),
            Some(&Value::from("Hello"))
        );
        assert_eq!(
            find(&attrs, "gen_ai.completion.0.reasoning_content"),
            Some(&Value::from("Why"))
        );
        assert_eq!(
            find(&attrs, "gen_ai.usage.total_tokens"),
            Some(&Value::I64(5))
        );
        assert_eq!(find(&attrs, "gen_ai.response.id"), Some(&Value::from("resp-1")));
    }

    #[test]
    fn test_no_responses_no_attributes() {
        assert!(response_attributes(&[]).is_empty());
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory span capture shared by the crate's tests.

    use opentelemetry::trace::Status;
    use opentelemetry::{KeyValue, Value};
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};
    use std::sync::LazyLock;

    static EXPORTER: LazyLock<InMemorySpanExporter> = LazyLock::new(|| {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        opentelemetry::global::set_tracer_provider(provider);
        exporter
    });

    /// Route the global tracer into the in-memory exporter.
    pub(crate) fn install() {
        LazyLock::force(&EXPORTER);
    }

    /// Finished spans called `name`. Tests use distinct model names so
    /// they never see each other's spans.
    pub(crate) fn finished(name: &str) -> Vec<SpanData> {
        EXPORTER
            .get_finished_spans()
            .unwrap_or_default()
            .into_iter()
            .filter(|span| span.name == name)
            .collect()
    }

    pub(crate) fn attribute<'a>(span: &'a SpanData, key: &str) -> Option<&'a Value> {
        span.attributes
            .iter()
            .find(|kv: &&KeyValue| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }

    pub(crate) fn is_error(span: &SpanData) -> bool {
        matches!(span.status, Status::Error { .. })
    }
}
