//! Translation of remote run steps into run events

use foundry_agents::{RequiredToolCall, RunStep, StepToolCall};
use foundry_types::{PendingToolCall, ToolCallEvent, ToolCallStatus, ToolCallsStepEvent, RAW_ARGUMENTS_KEY};
use serde_json::{Map, Value};

const UNKNOWN_TOOL_NAME: &str = "Unknown Tool";
const UNKNOWN_TOOL_TYPE: &str = "unknown";

/// Parse a tool-call argument payload into a key/value map
///
/// Never fails: a payload that is not a JSON object (or a string holding one)
/// is kept verbatim under [`RAW_ARGUMENTS_KEY`].
pub fn parse_arguments(raw: &Value) -> Map<String, Value> {
    match raw {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        Value::String(text) if text.trim().is_empty() => Map::new(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            _ => raw_arguments(raw.clone()),
        },
        other => raw_arguments(other.clone()),
    }
}

fn raw_arguments(value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(RAW_ARGUMENTS_KEY.to_string(), value);
    map
}

pub fn tool_call_event(call: &StepToolCall) -> ToolCallEvent {
    ToolCallEvent {
        tool_id: call.id.clone(),
        tool_name: call.tool_name().unwrap_or(UNKNOWN_TOOL_NAME).to_string(),
        tool_type: tool_type_or_unknown(&call.tool_type),
        server_label: call.server_label.clone(),
        arguments: parse_arguments(call.raw_arguments()),
        output: call.output_text(),
        status: ToolCallStatus::Completed,
    }
}

/// Build the event for a completed tool-calls step
///
/// Returns `None` when the step carries no tool-call payload at all. Output
/// readiness is not checked here; see [`ToolCallsStepEvent::all_outputs_ready`].
pub fn tool_calls_step_event(step: &RunStep) -> Option<ToolCallsStepEvent> {
    let calls = step.step_details.tool_calls()?;
    let tool_calls = calls.iter().map(tool_call_event).collect();
    Some(ToolCallsStepEvent::new(step.id.clone(), tool_calls, ToolCallStatus::Completed))
}

pub fn pending_tool_calls(calls: &[RequiredToolCall]) -> Vec<PendingToolCall> {
    calls
        .iter()
        .map(|call| PendingToolCall {
            id: call.id.clone(),
            name: call.name.clone().unwrap_or_else(|| UNKNOWN_TOOL_NAME.to_string()),
            tool_type: tool_type_or_unknown(&call.tool_type),
            server_label: call.server_label.clone(),
            arguments: parse_arguments(&call.arguments),
        })
        .collect()
}

fn tool_type_or_unknown(tool_type: &str) -> String {
    if tool_type.is_empty() {
        UNKNOWN_TOOL_TYPE.to_string()
    } else {
        tool_type.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(value: Value) -> RunStep {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_arguments_from_json_string() {
        let args = parse_arguments(&json!("{\"query\": \"rust\", \"top\": 3}"));
        assert_eq!(args["query"], "rust");
        assert_eq!(args["top"], 3);
    }

    #[test]
    fn test_parse_arguments_keeps_objects() {
        let args = parse_arguments(&json!({"query": "rust"}));
        assert_eq!(args["query"], "rust");
    }

    #[test]
    fn test_parse_arguments_falls_back_to_raw() {
        let args = parse_arguments(&json!("query=rust"));
        assert_eq!(args.len(), 1);
        assert_eq!(args[RAW_ARGUMENTS_KEY], "query=rust");

        let args = parse_arguments(&json!("[1, 2]"));
        assert_eq!(args[RAW_ARGUMENTS_KEY], "[1, 2]");

        let args = parse_arguments(&json!(42));
        assert_eq!(args[RAW_ARGUMENTS_KEY], 42);
    }

    #[test]
    fn test_parse_arguments_empty_payloads() {
        assert!(parse_arguments(&Value::Null).is_empty());
        assert!(parse_arguments(&json!("  ")).is_empty());
    }

    #[test]
    fn test_tool_calls_step_event_defaults() {
        let step = step(json!({
            "id": "s1",
            "type": "tool_calls",
            "status": "completed",
            "step_details": {"type": "tool_calls", "tool_calls": [
                {"id": "tc1", "arguments": "{}", "output": "done"},
                {"id": "tc2", "type": "mcp", "name": "search", "server_label": "docs", "arguments": "{}"}
            ]}
        }));

        let event = tool_calls_step_event(&step).unwrap();
        assert_eq!(event.step_id, "s1");
        assert_eq!(event.tool_calls[0].tool_name, "Unknown Tool");
        assert_eq!(event.tool_calls[0].tool_type, "unknown");
        assert_eq!(event.tool_calls[1].server_label.as_deref(), Some("docs"));
        assert!(!event.all_outputs_ready());
    }

    #[test]
    fn test_step_without_tool_payload() {
        let step = step(json!({"id": "s1", "type": "tool_calls", "status": "completed"}));
        assert!(tool_calls_step_event(&step).is_none());
    }

    #[test]
    fn test_pending_tool_calls_parse_arguments() {
        let calls: Vec<RequiredToolCall> = serde_json::from_value(json!([
            {"id": "tc1", "type": "mcp", "name": "search", "server_label": "docs",
             "arguments": "{\"query\": \"rust\"}"}
        ]))
        .unwrap();

        let pending = pending_tool_calls(&calls);
        assert_eq!(pending[0].name, "search");
        assert_eq!(pending[0].arguments["query"], "rust");
    }
}
