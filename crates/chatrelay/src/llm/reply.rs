//! Reply extraction from raw completion bodies.

use serde_json::Value;

use super::types::ChatResponse;

/// Placeholder returned when a completion carries no usable text.
pub const EMPTY_REPLY: &str = "<empty reply>";

/// Turns a provider's raw completion body into reply text.
pub trait ReplyAdapter: Send + Sync {
    /// Extract reply text, or `None` when nothing usable is found.
    fn extract_text(&self, response: &Value) -> Option<String>;
}

/// Extract reply text with `adapter`, falling back to [`EMPTY_REPLY`].
///
/// Never fails: blank or missing text yields the placeholder.
pub fn extract_reply(adapter: &dyn ReplyAdapter, response: &Value) -> String {
    match adapter.extract_text(response) {
        Some(text) if !text.trim().is_empty() => text,
        _ => EMPTY_REPLY.to_string(),
    }
}

/// Adapter for OpenAI-style chat completion bodies.
///
/// Tries, in order: `choices[0].message.content`, `choices[0].text`, a loose
/// probe of the first `choices`/`outputs` entry, and finally the whole body
/// as text.
pub struct ChatCompletionsAdapter;

impl ReplyAdapter for ChatCompletionsAdapter {
    fn extract_text(&self, response: &Value) -> Option<String> {
        if let Ok(parsed) = serde_json::from_value::<ChatResponse>(response.clone())
            && let Some(choice) = parsed.choices.into_iter().next()
        {
            if let Some(content) = choice.message.and_then(|m| m.content) {
                return Some(content);
            }
            if let Some(text) = choice.text {
                return Some(text);
            }
        }

        probe_first_entry(response).or_else(|| stringify(response))
    }
}

/// Look inside the first `choices` or `outputs` entry for something textual.
fn probe_first_entry(response: &Value) -> Option<String> {
    let map = response.as_object()?;
    let entries = map
        .get("choices")
        .or_else(|| map.get("outputs"))?
        .as_array()?;
    let first = entries.first()?.as_object()?;

    ["message", "content", "text"].iter().find_map(|key| {
        match first.get(*key)? {
            Value::String(s) => Some(s.clone()),
            Value::Object(inner) => ["content", "text"]
                .iter()
                .find_map(|k| inner.get(*k).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        }
    })
}

fn stringify(response: &Value) -> Option<String> {
    match response {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
