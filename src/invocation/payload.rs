//! Request payload shapes and the two operations the core needs on them:
//! pulling out the user's text and splicing a context block back in.
//!
//! * Flat: `messages[].content` is a string.
//! * Structured: `messages[].content` is a list of typed blocks
//!   (`{"type": "text", "text": ...}`).
//!
//! The command is read from the first user message that carries text.

use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Flat,
    Structured,
}

fn is_user(message: &Value) -> bool {
    message.get("role").and_then(Value::as_str) == Some("user")
}

fn is_text_block(block: &Value) -> bool {
    block.get("type").and_then(Value::as_str) == Some("text")
        && block.get("text").map_or(false, Value::is_string)
}

fn message_text(message: &Value) -> Option<&str> {
    match message.get("content")? {
        Value::String(text) => Some(text.as_str()),
        Value::Array(blocks) => blocks
            .iter()
            .find(|block| is_text_block(block))
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str),
        _ => None,
    }
}

/// Index of the user message that carries the command: the first one with
/// text, else the first user message at all.
fn source_index(messages: &[Value]) -> Option<usize> {
    messages
        .iter()
        .position(|m| is_user(m) && message_text(m).is_some())
        .or_else(|| messages.iter().position(is_user))
}

fn source_message(payload: &Value) -> Option<&Value> {
    let messages = payload.get("messages")?.as_array()?;
    messages.get(source_index(messages)?)
}

/// Shape of the payload, decided by the source user message's `content`.
pub fn payload_shape(payload: &Value) -> Option<PayloadShape> {
    match source_message(payload)?.get("content")? {
        Value::String(_) => Some(PayloadShape::Flat),
        Value::Array(_) => Some(PayloadShape::Structured),
        _ => None,
    }
}

/// First user-authored text, or `None` for unknown shapes. User turns
/// without text (e.g. only `tool_result` blocks) are passed over.
pub fn extract_user_text(payload: &Value) -> Option<&str> {
    message_text(source_message(payload)?)
}

/// Copy of `payload` with `block` spliced in.
///
/// Flat payloads get a system-role entry at the front of `messages`;
/// structured payloads get `block` prefixed to the text block the command
/// was read from.
/// Returns `None` when the shape is not recognised.
pub fn inject_context(payload: &Value, block: &str) -> Option<Value> {
    let shape = payload_shape(payload)?;
    let mut modified = payload.clone();
    let messages = modified.get_mut("messages")?.as_array_mut()?;

    match shape {
        PayloadShape::Flat => {
            messages.insert(0, json!({ "role": "system", "content": block }));
        }
        PayloadShape::Structured => {
            let index = source_index(messages)?;
            let blocks = messages[index].get_mut("content")?.as_array_mut()?;
            match blocks.iter_mut().find(|b| is_text_block(b)) {
                Some(text_block) => {
                    let original = text_block
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    let combined = format!("{}\n\n{}", block, original);
                    text_block["text"] = Value::String(combined);
                }
                None => blocks.insert(0, json!({ "type": "text", "text": block })),
            }
        }
    }
    Some(modified)
}
