//! Typed views over a decoded chat payload.
//!
//! The payload stays a `serde_json::Value` (insertion-ordered, arbitrary
//! precision numbers) so that anything the proxy does not rewrite comes out
//! value-identical: key order and number spelling are kept, while string
//! escapes and whitespace are normalized by the encoder. The types here only
//! classify what is inside it.

use std::fmt;

use serde_json::Value;

use crate::payload::TransformError;

/// Decoded request body of a message-submission call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPayload {
    root: Value,
}

impl ChatPayload {
    pub fn decode(raw: &[u8]) -> Result<Self, TransformError> {
        let root = serde_json::from_slice(raw).map_err(TransformError::Decode)?;
        Ok(Self { root })
    }

    pub fn encode(&self) -> Result<Vec<u8>, TransformError> {
        serde_json::to_vec(&self.root).map_err(TransformError::Encode)
    }

    /// The message sequence, if the payload has one.
    pub fn messages(&self) -> Option<&[Value]> {
        self.root.get("messages")?.as_array().map(Vec::as_slice)
    }

    fn messages_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.root.get_mut("messages")?.as_array_mut()
    }

    /// Every text unit longer than `min_len` characters in a recognized message.
    pub fn text_units(&self, min_len: usize) -> Vec<TextUnit<'_>> {
        let mut units = Vec::new();
        let Some(messages) = self.messages() else {
            return units;
        };

        for (index, message) in messages.iter().enumerate() {
            if Role::of(message).is_none() {
                continue;
            }
            match MessageContent::of(message) {
                Some(MessageContent::Text(text)) => {
                    if exceeds(text, min_len) {
                        units.push(TextUnit {
                            slot: TextSlot::Content { message: index },
                            text,
                        });
                    }
                }
                Some(MessageContent::Blocks(blocks)) => {
                    for (block_index, block) in blocks.iter().enumerate() {
                        if let ContentBlock::Text(text) = ContentBlock::of(block) {
                            if exceeds(text, min_len) {
                                units.push(TextUnit {
                                    slot: TextSlot::Block {
                                        message: index,
                                        block: block_index,
                                    },
                                    text,
                                });
                            }
                        }
                    }
                }
                None => {}
            }
        }

        units
    }

    /// Overwrite the text at `slot`. Returns false if the slot no longer holds text.
    pub fn replace(&mut self, slot: TextSlot, text: String) -> bool {
        let Some(messages) = self.messages_mut() else {
            return false;
        };

        let target = match slot {
            TextSlot::Content { message } => messages
                .get_mut(message)
                .and_then(|m| m.get_mut("content"))
                .filter(|content| content.is_string()),
            TextSlot::Block { message, block } => messages
                .get_mut(message)
                .and_then(|m| m.get_mut("content"))
                .and_then(|content| content.get_mut(block))
                .and_then(|b| b.get_mut("text"))
                .filter(|t| t.is_string()),
        };

        match target {
            Some(value) => {
                *value = Value::String(text);
                true
            }
            None => false,
        }
    }
}

fn exceeds(text: &str, min_len: usize) -> bool {
    text.chars().count() > min_len
}

/// Roles whose content is eligible for compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Recognized role of a message entry; `None` for anything else.
    pub fn of(message: &Value) -> Option<Self> {
        match message.get("role")?.as_str()? {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// Message content: a single string or an ordered list of blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageContent<'a> {
    Text(&'a str),
    Blocks(&'a [Value]),
}

impl<'a> MessageContent<'a> {
    pub fn of(message: &'a Value) -> Option<Self> {
        match message.get("content")? {
            Value::String(text) => Some(MessageContent::Text(text)),
            Value::Array(blocks) => Some(MessageContent::Blocks(blocks)),
            _ => None,
        }
    }
}

/// A content block; only the text variant is ever rewritten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentBlock<'a> {
    Text(&'a str),
    Other,
}

impl<'a> ContentBlock<'a> {
    pub fn of(block: &'a Value) -> Self {
        let is_text = block.get("type").and_then(Value::as_str) == Some("text");
        match block.get("text").and_then(Value::as_str) {
            Some(text) if is_text => ContentBlock::Text(text),
            _ => ContentBlock::Other,
        }
    }
}

/// Location of one compressible text unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSlot {
    /// `messages[message].content` is a string.
    Content { message: usize },
    /// `messages[message].content[block].text`.
    Block { message: usize, block: usize },
}

impl fmt::Display for TextSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSlot::Content { message } => write!(f, "messages[{}].content", message),
            TextSlot::Block { message, block } => {
                write!(f, "messages[{}].content[{}]", message, block)
            }
        }
    }
}

/// A text unit borrowed from the payload.
#[derive(Debug, Clone, Copy)]
pub struct TextUnit<'a> {
    pub slot: TextSlot,
    pub text: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> ChatPayload {
        ChatPayload::decode(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn finds_string_and_block_units() {
        let long = "a".repeat(20);
        let p = payload(json!({
            "messages": [
                { "role": "user", "content": long },
                { "role": "assistant", "content": [
                    { "type": "text", "text": "short" },
                    { "type": "tool_use", "id": "t1", "name": "x", "input": { "text": long } },
                    { "type": "text", "text": long }
                ]}
            ]
        }));

        let slots: Vec<_> = p.text_units(10).into_iter().map(|u| u.slot).collect();
        assert_eq!(
            slots,
            vec![
                TextSlot::Content { message: 0 },
                TextSlot::Block { message: 1, block: 2 },
            ]
        );
    }

    #[test]
    fn skips_unrecognized_roles_and_odd_shapes() {
        let long = "b".repeat(50);
        let p = payload(json!({
            "messages": [
                { "role": "system", "content": long },
                { "role": "tool", "content": long },
                { "role": "user" },
                { "role": "user", "content": { "text": long } },
                { "role": "user", "content": [ "bare string", 7, { "type": "text", "text": 3 } ] },
                "not an object"
            ]
        }));
        assert!(p.text_units(10).is_empty());
    }

    #[test]
    fn threshold_is_exclusive_and_counts_chars() {
        let p = payload(json!({
            "messages": [
                { "role": "user", "content": "ü".repeat(10) },
                { "role": "user", "content": "ü".repeat(11) }
            ]
        }));
        let units = p.text_units(10);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].slot, TextSlot::Content { message: 1 });
    }

    #[test]
    fn replace_writes_only_text_slots() {
        let mut p = payload(json!({
            "messages": [
                { "role": "user", "content": [ { "type": "text", "text": "old", "cache_control": {"type": "ephemeral"} } ] }
            ]
        }));

        assert!(p.replace(TextSlot::Block { message: 0, block: 0 }, "new".into()));
        assert!(!p.replace(TextSlot::Content { message: 0 }, "nope".into()));
        assert!(!p.replace(TextSlot::Block { message: 4, block: 0 }, "nope".into()));

        let out: Value = serde_json::from_slice(&p.encode().unwrap()).unwrap();
        assert_eq!(
            out["messages"][0]["content"][0],
            json!({ "type": "text", "text": "new", "cache_control": {"type": "ephemeral"} })
        );
    }

    #[test]
    fn encode_keeps_key_order_and_numbers() {
        let raw = br#"{"model":"m","temperature":0.70,"messages":[{"content":"hi","role":"user"}],"max_tokens":1024}"#;
        let p = ChatPayload::decode(raw).unwrap();
        assert_eq!(p.encode().unwrap(), raw.to_vec());
    }

    #[test]
    fn missing_messages() {
        let p = payload(json!({ "prompt": "hello" }));
        assert!(p.messages().is_none());
        assert!(p.text_units(0).is_empty());
    }

    #[test]
    fn slot_display() {
        assert_eq!(TextSlot::Content { message: 2 }.to_string(), "messages[2].content");
        assert_eq!(
            TextSlot::Block { message: 1, block: 3 }.to_string(),
            "messages[1].content[3]"
        );
    }
}
