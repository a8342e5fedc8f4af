use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::model::narrative::{Choice, ContextUpdate, StorySegment};

pub const MISSING_STORY_TEXT: &str = "The story continues...";

/// Decode a model reply object into a segment, tolerating the usual
/// small-model sloppiness: missing fields, bare strings where objects were
/// asked for, numbers where strings were asked for.
pub fn decode_segment(value: &Value) -> StorySegment {
    let Some(object) = value.as_object() else {
        return StorySegment::new(value_to_text(value), Vec::new());
    };

    let text = object
        .get("story_text")
        .map(value_to_text)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| MISSING_STORY_TEXT.to_string());

    let choices = object.get("choices").map(decode_choices).unwrap_or_default();

    let is_ending = match object.get("is_ending") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    };

    let context_update = object
        .get("context_update")
        .and_then(Value::as_object)
        .map(decode_context_update)
        .unwrap_or_default();

    StorySegment {
        text,
        choices,
        is_ending,
        context_update,
    }
}

pub fn decode_choices(value: &Value) -> Vec<Choice> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(decode_choice).collect(),
        other => decode_choice(other).into_iter().collect(),
    }
}

fn decode_choice(value: &Value) -> Option<Choice> {
    match value {
        Value::Null => None,
        Value::Object(fields) => {
            let text = non_empty_field(fields, "text");
            let action = non_empty_field(fields, "action");
            let description = non_empty_field(fields, "description");

            let (text, action) = match (text, action) {
                (Some(t), Some(a)) => (t, a),
                (Some(t), None) => (t.clone(), t),
                (None, Some(a)) => (a.clone(), a),
                (None, None) => ("Unnamed choice".to_string(), "Unnamed action".to_string()),
            };

            Some(Choice {
                text,
                action,
                description,
            })
        }
        other => {
            let text = value_to_text(other);
            (!text.trim().is_empty()).then(|| Choice::plain(text.trim()))
        }
    }
}

fn decode_context_update(fields: &Map<String, Value>) -> ContextUpdate {
    ContextUpdate {
        new_characters: decode_named_map(fields.get("new_characters")),
        new_locations: decode_named_map(fields.get("new_locations")),
        key_event: non_empty_field(fields, "key_event"),
        final_outcome: non_empty_field(fields, "final_outcome"),
    }
}

fn decode_named_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(entries)) = value else {
        return BTreeMap::new();
    };

    entries
        .iter()
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, description)| (name.trim().to_string(), value_to_text(description)))
        .collect()
}

fn non_empty_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .filter(|v| !v.is_null())
        .map(value_to_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
