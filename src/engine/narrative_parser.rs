use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::engine::TurnLimits;
use crate::model::llm_decode::decode_segment;
use crate::model::narrative::{Choice, StorySegment};

pub const DEFAULT_ENDING_TEXT: &str =
    "The story reaches its conclusion, bringing closure to the adventure.";

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

static CHOICE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:text|action)"\s*:\s*"([^"]+)""#).expect("valid regex"));

static STORY_TEXT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""story_text"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});

const FALLBACK_CHOICES: [&str; 3] = [
    "Continue the investigation",
    "Take a different approach",
    "Search for more clues",
];

const SALVAGE_CHOICES: [&str; 2] = ["Continue the journey", "Take a different approach"];

/// Turn a raw model reply into a segment for `turn`. Never fails: whatever
/// the model sent, the player gets something to read and something to pick.
pub fn parse_segment(raw: &str, turn: u32, limits: TurnLimits) -> StorySegment {
    let mut segment = match parse_json(raw) {
        Some(value) => decode_segment(&value),
        None => {
            warn!(turn, "model reply was not JSON, salvaging text");
            salvage_segment(raw)
        }
    };

    if turn >= limits.max_turns {
        segment.is_ending = true;
    } else if turn < limits.min_turns || turn < limits.max_turns.saturating_sub(2) {
        segment.is_ending = false;
    }

    if segment.is_ending {
        segment.choices.clear();
    } else if segment.choices.is_empty() {
        debug!(turn, "no choices in reply, using defaults");
        segment.choices = FALLBACK_CHOICES.iter().map(|c| Choice::plain(*c)).collect();
    }

    segment
}

/// Parse the reply to an ending prompt. The result is always an ending.
pub fn parse_ending(raw: &str) -> StorySegment {
    let mut segment = match parse_json(raw) {
        Some(value) => {
            let has_text = value
                .get("story_text")
                .and_then(Value::as_str)
                .is_some_and(|t| !t.trim().is_empty());

            let mut segment = decode_segment(&value);
            if !has_text {
                segment.text = DEFAULT_ENDING_TEXT.to_string();
            }
            segment
        }
        None => {
            let text = raw.trim();
            if text.is_empty() {
                StorySegment::ending(DEFAULT_ENDING_TEXT)
            } else {
                StorySegment::ending(text)
            }
        }
    };

    segment.is_ending = true;
    segment.choices.clear();
    segment
}

/// Direct parse first, then the cleaned-up object.
fn parse_json(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        if value.is_object() {
            return Some(value);
        }
    }

    let cleaned = clean_json_response(raw)?;
    serde_json::from_str::<Value>(&cleaned)
        .ok()
        .filter(Value::is_object)
}

/// Cut the reply down to its outermost object and drop trailing commas.
pub fn clean_json_response(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let object = &raw[start..=end];
    Some(TRAILING_COMMA.replace_all(object, "$1").into_owned())
}

fn salvage_segment(raw: &str) -> StorySegment {
    let text = STORY_TEXT_FIELD
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str()))
        .unwrap_or_else(|| raw.trim().to_string());

    let mut found: Vec<String> = Vec::new();
    for capture in CHOICE_FIELD.captures_iter(raw) {
        let choice = capture[1].trim().to_string();
        if !choice.is_empty() && !found.contains(&choice) {
            found.push(choice);
        }
    }

    let choices: Vec<Choice> = if found.is_empty() {
        SALVAGE_CHOICES.iter().map(|c| Choice::plain(*c)).collect()
    } else {
        found.into_iter().take(3).map(Choice::plain).collect()
    };

    StorySegment::new(text, choices)
}

fn unescape(s: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", s)).unwrap_or_else(|_| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: TurnLimits = TurnLimits {
        min_turns: 10,
        max_turns: 15,
    };

    const WELL_FORMED: &str = r#"{
        "story_text": "The lights go out.",
        "choices": [
            {"text": "Find a torch", "action": "Search for a torch"},
            {"text": "Stay still", "action": "Hide in the dark"}
        ],
        "is_ending": false,
        "context_update": {"new_characters": {}, "new_locations": {}, "key_event": "Blackout"}
    }"#;

    #[test]
    fn parses_clean_reply() {
        let segment = parse_segment(WELL_FORMED, 2, LIMITS);
        assert_eq!(segment.text, "The lights go out.");
        assert_eq!(segment.choices.len(), 2);
        assert_eq!(segment.choices[1].action, "Hide in the dark");
        assert_eq!(segment.context_update.key_event.as_deref(), Some("Blackout"));
    }

    #[test]
    fn strips_chatter_and_trailing_commas() {
        let raw = "Sure! Here is the next part:\n{\"story_text\": \"Wind howls.\", \"choices\": [\"Go on\", \"Turn back\",], \"is_ending\": false,}\nHope you like it!";
        let segment = parse_segment(raw, 3, LIMITS);

        assert_eq!(segment.text, "Wind howls.");
        assert_eq!(
            segment.choices,
            vec![Choice::plain("Go on"), Choice::plain("Turn back")]
        );
    }

    #[test]
    fn clean_json_response_rejects_text_without_object() {
        assert_eq!(clean_json_response("no braces here"), None);
        assert_eq!(clean_json_response("} backwards {"), None);
        assert_eq!(
            clean_json_response("x {\"a\": [1, 2,], } y").as_deref(),
            Some("{\"a\": [1, 2] }")
        );
    }

    #[test]
    fn salvages_choices_from_broken_json() {
        let raw = r#"{"story_text": "The bridge \"sways\".", "choices": [{"text": "Cross", "action": "Cross"}, {"text": "Wait", "action": "Wait here"} "is_ending": false"#;
        let segment = parse_segment(raw, 2, LIMITS);

        assert_eq!(segment.text, "The bridge \"sways\".");
        let labels: Vec<&str> = segment.choices.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(labels, vec!["Cross", "Wait", "Wait here"]);
        assert!(!segment.is_ending);
    }

    #[test]
    fn plain_prose_gets_default_choices() {
        let segment = parse_segment("You wake in a cold cell.", 2, LIMITS);
        assert_eq!(segment.text, "You wake in a cold cell.");
        assert_eq!(segment.choices[0].text, "Continue the journey");
        assert_eq!(segment.choices.len(), 2);
    }

    #[test]
    fn early_endings_are_suppressed() {
        let raw = r#"{"story_text": "It is over.", "choices": [], "is_ending": true}"#;
        let segment = parse_segment(raw, 5, LIMITS);

        assert!(!segment.is_ending);
        assert_eq!(segment.choices.len(), 3);
        assert_eq!(segment.choices[0].text, "Continue the investigation");
    }

    #[test]
    fn late_turns_may_end() {
        let raw = r#"{"story_text": "Dawn breaks.", "choices": [{"text": "x"}], "is_ending": true}"#;
        let segment = parse_segment(raw, 13, LIMITS);

        assert!(segment.is_ending);
        assert!(segment.choices.is_empty());
    }

    #[test]
    fn max_turn_forces_ending() {
        let segment = parse_segment(WELL_FORMED, 15, LIMITS);
        assert!(segment.is_ending);
        assert!(segment.choices.is_empty());
    }

    #[test]
    fn ending_reply_is_always_terminal() {
        let raw = r#"{"story_text": "Peace returns.", "choices": ["again"], "is_ending": false, "context_update": {"final_outcome": "Victory"}}"#;
        let ending = parse_ending(raw);
        assert!(ending.is_ending);
        assert!(ending.choices.is_empty());
        assert_eq!(ending.text, "Peace returns.");
        assert_eq!(ending.context_update.final_outcome.as_deref(), Some("Victory"));

        let ending = parse_ending(r#"{"choices": []}"#);
        assert_eq!(ending.text, DEFAULT_ENDING_TEXT);

        let ending = parse_ending("And so it ends.");
        assert_eq!(ending.text, "And so it ends.");
        assert!(ending.is_ending);
    }
}
