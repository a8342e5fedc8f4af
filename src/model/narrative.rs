use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One block of generated story text plus the options offered after it.
/// Produced by the parser; it does not touch game state by itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySegment {
    pub text: String,
    pub choices: Vec<Choice>,
    pub is_ending: bool,
    #[serde(default)]
    pub context_update: ContextUpdate,
}

impl StorySegment {
    pub fn new(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            text: text.into(),
            choices,
            is_ending: false,
            context_update: ContextUpdate::default(),
        }
    }

    pub fn ending(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
            is_ending: true,
            context_update: ContextUpdate::default(),
        }
    }
}

/// A menu option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Label shown in the menu
    pub text: String,

    /// What gets recorded in the choice history
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Choice {
    /// A choice whose label and recorded action are the same text.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            action: text.clone(),
            text,
            description: None,
        }
    }
}

/// New facts the model introduced with a segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextUpdate {
    #[serde(default)]
    pub new_characters: BTreeMap<String, String>,

    #[serde(default)]
    pub new_locations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_event: Option<String>,

    /// Only set on endings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_outcome: Option<String>,
}

impl ContextUpdate {
    pub fn is_empty(&self) -> bool {
        self.new_characters.is_empty()
            && self.new_locations.is_empty()
            && self.key_event.is_none()
            && self.final_outcome.is_none()
    }
}
