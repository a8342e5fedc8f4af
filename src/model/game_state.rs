use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::genre::Genre;
use crate::model::narrative::{Choice, StorySegment};

/// Everything the prompts know about the story so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryContext {
    /// Name -> short description
    pub characters: BTreeMap<String, String>,
    pub locations: BTreeMap<String, String>,
    pub key_events: Vec<String>,
    pub player_attributes: PlayerAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAttributes {
    pub mood: String,
    pub knowledge: Vec<String>,
    pub inventory: Vec<String>,
}

impl Default for PlayerAttributes {
    fn default() -> Self {
        Self {
            mood: "neutral".into(),
            knowledge: Vec::new(),
            inventory: Vec::new(),
        }
    }
}

/// State of one play session.
///
/// The genre is fixed when the session starts and the histories only grow.
/// Starting over means building a new `GameState`.
#[derive(Debug, Clone)]
pub struct GameState {
    genre: Genre,
    segments: Vec<StorySegment>,
    choices: Vec<String>,
    context: StoryContext,
}

impl GameState {
    pub fn new(genre: Genre) -> Self {
        Self {
            genre,
            segments: Vec::new(),
            choices: Vec::new(),
            context: StoryContext::default(),
        }
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn segments(&self) -> &[StorySegment] {
        &self.segments
    }

    /// Recorded actions, oldest first.
    pub fn choice_history(&self) -> &[String] {
        &self.choices
    }

    pub fn context(&self) -> &StoryContext {
        &self.context
    }

    /// 1-based index of the segment about to be generated.
    pub fn turn(&self) -> u32 {
        self.choices.len() as u32 + 1
    }

    pub fn is_start(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last_segment(&self) -> Option<&StorySegment> {
        self.segments.last()
    }

    /// Merge the segment's context update and append it to the history.
    pub fn record_segment(&mut self, segment: StorySegment) {
        let update = &segment.context_update;

        for (name, description) in &update.new_characters {
            self.context
                .characters
                .insert(name.clone(), description.clone());
        }
        for (name, description) in &update.new_locations {
            self.context
                .locations
                .insert(name.clone(), description.clone());
        }
        if let Some(event) = update.key_event.as_deref().map(str::trim) {
            if !event.is_empty() {
                self.context.key_events.push(event.to_string());
            }
        }

        self.segments.push(segment);
    }

    /// Record the player's pick. This is what advances the turn.
    pub fn record_choice(&mut self, choice: &Choice) {
        self.choices.push(choice.action.clone());
        self.apply_choice_keywords(&choice.action);
    }

    fn apply_choice_keywords(&mut self, action: &str) {
        let action = action.to_lowercase();
        let attributes = &mut self.context.player_attributes;

        if action.contains("investigate") {
            attributes.knowledge.push("investigative".into());
        } else if action.contains("fight") {
            attributes.mood = "aggressive".into();
        } else if action.contains("hide") {
            attributes.mood = "cautious".into();
        }
    }
}
