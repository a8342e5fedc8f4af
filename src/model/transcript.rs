use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::model::genre::Genre;
use crate::model::narrative::{Choice, ContextUpdate, StorySegment};

/// On-disk transcript document. Write-only: nothing ever resumes from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub story_sessions: Vec<TranscriptEntry>,
}

/// One generated segment and what led to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: DateTime<Local>,
    pub genre: Genre,
    pub turn: u32,
    pub previous_choices: Vec<String>,
    pub story_text: String,
    pub choices: Vec<Choice>,
    pub context_update: ContextUpdate,
    pub is_ending: bool,
}

impl TranscriptEntry {
    pub fn new(genre: Genre, turn: u32, previous_choices: &[String], segment: &StorySegment) -> Self {
        Self {
            timestamp: Local::now(),
            genre,
            turn,
            previous_choices: previous_choices.to_vec(),
            story_text: segment.text.clone(),
            choices: segment.choices.clone(),
            context_update: segment.context_update.clone(),
            is_ending: segment.is_ending,
        }
    }
}
