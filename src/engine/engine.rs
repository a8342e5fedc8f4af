use tracing::{debug, info};

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::llm_client::StoryModel;
use crate::engine::narrative_parser::{parse_ending, parse_segment};
use crate::engine::prompt_builder::PromptBuilder;
use crate::model::game_state::GameState;
use crate::model::narrative::StorySegment;

/// How long a story may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnLimits {
    /// No ending before this turn
    pub min_turns: u32,
    /// The segment for this turn is always the ending
    pub max_turns: u32,
}

impl TurnLimits {
    pub fn new(min_turns: u32, max_turns: u32) -> EngineResult<Self> {
        if min_turns == 0 || min_turns > max_turns {
            return Err(EngineError::InvalidLimits {
                min: min_turns,
                max: max_turns,
            });
        }
        Ok(Self {
            min_turns,
            max_turns,
        })
    }
}

impl Default for TurnLimits {
    fn default() -> Self {
        Self {
            min_turns: 10,
            max_turns: 15,
        }
    }
}

/// Drives the model through one story: which prompt to send for the
/// current turn and how to read the reply. Holds no story state itself.
pub struct StoryEngine<M> {
    model: M,
    limits: TurnLimits,
}

impl<M: StoryModel> StoryEngine<M> {
    pub fn new(model: M, limits: TurnLimits) -> Self {
        Self { model, limits }
    }

    pub fn limits(&self) -> TurnLimits {
        self.limits
    }

    /// First segment of a fresh session.
    pub fn opening(&self, state: &GameState) -> EngineResult<StorySegment> {
        info!(genre = %state.genre(), "generating opening");
        self.generate(state)
    }

    /// Segment for `state.turn()`. At the turn limit this is the ending.
    pub fn next_segment(&self, state: &GameState) -> EngineResult<StorySegment> {
        if !state.is_start() && state.turn() >= self.limits.max_turns {
            return self.ending(state);
        }
        self.generate(state)
    }

    pub fn ending(&self, state: &GameState) -> EngineResult<StorySegment> {
        info!(turn = state.turn(), "generating ending");
        let prompt = PromptBuilder::build_ending(state);
        let raw = self.model.complete(&prompt)?;
        Ok(parse_ending(&raw))
    }

    fn generate(&self, state: &GameState) -> EngineResult<StorySegment> {
        let turn = state.turn();
        let prompt = PromptBuilder::build_segment(state, self.limits);
        let raw = self.model.complete(&prompt)?;
        let segment = parse_segment(&raw, turn, self.limits);

        debug!(
            turn,
            choices = segment.choices.len(),
            is_ending = segment.is_ending,
            new_context = !segment.context_update.is_empty(),
            "segment generated"
        );

        Ok(segment)
    }
}
