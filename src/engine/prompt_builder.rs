use std::collections::BTreeMap;

use crate::engine::engine::TurnLimits;
use crate::model::game_state::GameState;

/// Where the story is in its arc. Picks the instruction block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Opening,
    Rising,
    Climax,
    Resolution,
    Ending,
}

impl TurnPhase {
    pub fn for_turn(turn: u32, is_start: bool, limits: TurnLimits) -> TurnPhase {
        if is_start {
            TurnPhase::Opening
        } else if turn >= limits.max_turns {
            TurnPhase::Ending
        } else if turn >= limits.min_turns && turn < limits.max_turns.saturating_sub(2) {
            TurnPhase::Climax
        } else if turn >= limits.max_turns.saturating_sub(2) {
            TurnPhase::Resolution
        } else {
            TurnPhase::Rising
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            TurnPhase::Opening => {
                "- Introduce the main setting and characters\n\
- Establish the central conflict or mystery\n\
- Create an engaging hook for the player\n\
- DO NOT resolve the story yet - this is just the beginning\n"
            }
            TurnPhase::Rising => {
                "- Advance the plot meaningfully\n\
- Reveal new information or complications\n\
- Keep the story focused and engaging\n\
- DO NOT end the story yet - minimum turns not reached\n"
            }
            TurnPhase::Climax => {
                "- Continue building toward the story's climax\n\
- Offer meaningful choices that advance the plot\n\
- Introduce new complications or revelations\n\
- Maintain story tension and engagement\n"
            }
            TurnPhase::Resolution => {
                "- Begin preparing for story resolution\n\
- Start converging plot threads\n\
- Hint at potential story conclusions\n\
- Create choices that lead toward final resolution\n"
            }
            TurnPhase::Ending => {
                "- Provide a satisfying conclusion to the story\n\
- Resolve the main conflict\n\
- Tie up loose plot threads\n"
            }
        }
    }
}

/// Builds the prompts sent to the model.
/// Formatting only: no parsing, no networking.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build_segment(state: &GameState, limits: TurnLimits) -> String {
        let turn = state.turn();
        let phase = TurnPhase::for_turn(turn, state.is_start(), limits);
        let mut prompt = String::new();

        push_storyteller_role(&mut prompt, state);
        push_context_overview(&mut prompt, state, turn, limits);
        push_instructions(&mut prompt, state, phase);
        push_structure_guidelines(&mut prompt, turn, limits);
        push_segment_format(&mut prompt);

        prompt
    }

    pub fn build_ending(state: &GameState) -> String {
        let genre = state.genre();
        let ctx = state.context();
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "You are crafting a satisfying conclusion to a {} story.\n\n",
            genre
        ));

        prompt.push_str("Story Context:\n");
        prompt.push_str(&format!("- Genre: {}\n", genre));
        prompt.push_str(&format!("- Characters: {}\n", json_map(&ctx.characters)));
        prompt.push_str(&format!("- Locations: {}\n", json_map(&ctx.locations)));
        prompt.push_str(&format!(
            "- Key Events: {}\n",
            joined_or(&ctx.key_events, "No key events")
        ));
        prompt.push_str(&format!(
            "- Previous Choices: {}\n\n",
            joined_or(state.choice_history(), "No previous choices")
        ));

        prompt.push_str("Story Generation Instructions:\n");
        prompt.push_str(TurnPhase::Ending.instructions());
        prompt.push('\n');

        prompt.push_str(&format!(
            "Ending Generation Guidelines:\n\
1. Provide a clear and meaningful resolution to the main conflict\n\
2. Address the character arcs and journeys\n\
3. Tie together key plot threads\n\
4. Create a sense of closure while leaving a little room for imagination\n\
5. Reflect the tone and style of the {} genre\n\n",
            genre
        ));

        prompt.push_str(
            "Respond EXACTLY in this JSON format:\n\
{\n\
    \"story_text\": \"Comprehensive ending narrative that wraps up the story\",\n\
    \"choices\": [],\n\
    \"is_ending\": true,\n\
    \"context_update\": {\n\
        \"final_outcome\": \"Summary of the story's conclusion\"\n\
    }\n\
}",
        );

        prompt
    }
}

fn push_storyteller_role(prompt: &mut String, state: &GameState) {
    prompt.push_str(&format!(
        "You are an expert interactive storyteller creating a {} genre story.\n\n",
        state.genre()
    ));
}

fn push_context_overview(prompt: &mut String, state: &GameState, turn: u32, limits: TurnLimits) {
    let ctx = state.context();

    prompt.push_str("CONTEXT OVERVIEW:\n");
    prompt.push_str(&format!("- Genre: {}\n", state.genre()));
    prompt.push_str(&format!(
        "- Turn Count: {} out of {} maximum turns\n",
        turn, limits.max_turns
    ));
    prompt.push_str(&format!(
        "- Previous Choices: {}\n",
        joined_or(state.choice_history(), "No previous choices")
    ));
    prompt.push_str(&format!("- Characters: {}\n", json_map(&ctx.characters)));
    prompt.push_str(&format!("- Locations: {}\n", json_map(&ctx.locations)));
    prompt.push_str(&format!(
        "- Key Events: {}\n",
        joined_or(&ctx.key_events, "No key events yet")
    ));
    prompt.push_str(&format!(
        "- Player Attributes: {}\n",
        serde_json::to_string(&ctx.player_attributes).unwrap_or_else(|_| "{}".into())
    ));

    if let Some(last) = state.last_segment() {
        prompt.push_str("\nPREVIOUS SEGMENT:\n");
        prompt.push_str(last.text.trim());
        prompt.push('\n');
    }
    if let Some(choice) = state.choice_history().last() {
        prompt.push_str(&format!("\nPLAYER'S LAST CHOICE: {}\n", choice));
    }
    prompt.push('\n');
}

fn push_instructions(prompt: &mut String, state: &GameState, phase: TurnPhase) {
    prompt.push_str("Story Generation Instructions:\n");
    prompt.push_str(phase.instructions());
    prompt.push_str(
        "- Create a concise, focused story segment that advances the plot\n\
- Ensure each choice leads to meaningful story progression\n",
    );
    prompt.push_str(&format!(
        "- Maintain the tone and style of the {} genre\n\n",
        state.genre()
    ));
}

fn push_structure_guidelines(prompt: &mut String, turn: u32, limits: TurnLimits) {
    prompt.push_str(&format!(
        "Story Structure Guidelines (Current Turn: {}, Min: {}, Max: {}):\n",
        turn, limits.min_turns, limits.max_turns
    ));
    prompt.push_str(
        "- Early turns: Establish the setting and introduce the main conflict\n\
- Middle turns: Develop the plot, reveal key information, build tension\n\
- Late turns: Lead to climactic moments and resolution opportunities\n\n",
    );

    prompt.push_str("IMPORTANT:\n");
    prompt.push_str(&format!(
        "- DO NOT end the story before turn {}\n",
        limits.min_turns
    ));
    prompt.push_str(&format!(
        "- Only start offering ending choices after turn {}\n",
        limits.min_turns
    ));
    prompt.push_str(&format!(
        "- The story will be ended at turn {}\n\n",
        limits.max_turns
    ));
}

fn push_segment_format(prompt: &mut String) {
    prompt.push_str(
        "Respond EXACTLY in this JSON format (NO EXTRA TEXT):\n\
{\n\
    \"story_text\": \"Your story segment text here, incorporating previous context\",\n\
    \"choices\": [\n\
        {\"text\": \"Choice 1 description\", \"action\": \"Specific action for Choice 1\"},\n\
        {\"text\": \"Choice 2 description\", \"action\": \"Specific action for Choice 2\"},\n\
        {\"text\": \"Choice 3 description\", \"action\": \"Specific action for Choice 3\"}\n\
    ],\n\
    \"is_ending\": false,\n\
    \"context_update\": {\n\
        \"new_characters\": {\"Character Name\": \"Brief description\"},\n\
        \"new_locations\": {\"Location Name\": \"Brief description\"},\n\
        \"key_event\": \"Significant event that occurred\"\n\
    }\n\
}",
    );
}

fn joined_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

fn json_map(map: &BTreeMap<String, String>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "{}".into())
}
