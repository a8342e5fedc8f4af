use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::engine::StoryEngine;
use crate::engine::llm_client::StoryModel;
use crate::model::game_state::GameState;
use crate::model::genre::Genre;
use crate::model::narrative::{Choice, StorySegment};
use crate::model::transcript::TranscriptEntry;
use crate::ui::render;
use crate::ui::transcript_io;

/// Standard input was closed while we were waiting for an answer.
#[derive(Debug, Error)]
#[error("input closed")]
pub struct InputClosed;

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Skip the genre menu
    pub genre: Option<Genre>,
    pub transcript: Option<PathBuf>,
}

/// The read-display loop. Generic over its input and output so it can be
/// driven from a script.
pub struct App<M, R, W> {
    engine: StoryEngine<M>,
    input: R,
    out: W,
    options: AppOptions,
}

impl<M, R, W> App<M, R, W>
where
    M: StoryModel,
    R: BufRead,
    W: Write,
{
    pub fn new(engine: StoryEngine<M>, input: R, out: W, options: AppOptions) -> Self {
        Self {
            engine,
            input,
            out,
            options,
        }
    }

    /// Play sessions until the player stops. Closing the input is a normal way out.
    pub fn run(&mut self) -> anyhow::Result<()> {
        match self.run_sessions() {
            Err(e) if e.is::<InputClosed>() => {
                info!("input closed, leaving");
                render::terminated(&mut self.out)?;
                Ok(())
            }
            other => other,
        }
    }

    fn run_sessions(&mut self) -> anyhow::Result<()> {
        render::welcome(&mut self.out)?;

        loop {
            let genre = match self.options.genre {
                Some(genre) => genre,
                None => self.select_genre()?,
            };

            self.play(genre)?;

            render::thanks(&mut self.out)?;
            if !self.ask_yes_no("\nWould you like to play again?")? {
                return Ok(());
            }
        }
    }

    /// One story from the first segment to the end. Returns the final state.
    pub fn play(&mut self, genre: Genre) -> anyhow::Result<GameState> {
        let mut state = GameState::new(genre);
        render::starting(&mut self.out, genre)?;
        info!(%genre, limits = ?self.engine.limits(), "session started");

        let Some(mut segment) = self.request_segment(&state)? else {
            return Ok(state);
        };

        loop {
            render::segment(&mut self.out, &segment)?;

            let is_ending = segment.is_ending;
            let choices = segment.choices.clone();
            state.record_segment(segment);

            if is_ending {
                render::the_end(&mut self.out)?;
                info!(turns = state.segments().len(), "story finished");
                return Ok(state);
            }

            render::choices(&mut self.out, &choices)?;
            let choice = self.read_choice(&choices)?;
            state.record_choice(&choice);

            segment = match self.request_segment(&state)? {
                Some(next) => next,
                None => return Ok(state),
            };
        }
    }

    /// Ask the engine for the next segment, offering a retry on failure.
    /// `None` means the player gave up on this story.
    fn request_segment(&mut self, state: &GameState) -> anyhow::Result<Option<StorySegment>> {
        loop {
            let result = if state.is_start() {
                self.engine.opening(state)
            } else {
                self.engine.next_segment(state)
            };

            match result {
                Ok(segment) => {
                    self.write_transcript(state, &segment);
                    return Ok(Some(segment));
                }
                Err(e) => {
                    warn!(error = %e, turn = state.turn(), "segment request failed");
                    render::error(
                        &mut self.out,
                        &format!("The storyteller could not continue: {}", e),
                    )?;

                    if !self.ask_yes_no("Retry?")? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn write_transcript(&self, state: &GameState, segment: &StorySegment) {
        let Some(path) = &self.options.transcript else {
            return;
        };

        let entry = TranscriptEntry::new(state.genre(), state.turn(), state.choice_history(), segment);
        if let Err(e) = transcript_io::append_entry(path, entry) {
            warn!(error = %e, "could not write transcript");
        }
    }

    fn select_genre(&mut self) -> anyhow::Result<Genre> {
        render::genre_menu(&mut self.out)?;
        let last_key = Genre::ALL.len() + 1;

        loop {
            let answer = self.prompt(&format!("\nEnter your choice [1-{}]: ", last_key))?;
            let answer = answer.trim();

            if answer == render::SURPRISE_KEY {
                let genre = Genre::random(&mut rand::thread_rng());
                render::info(&mut self.out, &format!("Fate chose {}.", genre))?;
                return Ok(genre);
            }
            if let Some(genre) = Genre::from_menu_key(answer) {
                return Ok(genre);
            }
            if let Ok(genre) = answer.parse::<Genre>() {
                return Ok(genre);
            }

            render::error(
                &mut self.out,
                &format!("Invalid choice. Please enter a number between 1 and {}.", last_key),
            )?;
        }
    }

    fn read_choice(&mut self, choices: &[Choice]) -> anyhow::Result<Choice> {
        let count = choices.len();

        loop {
            let answer = self.prompt(&format!("\nEnter your choice [1-{}]: ", count))?;

            match answer.trim().parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(choices[n - 1].clone()),
                Ok(_) => render::error(
                    &mut self.out,
                    &format!("Invalid choice. Please enter a number between 1 and {}.", count),
                )?,
                Err(_) => render::error(&mut self.out, "Please enter a valid number.")?,
            }
        }
    }

    fn ask_yes_no(&mut self, question: &str) -> anyhow::Result<bool> {
        loop {
            let answer = self.prompt(&format!("{} [y/n]: ", question))?;
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => render::error(&mut self.out, "Please answer y or n.")?,
            }
        }
    }

    fn prompt(&mut self, text: &str) -> anyhow::Result<String> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("reading from standard input")?;
        if read == 0 {
            return Err(InputClosed.into());
        }
        Ok(line)
    }
}
