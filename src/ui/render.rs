use std::io::{self, Write};

use colored::Colorize;

use crate::model::genre::Genre;
use crate::model::narrative::{Choice, StorySegment};

/* =========================
   Banners
   ========================= */

pub fn welcome(out: &mut impl Write) -> io::Result<()> {
    let rule = "=".repeat(62);
    writeln!(out, "{}", rule.yellow())?;
    writeln!(out, "  {}", "Welcome to the Interactive Story Generator!".yellow().bold())?;
    writeln!(out)?;
    writeln!(
        out,
        "  Embark on a unique adventure where your choices shape the story."
    )?;
    writeln!(out, "{}", rule.yellow())
}

pub fn starting(out: &mut impl Write, genre: Genre) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("Starting a new {} story...", genre).green().bold()
    )
}

pub fn the_end(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "THE END".cyan().bold())?;
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        "Your journey has come to an end. Thank you for playing!".dimmed()
    )
}

pub fn thanks(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Thanks for playing!".green().bold())
}

pub fn terminated(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Game terminated by user.".red().bold())
}

/* =========================
   Menus
   ========================= */

pub const SURPRISE_KEY: &str = "6";

pub fn genre_menu(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Select your story genre:".cyan().bold())?;
    for (i, genre) in Genre::ALL.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, genre)?;
    }
    writeln!(out, "{}. {}", SURPRISE_KEY, "Surprise me".italic())
}

pub fn segment(out: &mut impl Write, segment: &StorySegment) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", segment.text.trim())?;
    writeln!(out)
}

pub fn choices(out: &mut impl Write, choices: &[Choice]) -> io::Result<()> {
    writeln!(out, "{}", "What would you like to do?".cyan().bold())?;
    for (i, choice) in choices.iter().enumerate() {
        writeln!(out, "{} {}", format!("{}.", i + 1).bold(), choice.text)?;
        if let Some(description) = &choice.description {
            writeln!(out, "   {}", description.dimmed())?;
        }
    }
    Ok(())
}

/* =========================
   Messages
   ========================= */

pub fn error(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.red().bold())
}

pub fn info(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.green())
}
