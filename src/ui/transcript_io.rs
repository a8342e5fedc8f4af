use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::model::transcript::{Transcript, TranscriptEntry};

/// Append one entry to the transcript at `path`. An unreadable existing
/// file is replaced by a fresh document.
pub fn append_entry(path: &Path, entry: TranscriptEntry) -> anyhow::Result<()> {
    let mut transcript: Transcript = fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default();

    transcript.story_sessions.push(entry);

    let json = serde_json::to_string_pretty(&transcript)?;
    fs::write(path, json).with_context(|| format!("writing transcript {}", path.display()))?;

    debug!(
        path = %path.display(),
        entries = transcript.story_sessions.len(),
        "transcript updated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::genre::Genre;
    use crate::model::narrative::{Choice, StorySegment};

    #[test]
    fn entries_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");

        let segment = StorySegment::new("Fog rolls in.", vec![Choice::plain("Wait")]);
        append_entry(&path, TranscriptEntry::new(Genre::Horror, 1, &[], &segment)).unwrap();
        append_entry(
            &path,
            TranscriptEntry::new(Genre::Horror, 2, &["Wait".to_string()], &segment),
        )
        .unwrap();

        let saved: Transcript = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.story_sessions.len(), 2);
        assert_eq!(saved.story_sessions[1].turn, 2);
        assert_eq!(saved.story_sessions[1].previous_choices, vec!["Wait".to_string()]);
        assert_eq!(saved.story_sessions[0].story_text, "Fog rolls in.");
    }

    #[test]
    fn corrupt_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, "garbage").unwrap();

        let segment = StorySegment::ending("The end.");
        append_entry(&path, TranscriptEntry::new(Genre::Action, 15, &[], &segment)).unwrap();

        let saved: Transcript = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.story_sessions.len(), 1);
        assert!(saved.story_sessions[0].is_ending);
    }
}
