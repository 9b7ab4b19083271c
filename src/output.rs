//! Data types flowing between pipeline stages and returned to callers.
//!
//! ```text
//! DocumentMetadata ─┐
//! TextSegment ──▶ (generator) ──▶ ScriptTurn ──▶ AudioClip ──▶ Podcast
//!                                  └── Script ──┘
//! ```

use crate::config::{AudioFormat, SpeakerRole};
use crate::pipeline::parse::UnrecognizedLine;
use serde::{Deserialize, Serialize};

/// Document-level metadata, read without any API call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// One bounded chunk of cleaned source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    /// Position in reading order, starting at 0.
    pub index: usize,
    pub text: String,
}

impl TextSegment {
    /// Length in characters (the unit of the segment budget).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One line of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTurn {
    /// Global position in the conversation, contiguous from 0.
    pub index: usize,
    pub speaker: SpeakerRole,
    pub text: String,
}

/// The whole conversation of a run.
///
/// Turns are appended block by block; [`Script::extend`] renumbers them so
/// indices stay `0..len` however many segments contributed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    turns: Vec<ScriptTurn>,
    /// Lines the parser could not attribute to a speaker, kept for diagnosis.
    pub unrecognized: Vec<UnrecognizedLine>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append turns from one generated block, assigning the next indices.
    pub fn extend<I>(&mut self, turns: I)
    where
        I: IntoIterator<Item = ScriptTurn>,
    {
        for mut turn in turns {
            turn.index = self.turns.len();
            self.turns.push(turn);
        }
    }

    pub fn turns(&self) -> &[ScriptTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The last `n` turns, oldest first.
    pub fn tail(&self, n: usize) -> &[ScriptTurn] {
        &self.turns[self.turns.len().saturating_sub(n)..]
    }

    /// Render as "Host: ..." / "Guest: ..." lines.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            out.push_str(turn.speaker.label());
            out.push_str(": ");
            out.push_str(&turn.text);
            out.push('\n');
        }
        out
    }
}

/// Synthesised audio for exactly one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Index of the turn this clip voices.
    pub turn_index: usize,
    pub format: AudioFormat,
    pub data: Vec<u8>,
}

impl AudioClip {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Playback length derived from the byte length and format.
    pub fn duration_ms(&self) -> u64 {
        self.format.duration_ms(self.data.len())
    }
}

/// The assembled podcast.
#[derive(Debug, Clone, Serialize)]
pub struct Podcast {
    pub format: AudioFormat,
    /// Turn indices in the order their clips appear in `audio`.
    pub clip_order: Vec<usize>,
    /// Turns dropped by the duration cap.
    pub dropped_clips: usize,
    /// Whether the duration cap cut the joined audio short.
    pub truncated: bool,
    pub duration_ms: u64,
    #[serde(skip)]
    pub audio: Vec<u8>,
}

/// Run statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodcastStats {
    pub total_pages: usize,
    pub extracted_chars: usize,
    pub segments: usize,
    pub generation_calls: usize,
    pub turns: usize,
    pub unrecognized_lines: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub audio_bytes: usize,
    pub duration_ms: u64,
    pub extraction_duration_ms: u64,
    pub generation_duration_ms: u64,
    pub synthesis_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of [`crate::generate_script`]: the script without any audio.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptOutput {
    pub script: Script,
    pub segments: Vec<TextSegment>,
    pub metadata: DocumentMetadata,
    pub stats: PodcastStats,
}

/// Result of a full conversion.
#[derive(Debug, Clone, Serialize)]
pub struct PodcastOutput {
    pub podcast: Podcast,
    pub script: Script,
    pub metadata: DocumentMetadata,
    pub stats: PodcastStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(speaker: SpeakerRole, text: &str) -> ScriptTurn {
        ScriptTurn {
            index: 0,
            speaker,
            text: text.to_string(),
        }
    }

    #[test]
    fn extend_renumbers_across_blocks() {
        let mut script = Script::new();
        script.extend(vec![turn(SpeakerRole::Host, "a"), turn(SpeakerRole::Guest, "b")]);
        script.extend(vec![turn(SpeakerRole::Host, "c")]);
        let indices: Vec<usize> = script.turns().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn tail_never_overruns() {
        let mut script = Script::new();
        script.extend(vec![turn(SpeakerRole::Host, "a"), turn(SpeakerRole::Guest, "b")]);
        assert_eq!(script.tail(10).len(), 2);
        assert_eq!(script.tail(1)[0].text, "b");
        assert!(Script::new().tail(3).is_empty());
    }

    #[test]
    fn to_text_uses_role_labels() {
        let mut script = Script::new();
        script.extend(vec![turn(SpeakerRole::Host, "Hi."), turn(SpeakerRole::Guest, "Hello!")]);
        assert_eq!(script.to_text(), "Host: Hi.\nGuest: Hello!\n");
    }

    #[test]
    fn clip_duration_is_derived() {
        let clip = AudioClip {
            turn_index: 0,
            format: AudioFormat::Wav { sample_rate: 16_000 },
            data: vec![0; 32_000],
        };
        assert_eq!(clip.duration_ms(), 1000);
    }
}
