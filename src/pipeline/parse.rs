//! Script parsing: generated text block → ordered speaker turns.
//!
//! Every line is classified as a [`ParsedLine::Turn`] or a
//! [`ParsedLine::Unrecognized`]. Unrecognised lines are not silently
//! dropped: they are returned alongside the turns so malformed model output
//! can be inspected (the CLI prints them with `--verbose`).
//!
//! A line is a turn when it looks like `Label: text` and the label is in the
//! configured [`SpeakerLabels`] vocabulary. Common model decorations are
//! tolerated: markdown emphasis (`**Host:**`), bullets, numbering,
//! bracketed labels (`[Guest]:`) and parenthetical directions either after
//! the label (`Host (laughing):`) or at the start of the text.

use crate::config::{SpeakerLabels, SpeakerRole};
use crate::error::Pdf2PodError;
use crate::output::ScriptTurn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_SPEAKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:[-•>]\s*)?(?:\d{1,3}[.)]\s+)?\[?(?P<label>[^:\[\]()]{1,40}?)\]?\s*(?:\([^)]*\))?\s*:\s*(?P<text>.*)$",
    )
    .unwrap()
});

static RE_LEADING_DIRECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\s*\([^)]*\))+\s*").unwrap());

/// A line of the generated block that is not dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrecognizedLine {
    /// Segment whose block contained the line.
    pub segment: usize,
    /// 1-based line number within the block.
    pub line_no: usize,
    pub text: String,
}

/// Classification of one non-blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Turn {
        line_no: usize,
        speaker: SpeakerRole,
        text: String,
    },
    Unrecognized(UnrecognizedLine),
}

/// Classify every non-blank line of `block`, in order.
pub fn parse_lines(block: &str, labels: &SpeakerLabels, segment: usize) -> Vec<ParsedLine> {
    block
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| classify(line, labels, segment, i + 1))
        .collect()
}

fn classify(line: &str, labels: &SpeakerLabels, segment: usize, line_no: usize) -> ParsedLine {
    let plain = line.replace('*', "");
    let turn = RE_SPEAKER_LINE.captures(&plain).and_then(|caps| {
        let speaker = labels.resolve(&caps["label"])?;
        let text = RE_LEADING_DIRECTION.replace(caps["text"].trim(), "");
        let text = text.trim();
        (!text.is_empty()).then(|| (speaker, text.to_string()))
    });

    match turn {
        Some((speaker, text)) => ParsedLine::Turn {
            line_no,
            speaker,
            text,
        },
        None => ParsedLine::Unrecognized(UnrecognizedLine {
            segment,
            line_no,
            text: line.trim().to_string(),
        }),
    }
}

/// Dialogue parsed from one generated block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedBlock {
    /// Turns numbered from 0 in order of appearance.
    pub turns: Vec<ScriptTurn>,
    pub unrecognized: Vec<UnrecognizedLine>,
}

/// Parse a generated block into turns.
///
/// # Errors
/// [`Pdf2PodError::NoDialogue`] when the block has content but not a single
/// recognisable speaker line. An empty block parses to an empty result.
pub fn parse_block(
    block: &str,
    labels: &SpeakerLabels,
    segment: usize,
) -> Result<ParsedBlock, Pdf2PodError> {
    let mut parsed = ParsedBlock::default();
    for line in parse_lines(block, labels, segment) {
        match line {
            ParsedLine::Turn { speaker, text, .. } => parsed.turns.push(ScriptTurn {
                index: parsed.turns.len(),
                speaker,
                text,
            }),
            ParsedLine::Unrecognized(u) => parsed.unrecognized.push(u),
        }
    }

    if parsed.turns.is_empty() && !parsed.unrecognized.is_empty() {
        return Err(Pdf2PodError::NoDialogue {
            segment,
            unrecognized: parsed.unrecognized.len(),
            first_line: parsed.unrecognized[0].text.chars().take(120).collect(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alex_jamie() -> SpeakerLabels {
        SpeakerLabels::from_pairs([("Alex", SpeakerRole::Host), ("Jamie", SpeakerRole::Guest)])
    }

    fn summary(block: &ParsedBlock) -> Vec<(usize, SpeakerRole, &str)> {
        block
            .turns
            .iter()
            .map(|t| (t.index, t.speaker, t.text.as_str()))
            .collect()
    }

    #[test]
    fn parses_named_speakers() {
        let block = parse_block("Alex: Hello there.\nJamie: Hi Alex!", &alex_jamie(), 0).unwrap();
        assert_eq!(
            summary(&block),
            vec![(0, SpeakerRole::Host, "Hello there."), (1, SpeakerRole::Guest, "Hi Alex!")]
        );
        assert!(block.unrecognized.is_empty());
    }

    #[test]
    fn tolerates_markdown_and_directions() {
        let text = "**Host:** Welcome back!\n\
                    - Guest (laughing): Thanks for having me.\n\
                    [Host]: (pause) So, the stars?\n\
                    2. GUEST: They are suns.";
        let block = parse_block(text, &SpeakerLabels::default(), 0).unwrap();
        assert_eq!(
            summary(&block),
            vec![
                (0, SpeakerRole::Host, "Welcome back!"),
                (1, SpeakerRole::Guest, "Thanks for having me."),
                (2, SpeakerRole::Host, "So, the stars?"),
                (3, SpeakerRole::Guest, "They are suns."),
            ]
        );
    }

    #[test]
    fn colon_inside_text_is_kept() {
        let block = parse_block("Host: Rule one: be curious.", &SpeakerLabels::default(), 0).unwrap();
        assert_eq!(block.turns[0].text, "Rule one: be curious.");
    }

    #[test]
    fn unrecognized_lines_are_collected() {
        let text = "Title: Episode 1\n\nHost: Hi.\nNarrator: Meanwhile...\nGuest: Hello.\nHost:";
        let block = parse_block(text, &SpeakerLabels::default(), 4).unwrap();
        assert_eq!(block.turns.len(), 2);
        let lines: Vec<(usize, &str)> = block
            .unrecognized
            .iter()
            .map(|u| (u.line_no, u.text.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![(1, "Title: Episode 1"), (4, "Narrator: Meanwhile..."), (6, "Host:")]
        );
        assert!(block.unrecognized.iter().all(|u| u.segment == 4));
    }

    #[test]
    fn prose_without_labels_is_a_parse_error() {
        let err = parse_block("I'm sorry, I can't help with that.", &SpeakerLabels::default(), 2)
            .unwrap_err();
        match err {
            Pdf2PodError::NoDialogue {
                segment,
                unrecognized,
                ..
            } => {
                assert_eq!(segment, 2);
                assert_eq!(unrecognized, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_block_is_empty_not_error() {
        let block = parse_block("\n  \n", &SpeakerLabels::default(), 0).unwrap();
        assert!(block.turns.is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = "Host: One.\nGuest: Two.\nnoise\nHost: Three.";
        let a = parse_block(text, &SpeakerLabels::default(), 0).unwrap();
        let b = parse_block(text, &SpeakerLabels::default(), 0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_lines_tags_each_line() {
        let lines = parse_lines("Host: Hi.\nwhat?", &SpeakerLabels::default(), 0);
        assert!(matches!(lines[0], ParsedLine::Turn { line_no: 1, speaker: SpeakerRole::Host, .. }));
        assert!(matches!(lines[1], ParsedLine::Unrecognized(ref u) if u.line_no == 2));
    }
}
