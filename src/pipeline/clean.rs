//! Cleaning and segmentation of extracted text.
//!
//! Raw PDF text is noisy in predictable ways: running headers and footers
//! repeat on every page, page numbers sit on their own line, words are
//! hyphenated across line breaks, and control characters leak out of the
//! text layer. [`clean_pages`] removes that noise and flattens the result
//! into single-spaced prose; [`segment_text`] then splits it into sentences
//! and packs them into [`TextSegment`]s under a character budget.
//!
//! Segmentation never cuts inside a sentence. A sentence longer than the
//! budget becomes a segment of its own.

use crate::output::TextSegment;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Clean per-page text and pack it into segments of at most `max_chars`.
pub fn clean_and_segment(pages: &[String], max_chars: usize) -> Vec<TextSegment> {
    let cleaned = clean_pages(pages);
    segment_text(&cleaned, max_chars)
}

// ── Cleaning ─────────────────────────────────────────────────────────────────

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:page\s+)?[-–]?\s*\d{1,4}\s*[-–]?(?:\s*(?:of|/)\s*\d{1,4})?$").unwrap()
});

static RE_HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{L})-\n\s*(\p{Ll})").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean the text of all pages and join it into one string.
///
/// Steps, in order:
/// 1. Normalise line endings and replace control characters with spaces
/// 2. Drop invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Drop running headers/footers and bare page numbers at page edges
/// 4. Re-join words hyphenated across line breaks
/// 5. Collapse every whitespace run to a single space
pub fn clean_pages(pages: &[String]) -> String {
    let normalised: Vec<String> = pages.iter().map(|p| strip_noise_chars(p)).collect();
    let repeated = repeated_edge_lines(&normalised);

    let mut kept_pages = Vec::with_capacity(normalised.len());
    for page in &normalised {
        let lines: Vec<&str> = page.lines().collect();
        let content: Vec<usize> = (0..lines.len())
            .filter(|&i| !lines[i].trim().is_empty())
            .collect();
        let edges: Vec<usize> = match (content.first(), content.last()) {
            (Some(&first), Some(&last)) => vec![first, last],
            _ => Vec::new(),
        };

        let kept: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|(i, line)| {
                if !edges.contains(i) {
                    return true;
                }
                let trimmed = line.trim();
                !(RE_PAGE_NUMBER.is_match(trimmed) || repeated.contains(&edge_key(trimmed)))
            })
            .map(|(_, line)| *line)
            .collect();
        kept_pages.push(kept.join("\n"));
    }

    let joined = kept_pages.join("\n\n");
    let joined = RE_HYPHEN_BREAK.replace_all(&joined, "$1$2");
    let collapsed = RE_WHITESPACE.replace_all(&joined, " ");
    collapsed.trim().to_string()
}

fn strip_noise_chars(page: &str) -> String {
    page.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'))
        .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
        .collect()
}

/// Key under which header/footer lines are compared: case-folded, with
/// digits masked so "Chapter 2 · page 14" matches "Chapter 2 · page 15".
fn edge_key(line: &str) -> String {
    line.trim()
        .chars()
        .map(|c| if c.is_ascii_digit() { '#' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// First/last non-blank lines that recur on at least half of the pages.
/// Needs three pages or more; with fewer, repetition says nothing.
fn repeated_edge_lines(pages: &[String]) -> Vec<String> {
    if pages.len() < 3 {
        return Vec::new();
    }
    let mut counts: HashMap<String, usize> = HashMap::new();
    for page in pages {
        let mut lines = page.lines().map(str::trim).filter(|l| !l.is_empty());
        let first = lines.next();
        let last = lines.next_back();
        let mut keys: Vec<String> = first.into_iter().chain(last).map(edge_key).collect();
        keys.dedup();
        for key in keys {
            *counts.entry(key).or_default() += 1;
        }
    }
    let repeated: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| n * 2 >= pages.len())
        .map(|(k, _)| k)
        .collect();
    if !repeated.is_empty() {
        debug!("Dropping {} running header/footer line(s)", repeated.len());
    }
    repeated
}

// ── Sentence splitting ───────────────────────────────────────────────────────

/// Dotted letter groups such as "U.S" or "Ph.D" (the final period excluded).
static RE_DOTTED_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}{1,2}(?:\.\p{L}{1,2})+$").unwrap());

/// Lower-case tokens that end in a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "fig", "figs",
    "no", "vol", "inc", "ltd", "co", "corp", "approx", "cf", "al", "ch", "sec", "eq", "p", "pp",
];

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | ')' | ']')
}

fn starts_sentence(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '“' | '‘' | '(' | '[')
}

/// Split flattened text into trimmed sentences, in order.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if !is_terminator(c) {
            i += 1;
            continue;
        }

        // Swallow runs like "?!" and trailing quotes/brackets.
        let mut j = i + 1;
        while j < chars.len() && (is_terminator(chars[j].1) || is_closer(chars[j].1)) {
            j += 1;
        }
        let end = chars.get(j).map(|&(p, _)| p).unwrap_or(text.len());

        let boundary = if j >= chars.len() {
            true
        } else if !chars[j].1.is_whitespace() {
            false
        } else {
            let next = chars[j..].iter().map(|&(_, ch)| ch).find(|ch| !ch.is_whitespace());
            match next {
                Some(n) if starts_sentence(n) => !(c == '.' && is_abbreviation(&text[start..pos])),
                Some(_) => false,
                None => true,
            }
        };

        if boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
        i = j;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Whether the word just before a period is an abbreviation or an initial.
fn is_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '[', '"', '\'', '“', '‘']);
    if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
        return true;
    }
    if RE_DOTTED_ABBREVIATION.is_match(word) {
        return true;
    }
    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

// ── Segment packing ──────────────────────────────────────────────────────────

/// Pack the sentences of `text` into segments of at most `max_chars`
/// characters (sentences joined by one space).
pub fn segment_text(text: &str, max_chars: usize) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in split_sentences(text) {
        let len = sentence.chars().count();
        if current.is_empty() {
            current.push_str(sentence);
            current_len = len;
        } else if current_len + 1 + len <= max_chars {
            current.push(' ');
            current.push_str(sentence);
            current_len += 1 + len;
        } else {
            push_segment(&mut segments, std::mem::take(&mut current));
            current.push_str(sentence);
            current_len = len;
        }
    }
    if !current.is_empty() {
        push_segment(&mut segments, current);
    }

    debug!("Packed text into {} segment(s)", segments.len());
    segments
}

fn push_segment(segments: &mut Vec<TextSegment>, text: String) {
    segments.push(TextSegment {
        index: segments.len(),
        text,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(clean_and_segment(&[], 1000).is_empty());
        assert!(clean_and_segment(&pages(&["", "  \n\t "]), 1000).is_empty());
    }

    #[test]
    fn control_chars_and_whitespace_are_collapsed() {
        let cleaned = clean_pages(&pages(&["Hello\u{0007}  world.\r\n\r\nNext\u{200B}   line."]));
        assert_eq!(cleaned, "Hello world. Next line.");
    }

    #[test]
    fn hyphenated_line_breaks_are_rejoined() {
        let cleaned = clean_pages(&pages(&["The astro-\nlogical chart. A well-known fact."]));
        assert_eq!(cleaned, "The astrological chart. A well-known fact.");
    }

    #[test]
    fn running_headers_and_page_numbers_are_dropped() {
        let doc = pages(&[
            "Astrology for Beginners\nThe sun is a star.\n1",
            "Astrology for Beginners\nThe moon is not.\nPage 2 of 3",
            "Astrology for Beginners\nMars is red.\n3",
        ]);
        let cleaned = clean_pages(&doc);
        assert_eq!(cleaned, "The sun is a star. The moon is not. Mars is red.");
    }

    #[test]
    fn headers_need_three_pages() {
        let cleaned = clean_pages(&pages(&["Intro\nText one.", "Intro\nText two."]));
        assert!(cleaned.starts_with("Intro"));
    }

    #[test]
    fn sentences_split_on_terminators() {
        let s = split_sentences("Hi there! Is it late? \"Yes.\" It is 5 p.m. now. Ok");
        assert_eq!(s, vec!["Hi there!", "Is it late?", "\"Yes.\"", "It is 5 p.m. now.", "Ok"]);
    }

    #[test]
    fn abbreviations_and_initials_do_not_split() {
        let s = split_sentences("Dr. Smith met J. K. Rowling. See Fig. 3 for details.");
        assert_eq!(s, vec!["Dr. Smith met J. K. Rowling.", "See Fig. 3 for details."]);
    }

    #[test]
    fn dotted_abbreviations_do_not_split() {
        let s = split_sentences("The U.S. Army was founded in 1775. It is large.");
        assert_eq!(s, vec!["The U.S. Army was founded in 1775.", "It is large."]);
        let s = split_sentences("Ask a Ph.D. student. They know.");
        assert_eq!(s, vec!["Ask a Ph.D. student.", "They know."]);
    }

    #[test]
    fn dotted_abbreviation_keeps_segment_whole() {
        let text = "The U.S. Army was founded in 1775. It is large.";
        let segs = segment_text(text, 34);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, "The U.S. Army was founded in 1775.");
    }

    #[test]
    fn decimals_do_not_split() {
        let s = split_sentences("Pi is 3.14 roughly. Done.");
        assert_eq!(s, vec!["Pi is 3.14 roughly.", "Done."]);
    }

    #[test]
    fn segments_respect_budget() {
        let text = "One two three. Four five six. Seven eight nine. Ten eleven twelve.";
        let segs = segment_text(text, 32);
        assert_eq!(segs.len(), 3);
        for seg in &segs {
            assert!(seg.char_len() <= 32, "segment too long: {:?}", seg.text);
        }
        assert_eq!(segs[0].text, "One two three. Four five six.");
        assert_eq!(segs[1].text, "Seven eight nine.");
        assert_eq!(segs[2].index, 2);
    }

    #[test]
    fn oversized_sentence_stays_whole() {
        let long = format!("Word {} end.", "word ".repeat(49).trim_end());
        let text = format!("Short one. {long} Short two.");
        let segs = segment_text(&text, 40);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].text, long);
        assert!(segs[1].char_len() > 40);
        assert!(segs[0].char_len() <= 40 && segs[2].char_len() <= 40);
    }

    #[test]
    fn segments_preserve_reading_order() {
        let sentences: Vec<String> = (0..30).map(|i| format!("Sentence number {i}.")).collect();
        let text = sentences.join(" ");
        let segs = segment_text(&text, 80);
        let rebuilt = segs.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
        assert_eq!(rebuilt, text);
        for (i, seg) in segs.iter().enumerate() {
            assert_eq!(seg.index, i);
            assert!(seg.char_len() <= 80);
        }
    }
}
