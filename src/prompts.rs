//! Prompts for turning document text into a two-speaker script.
//!
//! All prompt text lives here so it can be changed (and inspected in tests)
//! without touching the generator's retry and error handling. Callers can
//! replace the system prompt via
//! [`crate::config::PodcastConfig::system_prompt`]; the dialogue prompt is
//! always built by [`dialogue_prompt`] because the parser depends on the
//! "Host:" / "Guest:" labels it asks for.

use crate::config::Persona;
use crate::output::ScriptTurn;

/// Default system prompt for script generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a podcast script writer. You turn written material into a lively, accurate conversation between two people.

Rules:
- Every spoken line starts with a speaker label followed by a colon: "Host:" or "Guest:".
- One speaker line per text line. No narration, no stage directions, no headings.
- Plain text only: no markdown, no asterisks, no emojis, no special characters.
- Stay faithful to the source material; do not invent facts."#;

/// Build the user prompt for one piece of source text.
///
/// `continuing` is true when earlier parts of the conversation exist; the
/// model is then told not to reopen the show.
pub fn dialogue_prompt(source: &str, host: &Persona, guest: &Persona, continuing: bool) -> String {
    let opening = if continuing {
        "This continues a conversation already in progress. Do not greet the \
listeners again or reintroduce the speakers; pick up naturally from the \
previous lines."
    } else {
        "Open the show with a short introduction of the topic."
    };

    format!(
        r#"Generate a conversational script based on the following text:
"""
{source}
"""

The script should be engaging, informative, and suitable for a podcast format.
Use two speakers: a host named {host_name} ({host_desc}{host_phrase}) and a guest named {guest_name} ({guest_desc}{guest_phrase}).
The host guides the conversation with insightful questions, while the guest provides detailed responses.
Include interruptions, interjections, and natural pauses to make the conversation feel spontaneous.
Example interjections: "Wow!", "That's fascinating!", "I see what you mean."
The host can interject abruptly while the guest is speaking, and the guest can do so politely while the host is speaking.
Clearly label the speakers with "Host:" and "Guest:". Keep the script free of special characters.
Focus on a friendly, informal tone. Include humor and fun facts about the topic, and emphasize the key points of the text.
{opening}

Follow this dialogue structure:
Host: (Introduction/Topic)
Guest: (Response/Explanation)
Host: (Follow-up Question/Clarification)
Guest: (Additional Information/Example)"#,
        host_name = host.name,
        host_desc = host.description,
        host_phrase = catchphrase_suffix(host),
        guest_name = guest.name,
        guest_desc = guest.description,
        guest_phrase = catchphrase_suffix(guest),
    )
}

fn catchphrase_suffix(persona: &Persona) -> String {
    match &persona.catchphrase {
        Some(p) if !p.trim().is_empty() => format!("; catchphrase: \"{}\"", p.trim()),
        _ => String::new(),
    }
}

/// Build the context message carrying the tail of the conversation so far.
pub fn conversation_context(prior: &[ScriptTurn]) -> String {
    let mut lines = String::new();
    for turn in prior {
        lines.push_str(&format!("{}: {}\n", turn.speaker.label(), turn.text));
    }
    format!(
        "The conversation so far ended with these lines. Continue it in the same voice:\n\n\"\"\"\n{}\"\"\"",
        lines
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeakerRole;

    fn personas() -> (Persona, Persona) {
        (
            Persona::new("Alex", "a curious host").with_catchphrase("Let's dig in."),
            Persona::new("Jamie", "a patient expert"),
        )
    }

    #[test]
    fn prompt_names_personas_and_labels() {
        let (host, guest) = personas();
        let p = dialogue_prompt("Bees dance.", &host, &guest, false);
        assert!(p.contains("Bees dance."));
        assert!(p.contains("a host named Alex"));
        assert!(p.contains("Let's dig in."));
        assert!(p.contains("a guest named Jamie (a patient expert)"));
        assert!(p.contains("\"Host:\" and \"Guest:\""));
        assert!(p.contains("Open the show"));
    }

    #[test]
    fn continuing_prompt_skips_introduction() {
        let (host, guest) = personas();
        let p = dialogue_prompt("More bees.", &host, &guest, true);
        assert!(p.contains("Do not greet"));
        assert!(!p.contains("Open the show"));
    }

    #[test]
    fn context_lists_prior_turns() {
        let prior = vec![
            ScriptTurn {
                index: 4,
                speaker: SpeakerRole::Host,
                text: "So why do bees dance?".into(),
            },
            ScriptTurn {
                index: 5,
                speaker: SpeakerRole::Guest,
                text: "To share directions.".into(),
            },
        ];
        let ctx = conversation_context(&prior);
        assert!(ctx.contains("Host: So why do bees dance?\nGuest: To share directions.\n"));
    }
}
