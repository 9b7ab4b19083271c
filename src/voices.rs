//! Catalog of ElevenLabs premade voices.
//!
//! Lets callers (and the CLI) name a voice ("Eric") instead of pasting its
//! opaque id, and lets the pipeline log readable names for the voices it
//! used. Ids not in the catalog (cloned or library voices) pass through
//! untouched.

/// `(voice_id, name)` for every premade voice.
pub const VOICE_CATALOG: &[(&str, &str)] = &[
    ("9BWtsMINqrJLrRacOk9x", "Aria"),
    ("CwhRBWXzGAHq8TQ4Fs17", "Roger"),
    ("EXAVITQu4vr4xnSDxMaL", "Sarah"),
    ("FGY2WhTYpPnrIDTdsKH5", "Laura"),
    ("IKne3meq5aSn9XLyUdCD", "Charlie"),
    ("JBFqnCBsd6RMkjVDRZzb", "George"),
    ("N2lVS1w4EtoT3dr4eOWO", "Callum"),
    ("SAz9YHcvj6GT2YYXdXww", "River"),
    ("TX3LPaxmHKxFdv7VOQHJ", "Liam"),
    ("XB0fDUnXU5powFXDhCwa", "Charlotte"),
    ("Xb7hH8MSUJpSbSDYk0k2", "Alice"),
    ("XrExE9yKIg1WjnnlVkGX", "Matilda"),
    ("bIHbv24MWmeRgasZH58o", "Will"),
    ("cgSgspJ2msm6clMCkdW9", "Jessica"),
    ("cjVigY5qzO86Huf0OWal", "Eric"),
    ("iP95p4xoKVk53GoZ742B", "Chris"),
    ("nPczCjzI2devNBz1zQrb", "Brian"),
    ("onwK4e9ZLuTAKqWW03F9", "Daniel"),
    ("pFZP5JQG7iQjIQuC4Bku", "Lily"),
    ("pqHfZKP75CvOlQylNhV4", "Bill"),
];

/// Look up a premade voice id by name (case-insensitive).
pub fn voice_id_for_name(name: &str) -> Option<&'static str> {
    VOICE_CATALOG
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name.trim()))
        .map(|(id, _)| *id)
}

/// Look up the name of a premade voice id.
pub fn voice_name_for_id(id: &str) -> Option<&'static str> {
    VOICE_CATALOG
        .iter()
        .find(|(i, _)| *i == id)
        .map(|(_, name)| *name)
}

/// A readable label for logging: the catalog name, or the raw id.
pub fn display_name(id: &str) -> &str {
    voice_name_for_id(id).unwrap_or(id)
}
