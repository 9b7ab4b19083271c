//! # pdf2pod
//!
//! Turn a PDF document into a two-speaker audio podcast.
//!
//! A language model rewrites the document as a conversation between a host
//! and a guest; a text-to-speech service voices each line; the clips are
//! joined, in script order, into one MP3 or WAV file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Extract    page text via pdfium (spawn_blocking)
//!  ├─ 3. Clean      strip headers/footers/noise, pack sentences into segments
//!  ├─ 4. Generate   one LLM call per segment (Gemini by default)
//!  ├─ 5. Parse      "Host: …" / "Guest: …" lines → numbered turns
//!  ├─ 6. Synthesize one TTS call per turn (ElevenLabs), bounded pool
//!  └─ 7. Assemble   validate indices, join clips with optional silence
//! ```
//!
//! Every stage fails fast. An error names its stage and the segment or turn
//! that failed; a podcast is never assembled from a partial set of clips.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2pod::{convert, PodcastConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The LLM provider is auto-detected from GEMINI_API_KEY and friends.
//!     let config = PodcastConfig::builder()
//!         .elevenlabs_api_key(std::env::var("ELEVENLABS_API_KEY")?)
//!         .silence_ms(300)
//!         .build()?;
//!     let output = convert("paper.pdf", &config).await?;
//!     std::fs::write("paper.mp3", &output.podcast.audio)?;
//!     eprintln!("{} turns, {} ms", output.script.len(), output.podcast.duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2pod` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2pod = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;
pub mod voices;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AudioFormat, Persona, PodcastConfig, PodcastConfigBuilder, ScriptMode, SpeakerLabels,
    SpeakerRole, VoiceMap,
};
pub use convert::{
    convert, convert_from_bytes, convert_sync, convert_text, convert_to_file, generate_script,
    inspect, write_atomic,
};
pub use error::{Pdf2PodError, ServiceError, Stage};
pub use output::{
    AudioClip, DocumentMetadata, Podcast, PodcastOutput, PodcastStats, Script, ScriptOutput,
    ScriptTurn, TextSegment,
};
pub use pipeline::generate::{ScriptCompletion, ScriptModel, ScriptRequest};
pub use pipeline::parse::UnrecognizedLine;
pub use pipeline::synthesize::{ElevenLabsEngine, SpeechEngine};
pub use progress::{NoopProgressCallback, PodcastProgressCallback, ProgressCallback};
pub use stream::{convert_stream, ClipStream};
