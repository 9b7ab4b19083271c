//! Error types for the pdf2pod library.
//!
//! The pipeline is fail-fast: any stage that cannot produce its output stops
//! the run and returns a [`Pdf2PodError`]. Partial results (already
//! synthesised clips, half a script) are dropped rather than assembled into a
//! podcast that looks complete but is not.
//!
//! Every variant names the segment, turn or path that failed, and
//! [`Pdf2PodError::stage`] tells the caller which pipeline stage it came
//! from so the CLI can print "synthesis failed at turn 2" instead of a bare
//! HTTP message.
//!
//! [`ServiceError`] is the narrower error returned by the two network
//! collaborators ([`crate::pipeline::generate::ScriptModel`] and
//! [`crate::pipeline::synthesize::SpeechEngine`]). The stage that called
//! them wraps it together with the index it was working on.

use crate::config::SpeakerRole;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2pod library.
#[derive(Debug, Error)]
pub enum Pdf2PodError {
    // ── Extraction errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a readable path nor an HTTP(S) URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not parse the document.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Text of a single page could not be read.
    #[error("Text extraction failed for page {page}: {detail}")]
    PageTextFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── Generation errors ─────────────────────────────────────────────────
    /// The language model call failed after all retries.
    #[error("Script generation failed for segment {segment} after {attempts} attempt(s): {detail}")]
    GenerationFailed {
        segment: usize,
        attempts: u32,
        detail: String,
    },

    /// Every attempt of the language model call timed out.
    #[error("Script generation timed out after {secs}s for segment {segment}")]
    GenerationTimeout { segment: usize, secs: u64 },

    /// The model answered with nothing usable.
    #[error("Script generation returned empty output for segment {segment}")]
    EmptyGeneration { segment: usize },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// A non-empty generated block contained no recognisable speaker line.
    #[error(
        "Generated script for segment {segment} contains no dialogue \
({unrecognized} unrecognised lines). First line: {first_line:?}"
    )]
    NoDialogue {
        segment: usize,
        unrecognized: usize,
        first_line: String,
    },

    // ── Synthesis errors ──────────────────────────────────────────────────
    /// The text-to-speech call failed after all retries.
    #[error("Speech synthesis failed for turn {turn} after {attempts} attempt(s): {detail}")]
    SynthesisFailed {
        turn: usize,
        attempts: u32,
        detail: String,
    },

    /// Every attempt of the text-to-speech call timed out.
    #[error("Speech synthesis timed out after {secs}s for turn {turn}")]
    SynthesisTimeout { turn: usize, secs: u64 },

    /// The TTS service returned zero bytes.
    #[error("Speech synthesis returned empty audio for turn {turn}")]
    EmptyAudio { turn: usize },

    /// The TTS service returned bytes that are not the requested format.
    #[error("Speech synthesis returned corrupt audio for turn {turn}: {detail}")]
    CorruptAudio { turn: usize, detail: String },

    /// No voice is configured for the turn's speaker role.
    #[error("No voice configured for role {role} (turn {turn})")]
    MissingVoice { turn: usize, role: SpeakerRole },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// A turn index inside the expected range has no clip.
    #[error("Cannot assemble podcast: clip for turn {index} is missing ({expected} expected)")]
    MissingClip { index: usize, expected: usize },

    /// Two clips claim the same turn index.
    #[error("Cannot assemble podcast: turn {index} has more than one clip")]
    DuplicateClip { index: usize },

    /// A clip index lies outside `0..expected`.
    #[error("Cannot assemble podcast: clip index {index} outside 0..{expected}")]
    UnexpectedClip { index: usize, expected: usize },

    /// The assembler was given nothing to assemble.
    #[error("Cannot assemble podcast: no clips")]
    NoClips,

    // ── Configuration errors ──────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required API key is absent.
    #[error("Missing API key for {service}.\nSet {var} or pass it explicitly.")]
    MissingApiKey {
        service: &'static str,
        var: &'static str,
    },

    /// The configured LLM provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Outcome / output ──────────────────────────────────────────────────
    /// Extraction and cleaning left no text, so no model was called.
    ///
    /// Scanned PDFs whose pages are images end up here.
    #[error("Nothing to convert: '{source_name}' has no extractable text")]
    NothingToConvert { source_name: String },

    /// Could not create or write the output audio file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Stage {
    Extraction,
    Generation,
    Parse,
    Synthesis,
    Assembly,
    Configuration,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extraction => "extraction",
            Stage::Generation => "generation",
            Stage::Parse => "parse",
            Stage::Synthesis => "synthesis",
            Stage::Assembly => "assembly",
            Stage::Configuration => "configuration",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

impl Pdf2PodError {
    /// Which pipeline stage produced this error.
    pub fn stage(&self) -> Stage {
        use Pdf2PodError::*;
        match self {
            FileNotFound { .. }
            | PermissionDenied { .. }
            | InvalidInput { .. }
            | DownloadFailed { .. }
            | DownloadTimeout { .. }
            | NotAPdf { .. }
            | CorruptPdf { .. }
            | PasswordRequired { .. }
            | WrongPassword { .. }
            | PageTextFailed { .. }
            | PdfiumBindingFailed(_)
            | NothingToConvert { .. } => Stage::Extraction,
            GenerationFailed { .. } | GenerationTimeout { .. } | EmptyGeneration { .. } => {
                Stage::Generation
            }
            NoDialogue { .. } => Stage::Parse,
            SynthesisFailed { .. }
            | SynthesisTimeout { .. }
            | EmptyAudio { .. }
            | CorruptAudio { .. }
            | MissingVoice { .. } => Stage::Synthesis,
            MissingClip { .. } | DuplicateClip { .. } | UnexpectedClip { .. } | NoClips => {
                Stage::Assembly
            }
            InvalidConfig(_) | MissingApiKey { .. } | ProviderNotConfigured { .. } => {
                Stage::Configuration
            }
            OutputWriteFailed { .. } | Internal(_) => Stage::Output,
        }
    }

    /// The turn index this error refers to, for synthesis failures.
    pub fn turn(&self) -> Option<usize> {
        match self {
            Pdf2PodError::SynthesisFailed { turn, .. }
            | Pdf2PodError::SynthesisTimeout { turn, .. }
            | Pdf2PodError::EmptyAudio { turn }
            | Pdf2PodError::CorruptAudio { turn, .. }
            | Pdf2PodError::MissingVoice { turn, .. } => Some(*turn),
            _ => None,
        }
    }

    /// The segment index this error refers to, for generation and parse failures.
    pub fn segment(&self) -> Option<usize> {
        match self {
            Pdf2PodError::GenerationFailed { segment, .. }
            | Pdf2PodError::GenerationTimeout { segment, .. }
            | Pdf2PodError::EmptyGeneration { segment }
            | Pdf2PodError::NoDialogue { segment, .. } => Some(*segment),
            _ => None,
        }
    }
}

/// Failure of a single request to an external service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The request did not complete within the per-call timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The service rejected the credentials (HTTP 401/403).
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The service answered with an error status or body.
    #[error("API error: {0}")]
    Api(String),

    /// The request never reached the service or the response was cut off.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    /// Whether another identical attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ServiceError::Auth(_))
    }
}
