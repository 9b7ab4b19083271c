//! Pipeline stages for PDF-to-podcast conversion.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ clean ──▶ generate ──▶ parse ──▶ synthesize ──▶ assemble
//! (URL/path) (pdfium)  (segments)  (LLM)      (turns)     (TTS)        (audio)
//! ```
//!
//! 1. [`input`]      canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]    read each page's text layer; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`clean`]      strip noise and running headers, split into sentences,
//!    pack sentences into bounded segments
//! 4. [`generate`]   prompt the language model per segment, with retry and
//!    the [`limit`] request limiter
//! 5. [`parse`]      turn each generated block into speaker turns
//! 6. [`synthesize`] voice each turn on a bounded worker pool
//! 7. [`assemble`]   validate and join the clips in turn order

pub mod assemble;
pub mod clean;
pub mod extract;
pub mod generate;
pub mod input;
pub mod limit;
pub mod parse;
pub mod synthesize;
