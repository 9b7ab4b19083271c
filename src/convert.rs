//! Eager (whole-podcast) conversion entry points.
//!
//! Every function here waits for the full pipeline and returns the
//! assembled podcast (or the script, for [`generate_script`]). Use
//! [`crate::stream::convert_stream`] to receive clips as they are voiced.
//!
//! The run is fail-fast: the first stage error is returned as-is and
//! nothing produced before it is kept.

use crate::config::{PodcastConfig, SpeakerRole};
use crate::error::Pdf2PodError;
use crate::output::{
    DocumentMetadata, PodcastOutput, PodcastStats, Script, ScriptOutput, TextSegment,
};
use crate::pipeline::generate::{self, ScriptGenerator, ScriptModel};
use crate::pipeline::synthesize::{self, Synthesizer};
use crate::pipeline::{assemble, clean, extract, input};
use crate::voices;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a PDF file or URL into a podcast.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`: local file path or HTTP/HTTPS URL to a PDF
/// * `config`: conversion configuration
///
/// # Errors
/// Any stage failure, see [`Pdf2PodError::stage`]. A document without an
/// extractable text layer yields [`Pdf2PodError::NothingToConvert`] before
/// any API is called.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &PodcastConfig,
) -> Result<PodcastOutput, Pdf2PodError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let doc = load_document(resolved.path(), config).await?;
    run_pipeline(doc, input_str, config, total_start).await
}

/// Run the pipeline on text that is already extracted, one string per page.
///
/// Cleaning, segmentation and everything after it behave exactly as in
/// [`convert`]; only the PDF stage is skipped.
pub async fn convert_text(
    pages: &[String],
    config: &PodcastConfig,
) -> Result<PodcastOutput, Pdf2PodError> {
    let doc = LoadedDocument::from_text(pages);
    run_pipeline(doc, "<text>", config, Instant::now()).await
}

/// Produce the dialogue script without synthesising any audio.
///
/// Needs a language model but no TTS key.
pub async fn generate_script(
    input_str: impl AsRef<str>,
    config: &PodcastConfig,
) -> Result<ScriptOutput, Pdf2PodError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Generating script: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let doc = load_document(resolved.path(), config).await?;

    let mut stats = doc.base_stats();
    let segments = segment_document(&doc, input_str, config)?;
    stats.segments = segments.len();
    let model = generate::resolve_script_model(config)?;
    let script = write_script(model, &segments, config, &mut stats).await?;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    Ok(ScriptOutput {
        script,
        segments,
        metadata: doc.metadata,
        stats,
    })
}

/// Convert a PDF and write the podcast straight to a file.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated audio file behind.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &PodcastConfig,
) -> Result<PodcastStats, Pdf2PodError> {
    let output = convert(input_str, config).await?;
    write_atomic(output_path.as_ref(), &output.podcast.audio).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &PodcastConfig,
) -> Result<PodcastOutput, Pdf2PodError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2PodError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Extract PDF metadata without converting anything.
///
/// Does not require any API key. Only the download timeout and the
/// password of `config` are used.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &PodcastConfig,
) -> Result<DocumentMetadata, Pdf2PodError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extract::extract_metadata(resolved.path(), config.password.as_deref()).await
}

/// Convert PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed on
/// return.
///
/// # Example
/// ```rust,no_run
/// use pdf2pod::{convert_from_bytes, PodcastConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("paper.pdf")?;
/// let config = PodcastConfig::builder()
///     .elevenlabs_api_key(std::env::var("ELEVENLABS_API_KEY")?)
///     .build()?;
/// let output = convert_from_bytes(&bytes, &config).await?;
/// std::fs::write("paper.mp3", &output.podcast.audio)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &PodcastConfig,
) -> Result<PodcastOutput, Pdf2PodError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2PodError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2PodError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(&path, config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Extracted text plus what is known about its source.
pub(crate) struct LoadedDocument {
    pub metadata: DocumentMetadata,
    pub pages: Vec<String>,
    pub extraction_duration_ms: u64,
}

impl LoadedDocument {
    fn from_text(pages: &[String]) -> Self {
        Self {
            metadata: DocumentMetadata {
                page_count: pages.len(),
                ..Default::default()
            },
            pages: pages.to_vec(),
            extraction_duration_ms: 0,
        }
    }

    pub fn base_stats(&self) -> PodcastStats {
        PodcastStats {
            total_pages: self.metadata.page_count,
            extracted_chars: self.pages.iter().map(|p| p.chars().count()).sum(),
            extraction_duration_ms: self.extraction_duration_ms,
            ..Default::default()
        }
    }
}

pub(crate) async fn load_document(
    path: &Path,
    config: &PodcastConfig,
) -> Result<LoadedDocument, Pdf2PodError> {
    let start = Instant::now();
    let password = config.password.as_deref();
    let metadata = extract::extract_metadata(path, password).await?;
    info!("PDF has {} pages", metadata.page_count);
    let text = extract::extract_text(path, password).await?;
    if text.is_blank() {
        warn!("No page carries a text layer; scanned PDFs are not supported");
    }

    Ok(LoadedDocument {
        metadata,
        pages: text.pages,
        extraction_duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Clean and segment; an empty result stops the run before any API call.
pub(crate) fn segment_document(
    doc: &LoadedDocument,
    source_name: &str,
    config: &PodcastConfig,
) -> Result<Vec<TextSegment>, Pdf2PodError> {
    let segments = clean::clean_and_segment(&doc.pages, config.max_segment_chars);
    if segments.is_empty() {
        return Err(Pdf2PodError::NothingToConvert {
            source_name: source_name.to_string(),
        });
    }
    info!(
        "Cleaned text into {} segment(s) of at most {} chars",
        segments.len(),
        config.max_segment_chars
    );
    Ok(segments)
}

pub(crate) async fn write_script(
    model: Arc<dyn ScriptModel>,
    segments: &[TextSegment],
    config: &PodcastConfig,
    stats: &mut PodcastStats,
) -> Result<Script, Pdf2PodError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_script_start(segments.len());
    }

    let start = Instant::now();
    let generated = ScriptGenerator::new(model, config).generate(segments).await?;
    stats.generation_duration_ms = start.elapsed().as_millis() as u64;
    stats.generation_calls = generated.calls;
    stats.total_input_tokens = generated.input_tokens;
    stats.total_output_tokens = generated.output_tokens;
    stats.turns = generated.script.len();
    stats.unrecognized_lines = generated.script.unrecognized.len();

    info!(
        "Script ready: {} turns from {} call(s), {} line(s) unrecognised",
        stats.turns, stats.generation_calls, stats.unrecognized_lines
    );
    Ok(generated.script)
}

pub(crate) fn log_voices(config: &PodcastConfig) {
    for role in SpeakerRole::ALL {
        if let Some(id) = config.voices.get(role) {
            info!("{} voice: {}", role, voices::display_name(id));
        }
    }
}

async fn run_pipeline(
    doc: LoadedDocument,
    source_name: &str,
    config: &PodcastConfig,
    total_start: Instant,
) -> Result<PodcastOutput, Pdf2PodError> {
    let mut stats = doc.base_stats();
    let segments = segment_document(&doc, source_name, config)?;
    stats.segments = segments.len();

    let model = generate::resolve_script_model(config)?;
    let engine = synthesize::resolve_speech_engine(config)?;
    log_voices(config);

    let script = write_script(model, &segments, config, &mut stats).await?;

    let synth_start = Instant::now();
    let clips = Synthesizer::new(engine, config)
        .synthesize_all(script.turns())
        .await?;
    stats.synthesis_duration_ms = synth_start.elapsed().as_millis() as u64;
    debug!("Synthesis took {}ms", stats.synthesis_duration_ms);

    let podcast = assemble::assemble(clips, script.len(), config)?;
    stats.audio_bytes = podcast.audio.len();
    stats.duration_ms = podcast.duration_ms;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} turns, {} ms of audio ({}), {}ms total",
        podcast.clip_order.len(),
        podcast.duration_ms,
        podcast.format,
        stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(podcast.clip_order.len(), podcast.duration_ms);
    }

    Ok(PodcastOutput {
        podcast,
        script,
        metadata: doc.metadata,
        stats,
    })
}

/// Write `bytes` to `path` via a sibling `.tmp` file and a rename, creating
/// missing parent directories. A failed write never leaves a truncated file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2PodError> {
    let write_err = |e| Pdf2PodError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = tmp_sibling(path);
    let written = match tokio::fs::write(&tmp_path, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_file_sits_next_to_target() {
        assert_eq!(
            tmp_sibling(Path::new("out/show.mp3")),
            PathBuf::from("out/show.mp3.tmp")
        );
    }

    #[test]
    fn blank_text_is_nothing_to_convert() {
        let doc = LoadedDocument::from_text(&["  ".to_string(), "\u{200B}\n".to_string()]);
        let config = PodcastConfig::default();
        let err = segment_document(&doc, "scan.pdf", &config).unwrap_err();
        assert!(matches!(err, Pdf2PodError::NothingToConvert { .. }));
    }

    #[test]
    fn base_stats_count_pages_and_chars() {
        let doc = LoadedDocument::from_text(&["abc".to_string(), "de".to_string()]);
        let stats = doc.base_stats();
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.extracted_chars, 5);
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("show.mp3");
        write_atomic(&target, b"ID3 data").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"ID3 data");
        assert!(!tmp_sibling(&target).exists());
    }

    #[tokio::test]
    async fn failed_atomic_write_keeps_target_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("show.mp3");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = write_atomic(&target, b"ID3 data").await.unwrap_err();
        assert!(matches!(err, Pdf2PodError::OutputWriteFailed { .. }));
        assert!(target.join("keep").exists());
        assert!(!tmp_sibling(&target).exists());
    }
}
