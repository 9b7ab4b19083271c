//! Streaming conversion API: emit clips as they are voiced.
//!
//! The script has to be complete before the first clip can be requested,
//! so [`convert_stream`] runs extraction and generation eagerly, then hands
//! back the [`Script`] together with a stream over the synthesis stage.
//! Clips arrive in completion order (not turn order); sort by
//! `turn_index`, or feed them to [`crate::pipeline::assemble::assemble`],
//! which validates and orders them itself.
//!
//! Dropping the stream cancels the synthesis calls still in flight.

use crate::config::PodcastConfig;
use crate::convert::{load_document, log_voices, segment_document, write_script};
use crate::error::Pdf2PodError;
use crate::output::{AudioClip, Script};
use crate::pipeline::synthesize::{self, Synthesizer};
use crate::pipeline::{generate, input};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of synthesised clips.
pub type ClipStream = Pin<Box<dyn Stream<Item = Result<AudioClip, Pdf2PodError>> + Send>>;

/// Convert a PDF into a script plus a stream of its clips.
///
/// # Returns
/// - `Ok((Script, ClipStream))`: the full script and one stream item per
///   turn; an `Err` item means that turn failed and the caller should stop
/// - `Err(Pdf2PodError)`: extraction, configuration or generation failed
///
/// # Example
/// ```rust,no_run
/// use pdf2pod::{convert_stream, PodcastConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PodcastConfig::builder()
///     .elevenlabs_api_key(std::env::var("ELEVENLABS_API_KEY")?)
///     .build()?;
/// let (script, mut clips) = convert_stream("paper.pdf", &config).await?;
/// println!("{} turns", script.len());
/// while let Some(clip) = clips.next().await {
///     let clip = clip?;
///     println!("turn {}: {} bytes", clip.turn_index, clip.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_stream(
    input_str: impl AsRef<str>,
    config: &PodcastConfig,
) -> Result<(Script, ClipStream), Pdf2PodError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let doc = load_document(resolved.path(), config).await?;

    let mut stats = doc.base_stats();
    let segments = segment_document(&doc, input_str, config)?;
    let model = generate::resolve_script_model(config)?;
    let engine = synthesize::resolve_speech_engine(config)?;
    log_voices(config);

    let script = write_script(model, &segments, config, &mut stats).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_synthesis_start(script.len());
    }

    let clips = Synthesizer::new(engine, config).into_stream(script.turns().to_vec());
    Ok((script, Box::pin(clips)))
}
