//! Speech synthesis: one audio clip per script turn.
//!
//! The TTS service sits behind the [`SpeechEngine`] trait; production runs
//! use [`ElevenLabsEngine`]. Turns are voiced on a bounded worker pool
//! (`concurrency` calls in flight). Every result lands in the slot of its
//! turn index, so completion order never leaks into the podcast.
//!
//! The first turn that fails after its retries aborts the batch. Dropping
//! the pool cancels the calls still in flight; no partial clip set is ever
//! handed to the assembler.

use crate::config::{AudioFormat, PodcastConfig, VoiceMap};
use crate::error::{Pdf2PodError, ServiceError};
use crate::output::{AudioClip, ScriptTurn};
use crate::pipeline::assemble::write_wav;
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1";
const XI_API_KEY_HEADER: &str = "xi-api-key";

/// A text-to-speech service.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Voice `text` with `voice_id`, returning raw bytes in `format`
    /// (MP3 frames, or headerless 16-bit PCM for WAV output).
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        format: AudioFormat,
    ) -> Result<Vec<u8>, ServiceError>;
}

/// ElevenLabs `text-to-speech/{voice_id}` client.
pub struct ElevenLabsEngine {
    client: reqwest::Client,
    api_key: String,
    model_id: String,
}

impl ElevenLabsEngine {
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>) -> Result<Self, Pdf2PodError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Pdf2PodError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model_id: model_id.into(),
        })
    }
}

#[async_trait]
impl SpeechEngine for ElevenLabsEngine {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        format: AudioFormat,
    ) -> Result<Vec<u8>, ServiceError> {
        let url = format!("{}/text-to-speech/{}", ELEVENLABS_API_BASE, voice_id);
        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });

        let resp = self
            .client
            .post(&url)
            .query(&[("output_format", format.tts_output_format())])
            .header(XI_API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Auth(format!("HTTP {status}: {detail}")));
        }
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Api(format!("HTTP {status}: {detail}")));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Resolve the speech engine: an injected engine first, then ElevenLabs
/// with the configured key.
pub fn resolve_speech_engine(config: &PodcastConfig) -> Result<Arc<dyn SpeechEngine>, Pdf2PodError> {
    if let Some(ref engine) = config.speech_engine {
        return Ok(Arc::clone(engine));
    }
    match config.elevenlabs_api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(Arc::new(ElevenLabsEngine::new(
            key.trim(),
            config.tts_model_id.as_str(),
        )?)),
        _ => Err(Pdf2PodError::MissingApiKey {
            service: "ElevenLabs",
            var: "ELEVENLABS_API_KEY",
        }),
    }
}

/// Check that `data` looks like the requested format.
fn validate_audio(turn: usize, format: AudioFormat, data: &[u8]) -> Result<(), Pdf2PodError> {
    if data.is_empty() {
        return Err(Pdf2PodError::EmptyAudio { turn });
    }
    match format {
        AudioFormat::Mp3 => {
            let id3 = data.starts_with(b"ID3");
            let frame_sync = data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0;
            if !id3 && !frame_sync {
                return Err(Pdf2PodError::CorruptAudio {
                    turn,
                    detail: format!(
                        "expected MP3 data, first bytes {:02X?}",
                        &data[..data.len().min(4)]
                    ),
                });
            }
        }
        AudioFormat::Wav { .. } => {
            if data.len() % 2 != 0 {
                return Err(Pdf2PodError::CorruptAudio {
                    turn,
                    detail: format!("odd PCM length {} for 16-bit samples", data.len()),
                });
            }
        }
    }
    Ok(())
}

/// Voices script turns through a [`SpeechEngine`].
#[derive(Clone)]
pub struct Synthesizer {
    engine: Arc<dyn SpeechEngine>,
    voices: VoiceMap,
    format: AudioFormat,
    api_timeout_secs: u64,
    max_retries: u32,
    retry_backoff_ms: u64,
    concurrency: usize,
    clips_dir: Option<PathBuf>,
    progress_callback: Option<ProgressCallback>,
}

impl Synthesizer {
    pub fn new(engine: Arc<dyn SpeechEngine>, config: &PodcastConfig) -> Self {
        Self {
            engine,
            voices: config.voices.clone(),
            format: config.audio_format,
            api_timeout_secs: config.api_timeout_secs,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            concurrency: config.concurrency.max(1),
            clips_dir: config.clips_dir.clone(),
            progress_callback: config.progress_callback.clone(),
        }
    }

    /// Voice one turn, retrying transient failures.
    pub async fn synthesize_turn(
        &self,
        turn: &ScriptTurn,
        total: usize,
    ) -> Result<AudioClip, Pdf2PodError> {
        let result = self.voice(turn).await;
        if let Some(ref cb) = self.progress_callback {
            match &result {
                Ok(clip) => cb.on_turn_complete(turn.index, total, clip.len()),
                Err(e) => cb.on_turn_error(turn.index, total, &e.to_string()),
            }
        }
        result
    }

    async fn voice(&self, turn: &ScriptTurn) -> Result<AudioClip, Pdf2PodError> {
        let voice_id = self
            .voices
            .get(turn.speaker)
            .filter(|v| !v.is_empty())
            .ok_or(Pdf2PodError::MissingVoice {
                turn: turn.index,
                role: turn.speaker,
            })?;

        let data = self.call_with_retry(turn.index, &turn.text, voice_id).await?;
        validate_audio(turn.index, self.format, &data)?;
        debug!(
            "Turn {} ({}): {} bytes",
            turn.index,
            turn.speaker,
            data.len()
        );

        let clip = AudioClip {
            turn_index: turn.index,
            format: self.format,
            data,
        };
        if let Some(ref dir) = self.clips_dir {
            persist_clip(dir, &clip).await?;
        }
        Ok(clip)
    }

    async fn call_with_retry(
        &self,
        turn: usize,
        text: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, Pdf2PodError> {
        let secs = self.api_timeout_secs;
        let mut last_err: Option<ServiceError> = None;
        let mut all_timeouts = true;
        let mut attempts = 0;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Turn {}: retry {}/{} after {}ms",
                    turn, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }
            attempts = attempt + 1;

            let call = self.engine.synthesize(text, voice_id, self.format);
            let result = match timeout(Duration::from_secs(secs), call).await {
                Ok(r) => r,
                Err(_) => Err(ServiceError::Timeout { secs }),
            };

            match result {
                Ok(data) => return Ok(data),
                Err(e) => {
                    warn!("Turn {}: attempt {} failed: {}", turn, attempts, e);
                    all_timeouts &= matches!(e, ServiceError::Timeout { .. });
                    let retryable = e.is_retryable();
                    last_err = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(match last_err {
            Some(ServiceError::Timeout { .. }) if all_timeouts => {
                Pdf2PodError::SynthesisTimeout { turn, secs }
            }
            Some(e) => Pdf2PodError::SynthesisFailed {
                turn,
                attempts,
                detail: e.to_string(),
            },
            None => Pdf2PodError::Internal("synthesis loop made no attempt".into()),
        })
    }

    /// Voice every turn on the worker pool and return the clips in turn
    /// order. `turns` must be numbered `0..turns.len()`.
    pub async fn synthesize_all(&self, turns: &[ScriptTurn]) -> Result<Vec<AudioClip>, Pdf2PodError> {
        let total = turns.len();
        if let Some(ref cb) = self.progress_callback {
            cb.on_synthesis_start(total);
        }

        let mut slots: Vec<Option<AudioClip>> = vec![None; total];
        let mut results = stream::iter(turns.iter().map(|turn| self.synthesize_turn(turn, total)))
            .buffer_unordered(self.concurrency);

        while let Some(result) = results.next().await {
            let clip = result?;
            let index = clip.turn_index;
            if index >= total {
                return Err(Pdf2PodError::UnexpectedClip {
                    index,
                    expected: total,
                });
            }
            if slots[index].is_some() {
                return Err(Pdf2PodError::DuplicateClip { index });
            }
            slots[index] = Some(clip);
        }

        info!("Synthesised {} clips", total);
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or(Pdf2PodError::MissingClip {
                    index,
                    expected: total,
                })
            })
            .collect()
    }

    /// Voice every turn on the worker pool, yielding clips as they finish.
    pub fn into_stream(
        self,
        turns: Vec<ScriptTurn>,
    ) -> impl Stream<Item = Result<AudioClip, Pdf2PodError>> + Send + 'static {
        let total = turns.len();
        let concurrency = self.concurrency;
        let synth = Arc::new(self);
        stream::iter(turns.into_iter().map(move |turn| {
            let synth = Arc::clone(&synth);
            async move { synth.synthesize_turn(&turn, total).await }
        }))
        .buffer_unordered(concurrency)
    }
}

/// Write a clip to `dir` as `turn-NNNN.<ext>`. WAV clips get their own
/// container so each file plays on its own.
async fn persist_clip(dir: &std::path::Path, clip: &AudioClip) -> Result<(), Pdf2PodError> {
    let path = dir.join(format!(
        "turn-{:04}.{}",
        clip.turn_index,
        clip.format.extension()
    ));
    let bytes = match clip.format {
        AudioFormat::Mp3 => clip.data.clone(),
        AudioFormat::Wav { sample_rate } => write_wav(&clip.data, sample_rate)?,
    };
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Pdf2PodError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Pdf2PodError::OutputWriteFailed { path, source: e })
}
