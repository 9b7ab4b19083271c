//! Script generation: cleaned segments → a parsed two-speaker [`Script`].
//!
//! The language model sits behind the [`ScriptModel`] trait. Production runs
//! use [`LlmScriptModel`], a thin adapter over an edgequake-llm provider;
//! tests hand in a fake through
//! [`crate::config::PodcastConfigBuilder::script_model`].
//!
//! ## Request layout
//!
//! 1. **System message**: the writing rules (or the caller's override)
//! 2. **Context message** *(incremental mode, after the first segment)*: the
//!    last `context_turns` turns so the dialogue continues instead of
//!    restarting
//! 3. **User message**: the dialogue prompt wrapping the segment text
//!
//! ## Retries
//!
//! Each request is retried up to `max_retries` times with exponential
//! backoff (`retry_backoff_ms * 2^attempt`). The retried request is
//! byte-identical to the first. Authentication failures are not retried,
//! and neither is output that arrives but is empty or unparseable: asking
//! again with the same prompt is not a fix for a model that ignores the
//! format.

use crate::config::{PodcastConfig, ScriptMode, SpeakerLabels};
use crate::error::{Pdf2PodError, ServiceError};
use crate::output::{Script, TextSegment};
use crate::pipeline::limit::RequestLimiter;
use crate::pipeline::parse::parse_block;
use crate::prompts::{conversation_context, dialogue_prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Model used for the Gemini fallback when no model is configured.
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// One request to the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub system: String,
    /// The tail of the conversation so far, if any.
    pub context: Option<String>,
    pub prompt: String,
}

/// The model's answer to a [`ScriptRequest`].
#[derive(Debug, Clone, Default)]
pub struct ScriptCompletion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A generative text service.
#[async_trait]
pub trait ScriptModel: Send + Sync {
    async fn complete(&self, request: &ScriptRequest) -> Result<ScriptCompletion, ServiceError>;
}

/// [`ScriptModel`] backed by an edgequake-llm provider.
pub struct LlmScriptModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmScriptModel {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(temperature),
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl ScriptModel for LlmScriptModel {
    async fn complete(&self, request: &ScriptRequest) -> Result<ScriptCompletion, ServiceError> {
        let mut messages = vec![ChatMessage::system(request.system.as_str())];
        if let Some(ref context) = request.context {
            messages.push(ChatMessage::system(context.as_str()));
        }
        messages.push(ChatMessage::user(request.prompt.as_str()));

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| classify_llm_error(&e.to_string()))?;

        Ok(ScriptCompletion {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// Sort a provider error message into the retry classes.
fn classify_llm_error(msg: &str) -> ServiceError {
    let lower = msg.to_lowercase();
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("api key")
        || lower.contains("authentication")
    {
        ServiceError::Auth(msg.to_string())
    } else if lower.contains("connect") || lower.contains("dns") || lower.contains("network") {
        ServiceError::Transport(msg.to_string())
    } else {
        ServiceError::Api(msg.to_string())
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2PodError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2PodError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the script model, from most-specific to least-specific.
///
/// 1. `config.script_model`, used as-is
/// 2. `config.provider`, wrapped in [`LlmScriptModel`]
/// 3. `config.provider_name` (+ `config.model`)
/// 4. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 5. `GEMINI_API_KEY` present: Gemini with `config.model` or `gemini-2.0-flash`
/// 6. `ProviderFactory::from_env` auto-detection
pub fn resolve_script_model(config: &PodcastConfig) -> Result<Arc<dyn ScriptModel>, Pdf2PodError> {
    if let Some(ref model) = config.script_model {
        return Ok(Arc::clone(model));
    }

    let provider = resolve_provider(config)?;
    Ok(Arc::new(LlmScriptModel::new(
        provider,
        config.temperature,
        config.max_tokens,
    )))
}

fn resolve_provider(config: &PodcastConfig) -> Result<Arc<dyn LLMProvider>, Pdf2PodError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
            return create_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2PodError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Cut `text` to at most `max_chars` characters, ending at the last complete
/// line. A first line longer than the cap is cut mid-line.
pub fn truncate_script(text: &str, max_chars: usize) -> &str {
    let cut = match text.char_indices().nth(max_chars) {
        Some((byte, _)) => byte,
        None => return text,
    };
    let head = &text[..cut];
    match head.rfind('\n') {
        Some(pos) => &head[..pos],
        None => head,
    }
}

/// The script of a run plus what it cost to produce.
#[derive(Debug, Clone, Default)]
pub struct GeneratedScript {
    pub script: Script,
    pub calls: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Drives the [`ScriptModel`] over a document's segments.
pub struct ScriptGenerator<'a> {
    model: Arc<dyn ScriptModel>,
    config: &'a PodcastConfig,
    labels: SpeakerLabels,
    limiter: Option<RequestLimiter>,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(model: Arc<dyn ScriptModel>, config: &'a PodcastConfig) -> Self {
        Self {
            model,
            labels: config.speaker_labels(),
            limiter: config.requests_per_minute.map(RequestLimiter::per_minute),
            config,
        }
    }

    fn system_prompt(&self) -> &str {
        self.config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Generate the whole conversation.
    ///
    /// Segments are processed strictly in order. The first segment that
    /// fails aborts the run; nothing generated so far is returned.
    pub async fn generate(&self, segments: &[TextSegment]) -> Result<GeneratedScript, Pdf2PodError> {
        match self.config.script_mode {
            ScriptMode::Incremental => self.generate_incremental(segments).await,
            ScriptMode::Whole => self.generate_whole(segments).await,
        }
    }

    async fn generate_incremental(
        &self,
        segments: &[TextSegment],
    ) -> Result<GeneratedScript, Pdf2PodError> {
        let mut out = GeneratedScript::default();
        let total = segments.len();

        for segment in segments {
            let continuing = !out.script.is_empty();
            let context = (continuing && self.config.context_turns > 0)
                .then(|| conversation_context(out.script.tail(self.config.context_turns)));
            let request = ScriptRequest {
                system: self.system_prompt().to_string(),
                context,
                prompt: dialogue_prompt(
                    &segment.text,
                    &self.config.host,
                    &self.config.guest,
                    continuing,
                ),
            };
            self.run_segment(segment.index, total, &request, &mut out)
                .await?;
        }

        Ok(out)
    }

    async fn generate_whole(&self, segments: &[TextSegment]) -> Result<GeneratedScript, Pdf2PodError> {
        let mut out = GeneratedScript::default();
        if segments.is_empty() {
            return Ok(out);
        }

        let merged = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let request = ScriptRequest {
            system: self.system_prompt().to_string(),
            context: None,
            prompt: dialogue_prompt(&merged, &self.config.host, &self.config.guest, false),
        };
        self.run_segment(0, 1, &request, &mut out).await?;
        Ok(out)
    }

    async fn run_segment(
        &self,
        segment: usize,
        total: usize,
        request: &ScriptRequest,
        out: &mut GeneratedScript,
    ) -> Result<(), Pdf2PodError> {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_segment_start(segment, total);
        }

        let completion = self.complete_with_retry(segment, request).await?;
        out.calls += 1;
        out.input_tokens += completion.input_tokens;
        out.output_tokens += completion.output_tokens;

        let text = match self.config.max_script_chars {
            Some(max) => truncate_script(&completion.text, max),
            None => completion.text.as_str(),
        };
        if text.trim().is_empty() {
            return Err(Pdf2PodError::EmptyGeneration { segment });
        }

        let block = parse_block(text, &self.labels, segment)?;
        if !block.unrecognized.is_empty() {
            warn!(
                "Segment {}: {} line(s) not attributed to a speaker",
                segment,
                block.unrecognized.len()
            );
        }
        let turns = block.turns.len();
        debug!(
            "Segment {}: {} turns, {} input tokens, {} output tokens",
            segment, turns, completion.input_tokens, completion.output_tokens
        );
        out.script.extend(block.turns);
        out.script.unrecognized.extend(block.unrecognized);

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_segment_complete(segment, total, turns);
        }
        info!("Scripted segment {}/{} ({} turns)", segment + 1, total, turns);
        Ok(())
    }

    async fn complete_with_retry(
        &self,
        segment: usize,
        request: &ScriptRequest,
    ) -> Result<ScriptCompletion, Pdf2PodError> {
        let secs = self.config.api_timeout_secs;
        let mut last_err: Option<ServiceError> = None;
        let mut all_timeouts = true;
        let mut attempts = 0;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Segment {}: retry {}/{} after {}ms",
                    segment, attempt, self.config.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }
            if let Some(ref limiter) = self.limiter {
                limiter.acquire().await;
            }
            attempts = attempt + 1;

            let result = match timeout(Duration::from_secs(secs), self.model.complete(request)).await
            {
                Ok(r) => r,
                Err(_) => Err(ServiceError::Timeout { secs }),
            };

            match result {
                Ok(completion) => return Ok(completion),
                Err(e) => {
                    warn!("Segment {}: attempt {} failed: {}", segment, attempts, e);
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
                Pdf2PodError::GenerationTimeout { segment, secs }
            }
            Some(e) => Pdf2PodError::GenerationFailed {
                segment,
                attempts,
                detail: e.to_string(),
            },
            None => Pdf2PodError::Internal("generation loop made no attempt".into()),
        })
    }
}
