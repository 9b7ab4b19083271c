//! Configuration types for PDF-to-podcast conversion.
//!
//! Every knob of a run lives in [`PodcastConfig`], built via
//! [`PodcastConfigBuilder`]. The config is constructed once (the CLI reads
//! its environment variables at startup), then passed by reference into each
//! stage. Nothing in the library reads API keys or voice settings from
//! ambient global state, so tests can swap in fake collaborators through
//! [`PodcastConfigBuilder::script_model`] and
//! [`PodcastConfigBuilder::speech_engine`].

use crate::error::Pdf2PodError;
use crate::pipeline::generate::ScriptModel;
use crate::pipeline::synthesize::SpeechEngine;
use crate::progress::ProgressCallback;
use crate::voices;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a PDF-to-podcast conversion.
///
/// # Example
/// ```rust
/// use pdf2pod::{AudioFormat, PodcastConfig};
///
/// let config = PodcastConfig::builder()
///     .max_segment_chars(4000)
///     .silence_ms(300)
///     .audio_format(AudioFormat::Wav { sample_rate: 24_000 })
///     .elevenlabs_api_key("xi-...")
///     .build()
///     .unwrap();
/// assert_eq!(config.silence_ms, 300);
/// ```
#[derive(Clone)]
pub struct PodcastConfig {
    /// Maximum segment length in characters. Default: 6000.
    ///
    /// Sentences are packed into a segment until the next one would exceed
    /// this budget. A lone sentence longer than the budget becomes its own
    /// segment, never split.
    pub max_segment_chars: usize,

    /// How segments are turned into prompts. Default: [`ScriptMode::Incremental`].
    pub script_mode: ScriptMode,

    /// Number of trailing turns handed to the model as context for the next
    /// segment in incremental mode. Default: 6.
    pub context_turns: usize,

    /// The host persona.
    pub host: Persona,

    /// The guest persona.
    pub guest: Persona,

    /// Extra speaker labels recognised by the parser, on top of "Host",
    /// "Guest" and the persona names.
    pub extra_labels: Vec<(String, SpeakerRole)>,

    /// Voice identifier per speaker role.
    pub voices: VoiceMap,

    /// Output audio format. Default: [`AudioFormat::Mp3`].
    pub audio_format: AudioFormat,

    /// Silence inserted between adjacent clips, in milliseconds. Default: 0.
    pub silence_ms: u64,

    /// Cap on each generated script block, cut at the last complete line.
    /// Default: None.
    pub max_script_chars: Option<usize>,

    /// Cap on the assembled podcast length in milliseconds. Clips that would
    /// start at or beyond the cap are dropped and the rest is cut at the cap.
    /// At least 1000 when set. Default: None.
    pub max_duration_ms: Option<u64>,

    /// LLM model identifier. If None, `gemini-2.0-flash` is used for the
    /// Gemini fallback and the provider default otherwise.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed script model. Takes precedence over every LLM setting.
    pub script_model: Option<Arc<dyn ScriptModel>>,

    /// Sampling temperature. Default: 1.0.
    ///
    /// Dialogue writing benefits from variety, unlike transcription.
    pub temperature: f32,

    /// Maximum tokens the model may generate per script block. Default: 8192.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses the built-in one.
    pub system_prompt: Option<String>,

    /// Pre-constructed speech engine. Takes precedence over the ElevenLabs key.
    pub speech_engine: Option<Arc<dyn SpeechEngine>>,

    /// ElevenLabs API key.
    pub elevenlabs_api_key: Option<String>,

    /// ElevenLabs model id. Default: `eleven_monolingual_v1`.
    pub tts_model_id: String,

    /// Per-call timeout for both external services, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Extra attempts after a failed service call. Default: 2.
    ///
    /// The retried request is identical to the first. Authentication
    /// failures, empty output and unparseable scripts are never retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Maximum LLM requests started per minute. Default: Some(15).
    pub requests_per_minute: Option<u32>,

    /// Number of concurrent text-to-speech calls. Default: 4.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Directory where every clip is also written as `turn-NNNN.<ext>`.
    pub clips_dir: Option<PathBuf>,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            max_segment_chars: 6000,
            script_mode: ScriptMode::default(),
            context_turns: 6,
            host: Persona::default_host(),
            guest: Persona::default_guest(),
            extra_labels: Vec::new(),
            voices: VoiceMap::default(),
            audio_format: AudioFormat::default(),
            silence_ms: 0,
            max_script_chars: None,
            max_duration_ms: None,
            model: None,
            provider_name: None,
            provider: None,
            script_model: None,
            temperature: 1.0,
            max_tokens: 8192,
            system_prompt: None,
            speech_engine: None,
            elevenlabs_api_key: None,
            tts_model_id: "eleven_monolingual_v1".to_string(),
            api_timeout_secs: 60,
            max_retries: 2,
            retry_backoff_ms: 500,
            requests_per_minute: Some(15),
            concurrency: 4,
            password: None,
            download_timeout_secs: 120,
            clips_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PodcastConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodcastConfig")
            .field("max_segment_chars", &self.max_segment_chars)
            .field("script_mode", &self.script_mode)
            .field("context_turns", &self.context_turns)
            .field("host", &self.host.name)
            .field("guest", &self.guest.name)
            .field("voices", &self.voices)
            .field("audio_format", &self.audio_format)
            .field("silence_ms", &self.silence_ms)
            .field("max_script_chars", &self.max_script_chars)
            .field("max_duration_ms", &self.max_duration_ms)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("script_model", &self.script_model.as_ref().map(|_| "<dyn ScriptModel>"))
            .field("speech_engine", &self.speech_engine.as_ref().map(|_| "<dyn SpeechEngine>"))
            .field(
                "elevenlabs_api_key",
                &self.elevenlabs_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("tts_model_id", &self.tts_model_id)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl PodcastConfig {
    /// Create a new builder for `PodcastConfig`.
    pub fn builder() -> PodcastConfigBuilder {
        PodcastConfigBuilder {
            config: Self::default(),
        }
    }

    /// The complete label vocabulary used by the script parser.
    ///
    /// "Host" and "Guest" always map to their roles. Each persona's full
    /// name and first name map to its role unless the two personas share
    /// that name. Extra labels come last and may override nothing.
    pub fn speaker_labels(&self) -> SpeakerLabels {
        let mut labels = SpeakerLabels::default();
        for (persona, role) in [
            (&self.host, SpeakerRole::Host),
            (&self.guest, SpeakerRole::Guest),
        ] {
            let name = persona.name.trim();
            if name.is_empty() {
                continue;
            }
            labels.insert(name, role);
            if let Some(first) = name.split_whitespace().next() {
                if first != name {
                    labels.insert(first, role);
                }
            }
        }
        for (label, role) in &self.extra_labels {
            labels.insert(label, *role);
        }
        labels
    }
}

/// Builder for [`PodcastConfig`].
#[derive(Debug)]
pub struct PodcastConfigBuilder {
    config: PodcastConfig,
}

impl PodcastConfigBuilder {
    pub fn max_segment_chars(mut self, n: usize) -> Self {
        self.config.max_segment_chars = n;
        self
    }

    pub fn script_mode(mut self, mode: ScriptMode) -> Self {
        self.config.script_mode = mode;
        self
    }

    pub fn context_turns(mut self, n: usize) -> Self {
        self.config.context_turns = n;
        self
    }

    pub fn host(mut self, persona: Persona) -> Self {
        self.config.host = persona;
        self
    }

    pub fn guest(mut self, persona: Persona) -> Self {
        self.config.guest = persona;
        self
    }

    /// Recognise `label` as a line prefix for `role`.
    pub fn speaker_label(mut self, label: impl Into<String>, role: SpeakerRole) -> Self {
        self.config.extra_labels.push((label.into(), role));
        self
    }

    /// Set the voice for a role. Accepts a voice id or a catalog name ("Eric").
    pub fn voice(mut self, role: SpeakerRole, voice: impl AsRef<str>) -> Self {
        self.config.voices.set(role, voice);
        self
    }

    pub fn voices(mut self, voices: VoiceMap) -> Self {
        self.config.voices = voices;
        self
    }

    pub fn audio_format(mut self, format: AudioFormat) -> Self {
        self.config.audio_format = format;
        self
    }

    pub fn silence_ms(mut self, ms: u64) -> Self {
        self.config.silence_ms = ms.min(10_000);
        self
    }

    pub fn max_script_chars(mut self, n: usize) -> Self {
        self.config.max_script_chars = Some(n);
        self
    }

    pub fn max_duration_ms(mut self, ms: u64) -> Self {
        self.config.max_duration_ms = Some(ms);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn script_model(mut self, model: Arc<dyn ScriptModel>) -> Self {
        self.config.script_model = Some(model);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn speech_engine(mut self, engine: Arc<dyn SpeechEngine>) -> Self {
        self.config.speech_engine = Some(engine);
        self
    }

    pub fn elevenlabs_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.elevenlabs_api_key = Some(key.into());
        self
    }

    pub fn tts_model_id(mut self, id: impl Into<String>) -> Self {
        self.config.tts_model_id = id.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.min(10);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    /// Limit LLM requests per minute; `None` disables the limiter.
    pub fn requests_per_minute(mut self, rpm: Option<u32>) -> Self {
        self.config.requests_per_minute = rpm;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn clips_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.clips_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PodcastConfig, Pdf2PodError> {
        let c = &self.config;
        if c.max_segment_chars < 200 {
            return Err(Pdf2PodError::InvalidConfig(format!(
                "max_segment_chars must be ≥ 200, got {}",
                c.max_segment_chars
            )));
        }
        if c.concurrency == 0 {
            return Err(Pdf2PodError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(Pdf2PodError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if matches!(c.max_duration_ms, Some(ms) if ms < 1000) {
            return Err(Pdf2PodError::InvalidConfig(
                "max_duration_ms must be ≥ 1000 when set".into(),
            ));
        }
        if c.requests_per_minute == Some(0) {
            return Err(Pdf2PodError::InvalidConfig(
                "requests_per_minute must be ≥ 1 (use None to disable)".into(),
            ));
        }
        if let AudioFormat::Wav { sample_rate } = c.audio_format {
            if !AudioFormat::PCM_RATES.contains(&sample_rate) {
                return Err(Pdf2PodError::InvalidConfig(format!(
                    "Unsupported WAV sample rate {sample_rate}; expected one of {:?}",
                    AudioFormat::PCM_RATES
                )));
            }
        }
        for role in SpeakerRole::ALL {
            match c.voices.get(role) {
                Some(id) if !id.trim().is_empty() => {}
                _ => {
                    return Err(Pdf2PodError::InvalidConfig(format!(
                        "No voice configured for role {role}"
                    )))
                }
            }
        }
        if c.host.name.trim().is_empty() || c.guest.name.trim().is_empty() {
            return Err(Pdf2PodError::InvalidConfig(
                "Host and guest personas need a name".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums and small value types ──────────────────────────────────────────

/// The two speaker roles of the generated conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    Host,
    Guest,
}

impl SpeakerRole {
    pub const ALL: [SpeakerRole; 2] = [SpeakerRole::Host, SpeakerRole::Guest];

    /// The label that prefixes this role's lines in a script.
    pub fn label(self) -> &'static str {
        match self {
            SpeakerRole::Host => "Host",
            SpeakerRole::Guest => "Guest",
        }
    }
}

impl fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerRole::Host => f.write_str("HOST"),
            SpeakerRole::Guest => f.write_str("GUEST"),
        }
    }
}

/// A character voiced by one of the speakers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub catchphrase: Option<String>,
}

impl Persona {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            catchphrase: None,
        }
    }

    pub fn with_catchphrase(mut self, phrase: impl Into<String>) -> Self {
        self.catchphrase = Some(phrase.into());
        self
    }

    fn default_host() -> Self {
        Persona::new(
            "Kurt Cobain",
            "A legendary musician and lead singer of Nirvana, known for his deep and introspective lyrics",
        )
        .with_catchphrase("It's better to burn out than to fade away.")
    }

    fn default_guest() -> Self {
        Persona::new(
            "Tupac Shakur",
            "A highly influential rapper and actor, known for his powerful lyrics and social activism",
        )
        .with_catchphrase("Reality is wrong. Dreams are for real.")
    }
}

/// How cleaned segments become prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScriptMode {
    /// One call per segment; the tail of the conversation so far is passed
    /// as context so the dialogue reads continuously. (default)
    #[default]
    Incremental,
    /// A single call covering every segment joined together.
    Whole,
}

/// Role → voice id mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceMap {
    voices: BTreeMap<SpeakerRole, String>,
}

impl Default for VoiceMap {
    fn default() -> Self {
        let mut map = VoiceMap {
            voices: BTreeMap::new(),
        };
        map.set(SpeakerRole::Host, "Eric");
        map.set(SpeakerRole::Guest, "Brian");
        map
    }
}

impl VoiceMap {
    /// An empty map; every role must be set before use.
    pub fn empty() -> Self {
        VoiceMap {
            voices: BTreeMap::new(),
        }
    }

    /// Set a role's voice. A catalog name is resolved to its id; anything
    /// else is taken as an id verbatim.
    pub fn set(&mut self, role: SpeakerRole, voice: impl AsRef<str>) {
        let voice = voice.as_ref().trim();
        let id = voices::voice_id_for_name(voice).unwrap_or(voice);
        self.voices.insert(role, id.to_string());
    }

    pub fn get(&self, role: SpeakerRole) -> Option<&str> {
        self.voices.get(&role).map(String::as_str)
    }
}

/// Output audio format; also the format requested from the TTS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioFormat {
    /// MPEG-1 Layer III, 44.1 kHz, 128 kbps. Clips are concatenated frame
    /// by frame. (default)
    #[default]
    Mp3,
    /// 16-bit little-endian mono PCM at `sample_rate`, written as WAV.
    Wav { sample_rate: u32 },
}

impl AudioFormat {
    /// PCM sample rates the TTS service can produce.
    pub const PCM_RATES: [u32; 4] = [16_000, 22_050, 24_000, 44_100];

    /// MP3 bitrate in bytes per millisecond (128 kbps).
    pub(crate) const MP3_BYTES_PER_MS: u64 = 16;

    /// The `output_format` query value understood by ElevenLabs.
    pub fn tts_output_format(&self) -> String {
        match self {
            AudioFormat::Mp3 => "mp3_44100_128".to_string(),
            AudioFormat::Wav { sample_rate } => format!("pcm_{sample_rate}"),
        }
    }

    /// File extension for the assembled output and persisted clips.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav { .. } => "wav",
        }
    }

    /// Playback length of `len` bytes of raw clip data.
    pub fn duration_ms(&self, len: usize) -> u64 {
        match self {
            AudioFormat::Mp3 => len as u64 / Self::MP3_BYTES_PER_MS,
            AudioFormat::Wav { sample_rate } => (len as u64 / 2) * 1000 / *sample_rate as u64,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioFormat::Mp3 => f.write_str("mp3"),
            AudioFormat::Wav { sample_rate } => write!(f, "wav ({sample_rate} Hz)"),
        }
    }
}

/// Case-insensitive speaker label vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerLabels {
    labels: Vec<(String, SpeakerRole)>,
}

impl Default for SpeakerLabels {
    fn default() -> Self {
        Self {
            labels: SpeakerRole::ALL
                .iter()
                .map(|&role| (role.label().to_lowercase(), role))
                .collect(),
        }
    }
}

impl SpeakerLabels {
    /// A vocabulary with no labels at all.
    pub fn empty() -> Self {
        Self { labels: Vec::new() }
    }

    /// Build from explicit pairs, e.g. `[("Alex", Host), ("Jamie", Guest)]`.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, SpeakerRole)>,
        S: AsRef<str>,
    {
        let mut labels = Self::empty();
        for (label, role) in pairs {
            labels.insert(label.as_ref(), role);
        }
        labels
    }

    /// Add a label. The first mapping of a label wins.
    pub fn insert(&mut self, label: &str, role: SpeakerRole) {
        let key = label.trim().to_lowercase();
        if key.is_empty() || self.labels.iter().any(|(l, _)| *l == key) {
            return;
        }
        self.labels.push((key, role));
    }

    /// Look up a label, ignoring case and surrounding whitespace.
    pub fn resolve(&self, label: &str) -> Option<SpeakerRole> {
        let key = label.trim().to_lowercase();
        self.labels
            .iter()
            .find(|(l, _)| *l == key)
            .map(|(_, role)| *role)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let config = PodcastConfig::builder().build().expect("defaults are valid");
        assert_eq!(config.max_segment_chars, 6000);
        assert_eq!(config.requests_per_minute, Some(15));
        assert_eq!(config.audio_format, AudioFormat::Mp3);
    }

    #[test]
    fn rejects_tiny_segment_budget() {
        let err = PodcastConfig::builder().max_segment_chars(10).build().unwrap_err();
        assert!(matches!(err, Pdf2PodError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_sub_second_duration_cap() {
        assert!(PodcastConfig::builder().max_duration_ms(999).build().is_err());
        assert!(PodcastConfig::builder().max_duration_ms(1000).build().is_ok());
    }

    #[test]
    fn rejects_unknown_pcm_rate() {
        let err = PodcastConfig::builder()
            .audio_format(AudioFormat::Wav { sample_rate: 8000 })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("8000"));
    }

    #[test]
    fn rejects_empty_voice() {
        let mut voices = VoiceMap::empty();
        voices.set(SpeakerRole::Host, "Eric");
        let err = PodcastConfig::builder().voices(voices).build().unwrap_err();
        assert!(err.to_string().contains("GUEST"), "got: {err}");
    }

    #[test]
    fn voice_names_resolve_to_ids() {
        let voices = VoiceMap::default();
        assert_eq!(voices.get(SpeakerRole::Host), Some("cjVigY5qzO86Huf0OWal"));
        assert_eq!(voices.get(SpeakerRole::Guest), Some("nPczCjzI2devNBz1zQrb"));

        let mut custom = VoiceMap::empty();
        custom.set(SpeakerRole::Host, "my-cloned-voice");
        assert_eq!(custom.get(SpeakerRole::Host), Some("my-cloned-voice"));
    }

    #[test]
    fn role_labels_parse_back_to_their_role() {
        let labels = SpeakerLabels::default();
        for role in SpeakerRole::ALL {
            assert_eq!(labels.resolve(role.label()), Some(role));
        }
        assert_eq!(SpeakerRole::Guest.label(), "Guest");
    }

    #[test]
    fn persona_names_become_labels() {
        let config = PodcastConfig::builder()
            .host(Persona::new("Alex Morgan", "curious host"))
            .guest(Persona::new("Jamie", "expert"))
            .build()
            .unwrap();
        let labels = config.speaker_labels();
        assert_eq!(labels.resolve("Host"), Some(SpeakerRole::Host));
        assert_eq!(labels.resolve("alex morgan"), Some(SpeakerRole::Host));
        assert_eq!(labels.resolve("ALEX"), Some(SpeakerRole::Host));
        assert_eq!(labels.resolve("Jamie"), Some(SpeakerRole::Guest));
        assert_eq!(labels.resolve("Narrator"), None);
    }

    #[test]
    fn first_label_mapping_wins() {
        let labels = SpeakerLabels::from_pairs([("Sam", SpeakerRole::Host), ("sam", SpeakerRole::Guest)]);
        assert_eq!(labels.resolve("SAM"), Some(SpeakerRole::Host));
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn audio_format_helpers() {
        assert_eq!(AudioFormat::Mp3.tts_output_format(), "mp3_44100_128");
        assert_eq!(
            AudioFormat::Wav { sample_rate: 24_000 }.tts_output_format(),
            "pcm_24000"
        );
        assert_eq!(AudioFormat::Mp3.duration_ms(16_000), 1000);
        assert_eq!(AudioFormat::Wav { sample_rate: 24_000 }.duration_ms(48_000), 1000);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = PodcastConfig::builder()
            .elevenlabs_api_key("sk-secret")
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
