//! Pipeline integration tests with fake collaborators.
//!
//! No network and no pdfium: text enters through `convert_text`, the
//! language model and the TTS service are in-process fakes injected via
//! the config builder.

use async_trait::async_trait;
use pdf2pod::{
    convert_text, AudioFormat, Persona, Pdf2PodError, PodcastConfig, PodcastProgressCallback,
    ScriptCompletion, ScriptModel, ScriptRequest, ServiceError, SpeakerRole, SpeechEngine, Stage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Answers call `n` with `blocks[n]` (the last block repeats).
struct ScriptedModel {
    blocks: Vec<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<ScriptRequest>>,
}

impl ScriptedModel {
    fn new(blocks: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            blocks: blocks.iter().map(|b| b.to_string()).collect(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptModel for ScriptedModel {
    async fn complete(&self, request: &ScriptRequest) -> Result<ScriptCompletion, ServiceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.clone());
        let text = self.blocks[n.min(self.blocks.len() - 1)].clone();
        Ok(ScriptCompletion {
            text,
            input_tokens: 100,
            output_tokens: 40,
        })
    }
}

/// Returns `FF FB` followed by the voice id and text, so tests can see which
/// clip ended up where. Shorter texts take longer, so clips finish out of
/// order. Fails every attempt for texts in `fail_on`.
struct EchoEngine {
    fail_on: Vec<String>,
    calls: AtomicUsize,
}

impl EchoEngine {
    fn new() -> Arc<Self> {
        Self::failing(&[])
    }

    fn failing(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fail_on: texts.iter().map(|t| t.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

fn echo_bytes(voice_id: &str, text: &str) -> Vec<u8> {
    let mut data = vec![0xFF, 0xFB];
    data.extend_from_slice(voice_id.as_bytes());
    data.push(b':');
    data.extend_from_slice(text.as_bytes());
    data
}

#[async_trait]
impl SpeechEngine for EchoEngine {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        format: AudioFormat,
    ) -> Result<Vec<u8>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = 60u64.saturating_sub(text.len() as u64);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        if self.fail_on.iter().any(|t| t == text) {
            return Err(ServiceError::Api("HTTP 500 Internal Server Error".into()));
        }
        match format {
            AudioFormat::Mp3 => Ok(echo_bytes(voice_id, text)),
            AudioFormat::Wav { .. } => Ok(vec![1u8; text.len() * 2]),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const BEES: &str = "Honey bees communicate through dance. The waggle dance encodes the \
direction and distance of food. Foragers that follow the dance find the same flowers.";

const DIALOGUE: &str = "Host: Today we talk about bees.\n\
Guest: They dance to share directions.\n\
Host: Wow, really?\n\
Guest: Yes, the waggle dance points to the food.\n\
Host: That's fascinating!";

fn pages(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

fn base_config(
    model: Arc<dyn ScriptModel>,
    engine: Arc<dyn SpeechEngine>,
) -> pdf2pod::PodcastConfigBuilder {
    PodcastConfig::builder()
        .script_model(model)
        .speech_engine(engine)
        .requests_per_minute(None)
        .retry_backoff_ms(1)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_becomes_ordered_podcast() {
    let model = ScriptedModel::new(&[DIALOGUE]);
    let engine = EchoEngine::new();
    let config = base_config(model.clone(), engine.clone()).build().unwrap();

    let output = convert_text(&pages(&[BEES]), &config).await.unwrap();

    let turns = output.script.turns();
    assert_eq!(turns.len(), 5);
    assert!(turns.iter().enumerate().all(|(i, t)| t.index == i));
    assert_eq!(turns[1].speaker, SpeakerRole::Guest);
    assert_eq!(output.podcast.clip_order, vec![0, 1, 2, 3, 4]);

    // The podcast is the clips in turn order, whatever order they finished in.
    let mut expected = Vec::new();
    for turn in turns {
        let voice = config.voices.get(turn.speaker).unwrap();
        expected.extend(echo_bytes(voice, &turn.text));
    }
    assert_eq!(output.podcast.audio, expected);

    assert_eq!(model.calls(), 1);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 5);
    assert_eq!(output.stats.turns, 5);
    assert_eq!(output.stats.generation_calls, 1);
    assert_eq!(output.stats.total_input_tokens, 100);
    assert_eq!(output.stats.audio_bytes, output.podcast.audio.len());
}

#[tokio::test]
async fn blank_document_never_reaches_the_model() {
    let model = ScriptedModel::new(&[DIALOGUE]);
    let engine = EchoEngine::new();
    let config = base_config(model.clone(), engine.clone()).build().unwrap();

    let err = convert_text(&pages(&["", "   \n\t"]), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Pdf2PodError::NothingToConvert { .. }));
    assert_eq!(err.stage(), Stage::Extraction);
    assert_eq!(model.calls(), 0);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn synthesis_failure_aborts_with_turn_index() {
    let model = ScriptedModel::new(&[DIALOGUE]);
    let engine = EchoEngine::failing(&["Wow, really?"]);
    let config = base_config(model, engine).build().unwrap();

    let err = convert_text(&pages(&[BEES]), &config).await.unwrap_err();

    assert_eq!(err.stage(), Stage::Synthesis);
    assert_eq!(err.turn(), Some(2));
    assert!(err.to_string().contains("turn 2"), "got: {err}");
    assert!(err.to_string().contains("3 attempt"), "got: {err}");
}

#[tokio::test]
async fn prose_from_the_model_is_a_parse_error() {
    let model = ScriptedModel::new(&["Sure! Here is an overview of honey bee behaviour."]);
    let engine = EchoEngine::new();
    let config = base_config(model, engine.clone()).build().unwrap();

    let err = convert_text(&pages(&[BEES]), &config).await.unwrap_err();

    assert_eq!(err.stage(), Stage::Parse);
    assert_eq!(err.segment(), Some(0));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn turn_indices_run_across_segments() {
    let model = ScriptedModel::new(&[
        "Host: Part one begins.\nGuest: Indeed it does.",
        "Host: Part two now.\nGuest: And more.\nHost: Wrapping up.",
    ]);
    let engine = EchoEngine::new();
    let config = base_config(model.clone(), engine)
        .max_segment_chars(200)
        .build()
        .unwrap();

    // Two sentences that cannot share a 200-char segment.
    let long_a = format!("{}.", "Alpha words go here ".repeat(8).trim_end());
    let long_b = format!("{}.", "Beta words go here ".repeat(8).trim_end());
    let text = format!("{long_a} {long_b}");
    let output = convert_text(&pages(&[&text]), &config).await.unwrap();

    assert_eq!(model.calls(), 2);
    let indices: Vec<usize> = output.script.turns().iter().map(|t| t.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(output.podcast.clip_order, indices);

    // The second prompt carries the first block as context.
    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[1]
        .context
        .as_deref()
        .unwrap()
        .contains("Guest: Indeed it does."));
}

#[tokio::test]
async fn persona_names_are_speaker_labels() {
    let model = ScriptedModel::new(&["Alex: Welcome!\nJamie: Glad to be here.\nNarrator: (music)"]);
    let engine = EchoEngine::new();
    let config = base_config(model, engine)
        .host(Persona::new("Alex", "a curious host"))
        .guest(Persona::new("Jamie", "a bee expert"))
        .build()
        .unwrap();

    let output = convert_text(&pages(&[BEES]), &config).await.unwrap();

    let speakers: Vec<SpeakerRole> = output.script.turns().iter().map(|t| t.speaker).collect();
    assert_eq!(speakers, vec![SpeakerRole::Host, SpeakerRole::Guest]);
    assert_eq!(output.script.unrecognized.len(), 1);
    assert_eq!(output.stats.unrecognized_lines, 1);
}

#[tokio::test]
async fn wav_output_with_silence() {
    let model = ScriptedModel::new(&["Host: Hi.\nGuest: Hello."]);
    let engine = EchoEngine::new();
    let config = base_config(model, engine)
        .audio_format(AudioFormat::Wav { sample_rate: 16_000 })
        .silence_ms(100)
        .build()
        .unwrap();

    let output = convert_text(&pages(&[BEES]), &config).await.unwrap();

    let reader = hound::WavReader::new(std::io::Cursor::new(output.podcast.audio)).unwrap();
    // "Hi." and "Hello." → 3 + 6 samples, plus 1600 samples of silence.
    assert_eq!(reader.len(), 3 + 1600 + 6);
    assert_eq!(reader.spec().sample_rate, 16_000);
}

#[tokio::test]
async fn missing_tts_key_is_a_configuration_error() {
    let model = ScriptedModel::new(&[DIALOGUE]);
    let config = PodcastConfig::builder()
        .script_model(model.clone())
        .requests_per_minute(None)
        .build()
        .unwrap();

    let err = convert_text(&pages(&[BEES]), &config).await.unwrap_err();

    assert_eq!(err.stage(), Stage::Configuration);
    assert!(err.to_string().contains("ELEVENLABS_API_KEY"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn progress_events_cover_every_turn() {
    #[derive(Default)]
    struct Counter {
        segments: AtomicUsize,
        turns: AtomicUsize,
        completed: AtomicUsize,
    }

    impl PodcastProgressCallback for Counter {
        fn on_segment_complete(&self, _segment: usize, _total: usize, _turns: usize) {
            self.segments.fetch_add(1, Ordering::SeqCst);
        }

        fn on_turn_complete(&self, _turn: usize, _total: usize, _bytes: usize) {
            self.turns.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _turns: usize, _duration_ms: u64) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counter = Arc::new(Counter::default());
    let config = base_config(ScriptedModel::new(&[DIALOGUE]), EchoEngine::new())
        .progress_callback(counter.clone())
        .build()
        .unwrap();

    convert_text(&pages(&[BEES]), &config).await.unwrap();

    assert_eq!(counter.segments.load(Ordering::SeqCst), 1);
    assert_eq!(counter.turns.load(Ordering::SeqCst), 5);
    assert_eq!(counter.completed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn markdown_emphasis_is_tolerated() {
    let model = ScriptedModel::new(&["**Host:** *Welcome* back.\n**Guest:** Thanks!"]);
    let config = base_config(model, EchoEngine::new()).build().unwrap();

    let output = convert_text(&pages(&[BEES]), &config).await.unwrap();

    let texts: Vec<&str> = output.script.turns().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["Welcome back.", "Thanks!"]);
}
