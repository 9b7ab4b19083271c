//! End-to-end tests for pdf2pod.
//!
//! These tests use real PDF files in `./test_cases/` and make live LLM and
//! TTS API calls. They are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... ELEVENLABS_API_KEY=... \
//!     cargo test --test e2e -- --nocapture

use pdf2pod::{convert_to_file, generate_script, inspect, PodcastConfig, SpeakerRole};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// A short run: small segments, few tokens, so a live test stays cheap.
fn cheap_config() -> PodcastConfig {
    let mut builder = PodcastConfig::builder()
        .max_segment_chars(2000)
        .max_script_chars(2000)
        .max_duration_ms(60_000)
        .silence_ms(250);
    if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
        builder = builder.elevenlabs_api_key(key);
    }
    builder.build().expect("valid config")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_metadata() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let meta = inspect(pdf.to_string_lossy(), &PodcastConfig::default())
        .await
        .expect("inspect");
    assert!(meta.page_count > 0);
    assert!(!meta.pdf_version.is_empty());
}

#[tokio::test]
async fn test_generate_script_live() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let config = cheap_config();

    let output = generate_script(pdf.to_string_lossy(), &config)
        .await
        .expect("script generation");

    let turns = output.script.turns();
    assert!(!turns.is_empty(), "script has no turns");
    assert!(turns.iter().enumerate().all(|(i, t)| t.index == i));
    assert!(turns.iter().any(|t| t.speaker == SpeakerRole::Host));
    assert!(turns.iter().any(|t| t.speaker == SpeakerRole::Guest));

    std::fs::write(output_dir().join("sample.script.txt"), output.script.to_text()).ok();
    println!(
        "{} turns, {} unrecognised lines, {} tokens in",
        turns.len(),
        output.script.unrecognized.len(),
        output.stats.total_input_tokens
    );
}

#[tokio::test]
async fn test_convert_to_mp3_live() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    if std::env::var("ELEVENLABS_API_KEY").is_err() {
        println!("SKIP: ELEVENLABS_API_KEY not set");
        return;
    }
    let config = cheap_config();
    let out = output_dir().join("sample.mp3");

    let stats = convert_to_file(pdf.to_string_lossy(), &out, &config)
        .await
        .expect("conversion");

    let bytes = std::fs::read(&out).expect("output written");
    assert_eq!(bytes.len(), stats.audio_bytes);
    assert!(bytes.starts_with(b"ID3") || bytes[0] == 0xFF);
    println!(
        "{} turns, {} ms of audio, {} ms wall time",
        stats.turns, stats.duration_ms, stats.total_duration_ms
    );
}
