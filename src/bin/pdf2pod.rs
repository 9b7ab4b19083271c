//! CLI binary for pdf2pod.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PodcastConfig` and reports results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2pod::{
    convert, generate_script, inspect, voices, write_atomic, AudioFormat, Persona, PodcastConfig,
    PodcastProgressCallback, ProgressCallback, ScriptMode, SpeakerRole,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar, reused for both phases: segments while scripting, turns while
/// voicing. Turn events arrive out of order from the worker pool.
struct CliProgressCallback {
    bar: ProgressBar,
    failed_turns: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed_turns: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, prefix: &'static str, unit: &str, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}"
        );
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_style(style);
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }
}

impl PodcastProgressCallback for CliProgressCallback {
    fn on_script_start(&self, segments: usize) {
        self.activate_bar("Scripting", "segments", segments);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Writing the script from {segments} segment(s)…"))
        ));
    }

    fn on_segment_start(&self, segment: usize, total: usize) {
        self.bar
            .set_message(format!("segment {}/{}", segment + 1, total));
    }

    fn on_segment_complete(&self, segment: usize, total: usize, turns: usize) {
        self.bar.println(format!(
            "  {} Segment {:>3}/{:<3}  {}",
            green("✓"),
            segment + 1,
            total,
            dim(&format!("{turns:>3} turns")),
        ));
        self.bar.inc(1);
    }

    fn on_synthesis_start(&self, turns: usize) {
        self.activate_bar("Voicing", "turns", turns);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Voicing {turns} turns…"))
        ));
    }

    fn on_turn_complete(&self, _turn: usize, _total: usize, _bytes: usize) {
        self.bar.inc(1);
    }

    fn on_turn_error(&self, turn: usize, total: usize, error: &str) {
        self.failed_turns.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Turn {:>3}/{:<3}  {}",
            red("✗"),
            turn + 1,
            total,
            red(&msg),
        ));
    }

    fn on_conversion_complete(&self, turns: usize, duration_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} turns voiced, {}",
            green("✔"),
            bold(&turns.to_string()),
            format_duration(duration_ms)
        );
    }
}

impl CliProgressCallback {
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes podcast.mp3)
  pdf2pod paper.pdf

  # Choose the output file and add a short pause between speakers
  pdf2pod paper.pdf -o paper.mp3 --silence-ms 300

  # Uncompressed output
  pdf2pod paper.pdf --format wav --sample-rate 24000 -o paper.wav

  # Only write the script (no TTS key needed)
  pdf2pod --script-only paper.pdf > script.txt

  # Your own cast
  pdf2pod paper.pdf --host-name "Alex" --host-description "a curious science journalist" \
      --guest-name "Jamie" --guest-description "the paper's first author" \
      --host-voice Sarah --guest-voice George

  # Convert from URL
  pdf2pod https://arxiv.org/pdf/1706.03762 -o attention.mp3

  # Inspect PDF metadata (no API key needed)
  pdf2pod --inspect-only paper.pdf

  # List premade voices
  pdf2pod --list-voices

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default script model)
  OPENAI_API_KEY          OpenAI API key (with --provider openai)
  ANTHROPIC_API_KEY       Anthropic API key (with --provider anthropic)
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  ELEVENLABS_API_KEY      ElevenLabs API key (ELEVEN_LABS_KEY also accepted)
  PDFIUM_LIB_PATH         Path to libpdfium if it is not installed system-wide
"#;

/// Turn PDF documents into two-speaker audio podcasts.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2pod",
    version,
    about = "Turn PDF documents into two-speaker audio podcasts",
    long_about = "Turn a PDF (local file or URL) into a podcast: a language model writes a \
conversation between a host and a guest about the document, ElevenLabs voices every line, \
and the clips are joined into one MP3 or WAV file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "list_voices")]
    input: Option<String>,

    /// Output file. Default: podcast.<format>; with --script-only, stdout.
    #[arg(short, long, env = "PDF2POD_OUTPUT")]
    output: Option<PathBuf>,

    /// Audio format.
    #[arg(long, env = "PDF2POD_FORMAT", value_enum, default_value = "mp3")]
    format: FormatArg,

    /// Sample rate for WAV output: 16000, 22050, 24000 or 44100.
    #[arg(long, env = "PDF2POD_SAMPLE_RATE", default_value_t = 24_000)]
    sample_rate: u32,

    /// Silence between speaker turns, in milliseconds.
    #[arg(long, env = "PDF2POD_SILENCE_MS", default_value_t = 0)]
    silence_ms: u64,

    /// Stop adding turns once the podcast reaches this many seconds.
    #[arg(long, env = "PDF2POD_MAX_DURATION")]
    max_duration: Option<u64>,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// ElevenLabs API key.
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    elevenlabs_api_key: Option<String>,

    /// ElevenLabs model id.
    #[arg(long, env = "PDF2POD_TTS_MODEL", default_value = "eleven_monolingual_v1")]
    tts_model: String,

    /// Host name, used in the prompt and accepted as a speaker label.
    #[arg(long, env = "PDF2POD_HOST_NAME")]
    host_name: Option<String>,

    /// Host description for the prompt.
    #[arg(long, env = "PDF2POD_HOST_DESCRIPTION")]
    host_description: Option<String>,

    /// Guest name, used in the prompt and accepted as a speaker label.
    #[arg(long, env = "PDF2POD_GUEST_NAME")]
    guest_name: Option<String>,

    /// Guest description for the prompt.
    #[arg(long, env = "PDF2POD_GUEST_DESCRIPTION")]
    guest_description: Option<String>,

    /// Host voice: premade name (see --list-voices) or voice id.
    #[arg(long, env = "PDF2POD_HOST_VOICE", default_value = "Eric")]
    host_voice: String,

    /// Guest voice: premade name (see --list-voices) or voice id.
    #[arg(long, env = "PDF2POD_GUEST_VOICE", default_value = "Brian")]
    guest_voice: String,

    /// How segments become prompts.
    #[arg(long, env = "PDF2POD_SCRIPT_MODE", value_enum, default_value = "incremental")]
    script_mode: ScriptModeArg,

    /// Maximum characters of source text per prompt.
    #[arg(long, env = "PDF2POD_MAX_SEGMENT_CHARS", default_value_t = 6000)]
    max_segment_chars: usize,

    /// Cut each generated script block to this many characters.
    #[arg(long, env = "PDF2POD_MAX_SCRIPT_CHARS")]
    max_script_chars: Option<usize>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2POD_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens per script block.
    #[arg(long, env = "PDF2POD_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2POD_TEMPERATURE", default_value_t = 1.0)]
    temperature: f32,

    /// LLM requests per minute; 0 disables the limit.
    #[arg(long, env = "PDF2POD_RPM", default_value_t = 15)]
    requests_per_minute: u32,

    /// Concurrent text-to-speech calls.
    #[arg(short, long, env = "PDF2POD_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Retries per API call.
    #[arg(long, env = "PDF2POD_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2POD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Also save every clip to this directory.
    #[arg(long, env = "PDF2POD_CLIPS_DIR")]
    clips_dir: Option<PathBuf>,

    /// Write the script only; no audio is produced.
    #[arg(long)]
    script_only: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print the premade voice catalog and exit.
    #[arg(long)]
    list_voices: bool,

    /// Print structured JSON instead of text summaries.
    #[arg(long, env = "PDF2POD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2POD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs and list unrecognised script lines.
    #[arg(short, long, env = "PDF2POD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2POD_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2POD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-call API timeout in seconds.
    #[arg(long, env = "PDF2POD_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Mp3,
    Wav,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ScriptModeArg {
    Incremental,
    Whole,
}

impl From<ScriptModeArg> for ScriptMode {
    fn from(v: ScriptModeArg) -> Self {
        match v {
            ScriptModeArg::Incremental => ScriptMode::Incremental,
            ScriptModeArg::Whole => ScriptMode::Whole,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose brings them back.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.list_voices {
        for (id, name) in voices::VOICE_CATALOG {
            println!("{name:<10} {id}");
        }
        return Ok(());
    }
    let input = cli.input.clone().context("No input given")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None).await?;
        let meta = inspect(&input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )
    .await?;

    let result = if cli.script_only {
        run_script_only(&cli, &input, &config).await
    } else {
        run_conversion(&cli, &input, &config).await
    };
    if let Some(ref cb) = progress {
        cb.abandon();
    }
    result
}

async fn run_script_only(cli: &Cli, input: &str, config: &PodcastConfig) -> Result<()> {
    let output = generate_script(input, config)
        .await
        .with_context(|| format!("Script generation failed for {input}"))?;

    if cli.verbose {
        for line in &output.script.unrecognized {
            eprintln!(
                "{} segment {} line {}: {}",
                dim("unrecognised"),
                line.segment,
                line.line_no,
                line.text
            );
        }
    }

    let text = if cli.json {
        serde_json::to_string_pretty(&output).context("Failed to serialise script")?
    } else {
        output.script.to_text()
    };

    match cli.output {
        Some(ref path) => {
            write_atomic(path, text.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} turns  →  {}",
                    green("✔"),
                    output.script.len(),
                    bold(&path.display().to_string())
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

async fn run_conversion(cli: &Cli, input: &str, config: &PodcastConfig) -> Result<()> {
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("podcast.{}", config.audio_format.extension())));

    let output = convert(input, config)
        .await
        .with_context(|| format!("Conversion failed for {input}"))?;

    if cli.verbose {
        for line in &output.script.unrecognized {
            eprintln!(
                "{} segment {} line {}: {}",
                dim("unrecognised"),
                line.segment,
                line.line_no,
                line.text
            );
        }
    }

    write_atomic(&output_path, &output.podcast.audio)
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} turns  {}  {}ms  →  {}",
            green("✔"),
            stats.turns,
            format_duration(stats.duration_ms),
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        if output.podcast.truncated {
            eprintln!(
                "   audio cut at --max-duration ({} turn(s) dropped)",
                cyan(&output.podcast.dropped_clips.to_string())
            );
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
    }
    Ok(())
}

/// Map CLI args to `PodcastConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PodcastConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let defaults = PodcastConfig::default();
    let host = persona(&cli.host_name, &cli.host_description, defaults.host);
    let guest = persona(&cli.guest_name, &cli.guest_description, defaults.guest);

    let format = match cli.format {
        FormatArg::Mp3 => AudioFormat::Mp3,
        FormatArg::Wav => AudioFormat::Wav {
            sample_rate: cli.sample_rate,
        },
    };

    let mut builder = PodcastConfig::builder()
        .audio_format(format)
        .silence_ms(cli.silence_ms)
        .host(host)
        .guest(guest)
        .voice(SpeakerRole::Host, &cli.host_voice)
        .voice(SpeakerRole::Guest, &cli.guest_voice)
        .script_mode(cli.script_mode.into())
        .max_segment_chars(cli.max_segment_chars)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .requests_per_minute((cli.requests_per_minute > 0).then_some(cli.requests_per_minute))
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .tts_model_id(cli.tts_model.clone())
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(secs) = cli.max_duration {
        builder = builder.max_duration_ms(secs * 1000);
    }
    if let Some(n) = cli.max_script_chars {
        builder = builder.max_script_chars(n);
    }
    if let Some(key) = cli
        .elevenlabs_api_key
        .clone()
        .or_else(|| std::env::var("ELEVEN_LABS_KEY").ok())
    {
        builder = builder.elevenlabs_api_key(key);
    }
    if let Some(ref dir) = cli.clips_dir {
        builder = builder.clips_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Fields without builder validation
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}

/// A persona from the CLI flags, falling back to the default cast.
fn persona(name: &Option<String>, description: &Option<String>, default: Persona) -> Persona {
    match name {
        Some(name) => Persona::new(
            name.as_str(),
            description
                .clone()
                .unwrap_or_else(|| "a podcast speaker".to_string()),
        ),
        None => match description {
            Some(d) => Persona::new(default.name, d.as_str()),
            None => default,
        },
    }
}
