//! Podcast assembly: ordered clips → one audio file.
//!
//! Clips are validated first: indices must cover `0..expected` exactly once.
//! Only then are they sorted and joined, so the result depends on the turn
//! indices alone and never on the order clips were handed over.
//!
//! MP3 clips are joined frame by frame (the TTS service returns headerless
//! MPEG streams at a fixed rate). Silence gaps are made of silent MPEG-1
//! Layer III frames. WAV output decodes every clip as 16-bit mono PCM,
//! inserts zero samples for gaps, and writes one container via `hound`.

use crate::config::{AudioFormat, PodcastConfig};
use crate::error::Pdf2PodError;
use crate::output::{AudioClip, Podcast};
use std::io::Cursor;
use tracing::{debug, info};

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, mono, no padding.
const SILENT_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC0];
const MP3_FRAME_BYTES: usize = 417;
const MP3_SAMPLES_PER_FRAME: u64 = 1152;
const MP3_SAMPLE_RATE: u64 = 44_100;

/// `ms` of silence in `format`'s raw clip encoding.
pub fn silence(format: AudioFormat, ms: u64) -> Vec<u8> {
    match format {
        AudioFormat::Mp3 => {
            let frames = (ms * MP3_SAMPLE_RATE).div_ceil(MP3_SAMPLES_PER_FRAME * 1000) as usize;
            let mut out = Vec::with_capacity(frames * MP3_FRAME_BYTES);
            for _ in 0..frames {
                out.extend_from_slice(&SILENT_FRAME_HEADER);
                out.resize(out.len() + MP3_FRAME_BYTES - SILENT_FRAME_HEADER.len(), 0);
            }
            out
        }
        AudioFormat::Wav { sample_rate } => {
            let samples = (ms * sample_rate as u64 / 1000) as usize;
            vec![0; samples * 2]
        }
    }
}

/// Check that `clips` hold exactly one clip per index in `0..expected`.
pub fn validate_clips(clips: &[AudioClip], expected: usize) -> Result<(), Pdf2PodError> {
    if clips.is_empty() || expected == 0 {
        return Err(Pdf2PodError::NoClips);
    }
    let mut seen = vec![false; expected];
    for clip in clips {
        let index = clip.turn_index;
        match seen.get_mut(index) {
            None => return Err(Pdf2PodError::UnexpectedClip { index, expected }),
            Some(true) => return Err(Pdf2PodError::DuplicateClip { index }),
            Some(flag) => *flag = true,
        }
    }
    if let Some(index) = seen.iter().position(|s| !s) {
        return Err(Pdf2PodError::MissingClip { index, expected });
    }
    Ok(())
}

/// Join the clips of a run into the final podcast.
///
/// `expected` is the number of turns in the script. With
/// `max_duration_ms` set, clips starting at or past the cap are dropped and
/// the joined audio is cut at the last MP3 frame (or PCM sample) that
/// starts at or before the cap.
pub fn assemble(
    mut clips: Vec<AudioClip>,
    expected: usize,
    config: &PodcastConfig,
) -> Result<Podcast, Pdf2PodError> {
    validate_clips(&clips, expected)?;
    clips.sort_by_key(|c| c.turn_index);

    let silence_ms = config.silence_ms;
    let mut kept = 0;
    let mut start_ms = 0u64;
    for clip in &clips {
        if let Some(cap) = config.max_duration_ms {
            if kept > 0 && start_ms >= cap {
                break;
            }
        }
        start_ms += clip.duration_ms() + silence_ms;
        kept += 1;
    }
    let dropped_clips = clips.len() - kept;
    clips.truncate(kept);
    if dropped_clips > 0 {
        info!(
            "Duration cap reached: dropped {} trailing clip(s)",
            dropped_clips
        );
    }

    let format = config.audio_format;
    let gap = silence(format, silence_ms);
    let mut raw = join_raw(&clips, &gap);
    let mut truncated = false;
    if let Some(cap) = config.max_duration_ms {
        let cut = cut_point(format, &raw, cap);
        if cut < raw.len() {
            info!("Duration cap reached: cutting audio at {} ms", format.duration_ms(cut));
            raw.truncate(cut);
            truncated = true;
        }
    }

    let duration_ms = format.duration_ms(raw.len());
    let audio = match format {
        AudioFormat::Mp3 => raw,
        AudioFormat::Wav { sample_rate } => write_wav(&raw, sample_rate)?,
    };
    debug!(
        "Assembled {} clips into {} bytes ({} ms)",
        clips.len(),
        audio.len(),
        duration_ms
    );

    Ok(Podcast {
        format,
        clip_order: clips.iter().map(|c| c.turn_index).collect(),
        dropped_clips,
        truncated,
        duration_ms,
        audio,
    })
}

fn join_len(clips: &[AudioClip], gap: usize) -> usize {
    clips.iter().map(AudioClip::len).sum::<usize>() + gap * clips.len().saturating_sub(1)
}

fn join_raw(clips: &[AudioClip], gap: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(join_len(clips, gap.len()));
    for (i, clip) in clips.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(gap);
        }
        out.extend_from_slice(&clip.data);
    }
    out
}

/// Byte offset at which `raw` must be cut to last at most `cap_ms`.
///
/// MP3 is cut at a frame sync so the stream stays decodable. Without any
/// sync before the limit the cut falls on the byte limit itself.
fn cut_point(format: AudioFormat, raw: &[u8], cap_ms: u64) -> usize {
    match format {
        AudioFormat::Mp3 => {
            let limit = (cap_ms * AudioFormat::MP3_BYTES_PER_MS) as usize;
            if raw.len() <= limit {
                return raw.len();
            }
            (1..=limit)
                .rev()
                .find(|&i| raw[i] == 0xFF && raw.get(i + 1).is_some_and(|b| b & 0xE0 == 0xE0))
                .unwrap_or(limit)
        }
        AudioFormat::Wav { sample_rate } => {
            let samples = (cap_ms * sample_rate as u64 / 1000) as usize;
            raw.len().min(samples * 2)
        }
    }
}

/// Wrap little-endian 16-bit mono PCM in a WAV container.
pub(crate) fn write_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, Pdf2PodError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_err = |e: hound::Error| Pdf2PodError::Internal(format!("WAV encoding failed: {e}"));

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 64));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_err)?;
        for pair in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;
    }
    Ok(cursor.into_inner())
}
