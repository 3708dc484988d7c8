//! Offline rendering command.

use crate::wav::{WavSpec, interleave, write_wav};
use anyhow::Context;
use clap::Args;
use kether_config::{ParamValue, PatchConfig, find_patch};
use kether_core::linear_to_db;
use kether_synth::{Command, Engine};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Patch file or factory patch name
    #[arg(short, long)]
    patch: Option<String>,

    /// Parameter override, e.g. --set filter_cutoff=800 --set scale=celtic
    #[arg(long = "set", value_name = "ID=VALUE")]
    overrides: Vec<String>,

    /// Note numbers (comma-separated, e.g., "48,52,55")
    #[arg(long, default_value = "48,52,55")]
    notes: String,

    /// Note-on velocity
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(1..=127))]
    velocity: u8,

    /// Seconds the notes are held
    #[arg(long, default_value = "2.0")]
    hold: f32,

    /// Total duration in seconds, including the release tail
    #[arg(long, default_value = "4.0")]
    duration: f32,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Frames per engine block
    #[arg(long, default_value = "256")]
    block_size: usize,

    /// Output channels (1 or 2)
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u16).range(1..=2))]
    channels: u16,

    /// Bits per sample (16, 24, or 32 for float)
    #[arg(long, default_value = "32")]
    bits: u16,
}

fn parse_notes(notes: &str) -> anyhow::Result<Vec<u8>> {
    let parsed = notes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .ok()
                .filter(|&n| n <= 127)
                .ok_or_else(|| anyhow::anyhow!("invalid note '{s}' (expected 0-127)"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if parsed.is_empty() {
        anyhow::bail!("No notes provided. Use format: --notes \"48,52,55\"");
    }
    Ok(parsed)
}

fn overrides_patch(overrides: &[String]) -> anyhow::Result<PatchConfig> {
    let mut patch = PatchConfig::new("overrides");
    for entry in overrides {
        let (id, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid override '{entry}' (expected ID=VALUE)"))?;
        patch = patch.with_param(id.trim(), ParamValue::parse(value));
    }
    Ok(patch)
}

fn peak_dbfs(samples: &[f32]) -> f32 {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        linear_to_db(peak)
    } else {
        f32::NEG_INFINITY
    }
}

/// Render `notes` held for `hold_frames`, then released, for `total_frames`.
///
/// Returns one buffer per channel.
pub fn render_notes(
    engine: &mut Engine,
    notes: &[u8],
    velocity: u8,
    hold_frames: usize,
    total_frames: usize,
    channels: usize,
) -> Vec<Vec<f32>> {
    let block_size = engine.block_size();
    let mut scratch = vec![vec![0.0f32; block_size]; channels];
    let mut rendered = vec![Vec::with_capacity(total_frames); channels];

    let mut pending: Vec<Command> = notes
        .iter()
        .map(|&note| Command::NoteOn { note, velocity })
        .collect();
    let mut released = false;
    let mut frame = 0;

    while frame < total_frames {
        if !released && frame >= hold_frames {
            pending.extend(notes.iter().map(|&note| Command::NoteOff { note }));
            released = true;
        }

        let n = block_size.min(total_frames - frame);
        let mut outputs: Vec<&mut [f32]> = scratch.iter_mut().map(|ch| &mut ch[..n]).collect();
        engine.process_block_with(&pending, &mut outputs);
        pending.clear();

        for (dst, src) in rendered.iter_mut().zip(&scratch) {
            dst.extend_from_slice(&src[..n]);
        }
        frame += n;
    }

    rendered
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let notes = parse_notes(&args.notes)?;
    if args.duration <= 0.0 || args.hold < 0.0 {
        anyhow::bail!("duration must be positive and hold non-negative");
    }

    let mut engine = Engine::new(args.sample_rate as f32, args.block_size)?;

    if let Some(name) = &args.patch {
        let patch = find_patch(name).with_context(|| format!("loading patch '{name}'"))?;
        patch.apply_to(&mut engine)?;
        println!(
            "Patch: {}",
            patch.name.as_deref().unwrap_or(name.as_str())
        );
    }
    if !args.overrides.is_empty() {
        overrides_patch(&args.overrides)?.apply_to(&mut engine)?;
    }

    let sr = args.sample_rate as f32;
    let total_frames = (args.duration * sr) as usize;
    let hold_frames = (args.hold * sr) as usize;

    println!("Rendering...");
    println!("  Notes: {:?} ({})", notes, engine.scale().name());
    println!(
        "  Hold: {:.2}s, total: {:.2}s at {} Hz",
        args.hold, args.duration, args.sample_rate
    );

    let channels = render_notes(
        &mut engine,
        &notes,
        args.velocity,
        hold_frames,
        total_frames,
        usize::from(args.channels),
    );
    let samples = interleave(&channels);

    let spec = WavSpec {
        channels: args.channels,
        sample_rate: args.sample_rate,
        bits_per_sample: args.bits,
    };
    write_wav(&args.output, &samples, spec)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let peak = peak_dbfs(&samples);
    tracing::info!(peak_dbfs = peak, frames = total_frames, "render finished");
    if peak > 0.0 {
        tracing::warn!(peak_dbfs = peak, "output clips");
    }
    println!("Wrote {} frames to {}", total_frames, args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kether_synth::SynthParam;

    #[test]
    fn test_parse_notes() {
        assert_eq!(parse_notes("48, 52,55").unwrap(), vec![48, 52, 55]);
        assert_eq!(parse_notes("60,").unwrap(), vec![60]);
        assert!(parse_notes("").is_err());
        assert!(parse_notes("128").is_err());
        assert!(parse_notes("C4").is_err());
    }

    #[test]
    fn test_overrides_patch() {
        let patch = overrides_patch(&["scale=celtic".into(), "gain = 0.7".into()]).unwrap();
        let mut engine = Engine::new(48000.0, 64).unwrap();
        patch.apply_to(&mut engine).unwrap();
        assert_eq!(engine.param(SynthParam::Scale), 2.0);
        assert_eq!(engine.gain(), 0.7);

        assert!(overrides_patch(&["gain".into()]).is_err());
    }

    #[test]
    fn test_peak_dbfs() {
        assert_eq!(peak_dbfs(&[0.0, 1.0, -0.5]), 0.0);
        assert!((peak_dbfs(&[0.5]) + 6.0206).abs() < 1e-3);
        assert_eq!(peak_dbfs(&[0.0; 4]), f32::NEG_INFINITY);
    }

    #[test]
    fn test_render_notes_lengths_and_release() {
        let mut engine = Engine::new(48000.0, 100).unwrap();
        engine.set_release_ms(10.0);

        let out = render_notes(&mut engine, &[48, 55], 100, 1000, 48000, 2);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|ch| ch.len() == 48000));
        assert!(out[0][..1000].iter().any(|s| s.abs() > 1e-4));
        assert_eq!(engine.active_voice_count(), 0);
    }

    #[test]
    fn test_render_partial_last_block() {
        let mut engine = Engine::new(44100.0, 256).unwrap();
        let out = render_notes(&mut engine, &[60], 90, 300, 1000, 1);
        assert_eq!(out[0].len(), 1000);
    }
}
