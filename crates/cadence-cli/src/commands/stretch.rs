//! Single-file speed change.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cadence_core::{
    GraphBuilder, KeyFrameSampler, MAX_STRETCH_PERCENT, MIN_STRETCH_PERCENT, ResampleNode, SoundSource, SourceNode,
    SpeedNode, TimeStretchNode, speed_from_percent,
};
use cadence_io::{WavSource, write_wav};
use clap::Args;

use super::common::{check_bit_depth, print_stats, render_windows, window_frames};

/// Change the speed of one WAV file.
#[derive(Args)]
pub struct StretchArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Playback speed in percent (100 = unchanged)
    #[arg(short, long)]
    speed: f32,

    /// Keep the pitch (WSOLA time stretch instead of resampling)
    #[arg(long)]
    keep_pitch: bool,

    /// Render window in milliseconds
    #[arg(long, default_value = "100")]
    window: u32,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "24")]
    bit_depth: u16,
}

/// Run the stretch command.
pub fn run(args: StretchArgs) -> anyhow::Result<()> {
    check_bit_depth(args.bit_depth)?;
    if !(args.speed.is_finite() && args.speed > 0.0) {
        anyhow::bail!("--speed must be a positive percentage");
    }

    println!("Reading {}...", args.input.display());
    let wav = WavSource::open(&args.input).with_context(|| format!("cannot open {}", args.input.display()))?;
    let rate = wav.sample_rate();
    let source_duration = wav.duration();
    let source: Arc<dyn SoundSource> = Arc::new(wav);

    let builder = GraphBuilder::new(SourceNode::new(source)).then(ResampleNode::new(rate).with_source_rate(rate));
    let (ratio, mut graph) = if args.keep_pitch {
        let speed = args.speed.clamp(MIN_STRETCH_PERCENT, MAX_STRETCH_PERCENT);
        (f64::from(speed) / 100.0, builder.then(TimeStretchNode::new(speed)).build())
    } else {
        (speed_from_percent(args.speed), builder.then(SpeedNode::new(args.speed)).build())
    };
    tracing::debug!("stretch graph:\n{}", graph.describe());

    let total = (source_duration.to_frames_f64(rate) / ratio).round() as usize;
    if total == 0 {
        anyhow::bail!("{} is empty", args.input.display());
    }
    let window = window_frames(args.window, rate);

    println!(
        "Playing at {:.1}%{}, {:.3}s -> {:.3}s...",
        ratio * 100.0,
        if args.keep_pitch { " (pitch kept)" } else { "" },
        source_duration.as_secs_f64(),
        total as f64 / f64::from(rate)
    );
    let sampler = KeyFrameSampler;
    let output = render_windows(0, total, window, rate, |range| graph.render(range, rate, &sampler))?;
    graph.dispose();

    println!("\nStats:");
    print_stats("Output", &output);

    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, args.bit_depth)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!("Done!");

    Ok(())
}
