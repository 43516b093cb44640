//! Project rendering command.

use std::path::PathBuf;

use anyhow::Context;
use cadence_core::{KeyFrameSampler, Time};
use cadence_io::write_wav;
use clap::Args;

use super::common::{
    check_bit_depth, downmix_to_mono, load_project, print_stats, render_windows, wav_loader, window_frames,
};

/// Render a project to a WAV file.
#[derive(Args)]
pub struct RenderArgs {
    /// Project file (TOML)
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Output WAV file
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Timeline position to start from, in seconds
    #[arg(long, default_value = "0")]
    start: f64,

    /// Seconds to render (defaults to the end of the last track)
    #[arg(long)]
    duration: Option<f64>,

    /// Render window in milliseconds
    #[arg(long, default_value = "100")]
    window: u32,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "24")]
    bit_depth: u16,
}

/// Run the render command.
pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    check_bit_depth(args.bit_depth)?;
    if !(args.start.is_finite() && args.start >= 0.0) {
        anyhow::bail!("--start must be a non-negative number of seconds");
    }

    let (project, base_dir) = load_project(&args.project)?;
    let mut composer = project.build(&base_dir, wav_loader)?;
    let rate = project.sample_rate;

    let start = Time::from_secs_f64(args.start);
    let end = match args.duration {
        Some(duration) if duration.is_finite() && duration > 0.0 => start + Time::from_secs_f64(duration),
        Some(_) => anyhow::bail!("--duration must be a positive number of seconds"),
        None => composer.duration(),
    };
    let start_frame = start.to_frames(rate);
    let total = (end.to_frames(rate) - start_frame).max(0) as usize;
    if total == 0 {
        anyhow::bail!("nothing to render: the project ends at {:.3}s", composer.duration().as_secs_f64());
    }
    let window = window_frames(args.window, rate);

    println!(
        "Rendering {} track(s), {:.3}s at {} Hz...",
        composer.tracks().len(),
        total as f64 / f64::from(rate),
        rate
    );
    tracing::info!(start_frame, total, window, "render");

    let sampler = KeyFrameSampler;
    let mut output = render_windows(start_frame, total, window, rate, |range| composer.render(range, &sampler))?;
    composer.dispose();

    if project.channels == 1 {
        output = downmix_to_mono(&output);
    }

    println!("\nStats:");
    print_stats("Output", &output);

    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, args.bit_depth)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!("Done!");

    Ok(())
}
