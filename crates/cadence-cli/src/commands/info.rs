//! Display a project's tracks.

use std::path::PathBuf;

use cadence_io::read_wav_info;
use clap::Args;

use super::common::{load_project, wav_loader};

/// Display project information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the project file
    pub project: PathBuf,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let (project, base_dir) = load_project(&args.project)?;

    println!("Project:     {}", args.project.display());
    println!("Sample Rate: {} Hz", project.sample_rate);
    println!("Channels:    {}", project.channels);

    for track in project.tracks.iter().filter(|t| t.muted) {
        println!("\n{} (muted)", track.display_name());
    }

    let composer = project.build(&base_dir, wav_loader)?;
    for (track, config) in composer.tracks().iter().zip(project.tracks.iter().filter(|t| !t.muted)) {
        let source = cadence_config::resolve_source(&base_dir, &config.source);
        let extent = track.extent();
        println!("\n{}", track.name());
        println!(
            "  Timeline:  {:.3}s - {:.3}s",
            extent.start().as_secs_f64(),
            extent.end().as_secs_f64()
        );
        match read_wav_info(&source) {
            Ok(info) => println!(
                "  Source:    {} ({} ch, {} Hz, {:.3}s)",
                source.display(),
                info.channels,
                info.sample_rate,
                info.duration_secs
            ),
            Err(_) => println!("  Source:    {}", source.display()),
        }
        for line in track.graph().describe().lines() {
            println!("    {line}");
        }
    }

    println!("\nDuration:    {:.3}s", composer.duration().as_secs_f64());
    Ok(())
}
