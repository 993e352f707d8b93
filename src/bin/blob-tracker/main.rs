mod cli;

use std::{
    fs,
    io::{self, Write},
    time::Instant,
};

use anyhow::{Context, Result};
use blob_tracker::{
    backend_config::BackendConfig,
    frame_rate::FrameRateCounter,
    systems::{composite, frames::ImageSequence, Systems},
};
use clap::Parser;
use cli::Cli;
use env_logger::Env;
use log::{debug, error, info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger from the environment

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    debug!("Started; args: {:?}", cli);

    let config = BackendConfig::load_config_from_file(&cli.config_path)?;
    let mut systems = Systems::new(&config).context("invalid config")?;

    if let Some(dir) = &cli.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    let max_frames = cli.max_frames.unwrap_or(usize::MAX);
    let mut frame_rate = FrameRateCounter::new(Instant::now());
    let mut index = 0;

    'passes: loop {
        let frames = ImageSequence::open(&cli.input_dir)?;
        if frames.is_empty() {
            warn!("No frames to process in {}", cli.input_dir.display());
            break;
        }

        for frame in frames {
            if index >= max_frames {
                break 'passes;
            }
            let this_index = index;
            index += 1;

            let frame = match frame {
                Ok(f) => f,
                Err(e) => {
                    error!("Skipping frame {}: {:#}", this_index, e);
                    continue;
                }
            };

            let result = systems.process_frame(&frame);
            debug!(
                "Frame {}: {} detections -> {} tracked points",
                this_index,
                result.detections.len(),
                result.points.len()
            );

            if cli.print_points {
                let tracked = systems.tracker.tracked_points();
                systems
                    .points_output
                    .emit(&mut stdout, this_index, &tracked)
                    .context("failed to write tracked points")?;
            }

            if let Some(dir) = &cli.output_dir {
                let path = dir.join(format!("frame_{:05}.png", this_index));
                composite(&frame, &result)
                    .save(&path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }

            if let Some(fps) = frame_rate.tick(Instant::now()) {
                info!("FPS: {}", fps);
            }
        }

        if !cli.loop_input {
            break;
        }
        systems.restart();
    }

    stdout.flush()?;
    info!(
        "Done; {} points still tracked at end of input",
        systems.tracker.len()
    );

    Ok(())
}
