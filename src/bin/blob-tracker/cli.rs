use std::path::PathBuf;

use clap::{command, Parser};

// Some defaults; some of which can be overriden via CLI args
const CONFIG_FILE_PATH: &str = "./blob-tracker.json";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Where to load detection/tracking/render config
    #[arg(long = "config", default_value = CONFIG_FILE_PATH)]
    pub config_path: PathBuf,

    /// Directory of frames (png, jpg, bmp), processed in file-name order
    #[arg(long = "input")]
    pub input_dir: PathBuf,

    /// If set, write original | mask | blobs composites here, one per frame
    #[arg(long = "output")]
    pub output_dir: Option<PathBuf>,

    /// Print tracked points as JSON lines on stdout
    #[arg(long = "printPoints")]
    pub print_points: bool,

    /// Start the frames directory over when it runs out, forgetting all tracked points
    #[arg(long = "loop")]
    pub loop_input: bool,

    /// Stop after this many frames
    #[arg(long = "maxFrames")]
    pub max_frames: Option<usize>,

    #[arg(long = "loglevel", default_value_t = String::from("info"))]
    pub log_level: String,
}
