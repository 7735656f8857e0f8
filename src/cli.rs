use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "trk2gis",
    about = "Convert particle tracking NetCDF output into GIS points or tracks",
    version
)]
pub struct Cli {
    /// Path to the JSON task file (a list of tasks, {"tasks": [...]}, or a single task)
    pub config: PathBuf,
}
