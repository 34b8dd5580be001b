//! CLI argument definitions for unqch

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "unqch")]
#[command(about = "Extract a Qt compressed help (.qch) file to a directory", long_about = None)]
pub struct Cli {
    /// Path to the .qch file
    pub file: PathBuf,

    /// Output directory (defaults to the file name without extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, env = "UNQCH_CONFIG")]
    pub config: Option<PathBuf>,
}
