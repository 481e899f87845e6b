use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "attendanced",
    version,
    about = "School attendance recording and reporting service"
)]
pub struct Cli {
    /// Directory holding the attendance database.
    #[arg(long, env = "ATTENDANCED_WORKSPACE", default_value = "attendance-data")]
    pub workspace: PathBuf,

    /// Address to bind; port 0 picks a free port.
    #[arg(long, env = "ATTENDANCED_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Debug-level logging when RUST_LOG is unset.
    #[arg(short, long)]
    pub verbose: bool,
}
