//! WGC CLI - Command line tool for watershed gridded-climate summaries.

use clap::Parser;
use log::info;

#[derive(Parser)]
#[command(
    name = "wgc",
    version,
    about = "Watershed gridded-climate summary toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: wgc_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let artifacts = wgc_cmd::run(cli.command)?;
    for path in artifacts {
        info!("artifact: {}", path.display());
    }
    Ok(())
}
