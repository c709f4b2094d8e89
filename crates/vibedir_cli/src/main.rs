use std::io;

use clap::Parser;
use vibedir::EnvConfig;
use vibedir_cli::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run(&cli, EnvConfig::from_env(), stdin.lock(), &mut stdout)
}
