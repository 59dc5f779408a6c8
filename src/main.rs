use anyhow::Result;
use clap::Parser;
use salon_insights::cli::{Cli, init_tracing};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.run()
}
