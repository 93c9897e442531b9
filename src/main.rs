use clap::Parser;
use tracing_subscriber::EnvFilter;

use sqheaven::Opts;

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let default_level = if opts.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    sqheaven::run(opts)?;

    Ok(())
}
