//! xtrpc CLI entry point.

mod cli;

use clap::Parser as _;
use cli::Cli;
use xtrpc::error::{Error, Result};

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(out_file) => println!("Generated {out_file}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let config = xtrpc::config::load(&cli.config, cli.overrides())?;
    init_tracing(config.verbose);

    let declaration = xtrpc::generate(&config)?;

    if let Some(dir) = config.out_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    std::fs::write(&config.out_file, declaration).map_err(|e| Error::io(&config.out_file, e))?;

    Ok(config.out_file.display().to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "xtrpc=debug" } else { "xtrpc=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
