//! Command-line interface for the xtrpc declaration generator.

use std::path::PathBuf;

use clap::Parser;

use xtrpc::config::{DEFAULT_CONFIG_FILE, Overrides};

#[derive(Parser)]
#[command(name = "xtrpc")]
#[command(about = "Generate tRPC router type declarations fast", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Source file containing the target type alias
    #[arg(long)]
    pub entry: Option<PathBuf>,

    /// Name of the public router type alias
    #[arg(long)]
    pub target: Option<String>,

    /// Project tsconfig path
    #[arg(long)]
    pub tsconfig: Option<PathBuf>,

    /// Where to write the emitted declaration
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Log stage timings and visit counts
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            entry: self.entry.clone(),
            target: self.target.clone(),
            tsconfig: self.tsconfig.clone(),
            out: self.out.clone(),
            verbose: self.verbose,
        }
    }
}
