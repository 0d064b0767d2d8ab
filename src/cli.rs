use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "code-analyze",
    about = "Lint JavaScript and TypeScript sources with a fixed ESLint rule set",
    version
)]
pub struct Cli {
    /// Directory to analyze
    pub path: Option<PathBuf>,

    /// Maximum number of files analyzed at once [default: 4]
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-file timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Settings file [default: <dir>/.code-analyze.toml, fallback ~/.config/code-analyze/config.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not check for or install the ESLint packages
    #[arg(long)]
    pub skip_install: bool,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub format: ReportFormat,

    /// Only print the summary line
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
