use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "odx")]
#[command(about = "Extract, clean and anonymize OData business partners", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the job configuration (JSON, or TOML with a .toml extension)
    pub config: PathBuf,
}
