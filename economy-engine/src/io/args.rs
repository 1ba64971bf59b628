use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file (TOML). Missing file means defaults.
    #[arg(long, default_value = "economy.toml")]
    pub config: PathBuf,

    /// Directory holding the store snapshot and the journal
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Identity allowed to seize balances.
    /// Can be specified multiple times; adds to the settings file list.
    #[arg(long = "authorize")]
    pub authorize: Vec<String>,
}
