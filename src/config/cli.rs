use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "ams-connector")]
#[command(about = "Interoperability connector for Fineract account management systems")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "connector.toml")]
    pub config: PathBuf,

    /// Tenant to act on
    #[arg(short, long)]
    pub tenant: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Look up the party behind an interoperability identifier
    LookupParty {
        #[arg(long = "type")]
        id_type: String,
        #[arg(long = "id")]
        id_value: String,
    },
    /// Bind an interoperability identifier to an account
    RegisterParty {
        #[arg(long = "type")]
        id_type: String,
        #[arg(long = "id")]
        id_value: String,
        #[arg(long)]
        account: String,
    },
    /// Post a payee-initiated deposit read from a JSON file
    Deposit {
        #[arg(long)]
        file: PathBuf,
    },
    /// Request a local quote read from a JSON file
    Quote {
        #[arg(long = "type")]
        id_type: String,
        #[arg(long = "id")]
        id_value: String,
        #[arg(long)]
        file: PathBuf,
    },
}
