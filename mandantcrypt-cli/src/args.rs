//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mandantcrypt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Pack files into password-protected containers for an identity")]
pub struct Cli {
    /// Settings file to use instead of the per-user default.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the active identities of the directory
    Identities,
    /// Pack files into an encrypted container
    Pack(PackArgs),
    /// Open a container with an identity's password and list its entries
    Verify(VerifyArgs),
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Report the native PDF library in use
    Doctor,
}

#[derive(Debug, clap::Args)]
pub struct PackArgs {
    /// Files to pack
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Identity number (defaults to the last used identity)
    #[arg(short, long)]
    pub identity: Option<i64>,

    /// Destination path (defaults to "<identity>_<date>.<ext>" in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Backend: zip, 7z or pdf (overrides the identity's preference)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Fail instead of replacing an existing destination
    #[arg(long)]
    pub no_overwrite: bool,

    /// Template PDF for the pdf backend
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Combined input size limit in MiB, 0 disables the limit
    #[arg(long, default_value_t = 20)]
    pub max_input_mib: u64,
}

#[derive(Debug, clap::Args)]
pub struct VerifyArgs {
    /// Container to open
    pub path: PathBuf,

    /// Identity number (defaults to the last used identity)
    #[arg(short, long)]
    pub identity: Option<i64>,

    /// Backend (derived from the file extension when omitted)
    #[arg(short, long)]
    pub backend: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the current settings
    Show,
    /// Set the directory server URL
    SetServer {
        url: String,
        /// Allow a plain http URL
        #[arg(long)]
        dev: bool,
        /// Basic auth user
        #[arg(long)]
        user: Option<String>,
    },
    /// Set the backend used when an identity has no preference
    SetBackend { name: String },
}
