//! The `mandantcrypt` command-line front end.
//!
//! Fetches an identity's password from the directory and packs files into an
//! encrypted container with it.

pub mod args;
pub mod commands;
pub mod settings;

pub use args::Cli;
pub use settings::Settings;
