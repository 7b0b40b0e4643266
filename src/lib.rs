#![doc = include_str!("../README.md")]

pub mod cli;
pub mod command;
pub mod config;
pub mod diff;
pub mod error;
pub mod fs;
pub mod manifest;
pub mod updater;
pub mod verify;

pub use error::*;
pub use updater::{StemcellUpdater, UpdateReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() -> Result<()> {
    use clap::Parser;

    let cli = cli::StemcellCli::parse();
    command::update::execute(cli.update)
}
