mod binning;

use anyhow::Result;
use clap::Command;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "bintrack";
    pub const BIN_NAME: &str = "bintrack";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Fixed-width genomic bin signals with genome-wide statistics and multi-resolution display pyramids.")
        .subcommand_required(true)
        .subcommand(binning::cli::create_bin_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // BIN
        //
        Some((binning::cli::BIN_CMD, matches)) => {
            binning::handlers::run_bin(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
