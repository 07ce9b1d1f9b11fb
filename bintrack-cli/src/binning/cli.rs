use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const BIN_CMD: &str = "bin";
pub const DEFAULT_BIN_WIDTH: u32 = 25;

pub fn create_bin_cli() -> Command {
    Command::new(BIN_CMD)
        .author("Databio")
        .about("Aggregate a bed-like window file into fixed-width bins and report genome-wide statistics.")
        .arg(
            Arg::new("chromref")
                .long("chromref")
                .short('c')
                .required(true)
                .help("Path to a chrom.sizes file (optionally gzipped)"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .required(true)
                .help("Bed-like file of chrom, start, stop and optional score columns"),
        )
        .arg(
            Arg::new("binwidth")
                .long("binwidth")
                .short('w')
                .value_parser(value_parser!(u32).range(1..))
                .help("Bin width in base pairs"),
        )
        .arg(arg!(--method <method> "Aggregation method: sum, average or maximum"))
        .arg(arg!(--precision <precision> "Storage precision: half or single"))
        .arg(
            arg!(--threads <threads> "Worker threads; overrides the config file")
                .value_parser(value_parser!(usize)),
        )
        .arg(arg!(--config <config> "Engine configuration in TOML"))
        .arg(arg!(--chrom <chrom> "Chromosome to project for display").requires("bp-per-pixel"))
        .arg(
            Arg::new("bp-per-pixel")
                .long("bp-per-pixel")
                .value_parser(value_parser!(f64))
                .requires("chrom")
                .help("Base pairs per pixel of the projected chromosome"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .action(ArgAction::SetTrue)
                .help("Hide the progress bar"),
        )
}
