use clap::{self, Parser};
use log::{error, info, Level};
use simple_logger::init_with_level;

use substack::{cli::PrepareArgs, config::Config, core::prepare};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: PrepareArgs = PrepareArgs::parse();

    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let config = Config::load(args.config.as_ref()).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let substack_base_dir = prepare(&args.request(), &config).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    info!("DONE: {}", substack_base_dir.display());

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
