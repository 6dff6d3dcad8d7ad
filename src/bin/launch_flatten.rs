use clap::{self, Parser};
use log::{error, info, Level};
use simple_logger::init_with_level;

use substack::{cli::LaunchArgs, config::Config, core::launch};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: LaunchArgs = LaunchArgs::parse();

    let config = Config::load(args.config.as_ref()).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let output = launch(&args.substack_base_dir, args.email_to.as_deref(), &config)
        .unwrap_or_else(|e| {
            error!("{}", e);
            std::process::exit(1);
        });

    println!("{}", output);

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
