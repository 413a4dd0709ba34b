use std::process;
use clap::Parser;

#[macro_use]
extern crate log;

use anyhow::Result;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;


/// Parse command line arguments and run `hybrid_impute::run()`
fn main() -> Result<()> {
    // ----------------------------- Run CLI Parser
    let cli = parser::Cli::parse();

    // ----------------------------- Init logger.
    logger::Logger::init(cli.verbosity());

    // ----------------------------- Serialize command line arguments
    match cli.serialize() {
        Ok(Some(yaml)) => info!("Command line arguments saved in {}", yaml.display()),
        Ok(None)       => {},
        Err(e)         => {
            error!("{:?}", e);
            process::exit(1);
        }
    }

    // ----------------------------- unpack Cli and run the appropriate modules.
    if let Err(e) = hybrid_impute::run(cli) {
        error!("{:?}", e);
        process::exit(1);
    };

    Ok(())
}
