mod cli;
mod scenario;
mod trace;

use anyhow::Result;
use clap::Parser;

use panelnav_config::Config;
use panelnav_logger as logger;

use cli::Cli;
use scenario::{Runner, Scenario};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Explicit config file, else the XDG one (created on first run)
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };

    logger::init(
        config.log_file_path(),
        config.logging.max_entries,
        config.log_level()?,
    );
    logger::info(format!("panelnav started, root '{}'", config.general.root_name));

    let scenario = Scenario::load(&cli.scenario)?;
    let mut runner = Runner::new(&config, &scenario)?;

    let result = runner.run(&scenario.steps);
    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            println!();
            print!("{}", runner.report());
        }
        Err(err) => {
            logger::error(format!("{:#}", err));
            eprintln!("Error: {:?}", err);
            print!("{}", runner.report());
            std::process::exit(1);
        }
    }

    runner.navigation().unload_all();
    logger::info("panelnav finished");
    Ok(())
}
