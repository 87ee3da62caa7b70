use anyhow::Result;
use log::info;
use std::env;

use planbook::config::Config;
use planbook::data;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        },
    };

    let mut planner = data::load_state(&config.state_path)?;
    if let Some(import) = &config.import {
        let entered = data::import_transactions_csv(&import.csv_path, &mut planner, import.ledger)?;
        info!("imported {} transactions into ledger {}", entered, import.ledger);
        data::save_state(&config.state_path, &planner)?;
    }

    data::export_status_csv(&planner, std::io::stdout())?;

    Ok(())
}
