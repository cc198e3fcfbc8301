mod app;
mod cli;
mod color;
mod config;
mod db;
mod error;
mod event;
mod legacy;
mod logging;
mod schedule;
mod slot;
mod tui;
mod types;
mod ui;

use anyhow::Result;
use clap::Parser;
use log::warn;

fn main() -> Result<()> {
    let cli_opts = cli::Cli::parse();
    let config = config::load_config()?;
    if let Err(err) = logging::init(&config.log_path()) {
        eprintln!("Logging disabled: {err:#}");
    }
    let conn = db::init(&config.db_path())?;
    if let Some(command) = cli_opts.command {
        return cli::run(command, &conn, &config);
    }

    let mut app = app::App::load(conn, &config)?;
    let mut terminal = tui::init()?;
    let result = event::run(&mut app, &mut terminal);

    tui::restore()?;
    if let Err(err) = &result {
        warn!("Exited with error: {err:#}");
    }

    result
}
