use std::{collections::HashMap, io::{stdin, stdout}, path::Path, process};
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use log::*;
use anyhow::Result;

use apppool_reset::{Opts, utility, remote::PowerShellRemote, reset::{self, RunOutcome}};

fn main() -> Result<()>
{
    env_logger::init();
    dotenv().ok();
    let options = Opts::parse();

    let mut changed_options = HashMap::new();
    let settings = utility::set_reset_settings(&options, &mut changed_options);
    let remote = PowerShellRemote::new(utility::set_shell(&options.shell, &mut changed_options));

    utility::dotenv_writer(options.write_dotenv, Path::new(".env"), changed_options)?;

    match reset::run(&remote, &settings, &mut stdin().lock(), &mut stdout()) {
        Ok(RunOutcome::Completed(allresults)) => {
            info!("reset completed for {} servers", allresults.results.len());
            Ok(())
        },
        Ok(RunOutcome::Aborted) => {
            process::exit(1);
        },
        Err(error) => {
            eprintln!("{} {:#}", "Error:".red(), error);
            process::exit(1);
        },
    }
}
