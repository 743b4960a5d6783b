//! The impls and functions
//!
use std::{io::{BufRead, Write}, time::Instant};
use colored::Colorize;
use itertools::Itertools;
use regex::Regex;
use log::*;
use anyhow::{bail, Context, Result};
use crate::remote::RemoteHost;
use crate::app_pools::PoolValidation;

/// Get the application pool name from a worker process command line.
/// The name is the text between the first and the second double quote.
pub fn extract_app_pool_name(
    command_line: &str,
) -> Option<String>
{
    let regular_expression = Regex::new(r#"^[^"]*"([^"]*)""#).unwrap();
    regular_expression.captures(command_line)
        .and_then(|captures| captures.get(1))
        .map(|app_pool| app_pool.as_str().to_string())
}

/// Get the application pool names of the worker processes on a server.
/// The names are in the order the server returns the processes, and can contain duplicates
/// if an application pool has more than one worker process.
pub fn get_remote_app_pools(
    remote: &impl RemoteHost,
    server: &str,
) -> Result<Vec<String>>
{
    info!("begin reading app pools on {}", server);
    let timer = Instant::now();

    let processes = remote.query_worker_processes(server, None)?;
    let app_pools: Vec<String> = processes.iter()
        .filter_map(|process| process.command_line.as_deref())
        .filter_map(extract_app_pool_name)
        .collect();

    info!("end reading app pools on {}: {:?}", server, timer.elapsed());
    debug!("app pools on {}: {:?}", server, app_pools);
    Ok(app_pools)
}

/// Check that the application pool exists on the reference server.
///
/// If it doesn't exist (an empty name never exists):
/// - with stop_on_error, a message is written and [`PoolValidation::Aborted`] is returned.
/// - without stop_on_error, the user chooses an application pool from the pools on the reference server.
pub fn validate_app_pool(
    remote: &impl RemoteHost,
    app_pool: &str,
    reference_server: &str,
    stop_on_error: bool,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<PoolValidation>
{
    let app_pools = get_remote_app_pools(remote, reference_server)?;

    if !app_pool.trim().is_empty() && app_pools.iter().any(|found| found == app_pool) {
        info!("app pool {} found on {}", app_pool, reference_server);
        return Ok(PoolValidation::Valid(app_pool.to_string()));
    }

    if stop_on_error {
        error!("app pool '{}' not found on {}, stop on error is set", app_pool, reference_server);
        writeln!(output, "{}", format!("App pool '{}' not found on {}. Stopping.", app_pool, reference_server).red())?;
        return Ok(PoolValidation::Aborted);
    }

    if !app_pool.trim().is_empty() {
        writeln!(output, "App pool '{}' not found on {}.", app_pool, reference_server)?;
    }
    let chosen = select_app_pool_from_user(&app_pools, reference_server, input, output)?;
    info!("app pool {} chosen", chosen);
    Ok(PoolValidation::Valid(chosen))
}

/// Show the application pools sorted and numbered, and read the choice of the user.
/// The user can enter the number or the name. Invalid input asks again.
pub fn select_app_pool_from_user(
    app_pools: &[String],
    reference_server: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<String>
{
    let choices: Vec<&String> = app_pools.iter().sorted().dedup().collect();
    if choices.is_empty() {
        bail!("No app pools with a running worker process found on {}", reference_server);
    }

    writeln!(output, "App pools on {}:", reference_server)?;
    for (number, app_pool) in choices.iter().enumerate() {
        writeln!(output, "{:4} {}", number + 1, app_pool)?;
    }

    loop {
        write!(output, "Enter app pool number or name: ")?;
        output.flush()?;

        let mut choice = String::new();
        let bytes_read = input.read_line(&mut choice)
            .with_context(|| "Error reading the app pool choice")?;
        if bytes_read == 0 {
            bail!("No app pool chosen");
        }
        let choice = choice.trim();

        if let Ok(number) = choice.parse::<usize>() {
            if number >= 1 && number <= choices.len() {
                return Ok(choices[number - 1].to_string());
            }
        }
        if let Some(app_pool) = choices.iter().find(|app_pool| app_pool.as_str() == choice) {
            return Ok(app_pool.to_string());
        }
        writeln!(output, "Invalid choice: '{}'", choice)?;
    }
}
