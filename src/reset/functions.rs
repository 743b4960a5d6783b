//! The impls and functions
//!
use std::{fmt, io::{BufRead, Write}, time::Instant};
use chrono::Local;
use colored::Colorize;
use log::*;
use anyhow::{Context, Result};
use crate::hosts::HostList;
use crate::app_pools::{self, PoolValidation};
use crate::remote::{ProcessSample, RemoteHost};
use crate::results;
use crate::utility;
use crate::reset::{AllResetResults, MemorySample, ResetResult, ResetSettings, ResetStatus, RunOutcome, SamplePolicy};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl fmt::Display for ResetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            ResetStatus::Recycled(sample) => write!(f, "Server: {} AppPool: {} WorkingSet BEFORE Recycle: {} MB WorkingSet AFTER recycle: {} MB at {} by {}",
                                                    self.server,
                                                    self.app_pool,
                                                    sample.before_mb,
                                                    sample.after_mb,
                                                    sample.timestamp.format(TIMESTAMP_FORMAT),
                                                    self.user,
            ),
            ResetStatus::Failed(error) => write!(f, "Server: {} AppPool: {} FAILED: {} by {}",
                                                 self.server,
                                                 self.app_pool,
                                                 error,
                                                 self.user,
            ),
        }
    }
}

impl AllResetResults {
    pub fn new() -> Self { Default::default() }
    /// The result lines, in the order of the servers.
    pub fn lines(&self) -> Vec<String>
    {
        self.results.iter().map(|result| result.to_string()).collect()
    }
    pub fn failed(&self) -> usize
    {
        self.results.iter().filter(|result| matches!(result.status, ResetStatus::Failed(_))).count()
    }
}

// A working set value as bytes.
// The value is text returned by the server, and can be missing or garbage.
fn working_set_bytes(
    value: Option<&str>,
    server: &str,
    moment: &str,
    sample_policy: SamplePolicy,
) -> Result<i64>
{
    match sample_policy {
        SamplePolicy::BestEffort => {
            if value.and_then(utility::try_convert_to_int64).is_none() {
                warn!("({}) working set {} recycle is not a number: {:?}, using 0", server, moment, value);
            }
            Ok(utility::convert_to_int64(value.unwrap_or_default()))
        },
        SamplePolicy::Strict => {
            value.and_then(utility::try_convert_to_int64)
                .with_context(|| format!("({}) working set {} recycle is not a number: {:?}", server, moment, value))
        },
    }
}

/// Recycle the application pool on a server, and read the working set before and after the recycle.
///
/// The recycle is done first, and has finished when the process query is done.
/// The query returns the worker process from before the recycle first and the new worker process second,
/// so the order of the query output must be kept.
/// Only workers of exactly this application pool count, `Intranet` must not pick up an `IntranetApi` worker.
pub fn reset_remote_app_pool(
    remote: &impl RemoteHost,
    server: &str,
    app_pool: &str,
    sample_policy: SamplePolicy,
) -> Result<MemorySample>
{
    info!("begin reset {} on {}", app_pool, server);
    let timer = Instant::now();

    remote.recycle_app_pool(server, app_pool)?;

    let processes: Vec<ProcessSample> = remote.query_worker_processes(server, Some(app_pool))?
        .into_iter()
        .filter(|process| process.command_line.as_deref().and_then(app_pools::extract_app_pool_name).as_deref() == Some(app_pool))
        .collect();
    if processes.len() != 2 {
        warn!("({}) expected 2 worker processes for {} (before and after recycle), found {}", server, app_pool, processes.len());
    }
    let mut working_sets = processes.iter().map(|process| process.working_set_size.as_deref());
    let before = working_sets.next().flatten();
    let after = working_sets.next().flatten();
    debug!("({}) working set before: {:?}, after: {:?}", server, before, after);

    let sample = MemorySample {
        before_mb: utility::bytes_to_megabytes(working_set_bytes(before, server, "before", sample_policy)?),
        after_mb: utility::bytes_to_megabytes(working_set_bytes(after, server, "after", sample_policy)?),
        timestamp: Local::now(),
    };

    info!("end reset {} on {}: {:?}", app_pool, server, timer.elapsed());
    Ok(sample)
}

/// Reset the application pool on all servers in the host file.
///
/// The host file is read once; the first server is the reference server for the validation of the application pool.
/// Nothing is written to the results file when the validation is aborted.
pub fn perform_reset(
    remote: &impl RemoteHost,
    settings: &ResetSettings,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<RunOutcome>
{
    info!("begin reset run");
    let timer = Instant::now();

    let hostlist = HostList::read_host_file(&settings.host_file)?;
    let reference_server = hostlist.reference_server()
        .with_context(|| format!("No servers found in host file: {}", settings.host_file.display()))?;

    let app_pool = match app_pools::validate_app_pool(remote, &settings.app_pool, reference_server, settings.stop_on_error, input, output)? {
        PoolValidation::Valid(app_pool) => app_pool,
        PoolValidation::Aborted => return Ok(RunOutcome::Aborted),
    };

    if settings.clear_screen {
        write!(output, "\x1B[2J\x1B[1;1H")?;
    }

    let mut allresults = AllResetResults::new();
    for server in &hostlist.hosts {
        let status = match reset_remote_app_pool(remote, server, &app_pool, settings.sample_policy) {
            Ok(sample) => ResetStatus::Recycled(sample),
            Err(error) if settings.isolate_host_errors => {
                error!("({}) reset failed: {:#}", server, error);
                ResetStatus::Failed(format!("{:#}", error))
            },
            Err(error) => return Err(error),
        };
        let result = ResetResult {
            server: server.to_string(),
            app_pool: app_pool.clone(),
            user: settings.user.clone(),
            status,
        };
        match result.status {
            ResetStatus::Recycled(_) => writeln!(output, "{}", result.to_string().green())?,
            ResetStatus::Failed(_) => writeln!(output, "{}", result.to_string().red())?,
        };
        allresults.results.push(result);
    }

    results::write_results(&settings.results_file, &allresults.lines())?;

    info!("end reset run: {} servers, {} failed: {:?}", allresults.results.len(), allresults.failed(), timer.elapsed());
    Ok(RunOutcome::Completed(allresults))
}

/// Perform the reset, and write the error and a failure line to the results file if it fails.
pub fn run(
    remote: &impl RemoteHost,
    settings: &ResetSettings,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<RunOutcome>
{
    match perform_reset(remote, settings, input, output) {
        Ok(outcome) => Ok(outcome),
        Err(error) => {
            if let Err(write_error) = results::write_failure(&settings.results_file, &error) {
                error!("{:#}", write_error);
            }
            writeln!(output, "{}", results::FAILURE_MARKER.red())?;
            Err(error)
        },
    }
}
