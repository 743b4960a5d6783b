//! Utilities
use log::*;
use std::{env, fs, io::Write, collections::HashMap, path::{Path, PathBuf}};
use itertools::Itertools;
use anyhow::{Result, Context};
use crate::Opts;
use crate::reset::{ResetSettings, SamplePolicy};

use crate::DEFAULT_HOST_FILE;
use crate::DEFAULT_RESULTS_FILE;
use crate::DEFAULT_SHELL;

const BYTES_PER_MEGABYTE: f64 = 1_048_576_f64;

/// The directory of the executable.
/// The host file and the results file are expected next to the executable,
/// if that cannot be determined, the current working directory is used.
pub fn program_directory() -> PathBuf
{
    env::current_exe()
        .ok()
        .and_then(|executable| executable.parent().map(|directory| directory.to_path_buf()))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

// The order of choosing a setting is:
// 1. the command line argument.
// 2. the environment variable, which can be set via .env (dotenv().ok() in main).
// 3. the default.
// A setting from 1 or 2 is added to changed_options so it can be written to .env.
fn set_from_option_or_env(
    option: &Option<String>,
    env_name: &'static str,
    changed_options: &mut HashMap<&str, String>,
) -> Option<String>
{
    if let Some(value) = option {
        info!("{} argument set: using: {}", env_name, value);
        changed_options.insert(env_name, value.to_string());
        return Some(value.to_string());
    }
    match env::var(env_name) {
        Ok(set_var) => {
            info!("{} not set: set via .env: {}", env_name, set_var);
            changed_options.insert(env_name, set_var.to_owned());
            Some(set_var)
        }
        Err(_e) => None,
    }
}

pub fn set_host_file(
    option: &Option<String>,
    changed_options: &mut HashMap<&str, String>,
) -> PathBuf
{
    match set_from_option_or_env(option, "APPPOOL_RESET_HOST_FILE", changed_options) {
        Some(host_file) => PathBuf::from(host_file),
        None => {
            let host_file = program_directory().join(DEFAULT_HOST_FILE);
            info!("host file not set: and not set via .env: using: {}", host_file.display());
            host_file
        }
    }
}

pub fn set_results_file(
    option: &Option<String>,
    changed_options: &mut HashMap<&str, String>,
) -> PathBuf
{
    match set_from_option_or_env(option, "APPPOOL_RESET_RESULTS_FILE", changed_options) {
        Some(results_file) => PathBuf::from(results_file),
        None => {
            let results_file = program_directory().join(DEFAULT_RESULTS_FILE);
            info!("results file not set: and not set via .env: using: {}", results_file.display());
            results_file
        }
    }
}

pub fn set_shell(
    option: &Option<String>,
    changed_options: &mut HashMap<&str, String>,
) -> String
{
    set_from_option_or_env(option, "APPPOOL_RESET_SHELL", changed_options)
        .unwrap_or_else(|| {
            info!("shell not set: and not set via .env: using DEFAULT_SHELL: {}", DEFAULT_SHELL);
            DEFAULT_SHELL.to_string()
        })
}

/// Turn the command line options into the settings for a reset run.
pub fn set_reset_settings(
    options: &Opts,
    changed_options: &mut HashMap<&str, String>,
) -> ResetSettings
{
    ResetSettings {
        host_file: set_host_file(&options.host_file, changed_options),
        results_file: set_results_file(&options.results_file, changed_options),
        app_pool: options.app_pool.clone().unwrap_or_default(),
        stop_on_error: options.stop_on_error,
        sample_policy: if options.strict_samples { SamplePolicy::Strict } else { SamplePolicy::BestEffort },
        isolate_host_errors: options.isolate_host_errors,
        clear_screen: !options.no_clear,
        user: current_user(),
    }
}

/// Save the settings that were set by argument or environment to the dotenv file,
/// so the next run picks them up via `dotenv()`.
///
/// The lines in the file for other keys, and comments, are kept.
/// A line for a saved setting is replaced, and the saved settings are written sorted by key.
pub fn dotenv_writer(
    write_dotenv: bool,
    dotenv_file: &Path,
    changed_options: HashMap<&str, String>,
) -> Result<()>
{
    if changed_options.is_empty() || !write_dotenv {
        return Ok(());
    }
    info!("Writing settings to {}", dotenv_file.display());

    let existing = if dotenv_file.exists() {
        fs::read_to_string(dotenv_file)
            .with_context(|| format!("Error reading dotenv file: {}", dotenv_file.display()))?
    } else {
        String::new()
    };
    let mut lines: Vec<String> = existing.lines()
        .filter(|line| {
            let key = line.split('=').next().unwrap_or_default().trim();
            !changed_options.contains_key(key)
        })
        .map(|line| line.to_string())
        .collect();
    for (key, value) in changed_options.iter().sorted() {
        info!("{}={}", key, value);
        lines.push(format!("{}={}", key, value));
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dotenv_file)
        .with_context(|| format!("Error writing dotenv file: {}", dotenv_file.display()))?;
    for line in lines {
        writeln!(file, "{}", line)
            .with_context(|| format!("Error writing dotenv file: {}", dotenv_file.display()))?;
    }
    Ok(())
}

/// The identity of the user running the reset, as `DOMAIN\user` on windows.
pub fn current_user() -> String
{
    let user = env::var("USERNAME")
        .or_else(|_| env::var("USER"))
        .unwrap_or_else(|_| String::from("unknown"));
    match env::var("USERDOMAIN") {
        Ok(domain) if !domain.is_empty() => format!("{}\\{}", domain, user),
        _ => user,
    }
}

/// Parse a string into an i64.
/// Returns None if the string is empty, not a number, or does not fit in an i64.
pub fn try_convert_to_int64(value: &str) -> Option<i64>
{
    value.trim().parse::<i64>().ok()
}

/// Parse a string into an i64, and return 0 when that is not possible.
pub fn convert_to_int64(value: &str) -> i64
{
    try_convert_to_int64(value).unwrap_or(0)
}

/// Bytes to megabytes (2^20), rounded to the nearest integer.
pub fn bytes_to_megabytes(bytes: i64) -> i64
{
    (bytes as f64 / BYTES_PER_MEGABYTE).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unit_dotenv_writer_creates_sorted_file() {
        let directory = tempdir().unwrap();
        let dotenv_file = directory.path().join(".env");
        let changed_options = HashMap::from([
            ("APPPOOL_RESET_SHELL", "pwsh".to_string()),
            ("APPPOOL_RESET_HOST_FILE", r"D:\iis\HostFile.txt".to_string()),
        ]);
        dotenv_writer(true, &dotenv_file, changed_options).unwrap();
        assert_eq!(fs::read_to_string(&dotenv_file).unwrap(), "APPPOOL_RESET_HOST_FILE=D:\\iis\\HostFile.txt\nAPPPOOL_RESET_SHELL=pwsh\n");
    }
    #[test]
    fn unit_dotenv_writer_keeps_other_settings() {
        let directory = tempdir().unwrap();
        let dotenv_file = directory.path().join(".env");
        fs::write(&dotenv_file, "# local settings\nRUST_LOG=info\nAPPPOOL_RESET_SHELL=powershell.exe\n").unwrap();
        let changed_options = HashMap::from([("APPPOOL_RESET_SHELL", "pwsh".to_string())]);
        dotenv_writer(true, &dotenv_file, changed_options).unwrap();
        assert_eq!(fs::read_to_string(&dotenv_file).unwrap(), "# local settings\nRUST_LOG=info\nAPPPOOL_RESET_SHELL=pwsh\n");
    }
    #[test]
    fn unit_dotenv_writer_not_requested() {
        let directory = tempdir().unwrap();
        let dotenv_file = directory.path().join(".env");
        let changed_options = HashMap::from([("APPPOOL_RESET_SHELL", "pwsh".to_string())]);
        dotenv_writer(false, &dotenv_file, changed_options).unwrap();
        assert!(!dotenv_file.exists());
    }
    #[test]
    fn unit_dotenv_writer_nothing_changed() {
        let directory = tempdir().unwrap();
        let dotenv_file = directory.path().join(".env");
        dotenv_writer(true, &dotenv_file, HashMap::new()).unwrap();
        assert!(!dotenv_file.exists());
    }

    #[test]
    fn unit_convert_to_int64_valid_numbers() {
        assert_eq!(convert_to_int64("0"), 0);
        assert_eq!(convert_to_int64("123456789"), 123456789);
        assert_eq!(convert_to_int64("-42"), -42);
        assert_eq!(convert_to_int64(" 1048576\r"), 1048576);
        assert_eq!(convert_to_int64("9223372036854775807"), i64::MAX);
    }
    #[test]
    fn unit_convert_to_int64_invalid_input_is_zero() {
        assert_eq!(convert_to_int64(""), 0);
        assert_eq!(convert_to_int64("   "), 0);
        assert_eq!(convert_to_int64("abc"), 0);
        assert_eq!(convert_to_int64("12MB"), 0);
        assert_eq!(convert_to_int64("1.5"), 0);
        // one more than i64::MAX
        assert_eq!(convert_to_int64("9223372036854775808"), 0);
    }
    #[test]
    fn unit_try_convert_to_int64_tells_zero_from_failure() {
        assert_eq!(try_convert_to_int64("0"), Some(0));
        assert_eq!(try_convert_to_int64("garbage"), None);
    }
    #[test]
    fn unit_bytes_to_megabytes() {
        assert_eq!(bytes_to_megabytes(0), 0);
        assert_eq!(bytes_to_megabytes(1048576), 1);
        assert_eq!(bytes_to_megabytes(1500000), 1);
        assert_eq!(bytes_to_megabytes(1600000), 2);
        assert_eq!(bytes_to_megabytes(3000000000), 2861);
    }
    #[test]
    fn unit_set_shell_argument_is_remembered() {
        let mut changed_options = HashMap::new();
        let shell = set_shell(&Some("pwsh".to_string()), &mut changed_options);
        assert_eq!(shell, "pwsh");
        assert_eq!(changed_options.get("APPPOOL_RESET_SHELL"), Some(&"pwsh".to_string()));
    }
    #[test]
    fn unit_set_reset_settings_from_options() {
        let options = Opts {
            app_pool: Some("DefaultAppPool".to_string()),
            host_file: Some("hosts.txt".to_string()),
            results_file: Some("results.txt".to_string()),
            strict_samples: true,
            no_clear: true,
            ..Default::default()
        };
        let mut changed_options = HashMap::new();
        let settings = set_reset_settings(&options, &mut changed_options);
        assert_eq!(settings.app_pool, "DefaultAppPool");
        assert_eq!(settings.host_file, PathBuf::from("hosts.txt"));
        assert_eq!(settings.results_file, PathBuf::from("results.txt"));
        assert_eq!(settings.sample_policy, SamplePolicy::Strict);
        assert!(!settings.clear_screen);
        assert!(!settings.stop_on_error);
    }
}
