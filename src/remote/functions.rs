//! The impls and functions
//!
use std::{process::Command, time::Instant};
use log::*;
use anyhow::{bail, Context, Result};
use crate::remote::{PowerShellRemote, ProcessQueryOutput, ProcessSample, RemoteHost};
use crate::WORKER_PROCESS_NAME;

impl PowerShellRemote {
    pub fn new(shell: String) -> Self {
        PowerShellRemote { shell }
    }
    /// Execute a script, and return stdout.
    /// The script is executed with `$ErrorActionPreference = 'Stop'`,
    /// so a failing cmdlet makes powershell exit with a non-zero exit code.
    fn invoke(
        &self,
        script: &str,
    ) -> Result<String>
    {
        debug!("{} -Command {}", self.shell, script);
        let timer = Instant::now();

        let output = Command::new(&self.shell)
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-Command")
            .arg(format!("$ErrorActionPreference = 'Stop'; {}", script))
            .output()
            .with_context(|| format!("Cannot execute: {}", self.shell))?;

        debug!("{} finished in {:?} with {}", self.shell, timer.elapsed(), output.status);
        if !output.status.success() {
            bail!("{} failed ({}): {}", self.shell, output.status, String::from_utf8_lossy(&output.stderr).trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
    fn process_query_script(
        server: &str,
        app_pool: Option<&str>,
    ) -> String
    {
        // The name filter keeps out other processes with the app pool name in the command line,
        // such as the powershell process running this query on the local server.
        let mut filter = format!("Name = '{}'", escape_wql_string(WORKER_PROCESS_NAME));
        if let Some(app_pool) = app_pool {
            filter.push_str(&format!(" AND CommandLine LIKE '%\"{}\"%'", escape_wql_like(app_pool)));
        }
        format!("Get-CimInstance -ComputerName {} -ClassName Win32_Process -Filter {} \
                 | Select-Object @{{n='CommandLine';e={{$_.CommandLine}}}},@{{n='WorkingSetSize';e={{[string]$_.WorkingSetSize}}}} \
                 | ConvertTo-Json -Compress",
                quote_powershell(server),
                quote_powershell(&filter),
        )
    }
    fn recycle_script(
        server: &str,
        app_pool: &str,
    ) -> String
    {
        format!("Invoke-Command -ComputerName {} -ArgumentList {} -ScriptBlock {{ param($pool) Import-Module WebAdministration; Restart-WebAppPool -Name $pool }}",
                quote_powershell(server),
                quote_powershell(app_pool),
        )
    }
}

impl RemoteHost for PowerShellRemote {
    fn query_worker_processes(
        &self,
        server: &str,
        app_pool: Option<&str>,
    ) -> Result<Vec<ProcessSample>>
    {
        let output = self.invoke(&PowerShellRemote::process_query_script(server, app_pool))
            .with_context(|| format!("Error reading the processes on server: {}", server))?;
        parse_process_query(&output)
            .with_context(|| format!("Error parsing the processes on server: {}", server))
    }
    fn recycle_app_pool(
        &self,
        server: &str,
        app_pool: &str,
    ) -> Result<()>
    {
        info!("recycle app pool {} on {}", app_pool, server);
        self.invoke(&PowerShellRemote::recycle_script(server, app_pool))
            .with_context(|| format!("Error recycling app pool {} on server: {}", app_pool, server))?;
        Ok(())
    }
}

/// Quote a value as a powershell single quoted string.
/// Inside single quotes, only a single quote needs escaping, which is done by doubling it.
pub fn quote_powershell(value: &str) -> String
{
    format!("'{}'", value.replace('\'', "''"))
}

/// Escape a value for a single quoted WQL string.
pub fn escape_wql_string(value: &str) -> String
{
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Escape a value for a single quoted WQL LIKE pattern.
/// The LIKE wildcards `%`, `_` and `[` are made literal by putting them in brackets.
pub fn escape_wql_like(value: &str) -> String
{
    escape_wql_string(value).chars()
        .map(|character| match character {
            '%' | '_' | '[' => format!("[{}]", character),
            _ => character.to_string(),
        })
        .collect()
}

/// Parse the `ConvertTo-Json` output of the process query.
/// No processes found means no output at all.
pub fn parse_process_query(
    json_data: &str,
) -> Result<Vec<ProcessSample>>
{
    if json_data.trim().is_empty() {
        return Ok(Vec::new());
    }
    let output: ProcessQueryOutput = serde_json::from_str(json_data.trim())
        .with_context(|| format!("Invalid process query data: {}", json_data.trim()))?;
    Ok(match output {
        ProcessQueryOutput::Many(processes) => processes,
        ProcessQueryOutput::One(process) => vec![process],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_parse_process_query_array() {
        let json = r#"[{"CommandLine":"c:\\windows\\system32\\inetsrv\\w3wp.exe -ap \"DefaultAppPool\" -v \"v4.0\"","WorkingSetSize":"104857600"},{"CommandLine":"c:\\windows\\system32\\inetsrv\\w3wp.exe -ap \"DefaultAppPool\" -v \"v4.0\"","WorkingSetSize":"20971520"}]"#;
        let processes = parse_process_query(json).unwrap();
        assert_eq!(processes.len(), 2);
        assert_eq!(processes[0].working_set_size.as_deref(), Some("104857600"));
        assert_eq!(processes[1].working_set_size.as_deref(), Some("20971520"));
    }
    #[test]
    fn unit_parse_process_query_single_object() {
        let json = "{\"CommandLine\":\"w3wp.exe -ap \\\"Intranet\\\"\",\"WorkingSetSize\":\"4096\"}\r\n";
        let processes = parse_process_query(json).unwrap();
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].command_line.as_deref(), Some("w3wp.exe -ap \"Intranet\""));
    }
    #[test]
    fn unit_parse_process_query_null_command_line() {
        // processes of other users can have an empty command line.
        let json = r#"[{"CommandLine":null,"WorkingSetSize":"4096"}]"#;
        let processes = parse_process_query(json).unwrap();
        assert_eq!(processes[0].command_line, None);
    }
    #[test]
    fn unit_parse_process_query_no_output() {
        assert!(parse_process_query("").unwrap().is_empty());
        assert!(parse_process_query("  \r\n").unwrap().is_empty());
    }
    #[test]
    fn unit_parse_process_query_invalid() {
        assert!(parse_process_query("Get-CimInstance : Access is denied.").is_err());
    }
    #[test]
    fn unit_quote_powershell() {
        assert_eq!(quote_powershell("web01"), "'web01'");
        assert_eq!(quote_powershell("O'Brien pool"), "'O''Brien pool'");
    }
    #[test]
    fn unit_recycle_script() {
        let script = PowerShellRemote::recycle_script("web01", "DefaultAppPool");
        assert!(script.starts_with("Invoke-Command -ComputerName 'web01' -ArgumentList 'DefaultAppPool'"));
        assert!(script.contains("Restart-WebAppPool -Name $pool"));
    }
    #[test]
    fn unit_process_query_script_all_workers() {
        let script = PowerShellRemote::process_query_script("web01", None);
        assert!(script.starts_with("Get-CimInstance -ComputerName 'web01' -ClassName Win32_Process -Filter 'Name = ''w3wp.exe''' | Select-Object"));
        assert!(script.ends_with("ConvertTo-Json -Compress"));
    }
    #[test]
    fn unit_process_query_script_app_pool_is_quoted_and_escaped() {
        let script = PowerShellRemote::process_query_script("web01", Some("Intranet_v2[test]"));
        assert!(script.contains(r#"-Filter 'Name = ''w3wp.exe'' AND CommandLine LIKE ''%"Intranet[_]v2[[]test]"%'''"#));
    }
    #[test]
    fn unit_escape_wql() {
        assert_eq!(escape_wql_string(r"O'Brien\pool"), r"O\'Brien\\pool");
        assert_eq!(escape_wql_like("100%_done"), "100[%][_]done");
        assert_eq!(escape_wql_like("DefaultAppPool"), "DefaultAppPool");
    }
}
