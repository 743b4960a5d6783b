//! The impls and functions
//!
use std::{fs, path::Path};
use log::*;
use anyhow::{bail, Context, Result};
use crate::hosts::HostList;

impl HostList {
    /// Read all the servers from the host file.
    pub fn read_host_file(
        host_file: &Path,
    ) -> Result<HostList>
    {
        info!("read host file: {}", host_file.display());
        if !host_file.exists() {
            bail!("Host file not found: {}", host_file.display());
        }
        let bytes = fs::read(host_file)
            .with_context(|| format!("Error reading host file: {}", host_file.display()))?;
        let contents = decode_host_file(&bytes)
            .with_context(|| format!("Error reading host file: {}", host_file.display()))?;

        let hostlist = HostList::parse_hosts(&contents);
        if hostlist.hosts.is_empty() {
            bail!("No servers found in host file: {}", host_file.display());
        }
        debug!("servers in host file: {:?}", hostlist.hosts);
        Ok(hostlist)
    }
    fn parse_hosts(
        contents: &str,
    ) -> HostList
    {
        HostList {
            hosts: contents.lines()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(|line| line.to_string())
                .collect(),
        }
    }
    /// The first server in the host file is the reference server.
    pub fn reference_server(&self) -> Option<&str>
    {
        self.hosts.first().map(|host| host.as_str())
    }
}

/// Turn the host file bytes into text.
///
/// Notepad and powershell on windows write UTF-8 with a byte order mark,
/// and `Out-File` in windows powershell 5.1 writes UTF-16LE with a byte order mark.
/// The byte order mark is removed, so it doesn't end up in the first server name or comment.
pub fn decode_host_file(
    bytes: &[u8],
) -> Result<String>
{
    let contents = match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes)?,
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes)?,
        _ => String::from_utf8(bytes.to_vec())
            .with_context(|| "Host file encoding is not UTF-8 or UTF-16 with a byte order mark")?,
    };
    Ok(contents.strip_prefix('\u{feff}').map(|contents| contents.to_string()).unwrap_or(contents))
}

fn decode_utf16(
    bytes: &[u8],
    to_u16: fn([u8; 2]) -> u16,
) -> Result<String>
{
    if bytes.len() % 2 != 0 {
        bail!("Host file is UTF-16, but has an odd number of bytes");
    }
    let units: Vec<u16> = bytes.chunks_exact(2)
        .map(|pair| to_u16([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .with_context(|| "Host file is UTF-16, but contains invalid characters")
}

/// Read the host file and return the first server.
/// This reads the file every time it is called.
pub fn get_first_server_in_hosts_file(
    host_file: &Path,
) -> Result<String>
{
    let hostlist = HostList::read_host_file(host_file)?;
    hostlist.reference_server()
        .map(|server| server.to_string())
        .with_context(|| format!("No servers found in host file: {}", host_file.display()))
}
