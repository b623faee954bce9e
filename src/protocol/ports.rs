//! Serial port discovery and selection

use crate::core::{Result, SerialConfig};
use crate::protocol::SerialSession;

/// Names of the serial ports present on this machine
pub fn available_ports() -> Result<Vec<String>> {
    let mut names: Vec<String> = serialport::available_ports()?
        .into_iter()
        .map(|port| port.port_name)
        .collect();
    names.sort();
    Ok(names)
}

/// Pick the port to open
///
/// Defaults to the last listed port, or to `preferred` if it is listed. The
/// candidate is probed once; if it cannot be opened the previous port in the
/// list is chosen instead, wrapping around to the last one.
pub fn choose_port<F>(ports: &[String], preferred: Option<&str>, mut probe: F) -> Option<String>
where
    F: FnMut(&str) -> bool,
{
    let last = ports.len().checked_sub(1)?;

    let mut index = preferred
        .and_then(|wanted| ports.iter().position(|p| p == wanted))
        .unwrap_or(last);

    if !probe(&ports[index]) {
        log::debug!("{} is busy, trying the previous port", ports[index]);
        index = index.checked_sub(1).unwrap_or(last);
    }

    Some(ports[index].clone())
}

/// Whether `name` can be opened right now
pub fn probe_port(name: &str, config: &SerialConfig) -> bool {
    SerialSession::open(name, config).is_ok()
}
