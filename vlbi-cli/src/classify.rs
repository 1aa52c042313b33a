use std::error::Error;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;

use clap::Args;
use vlbi_datastream::{DatastreamRegistry, VdifKey};

#[derive(Args)]
pub struct ClassifyArgs {
    /// Newline-delimited datastream rules: `name_pattern = criterion [criterion...]`
    rules_file: PathBuf,

    /// Keys to classify, each `ip:port/station.thread`
    #[arg(required = true)]
    keys: Vec<String>,
}

/// Parse one rules-file line of the form `name_pattern = crit1 crit2 ...`.
fn parse_rule_line(line: &str) -> Option<(String, Vec<String>)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (name, rest) = line.split_once('=')?;
    let criteria = rest.split_whitespace().map(str::to_string).collect();
    Some((name.trim().to_string(), criteria))
}

fn parse_key(text: &str) -> Result<VdifKey, String> {
    let (origin_part, rest) = text.split_once('/').ok_or("missing '/' separating origin from station.thread")?;
    let (ip_str, port_str) = origin_part.split_once(':').ok_or("missing ':' separating ip from port")?;
    let ip: Ipv4Addr = ip_str.parse().map_err(|e| format!("bad ip address: {e}"))?;
    let port: u16 = port_str.parse().map_err(|e| format!("bad port: {e}"))?;
    let origin = SocketAddrV4::new(ip, port);

    let (station_str, thread_str) = rest.split_once('.').ok_or("missing '.' separating station from thread")?;
    let thread_id: u16 = thread_str.parse().map_err(|e| format!("bad thread id: {e}"))?;

    if let Some(hex) = station_str.strip_prefix("0x") {
        let station_id = u16::from_str_radix(hex, 16).map_err(|e| format!("bad hex station: {e}"))?;
        return Ok(VdifKey::numeric(station_id, thread_id, origin));
    }
    if let Ok(station_id) = station_str.parse::<u16>() {
        return Ok(VdifKey::numeric(station_id, thread_id, origin));
    }
    VdifKey::coded(station_str, thread_id, origin).map_err(|e| e.to_string())
}

pub fn run(args: &ClassifyArgs) -> Result<(), Box<dyn Error>> {
    let contents = std::fs::read_to_string(&args.rules_file)?;
    let mut registry = DatastreamRegistry::new();
    for line in contents.lines() {
        if let Some((name_pattern, criteria)) = parse_rule_line(line) {
            registry.define(&name_pattern, &criteria)?;
        }
    }

    for key_text in &args.keys {
        match parse_key(key_text) {
            Ok(key) => match registry.classify(key) {
                Ok(id) => println!("{key_text} -> {}", registry.streamid2name(id)),
                Err(e) => println!("{key_text} -> error: {e}"),
            },
            Err(e) => println!("{key_text} -> parse error: {e}"),
        }
    }

    Ok(())
}
