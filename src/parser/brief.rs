// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Parse the tabular brief listing of a server
//!
//! The listing consists of `|`-separated rows with the columns
//! name, status, listen address, port, TLS, services and VRF.
//! Long service lists wrap onto continuation rows that only carry
//! the services column.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

const MIN_CONTINUATION_FIELDS: usize = 6;

/// One server as reported by the brief listing
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerBrief {
    /// Name of the server
    pub name: String,

    /// Status, e.g. `En` or `Di`
    pub status: String,

    /// Listen address, e.g. `ANY`
    pub listen_address: String,

    /// Port as printed
    pub port: String,

    /// TLS mode, e.g. `En`, `Di` or `Mu`
    pub tls: String,

    /// Services, possibly collected from several rows
    pub services: Vec<String>,

    /// VRF
    pub vrf: String,
}

impl ServerBrief {
    /// Build the brief listing expected for a server
    ///
    /// The listen address is left empty and thereby not compared.
    #[must_use]
    pub fn expected(
        name: &str,
        status: &str,
        port: u16,
        tls: &str,
        services: &[&str],
        vrf: &str,
    ) -> Self {
        Self {
            name: name.to_owned(),
            status: status.to_owned(),
            listen_address: String::new(),
            port: port.to_string(),
            tls: tls.to_owned(),
            services: services.iter().map(|s| (*s).to_owned()).collect(),
            vrf: vrf.to_owned(),
        }
    }
}

fn is_separator(line: &str) -> bool {
    line.chars()
        .all(|c| matches!(c, '-' | '+' | '|') || c.is_whitespace())
}

fn fields(line: &str) -> Vec<&str> {
    line.split('|').map(str::trim).collect()
}

/// Parse the brief listing for the server `name`
///
/// A row whose name column equals `name` is preferred, otherwise the first
/// row containing `name` is taken. Returns `Ok(None)` if no row mentions the server.
///
/// ```
/// use grpcconf::parser::parse_brief;
///
/// let text = concat!(
///     "server1 | En | ANY | 56666 | En | GNMI GNOI | global-vrf\n",
///     "        |    |     |       |    | P4RT      |\n",
/// );
///
/// let brief = parse_brief(text, "server1")?.unwrap();
/// assert_eq!(brief.port, "56666");
/// assert_eq!(brief.services, vec!["GNMI", "GNOI", "P4RT"]);
///
/// assert!(parse_brief(text, "server2")?.is_none());
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Will return `Err` if the row of the server has too few columns.
pub fn parse_brief(text: &str, name: &str) -> Result<Option<ServerBrief>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    // a row named exactly like the server wins over rows only containing the name
    let Some(position) = lines
        .iter()
        .position(|line| line.split('|').next().map(str::trim) == Some(name))
        .or_else(|| {
            lines.iter().position(|line| {
                !line.is_empty() && !is_separator(line) && line.contains(name)
            })
        })
    else {
        return Ok(None);
    };

    let mut lines = lines.into_iter().skip(position);
    let Some(row) = lines.next() else {
        return Ok(None);
    };

    let (mut brief, services) = match fields(row).as_slice() {
        [server, status, listen_address, port, tls, services, vrf, ..] => (
            ServerBrief {
                name: (*server).to_owned(),
                status: (*status).to_owned(),
                listen_address: (*listen_address).to_owned(),
                port: (*port).to_owned(),
                tls: (*tls).to_owned(),
                services: vec![],
                vrf: (*vrf).to_owned(),
            },
            *services,
        ),
        _ => bail!("unexpected field count in brief row: {row}"),
    };
    brief.services.extend(super::split_list(services));

    for line in lines {
        if line.is_empty() || is_separator(line) {
            break;
        }

        let continuation = fields(line);
        if continuation.len() < MIN_CONTINUATION_FIELDS {
            break;
        }

        match continuation.as_slice() {
            ["", _, _, _, _, services, ..] => brief.services.extend(super::split_list(services)),
            _ => break,
        }
    }

    Ok(Some(brief))
}
