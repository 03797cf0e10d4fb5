// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Parse the key-value detail block of a server

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static LABELED_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?m)^(Server name|Port|Keepalive time|Keepalive timeout|DSCP|Enabled|Services|Listen addresses)",
        r"\s*:\s*(.*)$"
    ))
    .expect("Invalid detail label regex")
});

/// One server as reported by the detail block
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerDetail {
    /// Name of the server
    pub name: String,

    /// Listening port
    pub port: u16,

    /// Services
    pub services: Vec<String>,

    /// If the server is enabled
    pub enabled: bool,

    /// Keepalive time in seconds
    pub keepalive_time: u32,

    /// Keepalive timeout in seconds
    pub keepalive_timeout: u32,

    /// Listen addresses
    pub listen_addresses: Vec<String>,

    /// DSCP value
    pub dscp: u8,
}

/// Parse a detail block
///
/// Values are looked up by label anywhere in the text, the first occurrence
/// of a label wins. Missing labels and unparsable numbers yield zero values.
///
/// ```
/// use grpcconf::parser::parse_detail;
///
/// let detail = parse_detail("Server name : server1\nPort : 56666\nEnabled : yes\n");
/// assert_eq!(detail.name, "server1");
/// assert_eq!(detail.port, 56666);
/// assert!(detail.enabled);
/// assert_eq!(detail.dscp, 0);
/// ```
#[must_use]
pub fn parse_detail(text: &str) -> ServerDetail {
    let mut values = BTreeMap::new();
    for captures in LABELED_VALUE.captures_iter(text) {
        if let (Some(label), Some(value)) = (captures.get(1), captures.get(2)) {
            values
                .entry(label.as_str())
                .or_insert_with(|| value.as_str().trim());
        }
    }

    let value = |label: &str| values.get(label).copied().unwrap_or_default();

    ServerDetail {
        name: value("Server name").to_owned(),
        port: value("Port").parse().unwrap_or_default(),
        services: super::split_list(value("Services")),
        enabled: value("Enabled").eq_ignore_ascii_case("yes"),
        keepalive_time: value("Keepalive time").parse().unwrap_or_default(),
        keepalive_timeout: value("Keepalive timeout").parse().unwrap_or_default(),
        listen_addresses: super::split_list(value("Listen addresses")),
        dscp: value("DSCP").parse().unwrap_or_default(),
    }
}
