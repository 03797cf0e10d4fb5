// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Parse the model-driven telemetry summary

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Counters of the telemetry summary
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySummary {
    /// Total number of subscriptions
    pub subscriptions: u64,
    /// Active subscriptions
    pub subscriptions_active: u64,
    /// Paused subscriptions
    pub subscriptions_paused: u64,
    /// Total number of destination groups
    pub destination_groups: u64,
    /// gRPC destinations with TLS
    pub grpc_tls_destinations: u64,
    /// gRPC destinations without TLS
    pub grpc_nontls_destinations: u64,
    /// TCP destinations
    pub tcp_destinations: u64,
    /// UDP destinations
    pub udp_destinations: u64,
    /// Dial-in subscriptions
    pub dialin_count: u64,
    /// Active dial-in subscriptions
    pub dialin_active: u64,
    /// Dial-in sessions
    pub dialin_sessions: u64,
    /// Connecting dial-in sessions
    pub dialin_connecting: u64,
    /// Dial-out subscriptions
    pub dialout_count: u64,
    /// Active dial-out subscriptions
    pub dialout_active: u64,
    /// Dial-out sessions
    pub dialout_sessions: u64,
    /// Connecting dial-out sessions
    pub dialout_connecting: u64,
    /// Total number of sensor groups
    pub sensor_groups: u64,
    /// Total number of sensor paths
    pub sensor_paths_total: u64,
    /// Active sensor paths
    pub sensor_paths_active: u64,
    /// Sensor paths that could not be resolved
    pub sensor_paths_not_resolved: u64,
}

type Counters = fn(&mut TelemetrySummary) -> Vec<&mut u64>;

struct SummaryLine {
    prefix: &'static str,
    pattern: Regex,
    counters: Counters,
}

/// Each line is selected by its prefix and has to match its template,
/// `%d` standing for a count. The first matching prefix wins.
const TEMPLATES: [(&str, &str, Counters); 7] = [
    (
        "Subscriptions",
        "Subscriptions Total: %d Active: %d Paused: %d",
        |s| {
            vec![
                &mut s.subscriptions,
                &mut s.subscriptions_active,
                &mut s.subscriptions_paused,
            ]
        },
    ),
    (
        "Destination Groups",
        "Destination Groups Total: %d",
        |s| vec![&mut s.destination_groups],
    ),
    (
        "Destinations",
        "Destinations grpc-tls: %d grpc-nontls: %d tcp: %d udp: %d",
        |s| {
            vec![
                &mut s.grpc_tls_destinations,
                &mut s.grpc_nontls_destinations,
                &mut s.tcp_destinations,
                &mut s.udp_destinations,
            ]
        },
    ),
    (
        "dialin:",
        "dialin: %d Active: %d Sessions: %d Connecting: %d",
        |s| {
            vec![
                &mut s.dialin_count,
                &mut s.dialin_active,
                &mut s.dialin_sessions,
                &mut s.dialin_connecting,
            ]
        },
    ),
    (
        "dialout:",
        "dialout: %d Active: %d Sessions: %d Connecting: %d",
        |s| {
            vec![
                &mut s.dialout_count,
                &mut s.dialout_active,
                &mut s.dialout_sessions,
                &mut s.dialout_connecting,
            ]
        },
    ),
    (
        "Sensor Groups",
        "Sensor Groups Total: %d",
        |s| vec![&mut s.sensor_groups],
    ),
    (
        "Sensor Paths",
        "Sensor Paths Total: %d Active: %d Not Resolved: %d",
        |s| {
            vec![
                &mut s.sensor_paths_total,
                &mut s.sensor_paths_active,
                &mut s.sensor_paths_not_resolved,
            ]
        },
    ),
];

/// Translate a template into a regex anchored at the start of the line
///
/// Whitespace matches any amount of whitespace, trailing text is ignored.
fn template_pattern(template: &str) -> String {
    let mut pattern = String::from("^");
    for (i, word) in template.split_whitespace().enumerate() {
        if i > 0 {
            pattern.push_str(r"\s*");
        }
        pattern.push_str(&regex::escape(word).replace("%d", r"\s*(\d+)"));
    }
    pattern
}

static SUMMARY_LINES: Lazy<Vec<SummaryLine>> = Lazy::new(|| {
    TEMPLATES
        .iter()
        .map(|&(prefix, template, counters)| SummaryLine {
            prefix,
            pattern: Regex::new(&template_pattern(template))
                .expect("Invalid telemetry summary template"),
            counters,
        })
        .collect()
});

/// Parse the telemetry summary
///
/// Counters whose line is not part of the text stay zero.
///
/// ```
/// use grpcconf::parser::parse_telemetry_summary;
///
/// let summary = parse_telemetry_summary(concat!(
///     "Subscriptions Total: 2 Active: 1 Paused: 1\n",
///     "Sensor Groups Total: 3\n",
/// ))?;
/// assert_eq!(summary.subscriptions_active, 1);
/// assert_eq!(summary.sensor_groups, 3);
/// assert_eq!(summary.dialin_count, 0);
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Will return `Err` if a line starts like a summary line,
/// but does not match its template.
pub fn parse_telemetry_summary(text: &str) -> Result<TelemetrySummary> {
    let mut summary = TelemetrySummary::default();

    for line in text.lines().map(str::trim) {
        let Some(summary_line) = SUMMARY_LINES.iter().find(|l| line.starts_with(l.prefix)) else {
            continue;
        };

        let captures = summary_line
            .pattern
            .captures(line)
            .ok_or_else(|| anyhow!("malformed telemetry summary line: {line}"))?;

        let values = captures
            .iter()
            .skip(1)
            .map(|group| {
                group
                    .and_then(|m| m.as_str().parse::<u64>().ok())
                    .ok_or_else(|| anyhow!("malformed telemetry summary line: {line}"))
            })
            .collect::<Result<Vec<u64>>>()?;

        for (counter, value) in (summary_line.counters)(&mut summary).into_iter().zip(values) {
            *counter = value;
        }
    }

    Ok(summary)
}
