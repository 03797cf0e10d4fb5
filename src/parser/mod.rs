// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Parse the output of diagnostic show commands into structured records
//!
//! Every parser is a pure function of the text it is given. Records that are
//! simply not present in the text are reported as absent (or left at their
//! zero value), only malformed input results in an error.

pub use brief::{parse_brief, ServerBrief};
pub use detail::{parse_detail, ServerDetail};
pub use process::parse_respawn_count;
pub use stats::{parse_stats, RpcStats, ServerStats};
pub use telemetry::{parse_telemetry_summary, TelemetrySummary};

mod brief;
mod detail;
mod process;
mod stats;
mod telemetry;

/// Extract the count from a `Label : <count>` line
///
/// The count is the first token after the last colon.
/// Everything that is not a number yields 0.
///
/// ```
/// use grpcconf::parser::extract_int;
///
/// assert_eq!(extract_int("Requests : 12"), 12);
/// assert_eq!(extract_int("Error Responses : 3 (since 10:42)"), 0);
/// assert_eq!(extract_int("Responses : 7 total"), 7);
/// assert_eq!(extract_int("Responses"), 0);
/// ```
#[must_use]
pub fn extract_int(line: &str) -> u64 {
    line.rsplit_once(':')
        .and_then(|(_, value)| value.split_whitespace().next())
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}

/// Split a list value on whitespace and commas
fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
