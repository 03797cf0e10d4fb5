// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Parse the per-RPC statistics of a server

use super::extract_int;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters of one RPC
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcStats {
    /// Number of requests
    pub requests: u64,

    /// Number of responses
    pub responses: u64,

    /// Number of error responses
    pub error_responses: u64,
}

/// Statistics of one server
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    /// Name of the server the statistics were requested for
    pub server_name: String,

    /// Counters keyed by RPC path, e.g. `/gnmi.gNMI/Set`
    pub rpc_stats_by_path: BTreeMap<String, RpcStats>,
}

/// Parse the statistics block of `server_name`
///
/// Every line starting with `/` opens the record of a new RPC path.
/// Counter lines before the first path are ignored.
///
/// ```
/// use grpcconf::parser::{parse_stats, RpcStats};
///
/// let stats = parse_stats(
///     "/gnmi.gNMI/Set\nRequests : 1\nResponses : 1\nError Responses : 0\n",
///     "server1",
/// );
/// assert_eq!(
///     stats.rpc_stats_by_path["/gnmi.gNMI/Set"],
///     RpcStats { requests: 1, responses: 1, error_responses: 0 }
/// );
/// ```
#[must_use]
pub fn parse_stats(text: &str, server_name: &str) -> ServerStats {
    let mut stats = ServerStats {
        server_name: server_name.to_owned(),
        rpc_stats_by_path: BTreeMap::new(),
    };

    let mut current: Option<(&str, RpcStats)> = None;

    for line in text.lines().map(str::trim) {
        if line.starts_with('/') {
            if let Some((path, rpc)) = current.replace((line, RpcStats::default())) {
                stats.rpc_stats_by_path.insert(path.to_owned(), rpc);
            }
            continue;
        }

        let Some((_, rpc)) = current.as_mut() else {
            continue;
        };

        if line.starts_with("Requests") {
            rpc.requests = extract_int(line);
        } else if line.starts_with("Responses") {
            rpc.responses = extract_int(line);
        } else if line.starts_with("Error Responses") {
            rpc.error_responses = extract_int(line);
        }
    }

    if let Some((path, rpc)) = current {
        stats.rpc_stats_by_path.insert(path.to_owned(), rpc);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_paths() {
        let text = concat!(
            "Statistics for server1\n",
            "Requests : 99\n",
            "/gnmi.gNMI/Set\n",
            "  Requests        : 4\n",
            "  Responses       : 3\n",
            "  Error Responses : 1\n",
            "/gnoi.system.System/Time\n",
            "  Requests        : 2 (last: 5)\n",
            "  Responses       : 2\n",
        );

        let stats = parse_stats(text, "server1");
        assert_eq!(stats.server_name, "server1");
        assert_eq!(stats.rpc_stats_by_path.len(), 2);
        assert_eq!(
            stats.rpc_stats_by_path["/gnmi.gNMI/Set"],
            RpcStats {
                requests: 4,
                responses: 3,
                error_responses: 1
            }
        );
        assert_eq!(
            stats.rpc_stats_by_path["/gnoi.system.System/Time"],
            RpcStats {
                requests: 0,
                responses: 2,
                error_responses: 0
            }
        );
    }

    #[test]
    fn test_path_without_counters() {
        let stats = parse_stats("/gribi.gRIBI/Get\n", "server1");
        assert_eq!(
            stats.rpc_stats_by_path["/gribi.gRIBI/Get"],
            RpcStats::default()
        );
    }

    #[test]
    fn test_no_paths() {
        let stats = parse_stats("No statistics found for server 'server1'", "server1");
        assert!(stats.rpc_stats_by_path.is_empty());
    }
}
