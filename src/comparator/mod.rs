// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Compare observed records against expected ones
//!
//! ```
//! use grpcconf::comparator::{field_matches, set_equals};
//!
//! assert!(field_matches(&56666, &56666, true));
//! assert!(field_matches(&"Di", &"En", false));
//! assert!(set_equals(&["GNMI", "GNOI"], &["GNOI", "GNMI"]));
//! assert!(!set_equals(&["GNMI", "GNMI"], &["GNMI"]));
//! ```

use crate::parser::{RpcStats, ServerBrief, ServerDetail, TelemetrySummary};
use flagset::{flags, FlagSet};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

/// Check a single field
///
/// Succeeds if `got` equals `want` and a match is wanted
/// or if they differ and a difference is wanted.
#[must_use]
pub fn field_matches<T: PartialEq + ?Sized>(got: &T, want: &T, want_match: bool) -> bool {
    (got == want) == want_match
}

/// Multiset equality, i.e. independent of order but not of duplicates
#[must_use]
pub fn set_equals<S: AsRef<str>>(a: &[S], b: &[S]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in a {
        *counts.entry(item.as_ref()).or_default() += 1;
    }

    for item in b {
        match counts.get_mut(item.as_ref()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }

    counts.values().all(|count| *count == 0)
}

/// Outcome of comparing one field
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FieldComparison {
    /// Name of the field
    pub field: String,

    /// Observed value
    pub got: String,

    /// Expected value
    pub want: String,

    /// If the field matches the expectation
    pub matched: bool,
}

impl FieldComparison {
    fn scalar<T: PartialEq + Debug + ?Sized>(field: &str, got: &T, want: &T) -> Self {
        Self {
            field: field.to_owned(),
            got: format!("{got:?}"),
            want: format!("{want:?}"),
            matched: field_matches(got, want, true),
        }
    }

    fn set(field: &str, got: &[String], want: &[String]) -> Self {
        Self {
            field: field.to_owned(),
            got: format!("{got:?}"),
            want: format!("{want:?}"),
            matched: set_equals(got, want),
        }
    }
}

/// Only the comparisons that did not match
#[must_use]
pub fn mismatches(comparisons: &[FieldComparison]) -> Vec<&FieldComparison> {
    comparisons.iter().filter(|c| !c.matched).collect()
}

/// Compare a brief listing
///
/// The listen address is only compared if it is expected to be non-empty.
#[must_use]
pub fn compare_brief(got: &ServerBrief, want: &ServerBrief) -> Vec<FieldComparison> {
    let mut comparisons = vec![
        FieldComparison::scalar("Name", &got.name, &want.name),
        FieldComparison::scalar("Status", &got.status, &want.status),
        FieldComparison::scalar("TLS", &got.tls, &want.tls),
        FieldComparison::scalar("Port", &got.port, &want.port),
        FieldComparison::scalar("VRF", &got.vrf, &want.vrf),
        FieldComparison::set("Services", &got.services, &want.services),
    ];

    if !want.listen_address.is_empty() {
        comparisons.push(FieldComparison::scalar(
            "ListenAddress",
            &got.listen_address,
            &want.listen_address,
        ));
    }

    comparisons
}

/// Compare a detail block
#[must_use]
pub fn compare_detail(got: &ServerDetail, want: &ServerDetail) -> Vec<FieldComparison> {
    vec![
        FieldComparison::scalar("Server name", &got.name, &want.name),
        FieldComparison::scalar("Port", &got.port, &want.port),
        FieldComparison::set("Services", &got.services, &want.services),
        FieldComparison::scalar("Enabled", &got.enabled, &want.enabled),
        FieldComparison::scalar("KeepaliveTime", &got.keepalive_time, &want.keepalive_time),
        FieldComparison::scalar(
            "KeepaliveTimeout",
            &got.keepalive_timeout,
            &want.keepalive_timeout,
        ),
        FieldComparison::set(
            "ListenAddresses",
            &got.listen_addresses,
            &want.listen_addresses,
        ),
        FieldComparison::scalar("DSCP", &got.dscp, &want.dscp),
    ]
}

/// Compare the statistics of the expected RPC paths
///
/// Paths that are observed but not expected are not compared.
#[must_use]
pub fn compare_stats(
    got: &BTreeMap<String, RpcStats>,
    want: &BTreeMap<String, RpcStats>,
) -> Vec<FieldComparison> {
    let mut comparisons = vec![];

    for (path, want_rpc) in want {
        let Some(got_rpc) = got.get(path) else {
            comparisons.push(FieldComparison {
                field: path.clone(),
                got: "missing".to_owned(),
                want: format!("{want_rpc:?}"),
                matched: false,
            });
            continue;
        };

        comparisons.extend([
            FieldComparison::scalar(
                &format!("{path} Requests"),
                &got_rpc.requests,
                &want_rpc.requests,
            ),
            FieldComparison::scalar(
                &format!("{path} Responses"),
                &got_rpc.responses,
                &want_rpc.responses,
            ),
            FieldComparison::scalar(
                &format!("{path} ErrorResponses"),
                &got_rpc.error_responses,
                &want_rpc.error_responses,
            ),
        ]);
    }

    comparisons
}

/// Compare the telemetry summary counter by counter
#[must_use]
pub fn compare_telemetry(got: &TelemetrySummary, want: &TelemetrySummary) -> Vec<FieldComparison> {
    let counters: [(&str, u64, u64); 20] = [
        ("Subscriptions", got.subscriptions, want.subscriptions),
        (
            "SubscriptionsActive",
            got.subscriptions_active,
            want.subscriptions_active,
        ),
        (
            "SubscriptionsPaused",
            got.subscriptions_paused,
            want.subscriptions_paused,
        ),
        (
            "DestinationGroups",
            got.destination_groups,
            want.destination_groups,
        ),
        (
            "GrpcTLSDestinations",
            got.grpc_tls_destinations,
            want.grpc_tls_destinations,
        ),
        (
            "GrpcNonTLSDestinations",
            got.grpc_nontls_destinations,
            want.grpc_nontls_destinations,
        ),
        ("TCPDestinations", got.tcp_destinations, want.tcp_destinations),
        ("UDPDestinations", got.udp_destinations, want.udp_destinations),
        ("DialinCount", got.dialin_count, want.dialin_count),
        ("DialinActive", got.dialin_active, want.dialin_active),
        ("DialinSessions", got.dialin_sessions, want.dialin_sessions),
        (
            "DialinConnecting",
            got.dialin_connecting,
            want.dialin_connecting,
        ),
        ("DialoutCount", got.dialout_count, want.dialout_count),
        ("DialoutActive", got.dialout_active, want.dialout_active),
        ("DialoutSessions", got.dialout_sessions, want.dialout_sessions),
        (
            "DialoutConnecting",
            got.dialout_connecting,
            want.dialout_connecting,
        ),
        ("SensorGroups", got.sensor_groups, want.sensor_groups),
        (
            "SensorPathsTotal",
            got.sensor_paths_total,
            want.sensor_paths_total,
        ),
        (
            "SensorPathsActive",
            got.sensor_paths_active,
            want.sensor_paths_active,
        ),
        (
            "SensorPathsNotResolved",
            got.sensor_paths_not_resolved,
            want.sensor_paths_not_resolved,
        ),
    ];

    counters
        .iter()
        .map(|(field, got_count, want_count)| FieldComparison::scalar(field, got_count, want_count))
        .collect()
}

flags! {
    /// RPCs that can be issued against a server
    pub enum Rpc: u8 {
        /// gNMI Set
        GnmiSet,

        /// gNMI Subscribe
        GnmiSubscribe,

        /// gNOI System.Time
        GnoiSystemTime,

        /// gNSI Authz Rotate
        GnsiAuthzRotate,

        /// gNSI Authz Get
        GnsiAuthzGet,

        /// gRIBI Modify
        GribiModify,

        /// gRIBI Get
        GribiGet,

        /// P4RT arbitration
        P4rt,
    }
}

/// Set of RPCs expected to succeed
pub type ExpectedRpcs = FlagSet<Rpc>;

/// RPCs expected to succeed against a server offering the given services
///
/// Unknown services do not contribute any RPC.
///
/// ```
/// use grpcconf::comparator::{expected_rpcs, Rpc};
///
/// let rpcs = expected_rpcs(&["GNMI", "cNMI"]);
/// assert!(rpcs.contains(Rpc::GnmiSet | Rpc::GnmiSubscribe));
/// assert!(!rpcs.contains(Rpc::P4rt));
/// ```
#[must_use]
pub fn expected_rpcs<S: AsRef<str>>(services: &[S]) -> ExpectedRpcs {
    services
        .iter()
        .fold(ExpectedRpcs::default(), |rpcs, service| {
            rpcs | match service.as_ref() {
                "GNMI" => Rpc::GnmiSet | Rpc::GnmiSubscribe,
                "GNOI" => Rpc::GnoiSystemTime.into(),
                "GNSI" => Rpc::GnsiAuthzRotate | Rpc::GnsiAuthzGet,
                "GRIBI" => Rpc::GribiModify | Rpc::GribiGet,
                "P4RT" => Rpc::P4rt.into(),
                _ => ExpectedRpcs::default(),
            }
        })
}
