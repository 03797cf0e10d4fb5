// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Provides the desired gRPC server configuration
//!
//! With YAML configuration:
//!
//! ```
//! use grpcconf::configuration::{Configuration, YAMLConfiguration};
//! # #[path = "doctest.rs"]
//! # mod doctest;
//! # let tmpfile = doctest::generate_example_yaml();
//! # let filepath = tmpfile.path();
//! use std::fs::File;
//!
//! let mut yaml_config = YAMLConfiguration::new();
//! yaml_config.read(File::open(filepath)?)?;
//! let grpc_config = yaml_config.get_grpc_config()?;
//! assert_eq!(grpc_config.servers[0].name, "server1");
//! # Ok::<(), anyhow::Error>(())
//! ```
use crate::parser::{RpcStats, ServerBrief, ServerDetail, TelemetrySummary};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;

/// Keyword of the CLI block holding the gRPC configuration
pub const DEFAULT_SERVICE: &str = "grpc";

/// Desired state of one gRPC server instance
///
/// Every field that is unset (`None`, `false` or empty) is skipped
/// when synthesizing the configuration delta.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSpec {
    /// Name of the server, e.g. `server1`
    pub name: String,

    /// Listening port, `None` or 0 to skip
    pub port: Option<u16>,

    /// Services to enable (e.g. `GNMI`, `GNOI`)
    ///
    /// Kept as opaque tokens, the device decides what is valid.
    pub services: Vec<String>,

    /// TLS mode, e.g. `disable` or `tls-mutual`
    pub tls: Option<String>,

    /// SSL profile ID used for TLS
    pub ssl_profile_id: Option<String>,

    /// Enable certificate authentication
    pub certificate_authentication: bool,

    /// Enable metadata authentication
    pub metadata_authentication: bool,

    /// VRF the server listens in
    pub vrf: Option<String>,

    /// Listen addresses
    pub listen_addresses: Vec<String>,

    /// Address family, e.g. `ipv4`
    pub address_family: Option<String>,

    /// DSCP value (0-63)
    pub dscp: Option<u8>,

    /// Keepalive time in seconds
    pub keepalive_time: Option<u32>,

    /// Keepalive timeout in seconds
    pub keepalive_timeout: Option<u32>,

    /// Enable local (Unix socket) connections
    pub local_connection: bool,

    /// Disable remote (TCP) connections
    pub disable_remote_connection: bool,

    /// Maximum number of concurrent streams
    pub max_concurrent_streams: Option<u32>,

    /// Maximum number of concurrent requests per user
    pub max_requests_per_user: Option<u32>,

    /// Maximum number of concurrent requests in total
    pub max_requests_total: Option<u32>,

    /// Configuration groups to apply
    pub apply_groups: Vec<String>,

    /// Disable the server
    pub disable: bool,

    /// Remove the whole server, all other fields are ignored
    pub delete_server: bool,
}

/// Request to remove parts of a server configuration
///
/// Each field carries the value that was originally applied since the
/// removal directive has to echo it (e.g. `no port 56666`).
/// If `delete_server` is set, every other field is ignored.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnconfigRequest {
    /// Name of the server
    pub server_name: String,

    /// Remove the whole server
    pub delete_server: bool,

    /// Remove the given port
    pub delete_port: Option<u16>,

    /// Remove the given services
    pub delete_services: Vec<String>,

    /// Remove the keepalive time
    pub delete_keepalive_time: bool,

    /// Remove the keepalive timeout
    pub delete_keepalive_timeout: bool,

    /// Remove the given listen address
    pub delete_listen_address: Option<String>,

    /// Remove the given VRF
    pub delete_vrf: Option<String>,

    /// Remove local-connection
    pub delete_local_connection: bool,

    /// Remove remote-connection disable
    pub delete_remote_connection: bool,

    /// Remove tls disable
    pub delete_tls_disable: bool,

    /// Remove the given SSL profile ID
    pub delete_ssl_profile_id: Option<String>,
}

/// Settings at the root of the gRPC block, outside of any server
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RootSettings {
    /// Listen addresses of the default server
    pub listen_addresses: Vec<String>,
    /// SSL profile ID
    pub ssl_profile_id: Option<String>,
    /// Certificate ID
    pub certificate_id: Option<String>,
    /// Address families, e.g. `ipv4` and `ipv6`
    pub address_families: Vec<String>,
    /// AAA authentication login method list
    pub aaa_authentication_login: Option<String>,
    /// AAA authorization exec method list
    pub aaa_authorization_exec: Option<String>,
    /// AAA accounting queue size
    pub aaa_accounting_queue_size: Option<u32>,
    /// DSCP marking, e.g. `cs3`
    pub dscp: Option<String>,
    /// TTL of gRPC packets
    pub ttl: Option<u8>,
    /// VRF
    pub vrf: Option<String>,
    /// Minimum TLS version
    pub tls_min_version: Option<String>,
    /// Maximum TLS version
    pub tls_max_version: Option<String>,
    /// TLS trustpoint
    pub tls_trustpoint: Option<String>,
    /// Keepalive time in seconds
    pub keepalive_time: Option<u32>,
    /// Keepalive timeout in seconds
    pub keepalive_timeout: Option<u32>,
    /// Minimum keepalive interval in seconds
    pub min_keepalive_interval: Option<u32>,
    /// Maximum concurrent streams
    pub max_concurrent_streams: Option<u32>,
    /// Maximum concurrent requests per user
    pub max_requests_per_user: Option<u32>,
    /// Maximum concurrent requests in total
    pub max_requests_total: Option<u32>,
    /// Maximum number of streaming RPCs
    pub max_streams: Option<u32>,
    /// Maximum number of streaming RPCs per user
    pub max_streams_per_user: Option<u32>,
    /// Soft memory limit in MB
    pub memory_limit: Option<u32>,
    /// Port of the gNMI service
    pub gnmi_port: Option<u16>,
    /// Port of the gRIBI service
    pub gribi_port: Option<u16>,
    /// Port of the P4RT service
    pub p4rt_port: Option<u16>,
}

/// Complete desired configuration of the gRPC block
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrpcConfig {
    /// Keyword of the block
    pub service: String,

    /// Remove the complete block, all other fields are ignored
    pub delete_block: bool,

    /// Settings outside of any server
    pub root: Option<RootSettings>,

    /// Servers
    pub servers: Vec<ServerSpec>,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_owned(),
            delete_block: false,
            root: None,
            servers: vec![],
        }
    }
}

/// If a record is expected to be reported by the device
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// The record must exist and match
    #[default]
    Present,

    /// The device must report the record as not existing
    Absent,
}

/// Expected read-back state of one server
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerExpectation {
    /// If the server is expected to exist at all
    pub presence: Presence,

    /// Expected brief listing
    pub brief: Option<ServerBrief>,

    /// Expected detail block
    pub detail: Option<ServerDetail>,

    /// Expected statistics per RPC path
    pub stats: Option<BTreeMap<String, RpcStats>>,
}

/// Defines how to request the configuration
#[cfg_attr(test, automock)]
pub trait Configuration {
    /// Get the desired configuration of the gRPC block
    ///
    /// # Errors
    ///
    /// Will return `Err` if there is a general problem reading the configuration.
    fn get_grpc_config(&mut self) -> Result<GrpcConfig>;

    /// Get all removal requests
    ///
    /// # Errors
    ///
    /// Will return `Err` if there is a general problem reading the configuration.
    fn get_unconfig_requests(&mut self) -> Result<Vec<UnconfigRequest>>;

    /// Get the expected read-back state of all servers
    ///
    /// # Errors
    ///
    /// Will return `Err` if there is a general problem reading the configuration.
    fn get_expectations(&mut self) -> Result<BTreeMap<String, ServerExpectation>>;

    /// Get the expected read-back state for the given `server_name`
    ///
    /// # Errors
    ///
    /// Will return `Err` if there is a general problem reading the configuration.
    fn get_expectation(&mut self, server_name: &str) -> Result<Option<ServerExpectation>>;

    /// Get the expected telemetry summary
    ///
    /// # Errors
    ///
    /// Will return `Err` if there is a general problem reading the configuration.
    fn get_telemetry_expectation(&mut self) -> Result<Option<TelemetrySummary>>;
}

mod yaml;
pub use yaml::YAMLConfiguration;
