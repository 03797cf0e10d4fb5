// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Synthesize [`ConfigDelta`]s from the desired configuration
//!
//! The order in which the directives of a server are emitted is fixed,
//! since the rendered text is compared against the echo of the device.
//! It is therefore kept as data in [`SERVER_DIRECTIVES`] and [`SERVER_REMOVALS`]
//! rather than spread over the control flow.
//!
//! ```
//! use grpcconf::configuration::ServerSpec;
//! use grpcconf::renderer::render;
//! use grpcconf::synthesizer::synthesize_apply;
//!
//! let server = ServerSpec {
//!     name: "server1".to_owned(),
//!     port: Some(56666),
//!     services: vec!["GNMI".to_owned(), "GNOI".to_owned()],
//!     vrf: Some("global-vrf".to_owned()),
//!     ..ServerSpec::default()
//! };
//!
//! assert_eq!(
//!     render(&synthesize_apply(&[server])),
//!     "grpc\n server server1\n  port 56666\n  services GNMI\n  services GNOI\n  vrf global-vrf\n !\n"
//! );
//! ```

use crate::configuration::{GrpcConfig, RootSettings, ServerSpec, UnconfigRequest, DEFAULT_SERVICE};
use crate::delta::{ConfigDelta, SubBlock};
use std::fmt::Display;

/// Services that can only be removed as a whole at the root level
pub const BASE_LEVEL_REMOVALS: [&str; 3] = ["gnmi", "gribi", "p4rt"];

type ServerEmitter = fn(&ServerSpec) -> Vec<String>;

/// Directives of a server block in emission order
///
/// Each entry names the field and produces zero or more directives for it.
pub const SERVER_DIRECTIVES: &[(&str, ServerEmitter)] = &[
    ("disable", |s| flag(s.disable, "disable")),
    ("port", |s| keyed("port", s.port.filter(|p| *p != 0))),
    ("services", |s| each("services", &s.services)),
    ("tls", |s| keyed("tls", s.tls.as_deref())),
    ("ssl-profile-id", |s| {
        keyed("ssl-profile-id", s.ssl_profile_id.as_deref())
    }),
    ("certificate-authentication", |s| {
        flag(s.certificate_authentication, "certificate-authentication")
    }),
    ("metadata-authentication", |s| {
        flag(s.metadata_authentication, "metadata-authentication")
    }),
    ("vrf", |s| keyed("vrf", s.vrf.as_deref())),
    ("listen-addresses", |s| {
        each("listen-addresses", &s.listen_addresses)
    }),
    ("address-family", |s| {
        keyed("address-family", s.address_family.as_deref())
    }),
    ("dscp", |s| keyed("dscp", s.dscp)),
    ("keepalive time", |s| keyed("keepalive time", s.keepalive_time)),
    ("keepalive timeout", |s| {
        keyed("keepalive timeout", s.keepalive_timeout)
    }),
    ("local-connection", |s| {
        flag(s.local_connection, "local-connection")
    }),
    ("remote-connection", |s| {
        flag(s.disable_remote_connection, "remote-connection disable")
    }),
    ("max-concurrent-streams", |s| {
        keyed("max-concurrent-streams", s.max_concurrent_streams)
    }),
    ("max-request-per-user", |s| {
        keyed("max-request-per-user", s.max_requests_per_user)
    }),
    ("max-request-total", |s| {
        keyed("max-request-total", s.max_requests_total)
    }),
    ("apply-group", |s| each("apply-group", &s.apply_groups)),
];

/// How the removal of a field is spelled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalSyntax {
    /// `no <keyword> <value>`, echoing the applied value
    EchoValue,

    /// `no <keyword>`
    KeywordOnly,

    /// `no <keyword> <argument>` with a fixed argument
    Fixed(&'static str),
}

impl RemovalSyntax {
    /// Removal target (without `no`) of `keyword` with the applied `value`
    ///
    /// Returns `None` if the value to echo is blank.
    #[must_use]
    pub fn target(self, keyword: &str, value: &str) -> Option<String> {
        match self {
            Self::EchoValue => {
                let value = value.trim();
                (!value.is_empty()).then(|| format!("{keyword} {value}"))
            }
            Self::KeywordOnly => Some(keyword.to_owned()),
            Self::Fixed(argument) => Some(format!("{keyword} {argument}")),
        }
    }
}

type RemovalSelector = fn(&UnconfigRequest) -> Vec<String>;

/// Removals of a server block in emission order
///
/// Each entry lists the keyword, its removal syntax and the applied values
/// selected for removal by the request.
pub const SERVER_REMOVALS: &[(&str, RemovalSyntax, RemovalSelector)] = &[
    ("port", RemovalSyntax::EchoValue, |r| {
        optional(r.delete_port.filter(|p| *p != 0))
    }),
    ("services", RemovalSyntax::EchoValue, |r| {
        r.delete_services.clone()
    }),
    ("keepalive time", RemovalSyntax::KeywordOnly, |r| {
        selected(r.delete_keepalive_time)
    }),
    ("keepalive timeout", RemovalSyntax::KeywordOnly, |r| {
        selected(r.delete_keepalive_timeout)
    }),
    ("listen-address", RemovalSyntax::EchoValue, |r| {
        optional(r.delete_listen_address.as_deref())
    }),
    ("vrf", RemovalSyntax::EchoValue, |r| {
        optional(r.delete_vrf.as_deref())
    }),
    ("local-connection", RemovalSyntax::KeywordOnly, |r| {
        selected(r.delete_local_connection)
    }),
    ("remote-connection", RemovalSyntax::Fixed("disable"), |r| {
        selected(r.delete_remote_connection)
    }),
    ("tls", RemovalSyntax::Fixed("disable"), |r| {
        selected(r.delete_tls_disable)
    }),
    ("ssl-profile-id", RemovalSyntax::EchoValue, |r| {
        optional(r.delete_ssl_profile_id.as_deref())
    }),
];

type RootEmitter = fn(&RootSettings) -> Vec<String>;

/// Root-level directives in emission order
const ROOT_DIRECTIVES: &[RootEmitter] = &[
    |r| each("listen-addresses", &r.listen_addresses),
    |r| keyed("ssl-profile-id", r.ssl_profile_id.as_deref()),
    |r| keyed("certificate-id", r.certificate_id.as_deref()),
    |r| each("address-family", &r.address_families),
    |r| keyed("aaa authentication login", r.aaa_authentication_login.as_deref()),
    |r| keyed("aaa authorization exec", r.aaa_authorization_exec.as_deref()),
    |r| keyed("aaa accounting queue-size", r.aaa_accounting_queue_size),
    |r| keyed("dscp", r.dscp.as_deref()),
    |r| keyed("ttl", r.ttl),
    |r| keyed("vrf", r.vrf.as_deref()),
    |r| keyed("tls-min-version", r.tls_min_version.as_deref()),
    |r| keyed("tls-max-version", r.tls_max_version.as_deref()),
    |r| keyed("tls-trustpoint", r.tls_trustpoint.as_deref()),
    |r| keyed("keepalive time", r.keepalive_time),
    |r| keyed("keepalive timeout", r.keepalive_timeout),
    |r| keyed("min-keepalive-interval", r.min_keepalive_interval),
    |r| keyed("max-concurrent-streams", r.max_concurrent_streams),
    |r| keyed("max-request-per-user", r.max_requests_per_user),
    |r| keyed("max-request-total", r.max_requests_total),
    |r| keyed("max-streams", r.max_streams),
    |r| keyed("max-streams-per-user", r.max_streams_per_user),
    |r| keyed("memory limit", r.memory_limit),
    |r| keyed("gnmi port", r.gnmi_port),
    |r| keyed("gribi port", r.gribi_port),
    |r| keyed("p4rt port", r.p4rt_port),
];

fn flag(set: bool, directive: &str) -> Vec<String> {
    set.then(|| directive.to_owned()).into_iter().collect()
}

fn keyed<T: Display>(keyword: &str, value: Option<T>) -> Vec<String> {
    value
        .and_then(|v| RemovalSyntax::EchoValue.target(keyword, &v.to_string()))
        .into_iter()
        .collect()
}

fn each(keyword: &str, values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| RemovalSyntax::EchoValue.target(keyword, v))
        .collect()
}

fn selected(set: bool) -> Vec<String> {
    set.then(String::new).into_iter().collect()
}

fn optional<T: Display>(value: Option<T>) -> Vec<String> {
    value.map(|v| v.to_string()).into_iter().collect()
}

fn server_block_name(name: &str) -> String {
    format!("server {}", name.trim())
}

fn server_removal_block(name: &str) -> SubBlock {
    SubBlock::new(&format!("no server {}", name.trim()))
}

/// Directives for the root level of the `grpc` block in emission order
#[must_use]
pub fn root_directives(root: &RootSettings) -> Vec<String> {
    ROOT_DIRECTIVES.iter().flat_map(|emit| emit(root)).collect()
}

/// Directives for the body of a server block in emission order
///
/// `delete_server` is not considered here.
#[must_use]
pub fn server_directives(spec: &ServerSpec) -> Vec<String> {
    SERVER_DIRECTIVES
        .iter()
        .flat_map(|(_, emit)| emit(spec))
        .collect()
}

/// Synthesize the complete configuration
///
/// Removal of the whole block takes precedence over everything else,
/// otherwise the root-level directives are followed by one sub-block per server.
#[must_use]
pub fn synthesize(config: &GrpcConfig) -> ConfigDelta {
    if config.delete_block {
        return ConfigDelta::whole_block_removal(&config.service);
    }

    let mut delta = ConfigDelta::new(&config.service);

    if let Some(root) = &config.root {
        for directive in root_directives(root) {
            delta.add(&directive);
        }
    }

    for sub_block in server_sub_blocks(&config.servers) {
        delta.add_sub_block(sub_block);
    }

    delta
}

/// Synthesize the `grpc` block applying the given servers
///
/// A server with `delete_server` set is reduced to `no server <name>`.
/// Servers without a name are skipped.
#[must_use]
pub fn synthesize_apply(specs: &[ServerSpec]) -> ConfigDelta {
    let mut delta = ConfigDelta::new(DEFAULT_SERVICE);
    for sub_block in server_sub_blocks(specs) {
        delta.add_sub_block(sub_block);
    }
    delta
}

fn server_sub_blocks(specs: &[ServerSpec]) -> impl Iterator<Item = SubBlock> + '_ {
    specs
        .iter()
        .filter(|spec| !spec.name.trim().is_empty())
        .map(|spec| {
            if spec.delete_server {
                return server_removal_block(&spec.name);
            }

            let mut sub_block = SubBlock::new(&server_block_name(&spec.name));
            for directive in server_directives(spec) {
                sub_block.add(&directive);
            }
            sub_block
        })
}

/// Synthesize the `grpc` block removing parts of a server
///
/// Only the fields explicitly selected by the request are removed.
/// With `delete_server` set, the result is `no server <name>` without a body.
#[must_use]
pub fn synthesize_unconfig(request: &UnconfigRequest) -> ConfigDelta {
    let mut delta = ConfigDelta::new(DEFAULT_SERVICE);

    if request.server_name.trim().is_empty() {
        return delta;
    }

    if request.delete_server {
        delta.add_sub_block(server_removal_block(&request.server_name));
        return delta;
    }

    let mut sub_block = SubBlock::new(&server_block_name(&request.server_name));
    for (keyword, syntax, select) in SERVER_REMOVALS {
        for value in select(request) {
            if let Some(target) = syntax.target(keyword, &value) {
                sub_block.remove(&target);
            }
        }
    }

    if !sub_block.lines().is_empty() {
        delta.add_sub_block(sub_block);
    }

    delta
}

/// Synthesize the `grpc` block applying root-level settings
#[must_use]
pub fn synthesize_root_apply(root: &RootSettings) -> ConfigDelta {
    let mut delta = ConfigDelta::new(DEFAULT_SERVICE);
    for directive in root_directives(root) {
        delta.add(&directive);
    }
    delta
}

/// Synthesize the `grpc` block removing the given root-level directives
///
/// See [`generate_remove_directive`] for how each directive is removed.
#[must_use]
pub fn synthesize_root_unconfig<S: AsRef<str>>(directives: &[S]) -> ConfigDelta {
    let mut delta = ConfigDelta::new(DEFAULT_SERVICE);
    for directive in directives {
        delta.remove(removal_target(directive.as_ref()));
    }
    delta
}

/// What has to follow `no` to remove the root-level `directive`
///
/// Directives of the services in [`BASE_LEVEL_REMOVALS`] collapse to the
/// service keyword, all others are removed literally.
#[must_use]
pub fn removal_target(directive: &str) -> &str {
    let directive = directive.trim();
    BASE_LEVEL_REMOVALS
        .iter()
        .find(|keyword| {
            directive == **keyword
                || directive
                    .strip_prefix(**keyword)
                    .is_some_and(|rest| rest.starts_with(' '))
        })
        .copied()
        .unwrap_or(directive)
}

/// Removal directive for a root-level `directive`
///
/// ```
/// use grpcconf::synthesizer::generate_remove_directive;
///
/// assert_eq!(generate_remove_directive("gnmi port 50051"), "no gnmi");
/// assert_eq!(generate_remove_directive("dscp cs3"), "no dscp cs3");
/// ```
#[must_use]
pub fn generate_remove_directive(directive: &str) -> String {
    format!("no {}", removal_target(directive))
}
