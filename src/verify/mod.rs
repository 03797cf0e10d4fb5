// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Read back the state of the device and validate it
//!
//! Every validator runs a show command through the [`Device`], parses the
//! output, compares it with the expected record and logs each field.
//!
//! ```
//! use grpcconf::configuration::Presence;
//! use grpcconf::device::DummyDevice;
//! use grpcconf::parser::ServerBrief;
//! use grpcconf::verify::verify_brief;
//!
//! # tokio_test::block_on(async {
//! let device = DummyDevice::new().with_response(
//!     "show emsd server server1 brief",
//!     "server1 | En | ANY | 56666 | En | GNMI GNOI | global-vrf",
//! );
//! let want = ServerBrief::expected("server1", "En", 56666, "En", &["GNOI", "GNMI"], "global-vrf");
//! let verdict = verify_brief(&device, "server1", Presence::Present, &want).await?;
//! assert!(verdict.passed());
//! # Ok::<(), anyhow::Error>(())
//! # });
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::comparator::{
    compare_brief, compare_detail, compare_stats, compare_telemetry, field_matches, mismatches,
    FieldComparison,
};
use crate::configuration::{Configuration, Presence, ServerExpectation};
use crate::device::Device;
use crate::parser::{
    parse_brief, parse_detail, parse_respawn_count, parse_stats, parse_telemetry_summary,
    RpcStats, ServerBrief, ServerDetail, TelemetrySummary,
};
use anyhow::{Context, Result};
use futures::lock::Mutex;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

const TELEMETRY_SUMMARY_COMMAND: &str = "show telemetry model-driven summary";

/// Result of validating one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// What was validated, e.g. `server1 brief`
    pub subject: String,

    /// All compared fields
    pub comparisons: Vec<FieldComparison>,
}

impl Verdict {
    fn new(subject: String, comparisons: Vec<FieldComparison>) -> Self {
        for c in &comparisons {
            if c.matched {
                info!("[PASS] {} {}: {}", subject, c.field, c.got);
            } else {
                warn!(
                    "[FAIL] {} {}: got {}, want {}",
                    subject, c.field, c.got, c.want
                );
            }
        }

        Self {
            subject,
            comparisons,
        }
    }

    /// If every compared field matched
    #[must_use]
    pub fn passed(&self) -> bool {
        self.comparisons.iter().all(|c| c.matched)
    }

    /// The compared fields that did not match
    #[must_use]
    pub fn failures(&self) -> Vec<&FieldComparison> {
        mismatches(&self.comparisons)
    }
}

fn presence_check(found: bool, want: Presence) -> FieldComparison {
    let got = if found {
        Presence::Present
    } else {
        Presence::Absent
    };

    FieldComparison {
        field: "Presence".to_owned(),
        got: format!("{got:?}"),
        want: format!("{want:?}"),
        matched: field_matches(&got, &want, true),
    }
}

/// Combine the presence check with the field comparisons if both agree on presence
fn with_presence<F>(found: bool, presence: Presence, compare: F) -> Vec<FieldComparison>
where
    F: FnOnce() -> Vec<FieldComparison>,
{
    let check = presence_check(found, presence);
    if check.matched && found {
        let mut comparisons = vec![check];
        comparisons.extend(compare());
        comparisons
    } else {
        vec![check]
    }
}

async fn show(device: &(dyn Device + Sync + Send), command: &str) -> Result<String> {
    device
        .run_command(command)
        .await
        .with_context(|| format!("Running '{command}' failed"))
}

/// Validate the brief listing of the server `name`
///
/// # Errors
///
/// Will return `Err` if the show command failed or a row is malformed.
pub async fn verify_brief(
    device: &(dyn Device + Sync + Send),
    name: &str,
    presence: Presence,
    want: &ServerBrief,
) -> Result<Verdict> {
    let output = show(device, &format!("show emsd server {name} brief")).await?;

    let got = if output.contains(&format!("Server '{name}' not found")) {
        None
    } else {
        parse_brief(&output, name).with_context(|| format!("Parsing brief of {name} failed"))?
    };

    let comparisons = with_presence(got.is_some(), presence, || {
        got.as_ref()
            .map(|brief| compare_brief(brief, want))
            .unwrap_or_default()
    });

    Ok(Verdict::new(format!("{name} brief"), comparisons))
}

/// Validate the detail block of the server `name`
///
/// # Errors
///
/// Will return `Err` if the show command failed.
pub async fn verify_detail(
    device: &(dyn Device + Sync + Send),
    name: &str,
    presence: Presence,
    want: &ServerDetail,
) -> Result<Verdict> {
    let output = show(device, &format!("show emsd server {name} detail")).await?;

    let got = parse_detail(&output);
    let found =
        !output.contains(&format!("No EMSD server found with name '{name}'")) && !got.name.is_empty();

    let comparisons = with_presence(found, presence, || compare_detail(&got, want));
    Ok(Verdict::new(format!("{name} detail"), comparisons))
}

/// Validate the statistics of the expected RPC paths of the server `name`
///
/// # Errors
///
/// Will return `Err` if the show command failed.
pub async fn verify_stats(
    device: &(dyn Device + Sync + Send),
    name: &str,
    presence: Presence,
    want: &BTreeMap<String, RpcStats>,
) -> Result<Verdict> {
    let output = show(device, &format!("show emsd server {name} statistics")).await?;

    let found = !output.contains(&format!("No statistics found for server '{name}'"));
    let got = parse_stats(&output, name);

    let comparisons = with_presence(found, presence, || {
        compare_stats(&got.rpc_stats_by_path, want)
    });
    Ok(Verdict::new(format!("{name} statistics"), comparisons))
}

/// Validate the telemetry summary
///
/// # Errors
///
/// Will return `Err` if the show command failed or a summary line is malformed.
pub async fn verify_telemetry_summary(
    device: &(dyn Device + Sync + Send),
    want: &TelemetrySummary,
) -> Result<Verdict> {
    let output = show(device, TELEMETRY_SUMMARY_COMMAND).await?;
    let got = parse_telemetry_summary(&output).context("Parsing telemetry summary failed")?;
    Ok(Verdict::new(
        "telemetry summary".to_owned(),
        compare_telemetry(&got, want),
    ))
}

/// Read how often `process` was respawned
///
/// # Errors
///
/// Will return `Err` if the show command failed or reports no respawn count.
pub async fn respawn_count(device: &(dyn Device + Sync + Send), process: &str) -> Result<u64> {
    let output = show(device, &format!("show processes {process}")).await?;
    parse_respawn_count(&output).with_context(|| format!("Reading respawn count of {process} failed"))
}

/// Validate all records expected for the server `name`
///
/// # Errors
///
/// Will return `Err` if one of the validators could not run.
pub async fn verify_server(
    device: &(dyn Device + Sync + Send),
    name: &str,
    expectation: &ServerExpectation,
) -> Result<Vec<Verdict>> {
    let mut verdicts = vec![];

    if let Some(brief) = &expectation.brief {
        verdicts.push(verify_brief(device, name, expectation.presence, brief).await?);
    }

    if let Some(detail) = &expectation.detail {
        verdicts.push(verify_detail(device, name, expectation.presence, detail).await?);
    }

    if let Some(stats) = &expectation.stats {
        verdicts.push(verify_stats(device, name, expectation.presence, stats).await?);
    }

    Ok(verdicts)
}

/// Validate everything the configuration expects
///
/// # Errors
///
/// Will return `Err` if the configuration could not be read or a validator could not run.
pub async fn verify_configuration(
    configuration: Arc<Mutex<dyn Configuration + Send>>,
    device: Arc<Mutex<dyn Device + Sync + Send>>,
) -> Result<Vec<Verdict>> {
    let (expectations, telemetry) = {
        let mut locked_configuration = configuration.lock().await;
        (
            locked_configuration
                .get_expectations()
                .context("Fetching the configuration failed")?,
            locked_configuration
                .get_telemetry_expectation()
                .context("Fetching the configuration failed")?,
        )
    };

    let locked_device = device.lock().await;
    let mut verdicts = vec![];
    for (name, expectation) in &expectations {
        verdicts.extend(verify_server(&*locked_device, name, expectation).await?);
    }

    if let Some(want) = &telemetry {
        verdicts.push(verify_telemetry_summary(&*locked_device, want).await?);
    }

    Ok(verdicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::set_equals;
    use crate::configuration::{MockConfiguration, ServerSpec};
    use crate::device::{DummyDevice, MockDevice};
    use crate::renderer::render;
    use crate::synthesizer::synthesize_apply;
    use anyhow::anyhow;
    use mockall::predicate::eq;

    const BRIEF: &str = concat!(
        "Server   | Status | Address | Port  | TLS | Services | VRF\n",
        "---------+--------+---------+-------+-----+----------+-----------\n",
        "server1  | En     | ANY     | 56666 | En  | GNMI     | global-vrf\n",
        "         |        |         |       |     | GNOI     |\n",
    );

    const DETAIL: &str = concat!(
        "Server name        : server1\n",
        "Port               : 56666\n",
        "Enabled            : Yes\n",
        "Services           : GNMI GNOI\n",
        "Keepalive time     : 30\n",
        "Keepalive timeout  : 20\n",
        "DSCP               : 10\n",
    );

    fn want_brief() -> ServerBrief {
        ServerBrief::expected("server1", "En", 56666, "En", &["GNOI", "GNMI"], "global-vrf")
    }

    fn want_detail() -> ServerDetail {
        ServerDetail {
            name: "server1".to_owned(),
            port: 56666,
            services: vec!["GNMI".to_owned(), "GNOI".to_owned()],
            enabled: true,
            keepalive_time: 30,
            keepalive_timeout: 20,
            listen_addresses: vec![],
            dscp: 10,
        }
    }

    fn device_responding(command: &'static str, output: &'static str) -> MockDevice {
        let mut device = MockDevice::new();
        device
            .expect_run_command()
            .with(eq(command))
            .returning(move |_| Ok(output.to_owned()));
        device
    }

    #[test_log::test(tokio::test)]
    async fn test_brief_passes() -> Result<()> {
        let device = device_responding("show emsd server server1 brief", BRIEF);
        let verdict = verify_brief(&device, "server1", Presence::Present, &want_brief()).await?;
        assert!(verdict.passed());
        assert_eq!(verdict.subject, "server1 brief");
        assert_eq!(verdict.comparisons.first().map(|c| c.field.as_str()), Some("Presence"));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_brief_reports_mismatch() -> Result<()> {
        let device = device_responding("show emsd server server1 brief", BRIEF);
        let mut want = want_brief();
        want.vrf = "mgmt-vrf".to_owned();
        let verdict = verify_brief(&device, "server1", Presence::Present, &want).await?;
        assert!(!verdict.passed());

        let failures = verdict.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "VRF");
        assert_eq!(failures[0].got, "\"global-vrf\"");
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_brief_absent() -> Result<()> {
        let device = device_responding(
            "show emsd server server2 brief",
            "Server 'server2' not found\n",
        );
        let verdict = verify_brief(&device, "server2", Presence::Absent, &ServerBrief::default())
            .await?;
        assert!(verdict.passed());
        assert_eq!(verdict.comparisons.len(), 1);

        let verdict = verify_brief(&device, "server2", Presence::Present, &want_brief()).await?;
        assert!(!verdict.passed());
        assert_eq!(verdict.failures()[0].got, "Absent");
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_brief_unexpectedly_present() -> Result<()> {
        let device = device_responding("show emsd server server1 brief", BRIEF);
        let verdict = verify_brief(&device, "server1", Presence::Absent, &want_brief()).await?;
        assert!(!verdict.passed());
        assert_eq!(verdict.comparisons.len(), 1);
        Ok(())
    }

    #[tokio::test]
    #[should_panic(expected = "Running 'show emsd server server1 brief' failed")]
    async fn test_brief_device_failure() {
        let mut device = MockDevice::new();
        device
            .expect_run_command()
            .returning(|_| Err(anyhow!("connection lost")));
        verify_brief(&device, "server1", Presence::Present, &want_brief())
            .await
            .unwrap();
    }

    #[test_log::test(tokio::test)]
    async fn test_detail() -> Result<()> {
        let device = device_responding("show emsd server server1 detail", DETAIL);
        let verdict = verify_detail(&device, "server1", Presence::Present, &want_detail()).await?;
        assert!(verdict.passed());

        let device = device_responding(
            "show emsd server server1 detail",
            "No EMSD server found with name 'server1'\n",
        );
        let verdict =
            verify_detail(&device, "server1", Presence::Absent, &ServerDetail::default()).await?;
        assert!(verdict.passed());

        let device = device_responding("show emsd server server1 detail", "");
        let verdict = verify_detail(&device, "server1", Presence::Present, &want_detail()).await?;
        assert!(!verdict.passed());
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_stats() -> Result<()> {
        let device = device_responding(
            "show emsd server server1 statistics",
            "/gnmi.gNMI/Set\nRequests : 2\nResponses : 2\nError Responses : 1\n",
        );
        let want = BTreeMap::from([
            (
                "/gnmi.gNMI/Set".to_owned(),
                RpcStats {
                    requests: 2,
                    responses: 2,
                    error_responses: 0,
                },
            ),
            ("/gnmi.gNMI/Get".to_owned(), RpcStats::default()),
        ]);
        let verdict = verify_stats(&device, "server1", Presence::Present, &want).await?;

        let failed: Vec<&str> = verdict
            .failures()
            .iter()
            .map(|c| c.field.as_str())
            .collect();
        assert_eq!(
            failed,
            vec!["/gnmi.gNMI/Get", "/gnmi.gNMI/Set ErrorResponses"]
        );
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_stats_absent() -> Result<()> {
        let device = device_responding(
            "show emsd server server1 statistics",
            "No statistics found for server 'server1'",
        );
        let verdict = verify_stats(&device, "server1", Presence::Absent, &BTreeMap::new()).await?;
        assert!(verdict.passed());
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_telemetry_summary() -> Result<()> {
        let device = device_responding(
            TELEMETRY_SUMMARY_COMMAND,
            "Subscriptions Total: 2 Active: 1 Paused: 1\n",
        );
        let want = TelemetrySummary {
            subscriptions: 2,
            subscriptions_active: 1,
            subscriptions_paused: 1,
            ..TelemetrySummary::default()
        };
        let verdict = verify_telemetry_summary(&device, &want).await?;
        assert!(verdict.passed());
        Ok(())
    }

    #[tokio::test]
    #[should_panic(expected = "Parsing telemetry summary failed")]
    async fn test_malformed_telemetry_summary() {
        let device = device_responding(
            TELEMETRY_SUMMARY_COMMAND,
            "Subscriptions Total: many\n",
        );
        verify_telemetry_summary(&device, &TelemetrySummary::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_respawn_count() -> Result<()> {
        let device = DummyDevice::new().with_response("show processes emsd", "Respawn count: 4\n");
        assert_eq!(respawn_count(&device, "emsd").await?, 4);
        let err = respawn_count(&device, "bgp").await.unwrap_err();
        assert!(format!("{err:#}").contains("could not parse respawn count"));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_configuration() -> Result<()> {
        let mut configuration = MockConfiguration::new();
        configuration.expect_get_expectations().returning(|| {
            Ok(BTreeMap::from([
                (
                    "server1".to_owned(),
                    ServerExpectation {
                        brief: Some(want_brief()),
                        detail: Some(want_detail()),
                        ..ServerExpectation::default()
                    },
                ),
                (
                    "server2".to_owned(),
                    ServerExpectation {
                        presence: Presence::Absent,
                        brief: Some(ServerBrief::default()),
                        ..ServerExpectation::default()
                    },
                ),
            ]))
        });
        configuration
            .expect_get_telemetry_expectation()
            .returning(|| Ok(None));

        let device = DummyDevice::new()
            .with_response("show emsd server server1 brief", BRIEF)
            .with_response("show emsd server server1 detail", DETAIL)
            .with_response(
                "show emsd server server2 brief",
                "Server 'server2' not found",
            );

        let verdicts = verify_configuration(
            Arc::new(Mutex::new(configuration)),
            Arc::new(Mutex::new(device)),
        )
        .await?;

        let subjects: Vec<&str> = verdicts.iter().map(|v| v.subject.as_str()).collect();
        assert_eq!(
            subjects,
            vec!["server1 brief", "server1 detail", "server2 brief"]
        );
        assert!(verdicts.iter().all(Verdict::passed));
        Ok(())
    }

    #[tokio::test]
    #[should_panic(expected = "Fetching the configuration failed")]
    async fn test_verify_configuration_failure() {
        let mut configuration = MockConfiguration::new();
        configuration
            .expect_get_expectations()
            .returning(|| Err(anyhow!("failed")));
        verify_configuration(
            Arc::new(Mutex::new(configuration)),
            Arc::new(Mutex::new(DummyDevice::new())),
        )
        .await
        .unwrap();
    }

    /// Brief listing a device shows after accepting `config`, services in reverse order
    fn brief_echo(config: &str, name: &str) -> String {
        let mut port = "";
        let mut vrf = "default";
        let mut services = vec![];
        for line in config.lines().map(str::trim) {
            if let Some(value) = line.strip_prefix("port ") {
                port = value;
            } else if let Some(value) = line.strip_prefix("services ") {
                services.push(value);
            } else if let Some(value) = line.strip_prefix("vrf ") {
                vrf = value;
            }
        }
        services.reverse();

        let (first, rest) = services.split_first().unwrap();
        std::iter::once(format!("{name} | En | ANY | {port} | En | {first} | {vrf}"))
            .chain(
                rest.iter()
                    .map(|service| format!("        |    |     |       |    | {service} |")),
            )
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test_log::test(tokio::test)]
    async fn test_applied_server_reads_back() -> Result<()> {
        let spec = ServerSpec {
            name: "server1".to_owned(),
            port: Some(56666),
            services: vec![
                "GNMI".to_owned(),
                "P4RT".to_owned(),
                "GNOI".to_owned(),
                "GNMI".to_owned(),
            ],
            tls: Some("tls-mutual".to_owned()),
            ssl_profile_id: Some("profile1".to_owned()),
            certificate_authentication: true,
            metadata_authentication: true,
            vrf: Some("global-vrf".to_owned()),
            listen_addresses: vec!["10.0.0.1".to_owned()],
            address_family: Some("ipv4".to_owned()),
            dscp: Some(10),
            keepalive_time: Some(30),
            keepalive_timeout: Some(20),
            local_connection: true,
            disable_remote_connection: true,
            max_concurrent_streams: Some(32),
            max_requests_per_user: Some(4),
            max_requests_total: Some(64),
            apply_groups: vec!["G1".to_owned()],
            ..ServerSpec::default()
        };

        let config = render(&synthesize_apply(&[spec.clone()]));
        let device = DummyDevice::new().with_response(
            "show emsd server server1 brief",
            &brief_echo(&config, "server1"),
        );

        let output = device.run_command("show emsd server server1 brief").await?;
        let brief = parse_brief(&output, "server1")?.unwrap();
        assert_eq!(brief.port, "56666");
        assert_eq!(Some(brief.vrf.as_str()), spec.vrf.as_deref());
        assert_ne!(brief.services, spec.services);
        assert!(set_equals(&brief.services, &spec.services));

        let want = ServerBrief::expected(
            "server1",
            "En",
            56666,
            "En",
            &["GNMI", "P4RT", "GNOI", "GNMI"],
            "global-vrf",
        );
        let verdict = verify_brief(&device, "server1", Presence::Present, &want).await?;
        assert!(verdict.passed());

        let mut missing_duplicate = want;
        missing_duplicate.services.pop();
        let verdict =
            verify_brief(&device, "server1", Presence::Present, &missing_duplicate).await?;
        assert_eq!(verdict.failures()[0].field, "Services");
        Ok(())
    }
}
