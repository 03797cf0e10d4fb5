// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Core component pushing configuration deltas to the device
//!
//! The controller is combining the configuration, the synthesizer, the renderer
//! and the device to apply or remove a complete gRPC configuration.
//!
//! ```
//! use grpcconf::configuration::{Configuration, YAMLConfiguration};
//! use grpcconf::controller::{Controller, Expectation, Provisioning, PushOutcome};
//! use grpcconf::device::DummyDevice;
//!
//! # #[path = "../configuration/doctest.rs"]
//! # mod doctest;
//! # let tmpfile = doctest::generate_example_yaml();
//! # let filepath = tmpfile.path();
//! use futures::lock::Mutex;
//! use std::fs::File;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let controller = Controller::new();
//! let configuration = Arc::new(Mutex::new(YAMLConfiguration::new()));
//! configuration.lock().await.read(File::open(filepath)?)?;
//! let device = Arc::new(Mutex::new(DummyDevice::new()));
//! let outcome = controller
//!     .apply(configuration, device, Expectation::Success)
//!     .await?;
//! assert_eq!(outcome, PushOutcome::Pushed);
//! # Ok::<(), anyhow::Error>(())
//! # });
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::configuration::Configuration;
use crate::delta::ConfigDelta;
use crate::device::Device;
use crate::renderer::render;
use crate::synthesizer::{synthesize, synthesize_unconfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::lock::Mutex;
use log::{debug, info};
use std::sync::Arc;
use tokio::time::Instant;

/// If the device is expected to accept a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expectation {
    /// The device has to accept the configuration
    #[default]
    Success,

    /// The device has to reject the configuration
    Failure,
}

/// Result of pushing a delta that met the expectation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Nothing to push, the device was not contacted
    Skipped,

    /// The device accepted the configuration
    Pushed,

    /// The device rejected the configuration as expected
    Rejected(String),
}

/// Render `delta` and push it to the `device`
///
/// An empty rendering is not pushed at all.
///
/// # Errors
///
/// Will return `Err` if the device did not behave as expected,
/// i.e. rejected a configuration that should be accepted or the other way round.
pub async fn push_delta(
    device: &(dyn Device + Sync + Send),
    delta: &ConfigDelta,
    expectation: Expectation,
) -> Result<PushOutcome> {
    let text = render(delta);
    if text.is_empty() {
        debug!("Nothing to push for {}", delta.service_name());
        return Ok(PushOutcome::Skipped);
    }

    debug!("Pushing configuration\n{text}");

    match (device.push_config(&text).await, expectation) {
        (Ok(()), Expectation::Success) => {
            info!("Pushed configuration of {}", delta.service_name());
            Ok(PushOutcome::Pushed)
        }
        (Ok(()), Expectation::Failure) => Err(anyhow!(
            "Expected failure, but configuration was applied successfully\n{text}"
        )),
        (Err(e), Expectation::Success) => Err(e.context("Pushing the configuration failed")),
        (Err(e), Expectation::Failure) => {
            info!("Configuration rejected as expected: {e:#}");
            Ok(PushOutcome::Rejected(format!("{e:#}")))
        }
    }
}

/// Defines how to apply and remove the gRPC configuration
#[async_trait]
pub trait Provisioning {
    /// Apply the configuration including the following steps
    ///
    /// 1. Fetch the desired gRPC configuration
    /// 2. Synthesize and render the delta
    /// 3. Push it to the device, unless there is nothing to push
    async fn apply(
        &self,
        configuration: Arc<Mutex<dyn Configuration + Send>>,
        device: Arc<Mutex<dyn Device + Sync + Send>>,
        expectation: Expectation,
    ) -> Result<PushOutcome>;

    /// Push every removal request of the configuration in order
    ///
    /// Stops at the first request that does not meet the expectation.
    async fn unconfigure(
        &self,
        configuration: Arc<Mutex<dyn Configuration + Send>>,
        device: Arc<Mutex<dyn Device + Sync + Send>>,
        expectation: Expectation,
    ) -> Result<Vec<PushOutcome>>;
}

/// Struct to perform the provisioning on
#[derive(Default)]
pub struct Controller;

impl Controller {
    /// Create a new controller
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provisioning for Controller {
    async fn apply(
        &self,
        configuration: Arc<Mutex<dyn Configuration + Send>>,
        device: Arc<Mutex<dyn Device + Sync + Send>>,
        expectation: Expectation,
    ) -> Result<PushOutcome> {
        let start = Instant::now();

        let grpc_config = configuration
            .lock()
            .await
            .get_grpc_config()
            .context("Fetching the configuration failed")?;
        debug!("Fetched from configuration module: {grpc_config:#?}");

        let delta = synthesize(&grpc_config);
        let outcome = push_delta(&*device.lock().await, &delta, expectation).await?;

        debug!("Finished after {:.1?}", start.elapsed());
        Ok(outcome)
    }

    async fn unconfigure(
        &self,
        configuration: Arc<Mutex<dyn Configuration + Send>>,
        device: Arc<Mutex<dyn Device + Sync + Send>>,
        expectation: Expectation,
    ) -> Result<Vec<PushOutcome>> {
        let start = Instant::now();

        let requests = configuration
            .lock()
            .await
            .get_unconfig_requests()
            .context("Fetching the configuration failed")?;

        let locked_device = device.lock().await;
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in &requests {
            let delta = synthesize_unconfig(request);
            let outcome = push_delta(&*locked_device, &delta, expectation)
                .await
                .with_context(|| format!("Unconfiguring server {} failed", request.server_name))?;
            outcomes.push(outcome);
        }

        debug!("Finished after {:.1?}", start.elapsed());
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{GrpcConfig, MockConfiguration, ServerSpec, UnconfigRequest};
    use crate::device::MockDevice;
    use crate::synthesizer::synthesize_apply;
    use mockall::predicate::eq;

    fn server1() -> ServerSpec {
        ServerSpec {
            name: "server1".to_owned(),
            port: Some(56666),
            ..ServerSpec::default()
        }
    }

    fn configuration_happy() -> MockConfiguration {
        let mut configuration = MockConfiguration::new();
        configuration.expect_get_grpc_config().returning(|| {
            Ok(GrpcConfig {
                servers: vec![server1()],
                ..GrpcConfig::default()
            })
        });
        configuration.expect_get_unconfig_requests().returning(|| {
            Ok(vec![
                UnconfigRequest {
                    server_name: "server1".to_owned(),
                    delete_port: Some(56666),
                    ..UnconfigRequest::default()
                },
                UnconfigRequest {
                    server_name: "server2".to_owned(),
                    ..UnconfigRequest::default()
                },
            ])
        });
        configuration
    }

    fn configuration_failing() -> MockConfiguration {
        let mut configuration = MockConfiguration::new();
        configuration
            .expect_get_grpc_config()
            .returning(|| Err(anyhow!("failed")));
        configuration
            .expect_get_unconfig_requests()
            .returning(|| Err(anyhow!("failed")));
        configuration
    }

    fn device_happy() -> MockDevice {
        let mut device = MockDevice::new();
        device.expect_push_config().returning(|_| Ok(()));
        device
    }

    fn device_failing() -> MockDevice {
        let mut device = MockDevice::new();
        device
            .expect_push_config()
            .returning(|_| Err(anyhow!("invalid input detected")));
        device
    }

    #[tokio::test]
    async fn test_push_delta_happy() -> Result<()> {
        let mut device = MockDevice::new();
        device
            .expect_push_config()
            .with(eq("grpc\n server server1\n  port 56666\n !\n"))
            .times(1)
            .returning(|_| Ok(()));

        let outcome = push_delta(
            &device,
            &synthesize_apply(&[server1()]),
            Expectation::Success,
        )
        .await?;
        assert_eq!(outcome, PushOutcome::Pushed);
        Ok(())
    }

    #[tokio::test]
    async fn test_push_delta_skips_empty() -> Result<()> {
        let mut device = MockDevice::new();
        device.expect_push_config().never();

        let outcome = push_delta(&device, &ConfigDelta::new("grpc"), Expectation::Failure).await?;
        assert_eq!(outcome, PushOutcome::Skipped);
        Ok(())
    }

    #[tokio::test]
    async fn test_push_delta_expected_failure() -> Result<()> {
        let outcome = push_delta(
            &device_failing(),
            &synthesize_apply(&[server1()]),
            Expectation::Failure,
        )
        .await?;
        assert_eq!(
            outcome,
            PushOutcome::Rejected("invalid input detected".to_owned())
        );
        Ok(())
    }

    #[tokio::test]
    #[should_panic(expected = "Expected failure, but configuration was applied successfully")]
    async fn test_push_delta_unexpected_success() {
        push_delta(
            &device_happy(),
            &synthesize_apply(&[server1()]),
            Expectation::Failure,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    #[should_panic(expected = "Pushing the configuration failed")]
    async fn test_push_delta_unexpected_failure() {
        push_delta(
            &device_failing(),
            &synthesize_apply(&[server1()]),
            Expectation::Success,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_apply_happy() -> Result<()> {
        let configuration = Arc::new(Mutex::new(configuration_happy()));
        let device = Arc::new(Mutex::new(device_happy()));
        let controller = Controller::new();
        let outcome = controller
            .apply(configuration, device, Expectation::Success)
            .await?;
        assert_eq!(outcome, PushOutcome::Pushed);
        Ok(())
    }

    #[tokio::test]
    #[should_panic(expected = "Fetching the configuration failed")]
    async fn test_apply_configuration_failure() {
        let configuration = Arc::new(Mutex::new(configuration_failing()));
        let device = Arc::new(Mutex::new(device_happy()));
        let controller = Controller::new();
        controller
            .apply(configuration, device, Expectation::Success)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unconfigure_happy() -> Result<()> {
        let configuration = Arc::new(Mutex::new(configuration_happy()));
        let mut device = MockDevice::new();
        device
            .expect_push_config()
            .with(eq("grpc\n server server1\n  no port 56666\n !\n"))
            .times(1)
            .returning(|_| Ok(()));
        let device = Arc::new(Mutex::new(device));
        let controller = Controller::new();
        let outcomes = controller
            .unconfigure(configuration, device, Expectation::Success)
            .await?;
        assert_eq!(outcomes, vec![PushOutcome::Pushed, PushOutcome::Skipped]);
        Ok(())
    }

    #[tokio::test]
    #[should_panic(expected = "Unconfiguring server server1 failed")]
    async fn test_unconfigure_device_failure() {
        let configuration = Arc::new(Mutex::new(configuration_happy()));
        let device = Arc::new(Mutex::new(device_failing()));
        let controller = Controller::new();
        controller
            .unconfigure(configuration, device, Expectation::Success)
            .await
            .unwrap();
    }
}
