// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Transport rendered configuration to the device and read diagnostic output back
//!
//! The codec itself never talks to a device. Everything that does
//! goes through the [`Device`] trait.
//!
//! ```
//! use grpcconf::device::{Device, DummyDevice};
//!
//! # tokio_test::block_on(async {
//! let device = DummyDevice::new()
//!     .with_response("show emsd server server1 brief", "server1 | En | ANY | 56666 | En | GNMI | default");
//! device.push_config("grpc\n server server1\n  port 56666\n !\n").await?;
//! let output = device.run_command("show emsd server server1 brief").await?;
//! assert!(output.starts_with("server1"));
//! # Ok::<(), anyhow::Error>(())
//! # });
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;

/// Defines how to talk to the device
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Device {
    /// Push a rendered configuration text
    ///
    /// # Errors
    ///
    /// Will return `Err` if the device rejected the configuration
    /// or it could not be transported.
    async fn push_config(&self, config: &str) -> Result<()>;

    /// Run a show command and return its raw output
    ///
    /// # Errors
    ///
    /// Will return `Err` if the command could not be run.
    async fn run_command(&self, command: &str) -> Result<String>;
}

#[cfg(feature = "command")]
mod command;
#[cfg(feature = "command")]
pub use command::CommandDevice;

/// A device accepting every configuration and answering with canned responses
///
/// Commands without a canned response yield an empty output.
/// Useful for testing purposes or for dry runs.
#[derive(Default, Debug, Clone)]
pub struct DummyDevice {
    responses: BTreeMap<String, String>,
}

impl DummyDevice {
    /// Create a new `DummyDevice` without any canned response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `output`
    #[must_use]
    pub fn with_response(mut self, command: &str, output: &str) -> Self {
        self.responses.insert(command.to_owned(), output.to_owned());
        self
    }
}

#[async_trait]
impl Device for DummyDevice {
    async fn push_config(&self, _config: &str) -> Result<()> {
        Ok(())
    }

    async fn run_command(&self, command: &str) -> Result<String> {
        Ok(self.responses.get(command).cloned().unwrap_or_default())
    }
}
