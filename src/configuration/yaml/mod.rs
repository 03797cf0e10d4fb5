// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Provides YAML-based gRPC configuration

use crate::configuration::{
    self, GrpcConfig, RootSettings, ServerExpectation, ServerSpec, UnconfigRequest,
};
use crate::parser::TelemetrySummary;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// Reads configuration from YAML file
#[derive(Default, Debug)]
pub struct YAMLConfiguration {
    config: Config,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    service: String,
    delete_block: bool,
    root: Option<RootSettings>,
    servers: Vec<ServerSpec>,
    unconfig: Vec<UnconfigRequest>,
    expectations: BTreeMap<String, ServerExpectation>,
    telemetry: Option<TelemetrySummary>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: configuration::DEFAULT_SERVICE.to_owned(),
            delete_block: false,
            root: None,
            servers: vec![],
            unconfig: vec![],
            expectations: BTreeMap::default(),
            telemetry: None,
        }
    }
}

impl configuration::Configuration for YAMLConfiguration {
    fn get_grpc_config(&mut self) -> Result<GrpcConfig> {
        Ok(GrpcConfig {
            service: self.config.service.clone(),
            delete_block: self.config.delete_block,
            root: self.config.root.clone(),
            servers: self.config.servers.clone(),
        })
    }

    fn get_unconfig_requests(&mut self) -> Result<Vec<UnconfigRequest>> {
        Ok(self.config.unconfig.clone())
    }

    fn get_expectations(&mut self) -> Result<BTreeMap<String, ServerExpectation>> {
        Ok(self.config.expectations.clone())
    }

    fn get_expectation(&mut self, server_name: &str) -> Result<Option<ServerExpectation>> {
        Ok(self.config.expectations.get(server_name).cloned())
    }

    fn get_telemetry_expectation(&mut self) -> Result<Option<TelemetrySummary>> {
        Ok(self.config.telemetry.clone())
    }
}

impl YAMLConfiguration {
    /// Construct a new `YAMLConfiguration`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read YAML from a reader
    ///
    /// ```
    /// # use grpcconf::configuration::{Configuration, YAMLConfiguration};
    /// # #[path = "../doctest.rs"]
    /// # mod doctest;
    /// # let tmpfile = doctest::generate_example_yaml();
    /// # let filepath = tmpfile.path();
    /// # use std::fs::File;
    /// # let mut yaml_config = YAMLConfiguration::new();
    /// yaml_config.read(File::open(filepath)?)?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Will return `Err` if the configuration could not be parsed.
    pub fn read<R: Read>(&mut self, reader: R) -> Result<()> {
        self.config = serde_yaml::from_reader(reader).context("Reading YAML file")?;
        Ok(())
    }
}
