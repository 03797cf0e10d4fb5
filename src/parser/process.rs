// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Parse the process listing of the gRPC daemon

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static RESPAWN_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Respawn count:\s+(\d+)").expect("Invalid respawn count regex"));

/// Parse how often a process was respawned
///
/// ```
/// use grpcconf::parser::parse_respawn_count;
///
/// let text = "Job Id: 1234\nPID: 5678\nRespawn count: 3\n";
/// assert_eq!(parse_respawn_count(text)?, 3);
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Will return `Err` if the text does not contain a respawn count.
pub fn parse_respawn_count(text: &str) -> Result<u64> {
    let count = RESPAWN_COUNT
        .captures(text)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| anyhow!("could not parse respawn count from output:\n{text}"))?;

    count
        .as_str()
        .parse()
        .context("Converting respawn count")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respawn_count() -> Result<()> {
        let text = concat!(
            "                  Job Id: 1181\n",
            "                     PID: 4211\n",
            "            Process name: emsd\n",
            "           Respawn count: 2\n",
        );
        assert_eq!(parse_respawn_count(text)?, 2);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "could not parse respawn count")]
    fn test_missing_respawn_count() {
        parse_respawn_count("Process name: emsd\n").unwrap();
    }

    #[test]
    fn test_overflowing_respawn_count() {
        let result = parse_respawn_count("Respawn count: 99999999999999999999999");
        assert!(result.unwrap_err().to_string().contains("Converting respawn count"));
    }
}
