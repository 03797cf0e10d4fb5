// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Talk to the device through external programs

use crate::device::Device;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A device reached via external programs
///
/// The push program receives the configuration text on stdin,
/// the show program gets the command as last argument and prints the output.
#[derive(Debug, Clone)]
pub struct CommandDevice {
    push_program: Vec<String>,
    show_program: Vec<String>,
}

impl CommandDevice {
    /// Create a new `CommandDevice`
    ///
    /// Each program is given as program name followed by its fixed arguments,
    /// e.g. `["ssh", "admin@router", "configure"]`.
    /// An empty program is only reported when it is needed.
    #[must_use]
    pub const fn new(push_program: Vec<String>, show_program: Vec<String>) -> Self {
        Self {
            push_program,
            show_program,
        }
    }

    fn command(program: &[String], purpose: &str) -> Result<Command> {
        let (name, args) = program
            .split_first()
            .ok_or_else(|| anyhow!("No {purpose} program given"))?;
        let mut cmd = Command::new(name);
        cmd.args(args);
        Ok(cmd)
    }

    async fn execute(mut cmd: Command, stdin: Option<&str>) -> Result<String> {
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to execute command {:?}", cmd.as_std()))?;

        let child_stdin = match stdin {
            Some(_) => Some(
                child
                    .stdin
                    .take()
                    .ok_or_else(|| anyhow!("No stdin for command {:?}", cmd.as_std()))?,
            ),
            None => None,
        };

        // output is collected while writing, a chatty program would block otherwise
        let write_input = async {
            if let (Some(mut child_stdin), Some(input)) = (child_stdin, stdin) {
                child_stdin
                    .write_all(input.as_bytes())
                    .await
                    .with_context(|| format!("Failed to write to command {:?}", cmd.as_std()))?;
            }
            Ok::<(), anyhow::Error>(())
        };
        let wait = async {
            child
                .wait_with_output()
                .await
                .with_context(|| format!("Failed to wait for command {:?}", cmd.as_std()))
        };
        let ((), output) = tokio::try_join!(write_input, wait)?;

        if !output.status.success() {
            let stderr = String::from_utf8(output.stderr).with_context(|| {
                format!(
                    "Invalid UTF-8 sequence returned when executing\n{:?}",
                    cmd.as_std()
                )
            })?;

            return Err(anyhow!(
                "Command\n{:?}\nfailed with status: {}, {}",
                cmd.as_std(),
                output.status,
                stderr
            ));
        }

        String::from_utf8(output.stdout).with_context(|| {
            format!(
                "Invalid UTF-8 sequence returned when executing\n{:?}",
                cmd.as_std()
            )
        })
    }
}

#[async_trait]
impl Device for CommandDevice {
    async fn push_config(&self, config: &str) -> Result<()> {
        let cmd = Self::command(&self.push_program, "push")?;
        Self::execute(cmd, Some(config)).await?;
        Ok(())
    }

    async fn run_command(&self, command: &str) -> Result<String> {
        let mut cmd = Self::command(&self.show_program, "show")?;
        cmd.arg(command);
        Self::execute(cmd, None).await
    }
}
