// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Flatten a [`ConfigDelta`] into the indented CLI text accepted by the device
//!
//! ```
//! use grpcconf::delta::{ConfigDelta, SubBlock};
//! use grpcconf::renderer::render;
//!
//! let mut server = SubBlock::new("server server1");
//! server.add("port 56666");
//! server.remove("vrf blue");
//!
//! let mut delta = ConfigDelta::new("grpc");
//! delta.add("dscp cs3");
//! delta.add_sub_block(server);
//!
//! assert_eq!(
//!     render(&delta),
//!     "grpc\n dscp cs3\n server server1\n  port 56666\n  no vrf blue\n !\n"
//! );
//!
//! // nothing but the block opener is a no-op
//! assert_eq!(render(&ConfigDelta::new("grpc")), "");
//! ```

use crate::delta::{ConfigDelta, ConfigLine, Polarity};

const BLOCK_INDENT: &str = " ";
const SUB_BLOCK_INDENT: &str = "  ";
const SENTINEL: &str = "!";

/// Render the delta to text
///
/// Returns an empty string if there is nothing to push, i.e. the
/// result would consist of the block opener only.
#[must_use]
pub fn render(delta: &ConfigDelta) -> String {
    let mut out = String::new();

    if delta.is_whole_block_removal() {
        push_line(&mut out, "", "no ", delta.service_name());
        push_line(&mut out, "", "", SENTINEL);
        return out;
    }

    push_line(&mut out, "", "", delta.service_name());

    for line in delta.lines() {
        push_config_line(&mut out, BLOCK_INDENT, line);
    }

    for sub_block in delta.sub_blocks() {
        push_line(&mut out, BLOCK_INDENT, "", sub_block.name());
        for line in sub_block.lines() {
            push_config_line(&mut out, SUB_BLOCK_INDENT, line);
        }
        push_line(&mut out, BLOCK_INDENT, "", SENTINEL);
    }

    let trimmed = out.trim();
    if trimmed.is_empty() || trimmed == delta.service_name() {
        return String::new();
    }

    out
}

fn push_config_line(out: &mut String, indent: &str, line: &ConfigLine) {
    let prefix = match line.polarity() {
        Polarity::Apply => "",
        Polarity::Remove => "no ",
    };
    push_line(out, indent, prefix, line.text());
}

fn push_line(out: &mut String, indent: &str, prefix: &str, text: &str) {
    out.push_str(indent);
    out.push_str(prefix);
    out.push_str(text);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::SubBlock;

    #[test]
    fn test_whole_block_removal_supersedes_content() {
        let mut delta = ConfigDelta::whole_block_removal("grpc");
        delta.add("port 57777");
        delta.add_sub_block(SubBlock::new("server server1"));
        assert_eq!(render(&delta), "no grpc\n!\n");
    }

    #[test]
    fn test_empty_delta_collapses() {
        assert_eq!(render(&ConfigDelta::new("grpc")), "");
        assert_eq!(render(&ConfigDelta::new("")), "");
    }

    #[test]
    fn test_top_level_lines() {
        let mut delta = ConfigDelta::new("grpc");
        delta.add("vrf mgmt");
        delta.remove("gnmi");
        assert_eq!(render(&delta), "grpc\n vrf mgmt\n no gnmi\n");
    }

    #[test]
    fn test_sub_block_without_body() {
        let mut delta = ConfigDelta::new("grpc");
        delta.add_sub_block(SubBlock::new("no server server1"));
        assert_eq!(render(&delta), "grpc\n no server server1\n !\n");
    }

    #[test]
    fn test_multiple_sub_blocks_keep_order() {
        let mut first = SubBlock::new("server a");
        first.add("port 1");
        let mut second = SubBlock::new("server b");
        second.remove("port 2");

        let mut delta = ConfigDelta::new("grpc");
        delta.add_sub_block(first);
        delta.add_sub_block(second);

        assert_eq!(
            render(&delta),
            "grpc\n server a\n  port 1\n !\n server b\n  no port 2\n !\n"
        );
    }
}
