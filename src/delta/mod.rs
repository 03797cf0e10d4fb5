// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
//! Hierarchical CLI configuration delta
//!
//! A [`ConfigDelta`] is the structured form of one CLI configuration block
//! (e.g. `grpc`) as it will be pushed to the device. It consists of
//! top-level [`ConfigLine`]s and nested named [`SubBlock`]s and is turned
//! into text by [`crate::renderer::render`].
//!
//! ```
//! use grpcconf::delta::{ConfigDelta, SubBlock};
//!
//! let mut server = SubBlock::new("server server1");
//! server.add("port 56666");
//! server.add("   "); // dropped
//!
//! let mut delta = ConfigDelta::new("grpc");
//! delta.remove("dscp cs3");
//! delta.add_sub_block(server);
//!
//! assert_eq!(delta.lines().len(), 1);
//! assert_eq!(delta.sub_blocks()[0].lines().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// Whether a directive applies or removes a setting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Rendered as is
    Apply,

    /// Rendered with a leading `no`
    Remove,
}

/// One CLI directive without indentation and without `no` prefix
///
/// The text of a `ConfigLine` is never empty or whitespace-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigLine {
    text: String,
    polarity: Polarity,
}

impl ConfigLine {
    /// Create a new line, returns `None` for blank text
    #[must_use]
    pub fn new(text: &str, polarity: Polarity) -> Option<Self> {
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| Self {
            text: trimmed.to_owned(),
            polarity,
        })
    }

    /// Create a new applying line, returns `None` for blank text
    #[must_use]
    pub fn apply(text: &str) -> Option<Self> {
        Self::new(text, Polarity::Apply)
    }

    /// Create a new removing line, returns `None` for blank text
    #[must_use]
    pub fn remove(text: &str) -> Option<Self> {
        Self::new(text, Polarity::Remove)
    }

    /// The bare directive
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Polarity of the directive
    #[must_use]
    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }
}

/// A named nested scope within the top-level block
///
/// The name is a directive on its own and is rendered even without any lines,
/// e.g. `no server server1` removes a whole server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubBlock {
    name: String,
    lines: Vec<ConfigLine>,
}

impl SubBlock {
    /// Create an empty sub-block
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_owned(),
            lines: vec![],
        }
    }

    /// Append a line, blank lines are dropped
    pub fn push(&mut self, line: Option<ConfigLine>) {
        if let Some(l) = line {
            self.lines.push(l);
        }
    }

    /// Append an applying line, blank text is dropped
    pub fn add(&mut self, text: &str) {
        self.push(ConfigLine::apply(text));
    }

    /// Append a removing line, blank text is dropped
    pub fn remove(&mut self, text: &str) {
        self.push(ConfigLine::remove(text));
    }

    /// Name of the sub-block
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lines inside of the sub-block
    #[must_use]
    pub fn lines(&self) -> &[ConfigLine] {
        &self.lines
    }
}

/// Structured representation of a CLI configuration block
///
/// If `whole_block_removal` is set, all other content is ignored when rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigDelta {
    service_name: String,
    lines: Vec<ConfigLine>,
    sub_blocks: Vec<SubBlock>,
    whole_block_removal: bool,
}

impl ConfigDelta {
    /// Create an empty delta for the block opened by `service_name`
    #[must_use]
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.trim().to_owned(),
            lines: vec![],
            sub_blocks: vec![],
            whole_block_removal: false,
        }
    }

    /// Create a delta removing the complete block
    #[must_use]
    pub fn whole_block_removal(service_name: &str) -> Self {
        Self {
            whole_block_removal: true,
            ..Self::new(service_name)
        }
    }

    /// Append a top-level line, blank lines are dropped
    pub fn push(&mut self, line: Option<ConfigLine>) {
        if let Some(l) = line {
            self.lines.push(l);
        }
    }

    /// Append a top-level applying line, blank text is dropped
    pub fn add(&mut self, text: &str) {
        self.push(ConfigLine::apply(text));
    }

    /// Append a top-level removing line, blank text is dropped
    pub fn remove(&mut self, text: &str) {
        self.push(ConfigLine::remove(text));
    }

    /// Append a sub-block
    pub fn add_sub_block(&mut self, sub_block: SubBlock) {
        self.sub_blocks.push(sub_block);
    }

    /// Keyword opening the top-level block
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Top-level lines
    #[must_use]
    pub fn lines(&self) -> &[ConfigLine] {
        &self.lines
    }

    /// Nested sub-blocks
    #[must_use]
    pub fn sub_blocks(&self) -> &[SubBlock] {
        &self.sub_blocks
    }

    /// If the complete block shall be removed
    #[must_use]
    pub const fn is_whole_block_removal(&self) -> bool {
        self.whole_block_removal
    }
}
