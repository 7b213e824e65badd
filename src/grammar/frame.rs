//! Frames: named groups of slot nets.

use super::network::NetId;
use std::fmt;

/// Position of a frame in the frames file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub(crate) usize);

impl FrameId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub(crate) name: String,
    pub(crate) slots: Vec<NetId>,
    /// Name of the slot net marked with `!`, if any.
    pub(crate) tense_slot: Option<String>,
}

impl Frame {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Frame { name: name.into(), slots: Vec::new(), tense_slot: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[NetId] {
        &self.slots
    }

    pub fn has_slot(&self, net: NetId) -> bool {
        self.slots.contains(&net)
    }

    pub fn tense_slot(&self) -> Option<&str> {
        self.tense_slot.as_deref()
    }
}
