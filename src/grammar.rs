//! Grammar store: dictionary, nets and frames, loaded once and read many times.
//!
//! ```text
//! dictionary file ──read_dictionary──┐
//!                                    v
//! nets file ─────────read_nets───> NetTable ──┐
//!                                             v
//! frames file ───────read_frames──────> Vec<Frame>
//!                                             │
//!                                             v
//!                         Grammar { nets, frames, possible_frames, active }
//! ```
//!
//! A [`Grammar`] only exists once all three resources parsed cleanly; there is
//! no way to observe a half-loaded one. After construction it is immutable
//! (apart from the lazily cached arc bindings, which are thread-safe), so a
//! single instance can serve any number of parser engines and threads.

#[path = "grammar/dictionary.rs"]
mod dictionary;
#[path = "grammar/frame.rs"]
mod frame;
#[path = "grammar/loader.rs"]
mod loader;
#[path = "grammar/network.rs"]
mod network;

pub use dictionary::{Dictionary, MAX_WORD_ID};
pub use frame::{Frame, FrameId};
pub use network::{FeatureSet, Net, NetArc, NetFlags, NetId, NetLink, NetResolver, NetType, Node, NodeId, NodeLink};

use crate::error::GrammarFormatError;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug)]
pub struct Grammar {
    dictionary: Dictionary,
    nets: Vec<Net>,
    /// Declared (1-based) net index → arena id.
    declared: Vec<Option<NetId>>,
    by_name: HashMap<String, NetId>,
    frames: Vec<Frame>,
    frames_by_name: HashMap<String, FrameId>,
    /// Frames each net is a slot of, indexed by `NetId`.
    possible_frames: Vec<Vec<FrameId>>,
    /// Unique slot nets in frame order.
    active: Vec<NetId>,
}

impl Grammar {
    /// Load a grammar from its three resource files.
    pub fn load(
        dictionary: impl AsRef<Path>,
        nets: impl AsRef<Path>,
        frames: impl AsRef<Path>,
    ) -> Result<Self, GrammarFormatError> {
        let (dict_label, dict_text) = read_resource(dictionary.as_ref())?;
        let (nets_label, nets_text) = read_resource(nets.as_ref())?;
        let (frames_label, frames_text) = read_resource(frames.as_ref())?;
        Self::build(
            (dict_label.as_str(), dict_text.as_str()),
            (nets_label.as_str(), nets_text.as_str()),
            (frames_label.as_str(), frames_text.as_str()),
        )
    }

    /// Build a grammar from in-memory resource texts.
    ///
    /// Errors name the resources `<dictionary>`, `<nets>` and `<frames>`.
    pub fn from_sources(dictionary: &str, nets: &str, frames: &str) -> Result<Self, GrammarFormatError> {
        Self::build(("<dictionary>", dictionary), ("<nets>", nets), ("<frames>", frames))
    }

    fn build(
        (dict_label, dict_text): (&str, &str),
        (nets_label, nets_text): (&str, &str),
        (frames_label, frames_text): (&str, &str),
    ) -> Result<Self, GrammarFormatError> {
        let dictionary = loader::read_dictionary(dict_label, dict_text)?;
        let loader::NetTable { mut nets, declared } = loader::read_nets(nets_label, nets_text, &dictionary)?;

        let by_name: HashMap<String, NetId> =
            nets.iter().enumerate().map(|(idx, net)| (net.name.clone(), NetId(idx))).collect();
        let frames = loader::read_frames(frames_label, frames_text, &by_name)?;

        let mut possible_frames: Vec<Vec<FrameId>> = vec![Vec::new(); nets.len()];
        let mut active: Vec<NetId> = Vec::new();
        for (idx, frame) in frames.iter().enumerate() {
            for &slot in &frame.slots {
                possible_frames[slot.0].push(FrameId(idx));
                if !active.contains(&slot) {
                    active.push(slot);
                }
                nets[slot.0].flags |= NetFlags::ACTIVE;
            }
        }

        let frames_by_name = frames.iter().enumerate().map(|(idx, f)| (f.name.clone(), FrameId(idx))).collect();

        tracing::info!(
            words = dictionary.len(),
            nets = nets.len(),
            frames = frames.len(),
            active = active.len(),
            "grammar loaded"
        );

        Ok(Grammar { dictionary, nets, declared, by_name, frames, frames_by_name, possible_frames, active })
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.0]
    }

    /// Look a net up by name, with or without the surrounding brackets.
    pub fn find_net_by_name(&self, name: &str) -> Option<NetId> {
        if name.starts_with('[') {
            self.by_name.get(name).copied()
        } else {
            self.by_name.get(&format!("[{name}]")).copied()
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0]
    }

    pub fn frame_by_name(&self, name: &str) -> Option<&Frame> {
        self.frames_by_name.get(name).map(|id| &self.frames[id.0])
    }

    pub fn frame_id(&self, name: &str) -> Option<FrameId> {
        self.frames_by_name.get(name).copied()
    }

    /// Frames `net` is a slot of, in frame order.
    pub fn possible_frames_for_net(&self, net: NetId) -> &[FrameId] {
        &self.possible_frames[net.0]
    }

    /// Every net that is a slot of some frame, each once, in frame order.
    pub fn active_nets(&self) -> &[NetId] {
        &self.active
    }
}

impl NetResolver for Grammar {
    fn net_by_declared_index(&self, declared: usize) -> Option<NetId> {
        self.declared.get(declared.checked_sub(1)?).copied().flatten()
    }
}

fn read_resource(path: &Path) -> Result<(String, String), GrammarFormatError> {
    let label = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(text) => Ok((label, text)),
        Err(source) => Err(GrammarFormatError::Io { file: label, source }),
    }
}
