//! Recursive transition networks.
//!
//! A [`Net`] is a small automaton: an ordered list of [`Node`]s, node 0 being
//! the start state, each node owning its outgoing [`NetArc`]s. Arcs come in
//! three kinds:
//!
//! ```text
//! Word  ── consumes one token equal to a literal (or a lemma + features)
//! Null  ── epsilon, consumes nothing
//! Call  ── consumes whatever a whole other net matches at this position
//! ```
//!
//! ## Forward references
//!
//! Net files are read top to bottom, yet an arc may point at a node further
//! down its own net or at a net declared later in the file (including the net
//! it belongs to). Arcs therefore store *indices* and bind them lazily:
//! [`NodeLink`] and [`NetLink`] resolve on first use and cache the resolved id
//! in a `OnceCell`. Resolution for nets goes through the [`NetResolver`] seam,
//! which the grammar implements once every net is loaded.
//!
//! ## Invariants
//!
//! - A net has at least one node.
//! - Every `NodeLink` index is `< nodes.len()` of the owning net and every
//!   `NetLink` names a declared net index; the loader rejects anything else,
//!   so resolution after a successful load never misses.

use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

/// Arena index of a net inside a [`Grammar`](crate::Grammar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(pub(crate) usize);

impl NetId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a node inside its net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const START: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Role of a net, read off the character after the opening bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetType {
    /// `[Name]`: a slot or concept that shows up in output.
    Basic,
    /// `[name]`: structural helper, transparent in concise output.
    Aux,
    /// `[_name]`: pre-terminal category.
    Preterminal,
    /// `[$name]`: functional net.
    Functional,
}

impl NetType {
    pub fn from_name(name: &str) -> Self {
        match name.chars().nth(1) {
            Some('_') => NetType::Preterminal,
            Some('$') => NetType::Functional,
            Some(c) if !c.is_lowercase() => NetType::Basic,
            _ => NetType::Aux,
        }
    }
}

bitflags::bitflags! {
    /// Per-net properties known after load.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NetFlags: u8 {
        /// Terminal text is preserved verbatim in concise output.
        const CONCEPT_LEAF = 1 << 0;
        /// The net is a slot of at least one frame.
        const ACTIVE       = 1 << 1;
    }
}

/// Admissible grammar features of an arc.
///
/// Written in grammar files as `{ИМ.ЕД|ВИН}`: a disjunction of alternatives,
/// each alternative a dot-joined conjunction of feature values. The special
/// alternative `=` asks for an exact surface match instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    alternatives: Vec<Vec<String>>,
    exact: bool,
}

impl FeatureSet {
    pub const EXACT_FORM: &'static str = "=";

    /// Parse a feature column. `_` means "no column" and yields `None`.
    pub fn parse(column: &str) -> Option<Result<FeatureSet, String>> {
        let column = column.trim();
        if column == "_" {
            return None;
        }
        let Some(caps) = regex!(r"^\{([^{}]*)\}$").captures(column) else {
            return Some(Err(format!("feature column `{column}` is not of the form {{a|b.c}}")));
        };
        let mut set = FeatureSet::default();
        for alt in caps[1].split('|').map(str::trim).filter(|a| !a.is_empty()) {
            set.push_alternative(alt);
        }
        Some(Ok(set))
    }

    pub fn from_alternatives<'a>(alternatives: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = FeatureSet::default();
        for alt in alternatives {
            set.push_alternative(alt);
        }
        set
    }

    fn push_alternative(&mut self, alt: &str) {
        if alt == Self::EXACT_FORM {
            self.exact = true;
        } else {
            self.alternatives.push(alt.split('.').map(str::to_string).collect());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty() && !self.exact
    }

    /// True when the arc must match the surface form literally.
    pub fn requires_exact_form(&self) -> bool {
        self.exact || self.alternatives.is_empty()
    }

    /// True if some alternative has all of its parts among `values`.
    pub fn admits<'v>(&self, values: impl Iterator<Item = &'v str> + Clone) -> bool {
        self.alternatives.iter().any(|alt| alt.iter().all(|part| values.clone().any(|v| v == part)))
    }

    /// Same check against a category → value map.
    pub fn admits_map(&self, features: &BTreeMap<String, String>) -> bool {
        self.admits(features.values().map(String::as_str))
    }
}

/// Lazily bound reference to a node of the owning net.
#[derive(Debug, Clone)]
pub struct NodeLink {
    index: usize,
    resolved: OnceCell<NodeId>,
}

impl NodeLink {
    pub(crate) fn new(index: usize) -> Self {
        NodeLink { index, resolved: OnceCell::new() }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn resolve(&self, owner: &Net) -> Option<NodeId> {
        if let Some(id) = self.resolved.get() {
            return Some(*id);
        }
        let id = owner.node_id(self.index)?;
        Some(*self.resolved.get_or_init(|| id))
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

/// Maps the 1-based net index used inside net files to an arena id.
pub trait NetResolver {
    fn net_by_declared_index(&self, declared: usize) -> Option<NetId>;
}

/// Lazily bound reference to a net, by its declared (file) index.
#[derive(Debug, Clone)]
pub struct NetLink {
    declared: usize,
    resolved: OnceCell<NetId>,
}

impl NetLink {
    pub(crate) fn new(declared: usize) -> Self {
        NetLink { declared, resolved: OnceCell::new() }
    }

    pub fn declared_index(&self) -> usize {
        self.declared
    }

    pub fn resolve<R: NetResolver + ?Sized>(&self, resolver: &R) -> Option<NetId> {
        if let Some(id) = self.resolved.get() {
            return Some(*id);
        }
        let id = resolver.net_by_declared_index(self.declared)?;
        Some(*self.resolved.get_or_init(|| id))
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

/// A transition between two nodes of one net.
#[derive(Debug, Clone)]
pub enum NetArc {
    Word { to: NodeLink, word: String, features: FeatureSet, head: bool },
    Null { to: NodeLink },
    Call { to: NodeLink, net: NetLink, features: FeatureSet, head: bool },
}

impl NetArc {
    pub fn destination(&self) -> &NodeLink {
        match self {
            NetArc::Word { to, .. } | NetArc::Null { to } | NetArc::Call { to, .. } => to,
        }
    }

    /// Whether the arc passes its features up to the enclosing match.
    pub fn is_head(&self) -> bool {
        match self {
            NetArc::Word { head, .. } | NetArc::Call { head, .. } => *head,
            NetArc::Null { .. } => false,
        }
    }
}

/// A state of a net.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub(crate) is_final: bool,
    pub(crate) arcs: Vec<NetArc>,
}

impl Node {
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn arcs(&self) -> &[NetArc] {
        &self.arcs
    }
}

/// One recursive transition network, i.e. one grammar rule.
#[derive(Debug, Clone)]
pub struct Net {
    pub(crate) name: String,
    pub(crate) declared_index: usize,
    pub(crate) net_type: NetType,
    pub(crate) flags: NetFlags,
    pub(crate) nodes: Vec<Node>,
}

impl Net {
    pub(crate) fn new(name: String, declared_index: usize, concept_leaf: bool, nodes: Vec<Node>) -> Self {
        let net_type = NetType::from_name(&name);
        let flags = if concept_leaf { NetFlags::CONCEPT_LEAF } else { NetFlags::empty() };
        Net { name, declared_index, net_type, flags, nodes }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_index(&self) -> usize {
        self.declared_index
    }

    pub fn net_type(&self) -> NetType {
        self.net_type
    }

    pub fn flags(&self) -> NetFlags {
        self.flags
    }

    pub fn is_concept_leaf(&self) -> bool {
        self.flags.contains(NetFlags::CONCEPT_LEAF)
    }

    pub fn is_active(&self) -> bool {
        self.flags.contains(NetFlags::ACTIVE)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_id(&self, index: usize) -> Option<NodeId> {
        (index < self.nodes.len()).then_some(NodeId(index))
    }

    /// Name used by concise rendering; empty for AUX nets.
    ///
    /// ```text
    /// [Greet]   -> "[Greet]"
    /// [greet]   -> ""
    /// [_city]   -> "city"
    /// [$number] -> "$number"
    /// ```
    pub fn concise_name(&self) -> &str {
        let len = self.name.len();
        match self.net_type {
            NetType::Basic => &self.name,
            NetType::Aux => "",
            NetType::Preterminal => self.name.get(2..len.saturating_sub(1)).unwrap_or(""),
            NetType::Functional => self.name.get(1..len.saturating_sub(1)).unwrap_or(""),
        }
    }
}
