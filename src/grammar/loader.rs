//! Readers for the three grammar resources.
//!
//! ```text
//! dictionary   WORD ID
//! nets         Number of Nets= N
//!              NAME NET_INDEX NUM_NODES LEAF_FLAG [FEATS]
//!                NODE_INDEX NUM_ARCS FINAL_FLAG
//!                  WORD_ID NET_ID TO_NODE [HEAD_FLAG] [FEATS]
//! frames       FUNCTION: name
//!              NETS:
//!                [Slot]
//!                [TenseSlot]!
//!              ;
//! ```
//!
//! Every reader works on the whole text of one resource and reports the first
//! problem it meets with the resource label and a 1-based line number.

use super::dictionary::{Dictionary, MAX_WORD_ID};
use super::frame::Frame;
use super::network::{FeatureSet, Net, NetArc, NetId, NetLink, Node, NodeLink};
use crate::error::GrammarFormatError;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Non-blank lines, trimmed, with their line numbers.
struct Lines<'a> {
    file: &'a str,
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(file: &'a str, text: &'a str) -> Self {
        Lines { file, inner: text.lines().enumerate(), last: 0 }
    }

    fn next_content(&mut self) -> Option<(usize, &'a str)> {
        for (idx, line) in self.inner.by_ref() {
            self.last = idx + 1;
            let line = line.trim();
            if !line.is_empty() {
                return Some((idx + 1, line));
            }
        }
        None
    }

    fn require(&mut self, what: &str) -> Result<(usize, &'a str), GrammarFormatError> {
        self.next_content().ok_or_else(|| {
            GrammarFormatError::malformed(self.file, self.last + 1, format!("unexpected end of file, expected {what}"))
        })
    }
}

fn parse_field<T: FromStr>(file: &str, line: usize, value: &str, what: &str) -> Result<T, GrammarFormatError> {
    value.parse().map_err(|_| GrammarFormatError::malformed(file, line, format!("{what} `{value}` is not a number")))
}

fn parse_flag(file: &str, line: usize, value: &str, what: &str) -> Result<bool, GrammarFormatError> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(GrammarFormatError::malformed(file, line, format!("{what} must be 0 or 1, found `{value}`"))),
    }
}

fn feature_column(file: &str, line: usize, column: &str) -> Result<Option<FeatureSet>, GrammarFormatError> {
    FeatureSet::parse(column).transpose().map_err(|reason| GrammarFormatError::malformed(file, line, reason))
}

fn is_net_name(name: &str) -> bool {
    name.len() >= 3 && name.starts_with('[') && name.ends_with(']')
}

pub(crate) fn read_dictionary(file: &str, text: &str) -> Result<Dictionary, GrammarFormatError> {
    let mut dictionary = Dictionary::default();
    let mut lines = Lines::new(file, text);

    while let Some((line, content)) = lines.next_content() {
        let mut fields = content.split_whitespace();
        let (Some(word), Some(id), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(GrammarFormatError::malformed(file, line, "expected `WORD ID`"));
        };
        let id: i64 = parse_field(file, line, id, "word id")?;
        if !(0..=MAX_WORD_ID).contains(&id) {
            return Err(GrammarFormatError::WordIdOutOfRange { file: file.to_string(), line, id });
        }
        dictionary.insert(id as u32, word);
    }

    Ok(dictionary)
}

/// Nets in file order plus the declared-index → arena-id map (index 0 is
/// declared index 1).
#[derive(Debug)]
pub(crate) struct NetTable {
    pub nets: Vec<Net>,
    pub declared: Vec<Option<NetId>>,
}

/// What an arc line needs to know about its surroundings.
struct ArcScope<'a> {
    file: &'a str,
    net: &'a str,
    node_count: usize,
    net_count: usize,
    common: Option<&'a FeatureSet>,
    dictionary: &'a Dictionary,
}

pub(crate) fn read_nets(file: &str, text: &str, dictionary: &Dictionary) -> Result<NetTable, GrammarFormatError> {
    let mut lines = Lines::new(file, text);
    let (header_line, header) = lines.require("the `Number of Nets=N` header")?;
    let count: usize = regex!(r"(\d+)\s*$")
        .captures(header)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| GrammarFormatError::malformed(file, header_line, "header must end with the number of nets"))?;

    let mut nets: Vec<Net> = Vec::with_capacity(count);
    let mut declared: Vec<Option<NetId>> = vec![None; count];
    let mut names: HashSet<String> = HashSet::new();

    while let Some((line, content)) = lines.next_content() {
        let net = read_net(&mut lines, line, content, count, dictionary)?;
        let slot = &mut declared[net.declared_index - 1];
        if slot.is_some() {
            return Err(GrammarFormatError::malformed(
                file,
                line,
                format!("net index {} is used twice", net.declared_index),
            ));
        }
        if !names.insert(net.name.clone()) {
            return Err(GrammarFormatError::malformed(file, line, format!("net `{}` is defined twice", net.name)));
        }
        *slot = Some(NetId(nets.len()));
        nets.push(net);
    }

    if nets.len() != count {
        return Err(GrammarFormatError::malformed(
            file,
            header_line,
            format!("header declares {count} nets but the file defines {}", nets.len()),
        ));
    }

    Ok(NetTable { nets, declared })
}

fn read_net(
    lines: &mut Lines<'_>,
    line: usize,
    header: &str,
    net_count: usize,
    dictionary: &Dictionary,
) -> Result<Net, GrammarFormatError> {
    let file = lines.file;
    let fields: Vec<&str> = header.split_whitespace().collect();
    if !(4..=5).contains(&fields.len()) {
        return Err(GrammarFormatError::malformed(file, line, "net line expects `NAME INDEX NODES LEAF [FEATS]`"));
    }

    let name = fields[0];
    if !is_net_name(name) {
        return Err(GrammarFormatError::malformed(file, line, format!("`{name}` is not a bracketed net name")));
    }
    let index: usize = parse_field(file, line, fields[1], "net index")?;
    if index == 0 || index > net_count {
        return Err(GrammarFormatError::malformed(
            file,
            line,
            format!("net index {index} is outside 1..={net_count}"),
        ));
    }
    let node_count: usize = parse_field(file, line, fields[2], "node count")?;
    if node_count == 0 {
        return Err(GrammarFormatError::malformed(file, line, format!("net `{name}` declares no nodes")));
    }
    let concept_leaf = parse_flag(file, line, fields[3], "leaf flag")?;
    let common = match fields.get(4) {
        Some(column) => feature_column(file, line, column)?,
        None => None,
    };

    let scope = ArcScope { file, net: name, node_count, net_count, common: common.as_ref(), dictionary };
    let mut nodes = Vec::with_capacity(node_count);

    for expected in 0..node_count {
        let (line, content) = lines.require(&format!("node {expected} of {name}"))?;
        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(GrammarFormatError::malformed(file, line, "node line expects `INDEX ARCS FINAL`"));
        }
        let index: usize = parse_field(file, line, fields[0], "node index")?;
        if index != expected {
            return Err(GrammarFormatError::malformed(
                file,
                line,
                format!("expected node {expected} of {name}, found node {index}"),
            ));
        }
        let arc_count: usize = parse_field(file, line, fields[1], "arc count")?;
        let is_final = parse_flag(file, line, fields[2], "final flag")?;

        let mut arcs = Vec::with_capacity(arc_count);
        for _ in 0..arc_count {
            let (line, content) = lines.require(&format!("an arc of node {expected} in {name}"))?;
            arcs.push(read_arc(&scope, line, content)?);
        }
        nodes.push(Node { is_final, arcs });
    }

    Ok(Net::new(name.to_string(), index, concept_leaf, nodes))
}

fn read_arc(scope: &ArcScope<'_>, line: usize, content: &str) -> Result<NetArc, GrammarFormatError> {
    let file = scope.file;
    let fields: Vec<&str> = content.split_whitespace().collect();
    if !(3..=5).contains(&fields.len()) {
        return Err(GrammarFormatError::malformed(file, line, "arc line expects `WORD NET TO [HEAD] [FEATS]`"));
    }

    let word_id: i64 = parse_field(file, line, fields[0], "word id")?;
    let net_id: i64 = parse_field(file, line, fields[1], "net id")?;
    let to: i64 = parse_field(file, line, fields[2], "destination node")?;
    let head = match fields.get(3) {
        Some(value) => parse_flag(file, line, value, "head flag")?,
        None => false,
    };
    let own = match fields.get(4) {
        Some(column) => feature_column(file, line, column)?,
        None => None,
    };
    let features = own.or_else(|| scope.common.cloned()).unwrap_or_default();

    let dangling = |target: String| GrammarFormatError::DanglingReference {
        file: file.to_string(),
        net: scope.net.to_string(),
        target,
    };

    if to < 0 || to as usize >= scope.node_count {
        return Err(dangling(format!("node {to}")));
    }
    let to = NodeLink::new(to as usize);

    if word_id == 0 && net_id == 0 {
        return Ok(NetArc::Null { to });
    }
    if net_id < 0 {
        return Err(GrammarFormatError::malformed(file, line, format!("net id {net_id} is negative")));
    }
    if net_id > 0 {
        if net_id as usize > scope.net_count {
            return Err(dangling(format!("net {net_id}")));
        }
        return Ok(NetArc::Call { to, net: NetLink::new(net_id as usize), features, head });
    }

    let word = u32::try_from(word_id).ok().and_then(|id| scope.dictionary.word(id)).ok_or_else(|| {
        GrammarFormatError::malformed(file, line, format!("word id {word_id} is not in the dictionary"))
    })?;
    Ok(NetArc::Word { to, word: word.to_string(), features, head })
}

/// `[Net]!` and `[Net!]` both mark the tense slot.
fn split_tense_marker(slot: &str) -> (String, bool) {
    let token = slot.split_whitespace().next().unwrap_or(slot);
    if let Some(base) = token.strip_suffix('!') {
        return (base.to_string(), true);
    }
    if let Some(inner) = token.strip_suffix("!]") {
        return (format!("{inner}]"), true);
    }
    (token.to_string(), false)
}

pub(crate) fn read_frames(
    file: &str,
    text: &str,
    nets_by_name: &HashMap<String, NetId>,
) -> Result<Vec<Frame>, GrammarFormatError> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut lines = text.lines().enumerate().map(|(idx, l)| (idx + 1, l.trim()));

    while let Some((line, content)) = lines.next() {
        let Some(rest) = content.strip_prefix("FUNCTION:") else {
            continue;
        };
        let Some(name) = rest.split_whitespace().next() else {
            return Err(GrammarFormatError::malformed(file, line, "`FUNCTION:` needs a frame name"));
        };
        if !seen.insert(name.to_string()) {
            return Err(GrammarFormatError::DuplicateFrame { file: file.to_string(), line, name: name.to_string() });
        }

        let missing_nets =
            || GrammarFormatError::malformed(file, line, format!("frame `{name}` has no `NETS:` section"));
        loop {
            match lines.next() {
                Some((_, l)) if l.starts_with("NETS:") => break,
                Some((_, l)) if l.starts_with("FUNCTION:") || l.starts_with(';') => return Err(missing_nets()),
                Some(_) => continue,
                None => return Err(missing_nets()),
            }
        }

        let mut frame = Frame::new(name);
        loop {
            let Some((slot_line, l)) = lines.next() else {
                return Err(GrammarFormatError::malformed(
                    file,
                    line,
                    format!("frame `{name}` is missing the `;` terminator"),
                ));
            };
            if l.starts_with(';') {
                break;
            }
            if !l.starts_with('[') {
                continue;
            }
            let (net_name, tense) = split_tense_marker(l);
            let net = nets_by_name.get(&net_name).copied().ok_or_else(|| GrammarFormatError::UnknownSlot {
                file: file.to_string(),
                line: slot_line,
                frame: name.to_string(),
                net: net_name.clone(),
            })?;
            if tense {
                frame.tense_slot = Some(net_name);
            }
            if !frame.slots.contains(&net) {
                frame.slots.push(net);
            }
        }

        frames.push(frame);
    }

    Ok(frames)
}
