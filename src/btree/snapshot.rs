//! B-Tree snapshot format
//!
//! ## File Format
//! ```text
//! ORDER=3
//! ROOT_INDEX=0                 (-1 for an empty tree)
//! NODE_COUNT=3
//!                              (blank line ends the header)
//! NODE_0|LEAF=false|KEYS=[10]|VALUES=[ten]|CHILDREN=[1,2]
//! NODE_1|LEAF=true|KEYS=[5,6]|VALUES=[five~six]
//! NODE_2|LEAF=true|KEYS=[12,20]|VALUES=[twelve~twenty]
//! ```
//!
//! Nodes are numbered breadth-first from the root at save time, so ids are
//! not stable across saves.
//!
//! ## Value Escaping
//! ```text
//! \  ->  \\        |  ->  \|        [  ->  \[        ]  ->  \]
//! ~  ->  \~        LF ->  \n        CR ->  \r
//! ```
//!
//! The backslash itself is escaped, so every escaped value decodes back to
//! exactly one raw value.

use std::collections::{HashMap, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{NavError, Result};

use super::node::Node;
use super::tree::BTree;
use super::{MAX_KEYS, ORDER};

/// Deepest tree a snapshot may describe. A valid order-3 tree this deep
/// would hold more records than a `u64` key space.
const MAX_DEPTH: usize = 64;

impl BTree {
    // =========================================================================
    // Save
    // =========================================================================

    /// Write the snapshot to `path`
    ///
    /// The data goes to a temporary sibling file first, is fsynced, then
    /// renamed over `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("tmp");

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        self.write_snapshot(&mut writer)?;

        let file = writer.into_inner().map_err(|e| {
            NavError::Snapshot(format!("Failed to flush snapshot: {}", e))
        })?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Serialize the tree into `writer`
    pub fn write_snapshot<W: Write>(&self, writer: &mut W) -> Result<()> {
        let Some(root) = &self.root else {
            writeln!(writer, "ORDER={}", ORDER)?;
            writeln!(writer, "ROOT_INDEX=-1")?;
            writeln!(writer, "NODE_COUNT=0")?;
            writeln!(writer)?;
            writer.flush()?;
            return Ok(());
        };

        writeln!(writer, "ORDER={}", ORDER)?;
        writeln!(writer, "ROOT_INDEX=0")?;
        writeln!(writer, "NODE_COUNT={}", root.node_count())?;
        writeln!(writer)?;

        // Breadth-first: a child's id is fixed when it is queued, which is
        // also the order its line is written in.
        let mut queue: VecDeque<(usize, &Node)> = VecDeque::new();
        queue.push_back((0, root));
        let mut next_id = 1;

        while let Some((id, node)) = queue.pop_front() {
            let keys = node
                .keys
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let values = node
                .values
                .iter()
                .map(|v| escape_value(v))
                .collect::<Vec<_>>()
                .join("~");

            write!(
                writer,
                "NODE_{}|LEAF={}|KEYS=[{}]|VALUES=[{}]",
                id, node.leaf, keys, values
            )?;

            if !node.leaf {
                let mut child_ids = Vec::with_capacity(node.children.len());
                for child in &node.children {
                    child_ids.push(next_id.to_string());
                    queue.push_back((next_id, child));
                    next_id += 1;
                }
                write!(writer, "|CHILDREN=[{}]", child_ids.join(","))?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Replace the contents of this tree with the snapshot at `path`
    ///
    /// The tree is cleared first, so it is left empty if the snapshot turns
    /// out to be unreadable.
    pub fn load_from(&mut self, path: &Path) -> Result<()> {
        self.clear();
        let file = File::open(path)?;
        *self = Self::read_snapshot(BufReader::new(file))?;
        Ok(())
    }

    /// Parse a snapshot into a new tree
    pub fn read_snapshot<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();

        // Header: KEY=value lines up to the first blank line
        let mut order: Option<usize> = None;
        let mut root_index: i64 = -1;
        let mut node_count: usize = 0;

        for line in lines.by_ref() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            if let Some(v) = line.strip_prefix("ORDER=") {
                order = Some(parse_number(v, "ORDER")?);
            } else if let Some(v) = line.strip_prefix("ROOT_INDEX=") {
                root_index = parse_number(v, "ROOT_INDEX")?;
            } else if let Some(v) = line.strip_prefix("NODE_COUNT=") {
                node_count = parse_number(v, "NODE_COUNT")?;
            } else {
                tracing::debug!("Ignoring unknown snapshot header line: {}", line);
            }
        }

        if node_count == 0 || root_index < 0 {
            return Ok(Self::new());
        }

        if let Some(order) = order {
            if order != ORDER {
                return Err(NavError::Snapshot(format!(
                    "Snapshot order {} does not match tree order {}",
                    order, ORDER
                )));
            }
        }

        let root_index = root_index as usize;
        if root_index >= node_count {
            return Err(NavError::Snapshot(format!(
                "ROOT_INDEX {} out of range for {} nodes",
                root_index, node_count
            )));
        }

        // Pass 1: one parsed node per id. NODE_COUNT is only checked against
        // the lines actually present, never used to size anything.
        let mut pending: HashMap<usize, ParsedNode> = HashMap::new();
        for line in lines {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if !line.starts_with("NODE_") {
                continue;
            }

            let parsed = parse_node_line(line)?;
            let id = parsed.id;
            if id >= node_count {
                return Err(NavError::Snapshot(format!(
                    "Node id {} out of range for {} nodes",
                    id, node_count
                )));
            }
            if pending.insert(id, parsed).is_some() {
                return Err(NavError::Snapshot(format!("Duplicate node id {}", id)));
            }
        }

        if pending.len() != node_count {
            return Err(NavError::Snapshot(format!(
                "NODE_COUNT is {} but {} node lines were found",
                node_count,
                pending.len()
            )));
        }

        // Pass 2: wire children by id, moving each node into its one parent
        let root = assemble(&mut pending, root_index, 1)?;

        let orphans = pending.len();
        if orphans > 0 {
            tracing::warn!("Snapshot has {} unreachable nodes; ignoring them", orphans);
        }

        let mut tree = Self {
            root: Some(root),
            len: 0,
        };
        tree.recount();
        tree.validate()?;
        Ok(tree)
    }
}

// =============================================================================
// Node Line Parsing
// =============================================================================

struct ParsedNode {
    id: usize,
    leaf: bool,
    keys: Vec<u64>,
    values: Vec<String>,
    children: Vec<usize>,
}

fn parse_node_line(line: &str) -> Result<ParsedNode> {
    let fields = split_unescaped(line, '|');

    let id_field = fields
        .first()
        .and_then(|f| f.strip_prefix("NODE_"))
        .ok_or_else(|| NavError::Snapshot(format!("Malformed node line: {}", line)))?;
    let id: usize = parse_number(id_field, "node id")?;

    let mut leaf = None;
    let mut keys = None;
    let mut values = None;
    let mut children = Vec::new();

    for field in &fields[1..] {
        if let Some(v) = field.strip_prefix("LEAF=") {
            leaf = Some(match v {
                "true" => true,
                "false" => false,
                other => {
                    return Err(NavError::Snapshot(format!(
                        "NODE_{}: bad LEAF flag '{}'",
                        id, other
                    )))
                }
            });
        } else if let Some(v) = field.strip_prefix("KEYS=") {
            let body = bracketed(v, id, "KEYS")?;
            let parsed = if body.is_empty() {
                Vec::new()
            } else {
                body.split(',')
                    .map(|k| parse_number(k, "key"))
                    .collect::<Result<Vec<u64>>>()?
            };
            keys = Some(parsed);
        } else if let Some(v) = field.strip_prefix("VALUES=") {
            values = Some(bracketed(v, id, "VALUES")?);
        } else if let Some(v) = field.strip_prefix("CHILDREN=") {
            let body = bracketed(v, id, "CHILDREN")?;
            if !body.is_empty() {
                children = body
                    .split(',')
                    .map(|c| parse_number::<i64>(c, "child id"))
                    .map(|c| {
                        c.and_then(|c| {
                            usize::try_from(c).map_err(|_| {
                                NavError::Snapshot(format!("NODE_{}: missing child id {}", id, c))
                            })
                        })
                    })
                    .collect::<Result<Vec<usize>>>()?;
            }
        }
    }

    let leaf = leaf.ok_or_else(|| NavError::Snapshot(format!("NODE_{}: missing LEAF", id)))?;
    let keys = keys.ok_or_else(|| NavError::Snapshot(format!("NODE_{}: missing KEYS", id)))?;
    let values_body =
        values.ok_or_else(|| NavError::Snapshot(format!("NODE_{}: missing VALUES", id)))?;

    if keys.len() > MAX_KEYS {
        return Err(NavError::Snapshot(format!(
            "NODE_{}: {} keys exceeds maximum {}",
            id,
            keys.len(),
            MAX_KEYS
        )));
    }

    // With no keys there are no values; otherwise the `~`-separated list has
    // exactly one entry per key, empty values included.
    let values: Vec<String> = if keys.is_empty() {
        Vec::new()
    } else {
        split_unescaped(values_body, '~')
            .into_iter()
            .map(unescape_value)
            .collect()
    };
    if values.len() != keys.len() {
        return Err(NavError::Snapshot(format!(
            "NODE_{}: {} keys but {} values",
            id,
            keys.len(),
            values.len()
        )));
    }

    if leaf && !children.is_empty() {
        return Err(NavError::Snapshot(format!("NODE_{}: leaf lists children", id)));
    }
    if !leaf && children.len() != keys.len() + 1 {
        return Err(NavError::Snapshot(format!(
            "NODE_{}: {} keys but {} children",
            id,
            keys.len(),
            children.len()
        )));
    }

    Ok(ParsedNode {
        id,
        leaf,
        keys,
        values,
        children,
    })
}

fn assemble(pending: &mut HashMap<usize, ParsedNode>, id: usize, depth: usize) -> Result<Node> {
    if depth > MAX_DEPTH {
        return Err(NavError::Snapshot(format!(
            "Node {} sits deeper than {} levels",
            id, MAX_DEPTH
        )));
    }

    let parsed = pending.remove(&id).ok_or_else(|| {
        NavError::Snapshot(format!("Node {} is missing or referenced more than once", id))
    })?;

    let mut node = Node::new(parsed.leaf);
    node.keys = parsed.keys;
    node.values = parsed.values;
    for child_id in parsed.children {
        node.children.push(assemble(pending, child_id, depth + 1)?);
    }
    Ok(node)
}

fn bracketed<'a>(field: &'a str, id: usize, name: &str) -> Result<&'a str> {
    field
        .strip_prefix('[')
        .and_then(|f| f.strip_suffix(']'))
        .ok_or_else(|| NavError::Snapshot(format!("NODE_{}: {} is not bracketed", id, name)))
}

fn parse_number<T: std::str::FromStr>(text: &str, what: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| NavError::Snapshot(format!("Invalid {}: '{}'", what, text)))
}

// =============================================================================
// Escaping
// =============================================================================

/// Escape a value for the `VALUES=[...]` list
pub(crate) fn escape_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' | '|' | '[' | ']' | '~' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape_value`]
pub(crate) fn unescape_value(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split on `sep` wherever it is not preceded by an escaping backslash
fn split_unescaped(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}
