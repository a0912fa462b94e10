//! ASCII branch graph of a revision history.
//!
//! [`render`] draws one column per open branch ("lane"), newest revision on
//! top:
//!
//! ```text
//! o |	3: commit 3
//! | |
//! | |
//! | o	2: commit 2
//! | |
//! |/
//! o	1: commit 1
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::types::Revision;

const NODE: &str = "o";
const PIPE: &str = "|";

/// One output line of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphLine {
    /// Lane glyphs, followed by `\t<id>: <message>` on node lines.
    pub text: String,
    /// Tag of the revision drawn on this line (node lines only).
    pub tag: Option<String>,
}

impl GraphLine {
    fn connector(text: String) -> Self {
        Self { text, tag: None }
    }
}

impl fmt::Display for GraphLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(ref tag) => write!(f, "{}\t{}", self.text, tag),
            None => f.write_str(&self.text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    /// Waiting for this revision to be drawn.
    Pending(u64),
    /// A finished branch still drawn as a pass-through.
    Done,
}

/// Number of connector rows drawn below a revision with `children` children.
pub fn connector_rows(children: usize) -> usize {
    std::cmp::max(2, 2 * children.saturating_sub(1))
}

/// Render `revisions` (oldest first) as a lane graph, newest line first.
///
/// Children of a revision take over its lane newest-first; the remaining
/// children open lanes right after it. A revision whose parent is not in
/// `revisions` opens a new lane at the right edge.
pub fn render(revisions: &[Revision]) -> Vec<GraphLine> {
    let Some(first) = revisions.first() else {
        return Vec::new();
    };

    let mut children: HashMap<u64, Vec<u64>> = HashMap::new();
    for rev in revisions {
        // the root record points at itself
        if rev.parent != rev.id {
            children.entry(rev.parent).or_default().push(rev.id);
        }
    }

    let mut lanes = vec![Lane::Pending(first.id)];
    let mut lines = Vec::new();
    let last = revisions.len() - 1;

    for (i, rev) in revisions.iter().enumerate() {
        let idx = match lanes.iter().position(|l| *l == Lane::Pending(rev.id)) {
            Some(idx) => idx,
            None => {
                lanes.push(Lane::Pending(rev.id));
                lanes.len() - 1
            }
        };

        lines.push(GraphLine {
            text: format!("{}\t{}", node_row(lanes.len(), idx), label(rev)),
            tag: rev.tag.clone(),
        });

        let kids: Vec<Lane> = children
            .get(&rev.id)
            .map(|ids| ids.iter().rev().map(|&id| Lane::Pending(id)).collect())
            .unwrap_or_default();
        let fanned = kids.len();
        let before = lanes.len();

        if kids.is_empty() {
            lanes[idx] = Lane::Done;
        } else {
            lanes.splice(idx..=idx, kids);
        }

        if i < last {
            let rows = connector_block(idx, before, fanned, lanes.len());
            lines.extend(rows.into_iter().map(GraphLine::connector));
        }
    }

    lines.reverse();
    lines
}

fn label(rev: &Revision) -> String {
    match rev.message.as_deref().and_then(|m| m.lines().next()) {
        Some(first_line) => format!("{}: {}", rev.id, first_line.trim_end()),
        None => rev.id.to_string(),
    }
}

fn node_row(width: usize, idx: usize) -> String {
    (0..width)
        .map(|c| if c == idx { NODE } else { PIPE })
        .collect::<Vec<_>>()
        .join(" ")
}

fn pipes(width: usize) -> String {
    vec![PIPE; width].join(" ")
}

/// Rows between a node at lane `idx` and the next node, in drawing order
/// (bottom-up; [`render`] reverses at the end).
fn connector_block(idx: usize, before: usize, fanned: usize, after: usize) -> Vec<String> {
    let count = connector_rows(fanned);
    if fanned <= 1 {
        return vec![pipes(after); count];
    }

    let right = before - idx - 1;
    if fanned == 2 {
        return vec![slant_row(idx, 1 + right), pipes(after)];
    }

    let mut rows = Vec::with_capacity(count);
    for opened in 1..fanned {
        rows.push(slant_row(idx, opened + right));
        rows.push(shift_row(idx, opened + right));
    }
    rows
}

/// `moving` lanes leave the node column diagonally: `| |/ / /`.
fn slant_row(idx: usize, moving: usize) -> String {
    let mut row = "| ".repeat(idx);
    row.push_str("|/");
    row.push_str(&" /".repeat(moving - 1));
    row
}

/// `moving` lanes mid-shift, drawn on their columns: `| | / / /`.
fn shift_row(idx: usize, moving: usize) -> String {
    let mut row = "| ".repeat(idx);
    row.push('|');
    row.push_str(&" /".repeat(moving));
    row
}
