//! CLI presentation: text and json formatters per command.

use crate::error::ApiError;
use crate::hash::{DigestMismatch, HashKind};
use crate::store::NodeArena;
use crate::tree::walker;
use crate::types::{digest_hex, NodeKey, NodeKind, RevisionNumber, DOCUMENT_NODE_KEY};
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::Serialize;

/// Longest value shown in text output before it is cut
const VALUE_PREVIEW: usize = 32;

/// Summary of a resource for `treehash info`
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    pub location: String,
    pub hash_kind: HashKind,
    pub revisions: Vec<RevisionInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevisionInfo {
    pub number: RevisionNumber,
    pub committed_at: DateTime<Utc>,
    pub nodes: usize,
    pub root_digest: String,
}

/// One node of `treehash inspect`
#[derive(Debug, Clone, Serialize)]
pub struct InspectRow {
    pub key: NodeKey,
    pub depth: usize,
    pub kind: NodeKind,
    pub name: String,
    pub value: String,
    pub digest: String,
    pub descendant_count: u64,
}

impl InspectRow {
    /// Rows in document order: members of an element directly follow it
    pub fn collect(tree: &NodeArena) -> Result<Vec<InspectRow>, ApiError> {
        let mut rows = Vec::new();
        for entry in walker::walk(tree, DOCUMENT_NODE_KEY)? {
            let record = tree.record(entry.key)?;
            rows.push(InspectRow {
                key: entry.key,
                depth: entry.depth,
                kind: record.kind,
                name: record.name.clone(),
                value: String::from_utf8_lossy(&record.value).into_owned(),
                digest: digest_hex(record.digest),
                descendant_count: record.descendant_count,
            });
        }
        Ok(rows)
    }
}

pub fn format_info_text(info: &ResourceInfo) -> String {
    let mut out = format!(
        "Resource: {}\n  Hash kind: {}\n  Revisions: {}\n\n",
        info.location,
        info.hash_kind,
        info.revisions.len()
    );
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Revision", "Committed", "Nodes", "Root digest"]);
    for revision in &info.revisions {
        table.add_row(vec![
            revision.number.to_string(),
            revision.committed_at.to_rfc3339(),
            revision.nodes.to_string(),
            revision.root_digest.clone(),
        ]);
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_inspect_text(revision: RevisionNumber, rows: &[InspectRow]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Node", "Value", "Digest", "Count"]);
    for row in rows {
        let label = match row.kind {
            NodeKind::Attribute => format!("@{}", row.name),
            NodeKind::Namespace => format!("xmlns:{}", row.name),
            NodeKind::Element => format!("<{}>", row.name),
            kind => kind.to_string(),
        };
        table.add_row(vec![
            row.key.to_string(),
            format!("{}{}", "  ".repeat(row.depth), label),
            preview(&row.value),
            row.digest.clone(),
            row.descendant_count.to_string(),
        ]);
    }
    format!("Revision {}\n\n{}", revision, table)
}

pub fn format_inspect_json(revision: RevisionNumber, rows: &[InspectRow]) -> Result<String, ApiError> {
    let out = serde_json::json!({ "revision": revision, "nodes": rows });
    serde_json::to_string_pretty(&out)
        .map_err(|e| ApiError::InvalidOperation(format!("Failed to encode output: {}", e)))
}

pub fn format_verify_text(revision: RevisionNumber, nodes: usize, mismatches: &[DigestMismatch]) -> String {
    if mismatches.is_empty() {
        return format!(
            "Verification passed:\n  Revision: {}\n  Nodes: {}\n  All digests consistent",
            revision, nodes
        );
    }
    let mut s = format!(
        "Verification failed:\n  Revision: {}\n  Nodes: {}\n\nMismatches ({}):",
        revision,
        nodes,
        mismatches.len()
    );
    for m in mismatches {
        s.push_str(&format!(
            "\n  - node {}: digest {} (expected {}), count {} (expected {})",
            m.key,
            digest_hex(m.actual),
            digest_hex(m.expected),
            m.actual_count,
            m.expected_count
        ));
    }
    s
}

fn preview(value: &str) -> String {
    if value.chars().count() <= VALUE_PREVIEW {
        value.to_string()
    } else {
        let cut: String = value.chars().take(VALUE_PREVIEW).collect();
        format!("{}...", cut)
    }
}
