//! Parent/child tree reconstruction
//!
//! Records are pushed in emission order. Every record is stored once in an
//! arena; the id map points at arena slots so children can find their parent
//! in O(1). Nested JSON is only built in [`TreeBuilder::finish`], after the
//! whole stream has been seen.

use super::rules::Role;
use crate::domain::{EntityKind, Result, SyncError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Field carrying the parent reference in bulk output
pub const PARENT_ID_FIELD: &str = "__parentId";

/// Counters for one reconstruction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionStats {
    /// Records without a parent reference
    pub roots: u64,
    /// Records attached under a parent
    pub attached: u64,
    /// Records whose parent was unknown or whose role could not be decided
    pub dropped: u64,
}

impl ReconstructionStats {
    pub fn total(&self) -> u64 {
        self.roots + self.attached + self.dropped
    }
}

/// Reconstructed forest
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub roots: Vec<Value>,
    pub stats: ReconstructionStats,
}

struct Node {
    record: Map<String, Value>,
    role: Role,
    /// (collection field, child slot) in arrival order
    children: Vec<(&'static str, usize)>,
}

/// Incremental builder for one entity's forest
pub struct TreeBuilder {
    kind: EntityKind,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
    stats: ReconstructionStats,
}

impl TreeBuilder {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            roots: Vec::new(),
            index: HashMap::new(),
            stats: ReconstructionStats::default(),
        }
    }

    pub fn stats(&self) -> ReconstructionStats {
        self.stats
    }

    /// Add one flat record
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Reconstruction`] if `record` is not a JSON object.
    pub fn push(&mut self, record: Value) -> Result<()> {
        let record = match record {
            Value::Object(record) => record,
            other => {
                return Err(SyncError::Reconstruction(format!(
                    "Expected a JSON object for {} record, got {}",
                    self.kind,
                    json_type(&other)
                )))
            }
        };

        let parent_id = record
            .get(PARENT_ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string);

        match parent_id {
            None => {
                let slot = self.insert(record, Role::root_of(self.kind));
                self.roots.push(slot);
                self.stats.roots += 1;
            }
            Some(parent_id) => self.attach(record, &parent_id),
        }
        Ok(())
    }

    fn attach(&mut self, record: Map<String, Value>, parent_id: &str) {
        let Some(&parent_slot) = self.index.get(parent_id) else {
            self.drop_record(&record, parent_id, "parent not found");
            return;
        };

        let parent_role = self.nodes[parent_slot].role;
        let Some(rule) = parent_role.classify(&record) else {
            self.drop_record(&record, parent_id, "no child rule matches");
            return;
        };

        let slot = self.insert(record, rule.role);
        self.nodes[parent_slot].children.push((rule.collection, slot));
        self.stats.attached += 1;
    }

    fn insert(&mut self, mut record: Map<String, Value>, role: Role) -> usize {
        for rule in role.child_rules() {
            let initialized = matches!(record.get(rule.collection), Some(Value::Array(_)));
            if !initialized {
                record.insert(rule.collection.to_string(), Value::Array(Vec::new()));
            }
        }

        let slot = self.nodes.len();
        if let Some(id) = record.get("id").and_then(Value::as_str) {
            if self.index.contains_key(id) {
                tracing::debug!(entity = %self.kind, id = %id, "Duplicate record id; keeping first");
            } else {
                self.index.insert(id.to_string(), slot);
            }
        }
        self.nodes.push(Node {
            record,
            role,
            children: Vec::new(),
        });
        slot
    }

    fn drop_record(&mut self, record: &Map<String, Value>, parent_id: &str, reason: &str) {
        self.stats.dropped += 1;
        tracing::warn!(
            entity = %self.kind,
            id = record.get("id").and_then(serde_json::Value::as_str).unwrap_or("<none>"),
            parent_id = %parent_id,
            reason = reason,
            "Dropping unclassifiable record"
        );
    }

    /// Materialise the nested roots in emission order
    pub fn finish(mut self) -> Reconstruction {
        let roots = std::mem::take(&mut self.roots)
            .into_iter()
            .map(|slot| materialize(&mut self.nodes, slot))
            .collect();
        Reconstruction {
            roots,
            stats: self.stats,
        }
    }
}

fn materialize(nodes: &mut [Node], slot: usize) -> Value {
    let mut record = std::mem::take(&mut nodes[slot].record);
    let children = std::mem::take(&mut nodes[slot].children);

    for (collection, child) in children {
        let value = materialize(nodes, child);
        if let Some(Value::Array(items)) = record.get_mut(collection) {
            items.push(value);
        }
    }
    Value::Object(record)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reconstruct a forest from NDJSON lines
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns [`SyncError::Reconstruction`] for a line that is not a JSON object,
/// naming its 1-based line number.
pub fn reconstruct_reader<R: BufRead>(kind: EntityKind, reader: R) -> Result<Reconstruction> {
    let mut builder = TreeBuilder::new(kind);

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line).map_err(|e| {
            SyncError::Reconstruction(format!("Line {} is not valid JSON: {e}", idx + 1))
        })?;
        builder
            .push(value)
            .map_err(|e| SyncError::Reconstruction(format!("Line {}: {e}", idx + 1)))?;
    }

    let result = builder.finish();
    tracing::info!(
        entity = %kind,
        roots = result.stats.roots,
        attached = result.stats.attached,
        dropped = result.stats.dropped,
        "Reconstruction finished"
    );
    Ok(result)
}

/// Reconstruct a forest from an NDJSON file
pub fn reconstruct_file(kind: EntityKind, path: &Path) -> Result<Reconstruction> {
    let file = File::open(path).map_err(|e| {
        SyncError::Io(format!("Failed to open artifact {}: {e}", path.display()))
    })?;
    reconstruct_reader(kind, BufReader::new(file))
}
