//! Write transaction
//!
//! Works on a private copy of the latest revision. Every mutation validates
//! its arguments first, then changes the structure, then fires exactly one
//! digest maintenance event. A maintenance or storage failure aborts the
//! transaction: nothing it touched can be committed.

use crate::access::cursor::NodeCursor;
use crate::access::resource::Resource;
use crate::error::{ApiError, StorageError};
use crate::hash::{self, HashKind};
use crate::store::{NodeArena, NodeRecord, NodeStore};
use crate::types::{NodeKey, NodeKind, RevisionNumber, DOCUMENT_NODE_KEY};
use parking_lot::MutexGuard;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrxState {
    Active,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    FirstChild,
    RightSibling,
    LeftSibling,
}

pub struct WriteTrx<'a> {
    resource: &'a Resource,
    _writer: MutexGuard<'a, ()>,
    tree: NodeArena,
    hash_kind: HashKind,
    base_revision: RevisionNumber,
    state: TrxState,
}

impl<'a> WriteTrx<'a> {
    pub(crate) fn new(
        resource: &'a Resource,
        writer: MutexGuard<'a, ()>,
        mut tree: NodeArena,
        base_revision: RevisionNumber,
    ) -> Result<Self, ApiError> {
        // Cursor state is not persisted; start every transaction at the document.
        tree.move_to(DOCUMENT_NODE_KEY)?;
        Ok(Self {
            resource,
            _writer: writer,
            tree,
            hash_kind: resource.hash_kind(),
            base_revision,
            state: TrxState::Active,
        })
    }

    pub fn state(&self) -> TrxState {
        self.state
    }

    /// Revision this transaction's working tree descends from
    pub fn base_revision(&self) -> RevisionNumber {
        self.base_revision
    }

    pub fn insert_element_as_first_child(&mut self, name: &str) -> Result<NodeKey, ApiError> {
        self.insert_structural(NodeKind::Element, name, Vec::new(), Position::FirstChild)
    }

    pub fn insert_element_as_right_sibling(&mut self, name: &str) -> Result<NodeKey, ApiError> {
        self.insert_structural(NodeKind::Element, name, Vec::new(), Position::RightSibling)
    }

    pub fn insert_element_as_left_sibling(&mut self, name: &str) -> Result<NodeKey, ApiError> {
        self.insert_structural(NodeKind::Element, name, Vec::new(), Position::LeftSibling)
    }

    pub fn insert_text_as_first_child(
        &mut self,
        value: impl Into<Vec<u8>>,
    ) -> Result<NodeKey, ApiError> {
        self.insert_structural(NodeKind::Text, "", value.into(), Position::FirstChild)
    }

    pub fn insert_text_as_right_sibling(
        &mut self,
        value: impl Into<Vec<u8>>,
    ) -> Result<NodeKey, ApiError> {
        self.insert_structural(NodeKind::Text, "", value.into(), Position::RightSibling)
    }

    pub fn insert_text_as_left_sibling(
        &mut self,
        value: impl Into<Vec<u8>>,
    ) -> Result<NodeKey, ApiError> {
        self.insert_structural(NodeKind::Text, "", value.into(), Position::LeftSibling)
    }

    /// Attach an attribute to the element under the cursor and move onto it
    pub fn insert_attribute(
        &mut self,
        name: &str,
        value: impl Into<Vec<u8>>,
    ) -> Result<NodeKey, ApiError> {
        self.insert_member(NodeKind::Attribute, name, value.into())
    }

    /// Attach a namespace declaration (prefix, uri) to the element under the cursor
    pub fn insert_namespace(
        &mut self,
        prefix: &str,
        uri: impl Into<Vec<u8>>,
    ) -> Result<NodeKey, ApiError> {
        self.insert_member(NodeKind::Namespace, prefix, uri.into())
    }

    /// Remove the node under the cursor together with its subtree
    ///
    /// The cursor moves to the right sibling, else the left sibling, else the parent.
    pub fn remove(&mut self) -> Result<(), ApiError> {
        self.ensure_active()?;
        let node = self.cursor();
        let (kind, parent, left, right) = {
            let record = self.node(node)?;
            (record.kind, record.parent, record.left_sibling, record.right_sibling)
        };
        if kind == NodeKind::Document {
            return Err(ApiError::InvalidOperation(
                "The document node cannot be removed".to_string(),
            ));
        }
        let parent = parent.ok_or_else(|| detached(node))?;
        let next = if kind.is_structural() {
            right.or(left).unwrap_or(parent)
        } else {
            parent
        };

        self.guarded(|trx| {
            hash::on_remove(&mut trx.tree, trx.hash_kind, node)?;
            trx.tree.unlink(node)?;
            let freed = trx.tree.free_subtree(node)?;
            trx.tree.move_to(next)?;
            debug!(node, freed, "Removed subtree");
            Ok(())
        })
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), ApiError> {
        self.ensure_active()?;
        let node = self.cursor();
        let (kind, parent) = {
            let record = self.node(node)?;
            (record.kind, record.parent)
        };
        match kind {
            NodeKind::Element | NodeKind::Attribute => ensure_name(kind, name)?,
            NodeKind::Namespace => {}
            NodeKind::Document | NodeKind::Text => {
                return Err(ApiError::InvalidOperation(format!(
                    "A {} node has no name",
                    kind
                )))
            }
        }
        if !kind.is_structural() {
            let element = parent.ok_or_else(|| detached(node))?;
            self.ensure_unique_member(element, kind, name, Some(node))?;
        }

        self.guarded(|trx| {
            trx.tree.record_mut(node)?.set_name(name);
            hash::on_content_change(&mut trx.tree, trx.hash_kind, node)?;
            Ok(())
        })
    }

    pub fn set_value(&mut self, value: impl Into<Vec<u8>>) -> Result<(), ApiError> {
        self.ensure_active()?;
        let node = self.cursor();
        let kind = self.node(node)?.kind;
        if matches!(kind, NodeKind::Document | NodeKind::Element) {
            return Err(ApiError::InvalidOperation(format!(
                "A {} node has no value",
                kind
            )));
        }
        let value = value.into();

        self.guarded(|trx| {
            trx.tree.record_mut(node)?.set_value(value);
            hash::on_content_change(&mut trx.tree, trx.hash_kind, node)?;
            Ok(())
        })
    }

    /// Move the subtree rooted at `from` to be the first child of the node under the cursor
    pub fn move_subtree_to_first_child(&mut self, from: NodeKey) -> Result<(), ApiError> {
        self.ensure_active()?;
        let target = self.cursor();
        let target_kind = self.node(target)?.kind;
        let from_kind = self.movable_kind(from)?;
        ensure_child_kind(target_kind, from_kind)?;
        self.ensure_not_into_itself(from, target)?;
        let old_parent = self.node(from)?.parent.ok_or_else(|| detached(from))?;

        self.guarded(|trx| {
            trx.tree.unlink(from)?;
            trx.tree.link_as_first_child(target, from)?;
            hash::on_move(&mut trx.tree, trx.hash_kind, from, old_parent, target)?;
            trx.tree.move_to(from)?;
            Ok(())
        })
    }

    /// Move the subtree rooted at `from` directly after the node under the cursor
    pub fn move_subtree_to_right_sibling(&mut self, from: NodeKey) -> Result<(), ApiError> {
        self.ensure_active()?;
        let anchor = self.cursor();
        let new_parent = self.sibling_parent(anchor)?;
        let parent_kind = self.node(new_parent)?.kind;
        let from_kind = self.movable_kind(from)?;
        ensure_child_kind(parent_kind, from_kind)?;
        if from == anchor {
            return Err(ApiError::InvalidOperation(
                "A node cannot become its own sibling".to_string(),
            ));
        }
        self.ensure_not_into_itself(from, anchor)?;
        let old_parent = self.node(from)?.parent.ok_or_else(|| detached(from))?;

        self.guarded(|trx| {
            trx.tree.unlink(from)?;
            trx.tree.link_as_right_sibling(anchor, from)?;
            hash::on_move(&mut trx.tree, trx.hash_kind, from, old_parent, new_parent)?;
            trx.tree.move_to(from)?;
            Ok(())
        })
    }

    /// Deep-copy the subtree rooted at `source` as the first child of the node under the cursor
    pub fn copy_subtree_as_first_child(&mut self, source: NodeKey) -> Result<NodeKey, ApiError> {
        self.ensure_active()?;
        let target = self.cursor();
        let target_kind = self.node(target)?.kind;
        let source_kind = self.movable_kind(source)?;
        ensure_child_kind(target_kind, source_kind)?;

        self.guarded(|trx| {
            let copy = trx.tree.copy_subtree(source)?;
            trx.tree.link_as_first_child(target, copy)?;
            hash::on_insert(&mut trx.tree, trx.hash_kind, copy)?;
            trx.tree.move_to(copy)?;
            debug!(source, copy, "Copied subtree");
            Ok(copy)
        })
    }

    /// Publish the working tree as a new revision; the transaction stays usable
    pub fn commit(&mut self) -> Result<RevisionNumber, ApiError> {
        self.ensure_active()?;
        let revision = self.resource.publish(self.tree.clone())?;
        self.base_revision = revision.number;
        Ok(revision.number)
    }

    /// Discard uncommitted changes, including those of an aborted transaction
    pub fn rollback(&mut self) -> Result<(), ApiError> {
        let latest = self.resource.latest()?;
        self.tree = (*latest.tree).clone();
        self.tree.move_to(DOCUMENT_NODE_KEY)?;
        self.base_revision = latest.number;
        if self.state == TrxState::Aborted {
            info!(revision = latest.number, "Rolled back aborted transaction");
        }
        self.state = TrxState::Active;
        Ok(())
    }

    fn insert_structural(
        &mut self,
        kind: NodeKind,
        name: &str,
        value: Vec<u8>,
        position: Position,
    ) -> Result<NodeKey, ApiError> {
        self.ensure_active()?;
        if kind == NodeKind::Element {
            ensure_name(kind, name)?;
        }
        let anchor = self.cursor();
        let parent = match position {
            Position::FirstChild => anchor,
            Position::RightSibling | Position::LeftSibling => self.sibling_parent(anchor)?,
        };
        ensure_child_kind(self.node(parent)?.kind, kind)?;

        self.guarded(|trx| {
            let node = trx.tree.allocate(kind, name, value);
            match position {
                Position::FirstChild => trx.tree.link_as_first_child(anchor, node)?,
                Position::RightSibling => trx.tree.link_as_right_sibling(anchor, node)?,
                Position::LeftSibling => trx.tree.link_as_left_sibling(anchor, node)?,
            }
            hash::on_insert(&mut trx.tree, trx.hash_kind, node)?;
            trx.tree.move_to(node)?;
            Ok(node)
        })
    }

    fn insert_member(
        &mut self,
        kind: NodeKind,
        name: &str,
        value: Vec<u8>,
    ) -> Result<NodeKey, ApiError> {
        self.ensure_active()?;
        let element = self.cursor();
        let element_kind = self.node(element)?.kind;
        if element_kind != NodeKind::Element {
            return Err(ApiError::InvalidOperation(format!(
                "Only elements carry {} nodes, cursor is on a {} node",
                kind, element_kind
            )));
        }
        if kind == NodeKind::Attribute {
            ensure_name(kind, name)?;
        }
        self.ensure_unique_member(element, kind, name, None)?;

        self.guarded(|trx| {
            let node = trx.tree.allocate(kind, name, value);
            match kind {
                NodeKind::Namespace => trx.tree.attach_namespace(element, node)?,
                _ => trx.tree.attach_attribute(element, node)?,
            }
            hash::on_insert(&mut trx.tree, trx.hash_kind, node)?;
            trx.tree.move_to(node)?;
            Ok(node)
        })
    }

    /// Run a mutation body; a maintenance or storage failure aborts the transaction.
    fn guarded<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let result = body(self);
        if let Err(err @ (ApiError::Hash(_) | ApiError::StorageError(_))) = &result {
            warn!(error = %err, base_revision = self.base_revision, "Aborting write transaction");
            self.state = TrxState::Aborted;
        }
        result
    }

    fn ensure_active(&self) -> Result<(), ApiError> {
        match self.state {
            TrxState::Active => Ok(()),
            TrxState::Aborted => Err(ApiError::TransactionAborted),
        }
    }

    fn node(&self, key: NodeKey) -> Result<&NodeRecord, ApiError> {
        self.tree.record(key).map_err(|_| ApiError::NodeNotFound(key))
    }

    /// Kind of a node that may be moved or copied: elements and text only
    fn movable_kind(&self, key: NodeKey) -> Result<NodeKind, ApiError> {
        let kind = self.node(key)?.kind;
        match kind {
            NodeKind::Element | NodeKind::Text => Ok(kind),
            _ => Err(ApiError::InvalidOperation(format!(
                "A {} node cannot be moved or copied",
                kind
            ))),
        }
    }

    /// Parent of a node that is about to receive a sibling
    fn sibling_parent(&self, anchor: NodeKey) -> Result<NodeKey, ApiError> {
        let record = self.node(anchor)?;
        if !record.kind.is_structural() || record.kind == NodeKind::Document {
            return Err(ApiError::InvalidOperation(format!(
                "A {} node cannot have siblings",
                record.kind
            )));
        }
        record.parent.ok_or_else(|| detached(anchor))
    }

    fn ensure_not_into_itself(&self, from: NodeKey, destination: NodeKey) -> Result<(), ApiError> {
        if self.tree.is_ancestor_or_self(from, destination)? {
            return Err(ApiError::InvalidOperation(format!(
                "Node {} cannot be moved into its own subtree",
                from
            )));
        }
        Ok(())
    }

    fn ensure_unique_member(
        &self,
        element: NodeKey,
        kind: NodeKind,
        name: &str,
        except: Option<NodeKey>,
    ) -> Result<(), ApiError> {
        let record = self.node(element)?;
        let members = match kind {
            NodeKind::Namespace => &record.namespaces,
            _ => &record.attributes,
        };
        for &member in members {
            if Some(member) != except && self.node(member)?.name == name {
                return Err(ApiError::InvalidOperation(format!(
                    "Element {} already has a {} named '{}'",
                    element, kind, name
                )));
            }
        }
        Ok(())
    }
}

impl NodeCursor for WriteTrx<'_> {
    fn tree(&self) -> &NodeArena {
        &self.tree
    }

    fn cursor(&self) -> NodeKey {
        self.tree.current_node()
    }

    fn set_cursor(&mut self, key: NodeKey) -> Result<(), StorageError> {
        self.tree.move_to(key)
    }

    fn hash_kind(&self) -> HashKind {
        self.hash_kind
    }
}

fn ensure_name(kind: NodeKind, name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::InvalidOperation(format!(
            "A {} node needs a non-empty name",
            kind
        )));
    }
    Ok(())
}

/// The document holds elements only; elements hold elements and text.
fn ensure_child_kind(parent: NodeKind, child: NodeKind) -> Result<(), ApiError> {
    let allowed = match parent {
        NodeKind::Document => child == NodeKind::Element,
        NodeKind::Element => matches!(child, NodeKind::Element | NodeKind::Text),
        _ => false,
    };
    if !allowed {
        return Err(ApiError::InvalidOperation(format!(
            "A {} node cannot hold a {} child",
            parent, child
        )));
    }
    Ok(())
}

fn detached(node: NodeKey) -> ApiError {
    ApiError::InvalidOperation(format!("Node {} is not linked into the tree", node))
}
