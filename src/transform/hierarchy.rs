//! Parent/child ownership for tree-shaped data.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. A node owns its
//! children: destroying it destroys the whole subtree. Every structural operation
//! validates its arguments before touching any link, so a rejected call leaves the
//! tree exactly as it was.
use std::fmt;

use hibitset::{BitSet, BitSetLike};

use crate::error::{Result, TransformError};

/// Handle to a node in a [`Hierarchy`].
///
/// The generation distinguishes a live node from an earlier, destroyed node that
/// happened to occupy the same slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        NodeId { index, generation }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Entry<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: T,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

/// Arena of nodes with single-owner parent/child links.
#[derive(Debug)]
pub struct Hierarchy<T> {
    slots: Vec<Slot<T>>,
    alive: BitSet,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Hierarchy<T> {
    fn default() -> Self {
        Hierarchy {
            slots: Vec::new(),
            alive: BitSet::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Hierarchy<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.alive.contains(id.index) && self.entry(id).is_ok()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.entry(id).ok().map(|entry| &entry.data)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.entry_mut(id).ok().map(|entry| &mut entry.data)
    }

    pub(crate) fn try_get(&self, id: NodeId) -> Result<&T> {
        self.entry(id).map(|entry| &entry.data)
    }

    pub(crate) fn try_get_mut(&mut self, id: NodeId) -> Result<&mut T> {
        self.entry_mut(id).map(|entry| &mut entry.data)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.entry(id).map(|entry| entry.parent)
    }

    /// Children in insertion order. The slice borrows the hierarchy, so the
    /// collection cannot change while it is being walked.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        self.entry(id).map(|entry| entry.children.as_slice())
    }

    pub fn is_root(&self, id: NodeId) -> Result<bool> {
        self.entry(id).map(|entry| entry.parent.is_none())
    }

    /// Live nodes without a parent, in slot order.
    pub fn roots(&self) -> Vec<NodeId> {
        (&self.alive)
            .iter()
            .filter_map(|index| {
                let slot = &self.slots[index as usize];
                match &slot.entry {
                    Some(entry) if entry.parent.is_none() => {
                        Some(NodeId::new(index, slot.generation))
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Walks from the parent of `id` up to its root.
    pub fn ancestors(&self, id: NodeId) -> Result<Ancestors<'_, T>> {
        let next = self.entry(id)?.parent;
        Ok(Ancestors {
            hierarchy: self,
            next,
        })
    }

    /// Whether `ancestor` lies strictly above `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> Result<bool> {
        self.entry(ancestor)?;
        Ok(self.ancestors(id)?.any(|above| above == ancestor))
    }

    /// `id` and everything below it, pre-order, children in insertion order.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.entry(id)?;
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.entry(current)?.children.iter().rev().copied());
        }
        Ok(order)
    }

    /// Creates a node with no parent.
    pub fn insert_root(&mut self, data: T) -> NodeId {
        self.allocate(None, data)
    }

    /// Creates a node as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: T) -> Result<NodeId> {
        self.entry(parent)?;
        let id = self.allocate(Some(parent), data);
        self.entry_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Makes `child` the last child of `parent`, detaching it from its current
    /// parent first. Adding a node to the parent it already has changes nothing.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.entry(parent)?;
        let current = self.entry(child)?.parent;
        if parent == child {
            return Err(TransformError::SelfParent { node: child });
        }
        if current == Some(parent) {
            return Ok(());
        }
        if self.is_ancestor(child, parent)? {
            return Err(TransformError::Cycle { parent, child });
        }

        self.detach(child)?;
        self.entry_mut(child)?.parent = Some(parent);
        self.entry_mut(parent)?.children.push(child);
        log::debug!("Attached node {} to {} (was {:?})", child, parent, current);
        Ok(())
    }

    /// Detaches `child` from `parent`, leaving it as a new root. The subtree
    /// below `child` is untouched.
    pub fn remove_and_orphan(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.entry(parent)?;
        if self.entry(child)?.parent != Some(parent) {
            return Err(TransformError::NotAChild { parent, child });
        }
        self.detach(child)?;
        log::debug!("Orphaned node {} from {}", child, parent);
        Ok(())
    }

    /// Moves `node` under `new_parent`. The old parent loses it and the new parent
    /// gains it in the same call, or neither happens.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<()> {
        self.add_child(new_parent, node)
    }

    /// Destroys `node` and its subtree, children before their parents. Returns
    /// the number of nodes removed.
    pub fn destroy(&mut self, node: NodeId) -> Result<usize> {
        let doomed = self.descendants(node)?;
        self.detach(node)?;
        for id in doomed.iter().rev() {
            self.release(*id);
        }
        log::debug!("Destroyed node {} and {} descendants", node, doomed.len() - 1);
        Ok(doomed.len())
    }

    /// Position of `node` among its siblings, `None` at a root.
    pub fn index_in_parent(&self, node: NodeId) -> Result<Option<usize>> {
        match self.entry(node)?.parent {
            Some(parent) => Ok(self
                .entry(parent)?
                .children
                .iter()
                .position(|sibling| *sibling == node)),
            None => Ok(None),
        }
    }

    /// Moves `node` to position `index` among its siblings. Roots have no
    /// sibling order, so this is a no-op for them.
    pub fn set_index(&mut self, node: NodeId, index: usize) -> Result<()> {
        let parent = match self.entry(node)?.parent {
            Some(parent) => parent,
            None => return Ok(()),
        };
        let siblings = &mut self.entry_mut(parent)?.children;
        if index >= siblings.len() {
            return Err(TransformError::IndexOutOfRange {
                index,
                len: siblings.len(),
            });
        }
        siblings.retain(|sibling| *sibling != node);
        siblings.insert(index, node);
        Ok(())
    }

    fn allocate(&mut self, parent: Option<NodeId>, data: T) -> NodeId {
        let entry = Entry {
            parent,
            children: Vec::new(),
            data,
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                NodeId::new(index, 0)
            }
        };
        self.alive.add(id.index);
        self.len += 1;
        log::trace!("Allocated node {} under {:?}", id, parent);
        id
    }

    fn detach(&mut self, child: NodeId) -> Result<()> {
        if let Some(parent) = self.entry_mut(child)?.parent.take() {
            self.entry_mut(parent)?
                .children
                .retain(|sibling| *sibling != child);
        }
        Ok(())
    }

    fn release(&mut self, id: NodeId) {
        let slot = &mut self.slots[id.index as usize];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.alive.remove(id.index);
        self.free.push(id.index);
        self.len -= 1;
    }

    fn entry(&self, id: NodeId) -> Result<&Entry<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(TransformError::StaleNode { node: id })
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut Entry<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(TransformError::StaleNode { node: id })
    }
}

/// Iterator over the strict ancestors of a node, nearest first.
pub struct Ancestors<'a, T> {
    hierarchy: &'a Hierarchy<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for Ancestors<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self
            .hierarchy
            .entry(current)
            .ok()
            .and_then(|entry| entry.parent);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn chain() -> (Hierarchy<&'static str>, NodeId, NodeId, NodeId) {
        let mut tree = Hierarchy::new();
        let root = tree.insert_root("root");
        let a = tree.insert_child(root, "a").unwrap();
        let b = tree.insert_child(a, "b").unwrap();
        (tree, root, a, b)
    }

    #[test]
    fn insert_attaches_to_parent() {
        let (tree, root, a, b) = chain();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.parent(a).unwrap(), Some(root));
        assert_eq!(tree.children(root).unwrap(), &[a]);
        assert_eq!(tree.children(a).unwrap(), &[b]);
        assert!(tree.is_root(root).unwrap());
        assert!(!tree.is_root(b).unwrap());
        assert_eq!(tree.roots(), vec![root]);
        assert_eq!(tree.get(b), Some(&"b"));
    }

    #[test]
    fn reparent_transfers_ownership() {
        let (mut tree, root, a, b) = chain();
        tree.reparent(b, root).unwrap();

        assert_eq!(tree.parent(b).unwrap(), Some(root));
        assert!(tree.children(a).unwrap().is_empty());
        let owned = tree.children(root).unwrap();
        assert_eq!(owned.iter().filter(|id| **id == b).count(), 1);
        assert_eq!(owned, &[a, b]);
    }

    #[test]
    fn adding_existing_child_again_keeps_single_membership() {
        let (mut tree, root, a, _) = chain();
        tree.add_child(root, a).unwrap();
        assert_eq!(tree.children(root).unwrap(), &[a]);
    }

    #[test]
    fn cycles_are_rejected_without_mutation() {
        let (mut tree, root, a, b) = chain();

        let err = tree.add_child(b, root).unwrap_err();
        assert_eq!(err, TransformError::Cycle { parent: b, child: root });
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let err = tree.reparent(a, a).unwrap_err();
        assert_eq!(err, TransformError::SelfParent { node: a });

        assert_eq!(tree.parent(root).unwrap(), None);
        assert_eq!(tree.children(root).unwrap(), &[a]);
        assert_eq!(tree.children(a).unwrap(), &[b]);
        assert_eq!(tree.children(b).unwrap(), &[] as &[NodeId]);
    }

    #[test]
    fn orphaning_makes_a_new_root() {
        let (mut tree, root, a, b) = chain();
        tree.remove_and_orphan(root, a).unwrap();

        assert!(tree.is_root(a).unwrap());
        assert!(tree.children(root).unwrap().is_empty());
        assert_eq!(tree.children(a).unwrap(), &[b]);
        assert_eq!(tree.roots(), vec![root, a]);

        let err = tree.remove_and_orphan(root, b).unwrap_err();
        assert_eq!(err, TransformError::NotAChild { parent: root, child: b });
    }

    #[test]
    fn destroy_removes_subtree_and_invalidates_handles() {
        let (mut tree, root, a, b) = chain();
        let sibling = tree.insert_child(root, "sibling").unwrap();

        assert_eq!(tree.destroy(a).unwrap(), 2);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.children(root).unwrap(), &[sibling]);
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));

        let err = tree.parent(b).unwrap_err();
        assert_eq!(err, TransformError::StaleNode { node: b });
        assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    }

    #[test]
    fn recycled_slots_do_not_alias_old_handles() {
        let (mut tree, root, a, b) = chain();
        tree.destroy(a).unwrap();

        let fresh = tree.insert_child(root, "fresh").unwrap();
        assert!(fresh.index() == a.index() || fresh.index() == b.index());
        assert_ne!(fresh, a);
        assert_ne!(fresh, b);
        assert_eq!(tree.get(a), None);
        assert_eq!(tree.get(fresh), Some(&"fresh"));
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut tree = Hierarchy::new();
        let root = tree.insert_root(0);
        let a = tree.insert_child(root, 1).unwrap();
        let a1 = tree.insert_child(a, 2).unwrap();
        let b = tree.insert_child(root, 3).unwrap();
        let a2 = tree.insert_child(a, 4).unwrap();

        assert_eq!(tree.descendants(root).unwrap(), vec![root, a, a1, a2, b]);
        assert_eq!(tree.ancestors(a2).unwrap().collect::<Vec<_>>(), vec![a, root]);
        assert!(tree.is_ancestor(root, a2).unwrap());
        assert!(!tree.is_ancestor(b, a2).unwrap());
    }

    #[test]
    fn set_index_reorders_siblings() {
        let mut tree = Hierarchy::new();
        let root = tree.insert_root(());
        let x = tree.insert_child(root, ()).unwrap();
        let y = tree.insert_child(root, ()).unwrap();
        let z = tree.insert_child(root, ()).unwrap();

        tree.set_index(z, 0).unwrap();
        assert_eq!(tree.children(root).unwrap(), &[z, x, y]);
        assert_eq!(tree.index_in_parent(y).unwrap(), Some(2));
        assert_eq!(tree.index_in_parent(root).unwrap(), None);

        let err = tree.set_index(x, 3).unwrap_err();
        assert_eq!(err, TransformError::IndexOutOfRange { index: 3, len: 3 });
    }
}
