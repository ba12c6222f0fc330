use indexmap::IndexMap;

use super::{LayerName, NavNode, NavNodeType, NodeKey, NodeQuery};

/// A named, type-partitioned collection of nav nodes with one cursor
///
/// Nodes live in per-type buckets in registration order; a node's index
/// in its bucket is assigned once and is stable for its lifetime. The
/// first node ever registered becomes the layer's initial cursor.
#[derive(Debug, Clone)]
pub struct NavLayer {
    name: LayerName,
    buckets: IndexMap<NavNodeType, Vec<NavNode>>,
    cursor: Option<NodeKey>,
}

impl NavLayer {
    pub(crate) fn new(name: LayerName) -> Self {
        Self {
            name,
            buckets: IndexMap::new(),
            cursor: None,
        }
    }

    pub fn name(&self) -> &LayerName {
        &self.name
    }

    /// Register a node, assigning its permanent index in its type bucket
    pub fn register_node(&mut self, node: NavNode) -> NodeKey {
        let ty = node.node_type();
        let bucket = self.buckets.entry(ty).or_default();
        let index = bucket.len();
        bucket.push(node);
        let key = NodeKey {
            layer: self.name.clone(),
            ty,
            index,
        };
        if self.cursor.is_none() {
            self.cursor = Some(key.clone());
        }
        key
    }

    /// Direct access to a registered node
    pub fn node(&self, key: &NodeKey) -> Option<&NavNode> {
        self.buckets.get(&key.ty)?.get(key.index)
    }

    pub(crate) fn node_mut(&mut self, key: &NodeKey) -> Option<&mut NavNode> {
        self.buckets.get_mut(&key.ty)?.get_mut(key.index)
    }

    /// Look up a node by its bucket index
    pub fn get_indexed(&self, ty: NavNodeType, index: usize) -> Option<NodeKey> {
        let bucket = self.buckets.get(&ty)?;
        if index < bucket.len() {
            Some(NodeKey {
                layer: self.name.clone(),
                ty,
                index,
            })
        } else {
            None
        }
    }

    /// First node of a type whose options match every given query field
    pub fn get(&self, ty: NavNodeType, query: &NodeQuery) -> Option<NodeKey> {
        let bucket = self.buckets.get(&ty)?;
        bucket
            .iter()
            .position(|node| query.matches_all(node.options()))
            .map(|index| NodeKey {
                layer: self.name.clone(),
                ty,
                index,
            })
    }

    /// All nodes of a type matching the query under any-field semantics
    pub fn query(&self, ty: NavNodeType, query: &NodeQuery) -> Vec<NodeKey> {
        let Some(bucket) = self.buckets.get(&ty) else {
            return Vec::new();
        };
        bucket
            .iter()
            .enumerate()
            .filter(|(_, node)| query.matches_any(node.options()))
            .map(|(index, _)| NodeKey {
                layer: self.name.clone(),
                ty,
                index,
            })
            .collect()
    }

    /// Number of registered nodes of a type
    pub fn bucket_len(&self, ty: NavNodeType) -> usize {
        self.buckets.get(&ty).map(Vec::len).unwrap_or(0)
    }

    /// The currently focused node
    pub fn cursor(&self) -> Option<&NodeKey> {
        self.cursor.as_ref()
    }

    pub(crate) fn set_cursor(&mut self, key: NodeKey) {
        self.cursor = Some(key);
    }

    /// Duplicate this layer under a new name, rewriting intra-layer link
    /// targets and the cursor to the new name
    pub(crate) fn clone_as(&self, name: LayerName) -> NavLayer {
        let mut buckets = self.buckets.clone();
        for bucket in buckets.values_mut() {
            for node in bucket.iter_mut() {
                node.relabel_links(&self.name, &name);
            }
        }
        let cursor = self.cursor.clone().map(|mut key| {
            if key.layer == self.name {
                key.layer = name.clone();
            }
            key
        });
        NavLayer {
            name,
            buckets,
            cursor,
        }
    }
}
