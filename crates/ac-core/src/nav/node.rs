use ahash::AHashMap;

use super::{Direction, LayerName, NavNodeType, NavTarget, NodeOptions};

/// A single addressable position in the navigation graph
///
/// Owns its directional link table and type-specific options. Links are
/// plain adjacency entries; nothing here assumes they are symmetric,
/// since group boundaries deliberately link one way only.
#[derive(Debug, Clone)]
pub struct NavNode {
    options: NodeOptions,
    links: AHashMap<Direction, NavTarget>,
}

impl NavNode {
    pub fn new(options: NodeOptions) -> Self {
        Self {
            options,
            links: AHashMap::new(),
        }
    }

    pub fn options(&self) -> &NodeOptions {
        &self.options
    }

    pub(crate) fn options_mut(&mut self) -> &mut NodeOptions {
        &mut self.options
    }

    pub fn node_type(&self) -> NavNodeType {
        self.options.node_type()
    }

    /// The link in a direction, if any
    pub fn link(&self, direction: Direction) -> Option<&NavTarget> {
        self.links.get(&direction)
    }

    /// Iterate over all links
    pub fn links(&self) -> impl Iterator<Item = (Direction, &NavTarget)> {
        self.links.iter().map(|(dir, target)| (*dir, target))
    }

    /// Set a link, overwriting any existing one in that slot
    pub(crate) fn set_link(&mut self, direction: Direction, target: NavTarget) {
        self.links.insert(direction, target);
    }

    /// Remove and return a link; absent directions are a no-op
    pub(crate) fn take_link(&mut self, direction: Direction) -> Option<NavTarget> {
        self.links.remove(&direction)
    }

    /// Rewrite node links from one layer name to another, used when a
    /// layer is cloned under a new name
    pub(crate) fn relabel_links(&mut self, from: &LayerName, to: &LayerName) {
        for target in self.links.values_mut() {
            if let NavTarget::Node(key) = target {
                if key.layer == *from {
                    key.layer = to.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NodeKey;
    use std::sync::Arc;

    fn key(layer: &str, index: usize) -> NodeKey {
        NodeKey {
            layer: Arc::from(layer),
            ty: NavNodeType::Datapoint,
            index,
        }
    }

    #[test]
    fn links_iterates_every_slot_and_take_removes() {
        let mut node = NavNode::new(NodeOptions::Top);
        node.set_link(Direction::Right, NavTarget::Node(key("root", 0)));
        node.set_link(Direction::In, NavTarget::Layer(Arc::from("sequence")));

        let slots: Vec<Direction> = node.links().map(|(dir, _)| dir).collect();
        assert_eq!(slots.len(), 2);
        assert!(slots.contains(&Direction::Right));
        assert!(slots.contains(&Direction::In));
        assert_eq!(
            node.link(Direction::Right).and_then(NavTarget::as_node),
            Some(&key("root", 0))
        );
        assert_eq!(node.link(Direction::In).and_then(NavTarget::as_node), None);

        assert!(node.take_link(Direction::Right).is_some());
        assert!(node.take_link(Direction::Right).is_none());
        assert_eq!(node.links().count(), 1);
    }

    #[test]
    fn relabel_rewrites_only_matching_node_links() {
        let mut node = NavNode::new(NodeOptions::Top);
        node.set_link(Direction::Right, NavTarget::Node(key("root", 0)));
        node.set_link(Direction::Down, NavTarget::Node(key("other", 1)));

        let from: LayerName = Arc::from("root");
        let to: LayerName = Arc::from("sequence");
        node.relabel_links(&from, &to);

        assert_eq!(
            node.link(Direction::Right).and_then(NavTarget::as_node),
            Some(&key("sequence", 0))
        );
        assert_eq!(
            node.link(Direction::Down).and_then(NavTarget::as_node),
            Some(&key("other", 1))
        );
    }
}
