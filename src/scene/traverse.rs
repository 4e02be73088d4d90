//! Scene tree traversal helpers
//!
//! Pre-order walking, lookup by id, subtree insertion and the location
//! queries agents use to pick a destination.

use rustc_hash::FxHashSet;

use super::{SceneError, SceneNode, TileCoord};

/// Pre-order (parent before children) iterator over a scene tree
#[derive(Debug)]
pub struct PreOrder<'a> {
    stack: Vec<&'a SceneNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a SceneNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reversed so the first child is visited first
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl SceneNode {
    /// Iterate this node and all descendants, parent first, children in insertion order
    #[must_use]
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including itself
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Find a node by id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&SceneNode> {
        self.iter().find(|node| node.id == id)
    }

    /// Find a node by id (mutable)
    pub fn find_mut(&mut self, id: &str) -> Option<&mut SceneNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Append a subtree under the node with id `parent_id`
    ///
    /// # Errors
    ///
    /// Returns `SceneError::UnknownParent` if no node has that id
    pub fn append_subtree(&mut self, parent_id: &str, subtree: SceneNode) -> Result<(), SceneError> {
        let parent = self
            .find_mut(parent_id)
            .ok_or_else(|| SceneError::UnknownParent(parent_id.to_string()))?;
        parent.children.push(subtree);
        Ok(())
    }

    /// Whether a child appended under `id` would be the last node in pre-order,
    /// i.e. `id` lies on the chain of last children starting at this node
    #[must_use]
    pub fn on_last_branch(&self, id: &str) -> bool {
        let mut node = self;
        loop {
            if node.id == id {
                return true;
            }
            match node.children.last() {
                Some(last) => node = last,
                None => return false,
            }
        }
    }

    /// `(id, name)` of every walkable area in the tree, pre-order
    #[must_use]
    pub fn walkable_locations(&self) -> Vec<(&str, &str)> {
        self.iter()
            .filter(|node| node.kind.is_area() && node.walkable)
            .map(|node| (node.id.as_str(), node.name.as_str()))
            .collect()
    }

    /// First tile of this node's footprint (row-major) not covered by a
    /// non-walkable direct child.
    ///
    /// Falls back to one tile in from the node's corner when every tile is covered.
    #[must_use]
    pub fn open_tile(&self) -> TileCoord {
        let blocked: FxHashSet<TileCoord> = self
            .children
            .iter()
            .filter(|child| !child.walkable)
            .flat_map(|child| child.footprint().tiles())
            .collect();

        self.footprint()
            .tiles()
            .find(|tile| !blocked.contains(tile))
            .unwrap_or(TileCoord::new(self.x + 1, self.y + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;

    fn town() -> SceneNode {
        SceneNode::new("world", NodeKind::World)
            .with_rect(0, 0, 10, 10)
            .with_child(
                SceneNode::new("square", NodeKind::Zone)
                    .with_name("Town Square")
                    .with_rect(0, 0, 5, 5)
                    .with_child(
                        SceneNode::new("fountain", NodeKind::Object)
                            .with_rect(0, 0, 2, 1)
                            .with_walkable(false),
                    ),
            )
            .with_child(
                SceneNode::new("house", NodeKind::Building)
                    .with_name("House")
                    .with_rect(5, 5, 5, 5)
                    .with_walkable(false)
                    .with_child(
                        SceneNode::new("kitchen", NodeKind::Room)
                            .with_name("Kitchen")
                            .with_rect(6, 6, 3, 3),
                    ),
            )
    }

    #[test]
    fn test_pre_order() {
        let tree = town();
        let ids: Vec<_> = tree.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["world", "square", "fountain", "house", "kitchen"]);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_last_branch() {
        let tree = town();
        assert!(tree.on_last_branch("world"));
        assert!(tree.on_last_branch("house"));
        assert!(tree.on_last_branch("kitchen"));
        assert!(!tree.on_last_branch("square"));
        assert!(!tree.on_last_branch("fountain"));
        assert!(!tree.on_last_branch("attic"));
    }

    #[test]
    fn test_find_and_append() {
        let mut tree = town();
        assert!(tree.find("kitchen").is_some());
        assert!(tree.find("attic").is_none());

        tree.append_subtree("house", SceneNode::new("stove", NodeKind::Object))
            .unwrap();
        assert_eq!(tree.find("house").unwrap().children.len(), 2);

        let err = tree
            .append_subtree("attic", SceneNode::new("box", NodeKind::Object))
            .unwrap_err();
        assert!(matches!(err, SceneError::UnknownParent(id) if id == "attic"));
    }

    #[test]
    fn test_walkable_locations_skip_objects_and_shells() {
        let tree = town();
        let ids: Vec<_> = tree.walkable_locations().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["world", "square", "kitchen"]);
    }

    #[test]
    fn test_open_tile_avoids_blocking_children() {
        let tree = town();
        let square = tree.find("square").unwrap();
        assert_eq!(square.open_tile(), TileCoord::new(2, 0));
    }

    #[test]
    fn test_open_tile_fallback() {
        let node = SceneNode::new("closet", NodeKind::Room)
            .with_rect(4, 4, 1, 1)
            .with_child(
                SceneNode::new("wardrobe", NodeKind::Object)
                    .with_rect(4, 4, 1, 1)
                    .with_walkable(false),
            );
        assert_eq!(node.open_tile(), TileCoord::new(5, 5));
    }
}
