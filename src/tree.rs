//! Generic route tree.
//!
//! A website's page structure maps naturally onto a tree keyed by path
//! segments: the route `/blog/coffee` is the node reached from the root by
//! following the edges `blog` and `coffee`. This module provides that tree
//! as a purely structural container — it knows nothing about pages or build
//! semantics, only about creating, resolving, and traversing nodes.
//!
//! ## Paths
//!
//! Every operation takes the full path string; nodes carry no path field of
//! their own. A valid path starts with the root marker `/`. The root node
//! itself is addressed by `/` and always exists.
//!
//! ## Operations
//!
//! | Function | Behavior on a missing edge |
//! |----------|---------------------------|
//! | [`create_node`] | creates intermediates, attaches the given node last |
//! | [`resolve_node`] | fails with [`TreeError::EdgeNotFound`] |
//! | [`resolve_or_init_node`] | creates a default-payload node and continues |
//!
//! [`walk`] is a pre-order depth-first traversal with an optional depth cap;
//! [`walk_path`] visits the root and every node along one path in
//! root-to-leaf order. Mutable variants exist for both because the builder
//! sorts and the pre-write plugins extend the tree in place.

use std::collections::BTreeMap;
use thiserror::Error;

/// Path of the root node in a tree.
pub const ROOT_PATH: &str = "/";

const DELIMITER: char = '/';

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("path {0} is not a valid tree path")]
    InvalidPath(String),
    #[error("resolve node {path}: edge {edge} does not exist")]
    EdgeNotFound { path: String, edge: String },
}

/// A tree node holding a payload and zero or more children reachable via
/// named edges. The node exclusively owns its children; there are no
/// back-edges, so cycles cannot be constructed.
#[derive(Debug, Default)]
pub struct Node<T> {
    children: BTreeMap<String, Node<T>>,
    pub value: T,
}

impl<T> Node<T> {
    pub fn new(value: T) -> Self {
        Self {
            children: BTreeMap::new(),
            value,
        }
    }

    /// Child nodes, keyed by the edge name linking them to this node.
    pub fn children(&self) -> &BTreeMap<String, Node<T>> {
        &self.children
    }
}

/// Checks if a path addresses the tree's root node.
pub fn is_root_path(path: &str) -> bool {
    path == ROOT_PATH
}

/// Checks if a path is formally valid, meaning it can be used with
/// [`create_node`], [`resolve_node`] and friends.
pub fn is_valid_path(path: &str) -> bool {
    path.starts_with(ROOT_PATH)
}

/// Returns the edge names for a path, in root-to-leaf order. The root path
/// has no edges.
pub fn edges(path: &str) -> Vec<&str> {
    if is_root_path(path) {
        return Vec::new();
    }

    path.trim_matches(DELIMITER).split(DELIMITER).collect()
}

/// Stores a node under the given tree path, creating default-initialized
/// intermediate nodes for any missing segment except the last.
///
/// If a node already exists at the final segment it is kept and the given
/// node is dropped. Storing at the root path is a no-op.
pub fn create_node<T: Default>(
    path: &str,
    root: &mut Node<T>,
    node: Node<T>,
) -> Result<(), TreeError> {
    if !is_valid_path(path) {
        return Err(TreeError::InvalidPath(path.to_owned()));
    }
    if is_root_path(path) {
        return Ok(());
    }

    let segments = edges(path);
    let (last, intermediate) = segments
        .split_last()
        .expect("non-root valid path has at least one edge");

    let mut current = root;
    for edge in intermediate {
        current = current.children.entry((*edge).to_owned()).or_default();
    }
    current.children.entry((*last).to_owned()).or_insert(node);

    Ok(())
}

/// Follows the given path from the root node and returns the node linked to
/// the last edge. Fails with [`TreeError::EdgeNotFound`] as soon as an edge
/// is missing; never creates nodes.
pub fn resolve_node<'t, T>(path: &str, root: &'t Node<T>) -> Result<&'t Node<T>, TreeError> {
    if !is_valid_path(path) {
        return Err(TreeError::InvalidPath(path.to_owned()));
    }

    let mut current = root;
    for edge in edges(path) {
        current = current
            .children
            .get(edge)
            .ok_or_else(|| TreeError::EdgeNotFound {
                path: path.to_owned(),
                edge: edge.to_owned(),
            })?;
    }

    Ok(current)
}

/// Like [`resolve_node`], but initializes any missing node along the path
/// with a default-constructed payload instead of failing.
///
/// This is the primitive behind idempotent page registration: the result is
/// the same node regardless of how often, or in which order relative to its
/// ancestors, a route is requested.
pub fn resolve_or_init_node<'t, T: Default>(
    path: &str,
    root: &'t mut Node<T>,
) -> Result<&'t mut Node<T>, TreeError> {
    if !is_valid_path(path) {
        return Err(TreeError::InvalidPath(path.to_owned()));
    }

    let mut current = root;
    for edge in edges(path) {
        current = current.children.entry(edge.to_owned()).or_default();
    }

    Ok(current)
}

/// Traverses all nodes pre-order depth-first, starting from the root node,
/// and invokes `visit` for each one. The first error returned by `visit`
/// aborts the walk and is handed up to the caller; nodes already visited
/// are not rolled back.
///
/// `max_depth` counts from 0 for the root node. Pass -1 to walk the whole
/// tree.
pub fn walk<T, E>(
    root: &Node<T>,
    visit: &mut impl FnMut(&Node<T>) -> Result<(), E>,
    max_depth: i32,
) -> Result<(), E> {
    walk_node(root, visit, max_depth, 0)
}

fn walk_node<T, E>(
    node: &Node<T>,
    visit: &mut impl FnMut(&Node<T>) -> Result<(), E>,
    max_depth: i32,
    depth: i32,
) -> Result<(), E> {
    if max_depth != -1 && depth > max_depth {
        return Ok(());
    }

    visit(node)?;

    for child in node.children.values() {
        walk_node(child, visit, max_depth, depth + 1)?;
    }

    Ok(())
}

/// Mutable variant of [`walk`].
pub fn walk_mut<T, E>(
    root: &mut Node<T>,
    visit: &mut impl FnMut(&mut Node<T>) -> Result<(), E>,
    max_depth: i32,
) -> Result<(), E> {
    walk_node_mut(root, visit, max_depth, 0)
}

fn walk_node_mut<T, E>(
    node: &mut Node<T>,
    visit: &mut impl FnMut(&mut Node<T>) -> Result<(), E>,
    max_depth: i32,
    depth: i32,
) -> Result<(), E> {
    if max_depth != -1 && depth > max_depth {
        return Ok(());
    }

    visit(node)?;

    for child in node.children.values_mut() {
        walk_node_mut(child, visit, max_depth, depth + 1)?;
    }

    Ok(())
}

/// Invokes `visit` once for the root node and once for every node along
/// `path`, in root-to-leaf order. Fails with [`TreeError::EdgeNotFound`] if
/// an edge along the path is missing.
pub fn walk_path<T>(
    path: &str,
    root: &Node<T>,
    visit: &mut impl FnMut(&Node<T>),
) -> Result<(), TreeError> {
    if !is_valid_path(path) {
        return Err(TreeError::InvalidPath(path.to_owned()));
    }

    let mut current = root;
    visit(current);

    for edge in edges(path) {
        current = current
            .children
            .get(edge)
            .ok_or_else(|| TreeError::EdgeNotFound {
                path: path.to_owned(),
                edge: edge.to_owned(),
            })?;
        visit(current);
    }

    Ok(())
}

/// Mutable variant of [`walk_path`].
pub fn walk_path_mut<T>(
    path: &str,
    root: &mut Node<T>,
    visit: &mut impl FnMut(&mut Node<T>),
) -> Result<(), TreeError> {
    if !is_valid_path(path) {
        return Err(TreeError::InvalidPath(path.to_owned()));
    }

    let mut current = root;
    visit(current);

    for edge in edges(path) {
        current = current
            .children
            .get_mut(edge)
            .ok_or_else(|| TreeError::EdgeNotFound {
                path: path.to_owned(),
                edge: edge.to_owned(),
            })?;
        visit(current);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn count_nodes(root: &Node<u32>) -> usize {
        let mut count = 0;
        walk::<_, Infallible>(
            root,
            &mut |_| {
                count += 1;
                Ok(())
            },
            -1,
        )
        .unwrap();
        count
    }

    #[test]
    fn edges_for_root_are_empty() {
        assert!(edges("/").is_empty());
    }

    #[test]
    fn edges_split_on_delimiter() {
        assert_eq!(edges("/blog/coffee"), vec!["blog", "coffee"]);
    }

    #[test]
    fn create_node_builds_intermediates() {
        let mut root: Node<u32> = Node::default();
        create_node("/blog/coffee/espresso", &mut root, Node::new(7)).unwrap();

        let node = resolve_node("/blog/coffee/espresso", &root).unwrap();
        assert_eq!(node.value, 7);

        // Intermediates exist with default payloads.
        let blog = resolve_node("/blog", &root).unwrap();
        assert_eq!(blog.value, 0);
    }

    #[test]
    fn create_node_at_root_is_noop() {
        let mut root: Node<u32> = Node::new(1);
        create_node("/", &mut root, Node::new(99)).unwrap();
        assert_eq!(root.value, 1);
        assert!(root.children().is_empty());
    }

    #[test]
    fn create_node_keeps_existing_node() {
        let mut root: Node<u32> = Node::default();
        create_node("/blog", &mut root, Node::new(1)).unwrap();
        create_node("/blog", &mut root, Node::new(2)).unwrap();
        assert_eq!(resolve_node("/blog", &root).unwrap().value, 1);
    }

    #[test]
    fn create_node_rejects_invalid_path() {
        let mut root: Node<u32> = Node::default();
        let err = create_node("blog", &mut root, Node::default()).unwrap_err();
        assert_eq!(err, TreeError::InvalidPath("blog".into()));
    }

    #[test]
    fn resolve_node_returns_root_for_root_path() {
        let root: Node<u32> = Node::new(42);
        assert_eq!(resolve_node("/", &root).unwrap().value, 42);
    }

    #[test]
    fn resolve_node_fails_on_missing_edge() {
        let mut root: Node<u32> = Node::default();
        create_node("/blog", &mut root, Node::default()).unwrap();

        let err = resolve_node("/shop", &root).unwrap_err();
        assert_eq!(
            err,
            TreeError::EdgeNotFound {
                path: "/shop".into(),
                edge: "shop".into(),
            }
        );
    }

    #[test]
    fn resolve_or_init_creates_missing_nodes() {
        let mut root: Node<u32> = Node::default();
        resolve_or_init_node("/blog/coffee", &mut root).unwrap();
        assert!(resolve_node("/blog/coffee", &root).is_ok());
    }

    #[test]
    fn resolve_or_init_is_idempotent() {
        let mut root: Node<u32> = Node::default();

        resolve_or_init_node("/blog/coffee", &mut root).unwrap().value = 5;
        let before = count_nodes(&root);

        let node = resolve_or_init_node("/blog/coffee", &mut root).unwrap();
        assert_eq!(node.value, 5);
        assert_eq!(count_nodes(&root), before);
    }

    #[test]
    fn walk_visits_all_nodes() {
        let mut root: Node<u32> = Node::default();
        create_node("/a/b", &mut root, Node::default()).unwrap();
        create_node("/a/c", &mut root, Node::default()).unwrap();
        create_node("/d", &mut root, Node::default()).unwrap();

        // root, a, b, c, d
        assert_eq!(count_nodes(&root), 5);
    }

    #[test]
    fn walk_respects_max_depth() {
        let mut root: Node<u32> = Node::default();
        create_node("/a/b/c", &mut root, Node::default()).unwrap();

        let mut visited = 0;
        walk::<_, Infallible>(
            &root,
            &mut |_| {
                visited += 1;
                Ok(())
            },
            1,
        )
        .unwrap();

        // Root (depth 0) and /a (depth 1).
        assert_eq!(visited, 2);
    }

    #[test]
    fn walk_aborts_on_first_error() {
        let mut root: Node<u32> = Node::default();
        create_node("/a", &mut root, Node::default()).unwrap();
        create_node("/b", &mut root, Node::default()).unwrap();

        let mut visited = 0;
        let result = walk(
            &root,
            &mut |_| {
                visited += 1;
                Err("boom")
            },
            -1,
        );

        assert_eq!(result, Err("boom"));
        assert_eq!(visited, 1);
    }

    #[test]
    fn walk_path_visits_root_to_leaf() {
        let mut root: Node<u32> = Node::new(0);
        create_node("/a", &mut root, Node::new(1)).unwrap();
        create_node("/a/b", &mut root, Node::new(2)).unwrap();

        let mut order = Vec::new();
        walk_path("/a/b", &root, &mut |node| order.push(node.value)).unwrap();

        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn walk_path_fails_on_missing_edge() {
        let root: Node<u32> = Node::default();
        let err = walk_path("/nope", &root, &mut |_| {}).unwrap_err();
        assert!(matches!(err, TreeError::EdgeNotFound { .. }));
    }

    #[test]
    fn walk_path_mut_allows_mutation_along_path() {
        let mut root: Node<u32> = Node::default();
        create_node("/a/b", &mut root, Node::default()).unwrap();

        walk_path_mut("/a/b", &mut root, &mut |node| node.value += 1).unwrap();

        assert_eq!(root.value, 1);
        assert_eq!(resolve_node("/a", &root).unwrap().value, 1);
        assert_eq!(resolve_node("/a/b", &root).unwrap().value, 1);
    }
}
