//! Directory listings as an arena tree

use super::{EntryInfo, EntryKind, StorageBackend};
use crate::error::Result;
use crate::utils::helpers::{dirname, normalize_path};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub info: EntryInfo,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// A recursive listing with parent/child links by index. Node 0 is the root.
#[derive(Debug, Clone)]
pub struct EntryTree {
    root_path: String,
    nodes: Vec<TreeNode>,
}

impl EntryTree {
    /// List `path` recursively and link the entries up
    pub fn build(backend: &dyn StorageBackend, path: &str) -> Result<Self> {
        let entries = backend.list_entries(path, true, false)?;
        Ok(Self::from_entries(path, entries))
    }

    pub fn from_entries(root_path: &str, entries: Vec<EntryInfo>) -> Self {
        let root_path = normalize_path(root_path);
        let root = TreeNode {
            info: EntryInfo {
                name: String::new(),
                full_path: root_path.clone(),
                kind: EntryKind::Dir,
                size: 0,
                modified: None,
                permissions: String::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        let mut nodes = vec![root];
        let mut by_path: HashMap<String, usize> = HashMap::new();
        by_path.insert(root_path.clone(), 0);

        for info in entries {
            let parent = by_path.get(dirname(&info.full_path)).copied().unwrap_or(0);
            let index = nodes.len();
            by_path.insert(info.full_path.clone(), index);
            nodes[parent].children.push(index);
            nodes.push(TreeNode {
                info,
                parent: Some(parent),
                children: Vec::new(),
            });
        }

        Self { root_path, nodes }
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, index: usize) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = &TreeNode> {
        self.nodes
            .get(index)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|&child| self.nodes.get(child))
    }

    /// Path of `index` relative to the root, forward-slash separated
    pub fn relative_path(&self, index: usize) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            let node = self.nodes.get(i)?;
            if node.parent.is_none() {
                break;
            }
            parts.push(node.info.name.as_str());
            current = node.parent;
        }
        parts.reverse();
        Some(parts.join("/"))
    }

    /// Relative paths of every file, depth-first
    pub fn relative_files(&self) -> Vec<String> {
        (1..self.nodes.len())
            .filter(|&i| self.nodes[i].info.is_file())
            .filter_map(|i| self.relative_path(i))
            .collect()
    }

    /// Relative paths of every directory, depth-first
    pub fn relative_dirs(&self) -> Vec<String> {
        (1..self.nodes.len())
            .filter(|&i| self.nodes[i].info.is_dir())
            .filter_map(|i| self.relative_path(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(path: &str, kind: EntryKind) -> EntryInfo {
        EntryInfo {
            name: crate::utils::basename(path).to_string(),
            full_path: path.to_string(),
            kind,
            size: 0,
            modified: None,
            permissions: String::new(),
        }
    }

    #[test]
    fn test_links_parents_and_children() {
        let tree = EntryTree::from_entries(
            "/www/com_x/",
            vec![
                info("/www/com_x/index.php", EntryKind::File),
                info("/www/com_x/views", EntryKind::Dir),
                info("/www/com_x/views/list.php", EntryKind::File),
            ],
        );
        assert_eq!(tree.len(), 3);
        let top: Vec<_> = tree.children(0).map(|n| n.info.name.as_str()).collect();
        assert_eq!(top, vec!["index.php", "views"]);
        assert_eq!(tree.relative_files(), vec!["index.php", "views/list.php"]);
        assert_eq!(tree.relative_dirs(), vec!["views"]);
        assert_eq!(tree.node(3).unwrap().parent, Some(2));
    }
}
