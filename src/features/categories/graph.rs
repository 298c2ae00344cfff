//! In-memory category hierarchy.
//!
//! Categories are stored as a flat table where every row may point at a parent
//! through `parent_id`. The table is edited by administrators and is allowed to
//! be inconsistent: a parent may be missing, a row may point at itself, and
//! nothing stops two rows from pointing at each other. [`CategoryGraph`] turns
//! such a row set into owned trees without ever failing:
//!
//! - a row is a **root** when its `parent_id` is null, equal to its own id, or
//!   unknown;
//! - every other row is attached to its parent, in input order;
//! - rows caught in a multi-row cycle have no root ancestor and only show up
//!   when a lookup starts inside the cycle. Every recursive walk carries a
//!   visited set, so such lookups terminate.
//!
//! The graph is built per request and borrows the fetched rows; nothing is
//! shared between calls.

use std::collections::HashMap;

use crate::features::categories::models::Category;
use crate::shared::constants::HEADER_MENU_CATEGORY_TYPE;

/// A category together with its attached children
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn id(&self) -> i32 {
        self.category.id
    }

    /// Number of nodes in this subtree, the node itself included
    #[cfg(test)]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::size).sum::<usize>()
    }
}

/// Filters accepted by the tree endpoint
#[derive(Debug, Clone, Default)]
pub struct CategoryQuery {
    pub slug_or_url: Option<String>,
    pub category_type: Option<String>,
}

impl CategoryQuery {
    /// Blank strings are treated as absent. Other values are kept verbatim.
    pub fn new(slug_or_url: Option<String>, category_type: Option<String>) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            slug_or_url: non_blank(slug_or_url),
            category_type: non_blank(category_type),
        }
    }
}

/// Result of [`CategoryGraph::query`]
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryTree {
    /// Full forest or the roots of one category type
    Forest(Vec<CategoryNode>),
    /// Single node looked up by slug or url
    Subtree(Option<CategoryNode>),
}

/// Parent/child index over a borrowed set of category rows.
///
/// Rows are addressed by their position in input order. Duplicate ids keep the
/// first occurrence.
pub struct CategoryGraph<'a> {
    nodes: Vec<&'a Category>,
    index: HashMap<i32, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl<'a> CategoryGraph<'a> {
    /// Index `rows` and attach every non-root row to its parent.
    ///
    /// Attachment crosses category types: a `NEWS` row may sit below a
    /// `HEADER_MENU` row.
    pub fn new(rows: &'a [Category]) -> Self {
        let (nodes, index) = register(rows.iter());

        let mut parents = vec![None; nodes.len()];
        let mut children = vec![Vec::new(); nodes.len()];

        for (pos, row) in nodes.iter().enumerate() {
            let parent = row
                .parent_id
                .filter(|&parent_id| parent_id != row.id)
                .and_then(|parent_id| index.get(&parent_id).copied());

            if let Some(parent) = parent {
                parents[pos] = Some(parent);
                children[parent].push(pos);
            }
        }

        Self {
            nodes,
            index,
            parents,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is a root of the full forest. Unknown ids are not roots.
    #[cfg(test)]
    pub fn is_root(&self, id: i32) -> bool {
        self.index
            .get(&id)
            .is_some_and(|&pos| self.parents[pos].is_none())
    }

    /// All roots with their attached subtrees, in input order
    pub fn full_forest(&self) -> Vec<CategoryNode> {
        let mut visited = vec![false; self.nodes.len()];

        let forest: Vec<CategoryNode> = (0..self.nodes.len())
            .filter(|&pos| self.parents[pos].is_none())
            .map(|pos| self.materialize(pos, &mut visited))
            .collect();

        let unreachable = self.unvisited_ids(&visited);
        if !unreachable.is_empty() {
            tracing::warn!(
                "Categories without a root ancestor (parent cycle): {:?}",
                unreachable
            );
        }

        forest
    }

    /// The first node whose slug equals `slug_or_url`, else the first node
    /// whose url does, with its attached subtree.
    pub fn find_subtree(&self, slug_or_url: &str) -> Option<CategoryNode> {
        let pos = self
            .position(|c| c.slug.as_deref() == Some(slug_or_url))
            .or_else(|| self.position(|c| c.url.as_deref() == Some(slug_or_url)))?;

        let mut visited = vec![false; self.nodes.len()];
        Some(self.materialize(pos, &mut visited))
    }

    /// Nodes of `category_type` whose parent is absent or of another type.
    ///
    /// Descendants are returned as attached and are not filtered by type, so a
    /// type root may contain further type roots of the same type below a
    /// node of a different type.
    pub fn find_type_roots(&self, category_type: &str) -> Vec<CategoryNode> {
        (0..self.nodes.len())
            .filter(|&pos| self.is_type_root(pos, category_type))
            .map(|pos| {
                let mut visited = vec![false; self.nodes.len()];
                self.materialize(pos, &mut visited)
            })
            .collect()
    }

    /// Slug lookup wins over the type filter; no filter returns the full forest.
    pub fn query(&self, query: &CategoryQuery) -> CategoryTree {
        if let Some(slug_or_url) = query.slug_or_url.as_deref() {
            return CategoryTree::Subtree(self.find_subtree(slug_or_url));
        }

        match query.category_type.as_deref() {
            Some(category_type) => CategoryTree::Forest(self.find_type_roots(category_type)),
            None => CategoryTree::Forest(self.full_forest()),
        }
    }

    /// Ids of every node attached below `id`, in depth-first order
    pub fn descendant_ids(&self, id: i32) -> Vec<i32> {
        let Some(&start) = self.index.get(&id) else {
            return Vec::new();
        };

        let mut visited = vec![false; self.nodes.len()];
        visited[start] = true;

        let mut ids = Vec::new();
        let mut stack: Vec<usize> = self.children[start].iter().rev().copied().collect();
        while let Some(pos) = stack.pop() {
            if visited[pos] {
                continue;
            }
            visited[pos] = true;
            ids.push(self.nodes[pos].id);
            stack.extend(self.children[pos].iter().rev().copied());
        }

        ids
    }

    fn is_type_root(&self, pos: usize, category_type: &str) -> bool {
        if self.nodes[pos].category_type != category_type {
            return false;
        }

        match self.parents[pos] {
            None => true,
            Some(parent) => self.nodes[parent].category_type != category_type,
        }
    }

    /// Whether `id` or one of its ancestors is in `ids`
    fn has_ancestor_in(&self, id: i32, ids: &[i32]) -> bool {
        let Some(&start) = self.index.get(&id) else {
            return false;
        };

        let mut seen = vec![false; self.nodes.len()];
        let mut pos = start;
        loop {
            if ids.contains(&self.nodes[pos].id) {
                return true;
            }
            seen[pos] = true;
            match self.parents[pos] {
                Some(parent) if !seen[parent] => pos = parent,
                _ => return false,
            }
        }
    }

    fn unvisited_ids(&self, visited: &[bool]) -> Vec<i32> {
        visited
            .iter()
            .enumerate()
            .filter(|(_, seen)| !**seen)
            .map(|(pos, _)| self.nodes[pos].id)
            .collect()
    }

    fn position(&self, predicate: impl Fn(&Category) -> bool) -> Option<usize> {
        self.nodes.iter().position(|c| predicate(c))
    }

    fn materialize(&self, pos: usize, visited: &mut [bool]) -> CategoryNode {
        visited[pos] = true;

        let mut children = Vec::with_capacity(self.children[pos].len());
        for &child in &self.children[pos] {
            if visited[child] {
                tracing::warn!(
                    "Category cycle: {} -> {} not followed",
                    self.nodes[pos].id,
                    self.nodes[child].id
                );
                continue;
            }
            children.push(self.materialize(child, visited));
        }

        CategoryNode {
            category: self.nodes[pos].clone(),
            children,
        }
    }
}

/// Build the navigation menu from the `HEADER_MENU` rows only.
///
/// Rows of other types are discarded before any attachment. A menu row whose
/// parent is not itself a menu row is parked in a pending table keyed by the
/// parent id; that table is never drained, so such rows do not appear in the
/// menu. The same applies to self-referencing menu rows. Menu rows caught in
/// a parent cycle are left out as well; both cases are logged.
pub fn build_header_menu(rows: &[Category]) -> Vec<CategoryNode> {
    let (menu, cyclic) = assemble_header_menu(rows);
    if !cyclic.is_empty() {
        tracing::warn!("Header menu items left out, parent cycle: {:?}", cyclic);
    }
    menu
}

/// Menu roots with their subtrees, plus the ids of menu rows that only point
/// at each other and therefore never reach a root.
fn assemble_header_menu(rows: &[Category]) -> (Vec<CategoryNode>, Vec<i32>) {
    let (nodes, index) = register(
        rows.iter()
            .filter(|c| c.category_type == HEADER_MENU_CATEGORY_TYPE),
    );

    let mut parents = vec![None; nodes.len()];
    let mut children = vec![Vec::new(); nodes.len()];
    let mut roots = Vec::new();
    let mut pending: HashMap<i32, Vec<i32>> = HashMap::new();

    for (pos, row) in nodes.iter().enumerate() {
        match row.parent_id {
            None => roots.push(pos),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent) if parent != pos => {
                    parents[pos] = Some(parent);
                    children[parent].push(pos);
                }
                _ => pending.entry(parent_id).or_default().push(row.id),
            },
        }
    }

    if !pending.is_empty() {
        tracing::warn!(
            "Header menu items left out, parent not in menu: {:?}",
            pending
        );
    }

    let graph = CategoryGraph {
        nodes,
        index,
        parents,
        children,
    };

    let mut visited = vec![false; graph.len()];
    let menu = roots
        .into_iter()
        .map(|pos| graph.materialize(pos, &mut visited))
        .collect();

    // pending rows and everything below them are unvisited as well
    let parked: Vec<i32> = pending.into_values().flatten().collect();
    let cyclic = graph
        .unvisited_ids(&visited)
        .into_iter()
        .filter(|&id| !graph.has_ancestor_in(id, &parked))
        .collect();

    (menu, cyclic)
}

fn register<'a>(
    rows: impl Iterator<Item = &'a Category>,
) -> (Vec<&'a Category>, HashMap<i32, usize>) {
    let mut nodes = Vec::new();
    let mut index = HashMap::new();

    for row in rows {
        if index.contains_key(&row.id) {
            tracing::warn!("Duplicate category id {} ignored", row.id);
            continue;
        }
        index.insert(row.id, nodes.len());
        nodes.push(row);
    }

    (nodes, index)
}
