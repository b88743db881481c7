//! Hierarchy store: owns every group, the parent -> children adjacency and the
//! renderable projection, and keeps the three consistent.
//!
//! # Invariants
//! - `(kind, name)` is unique across the store.
//! - Every non-root group's parent exists and lists it exactly once as a child.
//! - Only branch groups own an adjacency entry; species never parent anything.
//! - Deleting a group deletes its whole subtree.

use std::collections::{BTreeMap, HashMap};

use generational_arena::Index;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeData, TreeArena, DEFAULT_ROOT_LABEL};
use crate::domain::entities::{
    AttrValue, Attributes, Group, GroupKey, GroupPayload, SpeciesMeasures, ROOT_KIND,
    TERMINAL_KIND,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::search::SearchQuery;

/// In-memory tree of life.
#[derive(Debug)]
pub struct HierarchyStore {
    groups: BTreeMap<GroupKey, Group>,
    /// Children of every branch group, in creation order
    children: HashMap<GroupKey, Vec<GroupKey>>,
    projection: TreeArena,
    /// Projection node of every group
    nodes: HashMap<GroupKey, Index>,
}

impl Default for HierarchyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyStore {
    pub fn new() -> Self {
        Self::with_root_label(DEFAULT_ROOT_LABEL)
    }

    /// Store whose projection root carries `root_label`.
    pub fn with_root_label(root_label: &str) -> Self {
        Self {
            groups: BTreeMap::new(),
            children: HashMap::new(),
            projection: TreeArena::new(root_label),
            nodes: HashMap::new(),
        }
    }

    /// Create a branch group (any rank except `Species`).
    ///
    /// # Errors
    /// - `DuplicateEntity` if `(kind, name)` exists
    /// - `MissingParent` if a non-root group has no parent, or the parent is
    ///   absent or a species
    /// - `InvalidArgument` for `Species` (use [`Self::create_species`]) or a
    ///   `Life` group given a parent
    #[instrument(level = "debug", skip(self, description, attributes))]
    pub fn create(
        &mut self,
        kind: &str,
        name: &str,
        parent: Option<GroupKey>,
        description: Option<String>,
        attributes: Attributes,
    ) -> DomainResult<&Group> {
        if kind == TERMINAL_KIND {
            return Err(DomainError::InvalidArgument(format!(
                "{TERMINAL_KIND} '{name}' needs age, weight and size"
            )));
        }
        self.insert(
            GroupKey::new(kind, name),
            parent,
            description,
            attributes,
            GroupPayload::Branch,
        )
    }

    /// Create a species. The measures are folded into its own attributes
    /// under `Age`, `Weight` and `Size`, overriding same-named extras.
    #[instrument(level = "debug", skip(self, description, attributes))]
    pub fn create_species(
        &mut self,
        name: &str,
        parent: GroupKey,
        measures: SpeciesMeasures,
        description: Option<String>,
        mut attributes: Attributes,
    ) -> DomainResult<&Group> {
        measures.fold_into(&mut attributes);
        self.insert(
            GroupKey::new(TERMINAL_KIND, name),
            Some(parent),
            description,
            attributes,
            GroupPayload::Species(measures),
        )
    }

    fn insert(
        &mut self,
        key: GroupKey,
        parent: Option<GroupKey>,
        description: Option<String>,
        own_attributes: Attributes,
        payload: GroupPayload,
    ) -> DomainResult<&Group> {
        if self.groups.contains_key(&key) {
            return Err(DomainError::DuplicateEntity(key));
        }
        if key.is_root_kind() {
            if let Some(p) = &parent {
                return Err(DomainError::InvalidArgument(format!(
                    "{ROOT_KIND} group '{}' cannot have a super set ({p})",
                    key.name
                )));
            }
        } else {
            // Species own no adjacency entry, so they can never be found as a parent
            match &parent {
                Some(p) if self.children.contains_key(p) => {}
                _ => return Err(DomainError::missing_parent(&key, parent.as_ref())),
            }
        }

        let parent_node = match &parent {
            Some(p) => self.nodes.get(p).copied(),
            None => Some(self.projection.root()),
        };
        let node_idx = parent_node
            .and_then(|idx| {
                self.projection.insert_node(
                    NodeData {
                        key: Some(key.clone()),
                        label: key.tree_label(),
                    },
                    idx,
                )
            })
            .ok_or_else(|| DomainError::missing_parent(&key, parent.as_ref()))?;

        if let Some(p) = &parent {
            if let Some(siblings) = self.children.get_mut(p) {
                siblings.push(key.clone());
            }
        }
        if matches!(payload, GroupPayload::Branch) {
            self.children.insert(key.clone(), Vec::new());
        }
        self.nodes.insert(key.clone(), node_idx);

        let effective_attributes = self.inherit(parent.as_ref(), &own_attributes);
        debug!(
            "created {} with {} effective attributes",
            key,
            effective_attributes.len()
        );
        let group = Group {
            key: key.clone(),
            parent,
            description,
            payload,
            own_attributes,
            effective_attributes,
        };
        Ok(self.groups.entry(key).or_insert(group))
    }

    /// Delete a group together with its whole subtree.
    ///
    /// # Errors
    /// - `NotFound` if the group does not exist
    /// - `MissingParent` if the recorded parent has no adjacency entry
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, kind: &str, name: &str) -> DomainResult<()> {
        let key = GroupKey::new(kind, name);
        let parent = self
            .groups
            .get(&key)
            .ok_or_else(|| DomainError::NotFound(key.clone()))?
            .parent
            .clone();

        // Projection removal is idempotent: an absent node is not an error
        if let Some(idx) = self.nodes.get(&key).copied() {
            let removed = self.projection.remove_subtree(idx);
            debug!("removed {} projection nodes", removed.len());
        }

        if let Some(p) = &parent {
            let siblings = self
                .children
                .get_mut(p)
                .ok_or_else(|| DomainError::missing_parent(&key, Some(p)))?;
            siblings.retain(|c| c != &key);
        }

        // Children before parents
        for doomed in self.subtree_postorder(&key) {
            self.groups.remove(&doomed);
            self.children.remove(&doomed);
            self.nodes.remove(&doomed);
        }
        Ok(())
    }

    /// Overwrite one own attribute on a group and every descendant.
    ///
    /// Effective attributes of the edited subtree are recomputed afterwards;
    /// groups outside it are untouched. `Age`, `Weight` and `Size` also update
    /// the measures of every species in the subtree.
    ///
    /// # Errors
    /// - `NotFound` if the group does not exist
    /// - `InvalidArgument` if a species measure would be set to text
    #[instrument(level = "debug", skip(self, value))]
    pub fn edit_attribute(
        &mut self,
        key: &GroupKey,
        attribute: &str,
        value: AttrValue,
    ) -> DomainResult<()> {
        if !self.groups.contains_key(key) {
            return Err(DomainError::NotFound(key.clone()));
        }
        let affected = self.subtree_preorder(key);
        let number = value.as_number();
        if number.is_none()
            && SpeciesMeasures::is_measure_key(attribute)
            && affected
                .iter()
                .any(|member| self.groups.get(member).is_some_and(Group::is_species))
        {
            return Err(DomainError::InvalidArgument(format!(
                "{attribute} of a species must be a number, got '{value}'"
            )));
        }
        for member in &affected {
            if let Some(group) = self.groups.get_mut(member) {
                group
                    .own_attributes
                    .insert(attribute.to_string(), value.clone());
                if let (GroupPayload::Species(measures), Some(n)) = (&mut group.payload, number) {
                    measures.set(attribute, n);
                }
            }
        }
        // Pre-order: parents are refreshed before their children
        for member in &affected {
            self.refresh_effective(member);
        }
        debug!("edited '{}' on {} groups", attribute, affected.len());
        Ok(())
    }

    /// Replace the free-text description of a group.
    pub fn set_description(
        &mut self,
        key: &GroupKey,
        description: Option<String>,
    ) -> DomainResult<()> {
        let group = self
            .groups
            .get_mut(key)
            .ok_or_else(|| DomainError::NotFound(key.clone()))?;
        group.description = description;
        Ok(())
    }

    /// Groups satisfying every active predicate of `query`, keyed by identifier.
    #[instrument(level = "debug", skip(self))]
    pub fn search(&self, query: &SearchQuery) -> BTreeMap<GroupKey, &Group> {
        let compiled = query.compile();
        let matches: BTreeMap<GroupKey, &Group> = self
            .groups
            .iter()
            .filter(|(_, group)| compiled.accepts(group))
            .map(|(key, group)| (key.clone(), group))
            .collect();
        debug!("search matched {} of {} groups", matches.len(), self.len());
        matches
    }

    pub fn get(&self, kind: &str, name: &str) -> Option<&Group> {
        self.groups.get(&GroupKey::new(kind, name))
    }

    pub fn get_by_key(&self, key: &GroupKey) -> Option<&Group> {
        self.groups.get(key)
    }

    pub fn contains(&self, key: &GroupKey) -> bool {
        self.groups.contains_key(key)
    }

    /// Formatted summary of one group, see [`Group::info`].
    pub fn info(&self, key: &GroupKey) -> DomainResult<String> {
        self.groups
            .get(key)
            .map(Group::info)
            .ok_or_else(|| DomainError::NotFound(key.clone()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All groups in identifier order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Direct children in creation order; empty for species and unknown keys.
    pub fn children(&self, key: &GroupKey) -> &[GroupKey] {
        self.children.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ancestor chain from the hierarchy root down to the group itself.
    pub fn ancestors(&self, key: &GroupKey) -> Vec<&Group> {
        let mut chain = Vec::new();
        let mut current = self.groups.get(key);
        while let Some(group) = current {
            chain.push(group);
            current = group.parent.as_ref().and_then(|p| self.groups.get(p));
        }
        chain.reverse();
        chain
    }

    /// Adjacency restricted to the subtree rooted at `key`.
    ///
    /// A species maps to an empty child list.
    pub fn subtree(&self, key: &GroupKey) -> DomainResult<BTreeMap<GroupKey, Vec<GroupKey>>> {
        if !self.groups.contains_key(key) {
            return Err(DomainError::NotFound(key.clone()));
        }
        Ok(self
            .subtree_preorder(key)
            .into_iter()
            .map(|member| {
                let kids = self.children(&member).to_vec();
                (member, kids)
            })
            .collect())
    }

    /// The shared projection of the whole hierarchy.
    pub fn render_tree(&self) -> &TreeArena {
        &self.projection
    }

    /// Displayable tree rooted at one group.
    pub fn subtree_view(&self, key: &GroupKey) -> DomainResult<Tree<String>> {
        let idx = self
            .nodes
            .get(key)
            .ok_or_else(|| DomainError::NotFound(key.clone()))?;
        Ok(self.projection.to_tree_string(*idx))
    }

    /// Merge own attributes over the effective attributes of the ancestor chain.
    fn inherit(&self, parent: Option<&GroupKey>, own: &Attributes) -> Attributes {
        let mut effective = Attributes::new();
        if let Some(p) = parent {
            for ancestor in self.ancestors(p) {
                effective.extend(
                    ancestor
                        .own_attributes
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }
        }
        effective.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        effective
    }

    fn refresh_effective(&mut self, key: &GroupKey) {
        let Some(group) = self.groups.get(key) else {
            return;
        };
        let effective = self.inherit(group.parent.as_ref(), &group.own_attributes);
        if let Some(group) = self.groups.get_mut(key) {
            group.effective_attributes = effective;
        }
    }

    fn subtree_preorder(&self, key: &GroupKey) -> Vec<GroupKey> {
        let mut order = Vec::new();
        let mut stack = vec![key.clone()];
        while let Some(current) = stack.pop() {
            // Reverse so children come out in creation order
            stack.extend(self.children(&current).iter().rev().cloned());
            order.push(current);
        }
        order
    }

    fn subtree_postorder(&self, key: &GroupKey) -> Vec<GroupKey> {
        let mut order = Vec::new();
        let mut stack = vec![(key.clone(), false)];
        while let Some((current, visited)) = stack.pop() {
            if visited {
                order.push(current);
            } else {
                let kids = self.children(&current).to_vec();
                stack.push((current, true));
                for child in kids.into_iter().rev() {
                    stack.push((child, false));
                }
            }
        }
        order
    }
}
