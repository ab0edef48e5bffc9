//! The hierarchy store
//!
//! Single in-memory cache of the program tree. Owns fetch de-duplication,
//! lazy effort hydration, lookups over the tree, and the save/delete round
//! trips. Mutation happens in place behind a lock; observers are notified
//! through an explicit version counter because nested edits are invisible
//! to them otherwise.

use crate::error::StoreError;
use catalog_gateway::CatalogGateway;
use catalog_model::{EffortUuid, ProgramId, ProgramNode, SoftwareEffort};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Store configuration
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Fetch per-node software efforts after the base tree lands
    /// (production mode). Mock payloads embed efforts in the tree and turn
    /// this off.
    pub hydrate_efforts: bool,
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With effort hydration toggled
    #[inline]
    #[must_use]
    pub fn with_hydrate_efforts(mut self, hydrate: bool) -> Self {
        self.hydrate_efforts = hydrate;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            hydrate_efforts: true,
        }
    }
}

/// One row of the flattened catalog, for search/autocomplete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    /// Program id or effort uuid, as a display string
    pub id: String,
    pub is_effort: bool,
    /// Owning program, set only for effort entries
    pub parent_program_id: Option<ProgramId>,
    /// Owning program's name, set only for effort entries
    pub program_name: Option<String>,
}

type LoadFuture = Shared<BoxFuture<'static, Result<(), StoreError>>>;

#[derive(Debug, Default)]
struct StoreState {
    roots: Vec<ProgramNode>,
    loaded: bool,
    load_error: Option<String>,
}

struct StoreInner {
    gateway: Arc<dyn CatalogGateway>,
    config: StoreConfig,
    state: RwLock<StoreState>,
    inflight: Mutex<Option<LoadFuture>>,
    version: watch::Sender<u64>,
}

impl StoreInner {
    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    async fn load(inner: Arc<StoreInner>) -> Result<(), StoreError> {
        tracing::info!("fetching program hierarchy");
        let mut roots = match inner.gateway.fetch_hierarchy().await {
            Ok(roots) => roots,
            Err(err) => {
                let error = StoreError::Gateway(err.to_string());
                tracing::warn!(error = %error, "hierarchy fetch failed");
                inner.state.write().load_error = Some(error.to_string());
                return Err(error);
            }
        };

        if inner.config.hydrate_efforts {
            hydrate_efforts(&*inner.gateway, &mut roots).await;
        }

        {
            let mut state = inner.state.write();
            state.roots = roots;
            state.loaded = true;
            state.load_error = None;
        }
        inner.bump();
        tracing::info!("program hierarchy ready");
        Ok(())
    }
}

/// Fetch efforts for every node expecting them, all at once
///
/// A single node's failure is isolated: it gets an empty list and a
/// warning, and the rest of the hydration proceeds.
async fn hydrate_efforts(gateway: &dyn CatalogGateway, roots: &mut [ProgramNode]) {
    let mut expecting: Vec<ProgramId> = Vec::new();
    let mut stack: Vec<&ProgramNode> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        if node.expecting_software_efforts {
            expecting.push(node.id.clone());
        }
        stack.extend(node.children.iter());
    }
    if expecting.is_empty() {
        return;
    }

    tracing::info!(nodes = expecting.len(), "hydrating software efforts");
    let fetches = expecting.into_iter().map(|id| async move {
        let result = gateway.fetch_efforts(&id).await;
        (id, result)
    });

    for (id, result) in join_all(fetches).await {
        let Some(node) = find_node_mut(roots, &id) else {
            continue;
        };
        match result {
            Ok(efforts) => node.software_efforts = efforts,
            Err(err) => {
                tracing::warn!(
                    program = %id,
                    error = %err,
                    "effort hydration failed; defaulting to empty list"
                );
                node.software_efforts = Vec::new();
            }
        }
    }
}

fn find_node<'a>(roots: &'a [ProgramNode], id: &ProgramId) -> Option<&'a ProgramNode> {
    let mut stack: Vec<&ProgramNode> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        if &node.id == id {
            return Some(node);
        }
        stack.extend(node.children.iter());
    }
    None
}

fn find_node_mut<'a>(nodes: &'a mut [ProgramNode], id: &ProgramId) -> Option<&'a mut ProgramNode> {
    for node in nodes {
        if &node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn path_in<'a>(nodes: &'a [ProgramNode], id: &ProgramId) -> Option<Vec<&'a ProgramNode>> {
    for node in nodes {
        if &node.id == id {
            return Some(vec![node]);
        }
        if let Some(mut path) = path_in(&node.children, id) {
            path.insert(0, node);
            return Some(path);
        }
    }
    None
}

fn flatten_into(node: &ProgramNode, out: &mut Vec<CatalogEntry>) {
    out.push(CatalogEntry {
        name: node.name.clone(),
        id: node.id.to_string(),
        is_effort: false,
        parent_program_id: None,
        program_name: None,
    });
    for effort in &node.software_efforts {
        out.push(CatalogEntry {
            name: effort.name.clone(),
            id: effort.uuid.to_string(),
            is_effort: true,
            parent_program_id: Some(node.id.clone()),
            program_name: Some(node.name.clone()),
        });
    }
    for child in &node.children {
        flatten_into(child, out);
    }
}

fn prune_expecting(node: &ProgramNode) -> Option<ProgramNode> {
    let children: Vec<ProgramNode> = node.children.iter().filter_map(prune_expecting).collect();
    if node.expecting_software_efforts || !children.is_empty() {
        let mut kept = node.clone();
        kept.children = children;
        Some(kept)
    } else {
        None
    }
}

/// Would attaching `candidate` (with its `parent_uuid`) close a cycle?
fn creates_parent_cycle(existing: &[SoftwareEffort], candidate: &SoftwareEffort) -> bool {
    let mut parents: HashMap<EffortUuid, Option<EffortUuid>> = existing
        .iter()
        .map(|e| (e.uuid, e.parent_uuid))
        .collect();
    parents.insert(candidate.uuid, candidate.parent_uuid);

    let mut seen = HashSet::from([candidate.uuid]);
    let mut current = candidate.parent_uuid;
    while let Some(uuid) = current {
        if !seen.insert(uuid) {
            return true;
        }
        // A dangling parent ends the chain; the builder demotes it to root
        current = parents.get(&uuid).copied().flatten();
    }
    false
}

/// In-memory cache of the program tree
///
/// Cheap to clone; all clones share the same state. Construct one per
/// logical catalog and hand it to whatever needs catalog data.
#[derive(Clone)]
pub struct HierarchyStore {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for HierarchyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("HierarchyStore")
            .field("loaded", &state.loaded)
            .field("roots", &state.roots.len())
            .field("version", &*self.inner.version.borrow())
            .finish()
    }
}

impl HierarchyStore {
    /// Create a store over the given gateway
    #[must_use]
    pub fn new(gateway: Arc<dyn CatalogGateway>, config: StoreConfig) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                gateway,
                config,
                state: RwLock::new(StoreState::default()),
                inflight: Mutex::new(None),
                version,
            }),
        }
    }

    /// Whether the hierarchy has been loaded
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.state.read().loaded
    }

    /// Last load failure, if the hierarchy never arrived
    #[must_use]
    pub fn load_error(&self) -> Option<String> {
        self.inner.state.read().load_error.clone()
    }

    /// Current change version
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.inner.version.borrow()
    }

    /// Observe structural changes
    ///
    /// The carried value is a bare version counter; on change, re-derive
    /// whatever view was built from store data.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Drop all cached data so the next fetch reloads
    ///
    /// Does not cancel a fetch already in flight; its result will land
    /// after the reset.
    pub fn reset(&self) {
        *self.inner.state.write() = StoreState::default();
        self.inner.bump();
    }

    /// Fetch the hierarchy if not already present
    ///
    /// Idempotent: a loaded store answers immediately. Concurrent callers
    /// share one underlying request and all observe its settled result.
    /// After a failure the in-flight handle is cleared, so the next call
    /// retries.
    ///
    /// # Errors
    /// [`StoreError::Gateway`] when the backend cannot deliver the tree.
    pub async fn fetch_hierarchy(&self) -> Result<(), StoreError> {
        if self.inner.state.read().loaded {
            tracing::debug!("hierarchy already loaded; serving from cache");
            return Ok(());
        }

        let load = {
            let mut inflight = self.inner.inflight.lock().await;
            // Re-check under the lock: a racing load may just have landed
            if self.inner.state.read().loaded {
                return Ok(());
            }
            match inflight.as_ref() {
                Some(load) => load.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    let load = StoreInner::load(inner).boxed().shared();
                    *inflight = Some(load.clone());
                    load
                }
            }
        };

        let result = load.clone().await;

        // Only the future we actually awaited may be cleared; a newer
        // retry's handle must survive late waiters
        let mut inflight = self.inner.inflight.lock().await;
        if inflight.as_ref().is_some_and(|f| f.ptr_eq(&load)) {
            *inflight = None;
        }
        result
    }

    /// Look up a program by id
    #[must_use]
    pub fn find_by_id(&self, id: &ProgramId) -> Option<ProgramNode> {
        find_node(&self.inner.state.read().roots, id).cloned()
    }

    /// Look up a program by name, case-insensitive and trimmed
    ///
    /// Depth-first pre-order; first match wins.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<ProgramNode> {
        let needle = name.trim().to_lowercase();
        let state = self.inner.state.read();
        let mut stack: Vec<&ProgramNode> = state.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.name.trim().to_lowercase() == needle {
                return Some(node.clone());
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Path from a root to the target, both inclusive
    #[must_use]
    pub fn path_to(&self, id: &ProgramId) -> Option<Vec<ProgramNode>> {
        let state = self.inner.state.read();
        path_in(&state.roots, id).map(|path| path.into_iter().cloned().collect())
    }

    /// One entry per program and per effort, depth-first pre-order
    ///
    /// A program's own entry comes before its efforts' entries, which come
    /// before its children's entries.
    #[must_use]
    pub fn flatten_with_efforts(&self) -> Vec<CatalogEntry> {
        let state = self.inner.state.read();
        let mut out = Vec::new();
        for root in &state.roots {
            flatten_into(root, &mut out);
        }
        out
    }

    /// The tree pruned to nodes expecting software efforts
    ///
    /// A node survives iff it or some descendant has the expecting flag;
    /// everything else is omitted entirely.
    #[must_use]
    pub fn filter_expecting_subtree(&self) -> Vec<ProgramNode> {
        let state = self.inner.state.read();
        state.roots.iter().filter_map(prune_expecting).collect()
    }

    /// The efforts attached to one program
    #[must_use]
    pub fn efforts_for(&self, program: &ProgramId) -> Option<Vec<SoftwareEffort>> {
        let state = self.inner.state.read();
        find_node(&state.roots, program).map(|node| node.software_efforts.clone())
    }

    /// Create or update an effort through the gateway
    ///
    /// Validates locally first (record invariants, parent-cycle check),
    /// then saves, then mirrors the stored record into the owning node by
    /// id match falling back to uuid. The cache is only mutated after the
    /// backend confirms.
    ///
    /// # Errors
    /// [`StoreError::Validation`], [`StoreError::CyclicParent`],
    /// [`StoreError::ProgramNotFound`], or the gateway's failure.
    pub async fn save_effort(
        &self,
        program: &ProgramId,
        effort: SoftwareEffort,
    ) -> Result<SoftwareEffort, StoreError> {
        effort
            .validate()
            .map_err(|e| StoreError::Validation(e.to_string()))?;
        {
            let state = self.inner.state.read();
            let node = find_node(&state.roots, program)
                .ok_or_else(|| StoreError::ProgramNotFound(program.clone()))?;
            if creates_parent_cycle(&node.software_efforts, &effort) {
                return Err(StoreError::CyclicParent { uuid: effort.uuid });
            }
        }

        let stored = self
            .inner
            .gateway
            .save_effort(program, &effort)
            .await
            .map_err(StoreError::from)?;

        {
            let mut state = self.inner.state.write();
            if let Some(node) = find_node_mut(&mut state.roots, program) {
                let slot = node.software_efforts.iter_mut().find(|e| {
                    match (e.id, stored.id) {
                        (Some(a), Some(b)) => a == b,
                        _ => e.uuid == stored.uuid,
                    }
                });
                match slot {
                    Some(existing) => *existing = stored.clone(),
                    None => node.software_efforts.push(stored.clone()),
                }
            } else {
                tracing::warn!(program = %program, "saved effort but owning node vanished");
            }
        }
        self.inner.bump();
        tracing::info!(program = %program, effort = %stored.uuid, "software effort saved");
        Ok(stored)
    }

    /// Delete an effort through the gateway
    ///
    /// On confirmation the effort is removed from the owning node and
    /// scrubbed from sibling cross-references. Stale `parent_uuid`
    /// pointers at the children are left in place; the forest builder
    /// demotes those to roots.
    ///
    /// # Errors
    /// [`StoreError::EffortNotFound`] when the backend does not know the
    /// uuid (including a repeated delete), or the gateway's failure.
    pub async fn delete_effort(
        &self,
        program: &ProgramId,
        uuid: &EffortUuid,
    ) -> Result<(), StoreError> {
        self.inner
            .gateway
            .delete_effort(uuid)
            .await
            .map_err(StoreError::from)?;

        {
            let mut state = self.inner.state.write();
            if let Some(node) = find_node_mut(&mut state.roots, program) {
                match node.software_efforts.iter().position(|e| &e.uuid == uuid) {
                    Some(index) => {
                        node.software_efforts.remove(index);
                    }
                    None => {
                        tracing::warn!(program = %program, effort = %uuid, "deleted effort was not cached locally");
                    }
                }
                for effort in &mut node.software_efforts {
                    effort.linked_software_efforts.retain(|linked| linked != uuid);
                }
            }
        }
        self.inner.bump();
        tracing::info!(program = %program, effort = %uuid, "software effort deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_gateway::InMemoryGateway;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> ProgramNode {
        ProgramNode::new("1", "Root").with_children(vec![
            ProgramNode::new("2", "A"),
            ProgramNode::new("3", "B").with_children(vec![ProgramNode::new("4", "C").expecting()]),
        ])
    }

    async fn loaded_store() -> (Arc<InMemoryGateway>, HierarchyStore) {
        let gateway = Arc::new(InMemoryGateway::new().with_programs(vec![sample_tree()]));
        let store = HierarchyStore::new(
            Arc::clone(&gateway) as Arc<dyn CatalogGateway>,
            StoreConfig::new().with_hydrate_efforts(false),
        );
        store.fetch_hierarchy().await.unwrap();
        (gateway, store)
    }

    #[tokio::test]
    async fn find_by_name_is_case_insensitive_and_trimmed() {
        let (_, store) = loaded_store().await;
        assert_eq!(store.find_by_name("  b  ").unwrap().name, "B");
        assert_eq!(store.find_by_name("ROOT").unwrap().name, "Root");
        assert!(store.find_by_name("nope").is_none());
    }

    #[tokio::test]
    async fn flatten_is_preorder_with_efforts_between() {
        let (_, store) = loaded_store().await;
        let program = ProgramId::new("2");
        store
            .save_effort(&program, SoftwareEffort::new("alpha"))
            .await
            .unwrap();

        let names: Vec<String> = store
            .flatten_with_efforts()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Root", "A", "alpha", "B", "C"]);

        let alpha = store
            .flatten_with_efforts()
            .into_iter()
            .find(|e| e.is_effort)
            .unwrap();
        assert_eq!(alpha.parent_program_id, Some(program));
        assert_eq!(alpha.program_name.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn filter_prunes_non_expecting_branches() {
        let (_, store) = loaded_store().await;
        let pruned = store.filter_expecting_subtree();

        // Only the Root -> B -> C path survives; A has no qualifying subtree
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].name, "Root");
        assert_eq!(pruned[0].children.len(), 1);
        assert_eq!(pruned[0].children[0].name, "B");
        assert_eq!(pruned[0].children[0].children[0].name, "C");
    }

    #[tokio::test]
    async fn save_rejects_self_link() {
        let (_, store) = loaded_store().await;
        let mut effort = SoftwareEffort::new("alpha");
        effort.linked_software_efforts.push(effort.uuid);

        let err = store
            .save_effort(&ProgramId::new("2"), effort)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn save_rejects_parent_cycle() {
        let (_, store) = loaded_store().await;
        let program = ProgramId::new("2");
        let a = store
            .save_effort(&program, SoftwareEffort::new("a"))
            .await
            .unwrap();
        let b = store
            .save_effort(&program, SoftwareEffort::new("b").with_parent(a.uuid))
            .await
            .unwrap();

        // Re-parenting a under b closes a -> b -> a
        let mut cyclic = a.clone();
        cyclic.parent_uuid = Some(b.uuid);
        let err = store.save_effort(&program, cyclic).await.unwrap_err();
        assert_eq!(err, StoreError::CyclicParent { uuid: a.uuid });
    }

    #[tokio::test]
    async fn save_against_unknown_program_fails_before_gateway() {
        let (gateway, store) = loaded_store().await;
        let err = store
            .save_effort(&ProgramId::new("99"), SoftwareEffort::new("alpha"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::ProgramNotFound(ProgramId::new("99")));
        assert_eq!(gateway.save_calls(), 0);
    }

    #[tokio::test]
    async fn failed_save_leaves_cache_untouched() {
        let (gateway, store) = loaded_store().await;
        gateway.fail_save();

        let before = store.version();
        let err = store
            .save_effort(&ProgramId::new("2"), SoftwareEffort::new("alpha"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Gateway(_)));
        assert_eq!(store.efforts_for(&ProgramId::new("2")).unwrap().len(), 0);
        assert_eq!(store.version(), before);
    }

    #[tokio::test]
    async fn delete_scrubs_cross_references() {
        let (_, store) = loaded_store().await;
        let program = ProgramId::new("2");
        let a = store
            .save_effort(&program, SoftwareEffort::new("a"))
            .await
            .unwrap();
        let mut b = SoftwareEffort::new("b");
        b.linked_software_efforts.push(a.uuid);
        let b = store.save_effort(&program, b).await.unwrap();

        store.delete_effort(&program, &a.uuid).await.unwrap();

        let efforts = store.efforts_for(&program).unwrap();
        assert_eq!(efforts.len(), 1);
        assert_eq!(efforts[0].uuid, b.uuid);
        assert!(efforts[0].linked_software_efforts.is_empty());
    }

    #[tokio::test]
    async fn version_bumps_on_mutation() {
        let (_, store) = loaded_store().await;
        let mut watcher = store.subscribe();
        watcher.borrow_and_update();

        let before = store.version();
        store
            .save_effort(&ProgramId::new("2"), SoftwareEffort::new("alpha"))
            .await
            .unwrap();
        assert!(store.version() > before);
        assert!(watcher.has_changed().unwrap());
    }

    #[tokio::test]
    async fn reset_clears_and_allows_refetch() {
        let (gateway, store) = loaded_store().await;
        assert!(store.is_loaded());

        store.reset();
        assert!(!store.is_loaded());
        assert!(store.find_by_id(&ProgramId::new("1")).is_none());

        store.fetch_hierarchy().await.unwrap();
        assert!(store.is_loaded());
        assert_eq!(gateway.hierarchy_calls(), 2);
    }

    #[test]
    fn parent_cycle_check_tolerates_dangling_chain() {
        let a = SoftwareEffort::new("a").with_parent(EffortUuid::new());
        assert!(!creates_parent_cycle(&[], &a));
    }
}
