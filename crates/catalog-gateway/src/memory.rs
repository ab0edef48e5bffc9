//! In-memory gateway for mock mode and tests
//!
//! Serves seeded fixtures with the same contract as the HTTP backend, plus
//! the affordances the store's test suite needs: per-operation call
//! counters, per-operation failure injection, and a gate that holds
//! `fetch_hierarchy` open so concurrent callers can be observed.

use crate::error::{GatewayError, GatewayResult};
use crate::user::CurrentUser;
use crate::CatalogGateway;
use async_trait::async_trait;
use catalog_model::{EffortUuid, ProgramId, ProgramNode, SoftwareEffort};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// Releases a gated `fetch_hierarchy`
///
/// Returned by [`InMemoryGateway::gate_hierarchy`]. Calls block until
/// [`HierarchyGate::release`] runs; dropping the gate unreleased also
/// unblocks them.
#[derive(Debug)]
pub struct HierarchyGate {
    tx: watch::Sender<bool>,
}

impl HierarchyGate {
    /// Let gated hierarchy fetches proceed
    pub fn release(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Debug)]
struct MemoryState {
    programs: Vec<ProgramNode>,
    efforts: HashMap<ProgramId, Vec<SoftwareEffort>>,
    user: CurrentUser,
    next_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            programs: Vec::new(),
            efforts: HashMap::new(),
            user: CurrentUser::new("mock-user"),
            next_id: 1,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    hierarchy: bool,
    save: bool,
    delete: bool,
    efforts_for: HashSet<ProgramId>,
}

/// Fixture-backed [`CatalogGateway`]
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
    faults: Mutex<Faults>,
    gate: Mutex<Option<watch::Receiver<bool>>>,
    hierarchy_calls: AtomicUsize,
    effort_calls: AtomicUsize,
    save_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryGateway {
    /// Empty gateway
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a seeded program forest
    #[must_use]
    pub fn with_programs(self, programs: Vec<ProgramNode>) -> Self {
        self.state.lock().programs = programs;
        self
    }

    /// With seeded efforts for one program
    #[must_use]
    pub fn with_efforts(self, program: ProgramId, efforts: Vec<SoftwareEffort>) -> Self {
        self.state.lock().efforts.insert(program, efforts);
        self
    }

    /// With a seeded current user
    #[must_use]
    pub fn with_user(self, user: CurrentUser) -> Self {
        self.state.lock().user = user;
        self
    }

    /// Number of hierarchy fetches issued so far
    #[inline]
    #[must_use]
    pub fn hierarchy_calls(&self) -> usize {
        self.hierarchy_calls.load(Ordering::SeqCst)
    }

    /// Number of per-program effort fetches issued so far
    #[inline]
    #[must_use]
    pub fn effort_calls(&self) -> usize {
        self.effort_calls.load(Ordering::SeqCst)
    }

    /// Number of save calls issued so far
    #[inline]
    #[must_use]
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Number of delete calls issued so far
    #[inline]
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Make every hierarchy fetch fail until faults are cleared
    pub fn fail_hierarchy(&self) {
        self.faults.lock().hierarchy = true;
    }

    /// Make effort fetches for one program fail until faults are cleared
    pub fn fail_efforts_for(&self, program: &ProgramId) {
        self.faults.lock().efforts_for.insert(program.clone());
    }

    /// Make every save call fail until faults are cleared
    pub fn fail_save(&self) {
        self.faults.lock().save = true;
    }

    /// Make every delete call fail until faults are cleared
    pub fn fail_delete(&self) {
        self.faults.lock().delete = true;
    }

    /// Clear all injected faults
    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }

    /// Hold subsequent hierarchy fetches open until the gate is released
    #[must_use]
    pub fn gate_hierarchy(&self) -> HierarchyGate {
        let (tx, rx) = watch::channel(false);
        *self.gate.lock() = Some(rx);
        HierarchyGate { tx }
    }

    fn tree_contains(programs: &[ProgramNode], id: &ProgramId) -> bool {
        let mut stack: Vec<&ProgramNode> = programs.iter().collect();
        while let Some(node) = stack.pop() {
            if &node.id == id {
                return true;
            }
            stack.extend(node.children.iter());
        }
        false
    }
}

#[async_trait]
impl CatalogGateway for InMemoryGateway {
    async fn fetch_hierarchy(&self) -> GatewayResult<Vec<ProgramNode>> {
        self.hierarchy_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().clone();
        if let Some(mut rx) = gate {
            while !*rx.borrow() {
                // A dropped gate counts as released
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }

        if self.faults.lock().hierarchy {
            return Err(GatewayError::Unavailable(
                "injected hierarchy failure".to_string(),
            ));
        }
        Ok(self.state.lock().programs.clone())
    }

    async fn fetch_efforts(&self, program: &ProgramId) -> GatewayResult<Vec<SoftwareEffort>> {
        self.effort_calls.fetch_add(1, Ordering::SeqCst);

        if self.faults.lock().efforts_for.contains(program) {
            return Err(GatewayError::Unavailable(format!(
                "injected effort failure for program {program}"
            )));
        }

        let state = self.state.lock();
        if let Some(efforts) = state.efforts.get(program) {
            return Ok(efforts.clone());
        }
        if Self::tree_contains(&state.programs, program) {
            return Ok(Vec::new());
        }
        Err(GatewayError::ProgramNotFound(program.clone()))
    }

    async fn save_effort(
        &self,
        program: &ProgramId,
        effort: &SoftwareEffort,
    ) -> GatewayResult<SoftwareEffort> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        if self.faults.lock().save {
            return Err(GatewayError::Unavailable("injected save failure".to_string()));
        }

        let mut state = self.state.lock();
        if !Self::tree_contains(&state.programs, program) && !state.efforts.contains_key(program) {
            return Err(GatewayError::ProgramNotFound(program.clone()));
        }

        let mut stored = effort.clone();
        if stored.id.is_none() {
            stored.id = Some(state.next_id);
            state.next_id += 1;
        }

        let efforts = state.efforts.entry(program.clone()).or_default();
        match efforts.iter_mut().find(|e| e.uuid == stored.uuid) {
            Some(existing) => {
                // Server-assigned id survives the update
                stored.id = existing.id.or(stored.id);
                *existing = stored.clone();
            }
            None => efforts.push(stored.clone()),
        }
        Ok(stored)
    }

    async fn delete_effort(&self, uuid: &EffortUuid) -> GatewayResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.faults.lock().delete {
            return Err(GatewayError::Unavailable(
                "injected delete failure".to_string(),
            ));
        }

        let mut state = self.state.lock();
        for efforts in state.efforts.values_mut() {
            if let Some(index) = efforts.iter().position(|e| &e.uuid == uuid) {
                efforts.remove(index);
                return Ok(());
            }
        }
        Err(GatewayError::EffortNotFound(*uuid))
    }

    async fn current_user(&self) -> GatewayResult<CurrentUser> {
        Ok(self.state.lock().user.clone())
    }
}
