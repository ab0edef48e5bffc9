//! Program selection
//!
//! Tracks which program the user is working in, survives the gap between
//! "a program was picked" and "the hierarchy finished loading", and keeps
//! an external location (browser query string or equivalent) in sync
//! through the [`LocationPort`] seam.

use crate::store::HierarchyStore;
use catalog_model::{ProgramId, ProgramNode};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

const SELECTED_KEY: &str = "selected";

/// Outbound half of location sync
///
/// Implementations push the selected program id into whatever addressable
/// surface hosts the catalog. Inbound sync goes through
/// [`SelectionState::apply_location`].
pub trait LocationPort: Send + Sync {
    fn set_selected(&self, id: Option<&ProgramId>);
}

/// What the caller knows about the program being selected
///
/// A bare id is enough once the tree is loaded; a partial node carries the
/// data the caller already holds so [`SelectionState::current`] can answer
/// before the canonical node exists.
#[derive(Debug, Clone)]
pub enum SelectionRef {
    Id(ProgramId),
    Partial(ProgramNode),
}

impl From<ProgramId> for SelectionRef {
    fn from(id: ProgramId) -> Self {
        Self::Id(id)
    }
}

impl From<ProgramNode> for SelectionRef {
    fn from(node: ProgramNode) -> Self {
        Self::Partial(node)
    }
}

#[derive(Debug, Clone)]
struct Selected {
    id: ProgramId,
    fallback: Option<ProgramNode>,
}

/// Current program selection
pub struct SelectionState {
    inner: Mutex<Option<Selected>>,
    tx: watch::Sender<Option<ProgramId>>,
    location: Option<Arc<dyn LocationPort>>,
}

impl std::fmt::Debug for SelectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionState")
            .field("selected", &self.inner.lock().as_ref().map(|s| s.id.clone()))
            .finish()
    }
}

impl SelectionState {
    /// Create a detached selection (no location sync)
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            inner: Mutex::new(None),
            tx,
            location: None,
        }
    }

    /// Create a selection that mirrors into the given location
    #[must_use]
    pub fn with_location(location: Arc<dyn LocationPort>) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            inner: Mutex::new(None),
            tx,
            location: Some(location),
        }
    }

    /// Select a program
    ///
    /// A [`SelectionRef::Partial`] node is kept as a fallback answer until
    /// the store can resolve the id canonically.
    pub fn select(&self, selection: impl Into<SelectionRef>) {
        let (id, fallback) = match selection.into() {
            SelectionRef::Id(id) => (id, None),
            SelectionRef::Partial(node) => (node.id.clone(), Some(node)),
        };
        tracing::debug!(program = %id, "program selected");
        *self.inner.lock() = Some(Selected {
            id: id.clone(),
            fallback,
        });
        self.tx.send_replace(Some(id.clone()));
        if let Some(location) = &self.location {
            location.set_selected(Some(&id));
        }
    }

    /// Clear the selection
    pub fn deselect(&self) {
        *self.inner.lock() = None;
        self.tx.send_replace(None);
        if let Some(location) = &self.location {
            location.set_selected(None);
        }
    }

    /// The selected program's id, if any
    #[must_use]
    pub fn selected_id(&self) -> Option<ProgramId> {
        self.inner.lock().as_ref().map(|s| s.id.clone())
    }

    /// The selected program, resolved against the store
    ///
    /// Prefers the store's canonical node; falls back to the partial node
    /// captured at selection time when the tree does not (yet) know the
    /// id. `None` when nothing is selected.
    #[must_use]
    pub fn current(&self, store: &HierarchyStore) -> Option<ProgramNode> {
        let selected = self.inner.lock().clone()?;
        store
            .find_by_id(&selected.id)
            .or(selected.fallback)
    }

    /// Ingest a selection carried by a location query string
    ///
    /// Does not push back into the location port, so a round trip from
    /// the location cannot oscillate.
    pub fn apply_location(&self, query: &str) {
        match selected_from_query(query) {
            Some(id) => {
                tracing::debug!(program = %id, "selection restored from location");
                *self.inner.lock() = Some(Selected {
                    id: id.clone(),
                    fallback: None,
                });
                self.tx.send_replace(Some(id));
            }
            None => {
                *self.inner.lock() = None;
                self.tx.send_replace(None);
            }
        }
    }

    /// Observe selection changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<ProgramId>> {
        self.tx.subscribe()
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the selected program id from a query string
#[must_use]
pub fn selected_from_query(query: &str) -> Option<ProgramId> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == SELECTED_KEY && !value.is_empty() {
            Some(ProgramId::new(value))
        } else {
            None
        }
    })
}

/// Rewrite a query string's selection, preserving unrelated pairs
#[must_use]
pub fn query_with_selected(query: &str, selected: Option<&ProgramId>) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some(SELECTED_KEY))
        .map(str::to_owned)
        .collect();
    if let Some(id) = selected {
        pairs.push(format!("{SELECTED_KEY}={id}"));
    }
    pairs.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct RecordingLocation {
        pushes: PlMutex<Vec<Option<ProgramId>>>,
    }

    impl LocationPort for RecordingLocation {
        fn set_selected(&self, id: Option<&ProgramId>) {
            self.pushes.lock().push(id.cloned());
        }
    }

    #[test]
    fn select_pushes_to_location() {
        let location = Arc::new(RecordingLocation::default());
        let selection = SelectionState::with_location(location.clone());

        selection.select(ProgramId::new("3"));
        selection.deselect();

        let pushes = location.pushes.lock();
        assert_eq!(*pushes, vec![Some(ProgramId::new("3")), None]);
    }

    #[test]
    fn apply_location_does_not_echo() {
        let location = Arc::new(RecordingLocation::default());
        let selection = SelectionState::with_location(location.clone());

        selection.apply_location("selected=7&tab=overview");
        assert_eq!(selection.selected_id(), Some(ProgramId::new("7")));
        assert!(location.pushes.lock().is_empty());
    }

    #[test]
    fn subscribe_sees_changes() {
        let selection = SelectionState::new();
        let mut rx = selection.subscribe();

        selection.select(ProgramId::new("5"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(ProgramId::new("5")));
    }

    #[test]
    fn query_parsing_handles_prefix_and_empties() {
        assert_eq!(selected_from_query("?selected=12"), Some(ProgramId::new("12")));
        assert_eq!(selected_from_query("tab=overview"), None);
        assert_eq!(selected_from_query("selected="), None);
        assert_eq!(selected_from_query(""), None);
    }

    #[test]
    fn query_rewrite_preserves_other_pairs() {
        let id = ProgramId::new("9");
        assert_eq!(
            query_with_selected("?tab=overview&selected=2", Some(&id)),
            "tab=overview&selected=9"
        );
        assert_eq!(query_with_selected("tab=overview&selected=2", None), "tab=overview");
        assert_eq!(query_with_selected("", Some(&id)), "selected=9");
    }
}
