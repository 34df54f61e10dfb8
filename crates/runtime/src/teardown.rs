/// Identifies one registered teardown action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TeardownId(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TeardownKind {
    Timer,
    Listener,
}

struct Entry {
    id: TeardownId,
    kind: TeardownKind,
    label: &'static str,
    action: Box<dyn FnOnce()>,
}

/// Outstanding timers and listeners that must be cancelled on teardown.
///
/// Actions run at most once: either early through [`TeardownRegistry::release`]
/// or in reverse registration order through [`TeardownRegistry::run_all`].
#[derive(Default)]
pub struct TeardownRegistry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl std::fmt::Debug for TeardownRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.id, e.kind, e.label)))
            .finish()
    }
}

impl TeardownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        kind: TeardownKind,
        label: &'static str,
        action: impl FnOnce() + 'static,
    ) -> TeardownId {
        let id = TeardownId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Entry {
            id,
            kind,
            label,
            action: Box::new(action),
        });
        id
    }

    /// Run and forget one action now.
    ///
    /// Returns `false` if it already ran or was never registered.
    pub fn release(&mut self, id: TeardownId) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = self.entries.remove(pos);
        tracing::debug!(label = entry.label, kind = ?entry.kind, "released");
        (entry.action)();
        true
    }

    /// Run every outstanding action, newest first. Returns how many ran.
    pub fn run_all(&mut self) -> usize {
        let entries = std::mem::take(&mut self.entries);
        let count = entries.len();
        for entry in entries.into_iter().rev() {
            tracing::debug!(label = entry.label, kind = ?entry.kind, "teardown");
            (entry.action)();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
