//! Symbolic jump targets.
//!
//! A [`Label`] names a position of the extended node sequence before that position is
//! known. Every label is bound exactly once; jumps may refer to it before or after it is
//! bound.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use rustc_hash::FxHashMap;

use crate::Result;

/// Process-wide source of unique ids for labels and synthetic variable names.
static UNIQUE_ID: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh id; no two calls in one process return the same value.
pub(crate) fn unique_id() -> u64 {
    UNIQUE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Returns `{prefix}#num{n}` with a fresh `n`.
pub(crate) fn unique_name(prefix: &str) -> Arc<str> {
    Arc::from(format!("{prefix}#num{}", unique_id()))
}

/// A symbolic target in the extended node sequence.
///
/// Two labels are equal only if they were created by the same call, even if their names
/// coincide.
#[derive(Debug, Clone)]
pub struct Label {
    id: u64,
    name: Arc<str>,
}

impl Label {
    /// Creates a label with a generated name of the form `%L{n}`.
    #[must_use]
    pub fn new() -> Self {
        let id = unique_id();
        Label {
            id,
            name: Arc::from(format!("%L{id}")),
        }
    }

    /// Creates a label for a source statement label.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Label {
            id: unique_id(),
            name: Arc::from(name),
        }
    }

    /// The label's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A holder for a label that is created on first use.
///
/// The cell remembers whether its label was ever used as a jump target, which decides
/// whether a copy of a finally block is needed for that path.
#[derive(Debug, Clone, Default)]
pub enum LabelCell {
    /// No label was created yet.
    #[default]
    Vacant,
    /// A label exists but no jump uses it.
    Idle(Label),
    /// A label exists and at least one jump uses it.
    Accessed(Label),
}

impl LabelCell {
    /// Creates an empty cell.
    #[must_use]
    pub const fn vacant() -> Self {
        LabelCell::Vacant
    }

    /// Creates a cell holding `label`, not yet accessed.
    #[must_use]
    pub const fn with(label: Label) -> Self {
        LabelCell::Idle(label)
    }

    /// Returns the label, creating it if necessary, and marks the cell as accessed.
    pub fn access(&mut self) -> Label {
        let label = match std::mem::take(self) {
            LabelCell::Vacant => Label::new(),
            LabelCell::Idle(label) | LabelCell::Accessed(label) => label,
        };
        *self = LabelCell::Accessed(label.clone());
        label
    }

    /// Returns the label without marking the cell as accessed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Internal`] if the cell is vacant.
    pub fn peek(&self) -> Result<Label> {
        match self {
            LabelCell::Vacant => Err(internal_error!("peek at a vacant label cell")),
            LabelCell::Idle(label) | LabelCell::Accessed(label) => Ok(label.clone()),
        }
    }

    /// Returns `true` if [`LabelCell::access`] was called on this cell.
    #[must_use]
    pub const fn was_accessed(&self) -> bool {
        matches!(self, LabelCell::Accessed(_))
    }
}

/// Maps source statement labels to the labels a `break` or `continue` jumps to.
///
/// Inside the protected region of a try statement with a finally block, the map is a
/// *finally-region map*: a name that is not defined inside the region resolves to a fresh
/// escape label instead, which is then recorded in first-use order. After the region, a
/// copy of the finally block is emitted at each escape label that jumps on to the outer
/// resolution of the name.
#[derive(Debug, Clone, Default)]
pub struct ScopeMap {
    labels: FxHashMap<Arc<str>, Label>,
    escapes: Option<Vec<(Arc<str>, Label)>>,
}

impl ScopeMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty finally-region map.
    #[must_use]
    pub fn finally_region() -> Self {
        ScopeMap {
            labels: FxHashMap::default(),
            escapes: Some(Vec::new()),
        }
    }

    /// Defines `name` as referring to `label`.
    pub fn define(&mut self, name: Arc<str>, label: Label) {
        self.labels.insert(name, label);
    }

    /// Removes the definition of `name`.
    pub fn undefine(&mut self, name: &str) {
        self.labels.remove(name);
    }

    /// Resolves a statement label.
    ///
    /// Returns `None` if the name is unknown and this is not a finally-region map.
    pub fn resolve(&mut self, name: &str) -> Option<Label> {
        if let Some(label) = self.labels.get(name) {
            return Some(label.clone());
        }

        let escapes = self.escapes.as_mut()?;
        if let Some((_, label)) = escapes.iter().find(|(escaped, _)| &**escaped == name) {
            return Some(label.clone());
        }

        let label = Label::new();
        escapes.push((Arc::from(name), label.clone()));
        Some(label)
    }

    /// Escapes recorded by a finally-region map, in first-use order.
    #[must_use]
    pub fn escapes(&self) -> &[(Arc<str>, Label)] {
        self.escapes.as_deref().unwrap_or_default()
    }
}
