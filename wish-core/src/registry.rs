use std::collections::HashMap;

use slotmap::{SlotMap, new_key_type};

use crate::error::WishError;
use crate::types::{AiId, GameId};
use crate::wish::Wish;

/// Prefix of ids issued by a default registry.
pub const DEFAULT_ID_PREFIX: &str = "am";

new_key_type! {
    struct ObjectKey;
}

// ============================================================================
// Registry entries
// ============================================================================

/// AI-side handle for a transportable unit owned by the game model.
///
/// The handle holds the unit's half of the wish link: `assignment` names the
/// wish this carrier is currently fulfilling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    pub(crate) id: AiId,
    pub(crate) unit: GameId,
    pub(crate) assignment: Option<AiId>,
}

impl Carrier {
    pub fn new(id: AiId, unit: GameId) -> Self {
        Self {
            id,
            unit,
            assignment: None,
        }
    }

    pub fn id(&self) -> &AiId {
        &self.id
    }

    /// The game-model unit this handle stands for.
    pub fn unit(&self) -> &GameId {
        &self.unit
    }

    pub fn assignment(&self) -> Option<&AiId> {
        self.assignment.as_ref()
    }
}

#[derive(Debug, Clone)]
pub enum AiObject {
    Wish(Wish),
    Carrier(Carrier),
}

impl AiObject {
    pub fn id(&self) -> &AiId {
        match self {
            AiObject::Wish(w) => w.id(),
            AiObject::Carrier(c) => c.id(),
        }
    }
}

// ============================================================================
// AiRegistry - identifier allocation and lookup
// ============================================================================

/// Arena of live AI objects keyed by identifier.
///
/// Every planner operation takes the registry explicitly; there is no
/// process-wide instance, so tests can run as many as they like.
#[derive(Debug, Clone)]
pub struct AiRegistry {
    prefix: String,
    next_id: u64,
    objects: SlotMap<ObjectKey, AiObject>,
    index: HashMap<AiId, ObjectKey>,
}

impl Default for AiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AiRegistry {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ID_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_id: 1,
            objects: SlotMap::with_key(),
            index: HashMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Issue a fresh identifier. Never returns a token issued before by this
    /// registry, nor one currently bound to a live object.
    ///
    /// Fails once the counter reaches `u64::MAX`, which only a save game can
    /// arrange.
    pub fn next_id(&mut self) -> Result<AiId, WishError> {
        loop {
            let n = self.next_id;
            self.next_id = n
                .checked_add(1)
                .ok_or_else(|| WishError::IdsExhausted(self.prefix.clone()))?;
            let id = AiId::new(format!("{}{}", self.prefix, n));
            if !self.index.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    /// Counter value the next call to [`next_id`](Self::next_id) starts from.
    pub fn next_counter(&self) -> u64 {
        self.next_id
    }

    /// Restore a persisted counter. The counter only moves forward.
    pub fn restore_counter(&mut self, counter: u64) {
        self.next_id = self.next_id.max(counter);
    }

    /// Move the counter past `id` if it was issued under this prefix.
    pub fn bump_past(&mut self, id: &AiId) {
        let issued = id
            .as_str()
            .strip_prefix(self.prefix.as_str())
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(n) = issued {
            self.next_id = self.next_id.max(n.saturating_add(1));
        }
    }

    /// Bind an object under its own identifier.
    pub fn register(&mut self, object: AiObject) -> Result<(), WishError> {
        let id = object.id().clone();
        if self.index.contains_key(&id) {
            return Err(WishError::DuplicateIdentifier(id));
        }
        let key = self.objects.insert(object);
        self.index.insert(id, key);
        Ok(())
    }

    pub fn lookup(&self, id: &AiId) -> Option<&AiObject> {
        self.index.get(id).and_then(|key| self.objects.get(*key))
    }

    pub(crate) fn lookup_mut(&mut self, id: &AiId) -> Option<&mut AiObject> {
        let key = *self.index.get(id)?;
        self.objects.get_mut(key)
    }

    /// Remove the binding for `id`, returning the object if one was bound.
    ///
    /// A linked object is detached first: its partner's half of the link is
    /// cleared, and so is its own.
    pub fn unregister(&mut self, id: &AiId) -> Option<AiObject> {
        let key = self.index.remove(id)?;
        let mut object = self.objects.remove(key)?;
        match &mut object {
            AiObject::Wish(w) => {
                if let Some(c) = w.transportable.take().and_then(|c| self.carrier_mut(&c)) {
                    if c.assignment.as_ref() == Some(id) {
                        c.assignment = None;
                    }
                }
            }
            AiObject::Carrier(c) => {
                if let Some(w) = c.assignment.take().and_then(|w| self.wish_mut(&w)) {
                    if w.transportable.as_ref() == Some(id) {
                        w.transportable = None;
                    }
                }
            }
        }
        Some(object)
    }

    pub fn contains(&self, id: &AiId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All live identifiers in ascending order.
    pub fn ids(&self) -> Vec<AiId> {
        let mut ids: Vec<AiId> = self.index.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) fn objects(&self) -> impl Iterator<Item = &AiObject> {
        self.objects.values()
    }

    pub fn wish(&self, id: &AiId) -> Option<&Wish> {
        match self.lookup(id)? {
            AiObject::Wish(w) => Some(w),
            AiObject::Carrier(_) => None,
        }
    }

    pub(crate) fn wish_mut(&mut self, id: &AiId) -> Option<&mut Wish> {
        match self.lookup_mut(id)? {
            AiObject::Wish(w) => Some(w),
            AiObject::Carrier(_) => None,
        }
    }

    pub fn carrier(&self, id: &AiId) -> Option<&Carrier> {
        match self.lookup(id)? {
            AiObject::Carrier(c) => Some(c),
            AiObject::Wish(_) => None,
        }
    }

    pub(crate) fn carrier_mut(&mut self, id: &AiId) -> Option<&mut Carrier> {
        match self.lookup_mut(id)? {
            AiObject::Carrier(c) => Some(c),
            AiObject::Wish(_) => None,
        }
    }

    // === Carrier Management ===

    /// Register an AI handle for a game-model unit, returning its id.
    pub fn register_carrier(&mut self, unit: GameId) -> Result<AiId, WishError> {
        let id = self.next_id()?;
        self.register(AiObject::Carrier(Carrier::new(id.clone(), unit)))?;
        Ok(id)
    }

    /// Find the handle registered for a game-model unit.
    pub fn carrier_for_unit(&self, unit: &GameId) -> Option<&AiId> {
        self.objects.values().find_map(|obj| match obj {
            AiObject::Carrier(c) if c.unit == *unit => Some(&c.id),
            _ => None,
        })
    }

    /// All carrier handles in ascending id order.
    pub fn carriers(&self) -> Vec<&Carrier> {
        let mut carriers: Vec<&Carrier> = self
            .objects
            .values()
            .filter_map(|obj| match obj {
                AiObject::Carrier(c) => Some(c),
                AiObject::Wish(_) => None,
            })
            .collect();
        carriers.sort_by(|a, b| a.id.cmp(&b.id));
        carriers
    }
}
