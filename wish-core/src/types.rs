use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// IDs - Opaque string tokens
// ============================================================================

/// Identifier of an AI-side object (a wish or a carrier handle).
///
/// Issued by [`AiRegistry::next_id`](crate::AiRegistry::next_id) and written
/// verbatim into save documents. Ordering is length first, then bytes, so
/// ids sharing a prefix sort numerically (`am9` < `am10`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AiId(String);

impl AiId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for AiId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for AiId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AiId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of an object owned by the game model (colonies, units).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for GameId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Catalog codes and the types they resolve to
// ============================================================================

pub type GoodsTypeCode = u32;
pub type UnitTypeCode = u32;

/// Wish priority. Higher is more urgent.
pub type Priority = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsType {
    pub code: GoodsTypeCode,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitType {
    pub code: UnitTypeCode,
    pub name: String,
    /// Expert units carry a skill that a plain colonist lacks.
    pub expert: bool,
}

/// What a carrier is asked to take on board to fulfil a wish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cargo {
    Goods(GoodsType),
    Unit {
        unit_type: UnitType,
        expert_needed: bool,
    },
}
