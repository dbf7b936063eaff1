// Wishes: standing, prioritized demands for goods or units at a destination.
//
// A wish and a carrier are linked through ids on both sides. Only the
// operations in this module touch either side of the link, and each one
// leaves the link 1:1.

use crate::error::WishError;
use crate::registry::{AiObject, AiRegistry};
use crate::types::{AiId, GameId, GoodsTypeCode, Priority, UnitTypeCode};

/// Variant payload of a wish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishKind {
    /// Deliver goods of this type to the destination.
    Goods { goods_type: GoodsTypeCode },
    /// Bring a unit of this type to the destination. With `expert_needed`
    /// only a unit of exactly that type will do.
    Unit {
        unit_type: UnitTypeCode,
        expert_needed: bool,
    },
}

impl WishKind {
    /// Record tag used in save documents.
    pub fn tag(&self) -> &'static str {
        match self {
            WishKind::Goods { .. } => crate::codec::GOODS_WISH_TAG,
            WishKind::Unit { .. } => crate::codec::UNIT_WISH_TAG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishState {
    Open,
    Assigned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wish {
    pub(crate) id: AiId,
    pub(crate) destination: GameId,
    pub(crate) value: Priority,
    pub(crate) transportable: Option<AiId>,
    pub(crate) kind: WishKind,
}

impl Wish {
    pub fn id(&self) -> &AiId {
        &self.id
    }

    pub fn destination(&self) -> &GameId {
        &self.destination
    }

    pub fn value(&self) -> Priority {
        self.value
    }

    /// The carrier currently assigned to fulfil this wish.
    pub fn transportable(&self) -> Option<&AiId> {
        self.transportable.as_ref()
    }

    pub fn kind(&self) -> &WishKind {
        &self.kind
    }

    pub fn state(&self) -> WishState {
        if self.transportable.is_some() {
            WishState::Assigned
        } else {
            WishState::Open
        }
    }
}

// ============================================================================
// Wish operations
// ============================================================================

impl AiRegistry {
    /// Create and register a wish. Negative priorities are rejected.
    pub fn create_wish(
        &mut self,
        destination: GameId,
        value: i64,
        kind: WishKind,
    ) -> Result<AiId, WishError> {
        let value = Priority::try_from(value).map_err(|_| {
            if value < 0 {
                WishError::InvalidPriority(value)
            } else {
                WishError::MalformedField {
                    field: "value",
                    value: value.to_string(),
                }
            }
        })?;
        let id = self.next_id()?;
        self.register(AiObject::Wish(Wish {
            id: id.clone(),
            destination,
            value,
            transportable: None,
            kind,
        }))?;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "wish_created",
            wish = %id,
            tag = kind.tag(),
            value = value as u64,
        );

        Ok(id)
    }

    pub fn create_goods_wish(
        &mut self,
        destination: GameId,
        value: i64,
        goods_type: GoodsTypeCode,
    ) -> Result<AiId, WishError> {
        self.create_wish(destination, value, WishKind::Goods { goods_type })
    }

    pub fn create_unit_wish(
        &mut self,
        destination: GameId,
        value: i64,
        unit_type: UnitTypeCode,
        expert_needed: bool,
    ) -> Result<AiId, WishError> {
        self.create_wish(
            destination,
            value,
            WishKind::Unit {
                unit_type,
                expert_needed,
            },
        )
    }

    /// Link `carrier` to `wish`, releasing whatever either side held before.
    ///
    /// Assigning a pair that is already linked is a no-op. Both ids are
    /// checked before anything changes, so a failed call leaves no trace.
    pub fn assign(&mut self, wish: &AiId, carrier: &AiId) -> Result<(), WishError> {
        let prior_carrier = self
            .wish(wish)
            .ok_or_else(|| WishError::UnknownWish(wish.clone()))?
            .transportable
            .clone();
        let prior_wish = self
            .carrier(carrier)
            .ok_or_else(|| WishError::UnknownCarrier(carrier.clone()))?
            .assignment
            .clone();

        if prior_carrier.as_ref() == Some(carrier) {
            return Ok(());
        }

        if let Some(c) = prior_carrier.as_ref().and_then(|c| self.carrier_mut(c)) {
            c.assignment = None;
        }
        if let Some(w) = prior_wish.as_ref().and_then(|w| self.wish_mut(w)) {
            w.transportable = None;
        }

        if let Some(w) = self.wish_mut(wish) {
            w.transportable = Some(carrier.clone());
        }
        if let Some(c) = self.carrier_mut(carrier) {
            c.assignment = Some(wish.clone());
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "wish_assigned",
            wish = %wish,
            carrier = %carrier,
            value = self.wish(wish).map_or(0, |w| w.value as u64),
            replaced_carrier = prior_carrier.as_ref().map_or("", |c| c.as_str()),
            replaced_wish = prior_wish.as_ref().map_or("", |w| w.as_str()),
        );

        Ok(())
    }

    /// Clear the wish's carrier and the carrier's back-reference.
    /// Releasing an open wish is a no-op.
    pub fn release(&mut self, wish: &AiId) -> Result<(), WishError> {
        let carrier = self
            .wish_mut(wish)
            .ok_or_else(|| WishError::UnknownWish(wish.clone()))?
            .transportable
            .take();

        if let Some(carrier) = carrier {
            if let Some(c) = self.carrier_mut(&carrier) {
                if c.assignment.as_ref() == Some(wish) {
                    c.assignment = None;
                }
            }

            #[cfg(feature = "instrument")]
            tracing::info!(target: "wish_released", wish = %wish, carrier = %carrier);
        }
        Ok(())
    }

    /// Release the wish and drop it from the registry.
    pub fn destroy(&mut self, wish: &AiId) -> Result<Wish, WishError> {
        self.release(wish)?;
        match self.unregister(wish) {
            Some(AiObject::Wish(w)) => {
                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "wish_destroyed",
                    wish = %wish,
                    destination = %w.destination,
                );
                Ok(w)
            }
            // `release` already proved the id names a wish.
            _ => Err(WishError::UnknownWish(wish.clone())),
        }
    }

    /// Fulfilment: the goods were delivered or the unit arrived.
    pub fn complete(&mut self, wish: &AiId) -> Result<Wish, WishError> {
        let done = self.destroy(wish)?;

        #[cfg(feature = "instrument")]
        tracing::info!(target: "wish_fulfilled", wish = %wish, value = done.value as u64);

        Ok(done)
    }

    /// Drop a carrier handle, reopening the wish it was serving.
    pub fn dispose_carrier(&mut self, carrier: &AiId) -> Result<(), WishError> {
        let assignment = self
            .carrier(carrier)
            .ok_or_else(|| WishError::UnknownCarrier(carrier.clone()))?
            .assignment
            .clone();
        if let Some(wish) = assignment {
            self.release(&wish)?;
        }
        self.unregister(carrier);
        Ok(())
    }

    // === Queries ===

    /// All wishes in ascending id order.
    pub fn wishes(&self) -> Vec<&Wish> {
        let mut wishes: Vec<&Wish> = self
            .objects()
            .filter_map(|obj| match obj {
                AiObject::Wish(w) => Some(w),
                AiObject::Carrier(_) => None,
            })
            .collect();
        wishes.sort_by(|a, b| a.id.cmp(&b.id));
        wishes
    }

    pub fn open_wishes(&self) -> Vec<&Wish> {
        self.wishes()
            .into_iter()
            .filter(|w| w.state() == WishState::Open)
            .collect()
    }

    pub fn wishes_for_destination(&self, destination: &GameId) -> Vec<&Wish> {
        self.wishes()
            .into_iter()
            .filter(|w| w.destination == *destination)
            .collect()
    }

    /// The wish a carrier is serving, if any.
    pub fn wish_for_carrier(&self, carrier: &AiId) -> Option<&AiId> {
        self.carrier(carrier)?.assignment.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOLS: GoodsTypeCode = 14;

    fn setup() -> (AiRegistry, AiId, AiId) {
        let mut registry = AiRegistry::new();
        let wish = registry
            .create_goods_wish(GameId::from("Colony-7"), 80, TOOLS)
            .unwrap();
        let carrier = registry.register_carrier(GameId::from("unit:wagon")).unwrap();
        (registry, wish, carrier)
    }

    fn assert_linked(registry: &AiRegistry, wish: &AiId, carrier: &AiId) {
        assert_eq!(registry.wish(wish).unwrap().transportable(), Some(carrier));
        assert_eq!(registry.wish_for_carrier(carrier), Some(wish));
    }

    #[test]
    fn test_create_rejects_negative_priority() {
        let mut registry = AiRegistry::new();
        let err = registry
            .create_goods_wish(GameId::from("Colony-7"), -1, TOOLS)
            .unwrap_err();
        assert!(matches!(err, WishError::InvalidPriority(-1)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_rejects_priority_past_u32() {
        let mut registry = AiRegistry::new();
        let err = registry
            .create_goods_wish(GameId::from("Colony-7"), 5_000_000_000, TOOLS)
            .unwrap_err();
        assert!(matches!(
            err,
            WishError::MalformedField { field: "value", ref value } if value == "5000000000"
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_registers_open_wish() {
        let (registry, wish, _) = setup();
        let w = registry.wish(&wish).unwrap();
        assert_eq!(w.destination().as_str(), "Colony-7");
        assert_eq!(w.value(), 80);
        assert_eq!(w.kind(), &WishKind::Goods { goods_type: TOOLS });
        assert_eq!(w.state(), WishState::Open);
    }

    #[test]
    fn test_assign_links_both_sides() {
        let (mut registry, wish, carrier) = setup();
        registry.assign(&wish, &carrier).unwrap();
        assert_linked(&registry, &wish, &carrier);
        assert_eq!(registry.wish(&wish).unwrap().state(), WishState::Assigned);
    }

    #[test]
    fn test_assign_is_idempotent() {
        let (mut registry, wish, carrier) = setup();
        registry.assign(&wish, &carrier).unwrap();
        registry.assign(&wish, &carrier).unwrap();
        assert_linked(&registry, &wish, &carrier);
    }

    #[test]
    fn test_assign_replaces_previous_carrier() {
        let (mut registry, wish, first) = setup();
        let second = registry.register_carrier(GameId::from("unit:ship")).unwrap();

        registry.assign(&wish, &first).unwrap();
        registry.assign(&wish, &second).unwrap();

        assert_linked(&registry, &wish, &second);
        assert_eq!(registry.wish_for_carrier(&first), None);
    }

    #[test]
    fn test_reassigning_carrier_releases_previous_wish() {
        let (mut registry, a, carrier) = setup();
        let b = registry
            .create_goods_wish(GameId::from("Colony-8"), 50, TOOLS)
            .unwrap();

        registry.assign(&a, &carrier).unwrap();
        registry.assign(&b, &carrier).unwrap();

        assert_eq!(registry.wish(&a).unwrap().transportable(), None);
        assert_linked(&registry, &b, &carrier);
    }

    #[test]
    fn test_assign_with_unknown_ids_changes_nothing() {
        let (mut registry, wish, carrier) = setup();
        registry.assign(&wish, &carrier).unwrap();

        let err = registry.assign(&wish, &AiId::from("am404")).unwrap_err();
        assert!(matches!(err, WishError::UnknownCarrier(_)));
        let err = registry.assign(&AiId::from("am404"), &carrier).unwrap_err();
        assert!(matches!(err, WishError::UnknownWish(_)));
        // A carrier id in the wish slot is not a wish.
        let err = registry.assign(&carrier, &carrier).unwrap_err();
        assert!(matches!(err, WishError::UnknownWish(_)));

        assert_linked(&registry, &wish, &carrier);
    }

    #[test]
    fn test_release_clears_both_sides_and_is_repeatable() {
        let (mut registry, wish, carrier) = setup();
        registry.assign(&wish, &carrier).unwrap();

        registry.release(&wish).unwrap();
        assert_eq!(registry.wish(&wish).unwrap().state(), WishState::Open);
        assert_eq!(registry.wish_for_carrier(&carrier), None);

        registry.release(&wish).unwrap();
        assert_eq!(registry.wish(&wish).unwrap().state(), WishState::Open);
    }

    #[test]
    fn test_destroy_clears_back_reference() {
        let (mut registry, wish, carrier) = setup();
        registry.assign(&wish, &carrier).unwrap();

        let gone = registry.destroy(&wish).unwrap();
        assert_eq!(gone.id(), &wish);
        assert!(registry.wish(&wish).is_none());
        assert_eq!(registry.wish_for_carrier(&carrier), None);
        assert!(matches!(
            registry.destroy(&wish),
            Err(WishError::UnknownWish(_))
        ));
    }

    #[test]
    fn test_dispose_carrier_reopens_wish() {
        let (mut registry, wish, carrier) = setup();
        registry.assign(&wish, &carrier).unwrap();

        registry.dispose_carrier(&carrier).unwrap();
        assert!(registry.carrier(&carrier).is_none());
        assert_eq!(registry.wish(&wish).unwrap().state(), WishState::Open);
    }

    #[test]
    fn test_queries() {
        let (mut registry, a, carrier) = setup();
        let b = registry
            .create_unit_wish(GameId::from("Colony-7"), 30, 3, true)
            .unwrap();
        let c = registry
            .create_goods_wish(GameId::from("Colony-9"), 10, TOOLS)
            .unwrap();
        registry.assign(&b, &carrier).unwrap();

        let all: Vec<&AiId> = registry.wishes().into_iter().map(Wish::id).collect();
        assert_eq!(all, [&a, &b, &c]);

        let open: Vec<&AiId> = registry.open_wishes().into_iter().map(Wish::id).collect();
        assert_eq!(open, [&a, &c]);

        let at_seven: Vec<&AiId> = registry
            .wishes_for_destination(&GameId::from("Colony-7"))
            .into_iter()
            .map(Wish::id)
            .collect();
        assert_eq!(at_seven, [&a, &b]);
    }
}
