// Collaborator interfaces owned by the game model.
//
// The planner never owns colonies or units. It reaches them through these
// traits by `GameId` and only reads what they report.

use crate::types::{Cargo, GameId, GoodsType, GoodsTypeCode, UnitType, UnitTypeCode};

/// A place a wish can be delivered to.
pub trait Location {
    fn id(&self) -> &GameId;
}

/// Something that can be carried and can itself carry cargo or passengers.
pub trait Transportable {
    fn can_carry_goods(&self) -> bool;

    fn can_carry_units(&self) -> bool;

    /// Whether `cargo` fits right now. May change between calls when the
    /// game model mutates the carrier.
    fn can_add(&self, cargo: &Cargo) -> bool;

    fn current_location(&self) -> Option<&GameId>;
}

/// Lookup into the game-object namespace.
pub trait GameObjects {
    type Location: Location;
    type Carrier: Transportable;

    fn resolve_location(&self, id: &GameId) -> Option<&Self::Location>;

    fn transportable(&self, id: &GameId) -> Option<&Self::Carrier>;
}

/// Resolves opaque catalog codes to goods and unit types.
pub trait TypeCatalog {
    fn goods_type(&self, code: GoodsTypeCode) -> Option<&GoodsType>;

    fn unit_type(&self, code: UnitTypeCode) -> Option<&UnitType>;
}
