// Reference game model: colonies, carrier units and the type catalog.
//
// The planner only sees this through the traits in `external`. It backs the
// JS facade and the tests; a full game supplies its own implementation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::external::{GameObjects, Location, Transportable, TypeCatalog};
use crate::types::{Cargo, GameId, GoodsType, GoodsTypeCode, UnitType, UnitTypeCode};

// ============================================================================
// Colony - A delivery destination
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colony {
    pub id: GameId,
    pub name: String,
}

impl Location for Colony {
    fn id(&self) -> &GameId {
        &self.id
    }
}

// ============================================================================
// CarrierUnit - A transport asset
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierUnit {
    pub id: GameId,
    pub name: String,
    pub location: Option<GameId>, // None while at sea / between tiles
    pub carries_goods: bool,
    pub carries_units: bool,
    pub holds: u32,           // Goods slots
    pub passenger_slots: u32, // Unit slots
    pub cargo: Vec<GoodsTypeCode>,
    pub passengers: Vec<UnitTypeCode>,
}

impl CarrierUnit {
    /// Overland goods carrier.
    pub fn wagon_train(id: impl Into<GameId>, at: impl Into<GameId>) -> Self {
        Self {
            id: id.into(),
            name: "Wagon Train".to_string(),
            location: Some(at.into()),
            carries_goods: true,
            carries_units: false,
            holds: 2,
            passenger_slots: 0,
            cargo: Vec::new(),
            passengers: Vec::new(),
        }
    }

    pub fn caravel(id: impl Into<GameId>, at: impl Into<GameId>) -> Self {
        Self {
            id: id.into(),
            name: "Caravel".to_string(),
            location: Some(at.into()),
            carries_goods: true,
            carries_units: true,
            holds: 2,
            passenger_slots: 2,
            cargo: Vec::new(),
            passengers: Vec::new(),
        }
    }

    pub fn galleon(id: impl Into<GameId>, at: impl Into<GameId>) -> Self {
        Self {
            id: id.into(),
            name: "Galleon".to_string(),
            location: Some(at.into()),
            carries_goods: true,
            carries_units: true,
            holds: 6,
            passenger_slots: 6,
            cargo: Vec::new(),
            passengers: Vec::new(),
        }
    }

    pub fn free_holds(&self) -> u32 {
        self.holds.saturating_sub(self.cargo.len() as u32)
    }

    pub fn free_passenger_slots(&self) -> u32 {
        self.passenger_slots
            .saturating_sub(self.passengers.len() as u32)
    }
}

impl Transportable for CarrierUnit {
    fn can_carry_goods(&self) -> bool {
        self.carries_goods
    }

    fn can_carry_units(&self) -> bool {
        self.carries_units
    }

    /// Goods need a free hold. A unit wish for an expert type, or one with
    /// `expert_needed`, needs a passenger of exactly that type already
    /// aboard. Any other unit wish is met by a matching passenger or by a
    /// free slot to pick one up.
    fn can_add(&self, cargo: &Cargo) -> bool {
        match cargo {
            Cargo::Goods(_) => self.carries_goods && self.free_holds() > 0,
            Cargo::Unit {
                unit_type,
                expert_needed,
            } => {
                if !self.carries_units {
                    return false;
                }
                let aboard = self.passengers.contains(&unit_type.code);
                if *expert_needed || unit_type.expert {
                    aboard
                } else {
                    aboard || self.free_passenger_slots() > 0
                }
            }
        }
    }

    fn current_location(&self) -> Option<&GameId> {
        self.location.as_ref()
    }
}

// ============================================================================
// Catalog - goods and unit types by code
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub goods: BTreeMap<GoodsTypeCode, GoodsType>,
    pub units: BTreeMap<UnitTypeCode, UnitType>,
}

pub mod goods {
    use crate::types::GoodsTypeCode;

    pub const FOOD: GoodsTypeCode = 0;
    pub const SUGAR: GoodsTypeCode = 1;
    pub const TOBACCO: GoodsTypeCode = 2;
    pub const COTTON: GoodsTypeCode = 3;
    pub const FURS: GoodsTypeCode = 4;
    pub const LUMBER: GoodsTypeCode = 5;
    pub const ORE: GoodsTypeCode = 6;
    pub const SILVER: GoodsTypeCode = 7;
    pub const HORSES: GoodsTypeCode = 8;
    pub const RUM: GoodsTypeCode = 9;
    pub const CIGARS: GoodsTypeCode = 10;
    pub const CLOTH: GoodsTypeCode = 11;
    pub const COATS: GoodsTypeCode = 12;
    pub const TRADE_GOODS: GoodsTypeCode = 13;
    pub const TOOLS: GoodsTypeCode = 14;
    pub const MUSKETS: GoodsTypeCode = 15;
}

pub mod units {
    use crate::types::UnitTypeCode;

    pub const FREE_COLONIST: UnitTypeCode = 0;
    pub const INDENTURED_SERVANT: UnitTypeCode = 1;
    pub const EXPERT_FARMER: UnitTypeCode = 2;
    pub const EXPERT_ORE_MINER: UnitTypeCode = 3;
    pub const MASTER_BLACKSMITH: UnitTypeCode = 4;
    pub const ELDER_STATESMAN: UnitTypeCode = 5;
}

impl Catalog {
    /// The stock goods and unit types.
    pub fn standard() -> Self {
        let goods = [
            (goods::FOOD, "Food"),
            (goods::SUGAR, "Sugar"),
            (goods::TOBACCO, "Tobacco"),
            (goods::COTTON, "Cotton"),
            (goods::FURS, "Furs"),
            (goods::LUMBER, "Lumber"),
            (goods::ORE, "Ore"),
            (goods::SILVER, "Silver"),
            (goods::HORSES, "Horses"),
            (goods::RUM, "Rum"),
            (goods::CIGARS, "Cigars"),
            (goods::CLOTH, "Cloth"),
            (goods::COATS, "Coats"),
            (goods::TRADE_GOODS, "Trade Goods"),
            (goods::TOOLS, "Tools"),
            (goods::MUSKETS, "Muskets"),
        ];
        let units = [
            (units::FREE_COLONIST, "Free Colonist", false),
            (units::INDENTURED_SERVANT, "Indentured Servant", false),
            (units::EXPERT_FARMER, "Expert Farmer", true),
            (units::EXPERT_ORE_MINER, "Expert Ore Miner", true),
            (units::MASTER_BLACKSMITH, "Master Blacksmith", true),
            (units::ELDER_STATESMAN, "Elder Statesman", true),
        ];

        Self {
            goods: goods
                .into_iter()
                .map(|(code, name)| {
                    (
                        code,
                        GoodsType {
                            code,
                            name: name.to_string(),
                        },
                    )
                })
                .collect(),
            units: units
                .into_iter()
                .map(|(code, name, expert)| {
                    (
                        code,
                        UnitType {
                            code,
                            name: name.to_string(),
                            expert,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl TypeCatalog for Catalog {
    fn goods_type(&self, code: GoodsTypeCode) -> Option<&GoodsType> {
        self.goods.get(&code)
    }

    fn unit_type(&self, code: UnitTypeCode) -> Option<&UnitType> {
        self.units.get(&code)
    }
}

// ============================================================================
// World - colonies and carriers by id
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct World {
    pub colonies: BTreeMap<GameId, Colony>,
    pub carriers: BTreeMap<GameId, CarrierUnit>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // === Colony Management ===

    pub fn add_colony(&mut self, id: impl Into<GameId>, name: impl Into<String>) -> GameId {
        let id = id.into();
        self.colonies.insert(
            id.clone(),
            Colony {
                id: id.clone(),
                name: name.into(),
            },
        );
        id
    }

    /// Remove a colony. Wishes that target it stop resolving.
    pub fn remove_colony(&mut self, id: &GameId) -> Option<Colony> {
        self.colonies.remove(id)
    }

    // === Carrier Management ===

    pub fn add_carrier(&mut self, unit: CarrierUnit) -> GameId {
        let id = unit.id.clone();
        self.carriers.insert(id.clone(), unit);
        id
    }

    pub fn get_carrier_mut(&mut self, id: &GameId) -> Option<&mut CarrierUnit> {
        self.carriers.get_mut(id)
    }

    pub fn remove_carrier(&mut self, id: &GameId) -> Option<CarrierUnit> {
        self.carriers.remove(id)
    }

    /// Load one hold of goods. Returns false if the carrier is missing or full.
    pub fn load_goods(&mut self, carrier: &GameId, goods: GoodsTypeCode) -> bool {
        match self.carriers.get_mut(carrier) {
            Some(unit) if unit.carries_goods && unit.free_holds() > 0 => {
                unit.cargo.push(goods);
                true
            }
            _ => false,
        }
    }

    /// Board one unit. Returns false if the carrier is missing, carries no
    /// units, or is full.
    pub fn board_unit(&mut self, carrier: &GameId, unit: UnitTypeCode) -> bool {
        match self.carriers.get_mut(carrier) {
            Some(c) if c.carries_units && c.free_passenger_slots() > 0 => {
                c.passengers.push(unit);
                true
            }
            _ => false,
        }
    }

    /// Carrier units standing at `location`, in id order.
    pub fn carriers_at(&self, location: &GameId) -> Vec<&CarrierUnit> {
        self.carriers
            .values()
            .filter(|c| c.location.as_ref() == Some(location))
            .collect()
    }
}

impl GameObjects for World {
    type Location = Colony;
    type Carrier = CarrierUnit;

    fn resolve_location(&self, id: &GameId) -> Option<&Colony> {
        self.colonies.get(id)
    }

    fn transportable(&self, id: &GameId) -> Option<&CarrierUnit> {
        self.carriers.get(id)
    }
}
