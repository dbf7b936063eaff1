use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

pub mod codec;
pub mod config;
pub mod error;
pub mod external;
pub mod matching;
pub mod registry;
pub mod types;
pub mod wish;
pub mod world;

#[cfg(feature = "instrument")]
pub use instrument;

pub use codec::{LoadReport, Record, SaveDocument, load, save};
pub use config::PlannerConfig;
pub use error::WishError;
pub use external::{GameObjects, Location, Transportable, TypeCatalog};
pub use matching::{MatchReport, run_matching_pass};
pub use registry::{AiObject, AiRegistry, Carrier};
pub use types::*;
pub use wish::{Wish, WishKind, WishState};
pub use world::{Catalog, CarrierUnit, Colony, World};

// ============================================================================
// WASM API - Planner
// ============================================================================

/// The wish planner for one AI player, exposed to a JS host.
#[wasm_bindgen]
pub struct Planner {
    registry: AiRegistry,
    world: World,
    catalog: Catalog,
    config: PlannerConfig,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Planner {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Self::with_config(PlannerConfig::default())
    }

    /// Build a planner from a JSON config. Returns None if it fails to parse.
    #[wasm_bindgen]
    pub fn from_config_json(json: &str) -> Option<Planner> {
        PlannerConfig::from_json(json).ok().map(Self::with_config)
    }

    #[wasm_bindgen]
    pub fn add_colony(&mut self, id: &str, name: &str) {
        self.world.add_colony(id, name);
    }

    /// Remove a colony; wishes targeting it are dropped on the next pass.
    #[wasm_bindgen]
    pub fn remove_colony(&mut self, id: &str) -> bool {
        self.world.remove_colony(&GameId::from(id)).is_some()
    }

    /// Add a wagon train at `at` and register it with the planner.
    #[wasm_bindgen]
    pub fn add_wagon_train(&mut self, unit: &str, at: &str) -> Option<String> {
        self.add_carrier(CarrierUnit::wagon_train(unit, at))
    }

    #[wasm_bindgen]
    pub fn add_caravel(&mut self, unit: &str, at: &str) -> Option<String> {
        self.add_carrier(CarrierUnit::caravel(unit, at))
    }

    #[wasm_bindgen]
    pub fn add_galleon(&mut self, unit: &str, at: &str) -> Option<String> {
        self.add_carrier(CarrierUnit::galleon(unit, at))
    }

    #[wasm_bindgen]
    pub fn create_goods_wish(
        &mut self,
        destination: &str,
        value: i32,
        goods_type: u32,
    ) -> Option<String> {
        self.registry
            .create_goods_wish(destination.into(), value.into(), goods_type)
            .ok()
            .map(|id| id.to_string())
    }

    #[wasm_bindgen]
    pub fn create_unit_wish(
        &mut self,
        destination: &str,
        value: i32,
        unit_type: u32,
        expert_needed: bool,
    ) -> Option<String> {
        self.registry
            .create_unit_wish(destination.into(), value.into(), unit_type, expert_needed)
            .ok()
            .map(|id| id.to_string())
    }

    /// Run one matching pass over every registered carrier.
    #[wasm_bindgen]
    pub fn run_matching_pass(&mut self) -> PassSnapshot {
        let pool: Vec<AiId> = self.registry.carriers().iter().map(|c| c.id().clone()).collect();
        match run_matching_pass(
            &mut self.registry,
            &self.world,
            &self.catalog,
            &pool,
            &self.config,
        ) {
            Ok(report) => PassSnapshot::from_report(report),
            Err(err) => PassSnapshot {
                error: Some(err.to_string()),
                ..PassSnapshot::default()
            },
        }
    }

    #[wasm_bindgen]
    pub fn release(&mut self, wish: &str) -> bool {
        self.registry.release(&AiId::from(wish)).is_ok()
    }

    /// Mark a wish fulfilled and drop it.
    #[wasm_bindgen]
    pub fn complete(&mut self, wish: &str) -> bool {
        self.registry.complete(&AiId::from(wish)).is_ok()
    }

    /// Serialize the registry to a JSON save document.
    #[wasm_bindgen]
    pub fn save(&self) -> Option<String> {
        save(&self.registry).to_json().ok()
    }

    /// Replace the registry with the contents of a JSON save document.
    #[wasm_bindgen]
    pub fn load(&mut self, json: &str) -> LoadSnapshot {
        let document = match SaveDocument::from_json(json) {
            Ok(document) => document,
            Err(err) => {
                return LoadSnapshot {
                    error: Some(err.to_string()),
                    ..LoadSnapshot::default()
                };
            }
        };

        let mut registry = AiRegistry::with_prefix(self.config.id_prefix.as_str());
        let report = load(&document, &mut registry, &self.world, &self.catalog);
        self.registry = registry;
        LoadSnapshot::from_report(&report)
    }

    /// Get a snapshot of every wish for rendering
    #[wasm_bindgen]
    pub fn get_wishes(&self) -> WishesSnapshot {
        WishesSnapshot {
            wishes: self
                .registry
                .wishes()
                .into_iter()
                .map(WishSnapshot::from_wish)
                .collect(),
        }
    }
}

impl Planner {
    pub fn with_config(config: PlannerConfig) -> Self {
        Self {
            registry: AiRegistry::with_prefix(config.id_prefix.as_str()),
            world: World::new(),
            catalog: Catalog::standard(),
            config,
        }
    }

    pub fn registry(&self) -> &AiRegistry {
        &self.registry
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    fn add_carrier(&mut self, unit: CarrierUnit) -> Option<String> {
        let unit = self.world.add_carrier(unit);
        if let Some(existing) = self.registry.carrier_for_unit(&unit) {
            return Some(existing.to_string());
        }
        self.registry
            .register_carrier(unit)
            .ok()
            .map(|id| id.to_string())
    }
}

// ============================================================================
// Serializable snapshots for JS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PassSnapshot {
    pub assigned: Vec<(String, String)>,
    pub destroyed: Vec<String>,
    pub unmatched: Vec<String>,
    pub error: Option<String>,
}

impl PassSnapshot {
    fn from_report(report: MatchReport) -> Self {
        Self {
            assigned: report
                .assigned
                .into_iter()
                .map(|(w, c)| (w.to_string(), c.to_string()))
                .collect(),
            destroyed: report.destroyed.iter().map(AiId::to_string).collect(),
            unmatched: report.unmatched.iter().map(AiId::to_string).collect(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct LoadSnapshot {
    pub carriers: usize,
    pub loaded: usize,
    pub failures: Vec<String>,
    pub error: Option<String>,
}

impl LoadSnapshot {
    fn from_report(report: &LoadReport) -> Self {
        Self {
            carriers: report.carriers.len(),
            loaded: report.loaded.len(),
            failures: report
                .carrier_failures
                .iter()
                .map(|(i, e)| format!("carrier {i}: {e}"))
                .chain(
                    report
                        .failures
                        .iter()
                        .map(|(i, e)| format!("wish {i}: {e}")),
                )
                .collect(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct WishSnapshot {
    pub id: String,
    pub tag: String,
    pub destination: String,
    pub value: u32,
    pub transportable: Option<String>,
}

impl WishSnapshot {
    fn from_wish(wish: &Wish) -> Self {
        Self {
            id: wish.id().to_string(),
            tag: wish.kind().tag().to_string(),
            destination: wish.destination().to_string(),
            value: wish.value(),
            transportable: wish.transportable().map(AiId::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct WishesSnapshot {
    pub wishes: Vec<WishSnapshot>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::goods;

    fn planner() -> Planner {
        let mut planner = Planner::new();
        planner.add_colony("Colony-7", "Jamestown");
        planner.add_colony("Colony-8", "Roanoke");
        planner
    }

    #[test]
    fn test_planner_matches_and_completes() {
        let mut planner = planner();
        let wagon = planner.add_wagon_train("unit:1", "Colony-7").unwrap();
        let wish = planner
            .create_goods_wish("Colony-8", 60, goods::TOOLS)
            .unwrap();

        let pass = planner.run_matching_pass();
        assert_eq!(pass.assigned, vec![(wish.clone(), wagon.clone())]);
        assert!(pass.error.is_none());

        assert!(planner.complete(&wish));
        assert!(planner.get_wishes().wishes.is_empty());
        assert_eq!(
            planner.registry().wish_for_carrier(&AiId::from(wagon.as_str())),
            None
        );
    }

    #[test]
    fn test_planner_rejects_negative_value() {
        let mut planner = planner();
        assert!(planner.create_goods_wish("Colony-7", -5, goods::TOOLS).is_none());
    }

    #[test]
    fn test_adding_same_unit_twice_reuses_handle() {
        let mut planner = planner();
        let first = planner.add_caravel("unit:1", "Colony-7").unwrap();
        let second = planner.add_caravel("unit:1", "Colony-8").unwrap();
        assert_eq!(first, second);
        assert_eq!(planner.registry().carriers().len(), 1);
    }

    #[test]
    fn test_removed_colony_drops_wish_on_next_pass() {
        let mut planner = planner();
        let wish = planner.create_goods_wish("Colony-8", 10, goods::FOOD).unwrap();
        assert!(planner.remove_colony("Colony-8"));

        let pass = planner.run_matching_pass();
        assert_eq!(pass.destroyed, vec![wish]);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut planner = planner();
        planner.add_galleon("unit:1", "Colony-7").unwrap();
        planner.create_goods_wish("Colony-8", 80, goods::TOOLS).unwrap();
        planner.create_unit_wish("Colony-7", 40, 3, true).unwrap();
        planner.run_matching_pass();

        let json = planner.save().unwrap();
        let before = planner.get_wishes();

        let snapshot = planner.load(&json);
        assert!(snapshot.error.is_none());
        assert!(snapshot.failures.is_empty(), "{:?}", snapshot.failures);
        assert_eq!(snapshot.carriers, 1);
        assert_eq!(snapshot.loaded, 2);

        let after = planner.get_wishes();
        let ids = |s: &WishesSnapshot| {
            s.wishes
                .iter()
                .map(|w| (w.id.clone(), w.transportable.clone(), w.value))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&before), ids(&after));
        assert_eq!(planner.save().unwrap(), json);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut planner = planner();
        let snapshot = planner.load("not json");
        assert!(snapshot.error.is_some());
    }

    #[test]
    fn test_config_json() {
        let planner = Planner::from_config_json(r#"{ "id_prefix": "ai" }"#).unwrap();
        assert_eq!(planner.registry().prefix(), "ai");
        assert!(Planner::from_config_json("[").is_none());
    }
}
