//! Checks the structured events a pass and a load emit.
#![cfg(feature = "instrument")]

use polars::prelude::*;
use wish_core::codec::GOODS_WISH_TAG;
use wish_core::instrument;
use wish_core::world::goods;
use wish_core::{
    AiId, AiRegistry, Catalog, CarrierUnit, PlannerConfig, Record, SaveDocument, World, load,
    run_matching_pass,
};

fn setup() -> (AiRegistry, World, Vec<AiId>) {
    let mut world = World::new();
    world.add_colony("Colony-1", "Jamestown");
    world.add_colony("Colony-2", "Plymouth");

    let mut registry = AiRegistry::new();
    let mut pool = Vec::new();
    for i in 0..3 {
        let unit = world.add_carrier(CarrierUnit::wagon_train(format!("unit:{i}"), "Colony-1"));
        pool.push(registry.register_carrier(unit).unwrap());
    }
    for value in [10, 90, 40, 70] {
        registry
            .create_goods_wish("Colony-2".into(), value, goods::TOOLS)
            .unwrap();
    }
    (registry, world, pool)
}

#[test]
fn test_assignment_events_follow_priority() {
    let (mut registry, world, pool) = setup();

    let (report, events) = instrument::capture(|| {
        run_matching_pass(
            &mut registry,
            &world,
            &Catalog::standard(),
            &pool,
            &PlannerConfig::default(),
        )
        .unwrap()
    });

    assert_eq!(events.rows("match_pass"), 1);
    assert_eq!(events.rows("wish_assigned"), report.assigned.len());
    assert_eq!(report.assigned.len(), 3);

    let assigned = events.table("wish_assigned").unwrap();
    assert_eq!(assigned.u64s("value").unwrap(), &[90, 70, 40]);
    let wishes: Vec<AiId> = assigned
        .strings("wish")
        .unwrap()
        .iter()
        .map(|w| AiId::from(w.as_str()))
        .collect();
    let expected: Vec<AiId> = report.assigned.iter().map(|(w, _)| w.clone()).collect();
    assert_eq!(wishes, expected);

    let df = assigned.to_dataframe().unwrap();
    assert_eq!(df.height(), 3);
    let total = df
        .column("value")
        .unwrap()
        .as_materialized_series()
        .sum::<u64>()
        .unwrap();
    assert_eq!(total, 200);
}

#[test]
fn test_lifecycle_events() {
    let (mut registry, _world, pool) = setup();
    let wish = registry.open_wishes()[0].id().clone();

    let ((), events) = instrument::capture(|| {
        registry.assign(&wish, &pool[0]).unwrap();
        registry.assign(&wish, &pool[1]).unwrap();
        registry.release(&wish).unwrap();
        registry.complete(&wish).unwrap();
    });

    assert_eq!(events.rows("wish_assigned"), 2);
    assert_eq!(events.rows("wish_released"), 1);
    assert_eq!(events.rows("wish_destroyed"), 1);
    assert_eq!(events.rows("wish_fulfilled"), 1);

    let assigned = events.table("wish_assigned").unwrap();
    let replaced = assigned.strings("replaced_carrier").unwrap();
    assert_eq!(replaced, &[String::new(), pool[0].to_string()]);
}

#[test]
fn test_load_failures_are_logged() {
    let (_, world, _) = setup();
    let document = SaveDocument {
        next_id: 1,
        carriers: vec![],
        wishes: vec![
            Record::new(GOODS_WISH_TAG)
                .with("ID", "am1")
                .with("destination", "Colony-1")
                .with("value", "5")
                .with("goodsType", goods::TOOLS.to_string()),
            Record::new("WorkerWish").with("ID", "am2"),
            Record::new(GOODS_WISH_TAG)
                .with("ID", "am3")
                .with("destination", "Nowhere")
                .with("value", "5")
                .with("goodsType", goods::TOOLS.to_string()),
        ],
    };

    let mut registry = AiRegistry::new();
    let (report, events) =
        instrument::capture(|| load(&document, &mut registry, &world, &Catalog::standard()));

    assert_eq!(report.loaded, vec![AiId::from("am1")]);
    let failures = events.table("load_failure").unwrap();
    assert_eq!(failures.u64s("index").unwrap(), &[1, 2]);
    assert_eq!(
        failures.strings("tag").unwrap(),
        &["WorkerWish".to_string(), GOODS_WISH_TAG.to_string()]
    );

    let frames = events.to_dataframes();
    assert_eq!(frames["load_failure"].height(), 2);
}
