use std::cmp::Reverse;

use crate::config::PlannerConfig;
use crate::error::WishError;
use crate::external::{GameObjects, Transportable, TypeCatalog};
use crate::registry::AiRegistry;
use crate::types::{AiId, Cargo, GameId};
use crate::wish::{Wish, WishKind};

// ============================================================================
// Match Report - Output of one planning pass
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    /// (wish, carrier) links made this pass, in the order they were made.
    pub assigned: Vec<(AiId, AiId)>,
    /// Wishes dropped because their destination no longer exists.
    pub destroyed: Vec<AiId>,
    /// Open wishes left for a later pass.
    pub unmatched: Vec<AiId>,
}

/// A carrier still free to take a wish this pass.
struct Candidate {
    id: AiId,
    unit: GameId,
}

// ============================================================================
// Matching pass
// ============================================================================

/// Match open wishes against free carriers from `pool`.
///
/// Wishes are served by descending value, ties broken by ascending id. Each
/// wish takes the first feasible carrier (colocated first when configured,
/// then ascending id). A carrier serves at most one wish per pass. Wishes
/// whose destination no longer resolves are destroyed before matching.
pub fn run_matching_pass<W, C>(
    registry: &mut AiRegistry,
    world: &W,
    catalog: &C,
    pool: &[AiId],
    config: &PlannerConfig,
) -> Result<MatchReport, WishError>
where
    W: GameObjects,
    C: TypeCatalog,
{
    let mut report = MatchReport::default();

    // 1. Drop wishes whose destination is gone
    let orphaned: Vec<AiId> = registry
        .wishes()
        .into_iter()
        .filter(|w| world.resolve_location(w.destination()).is_none())
        .map(|w| w.id().clone())
        .collect();
    for id in orphaned {
        registry.destroy(&id)?;
        report.destroyed.push(id);
    }

    // 2. Free carriers, in id order
    let mut pool: Vec<&AiId> = pool.iter().collect();
    pool.sort();
    pool.dedup();
    let mut candidates: Vec<Candidate> = pool
        .into_iter()
        .filter_map(|id| registry.carrier(id))
        .filter(|c| c.assignment().is_none())
        .filter(|c| world.transportable(c.unit()).is_some())
        .map(|c| Candidate {
            id: c.id().clone(),
            unit: c.unit().clone(),
        })
        .collect();

    // 3. Open wishes by priority
    let mut open: Vec<(AiId, GameId, WishKind, u32)> = registry
        .open_wishes()
        .into_iter()
        .map(|w: &Wish| (w.id().clone(), w.destination().clone(), *w.kind(), w.value()))
        .collect();
    open.sort_by(|a, b| (Reverse(a.3), &a.0).cmp(&(Reverse(b.3), &b.0)));

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "match_pass",
        open = open.len() as u64,
        carriers = candidates.len() as u64,
        destroyed = report.destroyed.len() as u64,
    );

    // 4. Greedy assignment
    for (wish, destination, kind, value) in open {
        let budget_spent = config
            .max_assignments_per_pass
            .is_some_and(|max| report.assigned.len() >= max);
        if budget_spent || value < config.min_value || candidates.is_empty() {
            report.unmatched.push(wish);
            continue;
        }

        let Some(cargo) = cargo_for(&kind, catalog) else {
            #[cfg(feature = "instrument")]
            tracing::info!(target: "match_skipped", wish = %wish, reason = "unknown type code");
            report.unmatched.push(wish);
            continue;
        };

        match pick_carrier(&candidates, world, &cargo, &destination, config) {
            Some(slot) => {
                let carrier = candidates.remove(slot);
                registry.assign(&wish, &carrier.id)?;
                report.assigned.push((wish, carrier.id));
            }
            None => report.unmatched.push(wish),
        }
    }

    Ok(report)
}

/// What a wish asks a carrier to take on, resolved against the catalog.
fn cargo_for<C: TypeCatalog>(kind: &WishKind, catalog: &C) -> Option<Cargo> {
    match *kind {
        WishKind::Goods { goods_type } => catalog.goods_type(goods_type).cloned().map(Cargo::Goods),
        WishKind::Unit {
            unit_type,
            expert_needed,
        } => catalog.unit_type(unit_type).map(|t| Cargo::Unit {
            unit_type: t.clone(),
            expert_needed,
        }),
    }
}

fn is_feasible<T: Transportable>(carrier: &T, cargo: &Cargo) -> bool {
    let capable = match cargo {
        Cargo::Goods(_) => carrier.can_carry_goods(),
        Cargo::Unit { .. } => carrier.can_carry_units(),
    };
    capable && carrier.can_add(cargo)
}

/// Index into `candidates` of the carrier to use, if any is feasible.
///
/// Feasibility is asked fresh here, so a carrier that filled up earlier in
/// the pass simply drops out.
fn pick_carrier<W: GameObjects>(
    candidates: &[Candidate],
    world: &W,
    cargo: &Cargo,
    destination: &GameId,
    config: &PlannerConfig,
) -> Option<usize> {
    let mut first_feasible = None;
    for (slot, candidate) in candidates.iter().enumerate() {
        let Some(unit) = world.transportable(&candidate.unit) else {
            continue;
        };
        if !is_feasible(unit, cargo) {
            continue;
        }
        if !config.prefer_colocated {
            return Some(slot);
        }
        if unit.current_location() == Some(destination) {
            return Some(slot);
        }
        first_feasible.get_or_insert(slot);
    }
    first_feasible
}
