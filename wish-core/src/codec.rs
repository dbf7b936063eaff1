// Save-game codec for the AI registry.
//
// Wishes and carrier handles are written as flat tagged records of string
// attributes. Loading runs in two phases: every record is parsed without
// touching any registry, then each parsed record is resolved against the
// live game model and the registry. A record that fails either phase is
// reported and skipped; the rest still load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::WishError;
use crate::external::{GameObjects, TypeCatalog};
use crate::registry::{AiObject, AiRegistry, Carrier};
use crate::types::{AiId, GameId, Priority};
use crate::wish::{Wish, WishKind};

pub const GOODS_WISH_TAG: &str = "GoodsWish";
pub const UNIT_WISH_TAG: &str = "UnitWish";
pub const CARRIER_TAG: &str = "AICarrier";

// ============================================================================
// Records
// ============================================================================

/// One persisted object: a tag plus string attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub tag: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl Record {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn require(&self, name: &'static str) -> Result<&str, WishError> {
        self.get(name).ok_or(WishError::MissingField(name))
    }
}

/// Registry state as written to a save game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub next_id: u64,
    pub carriers: Vec<Record>,
    pub wishes: Vec<Record>,
}

impl SaveDocument {
    pub fn to_json(&self) -> Result<String, WishError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, WishError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Writing
// ============================================================================

pub fn wish_to_record(wish: &Wish) -> Record {
    let mut record = Record::new(wish.kind().tag())
        .with("ID", wish.id().as_str())
        .with("destination", wish.destination().as_str());
    if let Some(carrier) = wish.transportable() {
        record = record.with("transportable", carrier.as_str());
    }
    record = record.with("value", wish.value().to_string());

    match *wish.kind() {
        WishKind::Goods { goods_type } => record.with("goodsType", goods_type.to_string()),
        WishKind::Unit {
            unit_type,
            expert_needed,
        } => record
            .with("unitType", unit_type.to_string())
            .with("expertNeeded", expert_needed.to_string()),
    }
}

pub fn carrier_to_record(carrier: &Carrier) -> Record {
    Record::new(CARRIER_TAG)
        .with("ID", carrier.id().as_str())
        .with("unit", carrier.unit().as_str())
}

/// Snapshot the registry. Records come out in ascending id order.
pub fn save(registry: &AiRegistry) -> SaveDocument {
    SaveDocument {
        next_id: registry.next_counter(),
        carriers: registry
            .carriers()
            .into_iter()
            .map(carrier_to_record)
            .collect(),
        wishes: registry.wishes().into_iter().map(wish_to_record).collect(),
    }
}

// ============================================================================
// Phase 1: parse
// ============================================================================

/// A wish record with its fields extracted and no reference resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWish {
    pub id: AiId,
    pub destination: GameId,
    pub transportable: Option<AiId>,
    pub value: Priority,
    pub kind: WishKind,
}

fn parse_number<T: std::str::FromStr>(record: &Record, field: &'static str) -> Result<T, WishError> {
    let raw = record.require(field)?;
    raw.parse().map_err(|_| WishError::MalformedField {
        field,
        value: raw.to_string(),
    })
}

fn parse_flag(record: &Record, field: &'static str) -> Result<bool, WishError> {
    match record.get(field) {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(WishError::MalformedField {
            field,
            value: other.to_string(),
        }),
    }
}

pub fn parse_wish(record: &Record) -> Result<ParsedWish, WishError> {
    let kind = match record.tag.as_str() {
        GOODS_WISH_TAG => WishKind::Goods {
            goods_type: parse_number(record, "goodsType")?,
        },
        UNIT_WISH_TAG => WishKind::Unit {
            unit_type: parse_number(record, "unitType")?,
            expert_needed: parse_flag(record, "expertNeeded")?,
        },
        other => return Err(WishError::UnknownTag(other.to_string())),
    };

    let value: i64 = parse_number(record, "value")?;
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

    Ok(ParsedWish {
        id: AiId::new(record.require("ID")?),
        destination: GameId::new(record.require("destination")?),
        transportable: record.get("transportable").map(AiId::new),
        value,
        kind,
    })
}

fn parse_carrier(record: &Record) -> Result<Carrier, WishError> {
    if record.tag != CARRIER_TAG {
        return Err(WishError::UnknownTag(record.tag.clone()));
    }
    Ok(Carrier::new(
        AiId::new(record.require("ID")?),
        GameId::new(record.require("unit")?),
    ))
}

// ============================================================================
// Phase 2: resolve
// ============================================================================

/// Resolve a parsed wish and register it, linking its carrier if it has one.
pub fn resolve_wish<W, C>(
    parsed: ParsedWish,
    registry: &mut AiRegistry,
    world: &W,
    catalog: &C,
) -> Result<AiId, WishError>
where
    W: GameObjects,
    C: TypeCatalog,
{
    if registry.contains(&parsed.id) {
        return Err(WishError::DuplicateIdentifier(parsed.id));
    }
    if world.resolve_location(&parsed.destination).is_none() {
        return Err(WishError::MissingReference {
            field: "destination",
            id: parsed.destination.to_string(),
        });
    }
    match parsed.kind {
        WishKind::Goods { goods_type } if catalog.goods_type(goods_type).is_none() => {
            return Err(WishError::MissingReference {
                field: "goodsType",
                id: goods_type.to_string(),
            });
        }
        WishKind::Unit { unit_type, .. } if catalog.unit_type(unit_type).is_none() => {
            return Err(WishError::MissingReference {
                field: "unitType",
                id: unit_type.to_string(),
            });
        }
        _ => {}
    }
    if let Some(carrier_id) = &parsed.transportable {
        let carrier = registry
            .carrier(carrier_id)
            .ok_or_else(|| WishError::MissingReference {
                field: "transportable",
                id: carrier_id.to_string(),
            })?;
        if let Some(holder) = carrier.assignment() {
            return Err(WishError::ConflictingAssignment {
                carrier: carrier_id.clone(),
                wish: holder.clone(),
            });
        }
    }

    let id = parsed.id.clone();
    let transportable = parsed.transportable.clone();
    registry.register(AiObject::Wish(Wish {
        id: parsed.id,
        destination: parsed.destination,
        value: parsed.value,
        transportable: None,
        kind: parsed.kind,
    }))?;
    if let Some(carrier) = transportable {
        registry.assign(&id, &carrier)?;
    }
    registry.bump_past(&id);
    Ok(id)
}

fn resolve_carrier<W: GameObjects>(
    carrier: Carrier,
    registry: &mut AiRegistry,
    world: &W,
) -> Result<AiId, WishError> {
    if world.transportable(carrier.unit()).is_none() {
        return Err(WishError::MissingReference {
            field: "unit",
            id: carrier.unit().to_string(),
        });
    }
    let id = carrier.id().clone();
    registry.register(AiObject::Carrier(carrier))?;
    registry.bump_past(&id);
    Ok(id)
}

// ============================================================================
// Loading
// ============================================================================

/// Outcome of a load. Failures carry the index of the offending record
/// within its list.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub carriers: Vec<AiId>,
    pub loaded: Vec<AiId>,
    pub carrier_failures: Vec<(usize, WishError)>,
    pub failures: Vec<(usize, WishError)>,
}

/// Load wish records into `registry`. Carriers they reference must already
/// be registered.
pub fn load_wishes<W, C>(
    records: &[Record],
    registry: &mut AiRegistry,
    world: &W,
    catalog: &C,
) -> LoadReport
where
    W: GameObjects,
    C: TypeCatalog,
{
    let mut report = LoadReport::default();

    let parsed: Vec<Result<ParsedWish, WishError>> = records.iter().map(parse_wish).collect();

    for (index, entry) in parsed.into_iter().enumerate() {
        match entry.and_then(|p| resolve_wish(p, registry, world, catalog)) {
            Ok(id) => report.loaded.push(id),
            Err(err) => {
                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "load_failure",
                    index = index as u64,
                    tag = records[index].tag.as_str(),
                    reason = %err,
                );
                report.failures.push((index, err));
            }
        }
    }

    report
}

/// Restore a save document into `registry`: counter, carriers, then wishes.
pub fn load<W, C>(
    document: &SaveDocument,
    registry: &mut AiRegistry,
    world: &W,
    catalog: &C,
) -> LoadReport
where
    W: GameObjects,
    C: TypeCatalog,
{
    registry.restore_counter(document.next_id);

    let mut carriers = Vec::new();
    let mut carrier_failures = Vec::new();
    for (index, record) in document.carriers.iter().enumerate() {
        match parse_carrier(record).and_then(|c| resolve_carrier(c, registry, world)) {
            Ok(id) => carriers.push(id),
            Err(err) => {
                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "load_failure",
                    index = index as u64,
                    tag = record.tag.as_str(),
                    reason = %err,
                );
                carrier_failures.push((index, err));
            }
        }
    }

    let mut report = load_wishes(&document.wishes, registry, world, catalog);
    report.carriers = carriers;
    report.carrier_failures = carrier_failures;
    report
}
