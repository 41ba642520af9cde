//! Star-system views: catalog data plus live journal facts.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::known::Known;

/// A celestial body as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct Body {
    /// Catalog-internal identifier.
    pub id: Option<u64>,
    /// Body index within the system, as the game numbers it.
    pub body_id: Option<u64>,
    /// Full body name (e.g. `Sol 3`).
    pub name: String,
    /// Broad classification: `Star` or `Planet`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Detailed classification (e.g. `G (White-Yellow) Star`).
    pub sub_type: Option<String>,
    /// Distance from the arrival point in light seconds.
    pub distance_to_arrival: Option<f64>,
    /// Whether this is the system's primary star.
    pub is_main_star: Option<bool>,
    /// Whether fuel can be scooped from this star.
    pub is_scoopable: Option<bool>,
    /// Whether a ship can land on this body.
    pub is_landable: Option<bool>,
    /// Surface gravity in g.
    pub gravity: Option<f64>,
    /// Terraforming state text, if any.
    pub terraforming_state: Option<String>,
}

/// Reference to a minor faction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct FactionRef {
    /// Catalog-internal identifier.
    pub id: Option<u64>,
    /// Faction name.
    pub name: String,
}

/// A station, outpost, or settlement as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct Station {
    /// Catalog-internal identifier.
    pub id: Option<u64>,
    /// In-game market identifier.
    pub market_id: Option<u64>,
    /// Station kind (e.g. `Coriolis Starport`).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Station name.
    pub name: String,
    /// Distance from the arrival point in light seconds.
    pub distance_to_arrival: Option<f64>,
    /// Superpower allegiance.
    pub allegiance: Option<String>,
    /// Government type.
    pub government: Option<String>,
    /// Primary economy.
    pub economy: Option<String>,
    /// Secondary economy.
    pub second_economy: Option<String>,
    /// Commodity market available.
    pub have_market: Option<bool>,
    /// Shipyard available.
    pub have_shipyard: Option<bool>,
    /// Outfitting available.
    pub have_outfitting: Option<bool>,
    /// Any additional services.
    pub other_services: Vec<String>,
    /// Controlling minor faction.
    pub controlling_faction: Option<FactionRef>,
}

/// Primary and secondary economy of a system.
#[derive(Debug, Clone, PartialEq, Default, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Economy {
    /// Primary economy.
    #[ts(type = "string")]
    pub primary: Known<String>,
    /// Secondary economy.
    #[ts(type = "string")]
    pub secondary: Known<String>,
}

/// Facts that only the latest jump record can supply.
///
/// Every field is [`Known::Unknown`] unless the commander's most recent jump
/// landed in the system being described.
#[derive(Debug, Clone, PartialEq, Default, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LiveSystemFields {
    /// 64-bit system address.
    #[ts(type = "number | string")]
    pub address: Known<u64>,
    /// Galactic coordinates `[x, y, z]` in light years.
    #[ts(type = "Array<number> | string")]
    pub position: Known<Vec<f64>>,
    /// Superpower allegiance.
    #[ts(type = "string")]
    pub allegiance: Known<String>,
    /// Government type (localised).
    #[ts(type = "string")]
    pub government: Known<String>,
    /// Security level (localised).
    #[ts(type = "string")]
    pub security: Known<String>,
    /// Economy pair (localised).
    pub economy: Economy,
    /// Population.
    #[ts(type = "number | string")]
    pub population: Known<u64>,
    /// Controlling faction name.
    #[ts(type = "string")]
    pub faction: Known<String>,
}

/// A system as served to clients: catalog data with live facts overlaid.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemInfo {
    /// System name.
    pub name: String,
    /// Bodies from the catalog.
    pub bodies: Vec<Body>,
    /// Stations from the catalog.
    pub stations: Vec<Station>,
    /// Live facts from the latest jump.
    #[serde(flatten)]
    pub live: LiveSystemFields,
}
