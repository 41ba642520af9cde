//! System info resolver and catalog cache.
//!
//! Catalog data for a system (bodies, stations) is fetched once per name and
//! kept for the life of the resolver; it is never refreshed or evicted.
//! Live facts (allegiance, population, ...) come from the latest `FSDJump`
//! and are overlaid per request, only when that jump landed in the system
//! being asked about.
//!
//! Each name maps to a [`OnceCell`], so concurrent requests for the same
//! system share one catalog fetch. A failed fetch leaves the cell empty and
//! the next request tries again.

use std::collections::HashMap;
use std::sync::Arc;

use icarus_types::{Body, Economy, LiveSystemFields, LogEvent, Station, SystemInfo};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogError};
use crate::source::LogQuery;

/// Journal event that records arrival in a new system.
const JUMP_EVENT: &str = "FSDJump";

/// Catalog data for one system, as first fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSystem {
    /// System name.
    pub name: String,
    /// Bodies at fetch time.
    pub bodies: Vec<Body>,
    /// Stations at fetch time.
    pub stations: Vec<Station>,
}

/// Resolves [`SystemInfo`] from the catalog cache and the journal.
pub struct SystemResolver {
    catalog: Arc<dyn Catalog>,
    cache: Mutex<HashMap<String, Arc<OnceCell<Arc<CachedSystem>>>>>,
}

impl SystemResolver {
    /// Create a resolver with an empty cache.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Describe `name`, or the system of the latest jump when `name` is
    /// `None`.
    ///
    /// Returns `Ok(None)` when no name is given and there has been no jump.
    pub async fn resolve(
        &self,
        log: &dyn LogQuery,
        name: Option<&str>,
    ) -> Result<Option<SystemInfo>, CatalogError> {
        let jump = log.latest(JUMP_EVENT);
        let jump_system = jump.as_ref().and_then(|j| j.str_field("StarSystem"));

        let Some(system_name) = name.or(jump_system) else {
            debug!("No system requested and no jump recorded yet");
            return Ok(None);
        };

        let cached = self.cached_or_fetch(system_name).await?;

        let live = match &jump {
            Some(j) if jump_system == Some(system_name) => live_fields(j),
            _ => LiveSystemFields::default(),
        };

        Ok(Some(SystemInfo {
            name: cached.name.clone(),
            bodies: cached.bodies.clone(),
            stations: cached.stations.clone(),
            live,
        }))
    }

    /// Number of systems held in the cache.
    pub fn cached_count(&self) -> usize {
        self.cache
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    async fn cached_or_fetch(&self, name: &str) -> Result<Arc<CachedSystem>, CatalogError> {
        let cell = {
            let mut cache = self.cache.lock();
            Arc::clone(cache.entry(name.to_owned()).or_default())
        };

        let entry = cell
            .get_or_try_init(|| async {
                let (bodies, stations) =
                    tokio::try_join!(self.catalog.bodies(name), self.catalog.stations(name))?;
                info!(
                    system = name,
                    bodies = bodies.len(),
                    stations = stations.len(),
                    "System cached"
                );
                Ok::<_, CatalogError>(Arc::new(CachedSystem {
                    name: name.to_owned(),
                    bodies,
                    stations,
                }))
            })
            .await?;

        Ok(Arc::clone(entry))
    }
}

/// Live facts carried by a jump record.
fn live_fields(jump: &LogEvent) -> LiveSystemFields {
    let owned = |key: &str| jump.str_field(key).map(ToOwned::to_owned);

    LiveSystemFields {
        address: jump.u64_field("SystemAddress").into(),
        position: jump
            .field("StarPos")
            .and_then(Value::as_array)
            .map(|coords| coords.iter().filter_map(Value::as_f64).collect())
            .into(),
        allegiance: owned("SystemAllegiance").into(),
        government: owned("SystemGovernment_Localised").into(),
        security: owned("SystemSecurity_Localised").into(),
        economy: Economy {
            primary: owned("SystemEconomy_Localised").into(),
            secondary: owned("SystemSecondEconomy_Localised").into(),
        },
        population: jump.u64_field("Population").into(),
        faction: jump
            .field("SystemFaction")
            .and_then(|f| f.get("Name"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .into(),
    }
}
