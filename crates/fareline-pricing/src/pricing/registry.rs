//! Ride-class registry
//!
//! Maps ride-class identifiers to rate policies. The class map is
//! copy-on-write: a registration builds a new map and swaps the shared
//! pointer, so a reader holds either the old or the new map in full and a
//! policy is never observed half-updated.
//!
//! The swap itself takes the pointer's write lock, so a reader arriving at
//! that instant waits for one pointer store. Validation and the map rebuild
//! happen before the lock is taken and never block readers.

use chrono::{DateTime, Utc};
use fareline_common::{FareError, RatePolicy, Result, RideClassId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Registered policy with its registry version
#[derive(Debug, Clone)]
pub struct PolicyEntry {
    pub ride_class: RideClassId,
    pub policy: RatePolicy,
    /// Registry version that installed this entry
    pub version: u64,
    pub registered_at: DateTime<Utc>,
}

/// Immutable view of every registered class at one version
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    version: u64,
    classes: HashMap<RideClassId, Arc<PolicyEntry>>,
}

impl RegistrySnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, ride_class: &str) -> Option<Arc<PolicyEntry>> {
        self.classes.get(ride_class).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registered class identifiers, sorted
    pub fn class_ids(&self) -> Vec<RideClassId> {
        let mut ids: Vec<_> = self.classes.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Concurrent ride-class registry
pub struct RideClassRegistry {
    /// Current snapshot; the lock is only held long enough to clone or swap the Arc
    current: RwLock<Arc<RegistrySnapshot>>,
    /// Serializes writers
    writer: Mutex<()>,
}

impl RideClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(RegistrySnapshot::default())),
            writer: Mutex::new(()),
        }
    }

    /// Create a registry pre-populated with policies
    pub fn with_policies<I>(policies: I) -> Result<Self>
    where
        I: IntoIterator<Item = (RideClassId, RatePolicy)>,
    {
        let registry = Self::new();
        for (ride_class, policy) in policies {
            registry.register(ride_class, policy)?;
        }
        Ok(registry)
    }

    /// Insert or replace the policy of a ride class
    #[instrument(skip(self, ride_class, policy), fields(ride_class = %ride_class))]
    pub fn register(&self, ride_class: RideClassId, policy: RatePolicy) -> Result<u64> {
        if ride_class.is_blank() {
            return Err(FareError::invalid_policy("ride class identifier must not be empty"));
        }
        if let Err(err) = policy.validate() {
            warn!(error = %err, "Rejected rate policy");
            return Err(err);
        }

        let _guard = self.writer.lock();
        let base = self.snapshot();
        let version = base.version + 1;

        let mut classes = base.classes.clone();
        let replaced = classes
            .insert(
                ride_class.clone(),
                Arc::new(PolicyEntry {
                    ride_class: ride_class.clone(),
                    policy,
                    version,
                    registered_at: Utc::now(),
                }),
            )
            .is_some();

        *self.current.write() = Arc::new(RegistrySnapshot { version, classes });

        info!(version, replaced, "Registered ride class");
        Ok(version)
    }

    /// Remove a ride class. Returns whether it was registered.
    #[instrument(skip(self))]
    pub fn unregister(&self, ride_class: &str) -> bool {
        let _guard = self.writer.lock();
        let base = self.snapshot();
        if !base.classes.contains_key(ride_class) {
            return false;
        }

        let mut classes = base.classes.clone();
        classes.remove(ride_class);
        let version = base.version + 1;
        *self.current.write() = Arc::new(RegistrySnapshot { version, classes });

        info!(version, "Unregistered ride class");
        true
    }

    /// Current policy snapshot of a ride class
    pub fn resolve(&self, ride_class: &str) -> Result<Arc<PolicyEntry>> {
        match self.snapshot().get(ride_class) {
            Some(entry) => {
                debug!(ride_class, version = entry.version, "Resolved ride class");
                Ok(entry)
            }
            None => Err(FareError::UnknownRideClass {
                ride_class: ride_class.to_string(),
            }),
        }
    }

    /// Whole class map at the current version
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    pub fn contains(&self, ride_class: &str) -> bool {
        self.snapshot().classes.contains_key(ride_class)
    }

    /// Registered class identifiers, sorted
    pub fn classes(&self) -> Vec<RideClassId> {
        self.snapshot().class_ids()
    }
}

impl Default for RideClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RideClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("RideClassRegistry")
            .field("version", &snapshot.version)
            .field("classes", &snapshot.class_ids())
            .finish()
    }
}
