//! Entry store: registry CRUD against the key-value backend
//!
//! Owns the lifecycle transitions. Because the storage key embeds the
//! current status, a transition is write-new-key then delete-old-key; the
//! two steps are not atomic and a crash in between can leave a duplicate
//! until TTL expiry reclaims it. Registration's scan-then-write has the
//! same caveat. This is the accepted consistency model: no distributed
//! transaction, bounded by expiry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::kv::KvStore;
use crate::registry::discovery::{self, DiscoverQuery};
use crate::registry::entry::{now_rfc3339, ServiceEntry, ServiceStatus};
use crate::registry::keys;

/// Registry storage over a [`KvStore`]
pub struct EntryStore {
    kv: Arc<dyn KvStore>,
    entry_ttl: Duration,
    report_tolerance: i64,
}

impl EntryStore {
    pub fn new(kv: Arc<dyn KvStore>, entry_ttl: Duration, report_tolerance: i64) -> Self {
        Self {
            kv,
            entry_ttl,
            report_tolerance,
        }
    }

    /// Register a new service instance
    ///
    /// Stamps the lifecycle fields, refuses a duplicate identity tuple,
    /// then writes the entry under its encoded key with the configured TTL.
    /// The short TTL is intentional: it forces periodic heartbeats to keep
    /// an entry alive.
    pub async fn register(&self, mut entry: ServiceEntry) -> Result<ServiceEntry, RegistryError> {
        keys::validate_entry_fields(&entry)?;

        let now = now_rfc3339();
        entry.created_at = now.clone();
        entry.last_heard_at = now.clone();
        entry.last_report_at = now;
        entry.status = ServiceStatus::Registered;
        entry.heard_count = 0;
        entry.report_count = 0;
        entry.ttl = self.entry_ttl.as_secs() as i64;

        let existing = self.kv.scan(&keys::identity_search_key(&entry)).await?;
        if !existing.is_empty() {
            debug!(
                uuid = %entry.service_uuid,
                matches = existing.len(),
                "registration refused, identity tuple already present"
            );
            return Err(RegistryError::Conflict(
                "a service with this placement is already registered".to_string(),
            ));
        }

        let value = serde_json::to_vec(&entry)?;
        self.kv
            .set(&keys::entry_key(&entry), &value, self.entry_ttl)
            .await?;

        info!(
            uuid = %entry.service_uuid,
            service_type = %entry.service_type,
            provider = %entry.provider,
            region = %entry.region,
            "service registered"
        );
        Ok(entry)
    }

    /// Look up the entry for an identity tuple, ignoring UUID and status
    ///
    /// More than one match is a conflict signal for the caller, never
    /// resolved here by picking one.
    pub async fn find_by_identity(
        &self,
        entry: &ServiceEntry,
    ) -> Result<Option<ServiceEntry>, RegistryError> {
        let matches = self.kv.scan(&keys::identity_search_key(entry)).await?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(self.fetch(&matches[0]).await?)),
            n => Err(RegistryError::Conflict(format!(
                "{n} entries share one identity tuple"
            ))),
        }
    }

    /// Resolve a UUID to exactly one live entry
    ///
    /// The UUID is supposed to be globally unique, so more than one match
    /// means the registry cannot be trusted for it: conflict, not a pick.
    pub async fn find_by_uuid(&self, uuid: &str) -> Result<ServiceEntry, RegistryError> {
        let matches = self.kv.scan(&keys::uuid_search_key(uuid)).await?;
        match matches.len() {
            0 => Err(RegistryError::NotFound(uuid.to_string())),
            1 => self.fetch(&matches[0]).await,
            n => Err(RegistryError::Conflict(format!(
                "{n} entries found for UUID {uuid}"
            ))),
        }
    }

    /// Record a heartbeat for a service
    ///
    /// An entry whose report count exceeds the tolerance transitions to
    /// `suspicious` and the beat is rejected without the timestamp update:
    /// a suspicious service cannot heal itself by heartbeating. Otherwise
    /// the entry moves to `healthy` with refreshed timestamp, count and
    /// TTL, written under its new key before the old key is removed.
    pub async fn heartbeat(&self, uuid: &str) -> Result<ServiceEntry, RegistryError> {
        let current = self.find_by_uuid(uuid).await?;
        let old_key = keys::entry_key(&current);

        if current.report_count > self.report_tolerance {
            warn!(
                uuid,
                report_count = current.report_count,
                tolerance = self.report_tolerance,
                "heartbeat refused, service marked suspicious"
            );
            let mut flagged = current;
            flagged.status = ServiceStatus::Suspicious;
            self.rotate(&flagged, &old_key).await?;
            return Err(RegistryError::Suspicious(uuid.to_string()));
        }

        let mut updated = current;
        updated.last_heard_at = now_rfc3339();
        updated.heard_count += 1;
        updated.status = ServiceStatus::Healthy;
        self.rotate(&updated, &old_key).await?;

        debug!(uuid, heard_count = updated.heard_count, "heartbeat accepted");
        Ok(updated)
    }

    /// Remove a service by UUID; absent is success (idempotent delete)
    ///
    /// Returns whether an entry was actually deleted. More than one match
    /// is a conflict and nothing is deleted.
    pub async fn deregister(&self, uuid: &str) -> Result<bool, RegistryError> {
        let matches = self.kv.scan(&keys::uuid_search_key(uuid)).await?;
        match matches.len() {
            0 => Ok(false),
            1 => {
                self.kv.delete(&matches[0]).await?;
                info!(uuid, "service deregistered");
                Ok(true)
            }
            n => Err(RegistryError::Conflict(format!(
                "{n} entries found for UUID {uuid}"
            ))),
        }
    }

    /// Filtered, paginated discovery
    pub async fn list_filtered(
        &self,
        query: &DiscoverQuery,
    ) -> Result<Vec<ServiceEntry>, RegistryError> {
        discovery::discover(self.kv.as_ref(), query).await
    }

    /// Fetch and decode one entry by exact key
    async fn fetch(&self, key: &str) -> Result<ServiceEntry, RegistryError> {
        let raw = self
            .kv
            .get(key)
            .await?
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| RegistryError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Write an entry under its current key and drop the previous key if
    /// the status change moved it. Not atomic across the two commands.
    async fn rotate(&self, entry: &ServiceEntry, old_key: &str) -> Result<(), RegistryError> {
        let new_key = keys::entry_key(entry);
        let value = serde_json::to_vec(entry)?;
        self.kv.set(&new_key, &value, self.entry_ttl).await?;
        if new_key != old_key {
            self.kv.delete(old_key).await?;
        }
        Ok(())
    }
}
