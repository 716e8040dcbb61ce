//! Integration tests for the registry lifecycle
//!
//! Drives the full register → discover → heartbeat → deregister flow
//! against the in-memory key-value store, without a network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use waypost::kv::{KvStore, MemoryStore};
use waypost::registry::discovery::DiscoverQuery;
use waypost::registry::entry::{ServiceEntry, ServiceStatus};
use waypost::registry::EntryStore;
use waypost::RegistryError;

const ENTRY_TTL: Duration = Duration::from_secs(60);
const REPORT_TOLERANCE: i64 = 3;

fn new_store() -> (EntryStore, Arc<MemoryStore>) {
    let kv = Arc::new(MemoryStore::new());
    let store = EntryStore::new(
        Arc::clone(&kv) as Arc<dyn KvStore>,
        ENTRY_TTL,
        REPORT_TOLERANCE,
    );
    (store, kv)
}

/// A gateway instance in us-east-1, instance id varied per call; the UUID
/// is derived from the instance id so entries stay distinct
fn gateway_entry(instance: &str) -> ServiceEntry {
    let suffix = instance.trim_start_matches("i-");
    ServiceEntry {
        service_uuid: format!("00000000-0000-4000-8000-{suffix:0>12}"),
        name: "edge-gateway".to_string(),
        service_type: "gw".to_string(),
        version: "1.0.0".to_string(),
        provider: "aws".to_string(),
        region: "us-east-1".to_string(),
        zone: "us-east-1a".to_string(),
        cluster: "edge".to_string(),
        instance_id: instance.to_string(),
        network_id: "vpc-12345678".to_string(),
        subnet_id: "subnet-87654321".to_string(),
        network_domain: "internal".to_string(),
        tags: HashMap::new(),
        addr4: "10.0.0.1".to_string(),
        port4: 8080,
        addr6: String::new(),
        port6: 0,
        created_at: String::new(),
        last_heard_at: String::new(),
        status: ServiceStatus::Unknown,
        heard_count: 0,
        report_count: 0,
        last_report_at: String::new(),
        metadata: HashMap::new(),
        ttl: 0,
    }
}

#[tokio::test]
async fn test_full_service_lifecycle() {
    let (store, _kv) = new_store();

    // Register service A
    let registered = store.register(gateway_entry("i-0001")).await.unwrap();
    let uuid = registered.service_uuid.clone();
    assert_eq!(registered.status, ServiceStatus::Registered);

    // Discovery by type finds exactly one entry with the IPv4 address
    let query = DiscoverQuery::new("gw");
    let found = store.list_filtered(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].resolved_addr().unwrap(), "10.0.0.1:8080");

    // Two heartbeats: heard count 2, status healthy
    store.heartbeat(&uuid).await.unwrap();
    let second = store.heartbeat(&uuid).await.unwrap();
    assert_eq!(second.heard_count, 2);
    assert_eq!(second.status, ServiceStatus::Healthy);

    // Deregister: discovery is empty again
    assert!(store.deregister(&uuid).await.unwrap());
    let found = store.list_filtered(&query).await.unwrap();
    assert!(found.is_empty());

    // Re-deregister still reports success
    assert!(!store.deregister(&uuid).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_registration_before_expiry_is_refused() {
    let (store, _kv) = new_store();

    store.register(gateway_entry("i-0001")).await.unwrap();
    match store.register(gateway_entry("i-0001")).await {
        Err(RegistryError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }

    // A different placement registers fine
    store.register(gateway_entry("i-0002")).await.unwrap();
}

#[tokio::test]
async fn test_discovery_pagination_formula() {
    let (store, _kv) = new_store();

    // 23 gateway instances
    for i in 0..23 {
        store
            .register(gateway_entry(&format!("i-{i:04}")))
            .await
            .unwrap();
    }

    // pageSize p, pageOffset o => max(0, min(p, N - o*p)) entries
    let n: i64 = 23;
    for (size, offset) in [(10usize, 0usize), (10, 1), (10, 2), (10, 3), (5, 4), (1, 22), (1, 23), (7, 100)] {
        let mut query = DiscoverQuery::new("gw");
        query.page_size = size;
        query.page_offset = offset;
        let expected = (n - (offset as i64) * (size as i64)).clamp(0, size as i64) as usize;
        let page = store.list_filtered(&query).await.unwrap();
        assert_eq!(page.len(), expected, "size={size} offset={offset}");
    }
}

#[tokio::test]
async fn test_discovery_filters_by_status_and_region() {
    let (store, _kv) = new_store();

    let a = store.register(gateway_entry("i-0001")).await.unwrap();

    let mut west = gateway_entry("i-0002");
    west.region = "us-west-2".to_string();
    store.register(west).await.unwrap();

    // Only A becomes healthy
    store.heartbeat(&a.service_uuid).await.unwrap();

    let mut by_status = DiscoverQuery::new("gw");
    by_status.status = ServiceStatus::Healthy;
    let healthy = store.list_filtered(&by_status).await.unwrap();
    assert_eq!(healthy.len(), 1);
    assert_eq!(healthy[0].service_uuid, a.service_uuid);

    let mut by_region = DiscoverQuery::new("gw");
    by_region.region = Some("us-west-2".to_string());
    let west_only = store.list_filtered(&by_region).await.unwrap();
    assert_eq!(west_only.len(), 1);
    assert_eq!(west_only[0].region, "us-west-2");
}

#[tokio::test]
async fn test_corrupt_record_does_not_fail_discovery_page() {
    let (store, kv) = new_store();

    store.register(gateway_entry("i-0001")).await.unwrap();

    // Plant garbage under a key the scan will match
    kv.set(
        "bad-uuid:x:gw:registered:aws:us-east-1:us-east-1a:vpc-12345678:subnet-87654321:i-9999:1.0.0",
        b"not json",
        ENTRY_TTL,
    )
    .await
    .unwrap();

    let found = store.list_filtered(&DiscoverQuery::new("gw")).await.unwrap();
    assert_eq!(found.len(), 1, "corrupt record skipped, good one returned");
}

#[tokio::test]
async fn test_suspicious_service_stays_suspicious() {
    let (store, kv) = new_store();

    let registered = store.register(gateway_entry("i-0001")).await.unwrap();
    let uuid = registered.service_uuid.clone();

    // External reporting path pushes the entry past tolerance
    let mut reported = registered.clone();
    reported.report_count = REPORT_TOLERANCE + 1;
    let key = waypost::registry::keys::entry_key(&reported);
    kv.set(&key, &serde_json::to_vec(&reported).unwrap(), ENTRY_TTL)
        .await
        .unwrap();

    let before = store.find_by_uuid(&uuid).await.unwrap().last_heard_at.clone();

    assert!(matches!(
        store.heartbeat(&uuid).await,
        Err(RegistryError::Suspicious(_))
    ));

    let flagged = store.find_by_uuid(&uuid).await.unwrap();
    assert_eq!(flagged.status, ServiceStatus::Suspicious);
    assert_eq!(flagged.last_heard_at, before);
    assert_eq!(flagged.heard_count, 0);

    // Suspicious entries are visible to a status-filtered discovery
    let mut query = DiscoverQuery::new("gw");
    query.status = ServiceStatus::Suspicious;
    assert_eq!(store.list_filtered(&query).await.unwrap().len(), 1);

    // Re-registration is the way back: deregister then register again
    assert!(store.deregister(&uuid).await.unwrap());
    let fresh = store.register(gateway_entry("i-0001")).await.unwrap();
    assert_eq!(fresh.status, ServiceStatus::Registered);
}
