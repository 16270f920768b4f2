//! Test helpers and builder patterns for engine tests
//!
//! Reduces boilerplate around wiring mocks and an in-memory store into a
//! `ProspectingEngine`.

use std::time::Duration;

use prospector::core::rate::RateGovernor;
use prospector::services::MemoryStore;
use prospector::traits::{MockCrmApi, MockEmailDiscoveryApi, MockNotificationSink, MockSearchApi};
use prospector::types::{IcpRow, IcpSnapshotEntry};
use prospector::{EngineConfig, ProspectingEngine};

use super::fixtures::TestFixtures;

pub type TestEngine = ProspectingEngine<
    MockSearchApi,
    MockEmailDiscoveryApi,
    MockCrmApi,
    MockNotificationSink,
    MemoryStore,
    MemoryStore,
    MemoryStore,
>;

/// Builder for test engines with sensible defaults and quiet mocks.
pub struct EngineBuilder {
    store: MemoryStore,
    governor: RateGovernor,
    search: MockSearchApi,
    emails: MockEmailDiscoveryApi,
    crm: MockCrmApi,
    sink: MockNotificationSink,
}

impl EngineBuilder {
    /// All mocks start permissive where failure would only add noise: the
    /// notification sink accepts anything, everything else expects explicit
    /// setup from the test.
    pub fn new() -> Self {
        let mut sink = MockNotificationSink::new();
        sink.expect_notify().returning(|_| Ok(())).times(0..);
        sink.expect_notify_text().returning(|_, _| Ok(())).times(0..);

        Self {
            store: MemoryStore::new(),
            governor: RateGovernor::new(),
            search: MockSearchApi::new(),
            emails: MockEmailDiscoveryApi::new(),
            crm: MockCrmApi::new(),
            sink,
        }
    }

    /// Share a store across builders to simulate consecutive runs against
    /// the same data.
    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_governor(mut self, governor: RateGovernor) -> Self {
        self.governor = governor;
        self
    }

    pub fn with_search<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockSearchApi),
    {
        setup(&mut self.search);
        self
    }

    pub fn with_emails<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockEmailDiscoveryApi),
    {
        setup(&mut self.emails);
        self
    }

    pub fn with_crm<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockCrmApi),
    {
        setup(&mut self.crm);
        self
    }

    /// Swap the permissive default sink for a fully custom one.
    pub fn with_sink(mut self, sink: MockNotificationSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }

    pub fn build(self) -> TestEngine {
        let config = EngineConfig {
            crm_list_id: TestFixtures::CRM_LIST_ID,
            // No throttling in tests.
            publish_delay: Duration::ZERO,
            ..EngineConfig::default()
        };
        ProspectingEngine::new(
            config,
            self.governor,
            self.search,
            self.emails,
            self.crm,
            self.sink,
            self.store.clone(),
            self.store.clone(),
            self.store,
        )
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestHelpers;

impl TestHelpers {
    /// Seed the ICP table of a store with the given rows.
    pub async fn seed_icp(store: &MemoryStore, rows: Vec<IcpRow>) {
        use prospector::traits::IcpStore;
        store.bulk_replace(rows).await.expect("seed ICP rows");
    }

    /// Serialize rows into the snapshot format leads carry.
    pub fn snapshot_json(rows: &[IcpRow]) -> String {
        let entries: Vec<IcpSnapshotEntry> = rows.iter().map(IcpSnapshotEntry::from).collect();
        serde_json::to_string(&entries).expect("serialize snapshot")
    }

    /// A CRM mock setup that accepts every contact and list add.
    pub fn accepting_crm(crm: &mut MockCrmApi) {
        let mut contact_id = 0u64;
        crm.expect_upsert_contact()
            .returning(move |_, _| {
                contact_id += 1;
                Ok(contact_id.to_string())
            })
            .times(0..);
        crm.expect_add_to_list().returning(|_, _| Ok(())).times(0..);
    }
}
