//! Test helpers
//!
//! In-memory repositories, a scriptable DNS provider and factories building
//! a ready [`ServiceContext`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use happydomain_provider::{
    DnsProvider, ProviderCapabilities, ProviderError, ProviderFactory, ProviderMetadata,
    ProviderTypeRegistry, Record, RecordChange, RecordData, normalize,
};
use tokio::sync::RwLock;

use crate::catalog::ServiceCatalog;
use crate::error::{CoreError, CoreResult};
use crate::services::{CoreOptions, DomainService, Orchestrator, ServiceContext};
use crate::traits::{
    DomainLogRepository, DomainRepository, InMemoryProviderInstanceCache, ProviderRepository,
    Repositories, UserRepository, ZoneRepository,
};
use crate::types::{
    CreateDomainRequest, Domain, DomainLog, Identifier, Provider, User, Zone,
};

// ===== MockStore =====

/// Every repository in one in-memory store.
#[derive(Default)]
pub struct MockStore {
    users: RwLock<HashMap<Identifier, User>>,
    providers: RwLock<HashMap<Identifier, Provider>>,
    domains: RwLock<HashMap<Identifier, Domain>>,
    zones: RwLock<HashMap<Identifier, Zone>>,
    /// Insertion order
    logs: RwLock<Vec<DomainLog>>,
    /// If Some, every write returns this error
    save_error: RwLock<Option<String>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_save_error(&self, err: Option<String>) {
        *self.save_error.write().await = err;
    }

    async fn check_write(&self) -> CoreResult<()> {
        match &*self.save_error.read().await {
            Some(msg) => Err(CoreError::StorageError(msg.clone())),
            None => Ok(()),
        }
    }

    pub async fn add_user(&self, email: &str) -> User {
        let user = User::new(email);
        self.users.write().await.insert(user.id.clone(), user.clone());
        user
    }
}

#[async_trait]
impl UserRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn save(&self, user: &User) -> CoreResult<()> {
        self.check_write().await?;
        self.users.write().await.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> CoreResult<()> {
        self.users.write().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ProviderRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<Provider>> {
        Ok(self.providers.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Provider>> {
        Ok(self.providers.read().await.get(id).cloned())
    }

    async fn find_by_owner(&self, owner: &Identifier) -> CoreResult<Vec<Provider>> {
        Ok(self
            .providers
            .read()
            .await
            .values()
            .filter(|p| &p.owner == owner)
            .cloned()
            .collect())
    }

    async fn save(&self, provider: &Provider) -> CoreResult<()> {
        self.check_write().await?;
        self.providers
            .write()
            .await
            .insert(provider.id.clone(), provider.clone());
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> CoreResult<()> {
        self.providers.write().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl DomainRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<Domain>> {
        Ok(self.domains.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Domain>> {
        Ok(self.domains.read().await.get(id).cloned())
    }

    async fn find_by_owner(&self, owner: &Identifier) -> CoreResult<Vec<Domain>> {
        Ok(self
            .domains
            .read()
            .await
            .values()
            .filter(|d| &d.owner == owner)
            .cloned()
            .collect())
    }

    async fn save(&self, domain: &Domain) -> CoreResult<()> {
        self.check_write().await?;
        self.domains
            .write()
            .await
            .insert(domain.id.clone(), domain.clone());
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> CoreResult<()> {
        self.domains.write().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ZoneRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<Zone>> {
        Ok(self.zones.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &Identifier) -> CoreResult<Option<Zone>> {
        Ok(self.zones.read().await.get(id).cloned())
    }

    async fn create(&self, zone: &mut Zone) -> CoreResult<()> {
        self.check_write().await?;
        zone.meta.id = Identifier::random();
        self.zones
            .write()
            .await
            .insert(zone.meta.id.clone(), zone.clone());
        Ok(())
    }

    async fn update(&self, zone: &Zone) -> CoreResult<()> {
        self.check_write().await?;
        self.zones
            .write()
            .await
            .insert(zone.meta.id.clone(), zone.clone());
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> CoreResult<()> {
        self.zones.write().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl DomainLogRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<DomainLog>> {
        Ok(self.logs.read().await.clone())
    }

    async fn find_by_domain(&self, domain_id: &Identifier) -> CoreResult<Vec<DomainLog>> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .rev()
            .filter(|l| &l.domain_id == domain_id)
            .cloned()
            .collect())
    }

    async fn append(&self, log: &DomainLog) -> CoreResult<()> {
        self.check_write().await?;
        self.logs.write().await.push(log.clone());
        Ok(())
    }

    async fn update(&self, log: &DomainLog) -> CoreResult<()> {
        self.check_write().await?;
        let mut logs = self.logs.write().await;
        match logs.iter_mut().find(|l| l.id == log.id) {
            Some(existing) => *existing = log.clone(),
            None => logs.push(log.clone()),
        }
        Ok(())
    }

    async fn delete(&self, domain_id: &Identifier, id: &Identifier) -> CoreResult<()> {
        self.logs
            .write()
            .await
            .retain(|l| !(&l.domain_id == domain_id && &l.id == id));
        Ok(())
    }

    async fn delete_by_domain(&self, domain_id: &Identifier) -> CoreResult<()> {
        self.logs
            .write()
            .await
            .retain(|l| &l.domain_id != domain_id);
        Ok(())
    }
}

// ===== MockDnsProvider =====

pub const MOCK_PROVIDER: &str = "mock";

/// Provider keeping zones in memory. Changes touching a failing owner are
/// rejected.
pub struct MockDnsProvider {
    zones: RwLock<BTreeMap<String, Vec<Record>>>,
    failing_owners: RwLock<HashSet<String>>,
    applied: RwLock<Vec<RecordChange>>,
    can_create_domain: AtomicBool,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            zones: RwLock::new(BTreeMap::new()),
            failing_owners: RwLock::new(HashSet::new()),
            applied: RwLock::new(Vec::new()),
            can_create_domain: AtomicBool::new(true),
        }
    }

    /// SOA and two name servers at the apex
    pub fn apex_records(zone: &str) -> Vec<Record> {
        let zone = normalize(zone);
        vec![
            Record::new(
                zone.clone(),
                3600,
                RecordData::SOA {
                    mname: format!("ns1.{zone}"),
                    rname: format!("hostmaster.{zone}"),
                    serial: 2_024_010_101,
                    refresh: 7200,
                    retry: 3600,
                    expire: 1_209_600,
                    minimum: 300,
                },
            ),
            Record::new(
                zone.clone(),
                3600,
                RecordData::NS {
                    nameserver: format!("ns1.{zone}"),
                },
            ),
            Record::new(
                zone.clone(),
                3600,
                RecordData::NS {
                    nameserver: format!("ns2.{zone}"),
                },
            ),
            Record::new(
                format!("ns1.{zone}"),
                3600,
                RecordData::A {
                    address: Ipv4Addr::new(192, 0, 2, 53),
                },
            ),
        ]
    }

    pub async fn set_zone(&self, zone: &str, records: Vec<Record>) {
        self.zones.write().await.insert(normalize(zone), records);
    }

    /// Seed `zone` with its apex records unless it already exists
    pub async fn ensure_zone(&self, zone: &str) {
        self.zones
            .write()
            .await
            .entry(normalize(zone))
            .or_insert_with(|| Self::apex_records(zone));
    }

    pub async fn push_record(&self, zone: &str, record: Record) {
        self.ensure_zone(zone).await;
        if let Some(records) = self.zones.write().await.get_mut(&normalize(zone)) {
            records.push(record);
        }
    }

    pub async fn zone(&self, zone: &str) -> Option<Vec<Record>> {
        self.zones.read().await.get(&normalize(zone)).cloned()
    }

    pub async fn fail_on(&self, owner: &str) {
        self.failing_owners.write().await.insert(normalize(owner));
    }

    pub async fn applied(&self) -> Vec<RecordChange> {
        self.applied.read().await.clone()
    }

    pub fn set_can_create_domain(&self, enabled: bool) {
        self.can_create_domain.store(enabled, Ordering::SeqCst);
    }

    fn not_found(zone: &str) -> ProviderError {
        ProviderError::DomainNotFound {
            provider: MOCK_PROVIDER.to_string(),
            domain: zone.to_string(),
            raw_message: None,
        }
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    fn id(&self) -> &'static str {
        MOCK_PROVIDER
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: MOCK_PROVIDER.to_string(),
            name: "Mock".to_string(),
            description: "In-memory provider".to_string(),
            required_fields: Vec::new(),
            capabilities: ProviderCapabilities {
                list_zones: true,
                create_domain: true,
                record_types: Vec::new(),
            },
        }
    }

    fn can_list_zones(&self) -> bool {
        true
    }

    fn can_create_domain(&self) -> bool {
        self.can_create_domain.load(Ordering::SeqCst)
    }

    fn supports_record_type(&self, _rtype: &str) -> bool {
        true
    }

    async fn validate_credentials(&self) -> happydomain_provider::Result<bool> {
        Ok(true)
    }

    async fn list_zones(&self) -> happydomain_provider::Result<Vec<String>> {
        Ok(self.zones.read().await.keys().cloned().collect())
    }

    async fn create_domain(&self, fqdn: &str) -> happydomain_provider::Result<()> {
        self.ensure_zone(fqdn).await;
        Ok(())
    }

    async fn get_zone_records(&self, fqdn: &str) -> happydomain_provider::Result<Vec<Record>> {
        self.zone(fqdn).await.ok_or_else(|| Self::not_found(fqdn))
    }

    async fn apply_change(
        &self,
        zone: &str,
        change: &RecordChange,
    ) -> happydomain_provider::Result<()> {
        if self.failing_owners.read().await.contains(&change.owner) {
            return Err(ProviderError::InvalidParameter {
                provider: MOCK_PROVIDER.to_string(),
                param: "name".to_string(),
                detail: format!("{} is rejected", change.owner),
            });
        }

        let zone = normalize(zone);
        let mut zones = self.zones.write().await;
        let records = zones.get_mut(&zone).ok_or_else(|| Self::not_found(&zone))?;
        for old in &change.old {
            if let Some(pos) = records.iter().position(|r| r.normalized(&zone) == *old) {
                records.remove(pos);
            }
        }
        records.extend(change.new.iter().cloned());
        drop(zones);

        self.applied.write().await.push(change.clone());
        Ok(())
    }
}

// ===== Factories =====

/// Context over a fresh store, with the `mock` backend type bound to the
/// returned provider
pub fn create_test_context_with(
    options: CoreOptions,
) -> (Arc<ServiceContext>, Arc<MockStore>, Arc<MockDnsProvider>) {
    let store = Arc::new(MockStore::new());
    let dns = Arc::new(MockDnsProvider::new());

    let mut registry = ProviderTypeRegistry::new();
    let shared = Arc::clone(&dns);
    registry
        .register(ProviderFactory::new(
            MockDnsProvider::metadata(),
            Box::new(move |_| Ok(Arc::clone(&shared) as Arc<dyn DnsProvider>)),
        ))
        .unwrap();

    let ctx = Arc::new(ServiceContext::new(
        Repositories::from_store(Arc::clone(&store)),
        Arc::new(registry),
        Arc::new(ServiceCatalog::with_builtin_services()),
        Arc::new(InMemoryProviderInstanceCache::new()),
        options,
    ));
    (ctx, store, dns)
}

pub fn create_test_context() -> (Arc<ServiceContext>, Arc<MockStore>, Arc<MockDnsProvider>) {
    create_test_context_with(CoreOptions::default())
}

/// A user owning one `mock` provider
pub struct TestEnv {
    pub ctx: Arc<ServiceContext>,
    pub store: Arc<MockStore>,
    pub dns: Arc<MockDnsProvider>,
    pub user: User,
    pub provider: Provider,
}

impl TestEnv {
    pub async fn new() -> Self {
        let (ctx, store, dns) = create_test_context();
        let user = store.add_user("alice@example.com").await;
        let provider = Provider {
            id: Identifier::random(),
            owner: user.id.clone(),
            provider_type: MOCK_PROVIDER.to_string(),
            comment: "test".to_string(),
            payload: serde_json::json!({}),
        };
        ProviderRepository::save(store.as_ref(), &provider)
            .await
            .unwrap();
        Self {
            ctx,
            store,
            dns,
            user,
            provider,
        }
    }

    pub async fn other_user(&self) -> User {
        self.store.add_user("mallory@example.com").await
    }

    /// Register `name` and import its live zone
    pub async fn import_domain(&self, name: &str) -> Domain {
        self.dns.ensure_zone(name).await;
        let domain = DomainService::new(self.ctx.clone())
            .create_domain(
                &self.user,
                CreateDomainRequest {
                    provider_id: self.provider.id.clone(),
                    name: name.to_string(),
                    group: None,
                },
            )
            .await
            .unwrap();
        Orchestrator::new(self.ctx.clone())
            .import_from_remote(&self.user, &domain.id)
            .await
            .unwrap();
        self.reload_domain(&domain.id).await
    }

    pub async fn reload_domain(&self, id: &Identifier) -> Domain {
        DomainRepository::find_by_id(self.store.as_ref(), id)
            .await
            .unwrap()
            .unwrap()
    }
}
