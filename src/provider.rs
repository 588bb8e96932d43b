// 🔌 Registry Providers - the four collaborator calls the engine consumes
//
// The engine never talks to a registry directly. It sees a
// RegistryProvider, usually a CachedProvider wrapped around whatever
// transport the surrounding application uses (API, browser automation,
// local snapshot).

use crate::cache::ProviderCaches;
use crate::entities::{EntityProfile, HolderRow, RawProfile, DEFAULT_PAR_VALUE};
use crate::error::ProviderError;
use crate::listed::ListedRegistry;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// ============================================================================
// PROVIDER CONTRACT
// ============================================================================

pub trait RegistryProvider: Send + Sync {
    /// Resolve a company name or identifier to its canonical identifier.
    fn resolve_identifier(&self, name_or_id: &str) -> ProviderResult<Option<String>>;

    /// Fetch the registry profile for an identifier.
    fn fetch_profile(&self, id: &str) -> ProviderResult<Option<EntityProfile>>;

    /// Fetch the director / supervisor / shareholder list for an identifier.
    fn fetch_holders(&self, id: &str) -> ProviderResult<Vec<HolderRow>>;

    /// Listed / OTC membership test by identifier or name.
    fn is_listed(&self, id: &str, name: &str) -> bool;
}

impl<P: RegistryProvider + ?Sized> RegistryProvider for &P {
    fn resolve_identifier(&self, name_or_id: &str) -> ProviderResult<Option<String>> {
        (**self).resolve_identifier(name_or_id)
    }

    fn fetch_profile(&self, id: &str) -> ProviderResult<Option<EntityProfile>> {
        (**self).fetch_profile(id)
    }

    fn fetch_holders(&self, id: &str) -> ProviderResult<Vec<HolderRow>> {
        (**self).fetch_holders(id)
    }

    fn is_listed(&self, id: &str, name: &str) -> bool {
        (**self).is_listed(id, name)
    }
}

/// Treat a 7-8 digit input as a business identifier, zero-padded to 8.
///
/// Returns None for anything that should be resolved by name instead.
pub fn normalize_business_id(input: &str) -> Option<String> {
    let key = input.trim();
    if (7..=8).contains(&key.len()) && key.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("{:0>8}", key))
    } else {
        None
    }
}

// ============================================================================
// CACHED PROVIDER
// ============================================================================

/// Consults the caller's caches before the inner provider. Successful
/// answers (including "not found") are stored; errors are not.
pub struct CachedProvider<P> {
    inner: P,
    caches: ProviderCaches,
}

impl<P: RegistryProvider> CachedProvider<P> {
    pub fn new(inner: P, caches: ProviderCaches) -> Self {
        CachedProvider { inner, caches }
    }

    pub fn caches(&self) -> &ProviderCaches {
        &self.caches
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: RegistryProvider> RegistryProvider for CachedProvider<P> {
    fn resolve_identifier(&self, name_or_id: &str) -> ProviderResult<Option<String>> {
        let key = name_or_id.trim();
        if key.is_empty() {
            return Ok(None);
        }
        // Identifiers never need a round trip
        if let Some(id) = normalize_business_id(key) {
            self.caches.identifiers.put(key.to_string(), Some(id.clone()));
            return Ok(Some(id));
        }
        if let Some(hit) = self.caches.identifiers.get(&key.to_string()) {
            return Ok(hit);
        }
        let resolved = self.inner.resolve_identifier(key)?;
        self.caches.identifiers.put(key.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn fetch_profile(&self, id: &str) -> ProviderResult<Option<EntityProfile>> {
        if let Some(hit) = self.caches.profiles.get(&id.to_string()) {
            return Ok(hit);
        }
        let profile = self.inner.fetch_profile(id)?;
        self.caches.profiles.put(id.to_string(), profile.clone());
        Ok(profile)
    }

    fn fetch_holders(&self, id: &str) -> ProviderResult<Vec<HolderRow>> {
        if let Some(hit) = self.caches.holders.get(&id.to_string()) {
            return Ok(hit);
        }
        let holders = self.inner.fetch_holders(id)?;
        self.caches.holders.put(id.to_string(), holders.clone());
        Ok(holders)
    }

    fn is_listed(&self, id: &str, name: &str) -> bool {
        self.inner.is_listed(id, name)
    }
}

// ============================================================================
// FIXTURE PROVIDER
// ============================================================================

/// One company as stored in a registry snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureEntity {
    pub id: String,
    pub name: String,

    /// Registry profile as scraped (display strings). None = no profile data.
    #[serde(default)]
    pub profile: Option<RawProfile>,

    #[serde(default)]
    pub holders: Vec<HolderRow>,

    #[serde(default)]
    pub listed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub entities: Vec<FixtureEntity>,
}

/// In-memory registry snapshot. Backs the CLI and the test suites.
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    by_id: HashMap<String, FixtureEntity>,
    by_name: HashMap<String, String>,
    listed: ListedRegistry,
    default_par: Decimal,
}

impl FixtureProvider {
    pub fn new() -> Self {
        FixtureProvider {
            by_id: HashMap::new(),
            by_name: HashMap::new(),
            listed: ListedRegistry::new(),
            default_par: DEFAULT_PAR_VALUE,
        }
    }

    /// Load a registry snapshot from JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read registry snapshot: {:?}", path.as_ref()))?;

        let snapshot: RegistrySnapshot =
            serde_json::from_str(&content).context("Failed to parse registry snapshot JSON")?;

        Ok(FixtureProvider::from_snapshot(snapshot))
    }

    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        let mut provider = FixtureProvider::new();
        for entity in snapshot.entities {
            provider.add(entity);
        }
        provider
    }

    pub fn with_default_par(mut self, par: Decimal) -> Self {
        self.default_par = par;
        self
    }

    /// Merge an external listed-company registry
    pub fn with_listed(mut self, listed: ListedRegistry) -> Self {
        let mut merged = listed;
        for entity in self.by_id.values().filter(|e| e.listed) {
            listed_insert(&mut merged, entity);
        }
        self.listed = merged;
        self
    }

    pub fn add(&mut self, entity: FixtureEntity) {
        if entity.listed {
            listed_insert(&mut self.listed, &entity);
        }
        self.by_name
            .insert(entity.name.trim().to_string(), entity.id.clone());
        self.by_id.insert(entity.id.clone(), entity);
    }

    /// Builder-style helper: company with a normalised profile and holders
    pub fn company(
        mut self,
        id: &str,
        name: &str,
        profile: Option<RawProfile>,
        holders: Vec<HolderRow>,
    ) -> Self {
        self.add(FixtureEntity {
            id: id.to_string(),
            name: name.to_string(),
            profile,
            holders,
            listed: false,
        });
        self
    }

    pub fn listed_company(mut self, id: &str, name: &str) -> Self {
        self.add(FixtureEntity {
            id: id.to_string(),
            name: name.to_string(),
            profile: None,
            holders: Vec::new(),
            listed: true,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for FixtureProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn listed_insert(listed: &mut ListedRegistry, entity: &FixtureEntity) {
    listed.insert(&entity.id, &entity.name);
}

impl RegistryProvider for FixtureProvider {
    fn resolve_identifier(&self, name_or_id: &str) -> ProviderResult<Option<String>> {
        let key = name_or_id.trim();
        if let Some(id) = normalize_business_id(key) {
            return Ok(Some(id));
        }
        Ok(self.by_name.get(key).cloned())
    }

    fn fetch_profile(&self, id: &str) -> ProviderResult<Option<EntityProfile>> {
        Ok(self.by_id.get(id).and_then(|entity| {
            entity.profile.as_ref().map(|raw| {
                let mut profile = raw.normalize(self.default_par);
                if profile.name.is_empty() {
                    profile.name = entity.name.clone();
                }
                profile
            })
        }))
    }

    fn fetch_holders(&self, id: &str) -> ProviderResult<Vec<HolderRow>> {
        Ok(self
            .by_id
            .get(id)
            .map(|entity| entity.holders.clone())
            .unwrap_or_default())
    }

    fn is_listed(&self, id: &str, name: &str) -> bool {
        self.listed.contains(id, name)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        inner: FixtureProvider,
        calls: AtomicUsize,
        fail_holders: bool,
    }

    impl RegistryProvider for CountingProvider {
        fn resolve_identifier(&self, name_or_id: &str) -> ProviderResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve_identifier(name_or_id)
        }

        fn fetch_profile(&self, id: &str) -> ProviderResult<Option<EntityProfile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_profile(id)
        }

        fn fetch_holders(&self, id: &str) -> ProviderResult<Vec<HolderRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_holders {
                return Err(ProviderError::Timeout { millis: 15000 });
            }
            self.inner.fetch_holders(id)
        }

        fn is_listed(&self, id: &str, name: &str) -> bool {
            self.inner.is_listed(id, name)
        }
    }

    fn sample() -> FixtureProvider {
        FixtureProvider::new().company(
            "12345678",
            "甲投資股份有限公司",
            Some(RawProfile {
                status: Some("核准設立".to_string()),
                issued_shares: Some("1,000".to_string()),
                ..Default::default()
            }),
            vec![HolderRow::individual("董事長", "王大明", Some(Decimal::from(600)))],
        )
    }

    #[test]
    fn test_normalize_business_id() {
        assert_eq!(normalize_business_id("1234567"), Some("01234567".to_string()));
        assert_eq!(normalize_business_id(" 12345678 "), Some("12345678".to_string()));
        assert_eq!(normalize_business_id("123456"), None);
        assert_eq!(normalize_business_id("甲投資股份有限公司"), None);
    }

    #[test]
    fn test_fixture_provider_lookups() {
        let provider = sample();

        assert_eq!(
            provider.resolve_identifier("甲投資股份有限公司").unwrap(),
            Some("12345678".to_string())
        );
        assert_eq!(provider.resolve_identifier("Nowhere Ltd").unwrap(), None);

        let profile = provider.fetch_profile("12345678").unwrap().unwrap();
        assert_eq!(profile.name, "甲投資股份有限公司");
        assert_eq!(profile.issued_shares, Some(Decimal::from(1000)));

        assert_eq!(provider.fetch_holders("12345678").unwrap().len(), 1);
        assert!(provider.fetch_holders("99999999").unwrap().is_empty());
    }

    #[test]
    fn test_cached_provider_avoids_repeat_calls() {
        let counting = CountingProvider {
            inner: sample(),
            calls: AtomicUsize::new(0),
            fail_holders: false,
        };
        let cached = CachedProvider::new(counting, ProviderCaches::in_memory());

        for _ in 0..3 {
            cached.resolve_identifier("甲投資股份有限公司").unwrap();
            cached.fetch_profile("12345678").unwrap();
            cached.fetch_holders("12345678").unwrap();
        }
        // not-found answers are cached too
        cached.resolve_identifier("Nowhere Ltd").unwrap();
        cached.resolve_identifier("Nowhere Ltd").unwrap();

        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 4);
        assert_eq!(cached.caches().identifiers.get(&"Nowhere Ltd".to_string()), Some(None));
    }

    #[test]
    fn test_cached_provider_does_not_cache_errors() {
        let counting = CountingProvider {
            inner: sample(),
            calls: AtomicUsize::new(0),
            fail_holders: true,
        };
        let cached = CachedProvider::new(counting, ProviderCaches::in_memory());

        assert!(cached.fetch_holders("12345678").is_err());
        assert!(cached.fetch_holders("12345678").is_err());

        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
        assert!(cached.caches().holders.is_empty());
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "entities": [
                {
                    "id": "12345678",
                    "name": "甲投資股份有限公司",
                    "profile": { "status": "核准設立", "issued_shares": "1,000" },
                    "holders": [
                        { "title": "董事長", "person_name": "王大明", "held_shares": 600 }
                    ]
                },
                { "id": "22099131", "name": "台灣積體電路製造股份有限公司", "listed": true }
            ]
        }"#;

        let snapshot: RegistrySnapshot = serde_json::from_str(json).unwrap();
        let provider = FixtureProvider::from_snapshot(snapshot);

        assert_eq!(provider.len(), 2);
        assert!(provider.is_listed("22099131", ""));
        assert!(!provider.is_listed("12345678", "甲投資股份有限公司"));
        assert_eq!(provider.fetch_profile("22099131").unwrap(), None);
        let holders = provider.fetch_holders("12345678").unwrap();
        assert_eq!(holders[0].held_shares, Some(Decimal::from(600)));
        assert_eq!(holders[0].represented_entity, "");
    }
}
