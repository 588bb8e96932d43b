// UBO Resolver - Core Library
// Exposes all modules for use in the CLI, the surrounding application, and tests

pub mod aggregation;  // Path Aggregator
pub mod cache;        // Lookup caches (get/put contract)
pub mod config;       // Resolver configuration
pub mod data_quality; // Disclosure completeness
pub mod db;           // SQLite-backed cache store
pub mod entities;     // Entity Models
pub mod error;        // TraceError / ProviderError
pub mod fallback;     // Fallback beneficial-owner tiers
pub mod listed;       // Listed-company registry
pub mod provider;     // Registry collaborators
pub mod ratio;        // Ratio Calculator
pub mod resolver;     // resolve() entry point
pub mod rules;        // Classification / title / person rules
pub mod walker;       // Ownership Graph Walker

// Re-export commonly used types
pub use aggregation::{Aggregation, OwnershipPath, PathAggregator, PathStep};
pub use cache::{LookupCache, MemoryCache, ProviderCaches};
pub use config::{ResolverConfig, APPROVED_STATUS};
pub use data_quality::{DisclosureChecker, DisclosureReport, QualityIssue, Severity};
pub use db::{open_provider_caches, setup_database, SqliteCache};
pub use entities::{
    BeneficialOwnerRecord, BusinessActivity, EdgeNote, Entity, EntityClass, EntityProfile,
    HolderRow, OwnershipEdge, RatioBasis, RawProfile,
};
pub use error::{DataKind, ProviderError, TraceError};
pub use fallback::FallbackEngine;
pub use listed::ListedRegistry;
pub use provider::{
    normalize_business_id, CachedProvider, FixtureEntity, FixtureProvider, RegistryProvider,
    RegistrySnapshot,
};
pub use ratio::RatioCalculator;
pub use resolver::{edge_fingerprint, OwnershipResolver, Resolution, ResolutionStatus};
pub use rules::{ClassificationRules, KeywordPersonDetector, PersonDetector, TitleRules};
pub use walker::{OwnershipWalker, TraversalOrder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
