use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ubo_resolver::{
    open_provider_caches, CachedProvider, FixtureProvider, ListedRegistry, OwnershipResolver,
    ProviderCaches, Resolution, ResolverConfig, VERSION,
};

const USAGE: &str = "usage: ubo-resolver resolve <registry.json> <seed> [--config <cfg.json>] [--listed <listed.csv>] [--cache <cache.db>] [--json]";

struct ResolveArgs {
    registry: PathBuf,
    seed: String,
    config: Option<PathBuf>,
    listed: Option<PathBuf>,
    cache: Option<PathBuf>,
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("resolve") => run_resolve(parse_resolve_args(&args[2..])?),
        Some("--version") => {
            println!("ubo-resolver {}", VERSION);
            Ok(())
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn parse_resolve_args(args: &[String]) -> Result<ResolveArgs> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut listed = None;
    let mut cache = None;
    let mut json = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config = Some(flag_value(&mut iter, "--config")?),
            "--listed" => listed = Some(flag_value(&mut iter, "--listed")?),
            "--cache" => cache = Some(flag_value(&mut iter, "--cache")?),
            "--json" => json = true,
            other => positional.push(other.to_string()),
        }
    }

    let [registry, seed] = positional.as_slice() else {
        bail!("{}", USAGE);
    };

    Ok(ResolveArgs {
        registry: PathBuf::from(registry),
        seed: seed.clone(),
        config,
        listed,
        cache,
        json,
    })
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<PathBuf> {
    iter.next()
        .map(PathBuf::from)
        .with_context(|| format!("{} needs a path", flag))
}

fn run_resolve(args: ResolveArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => ResolverConfig::from_file(path)?,
        None => ResolverConfig::default(),
    };

    let mut registry = FixtureProvider::from_file(&args.registry)?
        .with_default_par(config.default_par_value);
    if let Some(path) = &args.listed {
        registry = registry.with_listed(ListedRegistry::from_csv(path)?);
    }

    let caches = match &args.cache {
        Some(path) => open_provider_caches(path)?,
        None => ProviderCaches::in_memory(),
    };

    let resolver = OwnershipResolver::new(CachedProvider::new(registry, caches), config);
    let resolution = resolver.resolve(&args.seed);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        print_summary(&resolution);
    }

    Ok(())
}

fn print_summary(resolution: &Resolution) {
    println!("🔎 Beneficial owners of {}", resolution.seed);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if let Some(entity) = &resolution.seed_entity {
        println!("✓ {} [{}] {}", entity.name(), entity.id, entity.classification.as_str());
    }
    println!("✓ Status: {}", resolution.status.as_str());
    println!("✓ Edges: {}", resolution.edges.len());

    if !resolution.calculation_log.is_empty() {
        println!("\n🧮 Calculation:");
        for line in &resolution.calculation_log {
            println!("{}", line);
        }
    }

    println!("\n👤 Beneficial owners:");
    if resolution.beneficial_owners.is_empty() {
        println!("   (none)");
    }
    for owner in &resolution.beneficial_owners {
        println!("   {} - {}", owner.kind(), owner);
    }

    for warning in &resolution.warnings {
        println!("\n{}", warning);
    }

    println!("\nrun {} · fingerprint {}", resolution.run_id, &resolution.fingerprint[..12]);
}
