use anyhow::{bail, ensure, Context, Result};
use disinherit_engine::{Disinheritor, EngineConfig, EngineStats};
use disinherit_types::{Catalog, TypeRef};
use stress_test::{stress_test_derivations, stress_test_scaling};
use tracing::info;
use tracing_subscriber::EnvFilter;


const USAGE: &str = "usage: disinherit [catalog.json [ROOT [NAME...]]]";

/// Default member removed when only a catalog or a root is given.
const DEFAULT_MEMBER: &str = "__getattr__";

const FRAMES: &str = r#"{
    "types": [
        { "name": "PandasObject", "members": { "__repr__": {} } },
        { "name": "NDFrame", "bases": ["PandasObject"],
          "members": { "__getattr__": { "kind": "hook" }, "shape": { "kind": "property" } } },
        { "name": "DataFrame", "bases": ["NDFrame"], "members": { "plot": {} } },
        { "name": "GeoPandasBase", "members": { "area": { "kind": "property" } } },
        { "name": "GeoDataFrame", "bases": ["GeoPandasBase", "DataFrame"] }
    ]
}"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.split_first() {
        None => {
            frames_demo(config)?;
            run_stress_tests();
            Ok(())
        }
        Some((flag, _)) if flag == "-h" || flag == "--help" => {
            println!("{}", USAGE);
            Ok(())
        }
        Some((path, rest)) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read catalog {}", path))?;
            let catalog = Catalog::from_json(&json).with_context(|| format!("invalid catalog {}", path))?;
            derive_from_catalog(&catalog, rest, config)
        }
    }
}

/// Engine configuration from the file named by `DISINHERIT_CONFIG`, if set.
fn load_config() -> Result<EngineConfig> {
    match std::env::var("DISINHERIT_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read engine config {}", path))?;
            Ok(EngineConfig::from_json(&json)?)
        }
        Err(_) => Ok(EngineConfig::default()),
    }
}

fn derive_from_catalog(catalog: &Catalog, args: &[String], config: EngineConfig) -> Result<()> {
    let mut disinheritor = Disinheritor::with_config(config);
    info!(types = catalog.len(), "catalog loaded");

    let roots: Vec<TypeRef> = match args.first() {
        Some(name) => match catalog.get(name) {
            Some(node) => vec![node.clone()],
            None => bail!("no type named {} in catalog", name),
        },
        None => catalog.leaves(),
    };
    let names: Vec<String> = if args.len() > 1 {
        args[1..].to_vec()
    } else {
        vec![DEFAULT_MEMBER.to_string()]
    };

    for root in &roots {
        let derivation = disinheritor
            .derive(root, names.clone())
            .with_context(|| format!("failed to derive {}", root))?;

        println!("{} without {}", root, derivation.exclusion);
        println!("  before: {}", format_mro(root));
        println!("  after:  {}", format_mro(&derivation.root));
        if derivation.is_identity(root) {
            println!("  (unchanged)");
        }
    }

    print_stats(&disinheritor.stats());
    Ok(())
}

fn frames_demo(config: EngineConfig) -> Result<()> {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║            FRAMES DEMO                                      ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let catalog = Catalog::from_json(FRAMES)?;
    let frame = catalog.get("DataFrame").context("DataFrame missing")?;
    let geo = catalog.get("GeoDataFrame").context("GeoDataFrame missing")?;

    let mut disinheritor = Disinheritor::with_config(config);
    let quiet_frame = disinheritor.remove_members(frame, DEFAULT_MEMBER)?;
    let quiet_geo = disinheritor.remove_members(geo, DEFAULT_MEMBER)?;

    println!("\n  DataFrame:    {}", format_mro(&quiet_frame));
    println!("  GeoDataFrame: {}", format_mro(&quiet_geo));

    ensure!(!quiet_frame.has_member(DEFAULT_MEMBER), "DataFrame still resolves {}", DEFAULT_MEMBER);
    ensure!(!quiet_geo.has_member(DEFAULT_MEMBER), "GeoDataFrame still resolves {}", DEFAULT_MEMBER);
    ensure!(frame.has_member(DEFAULT_MEMBER), "original DataFrame was modified");
    ensure!(quiet_geo.has_member("area") && quiet_geo.has_member("plot"), "unrelated members lost");
    ensure!(
        quiet_geo.mro()[2] == quiet_frame,
        "GeoDataFrame does not share the derived DataFrame"
    );
    ensure!(
        quiet_geo.mro()[1] == geo.mro()[1],
        "untouched GeoPandasBase was rebuilt"
    );

    print_stats(&disinheritor.stats());
    Ok(())
}

fn run_stress_tests() {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            DERIVATION STRESS TESTS                          ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let stats = stress_test_derivations(200, 4, 42);
    stats.print();

    let stats = stress_test_derivations(2000, 8, 7);
    stats.print();

    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS                                   ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(5000, 1000);

    println!("\n✓ All stress tests completed successfully!");
}

fn format_mro(node: &TypeRef) -> String {
    node.mro()
        .iter()
        .map(|n| format!("{}{}", n.name(), n.id()))
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn print_stats(stats: &EngineStats) {
    match serde_json::to_string_pretty(stats) {
        Ok(json) => println!("\n{}", json),
        Err(e) => println!("\nstats unavailable: {}", e),
    }
}
