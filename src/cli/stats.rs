use anyhow::Result;

use hipai::config::HipaiConfig;

/// Print every collection in the store with its record count.
pub fn stats(config: &HipaiConfig) -> Result<()> {
    let store_path = config.resolved_store_path();
    if !store_path.exists() {
        println!("No store at {}", store_path.display());
        return Ok(());
    }
    let repository = hipai::server::open_repository(config)?;
    let collections = repository.stats()?;

    println!("Store: {}", store_path.display());
    println!("{}", "=".repeat(40));
    if collections.is_empty() {
        println!("  (no collections)");
        return Ok(());
    }
    for info in &collections {
        let marker = if info.name == repository.collection() { "*" } else { " " };
        println!(
            "{marker} {:<32} {:>8} records  ({} dims, created {})",
            info.name, info.count, info.dimensions, info.created_at
        );
    }
    println!();
    println!("* configured collection (mode: {})", repository.mode());
    Ok(())
}
