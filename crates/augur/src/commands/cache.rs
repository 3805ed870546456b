use augur_cache::{resolve_cache_dir, CacheStats, CacheStore};
use augur_core::Config;
use std::path::Path;

fn open_store(config_path: Option<&Path>) -> anyhow::Result<CacheStore> {
    let config = Config::load_or_default(config_path)?;
    Ok(CacheStore::open(resolve_cache_dir(config.cache_dir.as_deref()))?)
}

pub fn run_stats(config_path: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(config_path)?;
    let stats = store.stats()?;
    print!("{}", render_stats(&store, &stats));
    Ok(())
}

pub fn run_clear(model: Option<&str>, config_path: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(config_path)?;
    let removed = store.clear(model)?;
    match model {
        Some(model) => println!("Removed {} cache entries for {}", removed, model),
        None => println!("Removed {} cache entries", removed),
    }
    Ok(())
}

fn render_stats(store: &CacheStore, stats: &CacheStats) -> String {
    let mut out = format!("Cache: {}\n", store.dir().display());
    out.push_str(&format!(
        "Entries: {} ({:.1} KiB)\n",
        stats.entries,
        stats.total_bytes as f64 / 1024.0
    ));
    if stats.entries == 0 {
        return out;
    }
    out.push_str("By stage:\n");
    for (stage, count) in &stats.by_stage {
        out.push_str(&format!("  {:<12} {}\n", stage.to_string(), count));
    }
    out.push_str("By model:\n");
    for (model, count) in &stats.by_model {
        out.push_str(&format!("  {:<12} {}\n", model, count));
    }
    out
}
