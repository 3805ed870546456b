use augur_cache::io::write_json_pretty;
use augur_core::Config;
use augur_source::HackerNewsSource;
use std::path::Path;

pub fn run(item: u64, output: Option<&Path>, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path)?;
    let source = HackerNewsSource::new(config.request_timeout())?;
    let comments = source.try_fetch(item)?;

    match output {
        Some(path) => {
            write_json_pretty(path, &comments)?;
            println!("Wrote {} comments to {}", comments.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&comments)?),
    }
    Ok(())
}
