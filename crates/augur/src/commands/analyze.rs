use crate::cli::AnalyzeArgs;
use augur_cache::{io::write_json_pretty, output_file};
use augur_cluster::FastEmbedder;
use augur_core::{Comment, Config, Likelihood};
use augur_llm::{build_backend, ProviderKind};
use augur_pipeline::{Pipeline, PipelineOutcome};
use augur_source::{load_comments, HackerNewsSource, DEFAULT_ITEM_ID};
use std::path::Path;

pub fn run(args: &AnalyzeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(config_path)?;
    args.apply(&mut config);
    config.validate()?;

    let kind = ProviderKind::from_name(&args.model)?;
    let backend = build_backend(kind, args.model_name.as_deref(), &config)?;

    let comments = load_input(args, &config)?;
    println!("Found {} comments", comments.len());

    let output_dir = config.output_dir.clone();
    let mut pipeline = Pipeline::from_config(backend, Box::new(FastEmbedder::new()), config)?;
    let outcome = pipeline.run(&comments);

    let path = match &args.output {
        Some(path) => path.clone(),
        None => output_file(&output_dir, pipeline.model_name()),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_json_pretty(&path, &outcome.result)?;
    println!("Results written to {}", path.display());

    println!();
    print!("{}", summary(comments.len(), &outcome));
    Ok(())
}

fn load_input(args: &AnalyzeArgs, config: &Config) -> anyhow::Result<Vec<Comment>> {
    if let Some(path) = &args.input {
        return Ok(load_comments(path)?);
    }
    let item = args.item.unwrap_or(DEFAULT_ITEM_ID);
    println!("Fetching comments for item {}...", item);
    let source = HackerNewsSource::new(config.request_timeout())?;
    Ok(source.fetch(item))
}

/// Run summary with per-category prediction counts
fn summary(fetched: usize, outcome: &PipelineOutcome) -> String {
    let mut out = String::new();
    out.push_str("Analysis complete!\n");
    out.push_str(&format!("Processed {} comments\n", fetched));
    out.push_str(&format!("Found {} non-noisy comments\n", outcome.filtered.len()));
    out.push_str(&format!("Extracted {} predictions\n", outcome.predictions.len()));
    out.push_str(&format!("Identified {} themes\n", outcome.result.themes.len()));
    for (category, count) in Likelihood::tally(&outcome.predictions) {
        out.push_str(&format!("  {:<9} {}\n", category.to_string(), count));
    }
    out
}
