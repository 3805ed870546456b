use augur_core::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "augur")]
#[command(version)]
#[command(about = "Extract and cluster predictions from Hacker News threads")]
pub struct Cli {
    /// JSON config file (defaults to ./augur.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis over a thread or a comment file
    Analyze(AnalyzeArgs),

    /// Fetch a thread and dump its normalised comments as JSON
    Fetch {
        /// Hacker News item id
        #[arg(long)]
        item: u64,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect or clear cached model responses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Entry counts and size per stage and model
    Stats,
    /// Remove cached entries
    Clear {
        /// Only entries for this model name, e.g. "openai/gpt-4-turbo-preview"
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Hacker News item id
    #[arg(long, conflicts_with = "input")]
    pub item: Option<u64>,

    /// Local JSON file of comments (strings or objects with `text`)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Provider: gemini, openai, groq, anthropic or ollama
    #[arg(long, default_value = "gemini")]
    pub model: String,

    /// Provider model name (provider default when omitted)
    #[arg(long)]
    pub model_name: Option<String>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Ignore and clear cached responses for this model
    #[arg(long)]
    pub force_rerun: bool,

    #[arg(long)]
    pub min_cluster_size: Option<usize>,

    #[arg(long)]
    pub max_recursion_depth: Option<usize>,

    /// Output file (defaults to <output_dir>/predictions_data_<model>.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl AnalyzeArgs {
    /// Flags given on the command line win over the config file
    pub fn apply(&self, config: &mut Config) {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(min_cluster_size) = self.min_cluster_size {
            config.min_cluster_size = min_cluster_size;
        }
        if let Some(depth) = self.max_recursion_depth {
            config.max_recursion_depth = depth;
        }
        if self.force_rerun {
            config.force_rerun = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::try_parse_from(["augur", "version"]);
        assert!(cli.is_ok());
        assert!(matches!(cli.unwrap().command, Commands::Version));
    }

    #[test]
    fn test_cli_parse_analyze_flags() {
        let cli = Cli::try_parse_from([
            "augur",
            "analyze",
            "--item",
            "42490343",
            "--model",
            "groq",
            "--batch-size",
            "10",
            "--force-rerun",
            "--max-recursion-depth",
            "2",
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("Expected Analyze command");
        };
        assert_eq!(args.item, Some(42490343));
        assert_eq!(args.model, "groq");
        assert!(args.force_rerun);

        let mut config = Config::new();
        args.apply(&mut config);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_recursion_depth, 2);
        assert_eq!(config.min_cluster_size, 2);
        assert!(config.force_rerun);
    }

    #[test]
    fn test_cli_item_and_input_conflict() {
        let cli = Cli::try_parse_from(["augur", "analyze", "--item", "1", "--input", "c.json"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_cache_clear_with_global_config() {
        let cli = Cli::try_parse_from([
            "augur",
            "cache",
            "clear",
            "--model",
            "openai/gpt-4o",
            "--config",
            "custom.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.json")));
        if let Commands::Cache {
            action: CacheAction::Clear { model },
        } = cli.command
        {
            assert_eq!(model.as_deref(), Some("openai/gpt-4o"));
        } else {
            panic!("Expected Cache Clear command");
        }
    }
}
