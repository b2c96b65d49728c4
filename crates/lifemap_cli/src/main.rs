//! `lifemap` command-line launcher.
//!
//! # Responsibility
//! - Merge config file values with command-line overrides.
//! - Load the tree once and dispatch to generate, item, search, summary,
//!   validate or export.
//!
//! # Invariants
//! - Fatal errors print one line to stderr and exit with status 1.
//! - `validate` exits with status 1 when any diagnostic is found.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use lifemap_core::{
    classify, default_log_level, init_logging, load_tree, search_nodes, write_exports, DueBucket,
    GeneratedPage, LoadOutcome, MarkdownRoot, SearchQuery, SiteConfig, SiteGenerator,
    SourceConfig,
};
use log::info;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "lifemap",
    version,
    about = "Render a personal knowledge tree into static HTML pages"
)]
struct Cli {
    /// YAML config file with source, output and depth settings
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Load the tree from a YAML structure file
    #[arg(long, value_name = "PATH", global = true, conflicts_with = "markdown_root")]
    structure: Option<PathBuf>,

    /// Load the tree from a markdown directory (repeatable)
    #[arg(long = "markdown-root", value_name = "DIR", global = true)]
    markdown_root: Vec<PathBuf>,

    /// Output directory for pages and exports
    #[arg(long, value_name = "DIR", global = true)]
    out: Option<PathBuf>,

    /// Levels shown below each page's node
    #[arg(long, global = true)]
    depth: Option<usize>,

    /// Date used for due classification (defaults to the local date)
    #[arg(long, value_name = "YYYY-MM-DD", global = true, value_parser = parse_today)]
    today: Option<NaiveDate>,

    /// Leave the time buckets off the root page
    #[arg(long, global = true)]
    no_time_buckets: bool,

    /// trace|debug|info|warn|error|off
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Write rolling log files into this absolute directory instead of stderr
    #[arg(long, value_name = "DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Regenerate every page (default)
    Generate,
    /// Regenerate one page (also accepted as `item:<id>`)
    Item { id: String },
    /// Substring search over title, context and id
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Print node counts per level and due buckets
    Summary,
    /// Print load diagnostics; exit 1 when any exist
    Validate,
    /// Write structure.yaml, structure.json and file_mapping.json
    Export,
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Rewrites the `item:<id>` shorthand into `item <id>`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .flat_map(|arg| match arg.to_str().and_then(|text| text.strip_prefix("item:")) {
            Some(id) => vec![OsString::from("item"), OsString::from(id)],
            None => vec![arg],
        })
        .collect()
}

fn parse_today(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;
    start_logging(&config)?;

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let outcome = load_tree(&config.source_kind()).context("failed to load tree")?;
    info!(
        "event=cli_command module=cli status=start command={:?} nodes={}",
        cli.command,
        outcome.tree.len()
    );

    match cli.command.unwrap_or(Commands::Generate) {
        Commands::Generate => generate(&config, &outcome, today),
        Commands::Item { id } => {
            let generator = SiteGenerator::new(config.site_options());
            let page = generator.generate_item(&outcome.tree, &id, today)?;
            print_page(&page);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Search { query, limit } => {
            let mut search = SearchQuery::new(query.join(" "));
            search.limit = limit;
            let hits = search_nodes(&outcome.tree, &search);
            if hits.is_empty() {
                println!("No matches for `{}`", search.text);
            }
            for hit in hits {
                println!(
                    "{}\t{}\t(level {}, {})",
                    hit.id,
                    hit.title,
                    hit.depth,
                    hit.matched.as_str()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Summary => {
            summarize(&outcome, today);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate => {
            if outcome.diagnostics.is_empty() {
                println!("No problems found in {} nodes.", outcome.tree.len());
                return Ok(ExitCode::SUCCESS);
            }
            for diagnostic in &outcome.diagnostics {
                println!("[{}] {}", diagnostic.code(), diagnostic);
            }
            println!("{} problem(s) found.", outcome.diagnostics.len());
            Ok(ExitCode::FAILURE)
        }
        Commands::Export => {
            let written = write_exports(
                &outcome.tree,
                &config.output_dir,
                Local::now().naive_local(),
            )?;
            for path in written {
                println!("wrote {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<SiteConfig> {
    let mut config = match &cli.config {
        Some(path) => SiteConfig::load(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => SiteConfig::default(),
    };

    if let Some(structure) = &cli.structure {
        config.source = SourceConfig::Yaml(structure.clone());
    }
    if !cli.markdown_root.is_empty() {
        config.source = SourceConfig::Markdown(
            cli.markdown_root
                .iter()
                .map(MarkdownRoot::required)
                .collect(),
        );
    }
    if let Some(out) = &cli.out {
        config.output_dir = out.clone();
    }
    if let Some(depth) = cli.depth {
        config.depth = depth;
    }
    if cli.no_time_buckets {
        config.time_buckets = false;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = Some(level.clone());
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }

    config.validate()?;
    Ok(config)
}

fn start_logging(config: &SiteConfig) -> Result<()> {
    let log_dir = match &config.log_dir {
        Some(dir) => Some(
            dir.to_str()
                .with_context(|| format!("log dir is not valid UTF-8: {}", dir.display()))?,
        ),
        None => None,
    };
    // Stderr stays quiet unless asked; files get the build-mode default.
    let fallback = if log_dir.is_some() {
        default_log_level()
    } else {
        "warn"
    };
    let level = config.log_level.as_deref().unwrap_or(fallback);
    init_logging(level, log_dir).map_err(anyhow::Error::msg)
}

fn generate(config: &SiteConfig, outcome: &LoadOutcome, today: NaiveDate) -> Result<ExitCode> {
    let generator = SiteGenerator::new(config.site_options());
    let report = generator.generate_all(&outcome.tree, today)?;

    println!(
        "Generated {} pages in {}",
        report.pages.len(),
        config.output_dir.display()
    );
    for id in &report.skipped_ids {
        println!("skipped `{id}`: not usable as a file name");
    }
    if !outcome.diagnostics.is_empty() {
        println!(
            "{} diagnostic(s) during load; run `lifemap validate` for details",
            outcome.diagnostics.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn print_page(page: &GeneratedPage) {
    println!("wrote {} ({})", page.path.display(), page.id);
}

fn summarize(outcome: &LoadOutcome, today: NaiveDate) {
    let tree = &outcome.tree;
    let summary = tree.summary();
    println!("{}", tree.root_title());
    println!("Total nodes: {}", summary.total);
    for (depth, count) in &summary.per_depth {
        println!("  level {depth}: {count}");
    }
    println!("Max depth: {}", summary.max_depth);
    println!("With due date: {}", summary.with_due);

    let classification = classify(tree, today);
    for bucket in DueBucket::ALL {
        println!(
            "{}: {}",
            bucket.title(),
            classification.bucket(bucket).len()
        );
    }
    println!("Diagnostics: {}", outcome.diagnostics.len());
}

#[cfg(test)]
mod tests {
    use super::{normalize_args, parse_today, resolve_config, Cli, Commands};
    use clap::Parser;
    use lifemap_core::{MarkdownRoot, SourceConfig};
    use std::ffi::OsString;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        let args = args.iter().map(OsString::from);
        Cli::try_parse_from(normalize_args(args)).unwrap()
    }

    #[test]
    fn item_shorthand_is_rewritten() {
        let cli = parse(&["lifemap", "item:body_habit"]);
        assert_eq!(
            cli.command,
            Some(Commands::Item {
                id: "body_habit".to_string()
            })
        );
    }

    #[test]
    fn no_subcommand_means_generate() {
        let cli = parse(&["lifemap", "--out", "site"]);
        assert_eq!(cli.command, None);
        assert_eq!(cli.out, Some(PathBuf::from("site")));
    }

    #[test]
    fn search_joins_words() {
        let cli = parse(&["lifemap", "search", "morning", "run", "--limit", "5"]);
        assert_eq!(
            cli.command,
            Some(Commands::Search {
                query: vec!["morning".to_string(), "run".to_string()],
                limit: 5,
            })
        );
    }

    #[test]
    fn flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifemap.yaml");
        std::fs::write(&path, "depth: 4\ntime_buckets: true\n").unwrap();
        let path = path.to_str().unwrap().to_string();

        let cli = parse(&[
            "lifemap",
            "--config",
            &path,
            "--markdown-root",
            "notes",
            "--depth",
            "2",
            "--no-time-buckets",
            "validate",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.depth, 2);
        assert!(!config.time_buckets);
        assert_eq!(
            config.source,
            SourceConfig::Markdown(vec![MarkdownRoot::required("notes")])
        );
        assert_eq!(config.output_dir, dir.path().join("html"));
    }

    #[test]
    fn invalid_depth_is_rejected() {
        let cli = parse(&["lifemap", "--depth", "0"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn today_must_be_iso_date() {
        assert!(parse_today("2024-06-10").is_ok());
        assert!(parse_today("06/10/2024").is_err());
    }
}
