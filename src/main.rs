use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use docindex::config::{self, Config};
use docindex::index::{DocumentationIndex, FsLoader, SearchKind, SearchQuery};

/// Browse and search multi-SDK markdown documentation.
#[derive(Debug, Parser)]
#[command(name = "docindex", version, about)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the documentation directory from the config.
    #[arg(long)]
    docs_dir: Option<String>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List loaded SDKs and guides.
    List,
    /// Show the overview of one SDK or guide.
    Overview { sdk: String },
    /// Show one chunk by ID.
    Chunk { id: String },
    /// Show every chunk of a section.
    Section { sdk: String, name: String },
    /// Show documentation for a class.
    Class { sdk: String, class: String },
    /// Show documentation for a method.
    Method {
        sdk: String,
        class: String,
        method: String,
    },
    /// Keyword search over chunk text.
    Search {
        query: String,
        #[arg(long)]
        sdk: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// content, class, method or section.
        #[arg(long, default_value = "content")]
        kind: SearchKind,
    },
    /// Search for code examples.
    Examples {
        query: String,
        #[arg(long)]
        sdk: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Find chunks similar to a piece of text.
    Similar {
        text: String,
        #[arg(long)]
        sdk: Option<String>,
        #[arg(long, default_value_t = 0.3)]
        threshold: f64,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Resolve a documentation URI.
    Resolve { uri: String },
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn print_found<T: Serialize>(value: Option<T>, what: &str) -> Result<()> {
    match value {
        Some(value) => print_json(&value),
        None => anyhow::bail!("{what} not found"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = Config::load(&cli.config).context("Failed to load configuration")?;
    if let Some(dir) = cli.docs_dir {
        config.docs_dir = dir;
    }
    config.validate()?;

    let sources = config.document_sources()?;
    info!(
        "Serving {} documents from {}",
        sources.len(),
        config::absolute_docs_dir(&config).display()
    );
    let index = DocumentationIndex::with_options(
        FsLoader::new(&config.docs_dir),
        sources,
        config.index_options(),
    );
    let default_limit = config.search_limit;

    match cli.command {
        Command::List => print_json(&index.list_documentation()),
        Command::Overview { sdk } => print_found(index.get_sdk_overview(&sdk), &sdk),
        Command::Chunk { id } => print_found(index.get_chunk(&id), &id),
        Command::Section { sdk, name } => print_json(&index.get_chunks_by_section(&sdk, &name)),
        Command::Class { sdk, class } => {
            print_found(index.get_class_documentation(&sdk, &class), &class)
        }
        Command::Method { sdk, class, method } => print_found(
            index.get_method_documentation(&sdk, &class, &method),
            &format!("{class}::{method}"),
        ),
        Command::Search {
            query,
            sdk,
            limit,
            offset,
            kind,
        } => {
            let request = SearchQuery {
                query,
                sdk,
                limit: limit.unwrap_or(default_limit),
                offset,
                kind,
            };
            print_json(&index.search(&request))
        }
        Command::Examples {
            query,
            sdk,
            language,
            limit,
            offset,
        } => print_json(&index.search_code_examples(
            &query,
            sdk.as_deref(),
            language.as_deref(),
            limit.unwrap_or(default_limit),
            offset,
        )),
        Command::Similar {
            text,
            sdk,
            threshold,
            limit,
        } => print_json(&index.find_similar(
            &text,
            sdk.as_deref(),
            threshold,
            limit.unwrap_or(default_limit),
        )),
        Command::Resolve { uri } => print_found(index.resolve(&uri), &uri),
    }
}
