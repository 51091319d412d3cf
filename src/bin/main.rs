//! DCAT Catalog Mirror CLI
//!
//! Command-line tool for harvesting remote DCAT catalogs into a local
//! file-backed mirror and for registering the catalogs to harvest.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dcat_mirror::codelist::DEFAULT_CODELIST_TTL;
use dcat_mirror::metadata::TAG_URI;
use dcat_mirror::{
    CatalogError, CodelistCache, DcatEntity, DeriveContext, Document, DocumentStorage,
    FileStorage, HarvestConfig, Harvester, SparqlClient, StorageCodelistProvider, StorageQuery,
};

#[derive(Parser)]
#[command(name = "dcat-mirror")]
#[command(about = "Mirror DCAT catalogs harvested from SPARQL endpoints")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one harvest pass over every registered local catalog
    Harvest(HarvestArgs),
    /// Register the catalogs, publishers and codelists of a Turtle file
    Register(RegisterArgs),
    /// Summarize the entities of a Turtle file
    Inspect(InspectArgs),
}

#[derive(Args)]
struct HarvestArgs {
    /// Storage directory
    #[arg(long, env = "DCAT_STORAGE_DIR")]
    storage: PathBuf,

    /// SPARQL endpoint for catalogs that do not declare one
    #[arg(long)]
    endpoint: Option<String>,

    /// HTTP timeout for SPARQL requests
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Args)]
struct RegisterArgs {
    /// Storage directory
    #[arg(long, env = "DCAT_STORAGE_DIR")]
    storage: PathBuf,

    /// Turtle file to register
    #[arg(long)]
    file: PathBuf,

    /// Publisher URI for catalogs that do not name one
    #[arg(long)]
    publisher: Option<String>,

    /// Make registered records public
    #[arg(long)]
    public: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Turtle file to inspect
    #[arg(long)]
    file: PathBuf,

    /// Storage directory whose codelists label formats and themes
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Language of printed titles
    #[arg(long, default_value = "sk")]
    lang: String,
}

fn init_logging(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dcat_mirror=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_harvest(args: HarvestArgs) -> Result<(), CatalogError> {
    let mut config = HarvestConfig::from_env();
    if let Some(endpoint) = args.endpoint {
        config.sparql_endpoint = Some(endpoint);
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }

    let storage = Arc::new(FileStorage::open(&args.storage).await?);
    let source = Arc::new(SparqlClient::new(config.timeout)?);
    Harvester::new(storage, source, config).run().await
}

/// Insert or refresh the manually managed record of one entity
async fn register_entity<T: DcatEntity>(
    storage: &dyn DocumentStorage,
    entity: &T,
    ctx: &DeriveContext,
) -> Result<(), CatalogError> {
    let Some(uri) = entity.uri() else {
        return Err(CatalogError::InvalidIri("blank node".to_string()));
    };
    let query = StorageQuery::of_type(T::FILE_TYPE).with_tag(TAG_URI, uri);
    let existing = storage
        .query(&query)
        .await?
        .into_iter()
        .find(|doc| !doc.metadata.is_harvested());

    let record = entity.derive_metadata(existing.as_ref().map(|d| &d.metadata), ctx);
    storage
        .insert_or_update(&record, Some(&entity.to_text()?))
        .await?;
    info!(uri = %uri, local_id = %record.id(), file_type = ?T::FILE_TYPE, "Registered");
    Ok(())
}

async fn run_register(args: RegisterArgs) -> Result<(), CatalogError> {
    let text = tokio::fs::read_to_string(&args.file).await?;
    let doc = Document::parse(&text)?;
    if doc.catalogs.is_empty() && doc.agents.is_empty() && doc.concept_schemes.is_empty() {
        eprintln!("Nothing to register in {}", args.file.display());
        return Ok(());
    }

    let storage = FileStorage::open(&args.storage).await?;
    let original_file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);

    for agent in &doc.agents {
        let ctx = DeriveContext {
            publisher: agent.uri().map(str::to_string),
            is_public: args.public,
            original_file_name: original_file_name.clone(),
            ..Default::default()
        };
        register_entity(&storage, agent, &ctx).await?;
    }
    for catalog in &doc.catalogs {
        let ctx = DeriveContext {
            publisher: catalog.publisher().or_else(|| args.publisher.clone()),
            is_public: args.public,
            original_file_name: original_file_name.clone(),
            ..Default::default()
        };
        register_entity(&storage, catalog, &ctx).await?;
    }
    for scheme in &doc.concept_schemes {
        let ctx = DeriveContext {
            is_public: true,
            original_file_name: original_file_name.clone(),
            ..Default::default()
        };
        register_entity(&storage, scheme, &ctx).await?;
    }

    eprintln!(
        "Registered {} catalogs, {} publishers, {} codelists",
        doc.catalogs.len(),
        doc.agents.len(),
        doc.concept_schemes.len()
    );
    Ok(())
}

/// Scheme URI of a concept URI: ".../file-type/CSV" -> ".../file-type"
fn scheme_of(concept: &str) -> &str {
    concept.rsplit_once('/').map_or(concept, |(scheme, _)| scheme)
}

/// Concept URI, prefixed with its codelist label when one is known
async fn describe(
    codelists: Option<&CodelistCache>,
    concept: String,
    lang: &str,
) -> Result<String, CatalogError> {
    let found = match codelists {
        Some(cache) => cache.get_label(scheme_of(&concept), &concept, lang).await?,
        None => None,
    };
    Ok(match found {
        Some(label) => format!("{} ({})", label, concept),
        None => concept,
    })
}

async fn run_inspect(args: InspectArgs) -> Result<(), CatalogError> {
    let text = tokio::fs::read_to_string(&args.file).await?;
    let doc = Document::parse(&text)?;

    let codelists = match &args.storage {
        Some(dir) => {
            let storage = Arc::new(FileStorage::open(dir).await?);
            let provider = Arc::new(StorageCodelistProvider::new(storage));
            Some(CodelistCache::new(provider, DEFAULT_CODELIST_TTL))
        }
        None => None,
    };
    let title = |name: BTreeMap<String, String>| {
        name.get(&args.lang)
            .or_else(|| name.values().next())
            .cloned()
            .unwrap_or_default()
    };

    for catalog in &doc.catalogs {
        println!("Catalog      {}  {}", catalog.uri().unwrap_or("_"), title(catalog.display_name()));
        if let Some(endpoint) = catalog.endpoint_url() {
            println!("  endpoint   {}", endpoint);
        }
    }
    for agent in &doc.agents {
        println!("Agent        {}  {}", agent.uri().unwrap_or("_"), title(agent.display_name()));
    }
    for dataset in &doc.datasets {
        println!("Dataset      {}  {}", dataset.uri().unwrap_or("_"), title(dataset.display_name()));
        for theme in dataset.themes() {
            println!("  theme      {}", describe(codelists.as_ref(), theme, &args.lang).await?);
        }
        if let Some(parent) = dataset.is_part_of() {
            println!("  part of    {}", parent);
        }
    }
    for distribution in &doc.distributions {
        println!(
            "Distribution {}  {}",
            distribution.uri().unwrap_or("_"),
            title(distribution.display_name())
        );
        if let Some(format) = distribution.format() {
            println!("  format     {}", describe(codelists.as_ref(), format, &args.lang).await?);
        }
    }
    for scheme in &doc.concept_schemes {
        println!(
            "Codelist     {}  {} ({} concepts)",
            scheme.uri().unwrap_or("_"),
            title(scheme.display_name()),
            scheme.concepts().len()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let result = match cli.command {
        Commands::Harvest(args) => run_harvest(args).await,
        Commands::Register(args) => run_register(args).await,
        Commands::Inspect(args) => run_inspect(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", dcat_mirror::ErrorChain(&e));
        std::process::exit(1);
    }
}
