//! Hyper-Schema StackQL Provider Generator CLI
//!
//! Command-line interface for generating StackQL providers from JSON
//! Hyper-Schema API descriptions such as the Heroku Platform API.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use hyperschema_stackql_common::{GeneratorConfig, OperationIdStyle};
use hyperschema_stackql_generator::{ProviderGenerator, MANIFEST_FILE};
use hyperschema_stackql_parser::{parse_schema_file, HyperSchemaParser, ServiceNamer, VerbMapper};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hyperschema-stackql")]
#[command(version, about = "Generate StackQL providers from JSON Hyper-Schema documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a schema and display the extracted resources
    #[command(after_help = "EXAMPLES:\n  \
        # List resources and their services\n  \
        hyperschema-stackql parse --schema heroku-schema.json\n\n  \
        # Include every link\n  \
        hyperschema-stackql parse --schema heroku-schema.json --verbose\n\n  \
        # Show the service names generate would use\n  \
        hyperschema-stackql parse --schema heroku-schema.json --config heroku.yaml")]
    Parse {
        /// Path to the Hyper-Schema JSON document
        #[arg(short, long)]
        schema: PathBuf,

        /// Generator config file (YAML); its service naming rules apply
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Group related resources into Heroku service families
        #[arg(long)]
        families: bool,
    },

    /// Generate a StackQL provider
    #[command(after_help = "EXAMPLES:\n  \
        # Generate the Heroku provider\n  \
        hyperschema-stackql generate \\\n    \
        --schema heroku-schema.json \\\n    \
        --output ./provider\n\n  \
        # Use a config file and override the version\n  \
        hyperschema-stackql generate \\\n    \
        --schema heroku-schema.json \\\n    \
        --config heroku.yaml \\\n    \
        --version v1 \\\n    \
        --output ./provider")]
    Generate {
        /// Path to the Hyper-Schema JSON document
        #[arg(short, long)]
        schema: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./provider")]
        output: PathBuf,

        /// Generator config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Provider name (e.g., "heroku")
        #[arg(long)]
        name: Option<String>,

        /// Provider version (e.g., "v0")
        #[arg(long)]
        version: Option<String>,

        /// Group related resources into Heroku service families
        #[arg(long)]
        families: bool,

        /// Derive operationIds from link titles instead of rels
        #[arg(long)]
        title_operation_ids: bool,
    },
}

/// Flags that override values from the config file
struct GenerateOptions<'a> {
    schema: &'a Path,
    output: &'a Path,
    config: Option<&'a Path>,
    name: Option<String>,
    version: Option<String>,
    families: bool,
    title_operation_ids: bool,
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse {
            schema,
            config,
            families,
        } => {
            parse_command(schema.as_path(), config.as_deref(), families, cli.verbose)?;
        }
        Commands::Generate {
            schema,
            output,
            config,
            name,
            version,
            families,
            title_operation_ids,
        } => {
            generate_command(GenerateOptions {
                schema: schema.as_path(),
                output: output.as_path(),
                config: config.as_deref(),
                name,
                version,
                families,
                title_operation_ids,
                verbose: cli.verbose,
            })?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file (or defaults) and apply `--families`
fn load_config(path: Option<&Path>, families: bool) -> Result<GeneratorConfig> {
    let mut config = match path {
        Some(path) => {
            println!("{} Loading config: {}", "→".cyan(), path.display());
            GeneratorConfig::load(path).context("Failed to load generator config")?
        }
        None => GeneratorConfig::default(),
    };

    if families {
        config.families = true;
    }
    Ok(config)
}

fn parse_command(
    schema_path: &Path,
    config_path: Option<&Path>,
    families: bool,
    verbose: bool,
) -> Result<()> {
    println!("{} Parsing schema: {}", "→".cyan(), schema_path.display());

    let config = load_config(config_path, families)?;
    let namer = ServiceNamer::from_config(&config);

    let (doc, units) = parse_schema_file(schema_path, &namer)
        .with_context(|| format!("Failed to parse schema {}", schema_path.display()))?;

    let operations: usize = units.iter().map(|u| u.links.len()).sum();
    let mut services: Vec<&str> = units.iter().map(|u| u.service.as_str()).collect();
    services.sort_unstable();
    services.dedup();

    println!("\n{}", "✓ Parse successful!".green().bold());
    println!("\n{}", "Schema:".bold());
    if let Some(title) = doc.title() {
        println!("  Title: {}", title.yellow());
    }
    println!("  Definitions: {}", doc.definition_count());
    println!("  Resources: {}", units.len());
    println!("  Services: {}", services.len());
    println!("  Operations: {}", operations);

    println!("\n{}", "Resources:".bold());
    for unit in &units {
        println!(
            "  • {} → {} ({} links)",
            unit.key.cyan(),
            unit.service.yellow(),
            unit.links.len()
        );

        if verbose {
            for link in &unit.links {
                let verb = VerbMapper::classify(&link.method, &link.rel)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "      {:<6} {:<7} {:<12} {}",
                    verb.green(),
                    link.method.to_uppercase(),
                    link.rel,
                    link.href.dimmed()
                );
            }
        }
    }

    Ok(())
}

fn generate_command(options: GenerateOptions<'_>) -> Result<()> {
    println!(
        "{} Generating provider from: {}",
        "→".cyan(),
        options.schema.display()
    );

    let mut config = load_config(options.config, options.families)?;

    if let Some(name) = options.name {
        config.provider = name;
    }
    if let Some(version) = options.version {
        config.version = version;
    }
    if options.title_operation_ids {
        config.operation_id_style = OperationIdStyle::Title;
    }

    debug!(?config, "Resolved generator config");

    if options.verbose {
        println!("  Provider: {}", config.provider);
        println!("  Version: {}", config.version);
        println!("  Families: {}", config.families);
        println!("  Output: {}", options.output.display());
    }

    println!("{} Loading schema...", "→".cyan());
    let doc = HyperSchemaParser::from_file(options.schema)
        .context("Failed to read schema")?
        .load()
        .context("Failed to resolve schema")?;

    println!(
        "{} Loaded {} definitions",
        "✓".green(),
        doc.definition_count()
    );

    println!("{} Generating provider files...", "→".cyan());
    let generator = ProviderGenerator::new(doc, config);
    let output = generator
        .generate_to_directory(options.output)
        .context("Failed to generate provider")?;

    let root = options
        .output
        .join(&output.manifest.name)
        .join(&output.manifest.version);

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!(
        "  {} services, {} operations",
        output.documents.len().to_string().yellow(),
        output.operation_count().to_string().yellow()
    );
    println!("\n{}", "Generated files:".bold());
    println!("  📄 {}", root.join(MANIFEST_FILE).display());
    for service in &output.manifest.services {
        println!("  📄 {}", root.join(&service.file).display());
    }

    Ok(())
}
