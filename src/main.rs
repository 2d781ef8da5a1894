//! storyforge CLI entry point

use chrono::Datelike;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::{Path, PathBuf};
use storyforge::{
    classify::ThemeClassifier,
    config::Config,
    embed::EmbeddingClient,
    error::{Error, Result},
    generate::{GenerationParams, GenerationStage},
    llm::HttpLlmClient,
    models::{Domain, Feature, Presentation},
    progress::{feature_progress_bar, LogWriterFactory},
    render::{render, render_lab_guide, RenderFormat},
    research::ContentResearchPipeline,
    store::{save_presentation, DocumentStore, ElasticStore},
    template::{LabInstructionBuilder, TemplatePresentationBuilder, UnifiedPresentationBuilder},
};
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "storyforge")]
#[command(version, about = "Turn product documentation into themed decks and lab guides", long_about = None)]
struct Cli {
    /// Path to config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize storyforge configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Classify features into themes
    Classify {
        /// Path to a features JSON file
        features: PathBuf,

        /// Write updated features (with themes assigned) back to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Research feature documentation and run extraction
    Research {
        /// Path to a features JSON file
        features: PathBuf,

        /// Where to write researched features (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a narrative deck with the configured LLM provider
    Generate {
        /// Path to a features JSON file (researched)
        features: PathBuf,

        /// Product domain: search, observability, security, or all
        #[arg(short, long, value_parser = parse_domain)]
        domain: Domain,

        /// Target audience
        #[arg(long)]
        audience: Option<String>,

        /// Narrative style
        #[arg(long)]
        narrative_style: Option<String>,

        /// Technical depth
        #[arg(long)]
        technical_depth: Option<String>,

        /// Number of slides
        #[arg(long)]
        slides: Option<usize>,

        /// Quarter label, e.g. "2026 Q1" (defaults to the current quarter)
        #[arg(long)]
        quarter: Option<String>,

        /// Output format: standard, github, or reveal
        #[arg(short, long, default_value = "standard")]
        format: String,

        /// Where to write the deck (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a deterministic template deck (no LLM required)
    Build {
        /// Path to a features JSON file
        features: PathBuf,

        /// Product domain: search, observability, security, or all
        #[arg(short, long, value_parser = parse_domain)]
        domain: Domain,

        /// Use the 10-slide cross-domain builder
        #[arg(long)]
        unified: bool,

        /// Target audience
        #[arg(long)]
        audience: Option<String>,

        /// Quarter label (defaults to the current quarter)
        #[arg(long)]
        quarter: Option<String>,

        /// Output format: standard, github, or reveal
        #[arg(short, long, default_value = "standard")]
        format: String,

        /// Where to write the deck (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build hands-on lab guides for features
    Lab {
        /// Path to a features JSON file
        features: PathBuf,

        /// Only build a lab for the feature with this name
        #[arg(long)]
        feature: Option<String>,

        /// Where to write the guides (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_domain(value: &str) -> std::result::Result<Domain, String> {
    match value.to_lowercase().as_str() {
        "search" => Ok(Domain::Search),
        "observability" | "o11y" => Ok(Domain::Observability),
        "security" => Ok(Domain::Security),
        "all" => Ok(Domain::All),
        _ => Err(format!(
            "Unknown domain '{}'; expected search, observability, security, or all",
            value
        )),
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    if let Commands::Init { force } = cli.command {
        return handle_init(cli.config, force);
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "storyforge", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone())?;
    config.validate()?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Classify { features, output } => {
            let mut features = load_features(&features)?;
            let classifier = ThemeClassifier::new(config.keywords.clone());
            let results = classifier.classify_batch(&mut features)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    println!(
                        "{:<40} {:<14} confidence {:.2}  {}",
                        truncate_name(&find_name(&features, &result.feature_id)),
                        result.theme.title(),
                        result.confidence,
                        result.reasoning
                    );
                }
            }

            if let Some(path) = output {
                write_features(&path, &features)?;
                println!("\n✓ Wrote {} classified feature(s) to {}", features.len(), path.display());
            }
        }

        Commands::Research { features, output } => {
            let mut features = load_features(&features)?;

            let llm_client = HttpLlmClient::from_config(&config.llm)?;
            if llm_client.is_none() {
                warn!(
                    "{} not set; skipping extraction during research",
                    config.llm.api_key_env
                );
            }
            let embedder = EmbeddingClient::from_config(&config.embedding)?;

            let llm = llm_client
                .as_ref()
                .map(|c| (c as &dyn storyforge::llm::LlmClient, &config.llm));
            let pipeline =
                ContentResearchPipeline::new(config.research.clone(), llm, embedder.as_ref())?;

            let bar = feature_progress_bar(features.len() as u64, "research");
            for feature in features.iter_mut() {
                bar.set_message(feature.name.clone());
                pipeline.research(feature).await;
                bar.inc(1);
            }
            bar.finish_with_message("done");

            emit(&features, output.as_deref())?;
        }

        Commands::Generate {
            features,
            domain,
            audience,
            narrative_style,
            technical_depth,
            slides,
            quarter,
            format,
            output,
        } => {
            let features = load_features(&features)?;

            let Some(client) = HttpLlmClient::from_config(&config.llm)? else {
                return Err(Error::Config(format!(
                    "{} is not set; 'generate' needs an LLM provider. Use 'build' for a template deck.",
                    config.llm.api_key_env
                )));
            };

            let params = GenerationParams {
                domain,
                audience: audience.unwrap_or_else(|| config.generation.audience.clone()),
                narrative_style: narrative_style
                    .unwrap_or_else(|| config.generation.narrative_style.clone()),
                technical_depth: technical_depth
                    .unwrap_or_else(|| config.generation.technical_depth.clone()),
                slide_count: slides.unwrap_or(config.generation.slide_count),
                quarter: quarter.unwrap_or_else(current_quarter),
            };

            let stage = GenerationStage::new(&client, &config.llm);
            let presentation = stage.generate(&features, &params).await?;

            persist_deck(&config, &presentation).await;
            emit_deck(&presentation, &format, output.as_deref(), cli.json)?;
        }

        Commands::Build {
            features,
            domain,
            unified,
            audience,
            quarter,
            format,
            output,
        } => {
            let features = load_features(&features)?;
            let audience = audience.unwrap_or_else(|| config.generation.audience.clone());
            let quarter = quarter.unwrap_or_else(current_quarter);

            let presentation = if unified {
                UnifiedPresentationBuilder::build(&features, &quarter, &audience)
            } else {
                TemplatePresentationBuilder::build(&features, domain, &quarter, &audience)
            };

            persist_deck(&config, &presentation).await;
            emit_deck(&presentation, &format, output.as_deref(), cli.json)?;
        }

        Commands::Lab {
            features,
            feature,
            output,
        } => {
            let features = load_features(&features)?;
            let selected: Vec<&Feature> = match &feature {
                Some(name) => {
                    let found = features
                        .iter()
                        .find(|f| f.name.eq_ignore_ascii_case(name) || f.id == *name)
                        .ok_or_else(|| Error::FeatureNotFound(name.clone()))?;
                    vec![found]
                }
                None => features.iter().collect(),
            };

            let guides: Vec<_> = selected
                .iter()
                .map(|f| LabInstructionBuilder::build(f))
                .collect();

            if cli.json {
                emit(&guides, output.as_deref())?;
            } else {
                let text = guides
                    .iter()
                    .map(render_lab_guide)
                    .collect::<Vec<_>>()
                    .join("\n\n");
                write_text(&text, output.as_deref())?;
            }
        }
    }

    Ok(())
}

fn handle_init(base_dir: Option<PathBuf>, force: bool) -> Result<()> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    if config.paths.config_file.exists() && !force {
        eprintln!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            config.paths.config_file.display()
        );
        std::process::exit(1);
    }

    config.save()?;

    println!("✓ storyforge initialized successfully");
    println!("  Config: {}", config.paths.config_file.display());
    println!("\nNext steps:");
    println!("  1. Edit the config file to customize keyword tables and domains");
    println!("  2. Export {} to enable LLM generation", config.llm.api_key_env);
    println!("  3. Classify features: storyforge classify features.json");

    Ok(())
}

fn load_features(path: &Path) -> Result<Vec<Feature>> {
    let content = std::fs::read_to_string(path)?;
    // Accept either a single feature object or an array.
    match serde_json::from_str::<Vec<Feature>>(&content) {
        Ok(features) => Ok(features),
        Err(_) => Ok(vec![serde_json::from_str::<Feature>(&content)?]),
    }
}

fn write_features(path: &Path, features: &[Feature]) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(features)?)?;
    Ok(())
}

fn find_name(features: &[Feature], id: &str) -> String {
    features
        .iter()
        .find(|f| f.id == id)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > 38 {
        let cut: String = name.chars().take(35).collect();
        format!("{}...", cut)
    } else {
        name.to_string()
    }
}

fn current_quarter() -> String {
    let now = chrono::Utc::now();
    format!("{} Q{}", now.year(), (now.month() - 1) / 3 + 1)
}

async fn persist_deck(config: &Config, presentation: &Presentation) {
    let store = match ElasticStore::from_config(&config.store) {
        Ok(Some(store)) => store,
        Ok(None) => return,
        Err(e) => {
            warn!("Store unavailable: {}", e);
            return;
        }
    };

    match save_presentation(&store as &dyn DocumentStore, presentation).await {
        Ok(id) => println!("✓ Stored deck as '{}'", id),
        Err(e) => warn!("Failed to store deck: {}", e),
    }
}

fn emit_deck(
    presentation: &Presentation,
    format: &str,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    if json {
        return emit(presentation, output);
    }
    let format: RenderFormat = format.parse()?;
    write_text(&render(presentation, format), output)
}

fn emit<T: serde::Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    write_text(&serde_json::to_string_pretty(value)?, output)
}

fn write_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("✓ Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
