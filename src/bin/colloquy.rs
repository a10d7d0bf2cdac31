//! colloquy: summarize and question discussion threads from the terminal
//!
//! Stands in for the browser popup: manages stored keys and the selected
//! model, and sends summarize/ask requests to a page context.

use std::error::Error;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args as ClapArgs, Parser, Subcommand};
use colloquy::settings::{self, Settings, SettingsUpdate};
use colloquy::{
    ColloquyBuilder, Config, CredentialSet, Page, PageContext, PageFetcher,
    PageRenderer, ProviderKind, RenderEvent, Request, Response, SummaryCache,
};

/// Colloquy CLI
#[derive(Parser)]
#[command(name = "colloquy")]
#[command(version)]
#[command(about = "Cached LLM summaries and Q&A for discussion threads")]
struct Args {
    /// Config file (default: ~/.colloquy/config.toml)
    #[arg(short, long, env = "COLLOQUY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Summarize a discussion (cached per URL and model)
    Summarize {
        #[command(flatten)]
        source: PageSource,
    },

    /// Ask a question about a discussion
    Ask {
        /// The question
        question: String,
        #[command(flatten)]
        source: PageSource,
    },

    /// Inspect or clear the summary cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print stored settings with keys masked
    Show,
    /// Store API keys and/or the selected model
    Set {
        #[arg(long)]
        anthropic_key: Option<String>,
        #[arg(long)]
        openai_key: Option<String>,
        /// Model identifier, e.g. claude-3-haiku-20240307 or gpt-4o
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Drop every cached summary
    Clear,
    /// Print the number of cached summaries
    Stats,
}

/// Where the discussion text comes from.
#[derive(ClapArgs)]
struct PageSource {
    /// Discussion page URL
    #[arg(long)]
    url: String,
    /// Read page text from a file (otherwise stdin)
    #[arg(long, conflicts_with = "fetch")]
    file: Option<PathBuf>,
    /// Download the page and extract its text
    #[arg(long)]
    fetch: bool,
}

/// Prints rendered output the way the page would show it.
struct TerminalRenderer;

impl PageRenderer for TerminalRenderer {
    fn render(&self, event: RenderEvent) {
        match event {
            RenderEvent::LoadingStart => eprintln!("generating..."),
            RenderEvent::LoadingEnd => {}
            RenderEvent::Summary(text) | RenderEvent::Answer(text) => println!("{text}"),
            RenderEvent::Error(message) => eprintln!("{message}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let dispatcher = Arc::new(
        ColloquyBuilder::from_config(&config)
            .renderer(Arc::new(TerminalRenderer))
            .build()?,
    );
    let store = dispatcher.store().clone();

    match args.command {
        Command::Config { action: ConfigAction::Show } => {
            let stored = Settings::load(store.as_ref()).await?;
            let masked = stored.masked();
            let env = CredentialSet::from_env();
            for provider in ProviderKind::ALL {
                let shown = match masked.api_key(provider) {
                    Some(mask) if !mask.is_empty() => mask.to_string(),
                    _ if env.contains(provider) => format!("(from {})", provider.env_var()),
                    _ => "(not set)".to_string(),
                };
                println!("{:<15} {shown}", format!("{} key:", provider.display_name()));
            }
            println!("{:<15} {}", "model:", stored.model_or(&config.default_model));
            println!("{:<15} {}", "storage:", config.storage.path().display());
        }

        Command::Config {
            action:
                ConfigAction::Set {
                    anthropic_key,
                    openai_key,
                    model,
                },
        } => {
            let stored = Settings::load(store.as_ref()).await?;
            let model = model.unwrap_or_else(|| stored.model_or(&config.default_model).to_string());
            // Reject typos before they reach the store.
            dispatcher.selector().provider_for(&model)?;

            let mut update = SettingsUpdate::new(model);
            if let Some(key) = anthropic_key {
                update = update.api_key(ProviderKind::Anthropic, key);
            }
            if let Some(key) = openai_key {
                update = update.api_key(ProviderKind::OpenAi, key);
            }

            let outcome = settings::save(store.as_ref(), &update).await?;
            println!("settings saved");
            if outcome.cache_invalidated {
                println!("model changed: summary cache cleared");
            }
        }

        Command::Summarize { source } => {
            let page = load_page(&source).await?;
            let response = send(&dispatcher, &config, page, Request::Summarize).await?;
            settings::record_exchange(store.as_ref(), None, response.text()).await?;
        }

        Command::Ask { question, source } => {
            let page = load_page(&source).await?;
            let request = Request::Ask {
                question: question.clone(),
            };
            let response = send(&dispatcher, &config, page, request).await?;
            settings::record_exchange(store.as_ref(), Some(&question), response.text()).await?;
        }

        Command::Cache { action } => {
            let cache = SummaryCache::new(store);
            match action {
                CacheAction::Clear => {
                    cache.invalidate_all().await?;
                    println!("summary cache cleared");
                }
                CacheAction::Stats => {
                    println!("{} cached summaries", cache.len().await?);
                }
            }
        }
    }

    Ok(())
}

/// Deliver one request to a freshly spawned page context.
///
/// An error response becomes the command's error.
async fn send(
    dispatcher: &Arc<colloquy::Dispatcher>,
    config: &Config,
    page: Page,
    request: Request,
) -> Result<Response, Box<dyn Error>> {
    let context = PageContext::new(page, dispatcher.clone())
        .with_default_model(&config.default_model)
        .with_fallback_credentials(CredentialSet::from_env());
    let (channel, task) = context.spawn();

    let response = channel.request(request).await?;
    drop(channel);
    task.await?;

    match response {
        Response::Error(message) => Err(message.into()),
        other => Ok(other),
    }
}

async fn load_page(source: &PageSource) -> Result<Page, Box<dyn Error>> {
    if source.fetch {
        return Ok(PageFetcher::new().fetch(&source.url).await?);
    }

    let text = match &source.file {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => read_stdin()?,
    };
    Ok(Page::new(source.url.as_str(), text))
}

fn read_stdin() -> Result<String, Box<dyn Error>> {
    if io::stdin().is_terminal() {
        return Err("no page text: pass --file, --fetch, or pipe the text on stdin".into());
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    if buf.trim().is_empty() {
        return Err("no page text on stdin".into());
    }
    Ok(buf)
}
