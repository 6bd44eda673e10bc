use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use letterpress_backend_api::{build_router, AppState};
use letterpress_backend_runtime::{telemetry, BackendServices};
use letterpress_config::{load as load_config, GeneratorMode};
use letterpress_export::ExportFormat;
use letterpress_orchestrator::{
    tone, DocumentOrchestrator, DocumentRequest, DocumentType, Tone, SUPPORTED_LANGUAGES,
};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "letterpress-backend")]
#[command(about = "Letterpress document service (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Print the filled generation instruction without calling the model
    Render(RenderArgs),
    /// List document types, tones, export formats and languages
    Catalog,
}

#[derive(Args)]
struct RenderArgs {
    /// Key points of the email
    #[arg(long)]
    prompt: String,
    /// Document type, e.g. "announcement" or "meeting_summary"
    #[arg(long, default_value = "Announcement")]
    doc_type: DocumentType,
    /// Tone, e.g. "formal" or "firm_but_polite"
    #[arg(long, default_value = "Neutral")]
    tone: Tone,
    #[arg(long)]
    sender_name: Option<String>,
    #[arg(long)]
    sender_profession: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    additional_context: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::Render(args) => render(args),
        Commands::Catalog => {
            print_catalog();
            Ok(())
        }
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Letterpress backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = AppState::new(
        Arc::clone(&services.orchestrator),
        Arc::clone(&services.exporter),
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, mode = config.orchestrator.mode.as_str(), "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(letterpress_backend_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

fn render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = load_config().context("failed to load configuration")?;
    // Rendering never reaches the model, so credentials are not required.
    config.orchestrator.mode = GeneratorMode::Stub;

    let orchestrator = DocumentOrchestrator::from_config(&config.orchestrator)
        .context("failed to load templates")?;

    let request = DocumentRequest {
        prompt: args.prompt,
        doc_type: args.doc_type,
        tone: args.tone,
        additional_context: args.additional_context,
        sender_name: args.sender_name,
        sender_profession: args.sender_profession,
        language: args.language,
    };

    let instruction = orchestrator
        .render_generation_prompt(&request)
        .context("failed to render instruction")?;
    println!("{instruction}");
    Ok(())
}

fn print_catalog() {
    println!("Document types:");
    for doc_type in DocumentType::ALL {
        println!("  {:<24} ({})", doc_type.label(), doc_type.key());
    }

    println!("\nTones:");
    for tone_value in Tone::ALL {
        println!(
            "  {:<24} {}",
            tone_value.label(),
            tone::instructions_for(tone_value)
        );
    }

    println!("\nExport formats:");
    for format in ExportFormat::ALL {
        println!("  {:<24} {}", format.extension(), format.media_type());
    }

    println!("\nLanguages:");
    for language in SUPPORTED_LANGUAGES {
        println!("  {language}");
    }
}
