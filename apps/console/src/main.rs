use std::{collections::BTreeMap, io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use letterpress_orchestrator::tone;
use tokio::io::{AsyncBufReadExt, BufReader};

mod client;
mod command;
mod session;

use client::ApiClient;
use command::{Command, HELP};
use session::{NextRequest, PendingExport, SessionView};

#[derive(Parser)]
#[command(name = "letterpress-console")]
#[command(about = "Interactive drafting console for the Letterpress document service")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    api_url: String,

    /// Session file, loaded on start and saved on exit
    #[arg(long)]
    session: Option<PathBuf>,

    /// Directory for exported files
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

struct Console {
    client: ApiClient,
    session: SessionView,
    session_path: Option<PathBuf>,
    export_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = match &cli.session {
        Some(path) => SessionView::load_or_default(path)?,
        None => SessionView::default(),
    };

    let mut console = Console {
        client: ApiClient::new(cli.api_url.clone()),
        session,
        session_path: cli.session,
        export_dir: cli.export_dir,
    };

    match console.client.health().await {
        Ok(health) => println!(
            "{} {} ({} at {})",
            "Connected to".green(),
            cli.api_url,
            health.status,
            health.timestamp
        ),
        Err(error) => println!("{} {error:#}", "Warning:".yellow()),
    }

    console.run().await
}

impl Console {
    async fn run(&mut self) -> Result<()> {
        println!("{}", "Letterpress Console".bold());
        println!("Type a few key points to draft a document, or '/help' for commands");
        println!("Use Ctrl+D or '/quit' to exit");
        println!("---");
        self.print_settings();
        if !self.session.documents.is_empty() {
            println!(
                "Resumed session with {} document(s); new prompts refine the latest one",
                self.session.documents.len()
            );
        }

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                break; // EOF
            }

            let command = match command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(error) => {
                    println!("{}", error.to_string().red());
                    continue;
                }
            };

            if command == Command::Quit {
                println!("Goodbye!");
                break;
            }

            if let Err(error) = self.handle(command).await {
                println!("{} {error:#}", "Error:".red());
            }
        }

        if let Some(path) = &self.session_path {
            self.session.save(path)?;
            println!("Session saved to {}", path.display());
        }
        Ok(())
    }

    async fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
            Command::Options => self.print_options().await?,
            Command::Settings => self.print_settings(),
            Command::SetDocType(doc_type) => {
                self.session.settings.doc_type = doc_type;
                println!("Document type: {}", doc_type.to_string().cyan());
            }
            Command::SetTone(tone_value) => {
                self.session.settings.tone = tone_value;
                println!(
                    "Tone: {} ({})",
                    tone_value.to_string().cyan(),
                    tone::instructions_for(tone_value)
                );
            }
            Command::SetLanguage(language) => {
                println!("Language: {}", language.cyan());
                self.session.settings.language = language;
            }
            Command::SetSender { name, profession } => {
                self.session.settings.sender_name = name;
                self.session.settings.sender_profession = profession;
                self.print_settings();
            }
            Command::SetContext(context) => {
                self.session.settings.additional_context = context;
                self.print_settings();
            }
            Command::History => self.print_history(),
            Command::Preview(position) => match self.session.open_preview(position) {
                Some(version) => {
                    println!("{} {}", version.title().bold(), version.timestamp.dimmed());
                    println!("{}", "-".repeat(50));
                    println!("{}", version.content);
                    println!("{}", "-".repeat(50));
                }
                None => println!("{}", format!("No document {position}").yellow()),
            },
            Command::ClosePreview => {
                self.session.close_preview();
                println!("Preview closed");
            }
            Command::Export { format, position } => self.export(&format, position).await?,
            Command::Save(path) => {
                let path = path
                    .or_else(|| self.session_path.clone())
                    .context("no session file given; use /save <path>")?;
                self.session.save(&path)?;
                println!("Session saved to {}", path.display());
            }
            Command::New => {
                self.session.reset();
                println!("Started a new conversation");
            }
            Command::Prompt(prompt) => self.submit(&prompt).await?,
        }
        Ok(())
    }

    async fn submit(&mut self, prompt: &str) -> Result<()> {
        let request = self.session.next_request(prompt);
        self.session.record_prompt(prompt);

        match request {
            NextRequest::Generate(request) => {
                println!(
                    "{}",
                    format!("Generating {} ({})...", request.doc_type, request.tone).dimmed()
                );
                let response = self.client.generate(&request).await?;
                println!("{}", response.document);
                let version =
                    self.session
                        .record_document(request.doc_type, request.tone, response.document);
                println!("{} {}", "Saved as".green(), version.title());
            }
            NextRequest::Refine(request) => {
                println!("{}", "Refining...".dimmed());
                let refined = self
                    .client
                    .refine(&request, |chunk| {
                        print!("{}", chunk.document);
                        let _ = std::io::stdout().flush();
                    })
                    .await?;
                println!();
                let version = self
                    .session
                    .record_document(request.doc_type, request.tone, refined);
                println!("{} {}", "Saved as".green(), version.title());
            }
        }
        Ok(())
    }

    async fn export(&mut self, format: &str, position: Option<usize>) -> Result<()> {
        let index = match position {
            Some(position) => self
                .session
                .index_from_newest(position)
                .with_context(|| format!("no document {position}"))?,
            None => self
                .session
                .documents
                .len()
                .checked_sub(1)
                .context("nothing to export yet")?,
        };
        let version = &self.session.documents[index];

        let metadata = BTreeMap::from([
            ("doc_type".to_string(), version.doc_type.to_string()),
            ("tone".to_string(), version.tone.to_string()),
        ]);
        let saved = self
            .client
            .export(&version.content, &metadata, format, &self.export_dir)
            .await?;

        println!(
            "{} {} ({})",
            "Exported".green(),
            saved.path.display(),
            saved.media_type
        );
        self.session.pending_export = Some(PendingExport {
            file_name: saved.file_name,
            media_type: saved.media_type,
            path: saved.path.display().to_string(),
        });
        Ok(())
    }

    async fn print_options(&self) -> Result<()> {
        let options = self.client.options().await?;
        println!("Document types: {}", options.doc_types.join(", "));
        println!("Tones:");
        for label in &options.tones {
            println!("  {:<18} {}", label, tone::instructions_for_label(label));
        }
        println!("Formats: {}", options.formats.join(", "));
        println!("Languages: {}", options.languages.join(", "));
        Ok(())
    }

    fn print_settings(&self) {
        let settings = &self.session.settings;
        println!(
            "Type: {}  Tone: {}  Language: {}",
            settings.doc_type.to_string().cyan(),
            settings.tone.to_string().cyan(),
            settings.language.cyan()
        );
        println!(
            "Sender: {}  Profession: {}",
            display_or_dash(settings.sender_name.as_deref()),
            display_or_dash(settings.sender_profession.as_deref())
        );
        if let Some(context) = &settings.additional_context {
            println!("Context: {context}");
        }
    }

    fn print_history(&self) {
        if self.session.documents.is_empty() {
            println!("No documents yet");
            return;
        }

        println!("Document history (newest first):");
        for (offset, version) in self.session.documents.iter().rev().enumerate() {
            println!(
                "  {}. {} {}",
                offset + 1,
                version.title().bold(),
                version.timestamp.dimmed()
            );
            println!("     {}", version.excerpt().replace('\n', " "));
        }
        if let Some(pending) = &self.session.pending_export {
            println!("Last export: {}", pending.path);
        }
    }
}

fn display_or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
