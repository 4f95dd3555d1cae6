use chatview::export::{find_transcript, truncate};
use chatview::render::format_display_date;
use chatview::{
    archive_to_markdown, linearize_archive, load_archive, logging, render, serve,
    transcript_to_markdown, transcripts_to_json, Config, MarkdownConfig, RenderOptions,
    Transcript,
};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(name = "chatview")]
#[command(author, version, about = "Browse exported chat archives as speaker-attributed transcripts")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a self-contained HTML viewer for an archive
    Render {
        /// Archive JSON file
        archive: PathBuf,

        /// Output HTML file
        #[arg(short, long, default_value = "chat_viewer.html")]
        output: PathBuf,

        /// Render message content as Markdown
        #[arg(long)]
        markdown: bool,

        /// Page title (overrides config)
        #[arg(long)]
        title: Option<String>,

        /// Open the viewer in the browser when done
        #[arg(long)]
        open: bool,
    },

    /// Start a local web server for browsing an archive
    Serve {
        /// Archive JSON file
        archive: PathBuf,

        /// Port to listen on (default from config, else 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Render message content as Markdown
        #[arg(long)]
        markdown: bool,
    },

    /// Export transcripts as Markdown or JSON
    Export {
        /// Archive JSON file
        archive: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,

        /// Only export the conversation with this id
        #[arg(short, long)]
        conversation: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave reasoning traces out of Markdown output
        #[arg(long)]
        no_reasoning: bool,
    },

    /// List conversations in an archive
    List {
        /// Archive JSON file
        archive: PathBuf,
    },

    /// Generate shell completion script
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Markdown,
    Json,
}

fn main() {
    let args = Args::parse();
    let config = Config::load();
    logging::init(&config, args.verbose);

    if let Err(e) = run(args.command, &config) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Command, config: &Config) -> CliResult<()> {
    match command {
        Command::Render {
            archive,
            output,
            markdown,
            title,
            open,
        } => {
            let mut options = RenderOptions::from(&config.viewer);
            options.markdown |= markdown;
            if let Some(title) = title {
                options.page_title = title;
            }

            let transcripts = load_transcripts(&archive)?;
            render::generate(&output, &transcripts, &options)
                .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;

            let shown = output.canonicalize().unwrap_or_else(|_| output.clone());
            eprintln!(
                "{} {} ({} conversations)",
                "Viewer saved:".green(),
                shown.display(),
                transcripts.len()
            );

            if open {
                if let Err(e) = open::that(&output) {
                    eprintln!("{} {}", "Failed to open viewer:".yellow(), e);
                }
            }
            Ok(())
        }

        Command::Serve {
            archive,
            port,
            markdown,
        } => {
            let mut options = RenderOptions::from(&config.viewer);
            options.markdown |= markdown;
            let port = port.unwrap_or(config.serve.port);

            serve::start_viewer_server(port, &archive, &options)
                .map_err(|e| format!("Server error: {}", e))?;
            Ok(())
        }

        Command::Export {
            archive,
            format,
            conversation,
            output,
            no_reasoning,
        } => {
            let transcripts = load_transcripts(&archive)?;

            let selected: Vec<Transcript> = match &conversation {
                Some(id) => {
                    let found = find_transcript(&transcripts, id)
                        .ok_or_else(|| format!("Conversation not found: {}", id))?;
                    vec![found.clone()]
                }
                None => transcripts,
            };

            let md_config = MarkdownConfig {
                include_reasoning: !no_reasoning,
                untitled_placeholder: config.viewer.untitled_placeholder.clone(),
                ..Default::default()
            };

            let text = match format {
                ExportFormat::Json => transcripts_to_json(&selected)?,
                ExportFormat::Markdown if selected.len() == 1 => {
                    transcript_to_markdown(&selected[0], &md_config)
                }
                ExportFormat::Markdown => archive_to_markdown(&selected, &md_config),
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
                    eprintln!("{} {}", "Exported:".green(), path.display());
                }
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(text.as_bytes())?;
                    if !text.ends_with('\n') {
                        writeln!(stdout)?;
                    }
                }
            }
            Ok(())
        }

        Command::List { archive } => {
            let transcripts = load_transcripts(&archive)?;
            print_listing(&transcripts, &config.viewer.untitled_placeholder);
            Ok(())
        }

        Command::Completion { shell } => {
            let mut cmd = Args::command();
            clap_complete::generate(shell, &mut cmd, "chatview", &mut io::stdout());
            Ok(())
        }
    }
}

fn load_transcripts(path: &Path) -> CliResult<Vec<Transcript>> {
    let conversations =
        load_archive(path).map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;
    Ok(linearize_archive(&conversations))
}

fn print_listing(transcripts: &[Transcript], untitled_placeholder: &str) {
    let header = format!("{:<24} {:>5}  {:<16}  {}", "ID", "TURNS", "DATE", "TITLE");
    println!("{}", header.bold());

    for t in transcripts {
        let line = format!(
            "{:<24} {:>5}  {:<16}  {}",
            truncate(&t.id, 24),
            t.turns.len(),
            format_display_date(t.display_date()),
            truncate(t.display_title(untitled_placeholder), 60)
        );
        if t.is_empty() {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }

    let empty = transcripts.iter().filter(|t| t.is_empty()).count();
    eprintln!(
        "\n{} conversation(s), {} without content",
        transcripts.len(),
        empty
    );
}
