//! Quill Entry Point
//!
//! Small scripts that chat with a hosted model and stream the reply
//! into a terminal surface. Each subcommand is one script:
//!
//! ```text
//! quill adventure        start a "Choose Your Own Adventure" story
//! quill continue         resume a saved adventure
//! quill quiz             take the advanced TypeScript quiz
//! quill novella          rewrite a saved story as a novella
//! quill header <file>    generate a comment header for a script file
//! ```

use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use quill_core::{
    config, transcript, ChatBackend, ChatEngine, ChatRequest, EngineConfig, OpenAiBackend,
    QuillConfig, Script, Session,
};
use quill_tui::{ChatApp, EditorApp, StoryPicker};

#[derive(Parser)]
#[command(name = "quill", version, about = "Scripts that chat with a model and stream the reply")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the configured model
    #[arg(long, global = true)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start a "Choose Your Own Adventure" story
    Adventure,
    /// Resume a saved adventure
    Continue,
    /// Take the advanced TypeScript quiz
    Quiz,
    /// Rewrite a saved story as a dialogue-heavy novella
    Novella,
    /// Generate an explanatory comment header for a script file
    Header {
        /// The script file to describe
        file: PathBuf,
    },
}

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = config::load()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    std::fs::create_dir_all(&config.stories_dir).with_context(|| {
        format!(
            "failed to create stories directory {}",
            config.stories_dir.display()
        )
    })?;

    // Fail on a missing API key before touching the terminal, so the
    // hint prints normally.
    let backend = OpenAiBackend::from_env()?;

    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        anyhow::bail!("quill requires a terminal (TTY)");
    }

    // Restore the terminal before printing any panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let result = dispatch(cli.command, &config, backend, &mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(message) = result? {
        println!("{message}");
    }
    Ok(())
}

/// Run one script. Returns a message to print once the terminal is
/// restored.
async fn dispatch(
    command: Command,
    config: &QuillConfig,
    backend: OpenAiBackend,
    terminal: &mut Term,
) -> anyhow::Result<Option<String>> {
    match command {
        Command::Adventure => {
            let script = Script::Adventure;
            let engine = ChatEngine::new(backend, EngineConfig::for_script(config, script));
            let session = ChatApp::new(engine, script).run(terminal).await?;

            if session.turns().is_empty() {
                return Ok(None);
            }
            let name = format!("adventure-{}.txt", chrono::Local::now().format("%Y%m%d-%H%M%S"));
            let path = config.stories_dir.join(name);
            session.save(&path)?;
            Ok(Some(format!("Story saved to {}", path.display())))
        }

        Command::Continue => {
            let script = Script::Continue;
            let picker = StoryPicker::new(&config.stories_dir)?;
            if picker.is_empty() {
                return Ok(Some(format!(
                    "No stories found in {}. Start one with `quill adventure`.",
                    config.stories_dir.display()
                )));
            }
            let Some(path) = picker.run(terminal)? else {
                return Ok(None);
            };

            let session = Session::load(&path)?;
            let engine =
                ChatEngine::with_session(backend, EngineConfig::for_script(config, script), session);
            let session = ChatApp::new(engine, script).run(terminal).await?;

            session.save(&path)?;
            Ok(Some(format!("Story saved to {}", path.display())))
        }

        Command::Quiz => {
            let script = Script::Quiz;
            let engine = ChatEngine::new(backend, EngineConfig::for_script(config, script));
            let session = ChatApp::new(engine, script).run(terminal).await?;

            if session.turns().is_empty() {
                return Ok(None);
            }
            Ok(Some(transcript::serialize(session.turns())))
        }

        Command::Novella => {
            let script = Script::Novella;
            let picker = StoryPicker::new(&config.stories_dir)?;
            if picker.is_empty() {
                return Ok(Some(format!(
                    "No stories found in {}. Start one with `quill adventure`.",
                    config.stories_dir.display()
                )));
            }
            let Some(path) = picker.run(terminal)? else {
                return Ok(None);
            };
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;

            let Some(novella) = run_editor(script, config, &backend, &contents, terminal).await?
            else {
                return Ok(None);
            };

            // The prompt asks for the file name on the first line; keep
            // only the final path component so it stays in stories_dir
            let file_name = novella
                .lines()
                .next()
                .map(str::trim)
                .filter(|line| !line.is_empty() && line.ends_with(".txt"))
                .and_then(|line| std::path::Path::new(line).file_name())
                .map_or_else(|| "novella.txt".to_string(), |n| n.to_string_lossy().into_owned());
            let out_path = config.stories_dir.join(file_name);
            std::fs::write(&out_path, &novella)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
            Ok(Some(format!("Novella saved to {}", out_path.display())))
        }

        Command::Header { file } => {
            let script = Script::Header;
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            let Some(header) = run_editor(script, config, &backend, &contents, terminal).await?
            else {
                return Ok(None);
            };

            let updated = format!("{header}\n\n{contents}").trim().to_string();
            std::fs::write(&file, updated)
                .with_context(|| format!("failed to write {}", file.display()))?;
            Ok(Some(format!("Header added to {}", file.display())))
        }
    }
}

/// Stream one generation for an editor script and let the human edit
/// the result.
async fn run_editor(
    script: Script,
    config: &QuillConfig,
    backend: &OpenAiBackend,
    input: &str,
    terminal: &mut Term,
) -> anyhow::Result<Option<String>> {
    let request = ChatRequest::new(input, &config.model)
        .with_system(script.system_prompt())
        .with_temperature(config.temperature);
    let rx = backend.send_streaming(&request).await?;
    EditorApp::new(script.title(), rx).run(terminal).await
}

/// Log to a file so tracing output never corrupts the TUI. Filtering
/// follows `RUST_LOG`; with it unset nothing is written.
fn init_logging() {
    let Some(dir) = dirs::data_dir() else { return };
    let dir = dir.join("quill");
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(dir.join("quill.log")) else {
        return;
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
