use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod ai;
mod app;
mod browser;
mod config;
mod db;
mod error;
mod models;
mod services;
mod tui;

use app::App;
use config::Config;
use error::Result;
use models::{Content, PageAnalysis};
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    // Listing, search and show only read the store
    let mode = args.get(1).map(String::as_str);
    let needs_llm = match mode {
        Some("--process" | "--process-file") | None => true,
        Some(other) => !other.starts_with("--"),
    };

    // Initialize app
    let mut app = App::new(&config, needs_llm).await?;

    // Headless modes
    match mode {
        Some("--process") if args.len() >= 3 => {
            let analysis = app.process_url(&args[2]).await?;
            print_analysis(&analysis);
            return Ok(());
        }
        Some("--process-file") if args.len() >= 3 => {
            let path = PathBuf::from(&args[2]);
            let analysis = app.process_file(&path, args.get(3).map(String::as_str)).await?;
            print_analysis(&analysis);
            return Ok(());
        }
        Some("--categories") => {
            for category in app.list_categories().await? {
                println!("{:>5}  {}", category.id, category.name);
            }
            return Ok(());
        }
        Some("--search") if args.len() >= 3 => {
            print_content(&app.search(&args[2..].join(" ")).await?);
            return Ok(());
        }
        Some("--show") if args.len() >= 3 => {
            let id: i64 = args[2]
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid content id: {}", args[2]))?;
            match app.show(id).await? {
                Some((content, categories)) => {
                    print_content(std::slice::from_ref(&content));
                    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
                    println!("    Categories: {}", names.join(", "));
                    println!();
                    println!("{}", content.full_text);
                }
                None => println!("No content with id {}", id),
            }
            return Ok(());
        }
        Some(other) if other.starts_with("--") => {
            eprintln!(
                "Usage: page-knowledge [--process <url> | --process-file <path> [url] | --categories | --search <query> | --show <id>]"
            );
            return Ok(());
        }
        _ => {}
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Pick up pages finished in the background
        app.poll_process_result().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.input_mode, app.show_help) {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

fn print_analysis(analysis: &PageAnalysis) {
    println!("Categories: {}", analysis.categories.join(", "));
    println!("Topics:     {}", analysis.topics.join(", "));
    println!();
    println!("{}", analysis.summary);
}

fn print_content(entries: &[Content]) {
    if entries.is_empty() {
        println!("No matches");
        return;
    }
    for entry in entries {
        println!("{}  {}", entry.created_at.format("%Y-%m-%d %H:%M"), entry.title);
        println!("    {}", entry.url);
        if !entry.summary.is_empty() {
            println!("    {}", entry.summary);
        }
    }
}
