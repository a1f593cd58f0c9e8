mod api;
mod app;
mod store;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use shared::{ChatResponse, Role};
use tokio::sync::mpsc;

use api::GatewayClient;
use app::{App, KeyAction};
use store::{HistoryStore, JsonFileStore, DEFAULT_HISTORY_FILE};

/// Terminal chat client for the Gemini chat gateway
#[derive(Parser, Debug)]
#[command(name = "gemchat-client", version, about)]
struct Args {
    /// Chat endpoint of the gateway
    #[arg(long, default_value = "http://127.0.0.1:3001/api/chat")]
    url: String,

    /// File the conversation is kept in
    #[arg(long, default_value = DEFAULT_HISTORY_FILE)]
    history: PathBuf,

    /// Write logs to this file
    #[arg(long)]
    log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log {
        let file = std::fs::File::create(path)?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let gateway = GatewayClient::new(&args.url);
    let mut app = App::new(JsonFileStore::new(&args.history));

    // Replies from in-flight turns
    let (tx, mut rx) = mpsc::channel::<Result<ChatResponse, String>>(8);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &gateway, tx, &mut rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run<B: Backend, S: HistoryStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    gateway: &GatewayClient,
    tx: mpsc::Sender<Result<ChatResponse, String>>,
    rx: &mut mpsc::Receiver<Result<ChatResponse, String>>,
) -> Result<()> {
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| ui(f, app))?;

        tokio::select! {
            Some(outcome) = rx.recv() => {
                app.receive(outcome);
            }
            event = events.next() => {
                let Some(event) = event else { break };
                let Event::Key(key) = event? else { continue };
                match app.handle_key(key) {
                    KeyAction::Quit => break,
                    KeyAction::Send(request) => {
                        let gateway = gateway.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let outcome = gateway.send(&request).await.map_err(|e| format!("{:#}", e));
                            let _ = tx.send(outcome).await;
                        });
                    }
                    KeyAction::None => {}
                }
            }
        }
    }

    Ok(())
}

fn ui<S: HistoryStore>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(f.area());

    let mut messages: Vec<ListItem> = app
        .messages
        .iter()
        .map(|m| {
            let (speaker, style) = match m.role {
                Role::User => ("You", Style::default().fg(Color::Cyan)),
                Role::Bot => ("Bot", Style::default().fg(Color::Green)),
            };
            let mut lines = Vec::new();
            if m.image.is_some() {
                lines.push(Line::from(Span::styled(format!("{}: [image]", speaker), style)));
            }
            for (i, text) in m.text.lines().enumerate() {
                let prefix = if i == 0 { format!("{}: ", speaker) } else { "     ".to_string() };
                lines.push(Line::from(vec![Span::styled(prefix, style), Span::raw(text.to_string())]));
            }
            ListItem::new(lines)
        })
        .collect();
    if app.loading {
        messages.push(ListItem::new(Line::from(Span::styled(
            "Bot is typing...",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let messages_widget = List::new(messages)
        .block(Block::default().borders(Borders::ALL).title("Chat (Esc quit, Ctrl+L clear)"));

    f.render_widget(messages_widget, chunks[0]);

    let title = match (&app.status, app.pending_image.is_some()) {
        (Some(status), _) => format!("Input - {}", status),
        (None, true) => "Input - image attached".to_string(),
        (None, false) => "Input".to_string(),
    };
    let input = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });

    f.render_widget(input, chunks[1]);
}
