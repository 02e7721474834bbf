//! Terminal event loop for the chat interface

use crate::agent::TurnOutcome;
use crate::config::Config;
use crate::controller::ConversationController;
use crate::ui::commands::{ParsedCommand, SlashCommand, get_help_text};
use crate::ui::composer::{Composer, ComposerResult};
use crate::ui::history::HistoryView;
use anyhow::Result;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use std::io;
use std::path::PathBuf;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Chat application state: the controller plus view-only concerns.
struct ChatApp {
    controller: ConversationController,
    composer: Composer,
    config: Config,
    notice: Option<String>,
    scroll_from_bottom: usize,
    should_quit: bool,
}

impl ChatApp {
    fn new(controller: ConversationController, config: Config) -> Self {
        Self {
            controller,
            composer: Composer::new("How can I help you today?"),
            config,
            notice: None,
            scroll_from_bottom: 0,
            should_quit: false,
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(frame.size());

        let history = HistoryView {
            messages: self.controller.snapshot(),
            pending: self.controller.is_pending(),
            error: self.controller.last_error(),
            thinking_label: &self.config.ui.thinking_label,
            show_timestamps: self.config.ui.show_timestamps,
            scroll_from_bottom: self.scroll_from_bottom,
        };
        frame.render_widget(history, chunks[0]);

        let status = match &self.notice {
            Some(notice) => notice.clone(),
            None if self.controller.is_pending() => "waiting for the agent...".to_string(),
            None => "idle".to_string(),
        };
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
            chunks[1],
        );

        frame.render_widget(&self.composer, chunks[2]);
    }

    fn handle_key(&mut self, key: KeyEvent, request_tx: &mpsc::UnboundedSender<(Uuid, String)>) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Up | KeyCode::PageUp => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(1);
                return;
            }
            KeyCode::Down | KeyCode::PageDown => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(1);
                return;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.notice = None;
                self.scroll_from_bottom = 0;
                if let Some((thread_id, text)) = self.controller.accept(&input) {
                    // One request per accepted submission; the worker task
                    // sends exactly one terminal outcome back.
                    let _ = request_tx.send((thread_id, text));
                    self.composer.set_locked(true);
                }
            }
            ComposerResult::Command(command) => self.handle_command(command),
            ComposerResult::None => {}
        }
    }

    fn handle_command(&mut self, command: ParsedCommand) {
        match command.command {
            SlashCommand::New => {
                if self.controller.reset_session() {
                    self.notice = Some("Started a new conversation".to_string());
                    self.scroll_from_bottom = 0;
                } else {
                    self.notice = Some("Wait for the current reply first".to_string());
                }
            }
            SlashCommand::Save => {
                let path = command
                    .argument()
                    .map(PathBuf::from)
                    .unwrap_or_else(default_transcript_path);
                self.notice = Some(match self.controller.save_transcript(&path) {
                    Ok(()) => format!("Saved transcript to {}", path.display()),
                    Err(e) => format!("Could not save transcript: {}", e),
                });
            }
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
            }
            SlashCommand::Bye => {
                self.should_quit = true;
            }
        }
    }

    fn apply_outcome(&mut self, outcome: TurnOutcome) {
        self.controller.resolve(outcome);
        self.composer.set_locked(false);
        self.scroll_from_bottom = 0;
    }
}

fn default_transcript_path() -> PathBuf {
    PathBuf::from(format!(
        "parley-{}.json",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ))
}

/// Run the chat TUI until the user exits.
pub async fn run(config: Config) -> Result<()> {
    let controller = ConversationController::new(&config)?;
    let client = controller.client();

    // Accepted submissions go to a worker task; each one comes back as a
    // single terminal outcome drained by the render loop.
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<(Uuid, String)>();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<TurnOutcome>();

    tokio::spawn(async move {
        while let Some((thread_id, text)) = request_rx.recv().await {
            let outcome = client.send_turn(thread_id, &text).await;
            if outcome_tx.send(outcome).is_err() {
                break;
            }
        }
    });

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, ChatApp::new(controller, config), &request_tx, &mut outcome_rx).await;

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: ChatApp,
    request_tx: &mpsc::UnboundedSender<(Uuid, String)>,
    outcome_rx: &mut mpsc::UnboundedReceiver<TurnOutcome>,
) -> Result<()> {
    loop {
        while let Ok(outcome) = outcome_rx.try_recv() {
            app.apply_outcome(outcome);
        }

        terminal.draw(|frame| app.draw(frame))?;

        if event::poll(std::time::Duration::from_millis(60))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == crossterm::event::KeyEventKind::Press {
                    app.handle_key(key, request_tx);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
