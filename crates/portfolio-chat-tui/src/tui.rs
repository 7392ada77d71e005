use std::io::{self, Stderr};
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use portfolio_chat_core::Hint;
use tokio::sync::mpsc::{self, UnboundedSender};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
    HintExpired(Hint),
}

impl AppEvent {
    /// Terminal events the app cares about. Key releases and focus changes are dropped.
    fn from_terminal(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
            Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
            Event::Resize(..) => Some(AppEvent::Resize),
            _ => None,
        }
    }
}

/// Single queue feeding the event loop: terminal input, ticks, and hint timers.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let handler = Self::without_sources();
        spawn_terminal_reader(handler.tx.clone());
        spawn_ticker(handler.tx.clone(), tick_rate);
        handler
    }

    /// A queue with nothing feeding it yet
    fn without_sources() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    /// Start one fire-once timer per hint. They are never cancelled.
    pub fn schedule_hints(&self, schedule: Vec<(Hint, Duration)>) {
        for (hint, delay) in schedule {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(AppEvent::HintExpired(hint));
            });
        }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

fn spawn_terminal_reader(tx: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        while let Some(evt) = reader.next().await {
            let Some(event) = evt.ok().and_then(AppEvent::from_terminal) else {
                continue;
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}

// Ticks drive the animations and wake the loop to collect finished replies
fn spawn_ticker(tx: UnboundedSender<AppEvent>, tick_rate: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_rate);
        loop {
            interval.tick().await;
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
