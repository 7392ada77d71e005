use std::path::PathBuf;
use std::sync::Arc;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use portfolio_chat_core::{
    Announcer, ChatBackend, ChatError, Config, Conversation, SubmitError, Theme, WidgetShell,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Widget + conversation
    pub shell: WidgetShell<Box<dyn Announcer>>,
    pub conversation: Conversation,
    pub backend: Arc<dyn ChatBackend>,
    pub reply_task: Option<JoinHandle<Result<String, ChatError>>>,

    // Input line
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // Chat scroll state (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_total_lines: u16,
    seen_revision: u64,

    // Animation state
    pub animation_frame: u8,

    // Areas for mouse hit-testing (updated during render)
    pub launcher_area: Option<Rect>,
    pub chat_area: Option<Rect>,

    /// Where theme changes are saved; `None` keeps them in memory only
    pub theme_store: Option<PathBuf>,
}

impl App {
    pub fn new(config: &Config, backend: Arc<dyn ChatBackend>, announcer: Box<dyn Announcer>) -> Self {
        let shell = WidgetShell::new(announcer, config.welcome_phrase.clone())
            .with_theme(config.theme);

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            shell,
            conversation: Conversation::new(config.greeting.clone()),
            backend,
            reply_task: None,

            input: String::new(),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_total_lines: 0,
            seen_revision: 0,

            animation_frame: 0,

            launcher_area: None,
            chat_area: None,

            theme_store: None,
        }
    }

    pub fn open_widget(&mut self) {
        self.shell.open();
        self.input_mode = InputMode::Editing;
    }

    pub fn close_widget(&mut self) {
        self.shell.close();
        self.input_mode = InputMode::Normal;
    }

    pub fn cycle_theme(&mut self) -> Theme {
        let theme = self.shell.cycle_theme();
        if let Some(path) = &self.theme_store {
            if let Err(e) = Config::save_theme_to(path, theme) {
                warn!(error = %e, "failed to save theme");
            }
        }
        theme
    }

    /// Send the input line. Blank input, or input while a reply is pending,
    /// is left in place untouched.
    pub fn submit_input(&mut self) {
        match self.conversation.begin_submit(&self.input) {
            Ok(message) => {
                self.input.clear();
                self.input_cursor = 0;

                let backend = Arc::clone(&self.backend);
                self.reply_task = Some(tokio::spawn(async move {
                    backend.send(&message).await
                }));
            }
            Err(SubmitError::EmptyInput) => {}
            Err(e @ SubmitError::Pending) => debug!(error = %e, "submit ignored"),
        }
    }

    /// Collect the reply if the request task has finished.
    pub async fn poll_reply(&mut self) {
        let finished = self
            .reply_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.reply_task.take() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "chat request task failed");
                    Err(ChatError::Task(e.to_string()))
                }
            };
            self.conversation.resolve(outcome);
        }
    }

    /// True once per conversation transition; the renderer then jumps to
    /// the newest message.
    pub fn take_follow_latest(&mut self) -> bool {
        let revision = self.conversation.revision();
        if revision == self.seen_revision {
            return false;
        }
        self.seen_revision = revision;
        true
    }

    pub fn max_chat_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        let bouncing = !self.shell.is_open() && !self.shell.visible_hints().is_empty();
        if self.conversation.is_pending() || bouncing {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portfolio_chat_core::{NullAnnouncer, FALLBACK_REPLY};
    use std::time::Duration;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn send(&self, message: &str) -> Result<String, ChatError> {
            Ok(format!("echo: {message}"))
        }
    }

    struct DownBackend;

    #[async_trait]
    impl ChatBackend for DownBackend {
        async fn send(&self, _message: &str) -> Result<String, ChatError> {
            Err(ChatError::MalformedResponse("down".to_string()))
        }
    }

    fn app_with(backend: Arc<dyn ChatBackend>) -> App {
        App::new(&Config::new(), backend, Box::new(NullAnnouncer))
    }

    async fn wait_for_reply(app: &mut App) {
        for _ in 0..100 {
            app.poll_reply().await;
            if app.reply_task.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reply never arrived");
    }

    #[tokio::test]
    async fn test_submit_round_trip() {
        let mut app = app_with(Arc::new(EchoBackend));
        app.input = " hello ".to_string();
        app.input_cursor = 7;

        app.submit_input();
        assert!(app.input.is_empty());
        assert_eq!(app.input_cursor, 0);
        assert!(app.conversation.is_pending());

        wait_for_reply(&mut app).await;
        let log = app.conversation.messages();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2].text(), "echo: hello");
    }

    #[tokio::test]
    async fn test_failure_shows_fallback() {
        let mut app = app_with(Arc::new(DownBackend));
        app.input = "hi".to_string();
        app.submit_input();

        wait_for_reply(&mut app).await;
        assert_eq!(app.conversation.messages()[2].text(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_blank_input_is_kept_and_not_sent() {
        let mut app = app_with(Arc::new(EchoBackend));
        app.input = "   ".to_string();
        app.submit_input();

        assert!(app.reply_task.is_none());
        assert_eq!(app.input, "   ");
        assert_eq!(app.conversation.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_second_submit_while_pending_keeps_input() {
        let mut app = app_with(Arc::new(EchoBackend));
        app.input = "first".to_string();
        app.submit_input();

        app.input = "second".to_string();
        app.submit_input();
        assert_eq!(app.input, "second");
        assert_eq!(app.conversation.messages().len(), 2);

        wait_for_reply(&mut app).await;
        assert_eq!(app.conversation.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_follow_latest_once_per_transition() {
        let mut app = app_with(Arc::new(EchoBackend));
        assert!(!app.take_follow_latest());

        app.input = "hey".to_string();
        app.submit_input();
        assert!(app.take_follow_latest());
        assert!(!app.take_follow_latest());
    }

    #[test]
    fn test_open_and_close_switch_input_mode() {
        let mut app = app_with(Arc::new(EchoBackend));
        app.open_widget();
        assert!(app.shell.is_open());
        assert_eq!(app.input_mode, InputMode::Editing);

        app.close_widget();
        assert!(!app.shell.is_open());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_theme_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut app = app_with(Arc::new(EchoBackend));
        app.theme_store = Some(path.clone());

        assert_eq!(app.cycle_theme(), Theme::Light);
        assert_eq!(Config::load_from(&path).unwrap().theme, Theme::Light);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = app_with(Arc::new(EchoBackend));
        app.chat_total_lines = 30;
        app.chat_height = 10;

        app.scroll_down(50);
        assert_eq!(app.chat_scroll, 20);
        app.scroll_up(5);
        assert_eq!(app.chat_scroll, 15);
        app.scroll_up(50);
        assert_eq!(app.chat_scroll, 0);
    }
}
