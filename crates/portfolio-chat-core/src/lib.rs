pub mod announcer;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod render;
pub mod shell;
pub mod state;

// Re-export main types for convenience
pub use announcer::{Announcer, CommandAnnouncer, NullAnnouncer};
pub use client::{ChatBackend, HttpChatClient, FALLBACK_REPLY};
pub use config::Config;
pub use conversation::{Conversation, Phase};
pub use error::{ChatError, SubmitError};
pub use render::{render, render_blocks, Block, Segment};
pub use shell::{Hint, Theme, WidgetShell};
pub use state::{Message, Sender};
