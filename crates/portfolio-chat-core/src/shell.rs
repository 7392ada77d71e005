//! Widget shell: visibility, theme and onboarding hints.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::announcer::Announcer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Accent,
}

impl Theme {
    /// Order the theme button walks through.
    pub const CYCLE: [Theme; 3] = [Theme::Dark, Theme::Light, Theme::Accent];

    pub fn next(self) -> Theme {
        let i = Self::CYCLE.iter().position(|t| *t == self).unwrap_or(0);
        Self::CYCLE[(i + 1) % Self::CYCLE.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Accent => "accent",
        }
    }
}

/// Onboarding hints shown around the closed launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hint {
    /// Launcher bounce
    Attention,
    Tooltip,
    Notify,
}

impl Hint {
    pub const ALL: [Hint; 3] = [Hint::Attention, Hint::Tooltip, Hint::Notify];

    /// How long after mount the hint dismisses itself.
    pub fn delay(self) -> Duration {
        match self {
            Hint::Tooltip => Duration::from_secs(5),
            Hint::Notify => Duration::from_secs(7),
            Hint::Attention => Duration::from_secs(8),
        }
    }

    /// Timers to start once when the widget mounts.
    pub fn schedule() -> Vec<(Hint, Duration)> {
        Self::ALL.iter().map(|h| (*h, h.delay())).collect()
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            Hint::Tooltip => Some("Need help?"),
            Hint::Notify => Some("ASK ME ANYTHING!"),
            Hint::Attention => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Hint::Attention => 0,
            Hint::Tooltip => 1,
            Hint::Notify => 2,
        }
    }
}

pub struct WidgetShell<A: Announcer> {
    is_open: bool,
    theme: Theme,
    hints: [bool; 3],
    welcome_phrase: String,
    announcer: A,
}

impl<A: Announcer> WidgetShell<A> {
    /// A closed widget with every hint showing.
    pub fn new(announcer: A, welcome_phrase: impl Into<String>) -> Self {
        Self {
            is_open: false,
            theme: Theme::default(),
            hints: [true; 3],
            welcome_phrase: welcome_phrase.into(),
            announcer,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn announcer(&self) -> &A {
        &self.announcer
    }

    pub fn is_hint_active(&self, hint: Hint) -> bool {
        self.hints[hint.index()]
    }

    pub fn dismiss_hint(&mut self, hint: Hint) {
        if self.hints[hint.index()] {
            debug!(?hint, "hint dismissed");
            self.hints[hint.index()] = false;
        }
    }

    /// Hints to draw right now. Nothing is drawn over an open panel.
    pub fn visible_hints(&self) -> Vec<Hint> {
        if self.is_open {
            return Vec::new();
        }
        Hint::ALL
            .into_iter()
            .filter(|h| self.is_hint_active(*h))
            .collect()
    }

    /// Opening stops the launcher bounce for good. Tooltip and notify keep
    /// their own timers and show again on close until those fire.
    pub fn open(&mut self) {
        if self.is_open {
            return;
        }
        self.is_open = true;
        self.dismiss_hint(Hint::Attention);
        self.announcer.speak(&self.welcome_phrase);
    }

    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.announcer.cancel();
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        if self.is_open {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn cycle_theme(&mut self) -> Theme {
        self.theme = self.theme.next();
        self.theme
    }
}
