//! Spoken announcements
//!
//! Speech is best-effort: when the host has no text-to-speech program the
//! announcer quietly does nothing.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use tracing::{debug, warn};

/// Checked in order; the first one on `PATH` wins.
const SPEECH_PROGRAMS: &[&str] = &["say", "espeak-ng", "espeak", "spd-say"];

pub trait Announcer: Send {
    /// Speak `text`, cutting off anything still playing.
    fn speak(&mut self, text: &str);

    fn cancel(&mut self);
}

impl<A: Announcer + ?Sized> Announcer for Box<A> {
    fn speak(&mut self, text: &str) {
        (**self).speak(text)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}

/// Used when speech is turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn speak(&mut self, _text: &str) {}

    fn cancel(&mut self) {}
}

/// Speaks through a system TTS program run as a child process.
pub struct CommandAnnouncer {
    program: Option<PathBuf>,
    child: Option<Child>,
    /// Killed children that had not exited yet when last checked
    stopping: Vec<Child>,
}

impl CommandAnnouncer {
    pub fn detect() -> Self {
        let program = SPEECH_PROGRAMS
            .iter()
            .find_map(|name| which::which(name).ok());

        match &program {
            Some(path) => debug!(program = %path.display(), "speech enabled"),
            None => debug!("no speech program found, announcements disabled"),
        }

        Self::with_program(program)
    }

    pub fn with_program(program: Option<PathBuf>) -> Self {
        Self { program, child: None, stopping: Vec::new() }
    }

    pub fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    /// Also reaps an utterance that has finished on its own.
    pub fn is_speaking(&mut self) -> bool {
        self.reap_stopped();
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) | Err(_) => {
                self.child = None;
                false
            }
        }
    }

    fn reap_stopped(&mut self) {
        self.stopping.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl Announcer for CommandAnnouncer {
    fn speak(&mut self, text: &str) {
        self.cancel();

        let Some(program) = &self.program else {
            return;
        };

        match Command::new(program)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => self.child = Some(child),
            Err(e) => warn!(error = %e, program = %program.display(), "failed to start speech"),
        }
    }

    fn cancel(&mut self) {
        self.reap_stopped();
        if let Some(mut child) = self.child.take() {
            // Already exited is fine
            let _ = child.kill();
            if matches!(child.try_wait(), Ok(None)) {
                self.stopping.push(child);
            }
        }
    }
}

impl Drop for CommandAnnouncer {
    fn drop(&mut self) {
        self.cancel();
        // Everything here has been killed, so these waits are short
        for mut child in self.stopping.drain(..) {
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_is_silent() {
        let mut announcer = CommandAnnouncer::with_program(None);
        assert!(!announcer.is_supported());
        announcer.speak("hello");
        assert!(!announcer.is_speaking());
        announcer.cancel();
    }

    #[test]
    fn test_missing_program_does_not_panic() {
        let mut announcer =
            CommandAnnouncer::with_program(Some(PathBuf::from("/nonexistent/speech-binary")));
        announcer.speak("hello");
        assert!(!announcer.is_speaking());
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_stops_playback() {
        // `sleep` stands in for a long utterance
        let Ok(sleep) = which::which("sleep") else {
            return;
        };
        let mut announcer = CommandAnnouncer::with_program(Some(sleep));
        announcer.speak("30");
        assert!(announcer.is_speaking());

        announcer.cancel();
        assert!(!announcer.is_speaking());
        assert!(announcer.child.is_none());

        for _ in 0..100 {
            announcer.reap_stopped();
            if announcer.stopping.is_empty() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("killed speech process was never reaped");
    }

    #[cfg(unix)]
    #[test]
    fn test_finished_utterance_is_reaped() {
        // `true` exits straight away, like a very short phrase
        let Ok(program) = which::which("true") else {
            return;
        };
        let mut announcer = CommandAnnouncer::with_program(Some(program));
        announcer.speak("hi");

        for _ in 0..100 {
            if !announcer.is_speaking() {
                assert!(announcer.child.is_none());
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("speech process still running");
    }
}
