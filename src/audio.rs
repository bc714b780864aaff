//! Audio collaborator: terminal-bell chimes for game events.

use crate::game::GameEvent;
use std::io::Write;

/// Fire-and-forget bell. Write failures are swallowed; a silent terminal is
/// not an error.
#[derive(Debug)]
pub struct Chime {
    muted: bool,
}

impl Chime {
    pub fn new(muted: bool) -> Self {
        Self { muted }
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Ring for one drained event. One bell is all a terminal has; both cues
    /// map to it. Backing all the way out to a single tile is silent.
    pub fn play(&self, event: &GameEvent) {
        if self.muted {
            return;
        }
        match event {
            GameEvent::Cleared { .. } => self.ring(),
            GameEvent::Chained { len } if *len > 1 => self.ring(),
            GameEvent::Chained { .. } => {}
        }
    }

    fn ring(&self) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}
