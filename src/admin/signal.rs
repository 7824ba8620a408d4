//! Last signal requested through the admin surface.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Signal most recently requested over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RequestedSignal {
    #[default]
    None = 0,
    Kill = 1,
    Quit = 2,
    Hangup = 3,
}

impl RequestedSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestedSignal::None => "none",
            RequestedSignal::Kill => "kill",
            RequestedSignal::Quit => "quit",
            RequestedSignal::Hangup => "hangup",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => RequestedSignal::Kill,
            2 => RequestedSignal::Quit,
            3 => RequestedSignal::Hangup,
            _ => RequestedSignal::None,
        }
    }
}

impl fmt::Display for RequestedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free cell holding a [`RequestedSignal`].
#[derive(Debug, Default)]
pub struct SignalRecord(AtomicU8);

impl SignalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, signal: RequestedSignal) {
        self.0.store(signal as u8, Ordering::SeqCst);
    }

    pub fn get(&self) -> RequestedSignal {
        RequestedSignal::from_u8(self.0.load(Ordering::SeqCst))
    }
}
