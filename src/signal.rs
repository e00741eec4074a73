//! Ctrl-C handling.
//!
//! SIGINT must never end the shell. The handler only raises an atomic flag;
//! the session loop looks at the flag once control is back in ordinary code
//! and does any printing there.

use signal_hook::consts::SIGINT;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Records that SIGINT arrived since the last [`InterruptFlag::take`].
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// Register the SIGINT handler for this process.
    ///
    /// Once registered, SIGINT no longer terminates the shell. Children get
    /// the default disposition back when they exec.
    pub fn install() -> io::Result<Self> {
        let flag = Self::default();
        signal_hook::flag::register(SIGINT, Arc::clone(&flag.raised))?;
        debug!("SIGINT handler installed");
        Ok(flag)
    }

    /// A flag that no signal handler sets.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Whether SIGINT arrived since the last call, clearing the flag.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::Relaxed)
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Relaxed);
    }
}
