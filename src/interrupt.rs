//! the process interrupt signal.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// raised once an interrupt arrives. clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
}

// === impl Interrupt ===

impl Interrupt {
    /// installs a process-wide handler that raises the returned flag on `SIGINT`.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let interrupt = Self::default();
        let handler = interrupt.clone();
        ctrlc::set_handler(move || handler.raise())?;
        Ok(interrupt)
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::thread};

    #[test]
    fn starts_lowered() {
        assert!(!Interrupt::default().is_raised());
    }

    #[test]
    fn clones_share_the_flag() {
        let interrupt = Interrupt::default();
        let handler = interrupt.clone();
        thread::spawn(move || handler.raise()).join().unwrap();
        assert!(interrupt.is_raised());
    }
}
