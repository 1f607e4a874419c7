use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Cancellation flag shared between the transfer and whoever may stop it.
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    raised: Arc<AtomicBool>,
    reason: Arc<Mutex<Option<String>>>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.reason.lock() {
            slot.get_or_insert_with(|| reason.into());
        }
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Raises the signal from a watchdog thread once `after` has elapsed.
    pub fn abort_after(&self, after: Duration, reason: impl Into<String>) {
        let signal = self.clone();
        let reason = reason.into();
        thread::spawn(move || {
            thread::sleep(after);
            signal.abort(reason);
        });
    }

    pub fn is_aborted(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<String> {
        self.reason.lock().ok().and_then(|r| r.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reason_wins() {
        let signal = AbortSignal::new();
        let handle = signal.clone();
        assert!(!signal.is_aborted());

        handle.abort("operator stop");
        handle.abort("second");
        assert!(signal.is_aborted());
        assert_eq!(signal.reason().as_deref(), Some("operator stop"));
    }

    #[test]
    fn watchdog_raises_signal() {
        let signal = AbortSignal::new();
        signal.abort_after(Duration::from_millis(10), "gave up");

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !signal.is_aborted() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(signal.is_aborted());
        assert_eq!(signal.reason().as_deref(), Some("gave up"));
    }
}
