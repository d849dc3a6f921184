//! Signals delivered to a running process by its host.

use core::fmt;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Fpe,
    Ill,
    Segv,
    Bus,
    Abrt,
    Int,
    Term,
    Quit,
    Pipe,
    Io,
    Urg,
    Xcpu,
    Xfsz,
    Alrm,
    Vtalrm,
    Prof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCategory {
    /// Faults of the executing code. Fatal unless a vector is registered.
    Execution,
    /// Requests to stop. End the run unless a vector is registered.
    Termination,
    /// I/O and operation errors. Fatal unless a vector is registered.
    Operation,
    /// Timer ticks. Ignored.
    Timer,
}

impl Signal {
    pub const ALL: [Signal; 16] = [
        Signal::Fpe,
        Signal::Ill,
        Signal::Segv,
        Signal::Bus,
        Signal::Abrt,
        Signal::Int,
        Signal::Term,
        Signal::Quit,
        Signal::Pipe,
        Signal::Io,
        Signal::Urg,
        Signal::Xcpu,
        Signal::Xfsz,
        Signal::Alrm,
        Signal::Vtalrm,
        Signal::Prof,
    ];

    pub const fn category(self) -> SignalCategory {
        match self {
            Signal::Fpe | Signal::Ill | Signal::Segv | Signal::Bus => SignalCategory::Execution,
            Signal::Abrt | Signal::Int | Signal::Term | Signal::Quit => {
                SignalCategory::Termination
            }
            Signal::Pipe | Signal::Io | Signal::Urg | Signal::Xcpu | Signal::Xfsz => {
                SignalCategory::Operation
            }
            Signal::Alrm | Signal::Vtalrm | Signal::Prof => SignalCategory::Timer,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Signal::Fpe => "SIGFPE",
            Signal::Ill => "SIGILL",
            Signal::Segv => "SIGSEGV",
            Signal::Bus => "SIGBUS",
            Signal::Abrt => "SIGABRT",
            Signal::Int => "SIGINT",
            Signal::Term => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Pipe => "SIGPIPE",
            Signal::Io => "SIGIO",
            Signal::Urg => "SIGURG",
            Signal::Xcpu => "SIGXCPU",
            Signal::Xfsz => "SIGXFSZ",
            Signal::Alrm => "SIGALRM",
            Signal::Vtalrm => "SIGVTALRM",
            Signal::Prof => "SIGPROF",
        }
    }

    /// POSIX signal number on Linux, used for the `128 + n` exit status.
    pub const fn number(self) -> i32 {
        match self {
            Signal::Fpe => 8,
            Signal::Ill => 4,
            Signal::Segv => 11,
            Signal::Bus => 7,
            Signal::Abrt => 6,
            Signal::Int => 2,
            Signal::Term => 15,
            Signal::Quit => 3,
            Signal::Pipe => 13,
            Signal::Io => 29,
            Signal::Urg => 23,
            Signal::Xcpu => 24,
            Signal::Xfsz => 25,
            Signal::Alrm => 14,
            Signal::Vtalrm => 26,
            Signal::Prof => 27,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thread-safe inbox of pending signals.
///
/// Clones share the same queue: the host keeps one and raises signals from
/// any thread, the process drains it between instructions.
#[derive(Debug, Clone, Default)]
pub struct SignalQueue {
    pending: Arc<AtomicBool>,
    queue: Arc<Mutex<VecDeque<Signal>>>,
}

impl SignalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self, sig: Signal) {
        self.queue.lock().push_back(sig);
        self.pending.store(true, Ordering::Release);
    }

    #[inline(always)]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Takes every queued signal in arrival order.
    pub fn drain(&self) -> Vec<Signal> {
        let mut queue = self.queue.lock();
        self.pending.store(false, Ordering::Release);
        queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn categories() {
        assert_eq!(Signal::Segv.category(), SignalCategory::Execution);
        assert_eq!(Signal::Term.category(), SignalCategory::Termination);
        assert_eq!(Signal::Pipe.category(), SignalCategory::Operation);
        assert_eq!(Signal::Prof.category(), SignalCategory::Timer);
        assert_eq!(Signal::Int.to_string(), "SIGINT");
    }

    #[test]
    fn queue_is_shared_between_clones() {
        let queue = SignalQueue::new();
        let remote = queue.clone();
        thread::spawn(move || {
            remote.raise(Signal::Int);
            remote.raise(Signal::Alrm);
        })
        .join()
        .unwrap();
        assert!(queue.is_pending());
        assert_eq!(queue.drain(), vec![Signal::Int, Signal::Alrm]);
        assert!(!queue.is_pending());
        assert!(queue.drain().is_empty());
    }
}
