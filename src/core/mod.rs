pub mod acquisition;
pub mod clock;
pub mod order_submit;
pub mod pricing;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set from the Ctrl-C handler. Loops check it before every exchange call.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Counters for one acquisition run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunStats {
    pub candle_polls: u64,
    pub candle_errors: u64,
    pub submissions: u64,
    pub protection_waits: u64,
    pub price_lowered: u64,
    pub price_raised: u64,
    pub generic_rejections: u64,
    pub transport_failures: u64,
    pub placed: bool,
}
