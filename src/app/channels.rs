//! Sample stream and stop signal shared between the signal source and
//! the control loop.
//!
//! Uses `embassy-sync` primitives so the source can push from its own
//! callback thread while the loop awaits without busy-waiting.
//!
//! ```text
//! ┌──────────────┐  i32 sample  ┌──────────────┐
//! │ SignalSource │─────────────▶│  ControlLoop │
//! │ (any thread) │  SampleFeed  │  (async)     │
//! └──────────────┘              └──────────────┘
//!                     StopSignal ──▶ (pre-empts pacing + receive)
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::warn;

/// Channel depth for pending samples.
pub const SAMPLE_DEPTH: usize = 16;

/// Raw attention values, validated by the consumer.
pub type SampleChannel = Channel<CriticalSectionRawMutex, i32, SAMPLE_DEPTH>;

/// Raised once to move the loop into draining.
pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

struct FeedShared {
    channel: SampleChannel,
    dropped: AtomicU32,
    closed: AtomicBool,
}

/// Producer handle given to a [`SignalSource`](super::ports::SignalSource).
///
/// Cheap to clone; every clone feeds the same single consumer.
#[derive(Clone)]
pub struct SampleFeed {
    shared: Arc<FeedShared>,
}

impl SampleFeed {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(FeedShared {
                channel: Channel::new(),
                dropped: AtomicU32::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Push one raw reading. Returns `false` if it was not queued.
    pub fn push(&self, raw: i32) -> bool {
        if self.shared.closed.load(Ordering::Acquire) {
            return false;
        }
        if self.shared.channel.try_send(raw).is_err() {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("FEED: sample channel full, dropping attention={}", raw);
            return false;
        }
        true
    }

    /// Stop accepting pushes. Late pushes are ignored, not counted.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Samples lost to a full channel.
    pub fn dropped(&self) -> u32 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Close the feed and discard whatever is still queued.
    /// Returns how many samples were left unprocessed.
    pub fn drain(&self) -> u32 {
        self.close();
        let mut left = 0;
        while self.shared.channel.try_receive().is_ok() {
            left += 1;
        }
        left
    }

    pub(crate) fn channel(&self) -> &SampleChannel {
        &self.shared.channel
    }
}

impl Default for SampleFeed {
    fn default() -> Self {
        Self::new()
    }
}
