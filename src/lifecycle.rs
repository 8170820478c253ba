use core::sync::atomic::{AtomicU8, Ordering};

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LoopState {
    /// Loops keep receiving and transmitting
    #[default]
    Listening = 1,
    /// Loops return at their next check
    Done = 5,
}

/// Shutdown signal shared by the ingest and transmit loops.
///
/// Starts out listening and moves to done exactly once; there is no way back.
/// The ingest loop only looks at it between frames, so on a silent bus it
/// notices the transition after the next frame arrives.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(LoopState::Listening as u8),
        }
    }

    pub fn state(&self) -> LoopState {
        // Only the two valid discriminants are ever stored
        LoopState::try_from(self.state.load(Ordering::Acquire)).unwrap_or(LoopState::Done)
    }

    pub fn is_listening(&self) -> bool {
        self.state() == LoopState::Listening
    }

    /// Asks both loops to stop
    pub fn finish(&self) {
        self.state.store(LoopState::Done.into(), Ordering::Release);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
