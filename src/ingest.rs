use embedded_can::{blocking::Can, Error as _, ErrorKind, Frame};
use embedded_hal::delay::DelayNs;

use crate::{Decoder, Lifecycle, SharedRecord};

/// What one pass of the ingest loop did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IngestOutcome {
    /// The frame was in the window; this many fields were written (possibly
    /// none, for unknown sub-identifiers)
    Applied(usize),
    /// The frame's identifier was outside the window
    Ignored,
    /// The driver reported an error instead of a frame
    BusError(#[cfg_attr(feature = "defmt", defmt(Debug2Format))] ErrorKind),
}

/// Receives frames from the oven bus and folds them into the shared record.
///
/// Owns the bus handle for as long as it runs; [`IngestLoop::run`] gives it
/// back once the lifecycle is finished.
pub struct IngestLoop<'a, C, D> {
    bus: C,
    delay: D,
    decoder: Decoder<'a>,
    record: &'a SharedRecord,
    lifecycle: &'a Lifecycle,
    yield_ms: u32,
}

impl<'a, C, D> IngestLoop<'a, C, D>
where
    C: Can,
    D: DelayNs,
{
    pub fn new(
        bus: C,
        delay: D,
        decoder: Decoder<'a>,
        record: &'a SharedRecord,
        lifecycle: &'a Lifecycle,
        yield_ms: u32,
    ) -> Self {
        Self {
            bus,
            delay,
            decoder,
            record,
            lifecycle,
            yield_ms,
        }
    }

    /// Waits for the next frame and applies it. Blocks for as long as the
    /// driver's `receive` does.
    pub fn poll(&mut self) -> IngestOutcome {
        let frame = match self.bus.receive() {
            Ok(frame) => frame,
            Err(error) => {
                let kind = error.kind();
                log::debug!("CAN receive failed: {:?}", kind);
                self.delay.delay_ms(self.yield_ms);
                return IngestOutcome::BusError(kind);
            }
        };

        if !self.decoder.accepts(frame.id()) {
            return IngestOutcome::Ignored;
        }

        let updates = self.decoder.decode(&frame);
        self.record.apply_updates(&updates);

        self.delay.delay_ms(self.yield_ms);

        IngestOutcome::Applied(updates.len())
    }

    /// Polls until the lifecycle is finished, then returns the bus
    pub fn run(mut self) -> C {
        log::info!("Listening on CAN bus");

        while self.lifecycle.is_listening() {
            self.poll();
        }

        log::info!("CAN listener stopped");

        self.bus
    }
}

#[cfg(test)]
mod tests {
    use embedded_can::{blocking::Can, ErrorKind, Frame, StandardId};
    use embedded_hal::delay::DelayNs;
    use heapless::Deque;

    use crate::{
        Decoder, Field, IngestLoop, IngestOutcome, Lifecycle, OvenFrame, OvenRecord,
        SharedRecord,
    };

    /// Replays queued frames, then finishes the lifecycle and reports
    /// overruns forever
    struct ScriptedBus<'a> {
        frames: Deque<Result<OvenFrame, ErrorKind>, 16>,
        lifecycle: &'a Lifecycle,
    }

    impl<'a> ScriptedBus<'a> {
        fn new(lifecycle: &'a Lifecycle) -> Self {
            Self {
                frames: Deque::new(),
                lifecycle,
            }
        }

        fn push(&mut self, item: Result<OvenFrame, ErrorKind>) {
            self.frames.push_back(item).unwrap();
        }
    }

    impl Can for ScriptedBus<'_> {
        type Frame = OvenFrame;
        type Error = ErrorKind;

        fn transmit(&mut self, _frame: &Self::Frame) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }

        fn receive(&mut self) -> Result<Self::Frame, Self::Error> {
            self.frames.pop_front().unwrap_or_else(|| {
                self.lifecycle.finish();
                Err(ErrorKind::Overrun)
            })
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    fn frame(raw_id: u16, sub_id: u16, values: [u16; 3]) -> OvenFrame {
        OvenFrame::with_words(StandardId::new(raw_id).unwrap(), sub_id, values)
    }

    #[test]
    fn poll_outcomes() {
        let lifecycle = Lifecycle::new();
        let record = SharedRecord::default();
        let mut bus = ScriptedBus::new(&lifecycle);

        bus.push(Ok(frame(0x281, 0x66, [150, 0, 900])));
        bus.push(Ok(frame(0x100, 0x66, [1, 0, 1])));
        bus.push(Ok(frame(0x281, 0x1234, [1, 2, 3])));
        bus.push(Err(ErrorKind::Crc));

        let mut ingest = IngestLoop::new(
            bus,
            CountingDelay::default(),
            Decoder::default(),
            &record,
            &lifecycle,
            5,
        );

        assert_eq!(ingest.poll(), IngestOutcome::Applied(2));
        assert_eq!(ingest.poll(), IngestOutcome::Ignored);
        assert_eq!(ingest.poll(), IngestOutcome::Applied(0));
        assert_eq!(ingest.poll(), IngestOutcome::BusError(ErrorKind::Crc));

        // Yields after the two in-window frames and the error, not the ignored frame
        assert_eq!(ingest.delay.total_ns, 3 * 5_000_000);

        let snapshot = record.snapshot();
        assert_eq!(snapshot.get(Field::TempExhaust), 150);
        assert_eq!(snapshot.get(Field::VentilatorRpm), 900);
        assert!(lifecycle.is_listening());
    }

    #[test]
    fn run_stops_when_lifecycle_finishes() {
        let lifecycle = Lifecycle::new();
        let record = SharedRecord::default();
        let mut bus = ScriptedBus::new(&lifecycle);

        bus.push(Ok(frame(0x281, 0x9c, [0, 0, 10])));
        bus.push(Ok(frame(0x281, 0x9c, [0, 0, 20])));
        bus.push(Ok(OvenFrame::new_remote(StandardId::new(0x281).unwrap(), 8).unwrap()));

        let ingest = IngestLoop::new(
            bus,
            CountingDelay::default(),
            Decoder::default(),
            &record,
            &lifecycle,
            5,
        );

        let mut bus = ingest.run();

        assert!(!lifecycle.is_listening());
        assert!(bus.receive().is_err());

        let mut expected = OvenRecord::default();
        expected.set(Field::TempSystem, 20);
        assert_eq!(record.take_and_reset(), expected);
    }

    #[test]
    fn finished_lifecycle_skips_receive() {
        let lifecycle = Lifecycle::new();
        let record = SharedRecord::default();
        let mut bus = ScriptedBus::new(&lifecycle);

        bus.push(Ok(frame(0x281, 0x1e, [0, 0, 210])));
        lifecycle.finish();

        let ingest = IngestLoop::new(
            bus,
            CountingDelay::default(),
            Decoder::default(),
            &record,
            &lifecycle,
            5,
        );

        let bus = ingest.run();

        assert_eq!(bus.frames.len(), 1);
        assert_eq!(record.snapshot(), OvenRecord::default());
    }
}
