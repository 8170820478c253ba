use embedded_hal::delay::DelayNs;

use crate::{Lifecycle, OvenRecord, Radio, SharedRecord};

/// What one transmission did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmitReport {
    /// The record taken from the shared buffer and handed to the radio
    pub record: OvenRecord,
    /// Whether the radio accepted the packet
    pub sent: bool,
    /// The radio's cumulative loss counter after sending
    pub packets_lost: u32,
}

/// Periodically ships the shared record over the radio and starts a new
/// period.
///
/// Values are discarded once taken, whether or not the radio managed to send
/// them.
pub struct TransmitLoop<'a, R, D> {
    radio: R,
    delay: D,
    record: &'a SharedRecord,
    lifecycle: &'a Lifecycle,
    startup_delay_ms: u32,
    period_ms: u32,
}

impl<'a, R, D> TransmitLoop<'a, R, D>
where
    R: Radio,
    D: DelayNs,
{
    pub fn new(
        radio: R,
        delay: D,
        record: &'a SharedRecord,
        lifecycle: &'a Lifecycle,
        startup_delay_ms: u32,
        period_ms: u32,
    ) -> Self {
        Self {
            radio,
            delay,
            record,
            lifecycle,
            startup_delay_ms,
            period_ms,
        }
    }

    /// Takes the current record, resets the shared one, and sends what was
    /// taken
    pub fn transmit_once(&mut self) -> TransmitReport {
        let record = self.record.take_and_reset();
        let bytes = record.as_bytes();

        let sent = match self.radio.send(&bytes) {
            Ok(()) => true,
            Err(error) => {
                log::error!("Failed to send telemetry packet: {:?}", error);
                false
            }
        };

        let packets_lost = self.radio.packets_lost();

        if packets_lost != 0 {
            log::warn!("{} packets lost", packets_lost);
        }

        TransmitReport {
            record,
            sent,
            packets_lost,
        }
    }

    /// Waits out the startup delay, then transmits once per period until the
    /// lifecycle is finished. Returns the radio.
    pub fn run(mut self) -> R {
        log::info!(
            "Transmitting every {} ms after {} ms",
            self.period_ms,
            self.startup_delay_ms
        );

        self.delay.delay_ms(self.startup_delay_ms);

        while self.lifecycle.is_listening() {
            let report = self.transmit_once();
            log::debug!(
                "Sent record for node {:#04x} (accepted: {})",
                report.record.node_id(),
                report.sent
            );

            self.delay.delay_ms(self.period_ms);
        }

        log::info!("Transmitter stopped");

        self.radio
    }
}
