use embedded_can::blocking::Can;
use embedded_hal::delay::DelayNs;

use crate::{
    BridgeConfig, Catalog, CatalogError, ConfigError, Decoder, IngestLoop, Lifecycle, Radio,
    SharedRecord, TransmitLoop,
};

/// A configured bridge, ready to hand out its two loops.
///
/// Both loops borrow the same [`SharedRecord`] and [`Lifecycle`], which
/// normally live in statics so each loop can run on its own task.
#[derive(Clone, Copy)]
pub struct Bridge<'a> {
    config: BridgeConfig,
    decoder: Decoder<'a>,
    record: &'a SharedRecord,
    lifecycle: &'a Lifecycle,
}

impl<'a> Bridge<'a> {
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn decoder(&self) -> &Decoder<'a> {
        &self.decoder
    }

    /// The loop that owns the bus
    pub fn ingest<C: Can, D: DelayNs>(&self, bus: C, delay: D) -> IngestLoop<'a, C, D> {
        IngestLoop::new(
            bus,
            delay,
            self.decoder,
            self.record,
            self.lifecycle,
            self.config.ingest_yield_ms,
        )
    }

    /// The loop that owns the radio
    pub fn transmit<R: Radio, D: DelayNs>(&self, radio: R, delay: D) -> TransmitLoop<'a, R, D> {
        TransmitLoop::new(
            radio,
            delay,
            self.record,
            self.lifecycle,
            self.config.startup_delay_ms,
            self.config.transmit_period_ms,
        )
    }

    /// Asks both loops to stop
    pub fn shutdown(&self) {
        self.lifecycle.finish();
    }
}

/// Checks the configuration and catalog and sets up the radio.
///
/// The CAN driver is expected to be installed and started before this is
/// called, from the same [`CanConfig`](crate::CanConfig) passed in here; the
/// bus handle is only needed once [`Bridge::ingest`] runs.
pub fn bring_up<'a, R: Radio>(
    radio: &mut R,
    config: BridgeConfig,
    catalog: Catalog<'a>,
    record: &'a SharedRecord,
    lifecycle: &'a Lifecycle,
) -> Result<Bridge<'a>, BridgeError<R::Error>> {
    config.validate()?;
    let decoder = Decoder::new(catalog, config.id_window)?;

    let record_node_id = record.defaults().node_id();
    if record_node_id != config.node_id {
        return Err(BridgeError::NodeIdMismatch(record_node_id, config.node_id));
    }

    log::info!(
        "CAN bus at {} bit/s, rx queue {}, ids {:#x}..{:#x}, {} catalog entries",
        config.can.bit_rate.bits_per_second(),
        config.can.rx_queue_len,
        config.id_window.lower,
        config.id_window.upper,
        catalog.len()
    );

    radio.configure(&config.lora).map_err(|error| {
        log::error!("Does not recognize the LoRa module");
        BridgeError::RadioInit(error)
    })?;

    log::info!("LoRa frequency is {} Hz", config.lora.frequency_hz);
    log::info!("coding_rate=4/{}", u8::from(config.lora.coding_rate));
    log::info!("bandwidth={} Hz", config.lora.bandwidth.hertz());
    log::info!("spreading_factor={}", u8::from(config.lora.spreading_factor));

    Ok(Bridge {
        config,
        decoder,
        record,
        lifecycle,
    })
}

/// Parks the caller forever after a fatal bring-up error
pub fn halt<D: DelayNs>(delay: &mut D) -> ! {
    loop {
        delay.delay_ms(1);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError<E> {
    #[error("Bridge configuration is invalid")]
    InvalidConfig(#[from] ConfigError),
    #[error("Field catalog is invalid")]
    InvalidCatalog(#[from] CatalogError),
    #[error("Shared record was built for node ({0:?}) but the configuration names node ({1:?})")]
    NodeIdMismatch(u16, u16),
    #[error("Radio did not respond to configuration ({0:?})")]
    RadioInit(E),
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::{
        sync::{mpsc, Arc, Mutex},
        thread,
        time::Duration,
        vec::Vec,
    };

    use embedded_can::{blocking::Can, ErrorKind, StandardId};
    use embedded_hal::delay::DelayNs;

    use crate::{
        bring_up, BridgeConfig, BridgeError, Catalog, CatalogEntry, CatalogError, ConfigError,
        Field, FieldSlot, IdWindow, Lifecycle, LoraConfig, OvenFrame, OvenRecord, Radio,
        SharedRecord, PYROMAT_CATALOG, RECORD_LEN,
    };

    #[derive(Debug, PartialEq, Eq)]
    enum ModuleError {
        NotPresent,
    }

    #[derive(Default, Clone)]
    struct LoopbackRadio {
        present: bool,
        configured: Option<LoraConfig>,
        sent: Arc<Mutex<Vec<[u8; RECORD_LEN]>>>,
    }

    impl Radio for LoopbackRadio {
        type Error = ModuleError;

        fn configure(&mut self, config: &LoraConfig) -> Result<(), Self::Error> {
            if !self.present {
                return Err(ModuleError::NotPresent);
            }

            self.configured = Some(*config);
            Ok(())
        }

        fn send(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
            self.sent.lock().unwrap().push(payload.try_into().unwrap());
            Ok(())
        }

        fn packets_lost(&mut self) -> u32 {
            0
        }
    }

    /// Blocks in `receive` until a frame is pushed into the channel
    struct ChannelBus {
        frames: mpsc::Receiver<OvenFrame>,
    }

    impl Can for ChannelBus {
        type Frame = OvenFrame;
        type Error = ErrorKind;

        fn transmit(&mut self, _frame: &Self::Frame) -> Result<(), Self::Error> {
            Ok(())
        }

        fn receive(&mut self) -> Result<Self::Frame, Self::Error> {
            self.frames.recv().map_err(|_| ErrorKind::Other)
        }
    }

    struct ThreadDelay;

    impl DelayNs for ThreadDelay {
        fn delay_ns(&mut self, ns: u32) {
            thread::sleep(Duration::from_nanos(ns as u64));
        }
    }

    fn present_radio() -> LoopbackRadio {
        LoopbackRadio {
            present: true,
            ..Default::default()
        }
    }

    #[test]
    fn bring_up_configures_radio() {
        let record = SharedRecord::default();
        let lifecycle = Lifecycle::new();
        let mut radio = present_radio();

        let bridge = bring_up(
            &mut radio,
            BridgeConfig::REFERENCE,
            PYROMAT_CATALOG,
            &record,
            &lifecycle,
        )
        .unwrap();

        assert_eq!(radio.configured, Some(LoraConfig::REFERENCE));
        assert_eq!(bridge.decoder().window(), IdWindow::PYROMAT);
        assert_eq!(bridge.config().transmit_period_ms, 30_000);
    }

    #[test]
    fn bring_up_errors() {
        let record = SharedRecord::default();
        let lifecycle = Lifecycle::new();

        let result = bring_up(
            &mut LoopbackRadio::default(),
            BridgeConfig::REFERENCE,
            PYROMAT_CATALOG,
            &record,
            &lifecycle,
        );
        assert!(matches!(
            result,
            Err(BridgeError::RadioInit(ModuleError::NotPresent))
        ));

        let mut config = BridgeConfig::REFERENCE;
        config.transmit_period_ms = 0;
        let result = bring_up(&mut present_radio(), config, PYROMAT_CATALOG, &record, &lifecycle);
        assert!(matches!(
            result,
            Err(BridgeError::InvalidConfig(ConfigError::ZeroTransmitPeriod))
        ));

        const DUPLICATE: &[CatalogEntry<'static>] = &[
            CatalogEntry::new(0x1e, &[FieldSlot::word(Field::RestO2, 6)]),
            CatalogEntry::new(0x1e, &[FieldSlot::word(Field::RestO2, 2)]),
        ];
        let result = bring_up(
            &mut present_radio(),
            BridgeConfig::REFERENCE,
            Catalog::new(DUPLICATE),
            &record,
            &lifecycle,
        );
        assert!(matches!(
            result,
            Err(BridgeError::InvalidCatalog(CatalogError::UnsortedCode(0x1e)))
        ));

        let mut config = BridgeConfig::REFERENCE;
        config.node_id = 0x02;
        let result = bring_up(&mut present_radio(), config, PYROMAT_CATALOG, &record, &lifecycle);
        assert!(matches!(result, Err(BridgeError::NodeIdMismatch(0x01, 0x02))));
    }

    #[test]
    fn loops_run_concurrently_and_stop_together() {
        let record = SharedRecord::default();
        let lifecycle = Lifecycle::new();
        let mut radio = present_radio();
        let sent = Arc::clone(&radio.sent);

        let config = BridgeConfig {
            ingest_yield_ms: 0,
            startup_delay_ms: 0,
            transmit_period_ms: 2,
            ..BridgeConfig::REFERENCE
        };

        let bridge = bring_up(&mut radio, config, PYROMAT_CATALOG, &record, &lifecycle).unwrap();
        let (frames, bus) = mpsc::channel();
        let id = StandardId::new(0x483).unwrap();

        thread::scope(|scope| {
            let ingest = bridge.ingest(ChannelBus { frames: bus }, ThreadDelay);
            let transmit = bridge.transmit(radio, ThreadDelay);

            let ingest = scope.spawn(move || ingest.run());
            let transmit = scope.spawn(move || transmit.run());

            for value in 1..=2_000u16 {
                frames
                    .send(OvenFrame::with_words(id, 0x171, [0, value, value]))
                    .unwrap();

                if value % 100 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            }

            // Wait until the last value has been applied, sent or not
            for _ in 0..5_000 {
                let applied = record.snapshot().get(Field::TempBufferTop) == 2_000
                    || sent
                        .lock()
                        .unwrap()
                        .iter()
                        .any(|bytes| bytes[6..8] == 2_000u16.to_le_bytes());

                if applied {
                    break;
                }

                thread::sleep(Duration::from_millis(1));
            }

            bridge.shutdown();

            // Unblocks the listener, outside the window so it changes nothing
            frames
                .send(OvenFrame::with_words(StandardId::ZERO, 0x171, [0, 1, 2]))
                .unwrap();

            ingest.join().unwrap();
            transmit.join().unwrap();
        });

        let sent = sent.lock().unwrap();
        assert!(!sent.is_empty());

        let packets: Vec<OvenRecord> = sent
            .iter()
            .map(|bytes| OvenRecord::from_bytes(bytes).unwrap())
            .collect();

        for packet in &packets {
            assert_eq!(packet.node_id(), 0x01);
            assert_eq!(
                packet.get(Field::TempBufferTop),
                packet.get(Field::TempBufferMiddle)
            );
        }

        let last_seen = packets
            .iter()
            .chain([record.snapshot()].iter())
            .any(|packet| packet.get(Field::TempBufferTop) == 2_000);
        assert!(last_seen);
    }
}
