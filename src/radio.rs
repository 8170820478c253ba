use crate::LoraConfig;

/// The LoRa transceiver as the transmit loop sees it.
///
/// Delivery is best effort: the bridge never retries and never waits for an
/// acknowledgement, it only reports the loss counter the driver keeps.
pub trait Radio {
    type Error: core::fmt::Debug;

    /// Applies the modem settings. Failing here means the module did not
    /// answer and the bridge cannot run.
    fn configure(&mut self, config: &LoraConfig) -> Result<(), Self::Error>;

    /// Sends `payload` as one packet
    fn send(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    /// Packets lost since the radio was brought up
    fn packets_lost(&mut self) -> u32;
}
