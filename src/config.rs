use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{IdWindow, DEFAULT_NODE_ID};

/// Nominal bit rate of the oven bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = ConfigError, constructor = ConfigError::InvalidCanBitRate))]
#[repr(u8)]
pub enum CanBitRate {
    Rate25Kbit = 0,
    Rate50Kbit = 1,
    Rate100Kbit = 2,
    /// What the Pyromat controller runs at
    #[default]
    Rate125Kbit = 3,
    Rate250Kbit = 4,
    Rate500Kbit = 5,
    Rate800Kbit = 6,
    Rate1Mbit = 7,
}

impl CanBitRate {
    pub const fn bits_per_second(&self) -> u32 {
        match self {
            Self::Rate25Kbit => 25_000,
            Self::Rate50Kbit => 50_000,
            Self::Rate100Kbit => 100_000,
            Self::Rate125Kbit => 125_000,
            Self::Rate250Kbit => 250_000,
            Self::Rate500Kbit => 500_000,
            Self::Rate800Kbit => 800_000,
            Self::Rate1Mbit => 1_000_000,
        }
    }
}

/// Modem bandwidth, numbered the way the SX127x register encodes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = ConfigError, constructor = ConfigError::InvalidBandwidth))]
#[repr(u8)]
pub enum Bandwidth {
    Khz7_8 = 0,
    Khz10_4 = 1,
    Khz15_6 = 2,
    Khz20_8 = 3,
    Khz31_25 = 4,
    Khz41_7 = 5,
    Khz62_5 = 6,
    #[default]
    Khz125 = 7,
    Khz250 = 8,
    Khz500 = 9,
}

impl Bandwidth {
    pub const fn hertz(&self) -> u32 {
        match self {
            Self::Khz7_8 => 7_800,
            Self::Khz10_4 => 10_400,
            Self::Khz15_6 => 15_600,
            Self::Khz20_8 => 20_800,
            Self::Khz31_25 => 31_250,
            Self::Khz41_7 => 41_700,
            Self::Khz62_5 => 62_500,
            Self::Khz125 => 125_000,
            Self::Khz250 => 250_000,
            Self::Khz500 => 500_000,
        }
    }
}

/// Forward error correction rate, the value is the denominator of 4/x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = ConfigError, constructor = ConfigError::InvalidCodingRate))]
#[repr(u8)]
pub enum CodingRate {
    #[default]
    Cr4_5 = 5,
    Cr4_6 = 6,
    Cr4_7 = 7,
    Cr4_8 = 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = ConfigError, constructor = ConfigError::InvalidSpreadingFactor))]
#[repr(u8)]
pub enum SpreadingFactor {
    Sf6 = 6,
    #[default]
    Sf7 = 7,
    Sf8 = 8,
    Sf9 = 9,
    Sf10 = 10,
    Sf11 = 11,
    Sf12 = 12,
}

/// Radio settings applied once at bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoraConfig {
    pub frequency_hz: u32,
    pub bandwidth: Bandwidth,
    pub coding_rate: CodingRate,
    pub spreading_factor: SpreadingFactor,
    pub crc: bool,
}

impl LoraConfig {
    pub const MIN_FREQUENCY_HZ: u32 = 137_000_000;
    pub const MAX_FREQUENCY_HZ: u32 = 1_020_000_000;

    /// 868 MHz, 125 kHz, 4/5, SF7 with CRC
    pub const REFERENCE: Self = Self {
        frequency_hz: 868_000_000,
        bandwidth: Bandwidth::Khz125,
        coding_rate: CodingRate::Cr4_5,
        spreading_factor: SpreadingFactor::Sf7,
        crc: true,
    };

    /// Builds a configuration from the raw numbers radio drivers take
    pub fn from_raw(
        frequency_hz: u32,
        bandwidth: u8,
        coding_rate: u8,
        spreading_factor: u8,
        crc: bool,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            frequency_hz,
            bandwidth: bandwidth.try_into()?,
            coding_rate: coding_rate.try_into()?,
            spreading_factor: spreading_factor.try_into()?,
            crc,
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Self::MIN_FREQUENCY_HZ..=Self::MAX_FREQUENCY_HZ).contains(&self.frequency_hz) {
            return Err(ConfigError::FrequencyOutOfRange(self.frequency_hz));
        }

        Ok(())
    }
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Bus settings for the CAN driver.
///
/// The driver is set up by the caller before [`bring_up`](crate::bring_up),
/// which only checks and logs these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanConfig {
    pub bit_rate: CanBitRate,
    /// Frames the driver buffers while the ingest loop is yielding
    pub rx_queue_len: usize,
}

impl CanConfig {
    pub const REFERENCE: Self = Self {
        bit_rate: CanBitRate::Rate125Kbit,
        rx_queue_len: 5,
    };
}

impl Default for CanConfig {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Everything the bridge needs to know at startup. Nothing here changes
/// while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Written into every transmitted record
    pub node_id: u16,
    pub id_window: IdWindow,
    /// Pause after each decoded frame so lower priority tasks get to run
    pub ingest_yield_ms: u32,
    /// Time given to ingest to fill the first record before it is sent
    pub startup_delay_ms: u32,
    pub transmit_period_ms: u32,
    pub can: CanConfig,
    pub lora: LoraConfig,
}

impl BridgeConfig {
    pub const REFERENCE: Self = Self {
        node_id: DEFAULT_NODE_ID,
        id_window: IdWindow::PYROMAT,
        ingest_yield_ms: 5,
        startup_delay_ms: 20_000,
        transmit_period_ms: 30_000,
        can: CanConfig::REFERENCE,
        lora: LoraConfig::REFERENCE,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_window.is_empty() {
            return Err(ConfigError::EmptyIdWindow(
                self.id_window.lower,
                self.id_window.upper,
            ));
        }

        if self.transmit_period_ms == 0 {
            return Err(ConfigError::ZeroTransmitPeriod);
        }

        if self.can.rx_queue_len == 0 {
            return Err(ConfigError::ZeroRxQueue);
        }

        self.lora.validate()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::REFERENCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("Identifier window ({0:#x}..{1:#x}) leaves no identifier between its bounds")]
    EmptyIdWindow(u32, u32),
    #[error("Transmit period must be greater than 0")]
    ZeroTransmitPeriod,
    #[error("CAN receive queue length must be greater than 0")]
    ZeroRxQueue,
    #[error("Tried to decode CAN bit rate but it was invalid ({0:?})")]
    InvalidCanBitRate(u8),
    #[error("Tried to decode LoRa bandwidth but it was invalid ({0:?})")]
    InvalidBandwidth(u8),
    #[error("Tried to decode LoRa coding rate but it was invalid ({0:?})")]
    InvalidCodingRate(u8),
    #[error("Tried to decode LoRa spreading factor but it was invalid ({0:?})")]
    InvalidSpreadingFactor(u8),
    #[error("LoRa frequency ({0:?} Hz) is outside what the modem can tune to")]
    FrequencyOutOfRange(u32),
}
