use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::FIELD_COUNT;

/// Every quantity carried in the telemetry record.
///
/// The integer value of each variant is its word index in the transmitted
/// record, so the declaration order here is the wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = FieldIndexError, constructor = FieldIndexError::OutOfRange))]
#[repr(u8)]
pub enum Field {
    /// Identifies the oven on the radio side, never decoded from the bus
    NodeId = 0,
    TempSystem = 1,
    TempReturn = 2,
    TempBufferTop = 3,
    TempBufferMiddle = 4,
    TempBufferBottom = 5,
    TempExhaust = 6,
    VentilatorRpm = 7,
    ClockHour = 8,
    ClockMinute = 9,
    ClockSecond = 10,
    /// Residual oxygen, the only signed word
    RestO2 = 11,
    AirInletPrimary = 12,
    AirInletSecondary = 13,
    ValveReturnMixing = 14,
    ValveBuffer = 15,
    TargetRestO2 = 16,
    TargetSystemTemp = 17,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Self::NodeId,
        Self::TempSystem,
        Self::TempReturn,
        Self::TempBufferTop,
        Self::TempBufferMiddle,
        Self::TempBufferBottom,
        Self::TempExhaust,
        Self::VentilatorRpm,
        Self::ClockHour,
        Self::ClockMinute,
        Self::ClockSecond,
        Self::RestO2,
        Self::AirInletPrimary,
        Self::AirInletSecondary,
        Self::ValveReturnMixing,
        Self::ValveBuffer,
        Self::TargetRestO2,
        Self::TargetSystemTemp,
    ];

    /// Word index of the field within the record
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Byte offset of the field's low byte within the serialized record
    pub const fn byte_offset(self) -> usize {
        self.index() * 2
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, Self::RestO2)
    }
}

/// A single decoded value destined for one field of the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldUpdate {
    pub field: Field,
    pub value: u16,
}

impl FieldUpdate {
    pub const fn new(field: Field, value: u16) -> Self {
        Self { field, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldIndexError {
    #[error("Word index ({0:?}) does not name a record field")]
    OutOfRange(u8),
}
