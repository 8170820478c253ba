use crate::{Field, MAX_SLOTS_PER_ENTRY};

/// First payload byte available to field slots (bytes 0..2 hold the
/// sub-identifier)
pub const FIRST_SLOT_OFFSET: u8 = 2;
/// One past the last payload byte of a classic CAN frame
pub const PAYLOAD_LEN: u8 = 8;

/// Where one field's word lives inside a frame payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldSlot {
    pub field: Field,
    pub low: u8,
    pub high: u8,
}

impl FieldSlot {
    pub const fn new(field: Field, low: u8, high: u8) -> Self {
        Self { field, low, high }
    }

    /// A slot whose high byte directly follows its low byte
    pub const fn word(field: Field, low: u8) -> Self {
        Self::new(field, low, low + 1)
    }
}

/// A known sub-identifier and the fields its frames carry. An entry without
/// slots marks a code that is recognized but deliberately not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CatalogEntry<'a> {
    pub code: u16,
    pub slots: &'a [FieldSlot],
}

impl<'a> CatalogEntry<'a> {
    pub const fn new(code: u16, slots: &'a [FieldSlot]) -> Self {
        Self { code, slots }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.slots.len() > MAX_SLOTS_PER_ENTRY {
            return Err(CatalogError::TooManySlots(self.code, self.slots.len()));
        }

        let mut used = 0u8;

        for slot in self.slots {
            if slot.field == Field::NodeId {
                return Err(CatalogError::NodeIdNotDecodable(self.code));
            }

            for offset in [slot.low, slot.high] {
                if !(FIRST_SLOT_OFFSET..PAYLOAD_LEN).contains(&offset) {
                    return Err(CatalogError::OffsetOutOfRange(self.code, offset));
                }
            }

            if slot.low == slot.high {
                return Err(CatalogError::OverlappingBytes(self.code, slot.low));
            }

            for offset in [slot.low, slot.high] {
                let bit = 1u8 << offset;

                if used & bit != 0 {
                    return Err(CatalogError::OverlappingBytes(self.code, offset));
                }

                used |= bit;
            }
        }

        Ok(())
    }
}

/// The table mapping sub-identifiers to record fields.
///
/// The table is plain data: correcting the mapping as the oven protocol is
/// better understood never touches the decode routine. Entries must be
/// sorted by code, which [`Catalog::validate`] checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Catalog<'a> {
    entries: &'a [CatalogEntry<'a>],
}

impl<'a> Catalog<'a> {
    pub const fn new(entries: &'a [CatalogEntry<'a>]) -> Self {
        Self { entries }
    }

    /// Checks the table and hands it back if every entry is usable
    pub fn validated(self) -> Result<Self, CatalogError> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        for pair in self.entries.windows(2) {
            if pair[0].code >= pair[1].code {
                return Err(CatalogError::UnsortedCode(pair[1].code));
            }
        }

        self.entries.iter().try_for_each(CatalogEntry::validate)
    }

    /// Finds the entry for `code`. Only meaningful on a table that passed
    /// [`Catalog::validate`], which is what [`Decoder`](crate::Decoder) holds.
    pub fn lookup(&self, code: u16) -> Option<&CatalogEntry<'a>> {
        self.entries
            .binary_search_by_key(&code, |entry| entry.code)
            .ok()
            .map(|index| &self.entries[index])
    }

    pub fn entries(&self) -> &'a [CatalogEntry<'a>] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/* Pyromat reference table */

const REST_O2: &[FieldSlot] = &[FieldSlot::word(Field::RestO2, 6)];
const CLOCK_MINUTE: &[FieldSlot] = &[FieldSlot::word(Field::ClockMinute, 4)];
const CLOCK_HOUR_SECOND: &[FieldSlot] = &[
    FieldSlot::word(Field::ClockSecond, 2),
    FieldSlot::word(Field::ClockHour, 4),
];
const EXHAUST_VENTILATOR: &[FieldSlot] = &[
    FieldSlot::word(Field::TempExhaust, 2),
    FieldSlot::word(Field::VentilatorRpm, 6),
];
const VALVE_RETURN_MIXING: &[FieldSlot] = &[FieldSlot::word(Field::ValveReturnMixing, 6)];
const VALVE_BUFFER: &[FieldSlot] = &[FieldSlot::word(Field::ValveBuffer, 4)];
// 90 reads as fully open
const AIR_INLET_PRIMARY: &[FieldSlot] = &[FieldSlot::word(Field::AirInletPrimary, 2)];
const TARGET_REST_O2: &[FieldSlot] = &[FieldSlot::word(Field::TargetRestO2, 6)];
const TEMP_RETURN: &[FieldSlot] = &[FieldSlot::word(Field::TempReturn, 6)];
const AIR_INLET_SECONDARY: &[FieldSlot] = &[FieldSlot::word(Field::AirInletSecondary, 4)];
const TEMP_SYSTEM: &[FieldSlot] = &[FieldSlot::word(Field::TempSystem, 6)];
const TARGET_SYSTEM_TEMP: &[FieldSlot] = &[FieldSlot::word(Field::TargetSystemTemp, 2)];
const BUFFER_TOP_MIDDLE: &[FieldSlot] = &[
    FieldSlot::word(Field::TempBufferTop, 4),
    FieldSlot::word(Field::TempBufferMiddle, 6),
];
const BUFFER_BOTTOM: &[FieldSlot] = &[FieldSlot::word(Field::TempBufferBottom, 2)];

const PYROMAT_ENTRIES: &[CatalogEntry<'static>] = &[
    CatalogEntry::new(0x001e, REST_O2),
    CatalogEntry::new(0x0027, &[]),
    CatalogEntry::new(0x0042, CLOCK_MINUTE),
    CatalogEntry::new(0x0044, CLOCK_HOUR_SECOND),
    CatalogEntry::new(0x0066, EXHAUST_VENTILATOR),
    CatalogEntry::new(0x007b, VALVE_RETURN_MIXING),
    CatalogEntry::new(0x007e, VALVE_BUFFER),
    CatalogEntry::new(0x008a, AIR_INLET_PRIMARY),
    CatalogEntry::new(0x008c, TARGET_REST_O2),
    CatalogEntry::new(0x008d, TEMP_RETURN),
    CatalogEntry::new(0x0092, AIR_INLET_SECONDARY),
    CatalogEntry::new(0x009c, TEMP_SYSTEM),
    CatalogEntry::new(0x009f, TARGET_SYSTEM_TEMP),
    CatalogEntry::new(0x0171, BUFFER_TOP_MIDDLE),
    CatalogEntry::new(0x0174, BUFFER_BOTTOM),
];

/// The mapping the deployed Pyromat bridge runs with. Several entries are
/// still unconfirmed against the controller's documentation; check changes
/// with [`Decoder::replay`](crate::Decoder::replay) on a recorded trace.
pub const PYROMAT_CATALOG: Catalog<'static> = Catalog::new(PYROMAT_ENTRIES);

const BUFFER_ALL: &[FieldSlot] = &[
    FieldSlot::word(Field::TempBufferTop, 2),
    FieldSlot::word(Field::TempBufferMiddle, 4),
    FieldSlot::word(Field::TempBufferBottom, 6),
];

const COMBINED_BUFFER_ENTRIES: &[CatalogEntry<'static>] = &[
    CatalogEntry::new(0x001e, REST_O2),
    CatalogEntry::new(0x0027, &[]),
    CatalogEntry::new(0x0042, CLOCK_MINUTE),
    CatalogEntry::new(0x0044, CLOCK_HOUR_SECOND),
    CatalogEntry::new(0x0066, EXHAUST_VENTILATOR),
    CatalogEntry::new(0x007b, VALVE_RETURN_MIXING),
    CatalogEntry::new(0x007e, VALVE_BUFFER),
    CatalogEntry::new(0x008a, AIR_INLET_PRIMARY),
    CatalogEntry::new(0x008c, TARGET_REST_O2),
    CatalogEntry::new(0x008d, TEMP_RETURN),
    CatalogEntry::new(0x0092, AIR_INLET_SECONDARY),
    CatalogEntry::new(0x009c, TEMP_SYSTEM),
    CatalogEntry::new(0x009f, TARGET_SYSTEM_TEMP),
    CatalogEntry::new(0x0172, BUFFER_ALL),
];

/// Alternative mapping for controllers that report all three buffer
/// temperatures in a single `0x172` frame instead of `0x171` and `0x174`.
/// Unconfirmed; not used unless injected.
pub const PYROMAT_COMBINED_BUFFER_CATALOG: Catalog<'static> =
    Catalog::new(COMBINED_BUFFER_ENTRIES);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    #[error("Catalog code ({0:#06x}) is duplicated or out of ascending order")]
    UnsortedCode(u16),
    #[error("Catalog entry ({0:#06x}) reads payload byte ({1:?}) outside 2..8")]
    OffsetOutOfRange(u16, u8),
    #[error("Catalog entry ({0:#06x}) reads payload byte ({1:?}) more than once")]
    OverlappingBytes(u16, u8),
    #[error("Catalog entry ({0:#06x}) has ({1:?}) slots but a payload holds at most 3 words")]
    TooManySlots(u16, usize),
    #[error("Catalog entry ({0:#06x}) targets the node id, which is fixed by configuration")]
    NodeIdNotDecodable(u16),
}
