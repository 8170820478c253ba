use crate::{
    codec::{get_word, put_word},
    Field, FieldUpdate, FIELD_COUNT, RECORD_LEN,
};

/// Node identifier of the Pyromat oven on the radio side
pub const DEFAULT_NODE_ID: u16 = 0x01;

/// One aggregation period's worth of oven telemetry.
///
/// Every field holds the last value decoded for it since the previous reset.
/// Nothing distinguishes a field that was never updated from one that was
/// updated with its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OvenRecord {
    words: [u16; FIELD_COUNT],
}

impl OvenRecord {
    /// A record holding defaults: every field zero except the node id
    pub const fn new(node_id: u16) -> Self {
        let mut words = [0u16; FIELD_COUNT];
        words[Field::NodeId.index()] = node_id;

        Self { words }
    }

    pub fn get(&self, field: Field) -> u16 {
        self.words[field.index()]
    }

    pub fn set(&mut self, field: Field, value: u16) {
        self.words[field.index()] = value;
    }

    pub fn apply(&mut self, update: FieldUpdate) {
        self.set(update.field, update.value);
    }

    pub fn node_id(&self) -> u16 {
        self.get(Field::NodeId)
    }

    /// Residual oxygen, reinterpreted as the signed value the controller sends
    pub fn rest_o2(&self) -> i16 {
        self.get(Field::RestO2) as i16
    }

    /// Puts every field back to its default, keeping the node id
    pub fn reset(&mut self) {
        *self = Self::new(self.node_id());
    }

    /// Iterates over `(field, value)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (Field, u16)> + '_ {
        Field::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    /// The exact bytes sent over the radio: each field in wire order, low byte
    /// first, no padding
    pub fn as_bytes(&self) -> [u8; RECORD_LEN] {
        let mut bytes = [0u8; RECORD_LEN];

        for (field, value) in self.iter() {
            put_word(&mut bytes, field.byte_offset(), value);
        }

        bytes
    }

    pub fn from_bytes(buffer: &[u8]) -> Result<Self, RecordParseError> {
        if buffer.len() != RECORD_LEN {
            return Err(RecordParseError::InvalidLength(buffer.len()));
        }

        let mut words = [0u16; FIELD_COUNT];

        for field in Field::ALL {
            words[field.index()] = get_word(buffer, field.byte_offset());
        }

        Ok(Self { words })
    }
}

impl Default for OvenRecord {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_ID)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordParseError {
    #[error("Received a record of ({0:?}) bytes, expected exactly 36")]
    InvalidLength(usize),
}
