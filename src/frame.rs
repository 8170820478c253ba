use embedded_can::{Frame, Id};

use crate::catalog::PAYLOAD_LEN;

/// A classic CAN 2.0 frame as seen on the oven bus.
///
/// Bus drivers usually bring their own frame type, anything implementing
/// [`embedded_can::Frame`] can be decoded. This one exists for drivers that
/// don't, for recorded traces, and for tests. A frame without data is a
/// remote frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OvenFrame {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: Id,
    dlc: usize,
    data: Option<[u8; PAYLOAD_LEN as usize]>,
}

impl OvenFrame {
    const fn from_parts(id: Id, dlc: usize, data: Option<[u8; PAYLOAD_LEN as usize]>) -> Self {
        Self { id, dlc, data }
    }

    /// Builds a data frame whose payload starts with `sub_id` (low byte first)
    /// followed by the three words in `values`, in payload order
    pub fn with_words(id: impl Into<Id>, sub_id: u16, values: [u16; 3]) -> Self {
        let mut data = [0u8; PAYLOAD_LEN as usize];

        data[..2].copy_from_slice(&sub_id.to_le_bytes());

        for (chunk, value) in data[2..].chunks_mut(2).zip(values) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }

        Self::from_parts(id.into(), data.len(), Some(data))
    }
}

impl Frame for OvenFrame {
    /// Payloads longer than a classic frame give `None`
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        let mut payload = [0u8; PAYLOAD_LEN as usize];
        payload.get_mut(..data.len())?.copy_from_slice(data);

        Some(Self::from_parts(id.into(), data.len(), Some(payload)))
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        (dlc <= PAYLOAD_LEN as usize).then(|| Self::from_parts(id.into(), dlc, None))
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.data.is_none()
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    /// Empty for RTR frames
    fn data(&self) -> &[u8] {
        match &self.data {
            Some(data) => &data[..self.dlc],
            None => &[],
        }
    }
}
