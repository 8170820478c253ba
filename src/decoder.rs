use embedded_can::{Frame, Id};
use heapless::Vec;

use crate::{
    codec::{raw_id, sub_id, word_from_payload},
    Catalog, CatalogError, FieldUpdate, OvenRecord, MAX_SLOTS_PER_ENTRY, PYROMAT_CATALOG,
};

/// The updates one frame can produce
pub type FieldUpdates = Vec<FieldUpdate, MAX_SLOTS_PER_ENTRY>;

/// Identifier window (exclusive on both ends) in which the oven controller
/// sends its process data. Standard and extended ids compare by raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IdWindow {
    pub lower: u32,
    pub upper: u32,
}

impl IdWindow {
    /// The window the Pyromat controller uses, `0x200 < id < 0x600`
    pub const PYROMAT: Self = Self::new(0x200, 0x600);

    pub const fn new(lower: u32, upper: u32) -> Self {
        Self { lower, upper }
    }

    pub const fn contains(&self, raw: u32) -> bool {
        raw > self.lower && raw < self.upper
    }

    /// Whether any identifier at all can fall inside the window
    pub const fn is_empty(&self) -> bool {
        self.upper <= self.lower.saturating_add(1)
    }
}

impl Default for IdWindow {
    fn default() -> Self {
        Self::PYROMAT
    }
}

/// Turns received frames into field updates by consulting a [`Catalog`].
///
/// A decoder only ever holds a catalog that passed [`Catalog::validate`], so
/// lookups see a sorted table and no entry outgrows [`FieldUpdates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Decoder<'a> {
    catalog: Catalog<'a>,
    window: IdWindow,
}

impl<'a> Decoder<'a> {
    pub fn new(catalog: Catalog<'a>, window: IdWindow) -> Result<Self, CatalogError> {
        catalog.validate()?;

        Ok(Self { catalog, window })
    }

    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    pub fn window(&self) -> IdWindow {
        self.window
    }

    pub fn accepts(&self, id: Id) -> bool {
        self.window.contains(raw_id(id))
    }

    /// Decodes a frame into zero or more updates. Frames outside the window,
    /// unknown sub-identifiers and payloads too short to hold a sub-identifier
    /// produce nothing; a slot reaching past a short payload is skipped.
    pub fn decode<F: Frame>(&self, frame: &F) -> FieldUpdates {
        let mut updates = FieldUpdates::new();

        if !self.accepts(frame.id()) {
            return updates;
        }

        let payload = frame.data();

        let Some(entry) = sub_id(payload).and_then(|code| self.catalog.lookup(code)) else {
            return updates;
        };

        for slot in entry.slots {
            if let Some(value) = word_from_payload(payload, slot.low, slot.high) {
                // A validated entry never has more slots than the batch holds
                let _ = updates.push(FieldUpdate::new(slot.field, value));
            }
        }

        updates
    }

    /// Decodes a frame straight into `record`, returning how many fields were
    /// written
    pub fn decode_into<F: Frame>(&self, frame: &F, record: &mut OvenRecord) -> usize {
        let updates = self.decode(frame);

        for update in &updates {
            record.apply(*update);
        }

        updates.len()
    }

    /// Plays a recorded bus trace onto a fresh record. Comparing the result
    /// with the values shown on the oven's own display is how a catalog is
    /// checked before it ships.
    pub fn replay<'f, F, I>(&self, frames: I, node_id: u16) -> OvenRecord
    where
        F: Frame + 'f,
        I: IntoIterator<Item = &'f F>,
    {
        let mut record = OvenRecord::new(node_id);

        for frame in frames {
            self.decode_into(frame, &mut record);
        }

        record
    }
}

impl Decoder<'static> {
    /// The reference table on the reference window. The table is checked by
    /// the catalog tests instead of at runtime.
    pub const PYROMAT: Self = Self {
        catalog: PYROMAT_CATALOG,
        window: IdWindow::PYROMAT,
    };
}

impl Default for Decoder<'static> {
    fn default() -> Self {
        Self::PYROMAT
    }
}
