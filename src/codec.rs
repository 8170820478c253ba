use embedded_can::Id;

/* Payload decoding */

/// Combines two payload bytes into a word as `low | (high << 8)`. Returns
/// `None` if either offset lies beyond the received payload.
pub fn word_from_payload(payload: &[u8], low: u8, high: u8) -> Option<u16> {
    let low = *payload.get(low as usize)?;
    let high = *payload.get(high as usize)?;

    Some(u16::from(low) | (u16::from(high) << 8))
}

/// The sub-identifier carried in the first two payload bytes, low byte first
pub fn sub_id(payload: &[u8]) -> Option<u16> {
    word_from_payload(payload, 0, 1)
}

/// Raw numeric value of a standard or extended identifier
pub fn raw_id(id: Id) -> u32 {
    match id {
        Id::Standard(standard_id) => standard_id.as_raw() as u32,
        Id::Extended(extended_id) => extended_id.as_raw(),
    }
}

/* Record encoding */

pub fn put_word(buffer: &mut [u8], offset: usize, value: u16) {
    buffer[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn get_word(buffer: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buffer[offset], buffer[offset + 1]])
}
