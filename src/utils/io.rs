// Byte helpers for reading fixed-width integers out of in-memory buffers

/// Read big-endian 32-bit integer at `offset`
pub fn be_u32_at(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read big-endian 16-bit integer at `offset`
pub fn be_u16_at(buffer: &[u8], offset: usize) -> Option<u16> {
    let bytes = buffer.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Decode a synchsafe integer (7 bits per byte, top bit ignored)
pub fn synchsafe(bytes: [u8; 4]) -> u32 {
    ((bytes[0] & 0x7F) as u32) << 21
        | ((bytes[1] & 0x7F) as u32) << 14
        | ((bytes[2] & 0x7F) as u32) << 7
        | (bytes[3] & 0x7F) as u32
}

/// Read synchsafe 32-bit integer at `offset`
pub fn synchsafe_at(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset.checked_add(4)?)?;
    Some(synchsafe([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Check if buffer has signature at `offset`
pub fn has_signature(buffer: &[u8], offset: usize, signature: &[u8]) -> bool {
    offset
        .checked_add(signature.len())
        .and_then(|end| buffer.get(offset..end))
        .map_or(false, |bytes| bytes == signature)
}
