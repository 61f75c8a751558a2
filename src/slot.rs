//! A growable sequence of 32-byte slots with pointer slots resolved to
//! byte offsets at finalisation time.

/// One entry in a [`SlotBuffer`].
enum Slot {
    /// A concrete 32-byte value, written to the output as-is.
    Data([u8; 32]),
    /// References another `SlotBuffer` (a tail region); resolved to a
    /// 32-byte big-endian byte offset when the owning buffer is finalised.
    Pointer(SlotBuffer),
    /// Raw tail data (the content of `bytes`/`string`); emitted at its
    /// natural length rounded up to a multiple of 32 bytes, right-padded
    /// with zeroes.
    Raw(Vec<u8>),
}

/// A growable, ordered sequence of 32-byte slots. Finalising a
/// buffer walks its tree of child buffers depth-first, assigns each
/// pointer slot the byte offset of its child relative to the start of this
/// buffer's own region, and concatenates everything into a flat byte
/// vector.
#[derive(Default)]
pub struct SlotBuffer {
    slots: Vec<Slot>,
}

impl SlotBuffer {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn push_data(&mut self, data: [u8; 32]) {
        self.slots.push(Slot::Data(data));
    }

    pub fn push_pointer(&mut self, tail: SlotBuffer) {
        self.slots.push(Slot::Pointer(tail));
    }

    pub fn push_raw(&mut self, data: Vec<u8>) {
        self.slots.push(Slot::Raw(data));
    }

    /// Number of slots directly held (head slots only; a `Raw` slot does
    /// not contribute to head-slot counts, it only appears inside a tail
    /// buffer after the length slot it follows).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resolves every pointer in this buffer's subtree and returns the
    /// concatenated bytes.
    pub fn finalize(&self) -> Vec<u8> {
        let mut own = Vec::new();
        let mut pointers: Vec<(usize, &SlotBuffer)> = Vec::new();

        for slot in &self.slots {
            match slot {
                Slot::Data(data) => own.extend_from_slice(data),
                Slot::Raw(data) => {
                    own.extend_from_slice(data);
                    let pad = (32 - (data.len() % 32)) % 32;
                    own.extend(std::iter::repeat(0u8).take(pad));
                }
                Slot::Pointer(child) => {
                    pointers.push((own.len(), child));
                    own.extend([0u8; 32]);
                }
            }
        }

        let region_base = own.len();
        let mut running_offset = region_base;
        let mut tails = Vec::with_capacity(pointers.len());
        for (slot_pos, child) in pointers {
            let child_bytes = child.finalize();
            own[slot_pos..slot_pos + 32].copy_from_slice(&offset_to_word(running_offset));
            running_offset += child_bytes.len();
            tails.push(child_bytes);
        }
        own.extend(tails.into_iter().flatten());
        own
    }
}

/// Encodes a byte offset/length as a big-endian 32-byte word.
pub fn offset_to_word(offset: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[32 - std::mem::size_of::<usize>()..].copy_from_slice(&offset.to_be_bytes());
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_buffer_has_no_tails() {
        let mut buf = SlotBuffer::new();
        buf.push_data(offset_to_word(1));
        buf.push_data(offset_to_word(2));
        assert_eq!(buf.finalize().len(), 64);
    }

    #[test]
    fn pointer_resolves_to_offset_after_head() {
        let mut outer = SlotBuffer::new();
        outer.push_data(offset_to_word(7));
        let mut tail = SlotBuffer::new();
        tail.push_raw(b"dave".to_vec());
        outer.push_pointer(tail);
        let bytes = outer.finalize();
        assert_eq!(bytes.len(), 96); // 32 (data) + 32 (pointer) + 32 (raw padded)
        assert_eq!(&bytes[32..64], &offset_to_word(64)[..]);
    }
}
