//! Boolean deferral buffer.
//!
//! Booleans are not written inline. Each one is queued in encounter order
//! and the whole queue is flushed after the last non-boolean record as one
//! LSB-first bitfield.

/// Per-call queue of deferred booleans.
///
/// Entries pair a schema index with the boolean's value. On write the value
/// is the variable's; on read it is filled from the bitfield.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoolQueue {
    entries: Vec<(usize, bool)>,
}

impl BoolQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the boolean at `index` in the schema.
    pub fn push(&mut self, index: usize, value: bool) {
        self.entries.push((index, value));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every queued boolean.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Schema indexes in queue order.
    pub fn indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(index, _)| index)
    }

    /// Pack the queued values into `ceil(len / 8)` bytes.
    #[must_use]
    pub fn pack(&self) -> Vec<u8> {
        pack_bits(self.entries.iter().map(|&(_, value)| value), self.len())
    }

    /// Overwrite queued values from a bitfield, in queue order.
    pub(crate) fn assign(&mut self, bits: &[u8]) {
        let values = unpack_bits(bits, self.len());
        for (entry, value) in self.entries.iter_mut().zip(values) {
            entry.1 = value;
        }
    }

    /// Drain `(index, value)` pairs in queue order.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.entries.drain(..)
    }
}

/// Number of bytes needed for `count` packed booleans.
#[must_use]
pub(crate) fn packed_len(count: usize) -> usize {
    count.div_ceil(8)
}

pub(crate) fn pack_bits(values: impl IntoIterator<Item = bool>, count: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; packed_len(count)];
    for (position, value) in values.into_iter().enumerate() {
        if value {
            bytes[position / 8] |= 1 << (position % 8);
        }
    }
    bytes
}

/// Unpack `count` LSB-first booleans; bits past the end of `bytes` read as false.
pub(crate) fn unpack_bits(bytes: &[u8], count: usize) -> Vec<bool> {
    (0..count).map(|position| bit(bytes, position)).collect()
}

fn bit(bytes: &[u8], position: usize) -> bool {
    bytes
        .get(position / 8)
        .is_some_and(|byte| byte & (1 << (position % 8)) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const THIRTEEN: [bool; 13] = [
        true, false, true, true, false, false, false, true, false, true, false, false, true,
    ];

    #[test]
    fn test_pack_thirteen() {
        let bytes = pack_bits(THIRTEEN, THIRTEEN.len());
        assert_eq!(bytes.len(), 2);
        assert_eq!(bytes, [0b1000_1101, 0b0001_0010]);
        assert_eq!(unpack_bits(&bytes, 13), THIRTEEN.to_vec());
    }

    #[test]
    fn test_empty_queue_packs_nothing() {
        let queue = BoolQueue::new();
        assert!(queue.is_empty());
        assert!(queue.pack().is_empty());
    }

    #[test]
    fn test_queue_assign_and_drain() {
        let mut queue = BoolQueue::new();
        queue.push(4, false);
        queue.push(1, false);
        queue.push(7, false);
        queue.assign(&[0b101]);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained, vec![(4, true), (1, false), (7, true)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_assign_short_bitfield() {
        let mut queue = BoolQueue::new();
        for index in 0..10 {
            queue.push(index, true);
        }
        queue.assign(&[0xff]);
        let values: Vec<bool> = queue.drain().map(|(_, value)| value).collect();
        assert_eq!(values[..8], [true; 8]);
        assert_eq!(values[8..], [false, false]);
    }

    #[test]
    fn test_clear() {
        let mut queue = BoolQueue::new();
        queue.push(0, true);
        queue.clear();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.indexes().count(), 0);
    }
}
