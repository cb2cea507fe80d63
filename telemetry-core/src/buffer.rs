// Fixed-capacity history buffer for telemetry samples.
// Invariants: len never exceeds capacity, snapshot order is chronological.

#[derive(Debug)]
pub struct RingBuffer<T> {
    buf: Vec<T>,
    cap: usize,
    head: usize,
    len: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(cap: usize) -> Self {
        assert!(cap > 0, "ring buffer capacity must be positive");
        Self {
            buf: Vec::with_capacity(cap),
            cap,
            head: 0,
            len: 0,
        }
    }

    /// Appends at the back, evicting the oldest entry once full. O(1).
    pub fn append(&mut self, item: T) {
        if self.len < self.cap {
            self.buf.push(item);
            self.len += 1;
        } else {
            self.buf[self.head] = item;
            self.head = (self.head + 1) % self.cap;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.head = 0;
        self.len = 0;
    }

    /// Contents oldest-first, used for the history replay on connect.
    pub fn snapshot(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        if self.len == 0 {
            return out;
        }

        if self.len < self.cap {
            out.extend(self.buf.iter().cloned());
            return out;
        }

        out.extend(self.buf[self.head..].iter().cloned());
        out.extend(self.buf[..self.head].iter().cloned());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_up_to_capacity() {
        let mut ring = RingBuffer::new(4);
        assert!(ring.is_empty());
        for value in 0..4 {
            ring.append(value);
        }
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.snapshot(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn evicts_oldest_first_once_full() {
        let mut ring = RingBuffer::new(3);
        for value in 0..7 {
            ring.append(value);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.snapshot(), vec![4, 5, 6]);
    }

    #[test]
    fn holds_exactly_the_most_recent_capacity_items() {
        let cap = 600;
        let mut ring = RingBuffer::new(cap);
        let total = cap * 2 + 37;
        for value in 0..total {
            ring.append(value);
        }
        assert_eq!(ring.len(), cap);
        let snapshot = ring.snapshot();
        assert_eq!(snapshot.len(), cap);
        assert_eq!(snapshot[0], total - cap);
        assert_eq!(*snapshot.last().unwrap(), total - 1);
        assert!(snapshot.windows(2).all(|pair| pair[1] == pair[0] + 1));
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut ring = RingBuffer::new(2);
        ring.append(1);
        ring.append(2);
        ring.append(3);
        ring.clear();
        assert!(ring.is_empty());
        assert!(ring.snapshot().is_empty());
        ring.append(9);
        assert_eq!(ring.snapshot(), vec![9]);
    }
}
