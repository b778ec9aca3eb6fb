/// Fixed-capacity FIFO of recently visited pins.
///
/// Once full, each push evicts the oldest entry, so a pin is only barred
/// from candidacy for as many picks as the window holds. Eviction order is
/// the point: a set would exclude pins forever.
pub struct RecencyWindow {
    entries: Vec<usize>,
    head: usize,
    capacity: usize,
}

impl RecencyWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn push(&mut self, pin: usize) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() < self.capacity {
            self.entries.push(pin);
        } else {
            self.entries[self.head] = pin;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn contains(&self, pin: usize) -> bool {
        self.entries.contains(&pin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
