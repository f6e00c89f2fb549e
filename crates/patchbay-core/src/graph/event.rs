//! MIDI events and fixed-capacity event buffers.
//!
//! Event buffers are allocated once when a render plan is built and never grow
//! on the audio thread. Events past capacity are dropped.

/// A timestamped short MIDI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// Sample offset within the current block.
    pub time: u32,
    /// Status byte followed by up to two data bytes.
    pub data: [u8; 3],
}

impl MidiEvent {
    /// Creates an event from raw bytes.
    pub const fn new(time: u32, data: [u8; 3]) -> Self {
        Self { time, data }
    }

    /// Note-on on `channel` (0-15).
    pub const fn note_on(time: u32, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(time, [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])
    }

    /// Note-off on `channel` (0-15).
    pub const fn note_off(time: u32, channel: u8, note: u8) -> Self {
        Self::new(time, [0x80 | (channel & 0x0F), note & 0x7F, 0])
    }

    /// Control change on `channel` (0-15).
    pub const fn control_change(time: u32, channel: u8, controller: u8, value: u8) -> Self {
        Self::new(time, [0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F])
    }

    /// Status nibble (message type without channel).
    #[inline]
    pub const fn status(&self) -> u8 {
        self.data[0] & 0xF0
    }

    /// True for a note-on with non-zero velocity.
    #[inline]
    pub const fn is_note_on(&self) -> bool {
        self.status() == 0x90 && self.data[2] > 0
    }

    /// True for a note-off, including note-on with zero velocity.
    #[inline]
    pub const fn is_note_off(&self) -> bool {
        self.status() == 0x80 || (self.status() == 0x90 && self.data[2] == 0)
    }

    /// Copy of this event at a different time.
    #[inline]
    pub const fn with_time(self, time: u32) -> Self {
        Self {
            time,
            data: self.data,
        }
    }
}

/// Bounded, time-ordered event list.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<MidiEvent>,
    capacity: usize,
}

impl EventBuffer {
    /// Creates an empty buffer that holds up to `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if no events are held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Removes all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Appends an event without reordering. Returns `false` when full.
    pub fn push(&mut self, event: MidiEvent) -> bool {
        if self.events.len() >= self.capacity {
            return false;
        }
        self.events.push(event);
        true
    }

    /// Inserts after every event with time `<= event.time`, keeping the list
    /// stably sorted. Returns `false` when full.
    pub fn insert_sorted(&mut self, event: MidiEvent) -> bool {
        if self.events.len() >= self.capacity {
            return false;
        }
        let at = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(at, event);
        true
    }

    /// Merges every event of `other` in stable timestamp order.
    ///
    /// Events already held precede incoming events with the same time.
    pub fn merge_from(&mut self, other: &EventBuffer) {
        for event in other.iter() {
            if !self.insert_sorted(*event) {
                break;
            }
        }
    }

    /// Iterates events in order.
    pub fn iter(&self) -> std::slice::Iter<'_, MidiEvent> {
        self.events.iter()
    }

    /// Events as a slice.
    pub fn as_slice(&self) -> &[MidiEvent] {
        &self.events
    }
}

impl Clone for EventBuffer {
    fn clone(&self) -> Self {
        let mut events = Vec::with_capacity(self.capacity);
        events.extend_from_slice(&self.events);
        Self {
            events,
            capacity: self.capacity,
        }
    }
}

impl<'a> IntoIterator for &'a EventBuffer {
    type Item = &'a MidiEvent;
    type IntoIter = std::slice::Iter<'a, MidiEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
