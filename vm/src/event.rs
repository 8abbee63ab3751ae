use variantly::Variantly;

use crate::op::{Chord, Drum, Note};
use crate::time::Ticks;

/// The fixed instrument channels, each mixed from its own buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum Track {
    #[display("bass")]
    Bass = 0,
    #[display("guitar")]
    Guitar = 1,
    #[display("drums")]
    Drums = 2,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Bass, Track::Guitar, Track::Drums];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum EventKind {
    Note(Note),
    Chord(Chord),
    Drum(Drum),
}

impl EventKind {
    /// Routing is implied by the opcode, never by `TRACK`
    pub fn track(&self) -> Track {
        match self {
            EventKind::Note(_) => Track::Bass,
            EventKind::Chord(_) => Track::Guitar,
            EventKind::Drum(_) => Track::Drums,
        }
    }

    pub fn duration(&self) -> i64 {
        match self {
            EventKind::Note(note) => note.duration,
            EventKind::Chord(chord) => chord.duration,
            EventKind::Drum(drum) => drum.duration,
        }
    }
}

/// A musical instruction stamped with the clock value it was scheduled at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEvent {
    pub timestamp: Ticks,
    pub track: Track,
    pub kind: EventKind,
}

impl AudioEvent {
    pub fn new(timestamp: Ticks, kind: EventKind) -> Self {
        Self {
            timestamp,
            track: kind.track(),
            kind,
        }
    }
}

/// Collects every event of a run in the order it was scheduled
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    events: Vec<AudioEvent>,
}

impl Schedule {
    pub fn push(&mut self, event: AudioEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Scheduling order
    pub fn events(&self) -> &[AudioEvent] {
        &self.events
    }

    /// Render order: ascending timestamps, ties kept in scheduling order
    pub fn into_sorted(mut self) -> Vec<AudioEvent> {
        self.events.sort_by_key(|event| event.timestamp);
        self.events
    }
}
