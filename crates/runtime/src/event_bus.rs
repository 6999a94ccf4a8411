use foundation::math::GeoPoint;

use crate::frame::Tick;

/// Phase name carried by the last progress event of a run.
pub const FINISHED_PHASE: &str = "Finished";

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Progress through the current phase, in `[0, 1]`.
    Progress { phase: &'static str, progress: f32 },
    /// Emitted once per completed run.
    Origin {
        origin: GeoPoint,
        min_elevation: f32,
        max_elevation: f32,
    },
    /// Source data could not be read; the run was reset.
    ReadError { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub tick_index: u64,
    pub kind: EventKind,
}

impl Event {
    pub fn is_completion(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Progress {
                phase: FINISHED_PHASE,
                ..
            }
        )
    }
}

/// Event queue the host polls between ticks.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, tick: Tick, kind: EventKind) {
        self.events.push(Event {
            tick_index: tick.index,
            kind,
        });
    }

    pub fn progress(&mut self, tick: Tick, phase: &'static str, progress: f32) {
        self.emit(
            tick,
            EventKind::Progress {
                phase,
                progress: progress.clamp(0.0, 1.0),
            },
        );
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
