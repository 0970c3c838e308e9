//! Element lifecycle states.

/// Lifecycle states, ordered from torn down to streaming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElementState {
    Null,
    Ready,
    Paused,
    Playing,
}

impl ElementState {
    /// The adjacent state one step toward `target`, if any.
    #[must_use]
    pub fn step_toward(self, target: Self) -> Option<Self> {
        use ElementState::{Null, Paused, Playing, Ready};
        match (self.cmp(&target), self) {
            (std::cmp::Ordering::Equal, _) => None,
            (std::cmp::Ordering::Less, Null) => Some(Ready),
            (std::cmp::Ordering::Less, Ready) => Some(Paused),
            (std::cmp::Ordering::Less, _) => Some(Playing),
            (std::cmp::Ordering::Greater, Playing) => Some(Paused),
            (std::cmp::Ordering::Greater, Paused) => Some(Ready),
            (std::cmp::Ordering::Greater, _) => Some(Null),
        }
    }
}

/// One step between adjacent lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: ElementState,
    pub to: ElementState,
}

impl Transition {
    /// The one transition with filter-specific behavior: entering Paused
    /// from Ready restarts the output timeline.
    #[must_use]
    pub fn resets_timeline(&self) -> bool {
        self.from == ElementState::Ready && self.to == ElementState::Paused
    }
}
