use std::cell::Cell;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum PresenterState {
    #[default]
    Loading,
    Revealed,
}

/// Two-state latch: `Loading` until the reveal fires, then `Revealed` forever.
#[derive(Debug, Default)]
pub struct RevealLatch {
    state: Cell<PresenterState>,
}

impl RevealLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PresenterState {
        self.state.get()
    }

    /// Returns `true` only for the call that performs the transition.
    pub fn reveal(&self) -> bool {
        if self.state.get() == PresenterState::Revealed {
            return false;
        }
        self.state.set(PresenterState::Revealed);
        true
    }
}
