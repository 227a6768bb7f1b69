use crate::models::FocusSide;

/// Remembers which field the user touched last; that side drives the next
/// quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusTracker {
    current: FocusSide,
}

impl FocusTracker {
    pub fn on_focus(&mut self, side: FocusSide) {
        self.current = side;
    }

    pub fn current(&self) -> FocusSide {
        self.current
    }
}
