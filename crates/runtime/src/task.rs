use std::time::Duration;

/// A one-shot unit of deferred work.
///
/// Tasks run on the page's single thread, so they may capture `Rc` state.
pub struct Task {
    pub label: &'static str,
    pub delay: Duration,
    pub run: Box<dyn FnOnce()>,
}

impl Task {
    pub fn new(label: &'static str, delay: Duration, run: impl FnOnce() + 'static) -> Self {
        Self {
            label,
            delay,
            run: Box::new(run),
        }
    }

    /// A task that should run as soon as it is submitted.
    pub fn immediate(label: &'static str, run: impl FnOnce() + 'static) -> Self {
        Self::new(label, Duration::ZERO, run)
    }

    pub fn is_immediate(&self) -> bool {
        self.delay.is_zero()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
