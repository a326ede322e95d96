use std::cell::{Cell, RefCell};
use std::time::Duration;

use crate::task::Task;

/// Fire-and-forget deferred execution.
///
/// There is no handle and no cancellation: once submitted, a
/// task runs when its delay elapses.
pub trait TaskScheduler {
    fn schedule(&self, task: Task);
}

/// Submit `task`, running it inline when it has no delay.
pub fn run_or_schedule(scheduler: &dyn TaskScheduler, task: Task) {
    if task.is_immediate() {
        tracing::trace!(label = task.label, "running task inline");
        (task.run)();
    } else {
        scheduler.schedule(task);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub ran_tasks: usize,
    pub pending_tasks: usize,
}

/// Deterministic scheduler driven by a virtual clock.
///
/// Ordering is `(due_time, insertion_order)`, so two tasks due at the same
/// instant run in submission order. Tasks submitted while advancing are
/// picked up in the same call if they fall due before its target time.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_order: Cell<u64>,
    pending: RefCell<Vec<(Duration, u64, Task)>>,
    log: RefCell<Vec<(Duration, &'static str)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// `(time, label)` for every task that has run, in execution order.
    pub fn history(&self) -> Vec<(Duration, &'static str)> {
        self.log.borrow().clone()
    }

    pub fn advance_ms(&self, ms: u64) -> TickSummary {
        self.advance(Duration::from_millis(ms))
    }

    pub fn advance(&self, by: Duration) -> TickSummary {
        let target = self.now.get() + by;
        let mut ran = 0usize;

        loop {
            let next = {
                let mut pending = self.pending.borrow_mut();
                let idx = pending
                    .iter()
                    .enumerate()
                    .filter(|(_, (due, _, _))| *due <= target)
                    .min_by(|(_, (da, oa, _)), (_, (db, ob, _))| da.cmp(db).then_with(|| oa.cmp(ob)))
                    .map(|(i, _)| i);
                idx.map(|i| pending.remove(i))
            };
            // The borrow is released before running so the task may schedule more work.
            let Some((due, _, task)) = next else {
                break;
            };
            self.now.set(due);
            self.log.borrow_mut().push((due, task.label));
            (task.run)();
            ran += 1;
        }

        self.now.set(target);
        TickSummary {
            ran_tasks: ran,
            pending_tasks: self.pending_count(),
        }
    }

    /// Run everything that is pending, however far in the future.
    pub fn run_until_idle(&self) -> TickSummary {
        let mut total = 0usize;
        loop {
            let furthest = self.pending.borrow().iter().map(|(due, _, _)| *due).max();
            let Some(due) = furthest else {
                break;
            };
            let by = due.saturating_sub(self.now.get());
            total += self.advance(by).ran_tasks;
        }
        TickSummary {
            ran_tasks: total,
            pending_tasks: 0,
        }
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule(&self, task: Task) {
        let order = self.next_order.get();
        self.next_order.set(order.wrapping_add(1));
        let due = self.now.get() + task.delay;
        self.pending.borrow_mut().push((due, order, task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce()>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let make = move |name: &'static str| -> Box<dyn FnOnce()> {
            let s = s.clone();
            Box::new(move || s.borrow_mut().push(name))
        };
        (seen, make)
    }

    #[test]
    fn runs_tasks_in_due_order() {
        let sched = ManualScheduler::new();
        let (seen, make) = recorder();
        sched.schedule(Task::new("late", Duration::from_millis(200), make("late")));
        sched.schedule(Task::new("early", Duration::from_millis(100), make("early")));

        let summary = sched.advance_ms(250);
        assert_eq!(*seen.borrow(), vec!["early", "late"]);
        assert_eq!(summary.ran_tasks, 2);
        assert_eq!(summary.pending_tasks, 0);
    }

    #[test]
    fn ties_run_in_insertion_order() {
        let sched = ManualScheduler::new();
        let (seen, make) = recorder();
        sched.schedule(Task::new("a", Duration::from_millis(10), make("a")));
        sched.schedule(Task::new("b", Duration::from_millis(10), make("b")));
        sched.advance_ms(10);
        assert_eq!(*seen.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn does_not_run_tasks_before_due() {
        let sched = ManualScheduler::new();
        let (seen, make) = recorder();
        sched.schedule(Task::new("reveal", Duration::from_millis(2500), make("reveal")));

        let summary = sched.advance_ms(2499);
        assert!(seen.borrow().is_empty());
        assert_eq!(summary.pending_tasks, 1);

        sched.advance_ms(1);
        assert_eq!(*seen.borrow(), vec!["reveal"]);
        assert_eq!(sched.history(), vec![(Duration::from_millis(2500), "reveal")]);
    }

    #[test]
    fn tasks_scheduled_while_advancing_are_picked_up() {
        let sched = Rc::new(ManualScheduler::new());
        let (seen, make) = recorder();
        let inner = make("inner");
        let s = sched.clone();
        sched.schedule(Task::new("outer", Duration::from_millis(5), move || {
            s.schedule(Task::new("inner", Duration::from_millis(5), inner));
        }));

        sched.advance_ms(10);
        assert_eq!(*seen.borrow(), vec!["inner"]);
        assert_eq!(sched.now(), Duration::from_millis(10));
    }

    #[test]
    fn run_or_schedule_runs_immediate_tasks_inline() {
        let sched = ManualScheduler::new();
        let (seen, make) = recorder();
        run_or_schedule(&sched, Task::immediate("now", make("now")));
        run_or_schedule(&sched, Task::new("later", Duration::from_millis(1), make("later")));
        assert_eq!(*seen.borrow(), vec!["now"]);
        assert_eq!(sched.pending_count(), 1);
    }

    #[test]
    fn run_until_idle_drains_everything() {
        let sched = ManualScheduler::new();
        let (seen, make) = recorder();
        sched.schedule(Task::new("x", Duration::from_secs(60), make("x")));
        let summary = sched.run_until_idle();
        assert_eq!(summary.ran_tasks, 1);
        assert_eq!(*seen.borrow(), vec!["x"]);
    }
}
