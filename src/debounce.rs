//! Coalescing of bursty triggers into one delayed action.

use std::cell::Cell;
use std::rc::{Rc, Weak};

pub type TaskId = i32;

/// Source of delayed one-shot tasks (`setTimeout` in the browser).
pub trait Scheduler {
    /// Runs `task` once after `delay_ms`. `None` when nothing could be scheduled.
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TaskId>;

    fn cancel(&self, id: TaskId);
}

struct Inner<S> {
    scheduler: S,
    delay_ms: u32,
    pending: Cell<Option<TaskId>>,
    action: Box<dyn Fn()>,
}

/// Arm / reset / fire-once debouncer.
///
/// The first [`trigger`](Debouncer::trigger) arms a task `delay_ms` out; any
/// trigger while armed is absorbed. When the task fires the debouncer disarms
/// before running the action, so triggers raised by the action arm a new round.
pub struct Debouncer<S> {
    inner: Rc<Inner<S>>,
}

impl<S> Clone for Debouncer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Scheduler + 'static> Debouncer<S> {
    pub fn new(scheduler: S, delay_ms: u32, action: impl Fn() + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                scheduler,
                delay_ms,
                pending: Cell::new(None),
                action: Box::new(action),
            }),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    /// Returns `true` when this call armed a new round.
    pub fn trigger(&self) -> bool {
        if self.is_armed() {
            return false;
        }
        let weak: Weak<Inner<S>> = Rc::downgrade(&self.inner);
        let task = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.pending.set(None);
                (inner.action)();
            }
        });
        match self.inner.scheduler.schedule(self.inner.delay_ms, task) {
            Some(id) => {
                self.inner.pending.set(Some(id));
                true
            }
            None => {
                log::warn!("[notes] could not schedule debounced task");
                false
            }
        }
    }

    /// Cancels the armed round, if any.
    pub fn reset(&self) {
        if let Some(id) = self.inner.pending.take() {
            self.inner.scheduler.cancel(id);
        }
    }
}

#[cfg(test)]
pub(crate) mod manual {
    use super::*;
    use std::cell::RefCell;

    struct Entry {
        id: TaskId,
        due: u64,
        task: Box<dyn FnOnce()>,
    }

    /// Virtual clock. Clones share the same queue.
    #[derive(Clone, Default)]
    pub struct ManualScheduler {
        now: Rc<Cell<u64>>,
        next_id: Rc<Cell<TaskId>>,
        queue: Rc<RefCell<Vec<Entry>>>,
    }

    impl ManualScheduler {
        pub fn pending(&self) -> usize {
            self.queue.borrow().len()
        }

        /// Moves the clock forward, firing every task that comes due.
        pub fn advance(&self, ms: u64) {
            let target = self.now.get() + ms;
            loop {
                let next = {
                    let mut queue = self.queue.borrow_mut();
                    let due = queue
                        .iter()
                        .enumerate()
                        .filter(|(_, entry)| entry.due <= target)
                        .min_by_key(|(_, entry)| (entry.due, entry.id))
                        .map(|(idx, _)| idx);
                    due.map(|idx| queue.remove(idx))
                };
                let Some(entry) = next else { break };
                self.now.set(entry.due);
                (entry.task)();
            }
            self.now.set(target);
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TaskId> {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            self.queue.borrow_mut().push(Entry {
                id,
                due: self.now.get() + u64::from(delay_ms),
                task,
            });
            Some(id)
        }

        fn cancel(&self, id: TaskId) {
            self.queue.borrow_mut().retain(|entry| entry.id != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::manual::ManualScheduler;
    use super::*;

    fn counting(delay: u32) -> (Debouncer<ManualScheduler>, ManualScheduler, Rc<Cell<u32>>) {
        let scheduler = ManualScheduler::default();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let debouncer = Debouncer::new(scheduler.clone(), delay, move || {
            counter.set(counter.get() + 1)
        });
        (debouncer, scheduler, fired)
    }

    #[test]
    fn burst_coalesces_into_one_run() {
        let (debouncer, clock, fired) = counting(100);
        assert!(debouncer.trigger());
        for _ in 0..50 {
            assert!(!debouncer.trigger());
        }
        clock.advance(99);
        assert_eq!(fired.get(), 0);
        clock.advance(1);
        assert_eq!(fired.get(), 1);
        assert!(!debouncer.is_armed());

        clock.advance(1_000);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn trigger_after_fire_arms_new_round() {
        let (debouncer, clock, fired) = counting(100);
        debouncer.trigger();
        clock.advance(100);
        debouncer.trigger();
        debouncer.trigger();
        clock.advance(100);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn reset_cancels_armed_round() {
        let (debouncer, clock, fired) = counting(100);
        debouncer.trigger();
        debouncer.reset();
        assert!(!debouncer.is_armed());
        assert_eq!(clock.pending(), 0);
        clock.advance(500);
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn dropped_debouncer_never_fires() {
        let (debouncer, clock, fired) = counting(10);
        debouncer.trigger();
        drop(debouncer);
        clock.advance(10);
        assert_eq!(fired.get(), 0);
    }
}
