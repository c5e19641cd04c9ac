use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::debounce::{Scheduler, TaskId};

/// `window.setTimeout`-backed [`Scheduler`].
pub struct TimeoutScheduler {
    window: Window,
}

impl TimeoutScheduler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TaskId> {
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                Closure::once_into_js(move || task()).as_ref().unchecked_ref(),
                delay,
            )
            .ok()
    }

    fn cancel(&self, id: TaskId) {
        self.window.clear_timeout_with_handle(id);
    }
}
