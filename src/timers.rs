//! Thin wrappers over the browser timer APIs. On native targets (tests)
//! they degrade to inert handles so timer-driven state machines can be
//! exercised without a browser event loop.

#[cfg(target_arch = "wasm32")]
use gloo::timers::callback::Timeout;

pub(crate) struct TimerHandle {
    #[cfg(target_arch = "wasm32")]
    inner: Option<Timeout>,
}

impl TimerHandle {
    /// Let the timer fire without holding the handle. Dropping a handle
    /// cancels its timer, so fire-and-forget callers must call this.
    #[cfg(target_arch = "wasm32")]
    pub(crate) fn forget(mut self) {
        if let Some(timeout) = self.inner.take() {
            timeout.forget();
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) fn forget(self) {}

    pub(crate) fn cancel(self) {
        drop(self);
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn schedule(delay_ms: u32, callback: impl FnOnce() + 'static) -> TimerHandle {
    TimerHandle {
        inner: Some(Timeout::new(delay_ms, callback)),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn schedule(_delay_ms: u32, _callback: impl FnOnce() + 'static) -> TimerHandle {
    TimerHandle {}
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn now_ms() -> f64 {
    0.0
}
