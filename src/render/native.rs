//! Scoped detection of native library errors.
//!
//! The native library reports failures out of band: a call fails and leaves
//! an error message behind. [`NativeCheck`] wraps one or more calls, clears
//! the pending error before and/or after, and converts whatever the calls left
//! behind into a [`NativeError`]. By default the error is returned to the
//! caller; [`NativeCheck::on_error`] installs a handler instead, in which case
//! the error is handed to the handler and the call result is kept.

use crate::errors::NativeError;
use crate::render::backend::NativeBackend;
use bitflags::bitflags;
use std::borrow::Cow;

bitflags! {
    /// When the pending native error is cleared around a checked call.
    pub struct ClearErrorOn: u8 {
        const ENTER = 0b01;
        const EXIT  = 0b10;
    }
}

impl Default for ClearErrorOn {
    fn default() -> Self {
        ClearErrorOn::ENTER | ClearErrorOn::EXIT
    }
}

type ErrorHandler = Box<dyn Fn(&NativeError)>;

pub struct NativeCheck {
    context: Cow<'static, str>,
    clear_on: ClearErrorOn,
    handler: Option<ErrorHandler>,
}

impl NativeCheck {
    pub fn new(context: impl Into<Cow<'static, str>>) -> Self {
        Self {
            context: context.into(),
            clear_on: ClearErrorOn::default(),
            handler: None,
        }
    }

    pub fn clear_on(mut self, clear_on: ClearErrorOn) -> Self {
        self.clear_on = clear_on;
        self
    }

    /// Hand errors to `handler` instead of returning them.
    pub fn on_error(mut self, handler: impl Fn(&NativeError) + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Runs `f` against the backend and reports any native error it left behind.
    pub fn run<T>(
        &self,
        backend: &mut dyn NativeBackend,
        f: impl FnOnce(&mut dyn NativeBackend) -> T,
    ) -> Result<T, NativeError> {
        if self.clear_on.contains(ClearErrorOn::ENTER) {
            backend.clear_error();
        }

        let value = f(&mut *backend);

        let pending = backend.last_error().filter(|msg| !msg.is_empty());
        if self.clear_on.contains(ClearErrorOn::EXIT) {
            backend.clear_error();
        }

        match pending {
            None => Ok(value),
            Some(message) => {
                let err = NativeError::new(self.context.as_ref(), message);
                match &self.handler {
                    Some(handler) => {
                        handler(&err);
                        Ok(value)
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Like [`run`](Self::run) for calls returning `Option`. A `None` result is an error
    /// even when the backend did not leave a message (or a handler swallowed it).
    pub fn run_required<T>(
        &self,
        backend: &mut dyn NativeBackend,
        f: impl FnOnce(&mut dyn NativeBackend) -> Option<T>,
    ) -> Result<T, NativeError> {
        self.run(backend, f)?
            .ok_or_else(|| NativeError::new(self.context.as_ref(), "native call returned no result"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PixelFormat;
    use crate::geometry::IVector2;
    use crate::render::backends::headless::{HeadlessBackend, HeadlessOp};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn passes_through_successful_calls() {
        let mut backend = HeadlessBackend::new();
        let check = NativeCheck::new("create surface");
        let id = check
            .run_required(&mut backend, |b| b.create_surface(IVector2::new(4, 4), PixelFormat::RGBA32))
            .unwrap();
        assert_eq!(backend.surface_size(id), Some(IVector2::new(4, 4)));
    }

    #[test]
    fn raises_pending_error_with_context() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next(HeadlessOp::CreateSurface, "out of memory");

        let err = NativeCheck::new("Could not create surface")
            .run_required(&mut backend, |b| b.create_surface(IVector2::new(4, 4), PixelFormat::RGBA32))
            .unwrap_err();

        assert_eq!(err.context, "Could not create surface");
        assert_eq!(err.message, "out of memory");
        assert!(backend.last_error().is_none());
    }

    #[test]
    fn stale_error_is_cleared_on_enter() {
        let mut backend = HeadlessBackend::new();
        backend.set_error("left over");

        let res = NativeCheck::new("noop").run(&mut backend, |_| 42);
        assert_eq!(res, Ok(42));
    }

    #[test]
    fn stale_error_is_reported_without_clear_on_enter() {
        let mut backend = HeadlessBackend::new();
        backend.set_error("left over");

        let res = NativeCheck::new("noop")
            .clear_on(ClearErrorOn::EXIT)
            .run(&mut backend, |_| 42);
        assert_eq!(res.unwrap_err().message, "left over");
    }

    #[test]
    fn error_survives_without_clear_on_exit() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next(HeadlessOp::CreateWindow, "no display");

        let _ = NativeCheck::new("window")
            .clear_on(ClearErrorOn::ENTER)
            .run(&mut backend, |b| {
                b.create_window("t", Default::default(), IVector2::new(1, 1), Default::default())
            });
        assert_eq!(backend.last_error().as_deref(), Some("no display"));
    }

    #[test]
    fn handler_swallows_error() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next(HeadlessOp::PollEvent, "poll failed");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let res = NativeCheck::new("poll")
            .on_error(move |e| sink.borrow_mut().push(e.to_string()))
            .run(&mut backend, |b| b.poll_event());

        assert_eq!(res, Ok(None));
        assert_eq!(seen.borrow().as_slice(), ["poll: native error: poll failed"]);
    }
}
