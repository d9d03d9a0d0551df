//! Application runtime.
//!
//! The [`App`] owns the backend handle, the app-level event queue and every
//! open [`Window`]. Each main-loop iteration ([`App::step`]) drains the native
//! input queue, translating window close/resize requests into app events,
//! then fires `app.render` with the frame delta and ticks the app queue.
//!
//! The app stops once the last window has been destroyed or a native quit
//! request arrives, and is then torn down: remaining windows are destroyed and
//! the backend is shut down.

use crate::config::AppConfig;
use crate::errors::GuiError;
use crate::events::{EventKind, EventOrigin, EventPayload, EventQueue, ListenerHandle, ListenerOptions, Subscriber};
use crate::geometry::IVector2;
use crate::render::{NativeCheck, NativeEvent, SharedBackend};
use crate::window::{Window, WindowConfig, WindowId};
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Lifecycle of an [`App`]. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Created,
    Running,
    Stopped,
    TornDown,
}

struct AppInner {
    config: AppConfig,
    backend: SharedBackend,
    events: EventQueue,
    windows: RefCell<Vec<Window>>,
    state: Cell<AppState>,
    stop_requested: Cell<bool>,
    listener: RefCell<Option<ListenerHandle>>,
}

impl AppInner {
    fn forget_window(&self, id: WindowId) {
        let remaining = {
            let mut windows = self.windows.borrow_mut();
            windows.retain(|w| w.id() != id);
            windows.len()
        };
        log::debug!("window {} removed, {} left", id, remaining);
        if remaining == 0 {
            log::info!("last window closed, stopping");
            self.stop_requested.set(true);
        }
    }
}

/// Handle to the application. Clones refer to the same app.
#[derive(Clone)]
pub struct App {
    inner: Rc<AppInner>,
}

impl App {
    pub fn new(config: AppConfig, backend: SharedBackend) -> Result<App, GuiError> {
        config.validate()?;
        let events = EventQueue::new("app", config.app_queue.clone());

        let app = App {
            inner: Rc::new(AppInner {
                config,
                backend,
                events,
                windows: RefCell::new(Vec::new()),
                state: Cell::new(AppState::Created),
                stop_requested: Cell::new(false),
                listener: RefCell::new(None),
            }),
        };

        let weak = Rc::downgrade(&app.inner);
        let listener = app.inner.events.connect(
            Subscriber::App,
            EventKind::WindowDestroyed,
            ListenerOptions::new(),
            move |event| {
                if let (Some(inner), EventPayload::WindowDestroyed { window }) = (weak.upgrade(), event.payload()) {
                    inner.forget_window(*window);
                }
                Ok(())
            },
        )?;
        *app.inner.listener.borrow_mut() = Some(listener);

        log::info!(
            "app '{}' created on {}",
            app.inner.config.title,
            app.inner.backend.borrow().name()
        );
        Ok(app)
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn state(&self) -> AppState {
        self.inner.state.get()
    }

    /// The app-level event queue.
    pub fn events(&self) -> &EventQueue {
        &self.inner.events
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.inner.backend
    }

    /// Open windows, in creation order.
    pub fn windows(&self) -> Vec<Window> {
        self.inner.windows.borrow().clone()
    }

    pub fn window_count(&self) -> usize {
        self.inner.windows.borrow().len()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.inner.stop_requested.get()
    }

    pub fn create_window(&self, config: WindowConfig) -> Result<Window, GuiError> {
        if self.state() == AppState::TornDown {
            return Err(GuiError::Lifecycle("cannot create a window after the app has been torn down".into()));
        }

        let inner = &self.inner;
        let window = Window::open(
            &inner.events,
            inner.backend.clone(),
            inner.config.window_queue.clone(),
            &inner.config.title,
            config,
        )?;
        inner.windows.borrow_mut().push(window.clone());
        Ok(window)
    }

    /// Runs `setup`, then the main loop until a stop is requested, then tears the app down.
    pub fn run<F>(&self, setup: F) -> Result<(), GuiError>
    where
        F: FnOnce(&App) -> Result<(), GuiError>,
    {
        match self.state() {
            AppState::Running => return Err(GuiError::AlreadyRunning),
            AppState::TornDown => return Err(GuiError::Lifecycle("the app has been torn down".into())),
            AppState::Created | AppState::Stopped => {}
        }

        self.inner.state.set(AppState::Running);
        self.inner.stop_requested.set(false);
        log::info!("app '{}' running", self.inner.config.title);

        let result = self.main_loop(setup);

        self.inner.state.set(AppState::Stopped);
        let teardown = self.teardown();
        result.and(teardown)
    }

    fn main_loop<F>(&self, setup: F) -> Result<(), GuiError>
    where
        F: FnOnce(&App) -> Result<(), GuiError>,
    {
        setup(self)?;

        let frame_time = self
            .inner
            .config
            .target_fps
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));

        let mut last_frame = Instant::now();
        let mut frames: u64 = 0;
        while !self.is_stop_requested() {
            let frame_start = Instant::now();
            let delta = frame_start - last_frame;
            last_frame = frame_start;

            self.step(delta)?;
            frames += 1;

            if let Some(frame_time) = frame_time {
                let spent = frame_start.elapsed();
                if spent < frame_time {
                    std::thread::sleep(frame_time - spent);
                }
            }
        }

        log::info!("app '{}' stopped after {} frames", self.inner.config.title, frames);
        Ok(())
    }

    /// One main-loop iteration: handle pending native events, fire `app.render`, tick the app queue.
    pub fn step(&self, delta: Duration) -> Result<(), GuiError> {
        if self.state() == AppState::TornDown {
            return Err(GuiError::Lifecycle("the app has been torn down".into()));
        }

        self.pump_native_events()?;
        self.inner
            .events
            .fire(EventOrigin::App, EventPayload::AppRender { delta })?;
        self.inner.events.tick();
        Ok(())
    }

    fn pump_native_events(&self) -> Result<(), GuiError> {
        let check = NativeCheck::new("Failed to poll native events").on_error(|e| log::warn!("{e}"));
        loop {
            let event = {
                let mut backend = self.inner.backend.borrow_mut();
                check.run(&mut *backend, |b| b.poll_event())?
            };
            let Some(event) = event else {
                return Ok(());
            };

            match event {
                NativeEvent::Quit => {
                    log::info!("quit requested by the windowing system");
                    self.inner.stop_requested.set(true);
                }
                NativeEvent::WindowClose { window } => {
                    self.inner
                        .events
                        .fire(EventOrigin::App, EventPayload::AppWindowClose { window })?;
                }
                NativeEvent::WindowResized { window, width, height } => {
                    self.inner.events.fire(
                        EventOrigin::App,
                        EventPayload::AppWindowResized {
                            window,
                            size: IVector2::new(width, height),
                        },
                    )?;
                }
                NativeEvent::Other(name) => log::trace!("ignoring native event {name}"),
            }
        }
    }

    /// Asks the app to stop. A running app stops after the current iteration; an app that is
    /// not running is torn down right away. Quitting a torn down app does nothing.
    pub fn quit(&self) -> Result<(), GuiError> {
        match self.state() {
            AppState::Running => {
                self.inner.stop_requested.set(true);
                Ok(())
            }
            AppState::Created | AppState::Stopped => self.teardown(),
            AppState::TornDown => Ok(()),
        }
    }

    fn teardown(&self) -> Result<(), GuiError> {
        let inner = &self.inner;
        if inner.state.get() == AppState::TornDown {
            return Ok(());
        }

        let mut result = Ok(());
        let windows = std::mem::take(&mut *inner.windows.borrow_mut());
        for window in windows.iter().filter(|w| !w.is_destroyed()) {
            let res = window.destroy();
            if result.is_ok() {
                result = res;
            }
        }

        let listener = inner.listener.borrow_mut().take();
        if let Some(listener) = listener {
            let res = inner.events.disconnect(&listener);
            if result.is_ok() {
                result = res;
            }
        }

        inner.backend.borrow_mut().shutdown();
        inner.state.set(AppState::TornDown);
        log::info!("app '{}' torn down", inner.config.title);
        result
    }
}

impl Debug for App {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("title", &self.inner.config.title)
            .field("state", &self.inner.state.get())
            .field("windows", &self.inner.windows.try_borrow().map(|w| w.len()).ok())
            .finish()
    }
}
