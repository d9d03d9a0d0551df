use compygui::color::RgbaColor;
use compygui::events::{EventKind, ListenerOptions, Subscriber};
use compygui::geometry::Vector2;
use compygui::gui::{ColorRect, Component, GuiConfig, RectSize};
use compygui::render::backends::headless::HeadlessBackend;
use compygui::render::{NativeEvent, WindowPosition};
use compygui::{App, AppConfig, GuiError, WindowConfig};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const FRAMES_BEFORE_CLOSE: u32 = 5;

fn hello_world_layout() -> Result<Component, GuiError> {
    let config = GuiConfig::builder()
        .position(360, 270)
        .anchor(Vector2::CENTER)
        .build()?;
    Component::gui(
        config,
        ColorRect::new(RectSize::Relative(Vector2::new(1.0, 0.8)), RgbaColor::WHITE),
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::builder().filter_level(log::LevelFilter::Debug).init();

    // The headless backend keeps every window and surface in memory. A real
    // embedder would hand in a backend talking to the windowing system instead.
    let backend = Rc::new(RefCell::new(HeadlessBackend::new()));

    // Configure the app through its builder. The title is used for every window
    // that does not set its own.
    let app_cfg = AppConfig::builder()
        .title("Hello, ComPyGUI! :D")
        .target_fps(60)
        .build()?;
    let app = App::new(app_cfg, backend.clone())?;

    let frames = Rc::new(Cell::new(0u32));
    let counter = frames.clone();
    let input = backend.clone();

    app.run(move |app| {
        let window = app.create_window(
            WindowConfig::builder()
                .position(WindowPosition::Centered)
                .size(720, 540)
                .build()?,
        )?;
        window.add(&hello_world_layout()?)?;
        window.show()?;

        // Nobody is there to click the close button, so we press it ourselves
        // after a few frames. The app stops once its last window is gone.
        let native = window.native_id();
        app.events().connect(
            Subscriber::Other("hello_world".into()),
            EventKind::AppRender,
            ListenerOptions::new(),
            move |_| {
                counter.set(counter.get() + 1);
                if counter.get() == FRAMES_BEFORE_CLOSE {
                    input.borrow_mut().push_event(NativeEvent::WindowClose { window: native });
                }
                Ok(())
            },
        )?;
        Ok(())
    })?;

    let backend = backend.borrow();
    println!(
        "rendered {} frames, {} windows left, backend shut down: {}",
        frames.get(),
        backend.window_ids().len(),
        backend.is_shut_down()
    );
    Ok(())
}
