//! Common test utilities for driving a GUI thread from the test thread

#![allow(dead_code)] // Test utilities may not all be used in every test file

use pixwatch_rs::{AppConfig, Application, BufferDescriptor, ElementType, WindowHandler};
use std::sync::mpsc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Generous upper bound for anything the GUI loop does promptly
pub const BOUNDED: Duration = Duration::from_secs(5);

/// A headless application running on its own GUI thread.
///
/// The GUI thread initializes the application, runs the window setup, hands
/// the created handles back, waits for [`Gui::start_exec`], then runs `exec`
/// and cleans up. The test thread plays the caller role.
pub struct Gui {
    pub windows: Vec<WindowHandler>,
    go: Option<mpsc::Sender<()>>,
    thread: JoinHandle<()>,
}

/// One window with a callback that never resolves, exec started immediately
pub fn launch() -> Gui {
    launch_with(|_| false)
}

/// One window with the given plot callback, exec started immediately
pub fn launch_with(callback: impl FnMut(&str) -> bool + Send + 'static) -> Gui {
    let mut gui = launch_staged(callback);
    gui.start_exec();
    gui
}

/// One window, but `exec` does not start until [`Gui::start_exec`]
pub fn launch_staged(callback: impl FnMut(&str) -> bool + Send + 'static) -> Gui {
    launch_setup(move |app| vec![app.create_window(callback)])
}

/// Arbitrary GUI-thread setup; `exec` waits for [`Gui::start_exec`]
pub fn launch_setup<F>(setup: F) -> Gui
where
    F: FnOnce(&Application) -> Vec<WindowHandler> + Send + 'static,
{
    let (handle_tx, handle_rx) = mpsc::channel();
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let thread = std::thread::spawn(move || {
        let app = Application::initialize_with(AppConfig::headless());
        let windows = setup(&app);
        handle_tx.send(windows).expect("handle channel closed");
        // a dropped sender counts as a start signal
        let _ = go_rx.recv();
        app.exec();
        assert_eq!(app.open_windows(), 0, "exec returned with windows open");
        app.cleanup();
    });
    let windows = handle_rx
        .recv()
        .expect("GUI thread died during window setup");
    Gui {
        windows,
        go: Some(go_tx),
        thread,
    }
}

impl Gui {
    /// The first (usually only) window
    pub fn window(&self) -> WindowHandler {
        self.windows[0]
    }

    /// Let the GUI thread enter `exec`
    pub fn start_exec(&mut self) {
        if let Some(go) = self.go.take() {
            go.send(()).expect("GUI thread gone before exec started");
        }
    }

    /// Terminate from the test thread and require the GUI thread to finish
    /// within `timeout`
    pub fn shutdown_within(mut self, timeout: Duration) {
        self.start_exec();
        pixwatch_rs::terminate();
        self.join_within(timeout);
    }

    /// Require the GUI thread to finish on its own within `timeout`
    pub fn join_within(mut self, timeout: Duration) {
        self.start_exec();
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        let watcher = std::thread::spawn(move || {
            self.thread.join().expect("GUI thread panicked");
            flag.store(true, Ordering::SeqCst);
        });
        assert!(
            wait_until(timeout, || done.load(Ordering::SeqCst)),
            "GUI thread did not finish within {timeout:?}"
        );
        watcher.join().expect("watcher thread panicked");
    }
}

/// Poll `cond` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Block until `window` reports ready
pub fn wait_ready(window: WindowHandler) {
    assert!(
        wait_until(BOUNDED, || window.is_ready()),
        "window never became ready"
    );
}

/// An owned pixel frame that can hand out descriptors
pub struct Frame {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub element_type: ElementType,
    pub row_stride: u32,
    pub pixel_layout: String,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn descriptor(&self) -> BufferDescriptor<'_> {
        BufferDescriptor {
            data: &self.data,
            display_name: &self.name,
            width: self.width,
            height: self.height,
            channels: self.channels,
            element_type: self.element_type,
            row_stride: self.row_stride,
            pixel_layout: &self.pixel_layout,
        }
    }
}

/// The 4x2 RGB frame from the handoff scenario
pub fn rgb_frame(name: &str) -> Frame {
    rgb_frame_sized(name, 4, 2)
}

pub fn rgb_frame_sized(name: &str, width: u32, height: u32) -> Frame {
    Frame {
        name: name.to_string(),
        width,
        height,
        channels: 3,
        element_type: ElementType::U8,
        row_stride: width,
        pixel_layout: "rgb".to_string(),
        data: vec![0x40; (width * height * 3) as usize],
    }
}

pub fn gray_frame(name: &str, width: u32, height: u32) -> Frame {
    Frame {
        name: name.to_string(),
        width,
        height,
        channels: 1,
        element_type: ElementType::U8,
        row_stride: width,
        pixel_layout: "r".to_string(),
        data: vec![0x80; (width * height) as usize],
    }
}
