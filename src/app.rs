//! Application lifecycle and the GUI event loop
//!
//! The thread that calls [`Application::initialize`] becomes the GUI thread
//! for the life of the session. [`Application`] is deliberately `!Send`, so
//! every window-lifecycle operation (`create_window`, `destroy_window`,
//! `exec`, `cleanup`) is pinned to that thread at compile time; the one
//! cross-thread control operation is [`terminate`], which is an atomic flag
//! plus a channel wake and can never deadlock the GUI thread.
//!
//! At most one application is live per process. The live application is
//! reachable through a process-wide slot so that `Copy` window handles can be
//! resolved from caller threads without carrying references around.
//!
//! # Loop structure
//!
//! `exec` blocks the GUI thread until every window has been closed or
//! termination is requested. Each dispatch pass flips newly constructed
//! windows to ready, services queued user events (invoking plot callbacks),
//! and composes pending buffers. The headless backend sleeps on the wake
//! channel between passes; the native backend performs the same dispatch
//! inside each eframe frame.

use crate::config::{AppConfig, SurfaceBackend};
use crate::handle::{WindowHandler, WindowTable};
use crate::viewer;
use crate::window::{PlotCallback, WindowEvent, WindowShared};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

/// Process-wide slot for the live application
static APP: Mutex<Option<Arc<AppShared>>> = Mutex::new(None);

/// Hook a surface installs so cross-thread wakes can trigger a repaint
pub(crate) type RepaintHook = Box<dyn Fn() + Send + Sync>;

/// State shared between the GUI thread, caller threads and the surface
pub(crate) struct AppShared {
    pub(crate) config: AppConfig,
    gui_thread: ThreadId,
    terminated: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    windows: Mutex<WindowTable>,
    window_seq: AtomicU32,
    repaint: Mutex<Option<RepaintHook>>,
}

impl AppShared {
    fn new(config: AppConfig) -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            config,
            gui_thread: thread::current().id(),
            terminated: AtomicBool::new(false),
            wake_tx,
            wake_rx,
            windows: Mutex::new(WindowTable::new()),
            window_seq: AtomicU32::new(1),
            repaint: Mutex::new(None),
        }
    }

    pub(crate) fn gui_thread(&self) -> ThreadId {
        self.gui_thread
    }

    /// Wake the GUI loop from any thread: nudge the channel and ask the
    /// surface for a repaint. Never blocks.
    pub(crate) fn wake(&self) {
        let _ = self.wake_tx.try_send(());
        if let Some(hook) = self.repaint.lock().expect("repaint hook poisoned").as_ref() {
            hook();
        }
    }

    pub(crate) fn set_repaint_hook(&self, hook: Option<RepaintHook>) {
        *self.repaint.lock().expect("repaint hook poisoned") = hook;
    }

    pub(crate) fn request_terminate(&self) {
        self.terminated.store(true, Ordering::Release);
        self.wake();
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Resolve a handle or die: stale handles are a contract violation, not
    /// an error value.
    pub(crate) fn resolve(&self, handle: WindowHandler) -> Arc<WindowShared> {
        // take the lookup result out before panicking, so a contract
        // violation does not poison the table lock
        let window = self.windows.lock().expect("window table poisoned").get(handle);
        match window {
            Some(window) => window,
            None => panic!("{handle:?} used after destroy_window (or from a different session)"),
        }
    }

    pub(crate) fn live_windows(&self) -> Vec<(WindowHandler, Arc<WindowShared>)> {
        self.windows.lock().expect("window table poisoned").live()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.windows
            .lock()
            .expect("window table poisoned")
            .live_count()
    }

    /// Close one window and invalidate its handle. No-op if already gone.
    pub(crate) fn close_window(&self, handle: WindowHandler) {
        let removed = self
            .windows
            .lock()
            .expect("window table poisoned")
            .remove(handle);
        if let Some(window) = removed {
            window.close();
        }
    }

    /// Close every open window, as on termination
    pub(crate) fn close_all(&self) {
        let drained = self
            .windows
            .lock()
            .expect("window table poisoned")
            .drain_live();
        for window in drained {
            window.close();
        }
    }

    /// One pass of the GUI loop over every live window: flip readiness,
    /// service user events, compose pending buffers. Returns the number of
    /// windows still open afterwards.
    pub(crate) fn dispatch(&self) -> usize {
        for (handle, window) in self.live_windows() {
            window.mark_ready();

            let mut closed = false;
            for event in window.take_events() {
                match event {
                    WindowEvent::SymbolRequested(name) => window.resolve_symbol(&name),
                    WindowEvent::CloseRequested => {
                        self.close_window(handle);
                        closed = true;
                        break;
                    }
                }
            }
            if !closed {
                window.refresh_presented();
            }
        }
        self.live_count()
    }
}

/// Fetch the live application or panic: every entry point below the
/// initialize/cleanup bracket goes through here.
pub(crate) fn current() -> Arc<AppShared> {
    let shared = APP.lock().expect("application slot poisoned").clone();
    match shared {
        Some(shared) => shared,
        None => panic!("no live application (Application::initialize has not been called)"),
    }
}

/// Request an orderly shutdown from any thread.
///
/// Closes all open windows and causes a blocked [`Application::exec`] to
/// return. Safe to call repeatedly; if no `exec` is running the flag simply
/// makes the next `exec` return immediately. Termination cannot be
/// un-signaled.
///
/// # Panics
///
/// Panics if called before `initialize` or after `cleanup`.
pub fn terminate() {
    tracing::info!("termination requested");
    current().request_terminate();
}

/// The process-wide GUI context.
///
/// Created by [`Application::initialize`] on what thereby becomes the GUI
/// thread. The type is `!Send`, so window lifecycle calls cannot leave that
/// thread; caller threads interact through [`WindowHandler`] and
/// [`terminate`] only.
pub struct Application {
    shared: Arc<AppShared>,
    /// Pins the value (and thus all lifecycle calls) to the GUI thread
    _gui_thread: PhantomData<*const ()>,
}

impl Application {
    /// Establish the GUI context with default options.
    ///
    /// # Panics
    ///
    /// Panics if an application is already live in this process.
    pub fn initialize() -> Self {
        Self::initialize_with(AppConfig::default())
    }

    /// Establish the GUI context with explicit options
    pub fn initialize_with(config: AppConfig) -> Self {
        let mut slot = APP.lock().expect("application slot poisoned");
        if slot.is_some() {
            drop(slot);
            panic!("Application::initialize called while another application is live");
        }
        let shared = Arc::new(AppShared::new(config));
        *slot = Some(shared.clone());
        tracing::info!(
            "application initialized, GUI thread is {:?} ({:?} backend)",
            shared.gui_thread(),
            shared.config.backend
        );
        Self {
            shared,
            _gui_thread: PhantomData,
        }
    }

    /// Create a new window and register it with the application.
    ///
    /// Returns immediately; the window becomes ready asynchronously once the
    /// GUI loop first dispatches it (see [`WindowHandler::is_ready`]).
    /// `plot_callback` is invoked later, on the GUI thread, whenever the user
    /// requests a symbol that is not already displayed.
    ///
    /// # Panics
    ///
    /// Panics if called after termination has been requested.
    pub fn create_window(
        &self,
        plot_callback: impl FnMut(&str) -> bool + Send + 'static,
    ) -> WindowHandler {
        if self.shared.is_terminated() {
            panic!("create_window called after terminate");
        }
        let seq = self.shared.window_seq.fetch_add(1, Ordering::Relaxed);
        let title = format!("Buffer inspector #{seq}");
        let window = Arc::new(WindowShared::new(
            title.clone(),
            Box::new(plot_callback) as PlotCallback,
        ));
        let handle = self
            .shared
            .windows
            .lock()
            .expect("window table poisoned")
            .insert(window);
        tracing::info!("created window '{}' as {:?}", title, handle);
        handle
    }

    /// Destroy a window, releasing its resources and invalidating `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale; destroying the same handle twice is a
    /// contract violation.
    pub fn destroy_window(&self, handle: WindowHandler) {
        let removed = self
            .shared
            .windows
            .lock()
            .expect("window table poisoned")
            .remove(handle);
        let Some(window) = removed else {
            panic!("destroy_window: {handle:?} is stale");
        };
        window.close();
        tracing::info!("destroyed {:?}", handle);
    }

    /// Number of currently open windows
    pub fn open_windows(&self) -> usize {
        self.shared.live_count()
    }

    /// Run the GUI event loop, blocking until every open window has been
    /// closed or [`terminate`] has been invoked. Returns with no windows left
    /// open. May be called again for a later batch of windows, unless
    /// termination was requested.
    pub fn exec(&self) {
        match self.shared.config.backend {
            SurfaceBackend::Headless => self.exec_headless(),
            SurfaceBackend::Native => {
                if let Err(e) = viewer::run(self.shared.clone()) {
                    tracing::error!("viewer terminated abnormally: {}", e);
                }
                self.shared.set_repaint_hook(None);
                // the viewer closes windows as it winds down; sweep whatever
                // is left so exec's postcondition holds even on error
                self.shared.close_all();
            }
        }
    }

    fn exec_headless(&self) {
        let shared = &self.shared;
        tracing::info!("entering GUI loop (headless)");
        loop {
            // drain stale wakes so a wake posted mid-dispatch is kept
            while shared.wake_rx.try_recv().is_ok() {}

            if shared.is_terminated() {
                shared.close_all();
                break;
            }
            if shared.dispatch() == 0 {
                break;
            }
            let _ = shared.wake_rx.recv_timeout(shared.config.tick);
        }
        tracing::info!("GUI loop finished, no windows open");
    }

    /// Release process-wide GUI resources and retire the application slot.
    ///
    /// Must be called after `exec` has returned (or was never entered) and
    /// after all windows are destroyed.
    ///
    /// # Panics
    ///
    /// Panics if windows are still open.
    pub fn cleanup(self) {
        if self.shared.live_count() != 0 {
            panic!(
                "Application::cleanup called with {} window(s) still open",
                self.shared.live_count()
            );
        }
        *APP.lock().expect("application slot poisoned") = None;
        tracing::info!("application cleaned up");
    }
}
