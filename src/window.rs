//! Window state and the caller/GUI handoff discipline
//!
//! A window's mutable state lives behind one mutex so that caller threads
//! (plotting buffers, replacing symbols, reading the observed list) and the
//! GUI thread (composing images, servicing user events) can never observe a
//! half-applied update. Readiness is a separate atomic so polling it never
//! contends with a render pass.
//!
//! # State machine
//!
//! `Created` -> `Ready` -> `Destroyed`. The readiness flag flips exactly once,
//! on the GUI thread, when the surface first dispatches the window. Buffers
//! plotted before that are bound immediately (visible to
//! `get_observed_buffers`) and their composition is queued until the window is
//! ready; nothing is silently dropped.

use crate::error::PixWatchError;
use crate::render::{self, RgbaImage};
use crate::types::CapturedBuffer;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Callback through which the GUI asks the host to resolve a symbol name.
///
/// Invoked only on the GUI thread, only for symbols not already displayed.
/// The host answers by calling `plot_buffer` for the same window before
/// returning `true`, or returns `false` if the symbol cannot be resolved.
/// It runs on the GUI thread, so it must not block indefinitely.
pub type PlotCallback = Box<dyn FnMut(&str) -> bool + Send + 'static>;

/// User actions posted by a surface (or a test harness) for GUI-side dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    /// The user submitted a symbol name in the search input
    SymbolRequested(String),
    /// The user asked to close the window
    CloseRequested,
}

/// Lifecycle phase of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    Created,
    Ready,
    Destroyed,
}

/// Ordered set of candidate symbol names for the search autocomplete.
///
/// Replaced wholesale by the caller; the GUI only ever sees a complete list.
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    names: Vec<String>,
}

impl SymbolRegistry {
    /// Replace the whole registry. Duplicates are tolerated; an empty
    /// collection clears the autocomplete source.
    pub fn replace(&mut self, names: Vec<String>) {
        self.names = names;
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive filter for the search input: prefix matches first,
    /// then substring matches, preserving registry order within each group.
    pub fn filter(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return self.names.clone();
        }
        let query = query.to_lowercase();
        let mut prefixed = Vec::new();
        let mut contained = Vec::new();
        for name in &self.names {
            let lower = name.to_lowercase();
            if lower.starts_with(&query) {
                prefixed.push(name.clone());
            } else if lower.contains(&query) {
                contained.push(name.clone());
            }
        }
        prefixed.extend(contained);
        prefixed
    }
}

/// One name -> buffer binding, with a version bumped on every re-plot
#[derive(Debug, Clone)]
pub struct Binding {
    pub buffer: CapturedBuffer,
    pub version: u64,
}

/// A composed image cached for the surface, tagged with the binding version
/// it was composed from
#[derive(Debug, Clone)]
pub struct PresentedImage {
    pub version: u64,
    pub image: RgbaImage,
}

/// Mutable window state, guarded by [`WindowShared::state`]
#[derive(Debug)]
pub struct WindowState {
    phase: WindowPhase,
    /// Bindings in insertion order, unique by display name
    bindings: Vec<Binding>,
    /// Names whose bindings still need composition
    pending_compose: Vec<String>,
    /// Composed images keyed by display name
    presented: HashMap<String, PresentedImage>,
    symbols: SymbolRegistry,
    /// Buffer currently selected for display in the surface
    selected: Option<String>,
    /// Last user-visible hint (e.g. an unresolved symbol)
    hint: Option<String>,
    next_version: u64,
}

impl WindowState {
    fn new() -> Self {
        Self {
            phase: WindowPhase::Created,
            bindings: Vec::new(),
            pending_compose: Vec::new(),
            presented: HashMap::new(),
            symbols: SymbolRegistry::default(),
            selected: None,
            hint: None,
            next_version: 1,
        }
    }
}

/// Shared window object: one per open window, referenced by the application's
/// window table and by any surface presenting it.
pub struct WindowShared {
    title: String,
    ready: AtomicBool,
    state: Mutex<WindowState>,
    events: Mutex<VecDeque<WindowEvent>>,
    callback: Mutex<PlotCallback>,
}

impl WindowShared {
    pub(crate) fn new(title: String, callback: PlotCallback) -> Self {
        Self {
            title,
            ready: AtomicBool::new(false),
            state: Mutex::new(WindowState::new()),
            events: Mutex::new(VecDeque::new()),
            callback: Mutex::new(callback),
        }
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    /// Lock-free readiness poll, callable from any thread
    pub(crate) fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// GUI thread: flip `Created` -> `Ready` once the surface has finished
    /// constructing. Later calls are no-ops.
    pub(crate) fn mark_ready(&self) {
        let mut state = self.lock_state();
        if state.phase == WindowPhase::Created {
            state.phase = WindowPhase::Ready;
            drop(state);
            self.ready.store(true, Ordering::Release);
            tracing::info!("window '{}' is ready", self.title);
        }
    }

    /// GUI thread: release window resources and leave the `Destroyed` phase
    /// behind. The owning table entry must be removed by the caller.
    pub(crate) fn close(&self) {
        let mut state = self.lock_state();
        state.phase = WindowPhase::Destroyed;
        state.presented.clear();
        state.pending_compose.clear();
        tracing::info!("window '{}' closed", self.title);
    }

    pub(crate) fn phase(&self) -> WindowPhase {
        self.lock_state().phase
    }

    /// Bind a captured buffer under its display name, replacing any prior
    /// binding of the same name in place. Composition is deferred to the GUI
    /// thread.
    pub(crate) fn bind(&self, buffer: CapturedBuffer) {
        let name = buffer.display_name.clone();
        let mut state = self.lock_state();
        let version = state.next_version;
        state.next_version += 1;

        match state
            .bindings
            .iter()
            .position(|b| b.buffer.display_name == name)
        {
            Some(index) => {
                let slot = &mut state.bindings[index];
                slot.buffer = buffer;
                slot.version = version;
            }
            None => state.bindings.push(Binding { buffer, version }),
        }
        if !state.pending_compose.contains(&name) {
            state.pending_compose.push(name.clone());
        }
        if state.selected.is_none() {
            state.selected = Some(name.clone());
        }
        tracing::debug!("window '{}': bound buffer '{}' (v{})", self.title, name, version);
    }

    /// Snapshot of displayed buffer names, insertion order preserved
    pub(crate) fn observed_names(&self) -> Vec<String> {
        self.lock_state()
            .bindings
            .iter()
            .map(|b| b.buffer.display_name.clone())
            .collect()
    }

    pub(crate) fn has_binding(&self, name: &str) -> bool {
        self.lock_state()
            .bindings
            .iter()
            .any(|b| b.buffer.display_name == name)
    }

    /// Metadata summary of a bound buffer, for status displays
    pub(crate) fn binding_summary(&self, name: &str) -> Option<String> {
        self.lock_state()
            .bindings
            .iter()
            .find(|b| b.buffer.display_name == name)
            .map(|b| b.buffer.summary())
    }

    /// Replace the symbol registry wholesale
    pub(crate) fn replace_symbols(&self, names: Vec<String>) {
        let mut state = self.lock_state();
        tracing::debug!(
            "window '{}': symbol registry replaced ({} names)",
            self.title,
            names.len()
        );
        state.symbols.replace(names);
    }

    pub(crate) fn symbol_names(&self) -> Vec<String> {
        self.lock_state().symbols.names().to_vec()
    }

    pub(crate) fn filter_symbols(&self, query: &str) -> Vec<String> {
        self.lock_state().symbols.filter(query)
    }

    pub(crate) fn selected(&self) -> Option<String> {
        self.lock_state().selected.clone()
    }

    pub(crate) fn select(&self, name: &str) {
        let mut state = self.lock_state();
        if state.bindings.iter().any(|b| b.buffer.display_name == name) {
            state.selected = Some(name.to_string());
        }
    }

    pub(crate) fn hint(&self) -> Option<String> {
        self.lock_state().hint.clone()
    }

    /// Post a user action for GUI-side dispatch. Thread-safe; surfaces call
    /// this from input handlers, hosts and tests may inject events the same
    /// way.
    pub(crate) fn push_event(&self, event: WindowEvent) {
        self.events
            .lock()
            .expect("window event queue poisoned")
            .push_back(event);
    }

    /// Drain all queued events. GUI thread only.
    pub(crate) fn take_events(&self) -> Vec<WindowEvent> {
        self.events
            .lock()
            .expect("window event queue poisoned")
            .drain(..)
            .collect()
    }

    /// GUI thread: service one symbol request from the search input.
    ///
    /// Already-displayed symbols are just re-selected; anything else goes
    /// through the plot callback. An unresolved symbol leaves the displayed
    /// set unchanged and records a hint for the surface.
    pub(crate) fn resolve_symbol(&self, name: &str) {
        if self.has_binding(name) {
            self.select(name);
            return;
        }

        // No state lock may be held here: the host callback is expected to
        // call plot_buffer for this window before returning.
        let resolved = {
            let mut callback = self.callback.lock().expect("plot callback poisoned");
            callback(name)
        };

        let mut state = self.lock_state();
        if resolved {
            state.hint = None;
        } else {
            let failure = PixWatchError::UnresolvedSymbol(name.to_string());
            tracing::warn!("window '{}': {}", self.title, failure);
            state.hint = Some(failure.to_string());
        }
    }

    /// GUI thread: compose every binding whose image is missing or stale.
    /// Called only once the window is ready.
    pub(crate) fn refresh_presented(&self) {
        let mut state = self.lock_state();
        let pending: Vec<String> = state.pending_compose.drain(..).collect();
        for name in pending {
            let Some(index) = state
                .bindings
                .iter()
                .position(|b| b.buffer.display_name == name)
            else {
                continue;
            };
            let version = state.bindings[index].version;
            if state
                .presented
                .get(&name)
                .is_some_and(|p| p.version == version)
            {
                continue;
            }
            let image = render::compose(&state.bindings[index].buffer);
            state.presented.insert(name, PresentedImage { version, image });
        }
    }

    /// Version of the composed image for `name`, if one exists
    pub(crate) fn presented_version(&self, name: &str) -> Option<u64> {
        self.lock_state().presented.get(name).map(|p| p.version)
    }

    /// Clone of the composed image for `name`, if one exists
    pub(crate) fn presented_image(&self, name: &str) -> Option<PresentedImage> {
        self.lock_state().presented.get(name).cloned()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, WindowState> {
        self.state.lock().expect("window state poisoned")
    }
}

impl std::fmt::Debug for WindowShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowShared")
            .field("title", &self.title)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BufferDescriptor, ElementType};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn window() -> WindowShared {
        WindowShared::new("test window".to_string(), Box::new(|_| false))
    }

    fn captured(name: &str, width: u32) -> CapturedBuffer {
        let data = vec![0u8; (width * 2) as usize];
        let desc = BufferDescriptor {
            data: &data,
            display_name: name,
            width,
            height: 2,
            channels: 1,
            element_type: ElementType::U8,
            row_stride: width,
            pixel_layout: "r",
        };
        desc.validate().unwrap();
        CapturedBuffer::capture(&desc)
    }

    #[test]
    fn test_bind_preserves_order_and_uniqueness() {
        let w = window();
        w.bind(captured("a", 2));
        w.bind(captured("b", 2));
        w.bind(captured("a", 4)); // replace in place
        assert_eq!(w.observed_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_rebind_bumps_version() {
        let w = window();
        w.bind(captured("a", 2));
        w.mark_ready();
        w.refresh_presented();
        let v1 = w.presented_version("a").unwrap();
        w.bind(captured("a", 4));
        w.refresh_presented();
        let v2 = w.presented_version("a").unwrap();
        assert!(v2 > v1);
        assert_eq!(w.presented_image("a").unwrap().image.width, 4);
    }

    #[test]
    fn test_mark_ready_flips_once() {
        let w = window();
        assert!(!w.is_ready());
        w.mark_ready();
        assert!(w.is_ready());
        assert_eq!(w.phase(), WindowPhase::Ready);
        w.mark_ready();
        assert_eq!(w.phase(), WindowPhase::Ready);
    }

    #[test]
    fn test_pending_compose_waits_for_refresh() {
        let w = window();
        w.bind(captured("early", 2));
        // bound immediately, composed lazily
        assert_eq!(w.observed_names(), vec!["early"]);
        assert!(w.presented_version("early").is_none());
        w.mark_ready();
        w.refresh_presented();
        assert!(w.presented_version("early").is_some());
    }

    #[test]
    fn test_resolve_symbol_skips_displayed_buffers() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let count = invocations.clone();
        let w = WindowShared::new(
            "t".to_string(),
            Box::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );
        w.bind(captured("img", 2));
        w.resolve_symbol("img");
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
        w.resolve_symbol("other");
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unresolved_symbol_sets_hint() {
        let w = window();
        w.resolve_symbol("ghost");
        assert!(w.hint().unwrap().contains("ghost"));
        assert!(w.observed_names().is_empty());
    }

    #[test]
    fn test_events_drain_in_order() {
        let w = window();
        w.push_event(WindowEvent::SymbolRequested("a".to_string()));
        w.push_event(WindowEvent::CloseRequested);
        let events = w.take_events();
        assert_eq!(
            events,
            vec![
                WindowEvent::SymbolRequested("a".to_string()),
                WindowEvent::CloseRequested
            ]
        );
        assert!(w.take_events().is_empty());
    }

    #[test]
    fn test_symbol_registry_replacement_is_wholesale() {
        let w = window();
        w.replace_symbols(vec!["foo".to_string(), "bar".to_string()]);
        assert_eq!(w.symbol_names(), vec!["foo", "bar"]);
        w.replace_symbols(Vec::new());
        assert!(w.symbol_names().is_empty());
    }

    #[test]
    fn test_symbol_filter_prefers_prefix_matches() {
        let mut registry = SymbolRegistry::default();
        registry.replace(vec![
            "image_a".to_string(),
            "raw_image".to_string(),
            "imu".to_string(),
            "depth".to_string(),
        ]);
        assert_eq!(registry.filter("im"), vec!["image_a", "imu", "raw_image"]);
        assert_eq!(registry.filter("IM"), vec!["image_a", "imu", "raw_image"]);
        assert_eq!(registry.filter(""), registry.names().to_vec());
        assert!(registry.filter("zzz").is_empty());
    }
}
