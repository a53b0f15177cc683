//! Window handles and the application-owned window table
//!
//! Handles are index/generation pairs into the [`Application`]'s window table
//! rather than shared-ownership pointers: a destroyed window bumps its slot's
//! generation, so any further use of the old handle is detected and treated
//! as the contract violation it is (a panic, not an error value).
//!
//! The data-plane methods on [`WindowHandler`] (`plot_buffer`,
//! `set_available_symbols`, `observed_buffers`, `is_ready`) are callable from
//! any caller thread once the handle exists; window *lifecycle* stays on the
//! GUI thread via [`Application`].
//!
//! [`Application`]: crate::app::Application

use crate::app;
use crate::error::Result;
use crate::types::{BufferDescriptor, CapturedBuffer};
use crate::window::{WindowEvent, WindowShared};
use std::fmt;
use std::sync::Arc;

/// Opaque identity of one window: slot index + generation.
///
/// `Copy + Send`, safe to hand to caller threads. All methods panic if the
/// handle is used after `destroy_window`, or when no application is live.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandler {
    slot: u32,
    generation: u32,
}

impl WindowHandler {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot as usize
    }

    /// Non-blocking readiness poll.
    ///
    /// Returns `false` until the GUI thread has finished constructing the
    /// window's surface, which happens without further caller action once
    /// `exec` is running. Safe to poll from caller threads to decide when to
    /// start pushing buffers.
    pub fn is_ready(&self) -> bool {
        self.resolve().is_ready()
    }

    /// Validate `descriptor`, copy its pixel data, and bind it under its
    /// display name, replacing any prior binding of that name.
    ///
    /// Returns once the data needed for rendering has been captured; the
    /// caller may free or reuse its buffer memory immediately afterwards.
    /// On a validation failure the displayed set is unchanged.
    pub fn plot_buffer(&self, descriptor: &BufferDescriptor<'_>) -> Result<()> {
        descriptor.validate()?;
        let shared = app::current();
        let window = shared.resolve(*self);
        tracing::debug!(
            "plot_buffer: '{}' {}x{} into {:?}",
            descriptor.display_name,
            descriptor.width,
            descriptor.height,
            self
        );
        window.bind(CapturedBuffer::capture(descriptor));
        shared.wake();
        Ok(())
    }

    /// Snapshot of the names of all buffers currently displayed, in insertion
    /// order, each name exactly once.
    pub fn observed_buffers(&self) -> Vec<String> {
        self.resolve().observed_names()
    }

    /// Replace the autocomplete symbol registry wholesale. An empty
    /// collection clears it.
    pub fn set_available_symbols<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let shared = app::current();
        shared.resolve(*self).replace_symbols(names);
        shared.wake();
    }

    /// Current autocomplete symbol names, in registry order.
    pub fn available_symbols(&self) -> Vec<String> {
        self.resolve().symbol_names()
    }

    /// Inject a plot request, as if the user had submitted `name` in this
    /// window's symbol search input. The request is serviced on the GUI
    /// thread: already-displayed names are re-selected, anything else goes
    /// through the window's plot callback.
    pub fn request_symbol(&self, name: impl Into<String>) {
        let shared = app::current();
        shared
            .resolve(*self)
            .push_event(WindowEvent::SymbolRequested(name.into()));
        shared.wake();
    }

    /// Inject a close request, as if the user had closed the window. The
    /// window is destroyed on the GUI thread at the next dispatch.
    pub fn request_close(&self) {
        let shared = app::current();
        shared.resolve(*self).push_event(WindowEvent::CloseRequested);
        shared.wake();
    }

    fn resolve(&self) -> Arc<WindowShared> {
        app::current().resolve(*self)
    }
}

impl fmt::Debug for WindowHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowHandler(slot={}, gen={})", self.slot, self.generation)
    }
}

/// One slot of the window table
struct TableSlot {
    generation: u32,
    occupant: Option<Arc<WindowShared>>,
}

/// Application-owned table of live windows.
///
/// Slots are reused after destruction with a bumped generation, so stale
/// handles can never alias a newer window.
pub(crate) struct WindowTable {
    slots: Vec<TableSlot>,
}

impl WindowTable {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub(crate) fn insert(&mut self, window: Arc<WindowShared>) -> WindowHandler {
        if let Some(index) = self.slots.iter().position(|s| s.occupant.is_none()) {
            let slot = &mut self.slots[index];
            slot.occupant = Some(window);
            return WindowHandler::new(index as u32, slot.generation);
        }
        self.slots.push(TableSlot {
            generation: 0,
            occupant: Some(window),
        });
        WindowHandler::new(self.slots.len() as u32 - 1, 0)
    }

    pub(crate) fn get(&self, handle: WindowHandler) -> Option<Arc<WindowShared>> {
        self.slots
            .get(handle.slot())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.occupant.clone())
    }

    /// Remove a window, invalidating its handle by bumping the slot
    /// generation.
    pub(crate) fn remove(&mut self, handle: WindowHandler) -> Option<Arc<WindowShared>> {
        let slot = self.slots.get_mut(handle.slot())?;
        if slot.generation != handle.generation {
            return None;
        }
        let window = slot.occupant.take()?;
        slot.generation += 1;
        Some(window)
    }

    /// All live windows with their handles, in slot order
    pub(crate) fn live(&self) -> Vec<(WindowHandler, Arc<WindowShared>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.occupant
                    .clone()
                    .map(|w| (WindowHandler::new(index as u32, slot.generation), w))
            })
            .collect()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.occupant.is_some()).count()
    }

    /// Take every live window out of the table, bumping generations
    pub(crate) fn drain_live(&mut self) -> Vec<Arc<WindowShared>> {
        let mut drained = Vec::new();
        for slot in &mut self.slots {
            if let Some(window) = slot.occupant.take() {
                slot.generation += 1;
                drained.push(window);
            }
        }
        drained
    }
}
