//! # Pixel Watch: embeddable image-inspection window
//!
//! An image-inspection window a host debugger process embeds to visualize
//! in-memory pixel buffers by name, on demand. The crate owns the hard part
//! of that arrangement: establishing a GUI-owning thread, tracking window
//! lifecycles, and handing externally-owned buffer memory across the
//! caller/GUI thread boundary without races or dangling references.
//!
//! ## Architecture
//!
//! - **Application**: the process-wide GUI context. The thread that calls
//!   [`Application::initialize`] becomes the GUI thread; `Application` is
//!   `!Send`, pinning all window lifecycle calls there at compile time.
//! - **Windows**: generation-checked [`WindowHandler`]s into an
//!   application-owned table. Handles are `Copy + Send`; caller threads use
//!   them to push buffers and symbols once a window reports ready.
//! - **Buffer handoff**: a [`BufferDescriptor`] borrows caller-owned pixel
//!   memory for exactly one `plot_buffer` call; the window copies what it
//!   needs before returning.
//! - **Surfaces**: the GUI loop drives either the native eframe/egui viewer
//!   or a headless backend with identical dispatch semantics.
//! - **Communication**: a crossbeam wake channel plus per-window mutexes
//!   serialize caller-thread updates against GUI-thread rendering;
//!   [`terminate`] is an atomic flag usable from any thread.
//!
//! ## Example
//!
//! ```ignore
//! use pixwatch_rs::{Application, BufferDescriptor, ElementType};
//!
//! // On the thread that will own the GUI:
//! let app = Application::initialize();
//! let window = app.create_window(|symbol| {
//!     // resolve `symbol` against the debuggee and plot it, or fail
//!     false
//! });
//!
//! // From the host's own thread, once `window.is_ready()`:
//! //   window.set_available_symbols(["frame", "mask"]);
//! //   window.plot_buffer(&descriptor)?;
//!
//! app.exec(); // blocks until all windows close or terminate() is called
//! app.cleanup();
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod handle;
pub mod render;
pub mod types;
pub mod window;

mod viewer;

// Re-export commonly used types
pub use app::{terminate, Application};
pub use config::{AppConfig, SurfaceBackend, ViewerPreferences};
pub use error::{PixWatchError, Result};
pub use handle::WindowHandler;
pub use render::RgbaImage;
pub use types::{BufferDescriptor, CapturedBuffer, ElementType};
pub use window::SymbolRegistry;
