//! Pixel Watch - demo host
//!
//! Stands in for a debugger embedding the inspection window. The main thread
//! becomes the GUI thread: it creates a window, publishes the autocomplete
//! symbols and an initial buffer (both accepted before the window is ready
//! and applied once it is), then runs the viewer. Typing one of the
//! published symbol names into the window's search box routes back through
//! the plot callback, exactly as a debugger integration would resolve a
//! variable.

use pixwatch_rs::{AppConfig, Application, BufferDescriptor, ElementType, ViewerPreferences};
use std::sync::{Arc, OnceLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Symbols the demo host can resolve
const DEMO_SYMBOLS: [&str; 3] = ["gradient", "checkerboard", "stripes"];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pixwatch_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting Pixel Watch demo host");

    let prefs = ViewerPreferences::load_or_default();
    let app = Application::initialize_with(AppConfig {
        viewer: prefs,
        ..AppConfig::default()
    });

    // The callback needs its own window's handle, which only exists after
    // create_window returns; pass it through a OnceLock.
    let handle_cell = Arc::new(OnceLock::<pixwatch_rs::WindowHandler>::new());
    let callback_cell = handle_cell.clone();
    let window = app.create_window(move |symbol| {
        let Some(&window) = callback_cell.get() else {
            return false;
        };
        match demo_image(symbol) {
            Some(image) => window.plot_buffer(&image.descriptor()).is_ok(),
            None => false,
        }
    });
    handle_cell
        .set(window)
        .expect("window handle cell set twice");

    // Host setup: both calls are accepted while the window is still under
    // construction and take effect once it becomes ready. A debugger host
    // would typically issue these from its own thread after polling
    // `window.is_ready()`.
    window.set_available_symbols(DEMO_SYMBOLS);
    let gradient = demo_image("gradient").expect("demo gradient must resolve");
    window.plot_buffer(&gradient.descriptor())?;

    app.exec();
    app.cleanup();
    Ok(())
}

/// An owned demo image plus the metadata needed to describe it
struct DemoImage {
    name: &'static str,
    width: u32,
    height: u32,
    channels: u8,
    element_type: ElementType,
    pixel_layout: &'static str,
    data: Vec<u8>,
}

impl DemoImage {
    fn descriptor(&self) -> BufferDescriptor<'_> {
        BufferDescriptor {
            data: &self.data,
            display_name: self.name,
            width: self.width,
            height: self.height,
            channels: self.channels,
            element_type: self.element_type,
            row_stride: self.width,
            pixel_layout: self.pixel_layout,
        }
    }
}

/// Resolve a demo symbol to a synthetic image
fn demo_image(symbol: &str) -> Option<DemoImage> {
    match symbol {
        "gradient" => {
            let (width, height) = (256u32, 160u32);
            let mut data = Vec::with_capacity((width * height * 3) as usize);
            for y in 0..height {
                for x in 0..width {
                    data.push(x as u8);
                    data.push((y * 255 / height) as u8);
                    data.push(128);
                }
            }
            Some(DemoImage {
                name: "gradient",
                width,
                height,
                channels: 3,
                element_type: ElementType::U8,
                pixel_layout: "rgb",
                data,
            })
        }
        "checkerboard" => {
            let (width, height) = (128u32, 128u32);
            let mut data = Vec::with_capacity((width * height) as usize);
            for y in 0..height {
                for x in 0..width {
                    let on = ((x / 16) + (y / 16)) % 2 == 0;
                    data.push(if on { 230 } else { 25 });
                }
            }
            Some(DemoImage {
                name: "checkerboard",
                width,
                height,
                channels: 1,
                element_type: ElementType::U8,
                pixel_layout: "r",
                data,
            })
        }
        "stripes" => {
            let (width, height) = (256u32, 64u32);
            let mut data = Vec::with_capacity((width * height * 4) as usize);
            for _y in 0..height {
                for x in 0..width {
                    let v = (x % 32) as f32 / 31.0;
                    data.extend_from_slice(&v.to_le_bytes());
                }
            }
            Some(DemoImage {
                name: "stripes",
                width,
                height,
                channels: 1,
                element_type: ElementType::F32,
                pixel_layout: "r",
                data,
            })
        }
        _ => None,
    }
}
