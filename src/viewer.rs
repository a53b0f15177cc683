//! Native viewer surface, built on eframe/egui
//!
//! One native viewport hosts every open inspection window as a floating
//! egui window: the symbol search input with autocomplete suggestions, the
//! list of observed buffers, and the composed image of the selected buffer.
//!
//! Each frame performs the same dispatch pass the headless loop does, so the
//! window state machine behaves identically under both backends. Composed
//! images are uploaded as egui textures keyed by window handle and buffer
//! name, re-uploaded only when the binding version changes.
//!
//! Platform note: eframe runs its event loop on the calling thread, which on
//! most platforms must be the process main thread; hosts using the native
//! backend should initialize and `exec` there.

use crate::app::AppShared;
use crate::config::ViewerPreferences;
use crate::error::{PixWatchError, Result};
use crate::handle::WindowHandler;
use crate::render::RgbaImage;
use crate::window::{WindowEvent, WindowShared};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Run the native viewer until all windows close or termination is requested
pub(crate) fn run(shared: Arc<AppShared>) -> Result<()> {
    let prefs = shared.config.viewer.clone();
    let title = shared.config.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([prefs.window_width, prefs.window_height])
            .with_title(title.clone()),
        ..Default::default()
    };

    let app_shared = shared.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(if prefs.dark_mode {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            });
            let repaint_ctx = cc.egui_ctx.clone();
            app_shared.set_repaint_hook(Some(Box::new(move || repaint_ctx.request_repaint())));
            Ok(Box::new(ViewerApp::new(app_shared.clone())))
        }),
    )
    .map_err(|e| PixWatchError::Surface(e.to_string()))
}

/// A GPU texture for one (window, buffer) pair, tagged with the binding
/// version it was uploaded from
struct TextureSlot {
    version: u64,
    texture: egui::TextureHandle,
}

#[derive(Default)]
struct PerWindowUi {
    search: String,
}

struct ViewerApp {
    shared: Arc<AppShared>,
    textures: HashMap<(WindowHandler, String), TextureSlot>,
    ui_state: HashMap<WindowHandler, PerWindowUi>,
}

impl ViewerApp {
    fn new(shared: Arc<AppShared>) -> Self {
        Self {
            shared,
            textures: HashMap::new(),
            ui_state: HashMap::new(),
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.shared.is_terminated() {
            self.shared.close_all();
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        if self.shared.dispatch() == 0 {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        let live = self.shared.live_windows();
        let live_handles: HashSet<WindowHandler> = live.iter().map(|(h, _)| *h).collect();
        self.textures.retain(|(h, _), _| live_handles.contains(h));
        self.ui_state.retain(|h, _| live_handles.contains(h));

        for (handle, window) in &live {
            let state = self.ui_state.entry(*handle).or_default();
            let textures = &mut self.textures;
            let prefs = &self.shared.config.viewer;

            let mut open = true;
            egui::Window::new(window.title())
                .id(egui::Id::new(*handle))
                .open(&mut open)
                .default_size([480.0, 400.0])
                .show(ctx, |ui| {
                    window_contents(ui, ctx, *handle, window, state, textures, prefs);
                });
            if !open {
                window.push_event(WindowEvent::CloseRequested);
            }
        }

        ctx.request_repaint_after(self.shared.config.tick);
    }
}

fn window_contents(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    handle: WindowHandler,
    window: &WindowShared,
    state: &mut PerWindowUi,
    textures: &mut HashMap<(WindowHandler, String), TextureSlot>,
    prefs: &ViewerPreferences,
) {
    let response = ui.add(
        egui::TextEdit::singleline(&mut state.search)
            .hint_text("plot symbol by name...")
            .desired_width(f32::INFINITY),
    );
    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
    if submitted {
        let query = state.search.trim().to_string();
        if !query.is_empty() {
            window.push_event(WindowEvent::SymbolRequested(query));
            state.search.clear();
        }
    } else if response.has_focus() && !state.search.is_empty() {
        for suggestion in window
            .filter_symbols(&state.search)
            .into_iter()
            .take(prefs.max_suggestions)
        {
            if ui.selectable_label(false, suggestion.as_str()).clicked() {
                window.push_event(WindowEvent::SymbolRequested(suggestion));
                state.search.clear();
                break;
            }
        }
    }

    if let Some(hint) = window.hint() {
        ui.colored_label(egui::Color32::YELLOW, hint);
    }

    ui.separator();

    let observed = window.observed_names();
    if observed.is_empty() {
        ui.weak("no buffers plotted yet");
        return;
    }

    let selected = window.selected();
    ui.horizontal_wrapped(|ui| {
        for name in &observed {
            let is_selected = selected.as_deref() == Some(name.as_str());
            if ui.selectable_label(is_selected, name.as_str()).clicked() {
                window.select(name);
            }
        }
    });

    let Some(name) = window.selected() else {
        return;
    };

    let key = (handle, name.clone());
    let stale = match (textures.get(&key), window.presented_version(&name)) {
        (Some(slot), Some(version)) => slot.version != version,
        (None, Some(_)) => true,
        // not composed yet (window still warming up); keep whatever we have
        _ => false,
    };
    if stale {
        if let Some(presented) = window.presented_image(&name) {
            let image = color_image(&presented.image);
            match textures.get_mut(&key) {
                Some(slot) => {
                    slot.texture.set(image, egui::TextureOptions::NEAREST);
                    slot.version = presented.version;
                }
                None => {
                    let texture = ctx.load_texture(
                        format!("{handle:?}/{name}"),
                        image,
                        egui::TextureOptions::NEAREST,
                    );
                    textures.insert(
                        key.clone(),
                        TextureSlot {
                            version: presented.version,
                            texture,
                        },
                    );
                }
            }
        }
    }

    if let Some(slot) = textures.get(&key) {
        ui.image(&slot.texture);
        if let Some(summary) = window.binding_summary(&name) {
            ui.weak(summary);
        }
    }
}

fn color_image(image: &RgbaImage) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(image.size(), &image.pixels)
}
