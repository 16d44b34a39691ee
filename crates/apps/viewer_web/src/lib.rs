use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use assistant::AssistantClient;
use assistant::voice::VoiceSession;
use formats::{CultureDataset, ProvinceCollection};
use layers::hologram::Hologram;
use layers::provinces::ProvinceLayer;
use scene::camera::{FIT_MARGIN, OrbitCamera};
use scene::selection::{Selection, SelectionChange};

mod overlay;
mod render;
mod speech;
mod transport;

use overlay::{OVERLAY_ID, OverlayAction};
use render::{
    WgpuContext, build_vertices, init_wgpu_from_canvas_id, render_frame, resize_wgpu,
    upload_geometry,
};
use speech::{BrowserSpeech, Recognizer, recognition_available};
use transport::{GlooTransport, JsSleeper};

pub const CANVAS_ID: &str = "budaya-canvas";

#[derive(Debug)]
pub struct ViewerState {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub wgpu: Option<WgpuContext>,
    pub camera: OrbitCamera,
    pub provinces: Option<ProvinceLayer>,
    pub culture: CultureDataset,
    pub selection: Selection,
    pub hologram: Option<Hologram>,
    pub voice: Option<VoiceSession>,
    speech: BrowserSpeech,
    recognizer: Option<Recognizer>,
    /// Province colours or meshes changed since the last upload.
    geometry_dirty: bool,
}

thread_local! {
    static STATE: RefCell<ViewerState> = RefCell::new(ViewerState {
        canvas_width: 1280.0,
        canvas_height: 720.0,
        wgpu: None,
        camera: OrbitCamera::default(),
        provinces: None,
        culture: CultureDataset::default(),
        selection: Selection::new(),
        hologram: None,
        voice: None,
        speech: BrowserSpeech::new(),
        recognizer: None,
        geometry_dirty: false,
    });
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(msg));
}

fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

fn render_scene() -> Result<(), JsValue> {
    let anchor_px = STATE.with(|state_ref| {
        let mut state = state_ref.borrow_mut();
        let s = &mut *state;

        if let (Some(ctx), Some(layer)) = (s.wgpu.as_mut(), s.provinces.as_ref()) {
            if s.geometry_dirty {
                let (vertices, indices) = build_vertices(&layer.draw_list(&s.selection));
                upload_geometry(ctx, &vertices, &indices);
                s.geometry_dirty = false;
            }
        }
        if let Some(ctx) = &s.wgpu {
            let view_proj = s.camera.view_proj(s.canvas_width, s.canvas_height);
            let _ = render_frame(ctx, view_proj);
        }

        s.selection
            .active()
            .and_then(|a| s.camera.project(a.anchor, s.canvas_width, s.canvas_height))
    });
    place_overlay(anchor_px);
    Ok(())
}

fn overlay_element() -> Option<web_sys::Element> {
    document()?.get_element_by_id(OVERLAY_ID)
}

fn place_overlay(anchor_px: Option<[f64; 2]>) {
    let Some(el) = overlay_element() else {
        return;
    };
    let open = STATE.with(|state| state.borrow().hologram.is_some());
    let style = match anchor_px {
        Some(px) if open => overlay::position_style(px),
        _ => "display:none;".to_string(),
    };
    let _ = el.set_attribute("style", &style);
}

/// Re-renders the overlay markup from the current hologram and voice state.
fn refresh_overlay() {
    let html = STATE.with(|state| {
        let s = state.borrow();
        s.hologram
            .as_ref()
            .map(|h| overlay::render(&h.view(), s.voice.as_ref()))
            .unwrap_or_default()
    });
    if let Some(el) = overlay_element() {
        el.set_inner_html(&html);
    }
}

fn mount_overlay() -> Result<(), JsValue> {
    let doc = document().ok_or_else(|| JsValue::from_str("document missing"))?;
    let el = match doc.get_element_by_id(OVERLAY_ID) {
        Some(el) => el,
        None => {
            let el = doc.create_element("div")?;
            el.set_id(OVERLAY_ID);
            doc.body()
                .ok_or_else(|| JsValue::from_str("body missing"))?
                .append_child(&el)?;
            el
        }
    };
    let _ = el.set_attribute("style", "display:none;");

    let on_click = Closure::<dyn FnMut(web_sys::Event)>::new(|event: web_sys::Event| {
        let Some(target) = event
            .target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        else {
            return;
        };
        let Ok(Some(button)) = target.closest("[data-action]") else {
            return;
        };
        let Some(name) = button.get_attribute("data-action") else {
            return;
        };
        let city = button.get_attribute("data-city");
        if let Some(action) = OverlayAction::parse(&name, city.as_deref()) {
            event.stop_propagation();
            apply_action(action);
        }
    });
    el.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    // The overlay lives as long as the page.
    on_click.forget();
    Ok(())
}

fn apply_action(action: OverlayAction) {
    match action {
        OverlayAction::Close => {
            close_overlay();
            return;
        }
        OverlayAction::Listen => {
            start_voice();
            return;
        }
        OverlayAction::Stop => stop_voice(),
        OverlayAction::ShowInfo => STATE.with(|state| {
            if let Some(h) = state.borrow_mut().hologram.as_mut() {
                h.show_info();
            }
        }),
        OverlayAction::ShowCities => STATE.with(|state| {
            if let Some(h) = state.borrow_mut().hologram.as_mut() {
                h.show_cities();
            }
        }),
        OverlayAction::SelectCity(city) => STATE.with(|state| {
            let mut s = state.borrow_mut();
            if s.hologram.as_mut().is_some_and(|h| h.select_city(&city)) {
                let voice = s
                    .hologram
                    .as_ref()
                    .and_then(|h| h.assistant_city())
                    .map(VoiceSession::new);
                s.voice = voice;
            }
        }),
        OverlayAction::CloseAssistant => {
            end_voice_session();
            STATE.with(|state| {
                if let Some(h) = state.borrow_mut().hologram.as_mut() {
                    h.close_assistant();
                }
            });
        }
    }
    refresh_overlay();
}

/// Stops speech and recognition, then drops the session.
fn end_voice_session() {
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        let s = &mut *state;
        if let Some(voice) = s.voice.as_mut() {
            voice.stop_speaking(&mut s.speech);
        }
        s.voice = None;
        s.recognizer = None;
    });
}

fn close_overlay() {
    end_voice_session();
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        let s = &mut *state;
        if s.selection.close() {
            if let Some(layer) = s.provinces.as_mut() {
                layer.sync_selection(&s.selection);
            }
            s.geometry_dirty = true;
        }
        s.hologram = None;
    });
    refresh_overlay();
    let _ = render_scene();
}

fn start_voice() {
    let available = recognition_available();
    let should_start = STATE.with(|state| {
        state
            .borrow_mut()
            .voice
            .as_mut()
            .is_some_and(|v| v.start_listening(available))
    });

    if should_start {
        match Recognizer::start(on_transcript, on_recognition_error, on_recognition_end) {
            Ok(recognizer) => STATE.with(|state| state.borrow_mut().recognizer = Some(recognizer)),
            Err(err) => {
                web_sys::console::warn_1(&err);
                STATE.with(|state| {
                    if let Some(v) = state.borrow_mut().voice.as_mut() {
                        v.on_start_failed();
                    }
                });
            }
        }
    }
    refresh_overlay();
}

fn stop_voice() {
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        let s = &mut *state;
        if let Some(voice) = s.voice.as_mut() {
            voice.stop_speaking(&mut s.speech);
        }
        if let Some(recognizer) = s.recognizer.as_ref() {
            recognizer.stop();
        }
    });
}

fn on_transcript(text: String) {
    let question = STATE.with(|state| {
        let mut state = state.borrow_mut();
        let s = &mut *state;
        let voice = s.voice.as_mut()?;
        let question = voice.on_transcript(&text)?;
        voice.begin_question(&mut s.speech);
        Some((voice.city().to_string(), question))
    });
    refresh_overlay();

    if let Some((city, question)) = question {
        spawn_local(ask_assistant(city, question));
    }
}

fn on_recognition_error(code: String) {
    warn(&format!("speech recognition error: {code}"));
    STATE.with(|state| {
        if let Some(v) = state.borrow_mut().voice.as_mut() {
            v.on_recognition_error(&code);
        }
    });
    refresh_overlay();
}

fn on_recognition_end() {
    STATE.with(|state| {
        if let Some(v) = state.borrow_mut().voice.as_mut() {
            v.on_recognition_end();
        }
    });
    refresh_overlay();
}

/// Answers land only in the session that asked; a closed widget drops them.
async fn ask_assistant(city: String, question: String) {
    let client = AssistantClient::new(GlooTransport::default(), JsSleeper);
    let result = client
        .ask(&city, &question, |attempt, max| {
            STATE.with(|state| {
                if let Some(v) = state.borrow_mut().voice.as_mut() {
                    if v.city() == city && v.is_in_flight() {
                        v.on_attempt(attempt, max);
                    }
                }
            });
            refresh_overlay();
        })
        .await;

    STATE.with(|state| {
        let mut state = state.borrow_mut();
        let s = &mut *state;
        let Some(voice) = s.voice.as_mut() else {
            return;
        };
        if voice.city() != city || !voice.is_in_flight() {
            return;
        }
        match &result {
            Ok(answer) => voice.finish_answer(answer, &mut s.speech),
            Err(_) => voice.finish_failure(&mut s.speech),
        }
    });
    refresh_overlay();
}

fn set_canvas_cursor(pointer: bool) {
    let Some(canvas) = document()
        .and_then(|d| d.get_element_by_id(CANVAS_ID))
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    else {
        return;
    };
    let cursor = if pointer { "pointer" } else { "auto" };
    let _ = canvas.style().set_property("cursor", cursor);
}

/// Frames every province, keeping the current view direction.
fn fit_camera(s: &mut ViewerState) {
    if let Some(layer) = &s.provinces {
        let aspect = if s.canvas_height <= 0.0 {
            1.0
        } else {
            s.canvas_width / s.canvas_height
        };
        s.camera.fit_bounds(&layer.scene_bounds(), aspect, FIT_MARGIN);
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    if let Err(err) = mount_overlay() {
        web_sys::console::warn_1(&err);
    }
    Ok(())
}

#[wasm_bindgen]
pub fn init_wgpu() {
    spawn_local(async move {
        if let Err(err) = init_wgpu_inner().await {
            log(&format!("wgpu init error: {:?}", err));
        }
    });
}

#[wasm_bindgen]
pub fn set_canvas_sizes(width: f64, height: f64) -> Result<(), JsValue> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.canvas_width = width;
        s.canvas_height = height;
        if let Some(ctx) = &mut s.wgpu {
            resize_wgpu(ctx, width as u32, height as u32);
        }
        fit_camera(&mut s);
    });
    render_scene()
}

#[wasm_bindgen]
pub fn camera_reset() -> Result<(), JsValue> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.camera = OrbitCamera::default();
        fit_camera(&mut s);
    });
    render_scene()
}

/// Orbit around the target. Call with pointer delta in pixels.
#[wasm_bindgen]
pub fn camera_orbit(delta_x_px: f64, delta_y_px: f64) -> Result<(), JsValue> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let h = s.canvas_height;
        s.camera.orbit(delta_x_px, delta_y_px, h);
    });
    render_scene()
}

#[wasm_bindgen]
pub fn camera_pan(delta_x_px: f64, delta_y_px: f64) -> Result<(), JsValue> {
    STATE.with(|state| state.borrow_mut().camera.pan(delta_x_px, delta_y_px));
    render_scene()
}

/// Call with wheel deltaY.
#[wasm_bindgen]
pub fn camera_zoom(wheel_delta_y: f64) -> Result<(), JsValue> {
    STATE.with(|state| state.borrow_mut().camera.zoom(wheel_delta_y));
    render_scene()
}

/// Updates hover highlight and cursor. Returns whether a province is under the pointer.
#[wasm_bindgen]
pub fn pointer_move(x_px: f64, y_px: f64) -> Result<bool, JsValue> {
    let (hit, changed) = STATE.with(|state| {
        let mut state = state.borrow_mut();
        let s = &mut *state;
        let hit = s.provinces.as_ref().and_then(|layer| {
            let ray = s
                .camera
                .screen_ray(x_px, y_px, s.canvas_width, s.canvas_height)?;
            layer.pick(ray)
        });
        let changed = s.selection.hover(hit.map(|h| h.entity));
        if changed {
            s.geometry_dirty = true;
        }
        (hit.is_some(), changed)
    });

    if changed {
        set_canvas_cursor(hit);
        render_scene()?;
    }
    Ok(hit)
}

#[wasm_bindgen]
pub fn pointer_leave() -> Result<(), JsValue> {
    let changed = STATE.with(|state| {
        let mut s = state.borrow_mut();
        let changed = s.selection.hover(None);
        if changed {
            s.geometry_dirty = true;
        }
        changed
    });
    if changed {
        set_canvas_cursor(false);
        render_scene()?;
    }
    Ok(())
}

/// Picks the province under the pointer and toggles it as the active one.
#[wasm_bindgen]
pub fn pointer_click(x_px: f64, y_px: f64) -> Result<(), JsValue> {
    let change = STATE.with(|state| {
        let mut state = state.borrow_mut();
        let s = &mut *state;
        let layer = s.provinces.as_mut()?;
        let ray = s
            .camera
            .screen_ray(x_px, y_px, s.canvas_width, s.canvas_height)?;
        let hit = layer.pick(ray)?;
        let change = layer.click(hit.entity, &mut s.selection)?;
        s.geometry_dirty = true;

        let name = layer.province(hit.entity).map(|p| p.name.clone());
        if let (SelectionChange::Activated(_), Some(name)) = (&change, &name) {
            log(&format!("province clicked: {name}"));
        }
        Some((change, name))
    });

    let Some((change, name)) = change else {
        return Ok(());
    };

    // Any province change tears down a running voice widget.
    end_voice_session();
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.hologram = match (&change, name) {
            (SelectionChange::Activated(_), Some(name)) => Some(Hologram::open(&name, &s.culture)),
            _ => None,
        };
    });
    refresh_overlay();
    render_scene()
}

/// Dispatches an overlay action by its `data-action` name.
#[wasm_bindgen]
pub fn overlay_action(action: &str, city: Option<String>) -> bool {
    match OverlayAction::parse(action, city.as_deref()) {
        Some(action) => {
            apply_action(action);
            true
        }
        None => false,
    }
}

#[wasm_bindgen]
pub fn voice_start() {
    start_voice();
}

#[wasm_bindgen]
pub fn voice_stop() {
    stop_voice();
    refresh_overlay();
}

#[wasm_bindgen]
pub fn load_datasets(geo_url: String, culture_url: String) {
    spawn_local(async move {
        let collection = match fetch_text(&geo_url)
            .await
            .and_then(|text| {
                ProvinceCollection::from_geojson_str(&text)
                    .map_err(|e| JsValue::from_str(&e.to_string()))
            }) {
            Ok(c) => c,
            Err(err) => {
                log(&format!("Failed to load provinces: {:?}", err));
                return;
            }
        };

        let culture = match fetch_text(&culture_url).await.and_then(|text| {
            CultureDataset::from_json_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
        }) {
            Ok(d) => d,
            Err(err) => {
                warn(&format!("Failed to load cultural data: {:?}", err));
                CultureDataset::default()
            }
        };

        let layer = ProvinceLayer::build(&collection);
        log(&format!(
            "loaded {} provinces, {} cultural records",
            layer.provinces().len(),
            culture.len()
        ));

        end_voice_session();
        STATE.with(|state| {
            let mut s = state.borrow_mut();
            s.provinces = Some(layer);
            s.culture = culture;
            s.selection = Selection::new();
            s.hologram = None;
            s.geometry_dirty = true;
            fit_camera(&mut s);
        });

        refresh_overlay();
        let _ = render_scene();
    });
}

async fn init_wgpu_inner() -> Result<(), JsValue> {
    let ctx = init_wgpu_from_canvas_id(CANVAS_ID).await?;

    STATE.with(|state| {
        let mut s = state.borrow_mut();
        s.wgpu = Some(ctx);
        s.geometry_dirty = true;
    });

    render_scene()
}

async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!(
            "{url} responded with {}",
            resp.status()
        )));
    }
    resp.text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
