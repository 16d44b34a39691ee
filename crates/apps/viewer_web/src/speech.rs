//! Web Speech API bindings for the voice widget.

use assistant::voice::{SPEECH_LANG, SpeechOutput};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// `window.speechSynthesis`.
#[derive(Debug, Default)]
pub struct BrowserSpeech {
    synth: Option<web_sys::SpeechSynthesis>,
}

impl BrowserSpeech {
    pub fn new() -> Self {
        Self {
            synth: web_sys::window().and_then(|w| w.speech_synthesis().ok()),
        }
    }
}

impl SpeechOutput for BrowserSpeech {
    fn cancel(&mut self) {
        if let Some(synth) = &self.synth {
            synth.cancel();
        }
    }

    fn speak(&mut self, text: &str, lang: &str) {
        let Some(synth) = &self.synth else {
            return;
        };
        match web_sys::SpeechSynthesisUtterance::new_with_text(text) {
            Ok(utterance) => {
                utterance.set_lang(lang);
                synth.speak(&utterance);
            }
            Err(err) => web_sys::console::warn_1(&err),
        }
    }
}

fn recognition_constructor() -> Option<Function> {
    let window = web_sys::window()?;
    ["SpeechRecognition", "webkitSpeechRecognition"]
        .iter()
        .find_map(|name| {
            Reflect::get(&window, &JsValue::from_str(name))
                .ok()?
                .dyn_into::<Function>()
                .ok()
        })
}

/// Whether the browser exposes (possibly prefixed) speech recognition.
pub fn recognition_available() -> bool {
    recognition_constructor().is_some()
}

fn call_method(target: &JsValue, name: &str) -> Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(name))?
        .dyn_into::<Function>()?
        .call0(target)
}

/// `event.results[0][0].transcript`
fn first_transcript(event: &JsValue) -> Option<String> {
    let results = Reflect::get(event, &JsValue::from_str("results")).ok()?;
    let result = Reflect::get_u32(&results, 0).ok()?;
    let alternative = Reflect::get_u32(&result, 0).ok()?;
    Reflect::get(&alternative, &JsValue::from_str("transcript"))
        .ok()?
        .as_string()
}

/// One running recognition session. Handlers are detached on drop.
pub struct Recognizer {
    handle: JsValue,
    _on_result: Closure<dyn FnMut(JsValue)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
    _on_end: Closure<dyn FnMut(JsValue)>,
}

impl Recognizer {
    /// Single final result, no interim results, Indonesian.
    pub fn start(
        mut on_result: impl FnMut(String) + 'static,
        mut on_error: impl FnMut(String) + 'static,
        mut on_end: impl FnMut() + 'static,
    ) -> Result<Self, JsValue> {
        let ctor = recognition_constructor()
            .ok_or_else(|| JsValue::from_str("speech recognition unavailable"))?;
        let handle = Reflect::construct(&ctor, &Array::new())?;
        Reflect::set(&handle, &"lang".into(), &SPEECH_LANG.into())?;
        Reflect::set(&handle, &"interimResults".into(), &JsValue::FALSE)?;
        Reflect::set(&handle, &"maxAlternatives".into(), &JsValue::from_f64(1.0))?;

        let result_cb = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            if let Some(text) = first_transcript(&event) {
                on_result(text);
            }
        });
        let error_cb = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            let code = Reflect::get(&event, &JsValue::from_str("error"))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_else(|| "unknown".to_string());
            on_error(code);
        });
        let end_cb = Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| on_end());

        Reflect::set(&handle, &"onresult".into(), result_cb.as_ref())?;
        Reflect::set(&handle, &"onerror".into(), error_cb.as_ref())?;
        Reflect::set(&handle, &"onend".into(), end_cb.as_ref())?;
        call_method(&handle, "start")?;

        Ok(Self {
            handle,
            _on_result: result_cb,
            _on_error: error_cb,
            _on_end: end_cb,
        })
    }

    pub fn stop(&self) {
        let _ = call_method(&self.handle, "stop");
    }
}

impl Drop for Recognizer {
    fn drop(&mut self) {
        for name in ["onresult", "onerror", "onend"] {
            let _ = Reflect::set(&self.handle, &name.into(), &JsValue::NULL);
        }
        let _ = call_method(&self.handle, "abort");
    }
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer").finish_non_exhaustive()
    }
}
