//! HTML for the province panel and the voice widget.
//!
//! Buttons carry `data-action` (and `data-city` for city rows); a single
//! delegated click listener on the overlay root turns them into
//! [`OverlayAction`]s.

use std::fmt::Write;

use assistant::voice::VoiceSession;
use layers::hologram::{
    CITY_LIST_HEADING, HologramView, INFO_HEADING, NO_CITIES_MESSAGE, NO_INFO_MESSAGE,
    NOT_FOUND_TITLE, SHOW_CITIES_LABEL, SHOW_INFO_LABEL, not_found_message,
};

pub const OVERLAY_ID: &str = "budaya-overlay";

pub const ASSISTANT_TITLE_PREFIX: &str = "Pemandu AI: ";
pub const LISTEN_LABEL: &str = "\u{1F3A4} Klik dan Bicara";
pub const LISTENING_LABEL: &str = "\u{1F534} Bicara Sekarang...";
pub const STOP_LABEL: &str = "\u{23F9}\u{FE0F} Stop";
pub const USER_HEADING: &str = "Anda:";
pub const ANSWER_HEADING: &str = "Jawaban AI:";
pub const BACK_TO_CITIES_LABEL: &str = "\u{2190} Kembali ke Daftar Kota";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayAction {
    Close,
    ShowInfo,
    ShowCities,
    SelectCity(String),
    CloseAssistant,
    Listen,
    Stop,
}

impl OverlayAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayAction::Close => "close",
            OverlayAction::ShowInfo => "show-info",
            OverlayAction::ShowCities => "show-cities",
            OverlayAction::SelectCity(_) => "select-city",
            OverlayAction::CloseAssistant => "close-assistant",
            OverlayAction::Listen => "listen",
            OverlayAction::Stop => "stop",
        }
    }

    /// Decodes the `data-action` / `data-city` pair of a clicked element.
    pub fn parse(action: &str, city: Option<&str>) -> Option<Self> {
        Some(match action {
            "close" => OverlayAction::Close,
            "show-info" => OverlayAction::ShowInfo,
            "show-cities" => OverlayAction::ShowCities,
            "select-city" => OverlayAction::SelectCity(city?.to_string()),
            "close-assistant" => OverlayAction::CloseAssistant,
            "listen" => OverlayAction::Listen,
            "stop" => OverlayAction::Stop,
            _ => return None,
        })
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn header(out: &mut String, title: &str, close: OverlayAction) {
    let _ = write!(
        out,
        r#"<div class="hologram-header"><h2>{}</h2><button class="hologram-close" data-action="{}">&times;</button></div>"#,
        escape_html(title),
        close.as_str()
    );
}

fn link_button(out: &mut String, label: &str, action: OverlayAction) {
    let _ = write!(
        out,
        r#"<button class="hologram-link" data-action="{}">{}</button>"#,
        action.as_str(),
        escape_html(label)
    );
}

fn note(out: &mut String, text: &str) {
    let _ = write!(out, r#"<p class="hologram-note">{}</p>"#, escape_html(text));
}

/// Panel markup for `view`. The assistant view needs the live voice session.
pub fn render(view: &HologramView<'_>, voice: Option<&VoiceSession>) -> String {
    let mut out = String::new();

    if let HologramView::Assistant { city, .. } = view {
        out.push_str(r#"<div class="hologram-assistant-container">"#);
        header(
            &mut out,
            &format!("{ASSISTANT_TITLE_PREFIX}{city}"),
            OverlayAction::CloseAssistant,
        );
        if let Some(session) = voice {
            render_voice(&mut out, session);
        }
        link_button(&mut out, BACK_TO_CITIES_LABEL, OverlayAction::CloseAssistant);
        out.push_str("</div>");
        return out;
    }

    out.push_str(r#"<div class="hologram-container">"#);
    match view {
        HologramView::NotFound { name, key } => {
            header(&mut out, NOT_FOUND_TITLE, OverlayAction::Close);
            let _ = write!(out, "<p>{}</p>", escape_html(&not_found_message(name, key)));
        }
        HologramView::CityList { title, cities } => {
            header(&mut out, title, OverlayAction::Close);
            let _ = write!(out, "<h3>{}</h3><ul class=\"hologram-cities\">", CITY_LIST_HEADING);
            for city in cities {
                let city = escape_html(city);
                let _ = write!(
                    out,
                    r#"<li data-action="select-city" data-city="{city}">{city}</li>"#
                );
            }
            out.push_str("</ul>");
            link_button(&mut out, SHOW_INFO_LABEL, OverlayAction::ShowInfo);
        }
        HologramView::NoCities { title } => {
            header(&mut out, title, OverlayAction::Close);
            note(&mut out, NO_CITIES_MESSAGE);
            link_button(&mut out, SHOW_INFO_LABEL, OverlayAction::ShowInfo);
        }
        HologramView::CulturalInfo { title, entries } => {
            header(&mut out, title, OverlayAction::Close);
            let _ = write!(out, "<h3>{}</h3><ul class=\"hologram-info\">", INFO_HEADING);
            for (key, value) in entries {
                let _ = write!(
                    out,
                    "<li><strong>{}:</strong> {}</li>",
                    escape_html(key),
                    escape_html(value)
                );
            }
            out.push_str("</ul>");
            link_button(&mut out, SHOW_CITIES_LABEL, OverlayAction::ShowCities);
        }
        HologramView::NoInfo { title } => {
            header(&mut out, title, OverlayAction::Close);
            note(&mut out, NO_INFO_MESSAGE);
            link_button(&mut out, SHOW_CITIES_LABEL, OverlayAction::ShowCities);
        }
        HologramView::Assistant { .. } => {}
    }
    out.push_str("</div>");
    out
}

fn render_voice(out: &mut String, session: &VoiceSession) {
    let (listen_label, listen_class, disabled) = if session.is_listening() {
        (LISTENING_LABEL, "voice-listen is-listening", " disabled")
    } else if session.is_in_flight() {
        (LISTEN_LABEL, "voice-listen", " disabled")
    } else {
        (LISTEN_LABEL, "voice-listen", "")
    };
    let _ = write!(
        out,
        r#"<div class="voice-controls"><button class="{listen_class}" data-action="listen"{disabled}>{listen_label}</button><button class="voice-stop" data-action="stop">{STOP_LABEL}</button></div>"#
    );
    let _ = write!(
        out,
        r#"<p class="voice-status">{}</p>"#,
        escape_html(session.status())
    );
    if !session.transcript().is_empty() {
        let _ = write!(
            out,
            r#"<div class="voice-bubble"><p class="voice-who">{USER_HEADING}</p><p>{}</p></div>"#,
            escape_html(session.transcript())
        );
    }
    if !session.response().is_empty() {
        let _ = write!(
            out,
            r#"<div class="voice-bubble voice-answer"><p class="voice-who">{ANSWER_HEADING}</p><p>{}</p></div>"#,
            escape_html(session.response())
        );
    }
}

/// CSS `left`/`top` that centre the panel on the projected anchor.
pub fn position_style(screen: [f64; 2]) -> String {
    format!(
        "position:absolute;left:{:.1}px;top:{:.1}px;transform:translate(-50%,-50%);",
        screen[0], screen[1]
    )
}

#[cfg(test)]
mod tests {
    use super::{OverlayAction, escape_html, position_style, render};
    use assistant::voice::{STATUS_IDLE, VoiceSession};
    use layers::hologram::HologramView;
    use pretty_assertions::assert_eq;

    #[test]
    fn actions_round_trip_through_data_attributes() {
        for action in [
            OverlayAction::Close,
            OverlayAction::ShowInfo,
            OverlayAction::ShowCities,
            OverlayAction::CloseAssistant,
            OverlayAction::Listen,
            OverlayAction::Stop,
        ] {
            assert_eq!(OverlayAction::parse(action.as_str(), None), Some(action));
        }
        assert_eq!(
            OverlayAction::parse("select-city", Some("Kota Denpasar")),
            Some(OverlayAction::SelectCity("Kota Denpasar".into()))
        );
        assert_eq!(OverlayAction::parse("select-city", None), None);
        assert_eq!(OverlayAction::parse("dance", None), None);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tari" & 'Kecak'</b>"#),
            "&lt;b&gt;&quot;Tari&quot; &amp; &#39;Kecak&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn not_found_names_the_key() {
        let html = render(
            &HologramView::NotFound {
                name: "Papua Selatan",
                key: "PapuaSelatan",
            },
            None,
        );
        assert!(html.contains("Data Tidak Ditemukan"));
        assert!(html.contains("Provinsi Papua Selatan (Key: PapuaSelatan)"));
        assert!(html.contains(r#"data-action="close""#));
    }

    #[test]
    fn city_rows_are_selectable() {
        let html = render(
            &HologramView::CityList {
                title: "Bali",
                cities: vec!["Kota Denpasar", "Kabupaten <Badung>"],
            },
            None,
        );
        assert!(html.contains(r#"data-action="select-city" data-city="Kota Denpasar""#));
        assert!(html.contains("Kabupaten &lt;Badung&gt;"));
        assert!(html.contains(r#"data-action="show-info""#));
    }

    #[test]
    fn info_entries_render_as_list() {
        let html = render(
            &HologramView::CulturalInfo {
                title: "Bali",
                entries: vec![("Tarian", "Kecak, Pendet".to_string())],
            },
            None,
        );
        assert!(html.contains("<li><strong>Tarian:</strong> Kecak, Pendet</li>"));
        assert!(html.contains(r#"data-action="show-cities""#));
    }

    #[test]
    fn assistant_shows_voice_state() {
        let mut session = VoiceSession::new("Kota Denpasar");
        let view = HologramView::Assistant {
            title: "Bali",
            city: "Kota Denpasar",
        };

        let idle = render(&view, Some(&session));
        assert!(idle.contains("Pemandu AI: Kota Denpasar"));
        assert!(idle.contains(STATUS_IDLE));
        assert!(!idle.contains("Anda:"));

        session.start_listening(true);
        let listening = render(&view, Some(&session));
        assert!(listening.contains(r#"data-action="listen" disabled"#));

        session.on_transcript("Apa makanan khas?");
        let asked = render(&view, Some(&session));
        assert!(asked.contains("Apa makanan khas?"));
        assert!(asked.contains(r#"data-action="close-assistant""#));
    }

    #[test]
    fn position_centres_on_anchor() {
        assert_eq!(
            position_style([120.0, 48.04]),
            "position:absolute;left:120.0px;top:48.0px;transform:translate(-50%,-50%);"
        );
    }
}
