//! State of the voice assistant widget.
//!
//! The browser owns speech recognition and synthesis; this module decides what
//! the widget shows and says in response to their events.

use crate::client::FALLBACK_MESSAGE;

/// Recognition and synthesis language.
pub const SPEECH_LANG: &str = "id-ID";

pub const STATUS_IDLE: &str = "Tekan mikrofon untuk bertanya...";
pub const STATUS_UNSUPPORTED: &str = "Maaf, browser Anda tidak mendukung Speech Recognition API.";
pub const STATUS_START_FAILED: &str = "Terjadi kesalahan saat mencoba fitur suara.";
pub const STATUS_LISTENING: &str = "Mendengarkan... Silakan ajukan pertanyaan Anda.";
pub const STATUS_SENDING: &str = "Mengirim pertanyaan ke Pemandu AI...";
pub const STATUS_DONE: &str = "Interaksi selesai. Tekan mikrofon lagi untuk bertanya.";
pub const STATUS_FAILED: &str = "Terjadi kesalahan.";
pub const STATUS_STOPPED: &str = "Interaksi dihentikan.";

/// Speech synthesis as seen by the widget.
pub trait SpeechOutput {
    fn cancel(&mut self);
    fn speak(&mut self, text: &str, lang: &str);
}

/// Strips characters that read badly when spoken (`*` and `#`).
pub fn clean_markdown(text: &str) -> String {
    text.chars().filter(|c| *c != '*' && *c != '#').collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSession {
    city: String,
    status: String,
    transcript: String,
    response: String,
    listening: bool,
    in_flight: bool,
}

impl VoiceSession {
    pub fn new(city: &str) -> Self {
        Self {
            city: city.to_string(),
            status: STATUS_IDLE.to_string(),
            transcript: String::new(),
            response: String::new(),
            listening: false,
            in_flight: false,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Returns `true` if recognition should be started.
    pub fn start_listening(&mut self, recognition_available: bool) -> bool {
        if !recognition_available {
            self.status = STATUS_UNSUPPORTED.to_string();
            return false;
        }
        if self.listening || self.in_flight {
            return false;
        }
        self.listening = true;
        self.status = STATUS_LISTENING.to_string();
        true
    }

    /// The recognizer threw while starting.
    pub fn on_start_failed(&mut self) {
        self.listening = false;
        self.status = STATUS_START_FAILED.to_string();
    }

    /// Final recognition result. Returns the question to send, or `None` when
    /// it is blank or another question is still being answered.
    pub fn on_transcript(&mut self, text: &str) -> Option<String> {
        self.listening = false;
        let text = text.trim();
        if self.in_flight || text.is_empty() {
            return None;
        }
        self.transcript = text.to_string();
        Some(self.transcript.clone())
    }

    pub fn on_recognition_error(&mut self, code: &str) {
        self.listening = false;
        self.status = format!("Error: Gagal mengenali suara. {code}.");
    }

    pub fn on_recognition_end(&mut self) {
        self.listening = false;
    }

    pub fn begin_question(&mut self, speech: &mut impl SpeechOutput) {
        speech.cancel();
        self.listening = false;
        self.in_flight = true;
        self.response.clear();
        self.status = STATUS_SENDING.to_string();
    }

    pub fn on_attempt(&mut self, attempt: u32, max_attempts: u32) {
        self.status = format!("{STATUS_SENDING} (Percobaan {attempt}/{max_attempts})");
    }

    pub fn finish_answer(&mut self, answer: &str, speech: &mut impl SpeechOutput) {
        self.in_flight = false;
        self.response = answer.to_string();
        self.speak(answer, speech);
        self.status = STATUS_DONE.to_string();
    }

    pub fn finish_failure(&mut self, speech: &mut impl SpeechOutput) {
        self.in_flight = false;
        self.response = FALLBACK_MESSAGE.to_string();
        self.speak(FALLBACK_MESSAGE, speech);
        self.status = STATUS_FAILED.to_string();
    }

    /// Cancels whatever is being spoken, then speaks `text` in Indonesian.
    pub fn speak(&mut self, text: &str, speech: &mut impl SpeechOutput) {
        speech.cancel();
        speech.speak(&clean_markdown(text), SPEECH_LANG);
    }

    /// Stop button, and widget teardown.
    pub fn stop_speaking(&mut self, speech: &mut impl SpeechOutput) {
        speech.cancel();
        self.listening = false;
        self.status = STATUS_STOPPED.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::{
        STATUS_DONE, STATUS_FAILED, STATUS_LISTENING, STATUS_STOPPED, STATUS_UNSUPPORTED,
        SpeechOutput, VoiceSession, clean_markdown,
    };
    use crate::client::FALLBACK_MESSAGE;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    enum Call {
        Cancel,
        Speak(String, String),
    }

    #[derive(Default)]
    struct FakeSpeech {
        calls: Vec<Call>,
    }

    impl SpeechOutput for FakeSpeech {
        fn cancel(&mut self) {
            self.calls.push(Call::Cancel);
        }

        fn speak(&mut self, text: &str, lang: &str) {
            self.calls.push(Call::Speak(text.to_string(), lang.to_string()));
        }
    }

    #[test]
    fn markdown_markers_are_removed() {
        assert_eq!(clean_markdown("## Tari **Kecak**"), " Tari Kecak");
        assert_eq!(clean_markdown("tanpa format"), "tanpa format");
    }

    #[test]
    fn unsupported_browser_reports_status() {
        let mut session = VoiceSession::new("Kota Denpasar");
        assert!(!session.start_listening(false));
        assert_eq!(session.status(), STATUS_UNSUPPORTED);
        assert!(!session.is_listening());
    }

    #[test]
    fn answered_question_is_spoken_after_cancel() {
        let mut speech = FakeSpeech::default();
        let mut session = VoiceSession::new("Kota Denpasar");

        assert!(session.start_listening(true));
        assert_eq!(session.status(), STATUS_LISTENING);
        assert!(!session.start_listening(true));

        let question = session.on_transcript(" Apa itu Kecak? ").expect("question");
        assert_eq!(question, "Apa itu Kecak?");
        session.begin_question(&mut speech);
        session.on_attempt(2, 3);
        assert_eq!(
            session.status(),
            "Mengirim pertanyaan ke Pemandu AI... (Percobaan 2/3)"
        );

        session.finish_answer("**Kecak** adalah tarian", &mut speech);
        assert_eq!(session.response(), "**Kecak** adalah tarian");
        assert_eq!(session.status(), STATUS_DONE);
        assert_eq!(
            speech.calls,
            vec![
                Call::Cancel,
                Call::Cancel,
                Call::Speak("Kecak adalah tarian".into(), "id-ID".into()),
            ]
        );
    }

    #[test]
    fn one_question_at_a_time() {
        let mut speech = FakeSpeech::default();
        let mut session = VoiceSession::new("Bali");
        session.on_transcript("pertama").expect("first");
        session.begin_question(&mut speech);

        assert_eq!(session.on_transcript("kedua"), None);
        assert_eq!(session.transcript(), "pertama");
        assert!(session.is_in_flight());

        session.finish_failure(&mut speech);
        assert!(!session.is_in_flight());
        assert_eq!(session.response(), FALLBACK_MESSAGE);
        assert_eq!(session.status(), STATUS_FAILED);
        assert_eq!(session.on_transcript("ketiga").as_deref(), Some("ketiga"));
    }

    #[test]
    fn cannot_listen_while_answer_pending() {
        let mut speech = FakeSpeech::default();
        let mut session = VoiceSession::new("Bali");
        session.on_transcript("pertama").expect("first");
        session.begin_question(&mut speech);
        let sending = session.status().to_string();

        assert!(!session.start_listening(true));
        assert!(!session.is_listening());
        assert_eq!(session.status(), sending);

        session.finish_answer("Jawaban", &mut speech);
        assert!(session.start_listening(true));
        assert_eq!(session.status(), STATUS_LISTENING);
    }

    #[test]
    fn recognition_error_and_stop() {
        let mut speech = FakeSpeech::default();
        let mut session = VoiceSession::new("Bali");
        session.start_listening(true);
        session.on_recognition_error("no-speech");
        assert_eq!(session.status(), "Error: Gagal mengenali suara. no-speech.");
        assert!(!session.is_listening());

        session.start_listening(true);
        session.stop_speaking(&mut speech);
        assert_eq!(session.status(), STATUS_STOPPED);
        assert!(!session.is_listening());
        assert_eq!(speech.calls, vec![Call::Cancel]);
    }
}
