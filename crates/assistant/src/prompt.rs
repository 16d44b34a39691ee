/// Sampling temperature for tour-guide answers.
pub const TEMPERATURE: f32 = 0.5;

/// Indonesian tour-guide prompt scoped to a single city.
///
/// Questions about any other city are to be politely redirected back to `city`.
pub fn tour_guide_prompt(city: &str, question: &str) -> String {
    format!(
        "Anda adalah pemandu wisata virtual yang berinteraksi dalam Bahasa Indonesia.\n\
         Anda bertanggung jawab penuh untuk menjawab pertanyaan tentang {city}.\n\
         Pertanyaan dari pengunjung adalah: \"{question}\".\n\
         \n\
         Terdapat BATASAN KERAS: JIKA PERTANYAAN MENGACU PADA KOTA LAIN selain {city},\n\
         MAKA JAWABLAH DENGAN SOPAN BAHWA FOKUS ANDA ADALAH {city} DAN MINTA PENGUNJUNG\n\
         UNTUK BERTANYA TENTANG {city} SAJA.\n\
         \n\
         Jawablah pertanyaan yang relevan dengan ringkas dan informatif, fokus pada budaya, sejarah, atau wisata kota tersebut.\n\
         Mulai jawaban Anda dengan sapaan singkat, misalnya: \"Tentu, mari kita bahas...\""
    )
}

#[cfg(test)]
mod tests {
    use super::tour_guide_prompt;

    #[test]
    fn prompt_scopes_to_city_and_quotes_question() {
        let prompt = tour_guide_prompt("Kota Bandung", "Apa makanan khasnya?");
        assert!(prompt.starts_with("Anda adalah pemandu wisata virtual"));
        assert!(prompt.contains("Pertanyaan dari pengunjung adalah: \"Apa makanan khasnya?\"."));
        assert!(prompt.contains("KOTA LAIN selain Kota Bandung,"));
        assert_eq!(prompt.matches("Kota Bandung").count(), 4);
        assert!(prompt.ends_with("\"Tentu, mari kita bahas...\""));
    }
}
