use formats::culture::{CultureDataset, CulturalRecord};
use formats::key::province_key;

pub const NOT_FOUND_TITLE: &str = "Data Tidak Ditemukan";
pub const CITY_LIST_HEADING: &str = "Pilih Kota/Kabupaten";
pub const NO_CITIES_MESSAGE: &str = "Daftar kota belum tersedia.";
pub const INFO_HEADING: &str = "Informasi Budaya";
pub const NO_INFO_MESSAGE: &str = "Informasi budaya tidak tersedia.";
pub const SHOW_INFO_LABEL: &str = "\u{2190} Lihat Info Budaya Provinsi";
pub const SHOW_CITIES_LABEL: &str = "\u{2190} Lihat Daftar Kota";

/// Body text of the panel shown when a province has no cultural record.
pub fn not_found_message(name: &str, key: &str) -> String {
    format!("Provinsi {name} (Key: {key}) belum memiliki data lengkap di budaya.json.")
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HologramMode {
    CityList,
    CulturalInfo,
    Assistant,
}

/// What the overlay panel should render right now.
#[derive(Debug, Clone, PartialEq)]
pub enum HologramView<'a> {
    NotFound { name: &'a str, key: &'a str },
    CityList { title: &'a str, cities: Vec<&'a str> },
    NoCities { title: &'a str },
    CulturalInfo { title: &'a str, entries: Vec<(&'a str, String)> },
    NoInfo { title: &'a str },
    Assistant { title: &'a str, city: &'a str },
}

/// Info panel attached to the active province.
#[derive(Debug, Clone, PartialEq)]
pub struct Hologram {
    province_name: String,
    key: String,
    record: Option<CulturalRecord>,
    mode: HologramMode,
    selected_city: Option<String>,
}

impl Hologram {
    /// Opens on the city list.
    pub fn open(province_name: &str, dataset: &CultureDataset) -> Self {
        Self {
            province_name: province_name.to_string(),
            key: province_key(province_name),
            record: dataset.lookup(province_name).cloned(),
            mode: HologramMode::CityList,
            selected_city: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> HologramMode {
        self.mode
    }

    /// Record display name, falling back to the map's province name.
    pub fn title(&self) -> &str {
        match &self.record {
            Some(r) if !r.name.is_empty() => &r.name,
            _ => &self.province_name,
        }
    }

    pub fn view(&self) -> HologramView<'_> {
        let Some(record) = &self.record else {
            return HologramView::NotFound {
                name: &self.province_name,
                key: &self.key,
            };
        };
        let title = self.title();

        match self.mode {
            HologramMode::CityList if record.cities.is_empty() => HologramView::NoCities { title },
            HologramMode::CityList => HologramView::CityList {
                title,
                cities: record.cities.iter().map(|c| c.name.as_str()).collect(),
            },
            HologramMode::CulturalInfo => {
                let entries: Vec<(&str, String)> = record
                    .info_entries()
                    .map(|(k, v)| (k, v.to_string()))
                    .collect();
                if entries.is_empty() {
                    HologramView::NoInfo { title }
                } else {
                    HologramView::CulturalInfo { title, entries }
                }
            }
            HologramMode::Assistant => HologramView::Assistant {
                title,
                city: self.assistant_city().unwrap_or(title),
            },
        }
    }

    /// City the assistant talks about: the selected city, else the record name.
    pub fn assistant_city(&self) -> Option<&str> {
        if self.mode != HologramMode::Assistant {
            return None;
        }
        self.selected_city.as_deref().or(Some(self.title()))
    }

    /// Transitions below return `false` when nothing changed (or no record).
    pub fn show_info(&mut self) -> bool {
        self.set_mode(HologramMode::CulturalInfo)
    }

    pub fn show_cities(&mut self) -> bool {
        self.set_mode(HologramMode::CityList)
    }

    pub fn select_city(&mut self, city: &str) -> bool {
        if self.record.is_none() {
            return false;
        }
        let city = city.trim();
        self.selected_city = (!city.is_empty()).then(|| city.to_string());
        self.mode = HologramMode::Assistant;
        true
    }

    pub fn close_assistant(&mut self) -> bool {
        self.show_cities()
    }

    fn set_mode(&mut self, mode: HologramMode) -> bool {
        if self.record.is_none() || self.mode == mode {
            return false;
        }
        self.mode = mode;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Hologram, HologramMode, HologramView, not_found_message};
    use formats::culture::CultureDataset;
    use pretty_assertions::assert_eq;

    fn dataset() -> CultureDataset {
        CultureDataset::from_json_str(
            r#"{
                "Bali": {
                    "nama": "Bali",
                    "info": { "Tarian": ["Kecak", "Legong"], "Rumah Adat": "Gapura Candi Bentar" },
                    "KotaKabupaten": [ { "nama": "Kota Denpasar" }, { "nama": "Kabupaten Badung" } ]
                },
                "Banten": { "nama": "Banten" }
            }"#,
        )
        .expect("dataset")
    }

    #[test]
    fn opens_on_city_list() {
        let holo = Hologram::open("Bali", &dataset());
        assert_eq!(holo.mode(), HologramMode::CityList);
        assert_eq!(
            holo.view(),
            HologramView::CityList {
                title: "Bali",
                cities: vec!["Kota Denpasar", "Kabupaten Badung"],
            }
        );
    }

    #[test]
    fn missing_record_shows_not_found() {
        let mut holo = Hologram::open("Papua Pegunungan", &dataset());
        assert_eq!(
            holo.view(),
            HologramView::NotFound {
                name: "Papua Pegunungan",
                key: "PapuaPegunungan",
            }
        );
        assert!(!holo.show_info());
        assert!(!holo.select_city("Wamena"));
        assert_eq!(holo.title(), "Papua Pegunungan");
        assert_eq!(
            not_found_message("Papua Pegunungan", holo.key()),
            "Provinsi Papua Pegunungan (Key: PapuaPegunungan) belum memiliki data lengkap di budaya.json."
        );
    }

    #[test]
    fn info_view_joins_lists() {
        let mut holo = Hologram::open("Bali", &dataset());
        assert!(holo.show_info());
        assert!(!holo.show_info());
        assert_eq!(
            holo.view(),
            HologramView::CulturalInfo {
                title: "Bali",
                entries: vec![
                    ("Tarian", "Kecak, Legong".to_string()),
                    ("Rumah Adat", "Gapura Candi Bentar".to_string()),
                ],
            }
        );
        assert!(holo.show_cities());
    }

    #[test]
    fn empty_record_shows_placeholders() {
        let mut holo = Hologram::open("Banten", &dataset());
        assert_eq!(holo.view(), HologramView::NoCities { title: "Banten" });
        holo.show_info();
        assert_eq!(holo.view(), HologramView::NoInfo { title: "Banten" });
    }

    #[test]
    fn city_selection_opens_assistant_and_closes_back_to_list() {
        let mut holo = Hologram::open("Bali", &dataset());
        assert!(holo.select_city("Kabupaten Badung"));
        assert_eq!(
            holo.view(),
            HologramView::Assistant {
                title: "Bali",
                city: "Kabupaten Badung",
            }
        );
        assert_eq!(holo.assistant_city(), Some("Kabupaten Badung"));
        assert!(holo.close_assistant());
        assert_eq!(holo.mode(), HologramMode::CityList);
        assert_eq!(holo.assistant_city(), None);
    }

    #[test]
    fn blank_city_falls_back_to_record_name() {
        let dataset = CultureDataset::from_json_str(
            r#"{ "Bali": { "nama": "Bali", "KotaKabupaten": [ { "nama": "" } ] } }"#,
        )
        .expect("dataset");
        let mut holo = Hologram::open("Bali", &dataset);
        assert!(holo.select_city("  "));
        assert_eq!(
            holo.view(),
            HologramView::Assistant {
                title: "Bali",
                city: "Bali",
            }
        );
        assert_eq!(holo.assistant_city(), Some("Bali"));
    }
}
