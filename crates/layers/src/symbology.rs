use scene::selection::Highlight;

/// Material parameters for one province mesh.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProvinceStyle {
    /// sRGB in [0, 1]; also used as the emissive colour.
    pub color: [f32; 3],
    pub emissive_intensity: f32,
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
}

pub const ACTIVE_COLOR: &str = "#06b6d4";
pub const HOVERED_COLOR: &str = "#67e8f9";
pub const IDLE_COLOR: &str = "#4b5563";

impl ProvinceStyle {
    pub const fn new(color: [f32; 3], emissive_intensity: f32, opacity: f32) -> Self {
        Self {
            color,
            emissive_intensity,
            opacity,
            roughness: 0.8,
            metalness: 0.4,
        }
    }

    pub fn for_highlight(highlight: Highlight) -> Self {
        match highlight {
            Highlight::Active => Self::new(hex_rgb(ACTIVE_COLOR), 0.7, 1.0),
            Highlight::Hovered => Self::new(hex_rgb(HOVERED_COLOR), 0.5, 0.8),
            Highlight::Idle => Self::new(hex_rgb(IDLE_COLOR), 0.2, 0.8),
        }
    }

    /// Straight (non-premultiplied) RGBA.
    pub fn rgba(&self) -> [f32; 4] {
        [self.color[0], self.color[1], self.color[2], self.opacity]
    }
}

/// Parses `#rrggbb`; anything else yields black.
pub fn hex_rgb(hex: &str) -> [f32; 3] {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return [0.0; 3];
    }
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f32 / 255.0)
            .unwrap_or(0.0)
    };
    [channel(0), channel(2), channel(4)]
}
