/// Normalizes a province display name into the key used by the cultural dataset.
///
/// Whitespace is removed first, then every character that is not an ASCII
/// letter or digit. Both the dataset loader and every lookup go through this
/// function; a mismatch between the two shows up as a "data not found" panel.
pub fn province_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
