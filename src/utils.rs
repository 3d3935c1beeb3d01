use log::{debug, error};

const MAX_PLACE_ID_LEN: usize = 512;

/// Checks a caller-supplied place id before it is forwarded to the provider.
pub fn validate_place_id(place_id: &str) -> Result<&str, String> {
    debug!("Validating place id: {}", place_id);

    let place_id = place_id.trim();
    if place_id.is_empty() {
        error!("Place id is empty");
        return Err("Place id must not be empty".to_string());
    }

    if place_id.len() > MAX_PLACE_ID_LEN {
        error!("Place id exceeds maximum length");
        return Err("Place id exceeds maximum length".to_string());
    }

    if !place_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        error!("Place id contains invalid characters");
        return Err("Place id contains invalid characters".to_string());
    }

    Ok(place_id)
}

/// Blank keywords mean "no keyword".
pub fn normalize_keyword(keyword: Option<&str>) -> Option<String> {
    keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
}

pub fn rating_display(rating: Option<f32>) -> String {
    match rating {
        Some(rating) => format!("{rating:.1}"),
        None => "N/A".to_string(),
    }
}

/// Compares two secrets without stopping at the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn mask_api_key(key: &str) -> String {
    let visible: String = key.chars().take(5).collect();
    let hidden = key.chars().count().saturating_sub(5);
    format!("{}{}", visible, "*".repeat(hidden))
}
