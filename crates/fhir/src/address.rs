//! Human-readable rendering of structured postal addresses.

/// Format a structured address into a single display string.
///
/// Segments are assembled in order and joined with `", "`:
/// 1. non-empty, trimmed street lines, joined with `", "`;
/// 2. city, followed by a `state postal` pair joined with a single space
///    (either half may stand alone), the two joined with `", "`;
/// 3. country.
///
/// All-empty input produces an empty string. The function is pure and
/// idempotent.
pub fn format_address_text(
    lines: &[String],
    city: &str,
    state: &str,
    postal_code: &str,
    country: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    let street: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if !street.is_empty() {
        parts.push(street.join(", "));
    }

    let mut city_state: Vec<String> = Vec::new();
    if !city.trim().is_empty() {
        city_state.push(city.trim().to_string());
    }

    let mut state_postal: Vec<&str> = Vec::new();
    if !state.trim().is_empty() {
        state_postal.push(state.trim());
    }
    if !postal_code.trim().is_empty() {
        state_postal.push(postal_code.trim());
    }
    if !state_postal.is_empty() {
        city_state.push(state_postal.join(" "));
    }

    if !city_state.is_empty() {
        parts.push(city_state.join(", "));
    }

    if !country.trim().is_empty() {
        parts.push(country.trim().to_string());
    }

    parts.join(", ")
}
