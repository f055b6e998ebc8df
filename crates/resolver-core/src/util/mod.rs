//! Small shared helpers.

/// Mask an API key for display or logging.
///
/// Keys longer than 8 characters keep their first and last 4 characters with
/// the exact number of hidden characters in between; shorter keys are fully
/// masked so their length leaks nothing.
pub fn mask_api_key(api_key: &str) -> String {
    if api_key.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() > 8 {
        let hidden = chars.len() - 8;
        let mut masked: String = chars[..4].iter().collect();
        masked.extend(std::iter::repeat('•').take(hidden));
        masked.extend(&chars[chars.len() - 4..]);
        masked
    } else {
        "••••••••".to_string()
    }
}
