/// Trims `value` and cuts it to at most `MAX_LEN` bytes without splitting a character.
pub fn safe_truncate_str<const MAX_LEN: usize>(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.len() <= MAX_LEN {
        return trimmed;
    }
    let mut end = MAX_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    &trimmed[..end]
}

pub fn non_empty_trimmed<T: AsRef<str>>(value: Option<T>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}
