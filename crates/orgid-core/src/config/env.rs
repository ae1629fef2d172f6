#[must_use]
pub(super) fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[must_use]
pub(super) fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub(super) fn parse_u16(raw: Option<String>) -> Option<u16> {
    raw.and_then(|raw| raw.trim().parse::<u16>().ok())
}

#[must_use]
pub(super) fn parse_u64_min(raw: Option<String>, min_value: u64) -> Option<u64> {
    raw.and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|value| *value >= min_value)
}
