// src/utils/html.rs

/// Whitelist-sanitises teacher-authored HTML (course descriptions,
/// learning item content). Safe markup is kept, scripts and event
/// handler attributes are dropped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

pub fn clean_optional_html(input: Option<&str>) -> Option<String> {
    input.map(clean_html)
}
