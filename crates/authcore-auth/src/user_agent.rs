//! User-agent normalization for stored sessions.

use woothee::parser::Parser;

/// Stored in place of a user agent when the request carried none.
pub const UNKNOWN_USER_AGENT: &str = "null";

/// Reduce a raw `User-Agent` header to `"{os} {os version} {browser}
/// {browser version}"`.
pub fn describe(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return UNKNOWN_USER_AGENT.to_string();
    };
    match Parser::new().parse(raw) {
        Some(ua) => format!("{} {} {} {}", ua.os, ua.os_version, ua.name, ua.version),
        None => UNKNOWN_USER_AGENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn browser_user_agent_is_reduced_to_os_and_browser() {
        let described = describe(Some(CHROME_WINDOWS));
        assert!(described.starts_with("Windows"), "{described}");
        assert!(described.ends_with("Chrome 120.0.0.0"), "{described}");
        assert!(!described.contains("Mozilla"));
    }

    #[test]
    fn missing_user_agent_is_null() {
        assert_eq!(describe(None), "null");
        assert_eq!(describe(Some("")), "null");
        assert_eq!(describe(Some("   ")), "null");
    }
}
