//! Free-form duration token parsing.
//!
//! Operators type things like `30`, `5m`, `2h`, `1d` at the prompt. A bare
//! digit string is seconds; a single trailing unit letter scales it. Any
//! other form falls back to [`DEFAULT_WINDOW_SECS`] rather than aborting the
//! run, and the fallback is flagged so the report can say so.

/// Window applied when the operator's token is blank or invalid.
pub const DEFAULT_WINDOW_SECS: i64 = 600;

/// A parsed duration token.
///
/// # Examples
///
/// ```
/// use vitals_logwin::{parse_duration, WindowDuration};
///
/// assert_eq!(parse_duration("5m"), WindowDuration { seconds: 300, fell_back: false });
///
/// let bad = parse_duration("soon");
/// assert_eq!(bad.seconds, 600);
/// assert!(bad.fell_back);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDuration {
    /// Window length in seconds, always positive.
    pub seconds: i64,
    /// True when the token was invalid and the default was substituted.
    pub fell_back: bool,
}

/// Parse a duration token into seconds.
///
/// Accepted forms: bare digits (seconds) or digits followed by one of
/// `s`/`m`/`h`/`d`. Zero, negative-looking, and malformed tokens are
/// invalid; invalid input yields the 600-second default with
/// [`WindowDuration::fell_back`] set. Never panics, never errors.
///
/// # Examples
///
/// ```
/// use vitals_logwin::parse_duration;
///
/// assert_eq!(parse_duration("30").seconds, 30);
/// assert_eq!(parse_duration("2h").seconds, 7200);
/// assert_eq!(parse_duration("1d").seconds, 86400);
/// ```
pub fn parse_duration(token: &str) -> WindowDuration {
    match parse_token(token.trim()) {
        Some(seconds) => WindowDuration {
            seconds,
            fell_back: false,
        },
        None => WindowDuration {
            seconds: DEFAULT_WINDOW_SECS,
            fell_back: true,
        },
    }
}

fn parse_token(token: &str) -> Option<i64> {
    if token.is_empty() {
        return None;
    }

    let (digits, scale) = match token.as_bytes().last() {
        Some(b's') => (&token[..token.len() - 1], 1),
        Some(b'm') => (&token[..token.len() - 1], 60),
        Some(b'h') => (&token[..token.len() - 1], 3600),
        Some(b'd') => (&token[..token.len() - 1], 86400),
        Some(b'0'..=b'9') => (token, 1),
        _ => return None,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: i64 = digits.parse().ok()?;
    let seconds = value.checked_mul(scale)?;
    (seconds > 0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_seconds_and_units() {
        assert_eq!(parse_duration("30").seconds, 30);
        assert_eq!(parse_duration("30s").seconds, 30);
        assert_eq!(parse_duration("5m").seconds, 300);
        assert_eq!(parse_duration("2h").seconds, 7200);
        assert_eq!(parse_duration("1d").seconds, 86400);
        assert!(!parse_duration("1d").fell_back);
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(parse_duration("  5m \n").seconds, 300);
    }

    #[test]
    fn invalid_tokens_fall_back() {
        for token in ["abc", "", "m", "5x", "1.5h", "-30", "5 m", "h5"] {
            let parsed = parse_duration(token);
            assert_eq!(parsed.seconds, DEFAULT_WINDOW_SECS, "token {token:?}");
            assert!(parsed.fell_back, "token {token:?}");
        }
    }

    #[test]
    fn zero_is_invalid() {
        assert!(parse_duration("0").fell_back);
        assert!(parse_duration("0m").fell_back);
    }

    #[test]
    fn overflow_falls_back() {
        let parsed = parse_duration("99999999999999999999d");
        assert_eq!(parsed.seconds, DEFAULT_WINDOW_SECS);
        assert!(parsed.fell_back);
    }
}
