//! Parsing of existing chat links back into number + message.
//!
//! ## Accepted forms
//!
//! - `whatsapp://send?phone=<digits>&text=<encoded>`
//! - `https://wa.me/<digits>?text=<encoded>`
//! - `https://api.whatsapp.com/send?phone=<digits>&text=<encoded>`
//!
//! Parsing is lenient about presentation:
//! - Case-insensitive scheme and host: `WhatsApp://`, `HTTPS://WA.ME/`
//! - Slash variants: `whatsapp:send`, `whatsapp:///send`
//! - `www.` prefix on web hosts
//! - Fragments are ignored: `https://wa.me/123?text=hi#top`
//!
//! The number must still be a valid international number once a `+` is
//! prepended; anything else yields `None`.

use super::{encode_message, format_phone_number, validate_phone_number};
use super::{NATIVE_SEND_PREFIX, WEB_PREFIX};

/// A decoded chat link.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ChatLink {
    /// Digits only, no `+`.
    pub phone: String,
    /// Percent-decoded message, if the link carried one.
    pub text: Option<String>,
}

impl ChatLink {
    pub fn to_web_url(&self) -> String {
        format!(
            "{WEB_PREFIX}{}?text={}",
            self.phone,
            encode_message(self.text.as_deref().unwrap_or_default())
        )
    }

    pub fn to_native_url(&self) -> String {
        format!(
            "{NATIVE_SEND_PREFIX}?phone={}&text={}",
            self.phone,
            encode_message(self.text.as_deref().unwrap_or_default())
        )
    }
}

/// Split `raw` into a lowercase scheme and the remainder with leading
/// slashes removed.
#[inline]
fn split_scheme(raw: &str) -> Option<(String, &str)> {
    let colon = raw.find(':')?;
    let scheme = &raw[..colon];
    if scheme.is_empty() || !scheme.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let rest = raw[colon + 1..].trim_start_matches('/');
    Some((scheme.to_ascii_lowercase(), rest))
}

/// Split off the query, dropping any fragment.
#[inline]
fn split_query(s: &str) -> (&str, &str) {
    let s = match s.find('#') {
        Some(i) => &s[..i],
        None => s,
    };
    match s.find('?') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

fn query_param(qs: &str, name: &str) -> Option<String> {
    for kv in qs.split('&') {
        let mut it = kv.splitn(2, '=');
        let k = it.next().unwrap_or_default();
        let v = it.next().unwrap_or_default();
        if k.trim().eq_ignore_ascii_case(name) {
            return Some(
                urlencoding::decode(v)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| v.to_string()),
            );
        }
    }
    None
}

fn checked_phone(raw: &str) -> Option<String> {
    let digits = format_phone_number(raw);
    if validate_phone_number(&format!("+{digits}")) {
        Some(digits)
    } else {
        None
    }
}

/// Parse a chat link. Returns `None` for anything that is not a WhatsApp
/// send link with a valid number.
pub fn parse(raw: &str) -> Option<ChatLink> {
    let (scheme, rest) = split_scheme(raw.trim())?;
    let (path, qs) = split_query(rest);

    match scheme.as_str() {
        "whatsapp" => {
            if !path.trim_end_matches('/').eq_ignore_ascii_case("send") {
                return None;
            }
            let phone = checked_phone(&query_param(qs, "phone")?)?;
            Some(ChatLink {
                phone,
                text: query_param(qs, "text"),
            })
        }
        "https" | "http" => {
            let mut segments = path.split('/').filter(|s| !s.is_empty());
            let host = segments.next()?.to_ascii_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host);
            match host {
                "wa.me" => {
                    let phone = checked_phone(segments.next()?)?;
                    if segments.next().is_some() {
                        return None;
                    }
                    Some(ChatLink {
                        phone,
                        text: query_param(qs, "text"),
                    })
                }
                "api.whatsapp.com" => {
                    if !segments.next()?.eq_ignore_ascii_case("send") {
                        return None;
                    }
                    let phone = checked_phone(&query_param(qs, "phone")?)?;
                    Some(ChatLink {
                        phone,
                        text: query_param(qs, "text"),
                    })
                }
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(phone: &str, text: Option<&str>) -> ChatLink {
        ChatLink {
            phone: phone.to_string(),
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_native() {
        assert_eq!(
            parse("whatsapp://send?phone=1234567890&text=Hello%20World"),
            Some(link("1234567890", Some("Hello World")))
        );
        assert_eq!(
            parse("whatsapp://send?phone=1234567890"),
            Some(link("1234567890", None))
        );
    }

    #[test]
    fn test_parse_web() {
        assert_eq!(
            parse("https://wa.me/12345678900?text=Hello%20World"),
            Some(link("12345678900", Some("Hello World")))
        );
        assert_eq!(
            parse("https://api.whatsapp.com/send?phone=447946095800&text=hi"),
            Some(link("447946095800", Some("hi")))
        );
    }

    #[test]
    fn test_parse_lenient_presentation() {
        assert_eq!(
            parse("WhatsApp://SEND?phone=1234567890&text=x"),
            Some(link("1234567890", Some("x")))
        );
        assert_eq!(
            parse("whatsapp:send?phone=1234567890"),
            Some(link("1234567890", None))
        );
        assert_eq!(
            parse("HTTPS://WWW.WA.ME/1234567890?text=a#frag"),
            Some(link("1234567890", Some("a")))
        );
        assert_eq!(parse("  https://wa.me/1234567890/  "), Some(link("1234567890", None)));
    }

    #[test]
    fn test_parse_decodes_unicode() {
        let parsed = parse("https://wa.me/1234567890?text=Hello!%20I'm%20interested.%20%F0%9F%8E%89").unwrap();
        assert_eq!(parsed.text.as_deref(), Some("Hello! I'm interested. 🎉"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("").is_none());
        assert!(parse("whatsapp://chat?phone=1234567890").is_none()); // unknown action
        assert!(parse("whatsapp://send?text=hi").is_none()); // missing phone
        assert!(parse("whatsapp://send?phone=0123456789").is_none()); // leading zero
        assert!(parse("https://wa.me/123?text=hi").is_none()); // too short
        assert!(parse("https://example.com/1234567890").is_none()); // unknown host
        assert!(parse("https://wa.me/1234567890/extra").is_none());
        assert!(parse("mailto:someone@example.com").is_none());
    }

    #[test]
    fn test_rerender() {
        let l = link("1234567890", Some("Hello World"));
        assert_eq!(l.to_web_url(), "https://wa.me/1234567890?text=Hello%20World");
        assert_eq!(
            l.to_native_url(),
            "whatsapp://send?phone=1234567890&text=Hello%20World"
        );
    }
}
