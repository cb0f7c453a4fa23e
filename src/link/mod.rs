//! WhatsApp chat link building.
//!
//! Two URL shapes are produced:
//!
//! - native deep link: `whatsapp://send?phone=<digits>&text=<encoded>`
//! - web fallback: `https://wa.me/<digits>?text=<encoded>`
//!
//! Phone numbers must be in international format (`+<country><number>`,
//! 7 to 15 digits, no leading zero). Separators such as spaces, hyphens and
//! parentheses are tolerated on input and never appear in a URL.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::debug::{self, cat};
use crate::error::LinkError;
use crate::platform::{self, Environment};

pub mod parse;

pub use parse::{parse, ChatLink};

pub const NATIVE_SEND_PREFIX: &str = "whatsapp://send";
pub const WEB_PREFIX: &str = "https://wa.me/";

pub const MIN_DIGITS: usize = 7;
pub const MAX_DIGITS: usize = 15;

/// Bytes left alone by `encodeURIComponent`: alphanumerics and `-_.!~*'()`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Digits only. Always succeeds; no length or format checks.
pub fn format_phone_number(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True iff `raw`, reduced to digits and `+`, is `+` followed by 7-15 digits
/// with a non-zero first digit.
pub fn validate_phone_number(raw: &str) -> bool {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    let Some(digits) = kept.strip_prefix('+') else {
        return false;
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        // a second '+'
        return false;
    }
    if digits.starts_with('0') {
        return false;
    }
    (MIN_DIGITS..=MAX_DIGITS).contains(&digits.len())
}

/// Percent-encode a message the way `encodeURIComponent` does.
pub fn encode_message(message: &str) -> String {
    utf8_percent_encode(message, URI_COMPONENT).to_string()
}

fn native_url(digits: &str, encoded: &str) -> String {
    format!("{NATIVE_SEND_PREFIX}?phone={digits}&text={encoded}")
}

fn web_url(digits: &str, encoded: &str) -> String {
    format!("{WEB_PREFIX}{digits}?text={encoded}")
}

/// Build a chat URL. Validation happens before anything is formatted.
pub fn generate_whatsapp_url(
    phone: &str,
    message: &str,
    is_mobile: bool,
) -> Result<String, LinkError> {
    if !validate_phone_number(phone) {
        debug::log(cat::LINK, format!("rejected phone {phone:?}"));
        return Err(LinkError::InvalidPhoneNumber);
    }
    let digits = format_phone_number(phone);
    let encoded = encode_message(message);
    Ok(if is_mobile {
        native_url(&digits, &encoded)
    } else {
        web_url(&digits, &encoded)
    })
}

/// [`generate_whatsapp_url`] with the default web form.
pub fn generate_web_url(phone: &str, message: &str) -> Result<String, LinkError> {
    generate_whatsapp_url(phone, message, false)
}

/// Build the URL suited to the environment's platform.
pub fn generate_platform_specific_url(
    env: &dyn Environment,
    phone: &str,
    message: &str,
) -> Result<String, LinkError> {
    let info = platform::detect(env);
    if !info.has_whatsapp_support {
        return Err(LinkError::UnsupportedPlatform);
    }
    generate_whatsapp_url(phone, message, info.is_mobile)
}

/// The web form, regardless of platform. Universal fallback target.
pub fn get_fallback_url(phone: &str, message: &str) -> Result<String, LinkError> {
    generate_web_url(phone, message)
}

/// A validated number with both of its URLs, built once per launch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatTarget {
    pub phone_digits: String,
    pub native_url: String,
    pub web_url: String,
}

impl ChatTarget {
    pub fn new(phone: &str, message: &str) -> Result<Self, LinkError> {
        if !validate_phone_number(phone) {
            return Err(LinkError::InvalidPhoneNumber);
        }
        let phone_digits = format_phone_number(phone);
        let encoded = encode_message(message);
        Ok(ChatTarget {
            native_url: native_url(&phone_digits, &encoded),
            web_url: web_url(&phone_digits, &encoded),
            phone_digits,
        })
    }

    pub fn url_for(&self, is_mobile: bool) -> &str {
        if is_mobile {
            &self.native_url
        } else {
            &self.web_url
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemoryEnv;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const WINDOWS_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn test_validate_accepts_international_numbers() {
        for ok in [
            "+1234567",
            "+123456789012345",
            "+1234567890",
            "+1 (234) 567-8900",
            "+44 20 7946 0958",
            "+1.234.567.8900",
        ] {
            assert!(validate_phone_number(ok), "{ok} should be valid");
        }
    }

    #[test]
    fn test_validate_rejects_each_violation() {
        for bad in [
            "1234567890",        // missing +
            "+0234567890",       // leading zero
            "+123456",           // 6 digits
            "+1234567890123456", // 16 digits
            "invalid-phone",
            "",
            "+",
            "12+34567890",  // + not leading
            "+1234+567890", // two +
        ] {
            assert!(!validate_phone_number(bad), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn test_format_strips_everything_but_digits() {
        assert_eq!(format_phone_number("+1 (234) 567-8900"), "12345678900");
        assert_eq!(format_phone_number("+44\t20\n7946.0958"), "442079460958");
        assert_eq!(format_phone_number("abc"), "");
    }

    #[test]
    fn test_format_is_idempotent() {
        for raw in ["+1 (234) 567-8900", "++12--34", "٣+12"] {
            let once = format_phone_number(raw);
            assert_eq!(format_phone_number(&once), once);
            assert!(!once.contains('+'));
        }
    }

    #[test]
    fn test_encode_matches_encode_uri_component() {
        assert_eq!(encode_message("Hello World"), "Hello%20World");
        assert_eq!(encode_message("a?b&c=d"), "a%3Fb%26c%3Dd");
        assert_eq!(encode_message("it's (ok)!*~"), "it's%20(ok)!*~");
        assert_eq!(encode_message("line1\nline2"), "line1%0Aline2");
        assert_eq!(encode_message("#/+"), "%23%2F%2B");
        assert_eq!(encode_message("🎉"), "%F0%9F%8E%89");
        assert_eq!(encode_message("café"), "caf%C3%A9");
    }

    #[test]
    fn test_generate_web_and_native() {
        assert_eq!(
            generate_whatsapp_url("+1 (234) 567-8900", "Hello World", false).unwrap(),
            "https://wa.me/12345678900?text=Hello%20World"
        );
        assert_eq!(
            generate_whatsapp_url("+1234567890", "Hello World", true).unwrap(),
            "whatsapp://send?phone=1234567890&text=Hello%20World"
        );
        assert_eq!(
            generate_web_url("+1234567890", "").unwrap(),
            "https://wa.me/1234567890?text="
        );
    }

    #[test]
    fn test_generate_rejects_invalid_phone() {
        let err = generate_whatsapp_url("invalid-phone", "x", false).unwrap_err();
        assert_eq!(err, LinkError::InvalidPhoneNumber);
        assert!(err.to_string().contains("Invalid phone number format"));
    }

    #[test]
    fn test_platform_specific_url() {
        let ios = MemoryEnv::with_user_agent(IPHONE_UA);
        assert_eq!(
            generate_platform_specific_url(&ios, "+1234567890", "Hi").unwrap(),
            "whatsapp://send?phone=1234567890&text=Hi"
        );

        let desktop = MemoryEnv::with_user_agent(WINDOWS_UA);
        assert_eq!(
            generate_platform_specific_url(&desktop, "+1234567890", "Hi").unwrap(),
            "https://wa.me/1234567890?text=Hi"
        );

        let server = MemoryEnv::server();
        let err = generate_platform_specific_url(&server, "+1234567890", "Hi").unwrap_err();
        assert_eq!(err, LinkError::UnsupportedPlatform);
        assert_eq!(err.to_string(), "WhatsApp is not supported on this platform");
    }

    #[test]
    fn test_platform_specific_validates_after_support_check() {
        let server = MemoryEnv::server();
        assert_eq!(
            generate_platform_specific_url(&server, "bad", "Hi"),
            Err(LinkError::UnsupportedPlatform)
        );
        let desktop = MemoryEnv::with_user_agent(WINDOWS_UA);
        assert_eq!(
            generate_platform_specific_url(&desktop, "bad", "Hi"),
            Err(LinkError::InvalidPhoneNumber)
        );
    }

    #[test]
    fn test_fallback_is_always_web() {
        assert_eq!(
            get_fallback_url("+1234567890", "Hello World").unwrap(),
            "https://wa.me/1234567890?text=Hello%20World"
        );
    }

    #[test]
    fn test_chat_target_holds_both_forms() {
        let t = ChatTarget::new("+1 234 567 890", "a b").unwrap();
        assert_eq!(t.phone_digits, "1234567890");
        assert_eq!(t.url_for(true), "whatsapp://send?phone=1234567890&text=a%20b");
        assert_eq!(t.url_for(false), "https://wa.me/1234567890?text=a%20b");
        assert!(ChatTarget::new("0123", "x").is_err());
    }
}
