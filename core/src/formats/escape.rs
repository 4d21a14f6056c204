/// Escaping rules used by lupdate when writing TS files
use crate::encoding::Newline;
use std::fmt::Write;

/// Escape element text. Control characters other than tab and line breaks
/// are written as `<byte value="xNN"/>` elements.
pub fn escape_text(value: &str, newline: Newline) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str(newline.as_str()),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\t' => out.push(ch),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "<byte value=\"x{:x}\"/>", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape an attribute value
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "&#x{:x};", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Decode the `value` of a `<byte>` element: `x1b` is hex, `27` decimal
pub fn decode_byte_value(value: &str) -> Option<char> {
    let code = match value.strip_prefix("0x").or_else(|| value.strip_prefix('x')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}
