//! Mailbox formatting and ordering
//!
//! Turns a contact's display name and email into a single RFC 5322 style
//! mailbox string, and defines the order contact lists are presented in.

use std::borrow::Cow;

/// Format one mailbox from a display name and an email address.
///
/// - An email that already contains a space is assumed to carry its own
///   display text and is returned as-is.
/// - A non-empty name produces `Name <email>`, quoting the name when needed
///   (see [`quote_name_if_needed`]).
/// - An empty name produces the bare email.
///
/// # Examples
///
/// ```
/// use directory_contacts::address::format_address;
///
/// assert_eq!(format_address("Bob", "bob@x.com"), "Bob <bob@x.com>");
/// assert_eq!(format_address("Bob Jones", "bob@x.com"), "\"Bob Jones\" <bob@x.com>");
/// assert_eq!(format_address("", "bob@x.com"), "bob@x.com");
/// ```
pub fn format_address(name: &str, email: &str) -> String {
    if email.contains(' ') {
        tracing::warn!(email = %email, "Contact email address contains a space");
        return email.to_string();
    }
    if name.is_empty() {
        return email.to_string();
    }
    format!("{} <{}>", quote_name_if_needed(name), email)
}

/// Return `name` untouched if it is plain ASCII alphanumerics, else a quoted string.
///
/// Backslashes and double quotes inside the name are escaped as RFC 5322
/// quoted-pairs. Control characters never appear raw: `\n`, `\r`, `\t` and
/// the other C escapes use their short form, anything else becomes `\xNN` or
/// `\uNNNN`, so a name cannot break the mailbox across lines.
pub fn quote_name_if_needed(name: &str) -> Cow<'_, str> {
    if is_plain_atom(name) {
        return Cow::Borrowed(name);
    }
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{7}' => quoted.push_str("\\a"),
            '\u{8}' => quoted.push_str("\\b"),
            '\u{b}' => quoted.push_str("\\v"),
            '\u{c}' => quoted.push_str("\\f"),
            c if c.is_control() && c.is_ascii() => {
                quoted.push_str(&format!("\\x{:02x}", u32::from(c)));
            }
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

// `^[A-Za-z0-9]+$`; stricter than RFC 5322 atext but never needs quoting
fn is_plain_atom(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Comparison key for a formatted address: the text with one leading `"` removed.
pub fn sort_key(address: &str) -> &str {
    address.strip_prefix('"').unwrap_or(address)
}

/// Sort formatted addresses ascending by [`sort_key`].
///
/// The sort is stable, so addresses with equal keys keep their relative order.
pub fn sort_addresses(addresses: &mut [String]) {
    addresses.sort_by(|a, b| sort_key(a).cmp(sort_key(b)));
}
