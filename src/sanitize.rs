//! Detection and rewriting of troublesome names.
//!
//! A name is troublesome when it contains a character that some platform or
//! common shell usage chokes on, or a positional pattern that is easy to
//! misread:
//!
//! - ASCII control characters and DEL.
//! - `< > : " / \ | ? *` (reserved on Windows, `/` everywhere).
//! - `% [ ] ~ { } ;` (URL escapes, glob syntax, home alias, shell syntax).
//! - Leading whitespace or hyphen, trailing whitespace, and two consecutive
//!   whitespace characters anywhere.
//!
//! Characters such as `( ) & ' ! + = , @ # $ ^` are accepted.  Parsing never
//! rejects a troublesome name; these rules only apply to names this crate
//! generates, typically when importing foreign data as new packets.

use crate::error::{PacketError, Result};

pub fn is_forbidden(c: char) -> bool {
    c.is_ascii_control() || tag_for(c).is_some()
}

pub fn is_troublesome(name: &str) -> bool {
    if name.chars().any(is_forbidden) {
        return true;
    }
    if name.starts_with(|c: char| c.is_whitespace() || c == '-') {
        return true;
    }
    if name.ends_with(char::is_whitespace) {
        return true;
    }
    let mut prev_ws = false;
    for c in name.chars() {
        let ws = c.is_whitespace();
        if ws && prev_ws {
            return true;
        }
        prev_ws = ws;
    }
    false
}

/// Rewrite `name` so that [`is_troublesome`] no longer holds.
///
/// Forbidden characters are replaced first by space-padded tags (`/` becomes
/// ` SLASH `, control characters become `=HH`), then whitespace is
/// normalized over the result: leading and trailing runs dropped, interior
/// runs collapsed to one space, and a leading hyphen spelled out as `HYPHEN `.
/// The second stage sees the padding the first one added, so adjacent tags
/// never leave a double space behind.
///
/// This is a one-way renaming for imports, not an encoding.
pub fn rename_troublesome(name: &str) -> String {
    normalize_spacing(&substitute_forbidden(name))
}

/// [`rename_troublesome`], failing when nothing usable is left.
pub fn sanitize_name(name: &str) -> Result<String> {
    let renamed = rename_troublesome(name);
    if renamed.is_empty() {
        return Err(PacketError::EmptyName(name.to_owned()));
    }
    Ok(renamed)
}

// ── Stage 1: character substitution ──────────────────────────────────────────

fn tag_for(c: char) -> Option<&'static str> {
    Some(match c {
        '<'  => " LESS-THAN ",
        '>'  => " GREATER-THAN ",
        ':'  => " COLON ",
        '"'  => " QUOTATION ",
        '/'  => " SLASH ",
        '\\' => " BACKSLASH ",
        '|'  => " VERTICAL LINE ",
        '?'  => " QUESTION ",
        '*'  => " STAR ",
        '%'  => " PERCENT ",
        '['  => " LEFT SQUARE BRACKET ",
        ']'  => " RIGHT SQUARE BRACKET ",
        '~'  => " TILDE ",
        '{'  => " LEFT CURLY BRACKET ",
        '}'  => " RIGHT CURLY BRACKET ",
        ';'  => " SEMICOLON ",
        _    => return None,
    })
}

fn substitute_forbidden(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if let Some(tag) = tag_for(c) {
            out.push_str(tag);
        } else if c.is_ascii_control() {
            out.push_str(&format!("={:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

// ── Stage 2: whitespace and hyphen normalization ─────────────────────────────

fn normalize_spacing(text: &str) -> String {
    let mut rest = text.trim_start();
    let mut out = String::with_capacity(text.len());
    if let Some(after) = rest.strip_prefix('-') {
        out.push_str("HYPHEN ");
        rest = after.trim_start();
    }
    let mut pending_space = false;
    for c in rest.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    // A bare hyphen leaves "HYPHEN " with nothing after it.
    let kept = out.trim_end().len();
    out.truncate(kept);
    out
}
