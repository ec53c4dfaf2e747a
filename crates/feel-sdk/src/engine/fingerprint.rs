//! Cache keys for compile requests

use sha2::{Digest, Sha256};

/// Collapse whitespace runs outside string literals and trim the ends.
///
/// Sources differing only in layout share a key. String literal contents,
/// escapes included, are kept byte for byte.
pub fn normalize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.trim().chars();
    let mut pending_space = false;
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
        if c == '"' {
            while let Some(s) = chars.next() {
                out.push(s);
                match s {
                    '\\' => out.extend(chars.next()),
                    '"' => break,
                    _ => {}
                }
            }
        }
    }
    out
}

/// Key for a compile request. Keys over `threshold` bytes become a SHA-256 digest.
pub fn fingerprint(kind: &str, parts: &[&str], threshold: usize) -> String {
    let key = parts.join("\u{1f}");
    if key.len() <= threshold {
        return format!("{}:{}", kind, key);
    }
    let digest = Sha256::digest(key.as_bytes());
    format!("{}#{:x}", kind, digest)
}

/// Unit name derived from a key
pub fn unit_name(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let hex = format!("{:x}", digest);
    format!("Feel_{}", &hex[..12])
}
