use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 80;

/// Portable, deterministic filename for a cache key:
/// `{sanitized_key}--{short_hash(key)}.json`.
///
/// The hash keeps keys apart whose sanitized forms collide, e.g. job ids that
/// differ only in path separators.
pub fn cache_filename(cache_key: &str) -> String {
    format!("{}--{}.json", sanitize(cache_key), short_hash(cache_key))
}

/// Filename for an exported report, without a hash suffix.
pub fn export_filename(stem: &str) -> String {
    format!("{}.json", sanitize(stem))
}

fn sanitize(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let mut cleaned = compacted.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "results".to_string();
    }
    if cleaned.len() > MAX_STEM_LEN {
        let mut cut = MAX_STEM_LEN;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
