//! Resource name generation
//!
//! Turns a construct path (`["web", "deployment"]`) into a DNS-1123 label
//! suitable for `metadata.name`.

use sha2::{Digest, Sha256};

/// Maximum length of a DNS-1123 label
pub const MAX_DNS_LABEL_LEN: usize = 63;

/// Number of hex chars taken from the path digest
const HASH_LEN: usize = 8;

/// Build a DNS label from a construct path.
///
/// Components are lowercased, invalid characters become `-`, empty
/// components and consecutive duplicates are dropped. With `include_hash`
/// the first 8 hex chars of the SHA-256 of the `/`-joined path are appended,
/// so two paths that sanitize to the same label still get distinct names.
pub fn to_dns_label(path: &[&str], include_hash: bool) -> String {
    let mut components: Vec<String> = Vec::with_capacity(path.len());
    for component in path.iter().map(|c| sanitize(c)) {
        if component.is_empty() || components.last() == Some(&component) {
            continue;
        }
        components.push(component);
    }
    let human = components.join("-");

    if !include_hash {
        let label = truncate(&human, MAX_DNS_LABEL_LEN);
        if label.is_empty() {
            return path_hash(path);
        }
        return label;
    }

    let hash = path_hash(path);
    let human = truncate(&human, MAX_DNS_LABEL_LEN - HASH_LEN - 1);
    if human.is_empty() {
        hash
    } else {
        format!("{}-{}", human, hash)
    }
}

fn sanitize(component: &str) -> String {
    let replaced: String = component
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    replaced.trim_matches('-').to_string()
}

fn truncate(label: &str, max: usize) -> String {
    // Labels are ASCII after sanitizing, so byte slicing is safe.
    let end = label.len().min(max);
    label[..end].trim_end_matches('-').to_string()
}

fn path_hash(path: &[&str]) -> String {
    let digest = Sha256::digest(path.join("/").as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash
}
