//! Query-string helpers shared by the client and the cursor codec.

use url::Url;

/// Set `key` to `value`, replacing the first occurrence in place and
/// dropping any later duplicates. Appends the pair if `key` is absent.
pub fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let mut found = false;
    pairs.retain_mut(|(k, v)| {
        if k != key {
            return true;
        }
        if found {
            return false;
        }
        found = true;
        value.clone_into(v);
        true
    });
    if !found {
        pairs.push((key.to_string(), value.to_string()));
    }

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}

/// Render the path and query of `url`, e.g. `/jobs/?page_size=15`.
#[must_use]
pub fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) if !q.is_empty() => format!("{}?{q}", url.path()),
        _ => url.path().to_string(),
    }
}
