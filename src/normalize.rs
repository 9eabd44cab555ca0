/// Canonicalize a link for comparison.
///
/// Drops a leading `http://` or `https://` (plus an optional `www.`),
/// any trailing slashes and surrounding whitespace, then lower-cases.
/// `http://Example.com/path/` and `https://www.example.com/path` both become
/// `example.com/path`.
pub fn normalize_link(link: &str) -> String {
    let mut s = link.trim();

    // repeated schemes would otherwise survive the first pass
    while let Some(rest) = strip_scheme(s) {
        s = rest.trim_start();
    }

    s.trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_lowercase()
}

fn strip_scheme(s: &str) -> Option<&str> {
    let rest = ["https://", "http://"]
        .into_iter()
        .find_map(|scheme| strip_prefix_ignore_case(s, scheme))?;
    Some(strip_prefix_ignore_case(rest, "www.").unwrap_or(rest))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
