//! CSRF token lookup from cookie strings

pub const CSRF_COOKIE: &str = "csrftoken";

/// Look up `name` in a `Cookie`-style header (`a=1; b=2`).
///
/// Mirrors the browser lookup: the name must occur exactly once and the
/// value is percent-decoded.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    let haystack = format!("; {}", cookie_header);
    let needle = format!("; {}=", name);
    let parts: Vec<&str> = haystack.split(needle.as_str()).collect();

    if parts.len() != 2 {
        return None;
    }

    let raw = parts[1].split(';').next().unwrap_or("");
    urlencoding::decode(raw).ok().map(|v| v.into_owned())
}

/// Find `name` among `Set-Cookie` header values
pub fn token_from_set_cookie<'a, I>(values: I, name: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter_map(|value| {
            // Attributes (Path, Expires, ...) follow the first ';'
            let pair = value.split(';').next()?.trim();
            let (key, val) = pair.split_once('=')?;
            (key.trim() == name).then(|| val.trim().to_string())
        })
        .find(|v| !v.is_empty())
}
