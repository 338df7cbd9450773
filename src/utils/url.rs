//! URL detection and lexical path joining.
//!
//! Nothing here touches the filesystem: paths are joined and normalized as
//! strings so results are identical on every platform.

/// Whether `s` is a URL (`scheme:` prefix or protocol-relative `//`).
pub fn is_url(s: &str) -> bool {
    if s.starts_with("//") {
        return true;
    }

    let Some((scheme, _)) = s.split_once(':') else {
        return false;
    };

    // A single letter is a Windows drive (`C:\...`), not a scheme
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Split a URL into its origin (`https://host:port`) and path (`/a/b`).
///
/// Query strings and fragments are dropped from the path.
pub fn split_url(url: &str) -> (&str, &str) {
    let after_scheme = url.find("//").map_or(0, |i| i + 2);
    let path_start = url[after_scheme..]
        .find('/')
        .map_or(url.len(), |i| after_scheme + i);

    let (origin, rest) = url.split_at(path_start);
    let path_end = rest.find(['?', '#']).unwrap_or(rest.len());
    (origin, &rest[..path_end])
}

/// Resolve `target` against a base URL, like a browser resolving a link.
pub fn resolve_url(base: &str, target: &str) -> String {
    let (origin, path) = split_url(base);

    if target.starts_with('/') {
        return format!("{origin}{}", normalize_path(target));
    }

    let dir = match path.rfind('/') {
        Some(i) => &path[..=i],
        None => "/",
    };
    format!("{origin}{}", normalize_path(&format!("{dir}{target}")))
}

/// Return the directory part of a path (`a/b/c.md` -> `a/b`).
pub fn parent_dir(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    match path.rfind(['/', '\\']) {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "",
    }
}

/// Join two path strings and normalize the result.
pub fn join_path(base: &str, target: &str) -> String {
    if base.is_empty() {
        return normalize_path(target);
    }
    normalize_path(&format!("{}/{}", base.trim_end_matches(['/', '\\']), target))
}

/// Lexically normalize a path: unify separators, drop `.` segments, fold
/// `..` into their parent. Leading `..` on relative paths are kept.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// File extension of the last path segment, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit(['/', '\\']).next()?;
    let name = name.split(['?', '#']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}
