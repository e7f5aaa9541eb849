/// Lexically cleans a slash-separated path.
///
/// Collapses repeated separators, drops `.` segments, and resolves `..`
/// against preceding segments. A rooted path never climbs above `/`; an
/// unrooted path keeps leading `..` segments it cannot resolve. The empty
/// path cleans to `.`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Canonical logical segments for a path: cleaned, unrooted, and without
/// leading `.`/`..` segments.
pub fn logical_segments(path: &str) -> Vec<String> {
    clean_path(path)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .skip_while(|segment| *segment == ".." || *segment == ".")
        .map(str::to_string)
        .collect()
}

/// Canonical logical name for `path`.
///
/// When the path collapses to nothing (for example `..`), the base name of
/// `absolute` is used instead, if one is provided.
pub fn logical_name(path: &str, absolute: Option<&str>) -> String {
    let segments = logical_segments(path);
    if segments.is_empty() {
        if let Some(absolute) = absolute {
            return base_name(absolute).unwrap_or_default();
        }
    }
    segments.join("/")
}

/// Returns false for requests that can never name a file.
pub fn is_well_formed(path: &str) -> bool {
    !path.is_empty() && !path.contains('\0')
}

fn base_name(path: &str) -> Option<String> {
    let cleaned = clean_path(path);
    cleaned
        .rsplit('/')
        .find(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(str::to_string)
}
