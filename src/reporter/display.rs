//! Node id splitting and display-name transforms.

/// Segment the host inserts for class instances in older node ids
pub const INSTANCE_MARKER: &str = "()";

/// Joiner used by the host engine in node ids
pub const NODEID_SEPARATOR: &str = "::";

/// Split a node id into its ancestor scope segments and the leaf segment.
///
/// The first segment (the file path) is dropped, as are instance markers.
pub fn split_nodeid(nodeid: &str) -> (Vec<&str>, &str) {
    let mut segments = nodeid.split(NODEID_SEPARATOR);
    // File path
    segments.next();
    let mut headers: Vec<&str> = segments.filter(|s| *s != INSTANCE_MARKER).collect();
    match headers.pop() {
        Some(leaf) => (headers, leaf),
        None => (Vec::new(), nodeid),
    }
}

/// Strip one leading or trailing test-marker affix.
///
/// `test_the_stuff` -> `the_stuff`, `TestSomeStuff` -> `SomeStuff`,
/// `the_stuff_test` -> `the_stuff`, `SomeStuffTest` -> `SomeStuff`.
/// A segment is never stripped down to nothing, and `Test` only counts as a
/// prefix when a new word follows it (`Testimony` stays intact).
pub fn strip_marker_affix(segment: &str) -> &str {
    if let Some(rest) = segment.strip_prefix("test_").filter(|r| !r.is_empty()) {
        return rest;
    }
    if let Some(rest) = segment.strip_prefix("Test") {
        let starts_word = rest
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        let rest = rest.trim_start_matches('_');
        if starts_word && !rest.is_empty() {
            return rest;
        }
    }
    if let Some(rest) = segment.strip_suffix("_test").filter(|r| !r.is_empty()) {
        return rest;
    }
    if let Some(rest) = segment.strip_suffix("Test").filter(|r| !r.is_empty()) {
        return rest;
    }
    segment
}

/// Human readable form of a node id segment
pub fn display_name(segment: &str) -> String {
    strip_marker_affix(segment).replace('_', " ")
}
