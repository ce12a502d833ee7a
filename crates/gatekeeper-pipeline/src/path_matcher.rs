//! Ant-style path patterns.
//!
//! - `?` matches one character within a segment
//! - `*` matches zero or more characters within a segment
//! - `**` matches zero or more whole segments
//!
//! `/api/**` therefore matches `/api`, `/api/x` and `/api/x/y`.

/// Returns whether `path` matches the Ant-style `pattern`.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    if pattern.starts_with('/') != path.starts_with('/') {
        return false;
    }

    let pattern: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match_segments(&pattern, &path)
}

/// Segment-level counterpart of [`segment_matches`]: `**` absorbs whole
/// segments and only the most recent `**` is ever backtracked to, so a
/// mismatch costs at most `pattern.len() * path.len()` segment comparisons.
fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < path.len() {
        if pi < pattern.len() && pattern[pi] == "**" {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < pattern.len() && segment_matches(pattern[pi], path[ti]) {
            pi += 1;
            ti += 1;
        } else if let Some((globstar, absorbed)) = backtrack {
            pi = globstar + 1;
            ti = absorbed + 1;
            backtrack = Some((globstar, absorbed + 1));
        } else {
            return false;
        }
    }

    pattern[pi..].iter().all(|&s| s == "**")
}

fn segment_matches(pattern: &str, text: &str) -> bool {
    if !pattern.contains(['*', '?']) {
        return pattern == text;
    }

    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    // Position of the last `*` seen and the text index it currently absorbs up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, absorbed)) = backtrack {
            pi = star + 1;
            ti = absorbed + 1;
            backtrack = Some((star, absorbed + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_literal_paths() {
        assert!(path_matches("/api/health", "/api/health"));
        assert!(!path_matches("/api/health", "/api/healthz"));
        assert!(!path_matches("/api/health", "/api"));
        assert!(path_matches("/", "/"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        assert!(path_matches("/api/*/x", "/api/a/x"));
        assert!(!path_matches("/api/*/x", "/api/a/b/x"));
        assert!(path_matches("/static/*.css", "/static/site.css"));
        assert!(!path_matches("/static/*.css", "/static/site.js"));
        assert!(path_matches("/api/*", "/api/anything"));
        assert!(!path_matches("/api/*", "/api/a/b"));
    }

    #[test]
    fn test_question_mark() {
        assert!(path_matches("/v?/users", "/v1/users"));
        assert!(!path_matches("/v?/users", "/v10/users"));
    }

    #[test]
    fn test_double_star_spans_segments() {
        assert!(path_matches("/api/auth/**", "/api/auth/login"));
        assert!(path_matches("/api/auth/**", "/api/auth"));
        assert!(path_matches("/api/auth/**", "/api/auth/a/b/c"));
        assert!(!path_matches("/api/auth/**", "/api/admin/filters"));
        assert!(path_matches("/api/**/detail", "/api/detail"));
        assert!(path_matches("/api/**/detail", "/api/a/b/detail"));
        assert!(!path_matches("/api/**/detail", "/api/a/b/details"));
        assert!(path_matches("/**", "/anything/at/all"));
    }

    #[test]
    fn test_repeated_double_star() {
        assert!(path_matches("/**/**/z", "/a/b/z"));
        assert!(path_matches("/**/**/z", "/z"));
        assert!(path_matches("/a/**/b/**/c", "/a/x/b/y/z/c"));
        assert!(path_matches("/a/**/b/**/c", "/a/b/c"));
        assert!(!path_matches("/a/**/b/**/c", "/a/c/b"));
        assert!(path_matches("/**/*.css", "/static/themes/site.css"));
    }

    #[test]
    fn test_double_star_mismatch_is_linear() {
        let path = "/a".repeat(40);
        let pattern = format!("{}/z", "/**".repeat(6));

        let started = Instant::now();
        assert!(!path_matches(&pattern, &path));
        assert!(!path_matches("/**/a/**/a/**/a/**/a/**/z", &path));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_star_backtracking() {
        assert!(path_matches("/files/a*b*c", "/files/aXbYbZc"));
        assert!(!path_matches("/files/a*b*c", "/files/aXbYbZ"));
    }

    #[test]
    fn test_leading_slash_must_agree() {
        assert!(!path_matches("api/**", "/api/x"));
        assert!(path_matches("api/**", "api/x"));
    }
}
