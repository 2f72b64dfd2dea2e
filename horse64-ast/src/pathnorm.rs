//! Separator-normalizing path collapse, shared by file-URI interning
//! (`horse64-program::program::Program::intern_file_uri`) and module-path
//! derivation (`horse64-resolve`'s first resolver pass).
//!
//! `..` only cancels a preceding real segment; a leading (or
//! otherwise unresolvable) `..` is kept literally, which is what
//! makes the function idempotent: re-running it over
//! its own output can never find a fresh cancellation to perform.

/// Collapses `.`/empty segments and resolves `..` against the
/// preceding segment where possible, using `/` as the separator
/// regardless of the host platform.
pub fn normalize(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => match stack.last() {
                Some(&top) if top != ".." => {
                    stack.pop();
                }
                _ => stack.push(".."),
            },
            other => stack.push(other),
        }
    }

    stack.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_double_slashes_and_dot_segments() {
        assert_eq!(normalize("u//abc/def/..u/../.."), "u/abc");
    }

    #[test]
    fn preserves_unresolvable_leading_parent() {
        assert_eq!(normalize("../abc/def/..u/../.."), "../abc");
    }

    #[test]
    fn is_idempotent() {
        for input in ["u//abc/def/..u/../..", "../abc/def/..u/../..", "a/b/c", ".."] {
            let once = normalize(input);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    proptest::proptest! {
        #[test]
        fn idempotent_over_arbitrary_segment_soup(
            segments in proptest::collection::vec("[a-z]{0,3}|\\.\\.|\\.", 0..8)
        ) {
            let input = segments.join("/");
            let once = normalize(&input);
            let twice = normalize(&once);
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
