//! Pure display helpers for selection patterns and counts.

use crate::model::SelectionPattern;

/// Render a selection pattern for humans.
///
/// The quoted form is preferred when the raw input is being matched
/// literally and equals the effective pattern; a distinct pattern, or input
/// explicitly flagged as a pattern, is shown slash-delimited.
pub fn format_pattern(pattern: &SelectionPattern) -> String {
    if pattern.input == pattern.test_path_pattern {
        if pattern.treat_input_as_pattern {
            format!("/{}/", pattern.input)
        } else {
            format!("\"{}\"", pattern.input)
        }
    } else {
        format!("/{}/", pattern.test_path_pattern)
    }
}

/// `1 file`, `0 files`, `2 matches`. Only a count of exactly 1 goes
/// unsuffixed.
pub fn pluralize(word: &str, count: usize, suffix: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(input: &str, test_path_pattern: &str, treat_input_as_pattern: bool) -> SelectionPattern {
        SelectionPattern {
            input: input.into(),
            test_path_pattern: test_path_pattern.into(),
            treat_input_as_pattern,
            only_changed: false,
            watch: false,
            skip_scm: false,
        }
    }

    #[test]
    fn equal_input_is_quoted() {
        assert_eq!(format_pattern(&pattern("foo", "foo", false)), "\"foo\"");
    }

    #[test]
    fn equal_input_flagged_as_pattern_is_slash_delimited() {
        assert_eq!(format_pattern(&pattern("foo", "foo", true)), "/foo/");
    }

    #[test]
    fn distinct_pattern_is_slash_delimited() {
        assert_eq!(format_pattern(&pattern("raw", "r.w", false)), "/r.w/");
    }

    #[test]
    fn empty_pattern_still_formats() {
        assert_eq!(format_pattern(&pattern("", "", false)), "\"\"");
        assert_eq!(format_pattern(&pattern("", "", true)), "//");
    }

    #[test]
    fn pluralize_one_is_unsuffixed() {
        assert_eq!(pluralize("file", 1, "s"), "1 file");
        assert_eq!(pluralize("match", 1, "es"), "1 match");
    }

    #[test]
    fn pluralize_zero_and_many_take_suffix() {
        assert_eq!(pluralize("file", 0, "s"), "0 files");
        assert_eq!(pluralize("file", 2, "s"), "2 files");
        assert_eq!(pluralize("match", 0, "es"), "0 matches");
    }
}
