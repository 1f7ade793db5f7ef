//! Builds the message shown when discovery finds zero tests.
//!
//! Pure string construction; the caller decides where it goes.

use crate::discovery::ContextMatch;
use crate::format::{format_pattern, pluralize};
use crate::model::{ContextConfig, GlobalConfig, SelectionPattern};
use owo_colors::OwoColorize;

/// Render the configured value behind a stat key, or `None` when the stat
/// should be suppressed (unknown key, empty config list, or a `roots` stat
/// on a single-root config).
fn configured_value(key: &str, config: &ContextConfig) -> Option<String> {
    let values: Vec<String> = match key {
        "roots" => {
            if config.roots.len() <= 1 {
                return None;
            }
            config
                .roots
                .iter()
                .map(|p| p.display().to_string())
                .collect()
        }
        "test_match" => config.test_match.clone(),
        "ignore_patterns" => config.ignore_patterns.clone(),
        _ => return None,
    };
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

fn context_block(run_data: &ContextMatch) -> String {
    let config = &run_data.context.config;
    let matches = &run_data.matches;

    if matches.total == 0 {
        return format!(
            "No files found in {}.\nMake sure the roots and test_match settings in this \
             project's configuration cover the files you expect.",
            config.root_dir.display()
        );
    }

    let mut lines = vec![
        format!("In {}", config.root_dir.display()),
        format!("  {} checked.", pluralize("file", matches.total, "s")),
    ];
    for (key, count) in &matches.stats {
        if let Some(value) = configured_value(key, config) {
            lines.push(format!(
                "  {}: {} - {}",
                key,
                value,
                pluralize("match", *count, "es")
            ));
        }
    }
    lines.join("\n")
}

/// The full no-tests-found message for one run.
pub fn no_tests_message(
    run_data: &[ContextMatch],
    pattern: &SelectionPattern,
    global: &GlobalConfig,
) -> String {
    if pattern.only_changed {
        let hint = if global.watch {
            "Press `a` to run all tests, or run again with `--watch-all`."
        } else {
            "Run again without the changed-only flag to run all tests."
        };
        return format!(
            "No tests found related to files changed since last commit.\n{hint}"
        );
    }

    let mut message = format!("{}", "No tests found".bold());
    for data in run_data {
        message.push('\n');
        message.push_str(&context_block(data));
    }
    message.push_str(&format!(
        "\nPattern: {} - 0 matches",
        format_pattern(pattern)
    ));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchSet, ProjectContext};
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn pattern() -> SelectionPattern {
        SelectionPattern {
            input: "nope".into(),
            test_path_pattern: "nope".into(),
            treat_input_as_pattern: false,
            only_changed: false,
            watch: false,
            skip_scm: false,
        }
    }

    fn context(roots: usize) -> Arc<ProjectContext> {
        let root_list = (0..roots).map(|i| PathBuf::from(format!("/proj/r{i}"))).collect();
        Arc::new(ProjectContext::new(
            ContextConfig {
                root_dir: PathBuf::from("/proj"),
                roots: root_list,
                test_match: vec![".test.js".into()],
                ignore_patterns: vec![],
                runner_argv: vec!["node".into()],
            },
            None,
        ))
    }

    fn match_data(context: Arc<ProjectContext>, total: usize) -> ContextMatch {
        let mut stats = BTreeMap::new();
        stats.insert("roots".to_string(), total);
        stats.insert("test_match".to_string(), 1);
        ContextMatch {
            context,
            matches: MatchSet {
                tests: vec![],
                stats,
                total,
                no_scm: false,
            },
        }
    }

    #[test]
    fn changed_only_message_depends_on_watch() {
        let p = SelectionPattern {
            only_changed: true,
            ..pattern()
        };
        let idle = no_tests_message(&[], &p, &GlobalConfig::default());
        assert!(idle.starts_with("No tests found related to files changed since last commit."));
        assert!(idle.contains("without the changed-only flag"));

        let watching = no_tests_message(
            &[],
            &p,
            &GlobalConfig {
                watch: true,
                ..GlobalConfig::default()
            },
        );
        assert!(watching.contains("--watch-all"));
    }

    #[test]
    fn one_block_per_context_plus_header_and_footer() {
        let n = 4;
        let run_data: Vec<ContextMatch> =
            (0..n).map(|_| match_data(context(1), 0)).collect();
        let message = no_tests_message(&run_data, &pattern(), &GlobalConfig::default());
        assert!(message.contains("No tests found"));
        assert_eq!(
            message.matches("No files found in /proj.").count(),
            n
        );
        assert!(message.ends_with("Pattern: \"nope\" - 0 matches"));
    }

    #[test]
    fn checked_line_is_pluralized() {
        let message = no_tests_message(
            &[match_data(context(1), 1)],
            &pattern(),
            &GlobalConfig::default(),
        );
        assert!(message.contains("1 file checked."));

        let message = no_tests_message(
            &[match_data(context(1), 7)],
            &pattern(),
            &GlobalConfig::default(),
        );
        assert!(message.contains("7 files checked."));
    }

    #[test]
    fn roots_stat_suppressed_for_single_root() {
        let message = no_tests_message(
            &[match_data(context(1), 3)],
            &pattern(),
            &GlobalConfig::default(),
        );
        assert!(!message.contains("roots:"));
        assert!(message.contains("test_match: .test.js - 1 match\n"));

        let message = no_tests_message(
            &[match_data(context(2), 3)],
            &pattern(),
            &GlobalConfig::default(),
        );
        assert!(message.contains("roots: /proj/r0, /proj/r1 - 3 matches"));
    }

    #[test]
    fn slash_form_in_footer_when_pattern_is_distinct() {
        let p = SelectionPattern {
            test_path_pattern: "n.pe".into(),
            ..pattern()
        };
        let message = no_tests_message(&[], &p, &GlobalConfig::default());
        assert!(message.ends_with("Pattern: /n.pe/ - 0 matches"));
    }
}
