// Prompt cleaning and normalization
//
// Normalizes raw user text before it is sent to a model: strips literal
// backslashes, turns tabs into spaces and collapses whitespace runs.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("static whitespace regex is valid"));

/// Options for [`clean_prompt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    /// Remove every `\` character
    pub remove_backslashes: bool,
    /// Collapse runs of whitespace into a single separator
    pub collapse_whitespace: bool,
    /// Keep line breaks when collapsing (a run containing a newline becomes one `\n`)
    pub preserve_newlines: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            remove_backslashes: true,
            collapse_whitespace: true,
            preserve_newlines: false,
        }
    }
}

impl CleanOptions {
    /// Defaults, but keep line structure
    pub fn preserving_newlines() -> Self {
        Self {
            preserve_newlines: true,
            ..Self::default()
        }
    }
}

/// Normalize a raw prompt string for an LLM.
///
/// Tabs always become spaces and the result is trimmed. With
/// `preserve_newlines`, a whitespace run that contains at least one newline
/// collapses to a single `\n`; every other run collapses to a single space.
pub fn clean_prompt(prompt: &str, options: CleanOptions) -> String {
    if prompt.is_empty() {
        return String::new();
    }

    let mut text = if options.remove_backslashes {
        prompt.replace('\\', "")
    } else {
        prompt.to_string()
    };

    text = text.replace('\t', " ");

    if options.collapse_whitespace {
        text = if options.preserve_newlines {
            WHITESPACE_RUN
                .replace_all(&text, |caps: &Captures| {
                    if caps[0].contains('\n') {
                        "\n"
                    } else {
                        " "
                    }
                })
                .into_owned()
        } else {
            WHITESPACE_RUN.replace_all(&text, " ").into_owned()
        };
    }

    text.trim().to_string()
}

/// [`clean_prompt`] with default options
pub fn normalize(prompt: &str) -> String {
    clean_prompt(prompt, CleanOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(clean_prompt("", CleanOptions::preserving_newlines()), "");
    }

    #[test]
    fn test_default_flattens_everything() {
        assert_eq!(normalize("  what \\is\t\tthis\n\n thing?  "), "what is this thing?");
    }

    #[test]
    fn test_preserve_newlines_example() {
        let out = clean_prompt("a\\b\t\tc\n\n d", CleanOptions::preserving_newlines());
        assert_eq!(out, "ab c\nd");
    }

    #[test]
    fn test_preserve_newlines_keeps_line_structure() {
        let out = clean_prompt(
            "line one  \n  line   two\nline three",
            CleanOptions::preserving_newlines(),
        );
        assert_eq!(out, "line one\nline two\nline three");
        assert_eq!(out.matches('\n').count(), 2);
    }

    #[test]
    fn test_keep_backslashes() {
        let options = CleanOptions {
            remove_backslashes: false,
            ..CleanOptions::default()
        };
        assert_eq!(clean_prompt(r"C:\temp\x", options), r"C:\temp\x");
    }

    #[test]
    fn test_no_collapse_still_converts_tabs_and_trims() {
        let options = CleanOptions {
            collapse_whitespace: false,
            ..CleanOptions::default()
        };
        assert_eq!(clean_prompt("\ta\t\tb  \n", options), "a  b");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "plain",
            "  spaced   out  ",
            "tabs\t\tand\nnewlines\n\n\n",
            "back\\slash \\\\ heavy",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);

            let once = clean_prompt(input, CleanOptions::preserving_newlines());
            assert_eq!(clean_prompt(&once, CleanOptions::preserving_newlines()), once);
        }
    }
}
