/// Strip markdown bold (`**x**`) and italic (`*x*`) delimiters from model output.
///
/// Pairs are matched lazily, left to right, and never across a line break. Bold pairs are
/// removed first, then italic pairs. After both passes every line holds at most one `*`, so
/// applying the function again is a no-op.
pub fn strip_markdown_emphasis(text: &str) -> String {
    text.split('\n')
        .map(|line| strip_pairs(&strip_pairs(line, "**"), "*"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_pairs(line: &str, delim: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find(delim) {
        let after_open = &rest[open + delim.len()..];
        match after_open.find(delim) {
            Some(close) => {
                out.push_str(&rest[..open]);
                out.push_str(&after_open[..close]);
                rest = &after_open[close + delim.len()..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::strip_markdown_emphasis;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_bold_and_italic() {
        assert_eq!(strip_markdown_emphasis("**bold** and *italic*"), "bold and italic");
    }

    #[test]
    fn is_idempotent_on_awkward_input() {
        for input in [
            "**bold** and *italic*",
            "***",
            "* a ** b",
            "**a",
            "****",
            "1. **Domain Knowledge**: grid *storage*\n* bullet item",
            "no emphasis at all",
        ] {
            let once = strip_markdown_emphasis(input);
            assert_eq!(strip_markdown_emphasis(&once), once, "input={input:?}");
        }
    }

    #[test]
    fn does_not_pair_across_lines() {
        assert_eq!(strip_markdown_emphasis("* one\n* two"), "* one\n* two");
    }

    #[test]
    fn lone_delimiters_survive() {
        assert_eq!(strip_markdown_emphasis("5 * 3 = 15"), "5 * 3 = 15");
        assert_eq!(strip_markdown_emphasis("***"), "*");
    }
}
