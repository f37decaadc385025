//! Usage: Decide whether a study agent reply carries structured content worth rich rendering.

/// Markdown / emoji markers the study agent uses when it produces a real
/// study guide rather than a one-line answer.
const STRUCTURE_MARKERS: [&str; 11] = [
    "##", "**", "1.", "2.", "•", "* ", "```", "📚", "🚀", "🎯", "✨",
];

pub(crate) fn has_structured_content(text: &str) -> bool {
    STRUCTURE_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Top-level headings, for a table-of-contents style sidebar.
pub(crate) fn section_titles(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            let title = trimmed
                .strip_prefix("### ")
                .or_else(|| trimmed.strip_prefix("## "))
                .or_else(|| trimmed.strip_prefix("# "))?;
            let title = title.trim();
            if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_sentences_are_unstructured() {
        assert!(!has_structured_content(
            "Sure, ask me anything about linear algebra when you are ready"
        ));
    }

    #[test]
    fn markdown_headings_and_lists_are_structured() {
        assert!(has_structured_content("## Week 1\n1. Vectors\n2. Matrices"));
        assert!(has_structured_content("Focus on **ownership** first"));
        assert!(has_structured_content("```rust\nlet x = 5;\n```"));
    }

    #[test]
    fn study_emoji_count_as_structure() {
        assert!(has_structured_content("Great progress today! 🎯"));
    }

    #[test]
    fn section_titles_collects_headings_in_order() {
        let text = "# Plan\nintro\n## Week 1\nstuff\n### Day 2\nmore\nnot a heading";
        assert_eq!(section_titles(text), vec!["Plan", "Week 1", "Day 2"]);
    }

    #[test]
    fn section_titles_skips_empty_headings() {
        assert_eq!(section_titles("## \ntext"), Vec::<String>::new());
    }
}
