//! Bounded-size prompt context: source URL, any heuristic hints, and a
//! boilerplate-stripped text rendering of the page.

use scraper::{ElementRef, Html, Node};

use crate::normalize::structured::RawScrape;

/// How many heuristic ingredient/step lines make it into the prompt
const HINT_LINE_CAP: usize = 40;

/// Everything the LLM strategies need, assembled synchronously before
/// any model call so no DOM handle crosses a suspension point.
#[derive(Debug, Clone)]
pub struct LlmInputs {
    pub url: String,
    pub hints: RawScrape,
    pub page_text: String,
}

impl LlmInputs {
    /// `html` is the reader-simplified article when available, else the
    /// raw page.
    pub fn assemble(url: &str, hints: RawScrape, html: &str) -> Self {
        LlmInputs {
            url: url.to_string(),
            hints,
            page_text: strip_page_text(html),
        }
    }
}

/// Render a page as plain text: scripts, styles and hidden elements
/// dropped, block boundaries as newlines, blank runs collapsed.
pub fn strip_page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<String> = Vec::new();
    let mut current = Vec::new();
    collect_text(&document.root_element(), &mut lines, &mut current);
    flush_block(&mut lines, &mut current);
    lines.join("\n")
}

fn flush_block(lines: &mut Vec<String>, current: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let merged = current.join(" ").trim().to_string();
    if !merged.is_empty() {
        lines.push(merged);
    }
    current.clear();
}

fn collect_text(element: &ElementRef, lines: &mut Vec<String>, current: &mut Vec<String>) {
    if should_skip(element) {
        return;
    }
    let tag = element.value().name();
    if tag == "br" {
        flush_block(lines, current);
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    current.push(collapsed);
                }
            }
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, lines, current);
                }
            }
            _ => {}
        }
    }
    if is_block_element(tag) {
        flush_block(lines, current);
    }
}

fn should_skip(element: &ElementRef) -> bool {
    let tag = element.value().name();
    if matches!(
        tag,
        "script" | "style" | "noscript" | "iframe" | "svg" | "canvas" | "template"
    ) {
        return true;
    }
    element.value().attr("hidden").is_some()
        || element
            .value()
            .attr("style")
            .map(|s| s.contains("display: none") || s.contains("visibility: hidden"))
            .unwrap_or(false)
}

fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "article"
            | "aside"
            | "blockquote"
            | "div"
            | "dd"
            | "dt"
            | "figcaption"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "section"
            | "table"
            | "tr"
            | "ul"
    )
}

/// Build the user message within a character budget. The page text takes
/// whatever room the hints leave.
pub fn build_user_context(inputs: &LlmInputs, char_budget: usize) -> String {
    let mut out = format!("Source URL: {}\n", inputs.url);
    if let Some(title) = &inputs.hints.title {
        out.push_str(&format!("Page title: {title}\n"));
    }
    if !inputs.hints.ingredients.is_empty() {
        out.push_str("\nIngredient candidates:\n");
        for line in inputs.hints.ingredients.iter().take(HINT_LINE_CAP) {
            out.push_str(&format!("- {line}\n"));
        }
    }
    if !inputs.hints.steps.is_empty() {
        out.push_str("\nStep candidates:\n");
        for (i, line) in inputs.hints.steps.iter().take(HINT_LINE_CAP).enumerate() {
            out.push_str(&format!("{}. {line}\n", i + 1));
        }
    }
    out.push_str("\nPage text:\n");
    out.push_str(&inputs.page_text);
    truncate_chars(&out, char_budget)
}

fn truncate_chars(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_page_text_drops_boilerplate() {
        let html = r#"
            <html><head><style>body { color: red; }</style></head><body>
            <script>console.log('skip');</script>
            <div>Visible content</div>
            <div hidden>Hidden</div>
            <p>More content</p>
            </body></html>"#;
        let text = strip_page_text(html);
        assert!(text.contains("Visible content"));
        assert!(text.contains("More content"));
        assert!(!text.contains("skip"));
        assert!(!text.contains("Hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_context_respects_char_budget() {
        let inputs = LlmInputs {
            url: "https://example.com".to_string(),
            hints: RawScrape::default(),
            page_text: "x".repeat(10_000),
        };
        let context = build_user_context(&inputs, 500);
        assert_eq!(context.chars().count(), 500);
    }

    #[test]
    fn test_hints_are_capped_and_numbered() {
        let inputs = LlmInputs {
            url: "https://example.com".to_string(),
            hints: RawScrape {
                title: Some("Big Recipe".to_string()),
                image: None,
                ingredients: (0..60).map(|i| format!("ingredient {i}")).collect(),
                steps: vec!["first".to_string(), "second".to_string()],
            },
            page_text: String::new(),
        };
        let context = build_user_context(&inputs, 100_000);
        assert!(context.contains("Page title: Big Recipe"));
        assert!(context.contains("- ingredient 39"));
        assert!(!context.contains("- ingredient 40"));
        assert!(context.contains("1. first"));
        assert!(context.contains("2. second"));
    }
}
