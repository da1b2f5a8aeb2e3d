//! Local HTML-to-text conversion, used when the reader service fails
//!
//! The output approximates lightweight markdown: the title as `# title`,
//! short standalone lines as `## ` headings, and colon-terminated lines as
//! `### ` subheadings.

use super::fetcher::{build_http_client, fetch_page};
use super::ConvertError;
use reqwest::Client;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// Elements whose content is never page text
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "nav", "footer", "header", "iframe",
];

/// Elements that start and end a line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol",
    "p", "pre", "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Longest line (in characters) that may become a heading
const MAX_HEADING_CHARS: usize = 60;

/// Most words a heading may have
const MAX_HEADING_WORDS: usize = 8;

/// Fetches pages directly and converts their HTML to text
#[derive(Debug, Clone)]
pub struct HtmlFallback {
    client: Client,
}

impl HtmlFallback {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ConvertError> {
        Ok(Self {
            client: build_http_client(user_agent, timeout)?,
        })
    }

    /// Fetches `url` and converts it
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Non-empty text
    /// * `Err(ConvertError)` - Fetch failed or the page has no text
    pub async fn convert(&self, url: &str) -> Result<String, ConvertError> {
        let page = fetch_page(&self.client, url).await?;
        if !page.is_html() {
            tracing::debug!(
                "Fallback fetch of {} returned {}; converting anyway",
                page.final_url,
                page.content_type
            );
        }

        let text = html_to_text(&page.body);
        if text.trim().is_empty() {
            return Err(ConvertError::Empty);
        }
        Ok(text)
    }
}

/// Converts an HTML document to heading-tagged text
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    if let Some(title) = extract_title(&document) {
        lines.push(format!("# {}", title));
    }

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut raw = Vec::new();
    let mut current = String::new();
    collect_lines(body, &mut raw, &mut current);
    flush_line(&mut raw, &mut current);

    lines.extend(raw.into_iter().map(|line| tag_line(&line)));
    lines.join("\n")
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|title| collapse_whitespace(&title.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

fn collect_lines(element: ElementRef<'_>, lines: &mut Vec<String>, current: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => current.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };

                let block = BLOCK_TAGS.contains(&name);
                if block {
                    flush_line(lines, current);
                } else {
                    current.push(' ');
                }
                collect_lines(child, lines, current);
                if block {
                    flush_line(lines, current);
                } else {
                    current.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = collapse_whitespace(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Re-tags one line as a heading or subheading where it looks like one
pub fn tag_line(line: &str) -> String {
    if line.ends_with(':') {
        return format!("### {}", line);
    }

    let is_short = line.chars().count() <= MAX_HEADING_CHARS
        && line.split_whitespace().count() <= MAX_HEADING_WORDS;
    let ends_sentence = line.ends_with(['.', '!', '?', ',', ';']);

    if is_short && !ends_sentence {
        format!("## {}", line)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html>
  <head>
    <title> Careers at Example </title>
    <style>body { color: red; }</style>
  </head>
  <body>
    <header><a href="/">Home</a></header>
    <nav><a href="/about">About</a></nav>
    <main>
      <h1>Senior   Backend Engineer</h1>
      <p>We are looking for an engineer to build and operate our payment platform.</p>
      <p>Requirements:</p>
      <ul><li>Five years of <b>Rust</b> experience.</li></ul>
      <script>var tracking = true;</script>
    </main>
    <footer>Copyright Example Inc</footer>
  </body>
</html>"#;

    #[test]
    fn test_html_to_text_structure() {
        let text = html_to_text(PAGE);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# Careers at Example");
        assert_eq!(lines[1], "## Senior Backend Engineer");
        assert_eq!(
            lines[2],
            "We are looking for an engineer to build and operate our payment platform."
        );
        assert_eq!(lines[3], "### Requirements:");
        assert_eq!(lines[4], "Five years of Rust experience.");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_chrome_and_scripts_are_dropped() {
        let text = html_to_text(PAGE);
        assert!(!text.contains("Home"));
        assert!(!text.contains("About"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_tag_line() {
        assert_eq!(tag_line("Benefits:"), "### Benefits:");
        assert_eq!(tag_line("Our Team"), "## Our Team");
        assert_eq!(tag_line("We ship software."), "We ship software.");
        assert_eq!(
            tag_line("one two three four five six seven eight nine"),
            "one two three four five six seven eight nine"
        );
    }

    #[test]
    fn test_document_without_body_content() {
        assert_eq!(html_to_text("<html><head><title>Empty</title></head></html>"), "# Empty");
        assert_eq!(html_to_text(""), "");
    }
}
