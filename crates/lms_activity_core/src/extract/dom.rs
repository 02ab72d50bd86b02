//! Narrow document accessor used by the extraction engine.
//!
//! # Responsibility
//! - Hide the concrete document behind locate/read-text/read-attribute calls.
//! - Provide the `scraper`-backed implementation over parsed HTML.
//!
//! # Invariants
//! - Selector queries on a scope only return descendants, never the scope.
//! - `text_content` keeps raw whitespace, matching browser `textContent`.

use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;

pub type DomResult<T> = Result<T, DomError>;

/// Failure while evaluating a selector or reading a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    InvalidSelector { selector: String, message: String },
    NodeAccess(String),
}

impl Display for DomError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSelector { selector, message } => {
                write!(f, "invalid selector `{selector}`: {message}")
            }
            Self::NodeAccess(message) => write!(f, "node access failed: {message}"),
        }
    }
}

impl Error for DomError {}

/// Read-only view over a page document.
pub trait DocumentAccessor {
    /// Cheap node handle.
    type Node: Copy;

    /// Absolute URL of the page; base for resolving relative links.
    fn page_url(&self) -> &str;

    /// All elements matching `selector`, in document order.
    fn select_all(&self, selector: &str) -> DomResult<Vec<Self::Node>>;

    /// Descendants of `scope` matching `selector`, in document order.
    fn select_within(&self, scope: Self::Node, selector: &str) -> DomResult<Vec<Self::Node>>;

    fn text_content(&self, node: Self::Node) -> DomResult<String>;

    fn attr(&self, node: Self::Node, name: &str) -> DomResult<Option<String>>;

    /// Lowercase element name.
    fn tag_name(&self, node: Self::Node) -> DomResult<String>;

    fn select_first_within(
        &self,
        scope: Self::Node,
        selector: &str,
    ) -> DomResult<Option<Self::Node>> {
        Ok(self.select_within(scope, selector)?.into_iter().next())
    }

    /// Resolves `href` against the page URL; unresolvable input is returned trimmed.
    fn resolve_url(&self, href: &str) -> String {
        let href = href.trim();
        Url::parse(self.page_url())
            .and_then(|base| base.join(href))
            .map(|resolved| resolved.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}

/// Owned parsed page.
pub struct HtmlPage {
    html: Html,
    url: String,
}

impl HtmlPage {
    pub fn parse(html: &str, url: impl Into<String>) -> Self {
        Self {
            html: Html::parse_document(html),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn accessor(&self) -> HtmlDocument<'_> {
        HtmlDocument {
            html: &self.html,
            url: &self.url,
        }
    }
}

/// `scraper`-backed accessor borrowing an `HtmlPage`.
#[derive(Clone, Copy)]
pub struct HtmlDocument<'a> {
    html: &'a Html,
    url: &'a str,
}

fn compile(selector: &str) -> DomResult<Selector> {
    Selector::parse(selector).map_err(|err| DomError::InvalidSelector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

impl<'a> DocumentAccessor for HtmlDocument<'a> {
    type Node = ElementRef<'a>;

    fn page_url(&self) -> &str {
        self.url
    }

    fn select_all(&self, selector: &str) -> DomResult<Vec<Self::Node>> {
        let compiled = compile(selector)?;
        Ok(self.html.select(&compiled).collect())
    }

    fn select_within(&self, scope: Self::Node, selector: &str) -> DomResult<Vec<Self::Node>> {
        let compiled = compile(selector)?;
        Ok(scope.select(&compiled).collect())
    }

    fn text_content(&self, node: Self::Node) -> DomResult<String> {
        Ok(node.text().collect())
    }

    fn attr(&self, node: Self::Node, name: &str) -> DomResult<Option<String>> {
        Ok(node.value().attr(name).map(str::to_string))
    }

    fn tag_name(&self, node: Self::Node) -> DomResult<String> {
        Ok(node.value().name().to_ascii_lowercase())
    }
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{compact_ws, DocumentAccessor, DomError, HtmlPage};

    const PAGE: &str = r#"<html><body>
        <ul class="section">
          <li class="activity"><a href="/mod/assign/view.php?id=3">Essay
             One</a></li>
        </ul>
    </body></html>"#;

    #[test]
    fn select_within_excludes_scope() {
        let page = HtmlPage::parse(PAGE, "https://lms.example.edu/course/view.php?id=9");
        let doc = page.accessor();
        let items = doc.select_all("li.activity").unwrap();
        assert_eq!(items.len(), 1);
        assert!(doc.select_within(items[0], "li").unwrap().is_empty());
        assert_eq!(doc.select_within(items[0], "a").unwrap().len(), 1);
    }

    #[test]
    fn resolve_url_joins_relative_links() {
        let page = HtmlPage::parse(PAGE, "https://lms.example.edu/course/view.php?id=9");
        assert_eq!(page.url(), "https://lms.example.edu/course/view.php?id=9");
        let doc = page.accessor();
        assert_eq!(
            doc.resolve_url("/mod/assign/view.php?id=3"),
            "https://lms.example.edu/mod/assign/view.php?id=3"
        );
    }

    #[test]
    fn text_content_keeps_raw_whitespace() {
        let page = HtmlPage::parse(PAGE, "https://lms.example.edu/");
        let doc = page.accessor();
        let link = doc.select_all("a").unwrap()[0];
        let text = doc.text_content(link).unwrap();
        assert!(text.contains('\n'));
        assert_eq!(compact_ws(&text), "Essay One");
    }

    #[test]
    fn invalid_selector_is_reported_not_panicked() {
        let page = HtmlPage::parse(PAGE, "https://lms.example.edu/");
        let err = page.accessor().select_all("li[[").unwrap_err();
        assert!(matches!(err, DomError::InvalidSelector { .. }));
    }
}
