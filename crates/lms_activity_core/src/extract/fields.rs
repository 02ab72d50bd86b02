//! Per-candidate field extraction.
//!
//! # Responsibility
//! - Resolve title, type, link and raw deadline text for one candidate node.
//! - Parse tabular rows, whose layout differs from list-style activities.
//!
//! # Invariants
//! - Pure reads: nodes are never mutated.
//! - A candidate without a non-empty title produces no record.
//! - Selector groups are tried in order; the first group with a match wins.

use crate::extract::date::looks_like_date;
use crate::extract::dom::{compact_ws, DocumentAccessor, DomResult};
use crate::model::activity::ActivityType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Heading and link selectors that usually carry an activity name.
pub const TITLE_SELECTORS: &[&str] = &[
    "h3, h4, .title, .name, .activitytitle, .assignment-title",
    r#"a[href*="assign"], a[href*="quiz"], a[href*="mod"]"#,
    ".instancename, .activityname",
];

/// Elements that usually carry a deadline label.
pub const DEADLINE_SELECTORS: &[&str] = &[
    ".deadline, .due-date, .due, .submission-date",
    "time[datetime], .date, .deadline-date",
    r#"[class*="deadline"], [class*="due"], [class*="submission"]"#,
    ".text-muted, .small",
];

/// `(type, url/class keyword, title keyword)` in priority order.
const TYPE_KEYWORDS: &[(ActivityType, &str, &str)] = &[
    (ActivityType::Assignment, "assign", "assign"),
    (ActivityType::Quiz, "quiz", "quiz"),
    (ActivityType::Exam, "exam", "exam"),
    (ActivityType::Project, "project", "project"),
    (ActivityType::Reading, "resource", "reading"),
];

/// Table rows only distinguish the first four categories.
const TABLE_TYPE_KEYWORDS: usize = 4;

const DATE_SHAPE: &str = r"\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}|\d{4}[/\-]\d{1,2}[/\-]\d{1,2}|\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+\d{4}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}";

static DATE_IN_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:(?:due|deadline|submission)[^\n]*?(?:on|by|:)\s*)?(?P<when>(?:{DATE_SHAPE})(?:,?\s+\d{{1,2}}:\d{{2}}(?:\s*[ap]\.?m\.?)?)?)"
    ))
    .expect("valid date-in-text regex")
});
static BARE_NUMERIC_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}|\d{4}[/\-]\d{1,2}[/\-]\d{1,2}")
        .expect("valid bare date regex")
});
static DEADLINE_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)due|deadline|submission").expect("valid keyword regex"));

/// Raw fields resolved for one list-style candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFields {
    /// Untruncated, whitespace-compacted title.
    pub title: String,
    pub kind: ActivityType,
    /// Absolute link, when the node carries one.
    pub url: Option<String>,
    /// Deadline text that passed the date heuristic or the text scan.
    pub deadline_text: Option<String>,
    /// Full `textContent` of the node, kept for the fallback policy.
    pub node_text: String,
}

/// Raw fields resolved for one table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowFields {
    pub title: String,
    pub kind: ActivityType,
    pub url: Option<String>,
    pub deadline_text: Option<String>,
}

/// Resolves fields for a list-style candidate node.
///
/// Returns `Ok(None)` when no title can be found.
///
/// # Errors
/// - Propagates document access failures; callers skip the node.
pub fn extract_fields<D: DocumentAccessor>(
    doc: &D,
    node: D::Node,
    fallback_title_chars: usize,
) -> DomResult<Option<CandidateFields>> {
    let node_text = doc.text_content(node)?;
    let Some((title, url)) = resolve_title(doc, node, &node_text, fallback_title_chars)? else {
        return Ok(None);
    };

    let classes = doc.attr(node, "class")?.unwrap_or_default();
    let kind = infer_type(url.as_deref().unwrap_or_default(), &classes, &title);
    let deadline_text = resolve_deadline_text(doc, node, &node_text)?;

    Ok(Some(CandidateFields {
        title,
        kind,
        url,
        deadline_text,
        node_text,
    }))
}

/// Resolves fields for a table row with at least `min_cells` cells.
///
/// Returns `Ok(None)` for short rows and rows without a titled link.
pub fn extract_table_row<D: DocumentAccessor>(
    doc: &D,
    row: D::Node,
    min_cells: usize,
) -> DomResult<Option<TableRowFields>> {
    let cells = doc.select_within(row, "td, th")?;
    if cells.len() < min_cells {
        return Ok(None);
    }

    let Some(link) = doc.select_first_within(row, "a")? else {
        return Ok(None);
    };
    let title = compact_ws(&doc.text_content(link)?);
    if title.is_empty() {
        return Ok(None);
    }
    let url = link_url(doc, link)?;

    let lowered_url = url.as_deref().unwrap_or_default().to_lowercase();
    let lowered_title = title.to_lowercase();
    let kind = TYPE_KEYWORDS[..TABLE_TYPE_KEYWORDS]
        .iter()
        .find(|(_, keyword, _)| lowered_url.contains(keyword) || lowered_title.contains(keyword))
        .map_or(ActivityType::Other, |(kind, _, _)| *kind);

    let mut deadline_text = None;
    for cell in cells {
        let text = doc.text_content(cell)?.trim().to_string();
        if looks_like_date(&text) {
            deadline_text = Some(text);
        }
    }
    if let Some(time_el) = doc.select_first_within(row, "time, [datetime]")? {
        deadline_text = Some(datetime_or_text(doc, time_el)?);
    }

    Ok(Some(TableRowFields {
        title,
        kind,
        url,
        deadline_text,
    }))
}

/// Case-insensitive keyword inference over url, class list and title.
pub fn infer_type(url: &str, classes: &str, title: &str) -> ActivityType {
    let url = url.to_lowercase();
    let classes = classes.to_lowercase();
    let title = title.to_lowercase();
    TYPE_KEYWORDS
        .iter()
        .find(|(_, attr_keyword, title_keyword)| {
            url.contains(attr_keyword)
                || classes.contains(attr_keyword)
                || title.contains(title_keyword)
        })
        .map_or(ActivityType::Other, |(kind, _, _)| *kind)
}

/// Finds a date-shaped substring in free text, with any trailing time.
pub fn find_date_in_text(text: &str) -> Option<String> {
    DATE_IN_TEXT_RE
        .captures(text)
        .and_then(|caps| caps.name("when"))
        .map(|when| when.as_str().trim().to_string())
}

/// Last-chance scan used before the synthetic fallback deadline.
///
/// Only runs when the text mentions a due/deadline/submission keyword.
pub fn find_bare_date_near_keyword(text: &str) -> Option<&str> {
    if !DEADLINE_KEYWORD_RE.is_match(text) {
        return None;
    }
    BARE_NUMERIC_DATE_RE.find(text).map(|found| found.as_str())
}

fn resolve_title<D: DocumentAccessor>(
    doc: &D,
    node: D::Node,
    node_text: &str,
    fallback_title_chars: usize,
) -> DomResult<Option<(String, Option<String>)>> {
    for selector in TITLE_SELECTORS {
        let Some(title_el) = doc.select_first_within(node, selector)? else {
            continue;
        };
        let title = compact_ws(&doc.text_content(title_el)?);
        if title.is_empty() {
            break;
        }
        let url = if doc.tag_name(title_el)? == "a" {
            link_url(doc, title_el)?
        } else {
            match doc.select_first_within(node, "a")? {
                Some(link) => link_url(doc, link)?,
                None => None,
            }
        };
        return Ok(Some((title, url)));
    }

    if let Some(link) = doc.select_first_within(node, "a")? {
        let title = compact_ws(&doc.text_content(link)?);
        if !title.is_empty() {
            return Ok(Some((title, link_url(doc, link)?)));
        }
    }

    let first_line = node_text.trim().lines().next().unwrap_or_default();
    let title: String = first_line.trim().chars().take(fallback_title_chars).collect();
    if title.is_empty() {
        return Ok(None);
    }
    Ok(Some((title, None)))
}

fn resolve_deadline_text<D: DocumentAccessor>(
    doc: &D,
    node: D::Node,
    node_text: &str,
) -> DomResult<Option<String>> {
    for selector in DEADLINE_SELECTORS {
        let Some(deadline_el) = doc.select_first_within(node, selector)? else {
            continue;
        };
        let text = datetime_or_text(doc, deadline_el)?;
        if looks_like_date(&text) {
            return Ok(Some(text));
        }
    }
    Ok(find_date_in_text(node_text))
}

fn datetime_or_text<D: DocumentAccessor>(doc: &D, node: D::Node) -> DomResult<String> {
    match doc.attr(node, "datetime")? {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Ok(doc.text_content(node)?.trim().to_string()),
    }
}

fn link_url<D: DocumentAccessor>(doc: &D, link: D::Node) -> DomResult<Option<String>> {
    Ok(doc
        .attr(link, "href")?
        .filter(|href| !href.trim().is_empty())
        .map(|href| doc.resolve_url(&href)))
}

#[cfg(test)]
mod tests {
    use super::{extract_fields, extract_table_row, find_date_in_text, infer_type};
    use crate::extract::dom::{DocumentAccessor, HtmlPage};
    use crate::model::activity::ActivityType;

    const PAGE_URL: &str = "https://lms.example.edu/course/view.php?id=12";

    fn first_fields(html: &str, selector: &str) -> Option<super::CandidateFields> {
        let page = HtmlPage::parse(html, PAGE_URL);
        let doc = page.accessor();
        let node = doc.select_all(selector).unwrap()[0];
        extract_fields(&doc, node, 100).unwrap()
    }

    #[test]
    fn heading_title_takes_link_from_node() {
        let fields = first_fields(
            r#"<li class="activity modtype_quiz">
                 <h4>Week 3   Quiz</h4>
                 <a href="/mod/quiz/view.php?id=5">open</a>
                 <span class="due-date">Due: 15 March 2025</span>
               </li>"#,
            "li",
        )
        .unwrap();
        assert_eq!(fields.title, "Week 3 Quiz");
        assert_eq!(
            fields.url.as_deref(),
            Some("https://lms.example.edu/mod/quiz/view.php?id=5")
        );
        assert_eq!(fields.kind, ActivityType::Quiz);
        assert_eq!(fields.deadline_text.as_deref(), Some("Due: 15 March 2025"));
    }

    #[test]
    fn undated_label_is_skipped_for_text_scan() {
        let fields = first_fields(
            r#"<div class="event-item">
                 <span class="instancename">Lab report</span>
                 <span class="due">Due soon</span>
                 <p>Submission closes on 20/04/2025 17:00</p>
               </div>"#,
            "div",
        )
        .unwrap();
        assert_eq!(fields.title, "Lab report");
        assert_eq!(fields.deadline_text.as_deref(), Some("20/04/2025 17:00"));
    }

    #[test]
    fn datetime_attribute_wins_over_text() {
        let fields = first_fields(
            r#"<div class="activity"><h3>Midterm</h3>
               <time datetime="2025-05-02T09:00:00Z">Friday morning</time></div>"#,
            "div",
        )
        .unwrap();
        assert_eq!(fields.deadline_text.as_deref(), Some("2025-05-02T09:00:00Z"));
    }

    #[test]
    fn first_text_line_is_last_title_resort() {
        let fields = first_fields(
            "<div class=\"course-item\">\n  Read chapter 4\n  pages 80-120\n</div>",
            "div",
        )
        .unwrap();
        assert_eq!(fields.title, "Read chapter 4");
        assert_eq!(fields.url, None);
        assert_eq!(fields.deadline_text, None);
    }

    #[test]
    fn empty_node_yields_nothing() {
        assert!(first_fields(r#"<div class="activity">   </div>"#, "div").is_none());
    }

    #[test]
    fn type_priority_prefers_assignment() {
        assert_eq!(
            infer_type("https://x/mod/quiz/view.php", "modtype_assign", "Quiz"),
            ActivityType::Assignment
        );
        assert_eq!(infer_type("", "", "Final Exam"), ActivityType::Exam);
        assert_eq!(infer_type("/mod/resource/view.php", "", "Slides"), ActivityType::Reading);
        assert_eq!(infer_type("", "", "Weekly reading"), ActivityType::Reading);
        assert_eq!(infer_type("", "", "Forum"), ActivityType::Other);
    }

    #[test]
    fn table_row_prefers_time_element() {
        let page = HtmlPage::parse(
            r#"<table><tr>
                 <td><a href="/mod/assign/view.php?id=8">Essay draft</a></td>
                 <td>01/02/2025</td>
                 <td><time datetime="2025-02-03T12:00:00Z">3 Feb</time></td>
               </tr></table>"#,
            PAGE_URL,
        );
        let doc = page.accessor();
        let row = doc.select_all("tr").unwrap()[0];
        let fields = extract_table_row(&doc, row, 2).unwrap().unwrap();
        assert_eq!(fields.title, "Essay draft");
        assert_eq!(fields.kind, ActivityType::Assignment);
        assert_eq!(fields.deadline_text.as_deref(), Some("2025-02-03T12:00:00Z"));
    }

    #[test]
    fn short_rows_are_ignored() {
        let page = HtmlPage::parse(
            r#"<table><tr><td><a href="/x">Only cell</a></td></tr></table>"#,
            PAGE_URL,
        );
        let doc = page.accessor();
        let row = doc.select_all("tr").unwrap()[0];
        assert!(extract_table_row(&doc, row, 2).unwrap().is_none());
    }

    #[test]
    fn text_scan_finds_textual_dates() {
        assert_eq!(
            find_date_in_text("Assignment is due on Mar 3, 2025 somewhere").as_deref(),
            Some("Mar 3, 2025")
        );
        assert_eq!(find_date_in_text("nothing to see"), None);
    }
}
