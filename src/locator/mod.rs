//! Element re-resolution for replay
//!
//! A recorded element rarely survives a page rebuild unchanged: ids get
//! regenerated, class lists reorder, markup reflows. This module re-locates
//! an element from the hints captured at record time by trying a fixed chain
//! of strategies in priority order, short-circuiting on the first hit.
//!
//! Each strategy is a pure `hints → candidate query` function, so ordering
//! and rejection rules are testable without a browser; only [`resolve`]
//! touches the live session.

use colored::Colorize;
use playwright::api::ElementHandle;
use regex::Regex;
use std::sync::LazyLock;

use crate::session::BrowserSession;

/// Locator hints captured with an action at record time.
#[derive(Debug, Clone, Copy)]
pub struct Hints<'a> {
    /// Structural path as recorded (XPath-like).
    pub selector: &'a str,
    /// Trimmed visible text.
    pub text: &'a str,
    /// Raw `class` attribute.
    pub class_name: &'a str,
    /// `id` attribute.
    pub id: &'a str,
}

/// One way of finding a live element from captured hints.
///
/// Order matters: [`STRATEGY_CHAIN`] is tried front to back. Ids come after
/// text and class on purpose: a captured id may itself have been generated,
/// while visible text tends to survive a redesign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The structural path exactly as captured.
    StructuralPath,
    /// Any element whose text contains the captured text.
    TextContains,
    /// Elements carrying the first class token, if that token looks stable.
    ClassToken,
    /// Exact id match.
    ExactId,
    /// Best-effort rewrite of the structural path into a CSS selector.
    AttributeRewrite,
}

/// The fixed strategy order tried during resolution.
pub const STRATEGY_CHAIN: [Strategy; 5] = [
    Strategy::StructuralPath,
    Strategy::TextContains,
    Strategy::ClassToken,
    Strategy::ExactId,
    Strategy::AttributeRewrite,
];

impl Strategy {
    /// Build the candidate query for these hints, or `None` if the strategy
    /// does not apply (missing hint, or a hint rejected as unstable).
    pub fn query(&self, hints: &Hints<'_>) -> Option<String> {
        match self {
            Strategy::StructuralPath => {
                if hints.selector.is_empty() {
                    None
                } else {
                    Some(format!("xpath={}", hints.selector))
                }
            }
            Strategy::TextContains => {
                let text = hints.text.trim();
                if text.is_empty() || text.contains('"') {
                    None
                } else {
                    Some(format!("xpath=//*[contains(text(), \"{}\")]", text))
                }
            }
            Strategy::ClassToken => {
                let token = hints.class_name.split_whitespace().next()?;
                if !stable_class_token(token) {
                    return None;
                }
                Some(format!("xpath=//*[contains(@class, \"{}\")]", token))
            }
            Strategy::ExactId => {
                if hints.id.is_empty() {
                    None
                } else {
                    Some(format!("xpath=//*[@id=\"{}\"]", hints.id))
                }
            }
            Strategy::AttributeRewrite => xpath_to_css(hints.selector),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Strategy::StructuralPath => "structural path",
            Strategy::TextContains => "text",
            Strategy::ClassToken => "class token",
            Strategy::ExactId => "id",
            Strategy::AttributeRewrite => "attribute rewrite",
        }
    }
}

/// A class token is usable for location only if it contains no digit; a
/// digit anywhere in the token is taken as a sign the class was generated
/// by a build tool or framework. Whole-token scope is a tunable policy.
fn stable_class_token(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(|c| c.is_ascii_digit())
}

static SEGMENT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([a-zA-Z][a-zA-Z0-9-]*|\*)\[@([a-zA-Z-]+)=["']([^"']*)["']\]$"#).unwrap()
});
static SEGMENT_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9-]*)\[(\d+)\]$").unwrap());
static SEGMENT_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9-]*$").unwrap());

/// Rewrite a simple structural path into a CSS selector.
///
/// Supported segments: `tag`, `tag[n]`, `tag[@attr="v"]` and `*[@attr="v"]`,
/// joined by `/` or `//`. `id` predicates become `#id`, `class` predicates
/// become dotted class selectors, other attributes become `[attr="v"]`.
/// Anything else (functions, axes, unions) falls through to `None`.
fn xpath_to_css(xpath: &str) -> Option<String> {
    if xpath.is_empty() {
        return None;
    }
    let trimmed = xpath.trim_start_matches('/');
    let mut parts = Vec::new();

    for segment in trimmed.split('/') {
        if segment.is_empty() {
            // came from a `//` separator; descendant combinator is the
            // CSS default, nothing to emit
            continue;
        }
        if let Some(caps) = SEGMENT_ATTR.captures(segment) {
            let tag = &caps[1];
            let attr = &caps[2];
            let value = &caps[3];
            let tag_css = if tag == "*" { "" } else { tag };
            let css = match attr {
                "id" => format!("{}#{}", tag_css, value),
                "class" => {
                    let classes: Vec<&str> = value.split_whitespace().collect();
                    if classes.is_empty() {
                        return None;
                    }
                    format!("{}.{}", tag_css, classes.join("."))
                }
                _ => format!("{}[{}=\"{}\"]", tag_css, attr, value),
            };
            parts.push(css);
        } else if let Some(caps) = SEGMENT_INDEX.captures(segment) {
            let n: usize = caps[2].parse().ok()?;
            if n == 0 {
                return None;
            }
            parts.push(format!("{}:nth-of-type({})", &caps[1], n));
        } else if SEGMENT_PLAIN.is_match(segment) {
            parts.push(segment.to_string());
        } else {
            return None;
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" > "))
    }
}

/// Re-locate a live element from `hints`, trying each strategy in
/// [`STRATEGY_CHAIN`] with its own `timeout_ms` budget.
///
/// `None` means every strategy was exhausted; callers decide whether a
/// missing element is fatal. Resolution itself never raises for a miss.
pub async fn resolve(
    session: &BrowserSession,
    hints: &Hints<'_>,
    timeout_ms: u64,
) -> Option<ElementHandle> {
    for strategy in STRATEGY_CHAIN {
        let Some(query) = strategy.query(hints) else {
            continue;
        };
        match session.wait_for(&query, timeout_ms).await {
            Ok(Some(element)) => {
                log::debug!("resolved via {} strategy: {}", strategy.name(), query);
                return Some(element);
            }
            Ok(None) => {
                log::debug!("{} strategy missed: {}", strategy.name(), query);
            }
            Err(e) => {
                println!(
                    "  {} {} strategy failed: {}",
                    "⚠".yellow(),
                    strategy.name(),
                    e
                );
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints<'a>(selector: &'a str, text: &'a str, class_name: &'a str, id: &'a str) -> Hints<'a> {
        Hints {
            selector,
            text,
            class_name,
            id,
        }
    }

    #[test]
    fn test_chain_order_is_fixed() {
        assert_eq!(
            STRATEGY_CHAIN,
            [
                Strategy::StructuralPath,
                Strategy::TextContains,
                Strategy::ClassToken,
                Strategy::ExactId,
                Strategy::AttributeRewrite,
            ]
        );
    }

    #[test]
    fn test_id_strategy_applies_without_primary_selector() {
        // A stale structural path must not be required for the id strategy:
        // with only an id hint, exactly the id and rewrite slots of the
        // chain can produce queries, and the id query is an exact match.
        let h = hints("", "", "", "go");
        assert_eq!(Strategy::StructuralPath.query(&h), None);
        assert_eq!(Strategy::TextContains.query(&h), None);
        assert_eq!(Strategy::ClassToken.query(&h), None);
        assert_eq!(
            Strategy::ExactId.query(&h),
            Some("xpath=//*[@id=\"go\"]".to_string())
        );
    }

    #[test]
    fn test_class_token_uses_first_token_only() {
        let h = hints("", "", "btn primary large", "");
        assert_eq!(
            Strategy::ClassToken.query(&h),
            Some("xpath=//*[contains(@class, \"btn\")]".to_string())
        );
    }

    #[test]
    fn test_class_token_with_digit_is_never_tried() {
        let h = hints("", "", "btn-12x primary", "");
        assert_eq!(Strategy::ClassToken.query(&h), None);
        // rejection is on the first token; later stable tokens do not rescue it
        let h = hints("", "", "a1 stable", "");
        assert_eq!(Strategy::ClassToken.query(&h), None);
    }

    #[test]
    fn test_text_strategy_uses_containment() {
        let h = hints("", "Sign in", "", "");
        assert_eq!(
            Strategy::TextContains.query(&h),
            Some("xpath=//*[contains(text(), \"Sign in\")]".to_string())
        );
    }

    #[test]
    fn test_rewrite_id_predicate() {
        assert_eq!(xpath_to_css("//*[@id=\"search\"]"), Some("#search".to_string()));
        assert_eq!(
            xpath_to_css("//input[@id='q']"),
            Some("input#q".to_string())
        );
    }

    #[test]
    fn test_rewrite_class_predicate() {
        assert_eq!(
            xpath_to_css("//div[@class=\"toolbar actions\"]"),
            Some("div.toolbar.actions".to_string())
        );
    }

    #[test]
    fn test_rewrite_generic_attribute_and_index() {
        assert_eq!(
            xpath_to_css("//input[@name=\"q\"]"),
            Some("input[name=\"q\"]".to_string())
        );
        assert_eq!(
            xpath_to_css("/html/body/div[2]/button[1]"),
            Some("html > body > div:nth-of-type(2) > button:nth-of-type(1)".to_string())
        );
    }

    #[test]
    fn test_rewrite_rejects_unsupported_axes() {
        assert_eq!(xpath_to_css("//a[contains(text(), \"next\")]"), None);
        assert_eq!(xpath_to_css("//div/following-sibling::span"), None);
        assert_eq!(xpath_to_css(""), None);
    }
}
