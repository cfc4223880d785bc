//! Sale signal extraction from raw storefront HTML.
//!
//! Script/style/noscript blocks are stripped first, then visible text nodes
//! are walked in document order through a chain of noise filters. The first
//! node that matches a generic sale indicator *and* yields a category or a
//! percentage wins; a node matching only a generic indicator is kept as a
//! fallback so the page still reports a sale in the catch-all bucket.

use regex::Regex;

use salewatch_core::SaleCategoryDefinition;

/// Outcome of classifying one page's visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleSignal {
    pub sale_found: bool,
    pub sale_text: String,
    pub sale_percentage: Option<String>,
    pub sale_category: Option<String>,
}

impl SaleSignal {
    fn none() -> Self {
        Self {
            sale_found: false,
            sale_text: String::new(),
            sale_percentage: None,
            sale_category: None,
        }
    }
}

/// Generic indicators that mark a text node as sale-related at all.
/// Matched as case-insensitive substrings.
const GENERIC_SALE_INDICATORS: &[&str] =
    &["sale", "discount", "off", "clearance", "reduced", "markdown"];

/// Tokens that mark a text node as leftover script rather than copy, even
/// when its punctuation density is low.
const CODE_TOKENS: &[&str] = &["function(", "var "];

/// Substrings betraying embedded client-side state blobs. Pages dump large
/// hydration payloads into the markup; any node carrying one of these is
/// config, not copy.
const STATE_MARKERS: &[&str] = &[
    "__INITIAL_STATE__",
    "__NEXT_DATA__",
    "__APOLLO_STATE__",
    "__NUXT__",
    "__PRELOADED_STATE__",
    "window.__",
];

/// Visible nodes longer than this are navigation dumps or serialized data,
/// never a sale banner.
const MAX_TEXT_LEN: usize = 300;

/// A node with more than this many structural characters (`{ } [ ] " : ;`)
/// reads as code/JSON rather than copy.
const MAX_STRUCTURAL_CHARS: usize = 5;

/// Percentage shapes, tried in order; the first pattern that matches wins
/// and its captured number becomes the sale percentage.
const PERCENT_PATTERNS: &[&str] = &[
    r"(?i)up\s+to\s+(\d{1,3})\s*%",
    r"(?i)(\d{1,3})\s*%\s*off",
    r"(?i)save\s+up\s+to\s+(\d{1,3})\s*%",
    r"(?i)(\d{1,3})\s*%\s*(?:discount|reduction|markdown)",
];

/// Classify one page's HTML for sale signals.
///
/// Deterministic: the same input always yields the same output. Categories
/// are tested in configuration order with first-keyword-hit-wins semantics;
/// the scan stops at the first text node that produces a category or a
/// percentage.
#[must_use]
pub fn extract_sale_signal(html: &str, categories: &[SaleCategoryDefinition]) -> SaleSignal {
    let stripped = strip_invisible_blocks(html);
    let tag_re = Regex::new(r"<[^>]+>").expect("valid tag regex");

    // First node matching only a generic indicator, kept in case no node
    // yields a category or percentage.
    let mut generic_only: Option<String> = None;

    for node in tag_re.split(&stripped) {
        let text = node.trim();

        if text.is_empty() {
            continue;
        }
        if text.chars().count() > MAX_TEXT_LEN {
            continue;
        }
        if structural_char_count(text) > MAX_STRUCTURAL_CHARS {
            continue;
        }
        if CODE_TOKENS.iter().any(|token| text.contains(token)) {
            continue;
        }
        if contains_state_marker(text) {
            continue;
        }

        let lower = text.to_lowercase();
        if !GENERIC_SALE_INDICATORS.iter().any(|kw| lower.contains(kw)) {
            continue;
        }

        let sale_category = classify_category(&lower, categories);
        let sale_percentage = extract_percentage(text);

        if sale_category.is_some() || sale_percentage.is_some() {
            return SaleSignal {
                sale_found: true,
                sale_text: clean_sale_text(text),
                sale_percentage,
                sale_category,
            };
        }

        if generic_only.is_none() {
            generic_only = Some(text.to_string());
        }
    }

    if let Some(text) = generic_only {
        return SaleSignal {
            sale_found: true,
            sale_text: clean_sale_text(&text),
            sale_percentage: None,
            sale_category: None,
        };
    }

    SaleSignal::none()
}

/// Remove script/style/noscript blocks and HTML comments so their contents
/// never reach the text-node walk. Unfiltered pages produce false positives
/// from embedded JSON and JS config.
fn strip_invisible_blocks(html: &str) -> String {
    let script_re = Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid script regex");
    let style_re = Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid style regex");
    let noscript_re =
        Regex::new(r"(?is)<noscript[^>]*>.*?</noscript>").expect("valid noscript regex");
    let comment_re = Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex");

    let without_scripts = script_re.replace_all(html, " ");
    let without_styles = style_re.replace_all(&without_scripts, " ");
    let without_noscript = noscript_re.replace_all(&without_styles, " ");
    comment_re.replace_all(&without_noscript, " ").into_owned()
}

fn structural_char_count(text: &str) -> usize {
    text.chars()
        .filter(|c| matches!(c, '{' | '}' | '[' | ']' | '"' | ':' | ';'))
        .count()
}

fn contains_state_marker(text: &str) -> bool {
    STATE_MARKERS.iter().any(|marker| text.contains(marker))
}

/// First configured category with any keyword hit wins; no scoring.
fn classify_category(lower_text: &str, categories: &[SaleCategoryDefinition]) -> Option<String> {
    categories
        .iter()
        .find(|category| {
            category
                .keywords
                .iter()
                .any(|keyword| lower_text.contains(&keyword.to_lowercase()))
        })
        .map(|category| category.key.clone())
}

fn extract_percentage(text: &str) -> Option<String> {
    for pattern in PERCENT_PATTERNS {
        let re = Regex::new(pattern).expect("valid percentage regex");
        if let Some(cap) = re.captures(text) {
            if let Some(number) = cap.get(1) {
                return Some(number.as_str().to_string());
            }
        }
    }
    None
}

/// Collapse whitespace and strip residual hydration/JSON fragments from a
/// recorded sale snippet. If the cleaned text still reads as code, it is
/// discarded to an empty string — better no snippet than noise in the UI.
fn clean_sale_text(text: &str) -> String {
    let hydration_re =
        Regex::new(r"window\.__\w+__\s*=\s*\{[^{}]*\};?").expect("valid hydration regex");
    let json_fragment_re = Regex::new(r#"\{[^{}]*:[^{}]*\}"#).expect("valid json fragment regex");

    let without_hydration = hydration_re.replace_all(text, " ");
    let without_json = json_fragment_re.replace_all(&without_hydration, " ");

    let collapsed = without_json
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.chars().count() > MAX_TEXT_LEN
        || structural_char_count(&collapsed) > MAX_STRUCTURAL_CHARS
        || contains_state_marker(&collapsed)
    {
        return String::new();
    }

    collapsed
}
