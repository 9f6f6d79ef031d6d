//! Block validation: does the saved markup match what the block would
//! render today?
//!
//! Markup is compared semantically rather than byte for byte. Whitespace
//! between tags, attribute order, class order, style formatting and
//! `<br/>` versus `<br></br>` do not matter; everything else does.

use crate::attribute::Attributes;
use crate::block::ValidationIssue;
use crate::registry::{BlockRegistry, BlockType};
use crate::serializer::get_save_content;
use block_html::{Token, tokenize};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::LazyLock;
use tracing::debug;

/// Attributes whose mere presence is their value.
pub const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen",
    "allowpaymentrequest",
    "allowusermedia",
    "async",
    "autofocus",
    "autoplay",
    "checked",
    "controls",
    "default",
    "defer",
    "disabled",
    "download",
    "formnovalidate",
    "hidden",
    "ismap",
    "itemscope",
    "loop",
    "multiple",
    "muted",
    "nomodule",
    "novalidate",
    "open",
    "playsinline",
    "readonly",
    "required",
    "reversed",
    "selected",
    "typemustmatch",
];

/// Attributes where an empty value is one of the keywords.
pub const ENUMERATED_ATTRIBUTES: &[&str] = &[
    "autocapitalize",
    "autocomplete",
    "charset",
    "contenteditable",
    "crossorigin",
    "decoding",
    "dir",
    "draggable",
    "enctype",
    "formenctype",
    "formmethod",
    "http-equiv",
    "inputmode",
    "kind",
    "method",
    "preload",
    "scope",
    "shape",
    "spellcheck",
    "translate",
    "type",
    "wrap",
];

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^url\s*\(['"\s]*(.*?)['"\s]*\)$"#).expect("Invalid url regex"));
static LEADING_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("Invalid number regex")
});
static TRAILING_SEMICOLON_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";?\s*$").expect("Invalid style regex"));

/// Whether two HTML strings are semantically equivalent.
///
/// # Example
/// ```
/// use block_model::is_equivalent_html;
///
/// assert!(is_equivalent_html(
///     r#"<p class="a b" style="color: red;">x</p>"#,
///     r#"<p style="color:red" class="b a">x</p>"#,
/// ));
/// assert!(!is_equivalent_html("<p>x</p>", "<p>y</p>"));
/// ```
pub fn is_equivalent_html(actual: &str, expected: &str) -> bool {
    compare_html(actual, expected, &mut Vec::new())
}

/// Like [`is_equivalent_html`], recording why the comparison failed.
pub fn compare_html(actual: &str, expected: &str, issues: &mut Vec<ValidationIssue>) -> bool {
    if actual == expected {
        return true;
    }

    let mut actual_tokens = match tokenize(actual) {
        Ok(tokens) => VecDeque::from(tokens),
        Err(e) => {
            issues.push(ValidationIssue::warning(format!(
                "Unable to tokenize HTML ({e}): {actual}"
            )));
            return false;
        }
    };
    let mut expected_tokens = match tokenize(expected) {
        Ok(tokens) => VecDeque::from(tokens),
        Err(e) => {
            issues.push(ValidationIssue::warning(format!(
                "Unable to tokenize HTML ({e}): {expected}"
            )));
            return false;
        }
    };

    while let Some(actual_token) = next_meaningful(&mut actual_tokens) {
        let Some(expected_token) = next_meaningful(&mut expected_tokens) else {
            issues.push(ValidationIssue::warning(format!(
                "Expected end of content, instead saw {actual_token:?}."
            )));
            return false;
        };

        if !tokens_equal(&actual_token, &expected_token, issues) {
            return false;
        }

        if is_closed_by(&actual_token, expected_tokens.front()) {
            next_meaningful(&mut expected_tokens);
        } else if is_closed_by(&expected_token, actual_tokens.front()) {
            next_meaningful(&mut actual_tokens);
        }
    }

    if let Some(expected_token) = next_meaningful(&mut expected_tokens) {
        issues.push(ValidationIssue::warning(format!(
            "Expected {expected_token:?}, instead saw end of content."
        )));
        return false;
    }
    true
}

/// Validates `attributes` of a block against the markup it was parsed from.
///
/// Freeform and unknown-type blocks are always valid. A failing save
/// function makes the block invalid.
pub fn validate_block(
    registry: &BlockRegistry,
    block_type: &BlockType,
    attributes: &Attributes,
    original_content: &str,
) -> (bool, Vec<ValidationIssue>) {
    if registry.is_fallback_type(&block_type.name) {
        return (true, Vec::new());
    }

    let mut issues = Vec::new();
    let generated = match get_save_content(block_type, attributes, "") {
        Ok(html) => html,
        Err(e) => {
            issues.push(ValidationIssue::error(format!(
                "Block validation failed because an error occurred while generating block content: {e}"
            )));
            return (false, issues);
        }
    };

    let is_valid = compare_html(original_content, &generated, &mut issues);
    if !is_valid {
        issues.push(ValidationIssue::error(format!(
            "Block validation failed for `{}`.\n\nContent generated by `save` function:\n\n{generated}\n\nContent retrieved from post body:\n\n{original_content}",
            block_type.name
        )));
        debug!(block = %block_type.name, "Block validation failed");
    }
    (is_valid, issues)
}

fn next_meaningful(tokens: &mut VecDeque<Token>) -> Option<Token> {
    while let Some(token) = tokens.pop_front() {
        if !token.is_whitespace_text() {
            return Some(token);
        }
    }
    None
}

fn is_closed_by(current: &Token, next: Option<&Token>) -> bool {
    match (current, next) {
        (
            Token::StartTag {
                name,
                self_closing: true,
                ..
            },
            Some(Token::EndTag { name: end }),
        ) => name == end,
        _ => false,
    }
}

fn token_kind(token: &Token) -> &'static str {
    match token {
        Token::StartTag { .. } => "StartTag",
        Token::EndTag { .. } => "EndTag",
        Token::Text(_) => "Chars",
        Token::Comment(_) => "Comment",
    }
}

fn tokens_equal(actual: &Token, expected: &Token, issues: &mut Vec<ValidationIssue>) -> bool {
    match (actual, expected) {
        (
            Token::StartTag {
                name: actual_name,
                attributes: actual_attrs,
                ..
            },
            Token::StartTag {
                name: expected_name,
                attributes: expected_attrs,
                ..
            },
        ) => {
            if actual_name != expected_name {
                issues.push(ValidationIssue::warning(format!(
                    "Expected tag name `{expected_name}`, instead saw `{actual_name}`."
                )));
                return false;
            }
            attributes_equal(&meaningful(actual_attrs), &meaningful(expected_attrs), issues)
        }
        (Token::EndTag { name: actual_name }, Token::EndTag { name: expected_name }) => {
            if actual_name != expected_name {
                issues.push(ValidationIssue::warning(format!(
                    "Expected closing tag `{expected_name}`, instead saw `{actual_name}`."
                )));
                return false;
            }
            true
        }
        (Token::Text(a), Token::Text(b)) | (Token::Comment(a), Token::Comment(b)) => {
            if a == b || collapse_whitespace(a) == collapse_whitespace(b) {
                return true;
            }
            issues.push(ValidationIssue::warning(format!(
                "Expected text `{b}`, saw `{a}`."
            )));
            false
        }
        _ => {
            issues.push(ValidationIssue::warning(format!(
                "Expected token of type `{}` ({expected:?}), instead saw `{}` ({actual:?}).",
                token_kind(expected),
                token_kind(actual)
            )));
            false
        }
    }
}

fn meaningful(attributes: &[(String, String)]) -> Vec<(&str, &str)> {
    attributes
        .iter()
        .filter(|(name, value)| {
            !value.is_empty()
                || name.starts_with("data-")
                || BOOLEAN_ATTRIBUTES.contains(&name.as_str())
                || ENUMERATED_ATTRIBUTES.contains(&name.as_str())
        })
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}

fn attributes_equal(
    actual: &[(&str, &str)],
    expected: &[(&str, &str)],
    issues: &mut Vec<ValidationIssue>,
) -> bool {
    if actual.len() != expected.len() {
        issues.push(ValidationIssue::warning(format!(
            "Expected attributes {expected:?}, instead saw {actual:?}."
        )));
        return false;
    }

    let expected: BTreeMap<&str, &str> = expected.iter().copied().collect();
    for (name, actual_value) in actual {
        let Some(expected_value) = expected.get(name) else {
            issues.push(ValidationIssue::warning(format!(
                "Encountered unexpected attribute `{name}`."
            )));
            return false;
        };
        let equal = match *name {
            "class" => class_set(actual_value) == class_set(expected_value),
            "style" => style_properties(actual_value) == style_properties(expected_value),
            n if BOOLEAN_ATTRIBUTES.contains(&n) => true,
            _ => actual_value == expected_value,
        };
        if !equal {
            issues.push(ValidationIssue::warning(format!(
                "Expected attribute `{name}` of value `{expected_value}`, saw `{actual_value}`."
            )));
            return false;
        }
    }
    true
}

fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

fn class_set(value: &str) -> BTreeSet<&str> {
    value.split_ascii_whitespace().collect()
}

/// Parses an inline style into normalized property/value pairs.
pub fn style_properties(style: &str) -> BTreeMap<String, String> {
    TRAILING_SEMICOLON_REGEX
        .replace(style.trim(), "")
        .split(';')
        .map(|declaration| {
            let (key, value) = declaration.split_once(':').unwrap_or((declaration, ""));
            (key.trim().to_string(), normalize_style_value(value.trim()))
        })
        .collect()
}

fn normalize_style_value(value: &str) -> String {
    let normalized = value
        .split_ascii_whitespace()
        .map(normalize_length)
        .collect::<Vec<_>>()
        .join(" ");
    URL_REGEX.replace(&normalized, "url($1)").into_owned()
}

fn normalize_length(value: &str) -> String {
    let is_zero = LEADING_NUMBER_REGEX
        .find(value)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .is_some_and(|n| n == 0.0);
    if is_zero {
        return "0".to_string();
    }
    if value.starts_with('.') {
        return format!("0{value}");
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<p>a</p>", "<p>a</p>")]
    #[case("<p>a</p>\n\n", "<p>a</p>")]
    #[case("<p>  a \n b </p>", "<p>a b</p>")]
    #[case(r#"<p class="x  y">a</p>"#, r#"<p class="y x">a</p>"#)]
    #[case(r#"<img src="a" alt="">"#, r#"<img src="a">"#)]
    #[case(r#"<img src="a"/>"#, r#"<img src="a"></img>"#)]
    #[case("<br/>", "<br>")]
    #[case(r#"<video controls="controls">"#, r#"<video controls>"#)]
    #[case(r#"<div data-x="">"#, r#"<div data-x="">"#)]
    #[case(r#"<p style="margin: 0px; color: red;">a</p>"#, r#"<p style="color:red;margin:0">a</p>"#)]
    #[case(r#"<p style="opacity: .5">a</p>"#, r#"<p style="opacity:0.5">a</p>"#)]
    #[case(
        r#"<div style="background: url( 'a.png' )"></div>"#,
        r#"<div style="background:url(a.png)"></div>"#
    )]
    #[case("<p>&amp;</p>", "<p>&#38;</p>")]
    #[case("<P>a</P>", "<p>a</p>")]
    fn test_equivalent(#[case] actual: &str, #[case] expected: &str) {
        assert!(is_equivalent_html(actual, expected), "{actual} vs {expected}");
    }

    #[rstest]
    #[case("<p>a</p>", "<p>b</p>")]
    #[case("<p>a</p>", "<div>a</div>")]
    #[case("<p>a</p>", "<p>a</p><p>b</p>")]
    #[case("<p>a</p><p>b</p>", "<p>a</p>")]
    #[case(r#"<p class="x">a</p>"#, "<p>a</p>")]
    #[case(r#"<p id="a">a</p>"#, r#"<p id="b">a</p>"#)]
    #[case(r#"<p title="a">a</p>"#, r#"<p id="a">a</p>"#)]
    #[case("<p>a</p>", "<p>a</div>")]
    #[case("<!-- a -->", "<!-- b -->")]
    #[case("<p>a", "<p>a<")]
    fn test_not_equivalent(#[case] actual: &str, #[case] expected: &str) {
        assert!(!is_equivalent_html(actual, expected), "{actual} vs {expected}");
    }

    #[test]
    fn test_issues_are_recorded() {
        let mut issues = Vec::new();
        assert!(!compare_html("<p>a</p>", "<p>b</p>", &mut issues));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Expected text"));
    }

    #[test]
    fn test_style_properties() {
        let props = style_properties("color: red; width: 0em;");
        assert_eq!(props.get("color").map(String::as_str), Some("red"));
        assert_eq!(props.get("width").map(String::as_str), Some("0"));
    }
}
