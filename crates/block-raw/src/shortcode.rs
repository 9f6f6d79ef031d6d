//! Splitting markup around standalone shortcodes.

use block_grammar::ShortcodeMatch;
use block_grammar::shortcode::next;
use block_model::{Block, BlockRegistry, Transform, TransformDirection, create_block, find_transform, get_block_transforms};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Tag names that could open a shortcode.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z][\w-]*)").expect("Invalid shortcode tag regex"));
static STANDS_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\n|<p>)\s*$").expect("Invalid shortcode boundary regex"));
static STANDS_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:$|\n|</p>)").expect("Invalid shortcode boundary regex"));

/// A stretch of markup, or a block made from a shortcode.
#[derive(Debug, Clone)]
pub enum Piece {
    Html(String),
    Block(Block),
}

/// First shortcode at or after `from` carrying one of `tags`; `*` accepts
/// any tag.
fn find_shortcode(tags: &[String], html: &str, from: usize) -> Option<ShortcodeMatch> {
    tags.iter().find_map(|tag| {
        if tag == "*" {
            TAG_PATTERN
                .captures_iter(&html[from..])
                .find_map(|caps| next(&caps[1], html, from))
        } else {
            next(tag, html, from)
        }
    })
}

/// Whether a shortcode stands on a line or in a paragraph of its own.
/// Shortcodes wrapping markup always count.
fn is_standalone(html: &str, found: &ShortcodeMatch) -> bool {
    if found.shortcode.content.as_deref().is_some_and(|content| content.contains('<')) {
        return true;
    }
    let before = &html[..found.index];
    let after = &html[found.index + found.content.len()..];
    STANDS_AFTER.is_match(before) && STANDS_BEFORE.is_match(after)
}

/// Splits `html` into markup and the blocks made from its standalone
/// shortcodes.
///
/// Each shortcode goes to the shortcode transform with the lowest priority
/// that accepts it. Shortcodes inside running text are left as text.
pub fn segment_shortcodes(registry: &BlockRegistry, html: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    segment(registry, html, 0, &mut Vec::new(), &mut pieces);
    pieces
}

fn segment<'r>(
    registry: &'r BlockRegistry,
    html: &str,
    from: usize,
    excluded: &mut Vec<&'r str>,
    pieces: &mut Vec<Piece>,
) {
    let transforms = get_block_transforms(registry, TransformDirection::From, None);
    let candidate = find_transform(&transforms, |named| match named.transform {
        Transform::Shortcode(transform) => {
            !excluded.contains(&named.block_name) && find_shortcode(&transform.tags, html, from).is_some()
        }
        _ => false,
    });
    let Some(named) = candidate else {
        push_html(pieces, html);
        return;
    };
    let Transform::Shortcode(transform) = named.transform else {
        push_html(pieces, html);
        return;
    };
    let Some(found) = find_shortcode(&transform.tags, html, from) else {
        push_html(pieces, html);
        return;
    };
    let end = found.index + found.content.len();

    if !is_standalone(html, &found) {
        excluded.clear();
        segment(registry, html, end, excluded, pieces);
        return;
    }
    if let Some(is_match) = &transform.is_match {
        if !is_match(&found.shortcode) {
            excluded.push(named.block_name);
            segment(registry, html, from, excluded, pieces);
            return;
        }
    }

    debug!(block = named.block_name, shortcode = %found.shortcode.tag, "Converting shortcode");
    let attributes = (transform.transform)(&found.shortcode);
    push_html(pieces, &html[..found.index]);
    pieces.push(Piece::Block(create_block(registry, named.block_name, attributes, Vec::new())));
    excluded.clear();
    segment(registry, &html[end..], 0, excluded, pieces);
}

fn push_html(pieces: &mut Vec<Piece>, html: &str) {
    if !html.is_empty() {
        pieces.push(Piece::Html(html.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_model::library::SHORTCODE;
    use block_model::{AttributeDefinition, Attributes, BlockType};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn registry() -> BlockRegistry {
        let mut registry = BlockRegistry::with_builtins();
        registry.register(
            BlockType::new("acme/gallery", "Gallery")
                .with_category("media")
                .with_attribute("ids", AttributeDefinition::string())
                .with_save(|_| Ok(String::new()))
                .with_transform_from(
                    Transform::shortcode(&["gallery"], |shortcode| {
                        let mut attributes = Attributes::new();
                        if let Some(ids) = shortcode.attrs.get("ids") {
                            attributes.insert("ids".into(), Value::String(ids.to_string()));
                        }
                        attributes
                    })
                    .with_shortcode_match(|shortcode| shortcode.attrs.get("ids").is_some()),
                ),
        );
        registry
    }

    fn describe(pieces: &[Piece]) -> Vec<String> {
        pieces
            .iter()
            .map(|piece| match piece {
                Piece::Html(html) => format!("html:{html}"),
                Piece::Block(block) => format!("block:{}", block.name()),
            })
            .collect()
    }

    #[test]
    fn test_standalone_shortcode_becomes_block() {
        let pieces = segment_shortcodes(&registry(), "<p>Intro</p>\n[gallery ids=\"1,2\"]\n<p>Outro</p>");
        assert_eq!(
            describe(&pieces),
            vec!["html:<p>Intro</p>\n", "block:acme/gallery", "html:\n<p>Outro</p>"]
        );
        let Piece::Block(block) = &pieces[1] else {
            panic!("expected a block");
        };
        assert_eq!(block.attribute("ids"), Some(&json!("1,2")));
    }

    #[test]
    fn test_shortcode_in_running_text_is_kept() {
        let html = "<p>See [gallery ids=\"1\"] here</p>";
        assert_eq!(describe(&segment_shortcodes(&registry(), html)), vec![format!("html:{html}")]);
    }

    #[test]
    fn test_shortcode_in_own_paragraph() {
        let pieces = segment_shortcodes(&registry(), "<p>[gallery ids=\"3\"]</p>");
        assert_eq!(describe(&pieces), vec!["html:<p>", "block:acme/gallery", "html:</p>"]);
    }

    #[test]
    fn test_rejected_match_falls_through_to_catch_all() {
        let pieces = segment_shortcodes(&registry(), "[gallery]");
        assert_eq!(describe(&pieces), vec![format!("block:{SHORTCODE}")]);
        let Piece::Block(block) = &pieces[0] else {
            panic!("expected a block");
        };
        assert_eq!(block.attribute("text"), Some(&json!("[gallery]")));
    }

    #[test]
    fn test_unknown_shortcode_uses_catch_all() {
        let pieces = segment_shortcodes(&registry(), "<p>Before</p>\n[contact-form]");
        assert_eq!(describe(&pieces), vec!["html:<p>Before</p>\n".to_string(), format!("block:{SHORTCODE}")]);
    }

    #[test]
    fn test_no_shortcodes() {
        assert_eq!(describe(&segment_shortcodes(&registry(), "<p>x</p>")), vec!["html:<p>x</p>"]);
        assert!(segment_shortcodes(&registry(), "").is_empty());
    }
}
