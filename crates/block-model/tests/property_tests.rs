//! Property tests for round trips and header minimality.

use block_model::library::{HEADING, PARAGRAPH};
use block_model::{Attributes, BlockRegistry, create_block, get_comment_attributes, get_save_content, parse, serialize};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn test_paragraph_round_trip(text in "[a-zA-Z0-9][a-zA-Z0-9 ,.]{0,40}", drop_cap in any::<bool>()) {
        let registry = BlockRegistry::with_builtins();
        let mut attrs = Attributes::new();
        attrs.insert("content".into(), json!(text));
        attrs.insert("dropCap".into(), json!(drop_cap));
        let block = create_block(&registry, PARAGRAPH, attrs, Vec::new());

        let written = serialize(&registry, std::slice::from_ref(&block));
        let parsed = parse(&registry, &written);
        prop_assert_eq!(parsed.len(), 1);
        prop_assert!(parsed[0].is_valid());
        prop_assert_eq!(parsed[0].attributes(), block.attributes());
        prop_assert_eq!(serialize(&registry, &parsed), written);
    }

    #[test]
    fn test_header_never_repeats_markup(text in "[a-z]{1,20}", level in 1i64..=6) {
        let registry = BlockRegistry::with_builtins();
        let mut attrs = Attributes::new();
        attrs.insert("content".into(), json!(text));
        attrs.insert("level".into(), json!(level));
        let block = create_block(&registry, HEADING, attrs, Vec::new());
        let block_type = registry.get(HEADING).unwrap();

        let html = get_save_content(block_type, block.attributes(), "").unwrap();
        let header = get_comment_attributes(block_type, block.attributes(), &html);
        prop_assert!(!header.contains_key("content"));
        prop_assert_eq!(header.contains_key("level"), level != 2);
    }

    #[test]
    fn test_parse_never_panics(input in "[ -~\\n]{0,200}") {
        let registry = BlockRegistry::with_builtins();
        let blocks = parse(&registry, &input);
        let _ = serialize(&registry, &blocks);
    }
}
