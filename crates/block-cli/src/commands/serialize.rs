//! Serialize command implementation

use std::io::Write;

use block_model::{Attributes, Block, BlockRegistry, create_block, serialize_with_options};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{CliError, Result};

/// A block as given on input. Fields other than these, such as the
/// `clientId` and `isValid` written by `blocks parse --json`, are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockInput {
    name: String,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    inner_blocks: Vec<BlockInput>,
}

impl BlockInput {
    fn build(self, registry: &BlockRegistry) -> Result<Block> {
        if !registry.contains(&self.name) {
            return Err(CliError::user(format!("Unknown block type '{}'", self.name)));
        }
        let inner = self
            .inner_blocks
            .into_iter()
            .map(|inner| inner.build(registry))
            .collect::<Result<Vec<_>>>()?;
        Ok(create_block(registry, &self.name, self.attributes, inner))
    }
}

/// Run the serialize command
pub fn run_serialize(out: &mut dyn Write, registry: &BlockRegistry, input: &str, config: &Config) -> Result<()> {
    let inputs: Vec<BlockInput> = serde_json::from_str(input)?;
    let blocks = inputs
        .into_iter()
        .map(|block| block.build(registry))
        .collect::<Result<Vec<_>>>()?;
    let document = serialize_with_options(registry, &blocks, &config.serialize_options());
    writeln!(out, "{}", document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::capture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_blocks() {
        let registry = BlockRegistry::with_builtins();
        let input = r#"[
            {"name": "core/heading", "attributes": {"content": "Hi", "level": 3}},
            {"name": "core/paragraph", "attributes": {"content": "Body"}}
        ]"#;
        let (result, output) = capture(|out| run_serialize(out, &registry, input, &Config::default()));
        result.unwrap();
        assert_eq!(
            output,
            "<!-- wp:heading {\"level\":3} -->\n<h3>Hi</h3>\n<!-- /wp:heading -->\n\n<!-- wp:paragraph -->\n<p>Body</p>\n<!-- /wp:paragraph -->\n"
        );
    }

    #[test]
    fn test_keep_core_namespace() {
        let registry = BlockRegistry::with_builtins();
        let mut config = Config::default();
        config.serialize.strip_core_namespace = false;
        let (result, output) = capture(|out| {
            run_serialize(out, &registry, r#"[{"name": "core/separator"}]"#, &config)
        });
        result.unwrap();
        assert!(output.starts_with("<!-- wp:core/separator -->"));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let registry = BlockRegistry::with_builtins();
        let (result, _) = capture(|out| run_serialize(out, &registry, r#"[{"name": "acme/nope"}]"#, &Config::default()));
        assert_eq!(result.unwrap_err().to_string(), "Unknown block type 'acme/nope'");
    }

    #[test]
    fn test_malformed_json() {
        let registry = BlockRegistry::with_builtins();
        let (result, _) = capture(|out| run_serialize(out, &registry, "{", &Config::default()));
        assert!(matches!(result, Err(CliError::Json(_))));
    }
}
