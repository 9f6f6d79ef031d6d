//! Command implementations for block-cli

pub mod convert;
pub mod parse;
pub mod serialize;
pub mod types;
pub mod validate;

pub use convert::run_convert;
pub use parse::run_parse;
pub use serialize::run_serialize;
pub use types::run_types;
pub use validate::run_validate;

use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Read a whole input file, or stdin for `None` and `-`
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path.filter(|p| p.as_os_str() != "-") {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}
