//! Configuration for the Ur converter.
//!
//! This crate provides:
//! - The `ur.toml` configuration format
//! - [`RulePolicy`], a placement policy driven by `[[placement.rule]]` tables
//!
//! # Example
//!
//! ```toml
//! # ur.toml
//! [input]
//! path = "src/list.c"
//! defines = ["NDEBUG"]
//! include_paths = ["/usr/include"]
//!
//! [output]
//! directory = "generated"
//!
//! [placement]
//! default_buffer = "list"
//!
//! [[placement.rule]]
//! kind = "struct"
//! prefix = "list_"
//! buffer = "types"
//!
//! [[placement.rule]]
//! kind = "function"
//! prefix = "list_"
//! rename = "c_{name}"
//! ```

mod config;
mod error;
mod policy;

pub use config::{InputConfig, OutputConfig, PlacementConfig, PlacementRule, RuleKind, UrConfig};
pub use error::{ConfigError, Result};
pub use policy::RulePolicy;

#[cfg(test)]
mod tests {
    use super::*;
    use ur_convert::{FunctionSignature, PlacementPolicy};

    #[test]
    fn test_config_drives_policy() {
        let toml = r#"
[placement]
default_buffer = "list"

[[placement.rule]]
kind = "struct"
prefix = "list_"
buffer = "types"

[[placement.rule]]
kind = "function"
prefix = "list_"
rename = "c_{name}"
"#;
        let config = UrConfig::parse(toml).unwrap();
        let policy = config.policy();

        let struct_placement = policy.place_struct("list_node").unwrap();
        assert_eq!(struct_placement.buffer, "types");

        let signature = FunctionSignature {
            name: "list_push".to_string(),
            params: Vec::new(),
            return_type: Default::default(),
            is_variadic: false,
        };
        let function_placement = policy.place_function(&signature).unwrap();
        assert_eq!(function_placement.buffer, "list");
        assert_eq!(function_placement.rename, "c_list_push");
    }
}
