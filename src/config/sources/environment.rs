//! Environment variable source: COLLABX__ prefix with __ separator

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, Map};

/// Environment source; `vars` replaces the process environment when given.
pub fn source(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix("COLLABX")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("ingest.exclusions")
        .source(vars)
}

/// Add environment variable overlay to builder.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(source(None))
}
