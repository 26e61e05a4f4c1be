//! Command handlers, one module per subcommand.

pub mod check;
pub mod completion;
pub mod config_cmd;
pub mod evaluate;
pub mod schema_cmd;
pub mod version;
