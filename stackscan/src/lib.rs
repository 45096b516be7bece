// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    install_keywords, installed_keywords_path, parse_areas, resolve_keywords, KeywordSource,
};

// Re-export collection functionality from stackscan-core
pub use stackscan_core::collect::{
    execute_collect, CollectOptions, CollectProgressCallback, StackTally,
};
