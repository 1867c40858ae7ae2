pub mod build_tools;
pub mod config;
pub mod document;
pub mod event_bus;
pub mod language_support;
pub mod languages;
pub mod lsp_logging;
pub mod node_types;
pub mod ts_helper;
pub mod util;
