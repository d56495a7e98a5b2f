//! Mirror Translate - 单层网页镜像翻译工具库
//!
//! 这个库提供了页面渲染、HTML处理、文本翻译、站内链接重写和单层镜像流程等核心功能。

pub mod api_constants;
pub mod config;
pub mod dom;
pub mod error;
pub mod html_processor;
pub mod links;
pub mod mirror;
pub mod persister;
pub mod renderer;
pub mod stats;
pub mod translator;
pub mod utils;

pub use error::{MirrorError, Result};
pub use mirror::{CrawlPhase, MirrorReport, SiteMirror};
