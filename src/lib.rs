#[macro_export]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		#[cfg(debug_assertions)]
		{
			eprintln!($($arg)*);
		}
	}};
}

pub mod config;
pub mod crawler;
pub mod lang;
pub mod providers;
pub mod resolver;
pub mod syntax;
pub mod truncate;
pub mod type_crawl;
pub mod types;

pub use config::{load_config, CrawlConfig};
pub use crawler::ContextCrawler;
pub use providers::{DefinitionProvider, FileContentProvider, FsFileContentProvider, StaticFileProvider};
pub use types::{
    AutocompleteSnippet, Position, Range, RangeInFile, RangeInFileWithContents, ResolutionKind,
    ResolutionQuery,
};
