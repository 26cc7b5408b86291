//! Infrastructure layer - File access, configuration and loading

pub mod cache;
pub mod config;
pub mod fs;
pub mod loader;
pub mod scanner;

pub use cache::DiscoveryCache;
pub use config::DiscoveryConfig;
pub use fs::{FileSystem, RealFileSystem};
pub use loader::TaglibLoader;
pub use scanner::DirectoryScanner;
