pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::Config;

pub mod requirement;
pub use requirement::Requirement;
pub use requirement::RequirementSpecifier;
pub use requirement::RequirementError;

pub mod manifest;
pub mod fetcher;
pub use fetcher::SourceFetcher;
pub use fetcher::FetchError;

pub mod dedup;
pub mod expander;
pub use expander::Expander;

pub mod environment;
pub use environment::Environment;

pub mod installer;
