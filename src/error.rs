//! Crate-wide error type

use crate::bootenv::CatalogError;
use crate::config::ConfigError;
use crate::console::ConsoleError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("console: {0}")]
    Console(#[from] ConsoleError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};

    fn parse_timeout(text: &str) -> Result<Option<u32>, Error> {
        let config = crate::MenuConfig::parse(text.as_bytes())?;
        Ok(config.timeout)
    }

    #[test]
    fn test_question_mark_wraps_sources() {
        assert_eq!(parse_timeout("timeout = 3\n"), Ok(Some(3)));
        assert_eq!(
            parse_timeout("timeout = soon\n"),
            Err(Error::Config(ConfigError::InvalidValue {
                line: 1,
                key: String::from("timeout")
            }))
        );
        assert_eq!(
            Error::from(CatalogError::SequenceExhausted),
            Error::Catalog(CatalogError::SequenceExhausted)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::from(ConsoleError::Output(0x3)).to_string(),
            "console: console output failed (status 0x3)"
        );
        assert_eq!(
            Error::from(CatalogError::OutOfMemory).to_string(),
            "catalog: out of memory while adding boot environment"
        );
        assert_eq!(
            Error::from(ConfigError::InvalidValue {
                line: 2,
                key: String::from("sort")
            })
            .to_string(),
            "config: line 2: invalid value for 'sort'"
        );
    }
}
