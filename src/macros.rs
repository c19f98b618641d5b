//! Logging macros for ergonomic log message formatting.
//!
//! Messages use `format!` syntax. Attributes follow a `;` as `key => value`
//! pairs. Nothing is formatted when the logger is not enabled for the level.
//!
//! # Examples
//!
//! ```
//! use ops_toolkit::prelude::*;
//! use ops_toolkit::info;
//!
//! let logger = Logger::discard();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With attributes
//! info!(logger, "Request served"; "status" => 200, "path" => "/health");
//! ```

/// Build a `Vec<Attr>` from `key => value` pairs.
///
/// # Examples
///
/// ```
/// use ops_toolkit::attrs;
///
/// let attrs = attrs!["component" => "sqlite", "retries" => 3];
/// assert_eq!(attrs.len(), 2);
/// assert_eq!(attrs[0].key, "component");
/// ```
#[macro_export]
macro_rules! attrs {
    () => {
        ::std::vec::Vec::<$crate::core::Attr>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        vec![$($crate::core::Attr::new($key, $value)),+]
    };
}

/// Log a message at an explicit severity.
///
/// # Examples
///
/// ```
/// # use ops_toolkit::prelude::*;
/// # let logger = Logger::discard();
/// use ops_toolkit::log;
/// log!(logger, Severity::INFO, "Simple message");
/// log!(logger, Severity(2), "Error code: {}", 500; "retry" => true);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $fmt:literal $(, $arg:expr)* ; $($key:expr => $value:expr),* $(,)?) => {
        $logger.log_fmt(
            $severity,
            ::std::format_args!($fmt $(, $arg)*),
            || $crate::attrs![$($key => $value),*],
        )
    };
    ($logger:expr, $severity:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $logger.log_fmt(
            $severity,
            ::std::format_args!($fmt $(, $arg)*),
            ::std::vec::Vec::new,
        )
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use ops_toolkit::prelude::*;
/// # let logger = Logger::discard();
/// use ops_toolkit::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::DEBUG, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use ops_toolkit::prelude::*;
/// # let logger = Logger::discard();
/// use ops_toolkit::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100; "batch" => 7);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::INFO, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use ops_toolkit::prelude::*;
/// # let logger = Logger::discard();
/// use ops_toolkit::warn;
/// warn!(logger, "Low disk space");
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::WARN, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use ops_toolkit::prelude::*;
/// # let logger = Logger::discard();
/// use ops_toolkit::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}", 500; "component" => "postgres");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Severity::ERROR, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Attr, CaptureBuffer, Logger, Severity, Sink};
    use std::cell::Cell;

    fn plain_logger(buffer: &CaptureBuffer, level: Severity) -> Logger {
        Logger::builder()
            .level(level)
            .format("plain")
            .sink(Sink::new("memory", buffer.clone()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_attrs_macro() {
        let attrs = attrs!["a" => 1, "b" => "two", "c" => true,];
        assert_eq!(
            attrs,
            vec![Attr::new("a", 1), Attr::new("b", "two"), Attr::new("c", true)]
        );
        assert!(attrs![].is_empty());
    }

    #[test]
    fn test_log_macro_formats_and_attaches() {
        let buffer = CaptureBuffer::new();
        let logger = plain_logger(&buffer, Severity::DEBUG);

        log!(logger, Severity::WARN, "disk {}% full", 91; "mount" => "/var");
        assert!(buffer.contents().contains("level=WARN msg=\"disk 91% full\" mount=/var"));
    }

    #[test]
    fn test_level_macros() {
        let buffer = CaptureBuffer::new();
        let logger = plain_logger(&buffer, Severity::DEBUG);

        debug!(logger, "Debug message");
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500; "fatal" => false);

        let output = buffer.contents();
        let levels: Vec<&str> = output
            .lines()
            .map(|line| line.split(' ').nth(1).unwrap())
            .collect();
        assert_eq!(levels, vec!["level=DEBUG", "level=INFO", "level=WARN", "level=ERROR"]);
    }

    #[test]
    fn test_disabled_level_skips_formatting() {
        let buffer = CaptureBuffer::new();
        let logger = plain_logger(&buffer, Severity::ERROR);
        let evaluated = Cell::new(false);

        info!(logger, "never shown"; "expensive" => {
            evaluated.set(true);
            "value"
        });

        assert!(!evaluated.get());
        assert!(buffer.is_empty());
    }
}
