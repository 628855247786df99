//! Common utilities shared by the CLI, the API client and the runner

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

use rand::Rng;

/// Random number used to make created names and emails unique
pub fn random_suffix() -> u32 {
    rand::thread_rng().gen_range(0..1_000_000)
}

/// Shorten a response body for inclusion in an error message
pub fn truncate_body(body: &str, max: usize) -> String {
    if body.chars().count() > max {
        let cut: String = body.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short", 10), "short");
        assert_eq!(truncate_body("0123456789abc", 10), "0123456789...");
        assert_eq!(truncate_body("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_random_suffix_range() {
        for _ in 0..100 {
            assert!(random_suffix() < 1_000_000);
        }
    }
}
