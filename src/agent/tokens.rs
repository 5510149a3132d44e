//! Token budget estimation
//!
//! The conversation model only needs a count to compare against its budget,
//! so the estimator is pluggable. Closures work too.

/// Counts tokens in a piece of text
pub trait TokenEstimator: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Heuristic token count: bytes / 4
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn count(&self, text: &str) -> usize {
        text.len() / 4
    }
}

impl<F> TokenEstimator for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_estimator() {
        assert_eq!(HeuristicEstimator.count(""), 0);
        assert_eq!(HeuristicEstimator.count("abcdefgh"), 2);
    }

    #[test]
    fn test_closure_estimator() {
        let words = |text: &str| text.split_whitespace().count();
        assert_eq!(words.count("one two three"), 3);
    }
}
