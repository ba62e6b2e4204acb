//! Folding clause verdicts into a row decision.
//!
//! An empty clause list keeps every row under either combinator. Both folds
//! short-circuit, so callers that pass a lazy iterator skip the remaining
//! clauses once the outcome is settled.

use crate::evaluate::Verdict;
use crate::filter::Combinator;

/// Combine per-clause verdicts for one row.
///
/// [`Verdict::Unconstrained`] counts as satisfied under both combinators.
pub fn combine<I>(combinator: Combinator, verdicts: I) -> bool
where
    I: IntoIterator<Item = Verdict>,
{
    combine_bools(combinator, verdicts.into_iter().map(Verdict::is_pass))
}

/// Combine plain clause outcomes for one row.
pub fn combine_bools<I>(combinator: Combinator, outcomes: I) -> bool
where
    I: IntoIterator<Item = bool>,
{
    let mut outcomes = outcomes.into_iter().peekable();
    if outcomes.peek().is_none() {
        return true;
    }
    match combinator {
        Combinator::And => outcomes.all(|pass| pass),
        Combinator::Or => outcomes.any(|pass| pass),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_keeps_row() {
        assert!(combine(Combinator::And, []));
        assert!(combine(Combinator::Or, []));
    }

    #[test]
    fn test_and() {
        assert!(combine(Combinator::And, [Verdict::Pass, Verdict::Unconstrained]));
        assert!(!combine(Combinator::And, [Verdict::Pass, Verdict::Reject]));
    }

    #[test]
    fn test_or() {
        assert!(combine(Combinator::Or, [Verdict::Reject, Verdict::Pass]));
        assert!(combine(Combinator::Or, [Verdict::Reject, Verdict::Unconstrained]));
        assert!(!combine(Combinator::Or, [Verdict::Reject, Verdict::Reject]));
    }

    #[test]
    fn test_short_circuit() {
        let mut seen = 0;
        let outcome = combine_bools(
            Combinator::And,
            [false, true, true].into_iter().inspect(|_| seen += 1),
        );
        assert!(!outcome);
        assert_eq!(seen, 1);

        let mut seen = 0;
        let outcome = combine_bools(
            Combinator::Or,
            [false, true, false].into_iter().inspect(|_| seen += 1),
        );
        assert!(outcome);
        assert_eq!(seen, 2);
    }
}
