//! Check-vote tallying shared by the analytical analysts.

use quorum_core::{Reasoning, SignalDirection, SignalRecord};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Accumulates named checks, each voting long (+1), short (-1) or flat (0),
/// and folds them into a signal record with structured reasoning.
pub(crate) struct Ballot {
    checks: Vec<(String, i8, Value)>,
}

impl Ballot {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn cast(&mut self, check: impl Into<String>, bias: i8, observed: Value) {
        self.checks.push((check.into(), bias.signum(), observed));
    }

    pub fn into_record(self) -> SignalRecord {
        let total = self.checks.len() as i64;
        let net: i64 = self.checks.iter().map(|(_, bias, _)| *bias as i64).sum();

        let direction = match net.signum() {
            1 => SignalDirection::Bullish,
            -1 => SignalDirection::Bearish,
            _ => SignalDirection::Neutral,
        };

        let confidence = if total == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(net.abs() * 100) / Decimal::from(total)
        };

        let mut detail = Map::new();
        for (check, bias, observed) in self.checks {
            let vote = match bias {
                1 => "bullish",
                -1 => "bearish",
                _ => "neutral",
            };
            detail.insert(
                check,
                serde_json::json!({ "vote": vote, "observed": observed }),
            );
        }

        SignalRecord::new(direction)
            .with_confidence(confidence)
            .with_reasoning(Reasoning::Structured(Value::Object(detail)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unanimous_vote_full_confidence() {
        let mut ballot = Ballot::new();
        ballot.cast("a", 1, Value::Null);
        ballot.cast("b", 1, Value::Null);
        let record = ballot.into_record();
        assert_eq!(record.direction, SignalDirection::Bullish);
        assert_eq!(record.confidence, Some(dec!(100)));
    }

    #[test]
    fn test_split_vote_is_neutral() {
        let mut ballot = Ballot::new();
        ballot.cast("a", 1, Value::Null);
        ballot.cast("b", -1, Value::Null);
        let record = ballot.into_record();
        assert_eq!(record.direction, SignalDirection::Neutral);
        assert_eq!(record.confidence, Some(Decimal::ZERO));
    }

    #[test]
    fn test_empty_ballot_neutral_zero() {
        let record = Ballot::new().into_record();
        assert_eq!(record.direction, SignalDirection::Neutral);
        assert_eq!(record.confidence, Some(Decimal::ZERO));
    }
}
