//! Comparison operators and their YAML tokens.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::schema::Threshold;

/// Tolerance used by equality and membership tests.
const EPSILON: f64 = f64::EPSILON;

/// Comparison operator of a [`Condition`](super::Condition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
    In,
    NotIn,
}

impl Operator {
    /// Every accepted YAML token, in declaration order.
    pub const TOKENS: [&'static str; 8] = [">", ">=", "<", "<=", "==", "!=", "in", "not_in"];

    /// The YAML token for this operator.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::In => "in",
            Operator::NotIn => "not_in",
        }
    }

    /// Whether this operator expects a list threshold.
    pub fn is_membership(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Whether `threshold` has the shape this operator expects.
    pub fn accepts(self, threshold: &Threshold) -> bool {
        match threshold {
            Threshold::Number(_) => !self.is_membership(),
            Threshold::Set(_) => self.is_membership(),
        }
    }

    /// Apply the operator to `value` (left) and `threshold` (right).
    ///
    /// A threshold of the wrong shape yields `false` rather than an error.
    pub fn apply(self, value: f64, threshold: &Threshold) -> bool {
        match (self, threshold) {
            (Operator::Gt, Threshold::Number(t)) => value > *t,
            (Operator::Gte, Threshold::Number(t)) => value >= *t,
            (Operator::Lt, Threshold::Number(t)) => value < *t,
            (Operator::Lte, Threshold::Number(t)) => value <= *t,
            (Operator::Eq, Threshold::Number(t)) => (value - t).abs() <= EPSILON,
            (Operator::Neq, Threshold::Number(t)) => (value - t).abs() > EPSILON,
            (Operator::In, Threshold::Set(set)) => contains(set, value),
            (Operator::NotIn, Threshold::Set(set)) => !contains(set, value),
            _ => false,
        }
    }
}

fn contains(set: &[f64], value: f64) -> bool {
    set.iter().any(|t| (value - t).abs() <= EPSILON)
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Neq),
            "in" => Ok(Operator::In),
            "not_in" => Ok(Operator::NotIn),
            other => Err(format!("unknown operator: '{}'", other)),
        }
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_from_str() {
        for token in Operator::TOKENS {
            let op: Operator = token.parse().unwrap();
            assert_eq!(op.token(), token);
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "=>".parse::<Operator>().unwrap_err();
        assert!(err.contains("=>"));
    }

    #[test]
    fn membership_operators_want_lists() {
        assert!(Operator::In.accepts(&Threshold::Set(vec![1.0])));
        assert!(!Operator::In.accepts(&Threshold::Number(1.0)));
        assert!(Operator::Gt.accepts(&Threshold::Number(1.0)));
        assert!(!Operator::Gt.accepts(&Threshold::Set(vec![])));
    }

    #[test]
    fn mismatched_threshold_is_false() {
        assert!(!Operator::Gt.apply(1.0, &Threshold::Set(vec![0.0])));
        assert!(!Operator::NotIn.apply(1.0, &Threshold::Number(0.0)));
    }
}
