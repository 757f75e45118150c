//! Typed views over the `decision` and `cost` fields of a reply.
//!
//! Replies to game prompts are expected to carry `"decision": "a_<id> = <0|1>"`
//! and `"cost": "c = <number>"`. These helpers parse those strings and report
//! why a reply did not conform.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::NormalizedReply;

pub const DECISION_KEY: &str = "decision";
pub const COST_KEY: &str = "cost";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("reply was not structured output")]
    Unparsed,
    #[error("missing '{key}'")]
    Missing { key: String },
    #[error("'{key}' is not a string")]
    NotText { key: String },
    #[error("malformed '{key}' value {value:?}: {reason}")]
    Malformed {
        key: String,
        value: String,
        reason: String,
    },
}

impl FieldError {
    fn malformed(key: &str, value: &str, reason: impl Into<String>) -> Self {
        FieldError::Malformed {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Binary action in the network games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `a_i = 0`
    Abstain,
    /// `a_i = 1`
    Engage,
}

impl Action {
    pub fn as_bit(self) -> u8 {
        match self {
            Action::Abstain => 0,
            Action::Engage => 1,
        }
    }
}

/// A player's choice, parsed from `a_<id> = <0|1>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decision {
    pub player: u32,
    pub action: Action,
}

impl FromStr for Decision {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((lhs, rhs)) = s.split_once('=') else {
            return Err(FieldError::malformed(DECISION_KEY, s, "expected 'a_<id> = <0|1>'"));
        };
        let Some((_, id)) = lhs.split_once('_') else {
            return Err(FieldError::malformed(DECISION_KEY, s, "missing '_' before player id"));
        };
        let player: u32 = id
            .trim()
            .parse()
            .map_err(|e| FieldError::malformed(DECISION_KEY, s, format!("player id: {e}")))?;
        let action = match rhs.trim() {
            "0" => Action::Abstain,
            "1" => Action::Engage,
            other => {
                return Err(FieldError::malformed(
                    DECISION_KEY,
                    s,
                    format!("action must be 0 or 1, got '{other}'"),
                ));
            }
        };
        Ok(Decision { player, action })
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a_{} = {}", self.player, self.action.as_bit())
    }
}

/// Cost of engaging, parsed from `c = <number>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cost(pub f64);

impl FromStr for Cost {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((_, rhs)) = s.split_once('=') else {
            return Err(FieldError::malformed(COST_KEY, s, "expected 'c = <number>'"));
        };
        let value: f64 = rhs
            .trim()
            .parse()
            .map_err(|e| FieldError::malformed(COST_KEY, s, format!("{e}")))?;
        if !value.is_finite() {
            return Err(FieldError::malformed(COST_KEY, s, "cost must be finite"));
        }
        Ok(Cost(value))
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c = {}", self.0)
    }
}

impl NormalizedReply {
    /// Parse the `decision` field.
    pub fn decision(&self) -> Result<Decision, FieldError> {
        self.required_text(DECISION_KEY)?.parse()
    }

    /// Parse the `cost` field.
    pub fn cost(&self) -> Result<Cost, FieldError> {
        self.required_text(COST_KEY)?.parse()
    }

    fn required_text(&self, key: &str) -> Result<&str, FieldError> {
        if self.is_fallback() {
            return Err(FieldError::Unparsed);
        }
        match self.get(key) {
            None => Err(FieldError::Missing {
                key: key.to_string(),
            }),
            Some(v) => v.as_str().ok_or_else(|| FieldError::NotText {
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn parse_decision_with_spacing_variants() {
        let d: Decision = "a_3 = 1".parse().expect("parse ok");
        assert_eq!(d.player, 3);
        assert_eq!(d.action, Action::Engage);

        let d: Decision = "a_12=0".parse().expect("parse ok");
        assert_eq!(d.player, 12);
        assert_eq!(d.action, Action::Abstain);
        assert_eq!(d.to_string(), "a_12 = 0");
    }

    #[test]
    fn decision_rejects_non_binary_action() {
        let err = "a_1 = 2".parse::<Decision>().unwrap_err();
        assert!(matches!(err, FieldError::Malformed { .. }));
        assert!(err.to_string().contains("0 or 1"));

        assert!("a_1 = <your decision>".parse::<Decision>().is_err());
        assert!("a_x = 1".parse::<Decision>().is_err());
        assert!("1".parse::<Decision>().is_err());
    }

    #[test]
    fn parse_cost() {
        let c: Cost = "c = 0.5".parse().expect("parse ok");
        assert_eq!(c, Cost(0.5));
        assert_eq!("c=2".parse::<Cost>().expect("parse ok"), Cost(2.0));
        assert!("c = cheap".parse::<Cost>().is_err());
        assert!("c = inf".parse::<Cost>().is_err());
        assert!("0.5".parse::<Cost>().is_err());
    }

    #[test]
    fn reply_accessors_report_why() {
        let ok = normalize(r#"{"cost": "c = 1.0", "decision": "a_2 = 0", "reasoning": "r"}"#);
        assert_eq!(ok.cost().expect("cost"), Cost(1.0));
        assert_eq!(
            ok.decision().expect("decision"),
            Decision {
                player: 2,
                action: Action::Abstain
            }
        );
        assert_eq!(ok.text("reasoning"), Some("r"));

        let missing = normalize(r#"{"cost": "c = 1.0"}"#);
        assert_eq!(
            missing.decision().unwrap_err(),
            FieldError::Missing {
                key: DECISION_KEY.to_string()
            }
        );

        let numeric = normalize(r#"{"decision": 1}"#);
        assert_eq!(
            numeric.decision().unwrap_err(),
            FieldError::NotText {
                key: DECISION_KEY.to_string()
            }
        );

        let fallback = normalize("I choose to coordinate.");
        assert_eq!(fallback.cost().unwrap_err(), FieldError::Unparsed);
    }
}
