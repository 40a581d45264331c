//! Webhook signal payload and validation.

use crate::error::HandlerError;
use perpctl_core::Direction;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The recognized entry action.
const ENTRY_ACTION: &str = "entry";

/// Raw webhook payload:
/// `{"signal": "entry", "position": "long"|"short", "strength"?: number}`.
///
/// Fields are kept as wire strings so that an unrecognized value is
/// classified as `InvalidSignal` (HTTP 400) rather than failing in
/// deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeSignal {
    pub signal: String,
    pub position: String,
    #[serde(default)]
    pub strength: Option<Decimal>,
}

/// A validated entry signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidSignal {
    pub direction: Direction,
    pub strength: Decimal,
}

impl TradeSignal {
    /// Validate the payload. Rejects unknown actions, unknown
    /// directions, and non-positive strength; strength defaults to 1.
    pub fn validate(&self) -> Result<ValidSignal, HandlerError> {
        if self.signal != ENTRY_ACTION {
            return Err(HandlerError::InvalidSignal(format!(
                "unrecognized action {:?}",
                self.signal
            )));
        }

        let direction: Direction = self
            .position
            .parse()
            .map_err(|_| HandlerError::InvalidSignal(format!(
                "unrecognized position {:?}",
                self.position
            )))?;

        let strength = self.strength.unwrap_or(Decimal::ONE);
        if strength <= Decimal::ZERO {
            return Err(HandlerError::InvalidSignal(format!(
                "strength must be positive, got {strength}"
            )));
        }

        Ok(ValidSignal {
            direction,
            strength,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn signal(action: &str, position: &str, strength: Option<Decimal>) -> TradeSignal {
        TradeSignal {
            signal: action.to_string(),
            position: position.to_string(),
            strength,
        }
    }

    #[test]
    fn test_valid_entry_signal() {
        let valid = signal("entry", "long", Some(dec!(1.5))).validate().unwrap();
        assert_eq!(valid.direction, Direction::Long);
        assert_eq!(valid.strength, dec!(1.5));
    }

    #[test]
    fn test_strength_defaults_to_one() {
        let valid = signal("entry", "short", None).validate().unwrap();
        assert_eq!(valid.direction, Direction::Short);
        assert_eq!(valid.strength, Decimal::ONE);
    }

    #[test]
    fn test_rejects_unknown_action() {
        let error = signal("exit", "long", None).validate().unwrap_err();
        assert!(matches!(error, HandlerError::InvalidSignal(_)));
    }

    #[test]
    fn test_rejects_unknown_position() {
        let error = signal("entry", "flat", None).validate().unwrap_err();
        assert!(matches!(error, HandlerError::InvalidSignal(_)));
    }

    #[test]
    fn test_rejects_non_positive_strength() {
        assert!(signal("entry", "long", Some(dec!(0))).validate().is_err());
        assert!(signal("entry", "long", Some(dec!(-1))).validate().is_err());
    }

    #[test]
    fn test_payload_deserialization() {
        let payload: TradeSignal =
            serde_json::from_str(r#"{"signal":"entry","position":"long","strength":1.0}"#)
                .unwrap();
        assert_eq!(payload.signal, "entry");
        assert_eq!(payload.position, "long");
        assert_eq!(payload.strength, Some(dec!(1.0)));
    }
}
