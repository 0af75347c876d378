use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Spot {
    pub id: i64,
    pub session_id: i64,
    #[sqlx(rename = "seat_row")]
    pub row: String,
    pub number: i32,
    pub transaction_id: Option<i64>,
}

impl Spot {
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.number)
    }

    pub fn is_reserved(&self) -> bool {
        self.transaction_id.is_some()
    }
}

/// One cell of a session's seat grid before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpotSeed {
    pub row: String,
    pub number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatLabelError {
    #[error("seat label is empty")]
    Empty,
    #[error("seat label '{0}' has no row letter")]
    MissingRow(String),
    #[error("seat label '{0}' has no seat number")]
    MissingNumber(String),
    #[error("seat label '{0}' has an invalid seat number")]
    InvalidNumber(String),
}

/// A seat as the client names it: row letters followed by the seat number, e.g. `C12`.
///
/// Letters are kept as written; lookups are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatLabel {
    pub row: String,
    pub number: i32,
}

impl FromStr for SeatLabel {
    type Err = SeatLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SeatLabelError::Empty);
        }

        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(s.len());
        let (row, digits) = s.split_at(split);

        if row.is_empty() {
            return Err(SeatLabelError::MissingRow(s.to_string()));
        }
        if digits.is_empty() {
            return Err(SeatLabelError::MissingNumber(s.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SeatLabelError::InvalidNumber(s.to_string()));
        }

        let number = digits
            .parse::<i32>()
            .map_err(|_| SeatLabelError::InvalidNumber(s.to_string()))?;

        Ok(SeatLabel {
            row: row.to_string(),
            number,
        })
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(row: &str, number: i32) -> SeatLabel {
        SeatLabel { row: row.to_string(), number }
    }

    #[test]
    fn parses_single_and_multi_letter_rows() {
        assert_eq!("A1".parse(), Ok(label("A", 1)));
        assert_eq!("C12".parse(), Ok(label("C", 12)));
        assert_eq!("AB7".parse(), Ok(label("AB", 7)));
    }

    #[test]
    fn keeps_case_and_leading_zeros_resolve_to_the_same_seat() {
        assert_eq!("a3".parse(), Ok(label("a", 3)));
        assert_eq!("B07".parse(), Ok(label("B", 7)));
    }

    #[test]
    fn zero_is_a_well_formed_label_that_matches_no_seat() {
        assert_eq!("A0".parse(), Ok(label("A", 0)));
    }

    #[test]
    fn rejects_malformed_labels() {
        assert_eq!("".parse::<SeatLabel>(), Err(SeatLabelError::Empty));
        assert_eq!("12".parse::<SeatLabel>(), Err(SeatLabelError::MissingRow("12".into())));
        assert_eq!("A".parse::<SeatLabel>(), Err(SeatLabelError::MissingNumber("A".into())));
        assert_eq!("A-1".parse::<SeatLabel>(), Err(SeatLabelError::InvalidNumber("A-1".into())));
        assert_eq!("A1B".parse::<SeatLabel>(), Err(SeatLabelError::InvalidNumber("A1B".into())));
        assert_eq!(" A1".parse::<SeatLabel>(), Err(SeatLabelError::MissingRow(" A1".into())));
    }

    #[test]
    fn rejects_numbers_that_overflow() {
        assert_eq!(
            "A99999999999".parse::<SeatLabel>(),
            Err(SeatLabelError::InvalidNumber("A99999999999".into()))
        );
    }

    #[test]
    fn display_matches_the_wire_format() {
        assert_eq!(label("C", 12).to_string(), "C12");
        let spot = Spot { id: 1, session_id: 1, row: "AA".into(), number: 3, transaction_id: None };
        assert_eq!(spot.label(), "AA3");
        assert!(!spot.is_reserved());
    }
}
