use std::{fmt, str::FromStr};

use zdom::Color;

use crate::{config::MalformedIdPolicy, error::SqError, SqResult};

pub const SEPARATOR: char = ',';

/// Stand-in for a missing coordinate under the lenient policy.
const MISSING_COORD: &str = "undefined";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SquarePos {
    pub row: i32,
    pub col: i32,
}

impl SquarePos {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Name of the class that the hover rule for this square targets.
    pub fn move_class(&self) -> String {
        move_class(&self.row.to_string(), &self.col.to_string())
    }
}

impl fmt::Display for SquarePos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}", self.row, SEPARATOR, self.col)
    }
}

/// Only the exact text `Display` produces is accepted: no whitespace, no `+`
/// sign, no leading zeros. A valid id is therefore its own canonical form.
impl FromStr for SquarePos {
    type Err = SqError;

    fn from_str(s: &str) -> SqResult<Self> {
        let malformed = || SqError::MalformedSquareId { id: s.to_string() };
        let mut parts = s.split(SEPARATOR);
        let row = parts.next().ok_or_else(malformed)?;
        let col = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }
        let row = parse_coord(row).ok_or_else(malformed)?;
        let col = parse_coord(col).ok_or_else(malformed)?;
        Ok(Self { row, col })
    }
}

fn parse_coord(s: &str) -> Option<i32> {
    let n: i32 = s.parse().ok()?;
    if n.to_string() == s {
        Some(n)
    } else {
        None
    }
}

fn move_class(row: &str, col: &str) -> String {
    format!("move-{}-{}", row, col)
}

/// Builds the single rule the style slot holds while `id` is hovered.
pub fn highlight_rule(id: &str, color: Color, policy: MalformedIdPolicy) -> SqResult<String> {
    let class = match policy {
        MalformedIdPolicy::Reject => id.parse::<SquarePos>()?.move_class(),
        MalformedIdPolicy::Lenient => {
            let mut parts = id.split(SEPARATOR);
            let row = parts.next().unwrap_or(MISSING_COORD);
            let col = parts.next().unwrap_or(MISSING_COORD);
            move_class(row, col)
        }
    };
    Ok(format!(".{}{{background-color: {}}}", class, color))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::HIGHLIGHT_COLOR;

    #[test]
    fn pos_round_trips_through_id() {
        let pos = SquarePos::new(3, 7);
        assert_eq!(pos.to_string(), "3,7");
        assert_eq!("3,7".parse::<SquarePos>().unwrap(), pos);
        assert_eq!("-1,0".parse::<SquarePos>().unwrap(), SquarePos::new(-1, 0));
    }

    #[test]
    fn pos_parse_rejects_malformed_ids() {
        let ids = [
            "7", "", "1,2,3", "a,b", "1,", ",1", " 3,7", "3 ,7", "03,7", "3,+7", "-0,1",
        ];
        for id in &ids {
            let err = id.parse::<SquarePos>().unwrap_err();
            assert!(
                matches!(&err, SqError::MalformedSquareId { id: bad } if bad == id),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn rule_for_valid_id() {
        let rule = highlight_rule("2,3", HIGHLIGHT_COLOR, MalformedIdPolicy::Reject).unwrap();
        assert_eq!(rule, ".move-2-3{background-color: rgba(255, 255, 100, 0.9)}");
        let lenient = highlight_rule("2,3", HIGHLIGHT_COLOR, MalformedIdPolicy::Lenient).unwrap();
        assert_eq!(lenient, rule);
    }

    #[test]
    fn lenient_rule_keeps_legacy_quirks() {
        let policy = MalformedIdPolicy::Lenient;
        assert_eq!(
            highlight_rule("7", HIGHLIGHT_COLOR, policy).unwrap(),
            ".move-7-undefined{background-color: rgba(255, 255, 100, 0.9)}"
        );
        assert_eq!(
            highlight_rule("1,2,3", HIGHLIGHT_COLOR, policy).unwrap(),
            ".move-1-2{background-color: rgba(255, 255, 100, 0.9)}"
        );
    }

    #[test]
    fn strict_rule_is_built_from_the_literal_id() {
        let result = highlight_rule("03,+7", HIGHLIGHT_COLOR, MalformedIdPolicy::Reject);
        assert!(matches!(result, Err(SqError::MalformedSquareId { ref id }) if id == "03,+7"));
        let rule = highlight_rule("-2,10", HIGHLIGHT_COLOR, MalformedIdPolicy::Reject).unwrap();
        assert_eq!(rule, ".move--2-10{background-color: rgba(255, 255, 100, 0.9)}");
    }

    #[test]
    fn strict_rule_rejects_missing_separator() {
        let result = highlight_rule("7", HIGHLIGHT_COLOR, MalformedIdPolicy::Reject);
        assert!(matches!(result, Err(SqError::MalformedSquareId { .. })));
    }
}
