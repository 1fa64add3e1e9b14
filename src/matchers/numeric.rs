use crate::wire::DataTypeWire;

use super::MatcherInput;

const MILLIS_PER_MINUTE: i64 = 60 * 1000;
const MILLIS_PER_DAY: i64 = 24 * 60 * MILLIS_PER_MINUTE;

/// How numeric matchers interpret both their input and their configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericDataType {
    /// Plain integer.
    Number,
    /// Epoch milliseconds with seconds and milliseconds zeroed.
    DateTimeZeroSecond,
    /// Epoch milliseconds truncated to UTC midnight.
    DateTimeZeroTime,
}

impl NumericDataType {
    /// `EQUAL_TO` compares dates by day, the other numeric matchers by minute.
    pub(crate) fn for_equality(data_type: DataTypeWire) -> Self {
        match data_type {
            DataTypeWire::Number => NumericDataType::Number,
            DataTypeWire::Datetime => NumericDataType::DateTimeZeroTime,
        }
    }

    pub(crate) fn for_range(data_type: DataTypeWire) -> Self {
        match data_type {
            DataTypeWire::Number => NumericDataType::Number,
            DataTypeWire::Datetime => NumericDataType::DateTimeZeroSecond,
        }
    }

    /// Convert a configured bound or a coerced input.
    pub fn normalize(self, value: i64) -> i64 {
        match self {
            NumericDataType::Number => value,
            NumericDataType::DateTimeZeroSecond => value - value.rem_euclid(MILLIS_PER_MINUTE),
            NumericDataType::DateTimeZeroTime => value - value.rem_euclid(MILLIS_PER_DAY),
        }
    }

    /// Coerce a matcher input into a normalized integer. Returns `None` if the input is not
    /// integral.
    pub(crate) fn coerce(self, input: &MatcherInput) -> Option<i64> {
        input.as_integer().map(|value| self.normalize(value))
    }
}

/// Parse integers the lenient way: numbers are truncated and numeric strings are parsed.
/// Booleans are rejected even though they are integral elsewhere: `true` is not `1`.
pub(crate) fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|n| n.trunc() as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_integer, NumericDataType};

    #[test]
    fn normalizes_dates() {
        // 2024-03-10T15:42:27.123Z
        let ts = 1710085347123;
        assert_eq!(NumericDataType::Number.normalize(ts), ts);
        // 2024-03-10T15:42:00Z
        assert_eq!(
            NumericDataType::DateTimeZeroSecond.normalize(ts),
            1710085320000
        );
        // 2024-03-10T00:00:00Z
        assert_eq!(NumericDataType::DateTimeZeroTime.normalize(ts), 1710028800000);
    }

    #[test]
    fn normalizes_dates_before_epoch() {
        // 1969-12-31T23:59:30Z truncates down, not towards zero.
        assert_eq!(NumericDataType::DateTimeZeroSecond.normalize(-30_000), -60_000);
        assert_eq!(NumericDataType::DateTimeZeroTime.normalize(-1), -86_400_000);
    }

    #[test]
    fn parses_integers() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer(" -7 "), Some(-7));
        assert_eq!(parse_integer("3.9"), Some(3));
        assert_eq!(parse_integer("abc"), None);
        assert_eq!(parse_integer("NaN"), None);
        assert_eq!(parse_integer("true"), None);
    }
}
