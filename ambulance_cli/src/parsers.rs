use jiff::{SpanRelativeTo, civil::DateTime};

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_secs(seconds.abs()));
    }

    Err(String::from("Invalid duration"))
}

/// Accepts a full civil datetime or a date, which starts at midnight.
pub fn parse_datetime(input: &str) -> Result<DateTime, String> {
    if let Ok(datetime) = input.parse::<DateTime>() {
        return Ok(datetime);
    }

    input
        .parse::<jiff::civil::Date>()
        .map(|date| date.at(0, 0, 0, 0))
        .map_err(|_| format!("Invalid date '{input}'"))
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, civil::date};

    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s"), Ok(SignedDuration::from_secs(30)));
        assert_eq!(parse_duration("PT1H30M"), Ok(SignedDuration::from_mins(90)));
        assert_eq!(parse_duration("90"), Ok(SignedDuration::from_secs(90)));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(
            parse_datetime("2018-01-08"),
            Ok(date(2018, 1, 8).at(0, 0, 0, 0))
        );
        assert_eq!(
            parse_datetime("2018-01-08T08:30"),
            Ok(date(2018, 1, 8).at(8, 30, 0, 0))
        );
        assert!(parse_datetime("monday").is_err());
    }
}
