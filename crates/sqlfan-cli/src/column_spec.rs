//! Parsing of `--column` arguments for `sqlfan generate`
//!
//! ```text
//! qty:integer:1:100
//! price:float:0.5:99.5
//! label:string
//! day:date:2024-01-01:2024-12-31
//! seen:timestamp:2024-01-01T00:00:00/2024-01-02T00:00:00
//! active:boolean
//! ```
//!
//! Timestamp bounds are separated by `/` because they contain colons.

use chrono::{NaiveDate, NaiveDateTime};
use sqlfan_services::{ColumnKind, ColumnSpec};
use std::str::FromStr;

/// Parse one column spec; used as a clap value parser
pub fn parse(spec: &str) -> Result<ColumnSpec, String> {
    let (name, rest) = spec
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:TYPE[:ARGS], got '{}'", spec))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing column name in '{}'", spec));
    }

    let (kind, args) = match rest.split_once(':') {
        Some((kind, args)) => (kind, Some(args)),
        None => (rest, None),
    };

    let kind = match (kind.to_ascii_lowercase().as_str(), args) {
        ("integer" | "int", Some(args)) => {
            let (min, max) = bounds(args, ':', "integer")?;
            ColumnKind::Integer { min, max }
        }
        ("float", Some(args)) => {
            let (min, max) = bounds(args, ':', "float")?;
            ColumnKind::Float { min, max }
        }
        ("date", Some(args)) => {
            let (start, end) = bounds::<NaiveDate>(args, ':', "date")?;
            ColumnKind::Date { start, end }
        }
        ("timestamp", Some(args)) => {
            let (start, end) = bounds::<NaiveDateTime>(args, '/', "timestamp")?;
            ColumnKind::Timestamp { start, end }
        }
        ("string", None) => ColumnKind::String,
        ("boolean" | "bool", None) => ColumnKind::Boolean,
        ("string" | "boolean" | "bool", Some(_)) => {
            return Err(format!("type '{}' takes no arguments", kind));
        }
        ("integer" | "int" | "float" | "date" | "timestamp", None) => {
            return Err(format!("type '{}' needs a lower and an upper bound", kind));
        }
        (other, _) => return Err(format!("unknown column type '{}'", other)),
    };

    Ok(ColumnSpec::new(name, kind))
}

fn bounds<T: FromStr>(args: &str, separator: char, type_name: &str) -> Result<(T, T), String> {
    let (low, high) = args
        .split_once(separator)
        .ok_or_else(|| format!("{} bounds must be LOW{}HIGH, got '{}'", type_name, separator, args))?;
    let parse_one = |text: &str| {
        text.trim()
            .parse::<T>()
            .map_err(|_| format!("invalid {} bound '{}'", type_name, text))
    };
    Ok((parse_one(low)?, parse_one(high)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numeric_specs() {
        assert_eq!(
            parse("qty:integer:1:100").unwrap(),
            ColumnSpec::new("qty", ColumnKind::Integer { min: 1, max: 100 })
        );
        assert_eq!(
            parse("price:FLOAT:-0.5:9.5").unwrap(),
            ColumnSpec::new("price", ColumnKind::Float { min: -0.5, max: 9.5 })
        );
    }

    #[test]
    fn test_date_and_timestamp_specs() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(
            parse("day:date:2024-01-01:2024-12-31").unwrap(),
            ColumnSpec::new("day", ColumnKind::Date { start, end })
        );

        let spec = parse("seen:timestamp:2024-01-01T00:00:00/2024-01-01T12:30:00").unwrap();
        assert_eq!(
            spec.kind,
            ColumnKind::Timestamp {
                start: start.and_hms_opt(0, 0, 0).unwrap(),
                end: start.and_hms_opt(12, 30, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_argument_free_specs() {
        assert_eq!(parse("label:string").unwrap().kind, ColumnKind::String);
        assert_eq!(parse("active:bool").unwrap().kind, ColumnKind::Boolean);
    }

    #[test]
    fn test_rejects_malformed_specs() {
        assert!(parse("qty").unwrap_err().contains("NAME:TYPE"));
        assert!(parse(":string").unwrap_err().contains("missing column name"));
        assert!(parse("qty:integer").unwrap_err().contains("bound"));
        assert!(parse("qty:integer:1").unwrap_err().contains("LOW:HIGH"));
        assert!(parse("qty:integer:one:2").unwrap_err().contains("'one'"));
        assert!(parse("label:string:x").unwrap_err().contains("no arguments"));
        assert!(parse("blob:binary").unwrap_err().contains("unknown column type"));
    }
}
