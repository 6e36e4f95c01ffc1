//! InfluxDB line protocol rendering for [`Point`]s.
//!
//! This is the write-client boundary: tag values become strings here and
//! nowhere earlier. The format is
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp]
//! ```
//!
//! Null fields, non-finite floats, and nested collections are not
//! representable and are skipped. Null and empty tag values are skipped too.

use crate::descriptor::VALUE_COLUMN;
use crate::error::{EncodeError, Result};
use crate::point::Point;
use crate::value::Value;

impl Point {
    /// Renders the point as one line of line protocol.
    ///
    /// The scalar value is written as the `value` field, replacing any
    /// declared field of the same key.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::EmptyPoint`] if no field survives rendering.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pointmap::point::Point;
    ///
    /// let line = Point::new("cpu load")
    ///     .with_tag("host", "web 1")
    ///     .with_field("cores", 8_i64)
    ///     .with_value(0.5)
    ///     .with_timestamp(1_609_459_200)
    ///     .to_line_protocol()?;
    /// assert_eq!(line, r"cpu\ load,host=web\ 1 cores=8i,value=0.5 1609459200");
    /// # Ok::<(), pointmap::MapError>(())
    /// ```
    pub fn to_line_protocol(&self) -> Result<String> {
        let mut line = String::new();
        escape_into(&mut line, &self.measurement, &[',', ' ']);

        for (key, value) in &self.tags {
            let rendered = value.to_string();
            if rendered.is_empty() || matches!(value, Value::Metrics(_)) {
                continue;
            }
            line.push(',');
            escape_into(&mut line, key, &[',', '=', ' ']);
            line.push('=');
            escape_into(&mut line, &rendered, &[',', '=', ' ']);
        }

        let mut fields = self
            .fields
            .iter()
            .filter(|(key, _)| self.value.is_none() || key.as_str() != VALUE_COLUMN)
            .map(|(key, value)| (key.as_str(), value))
            .collect::<Vec<_>>();
        if let Some(value) = &self.value {
            fields.push((VALUE_COLUMN, value));
        }

        let mut written = 0;
        for (key, value) in fields {
            let Some(rendered) = render_field(value) else {
                continue;
            };
            line.push(if written == 0 { ' ' } else { ',' });
            escape_into(&mut line, key, &[',', '=', ' ']);
            line.push('=');
            line.push_str(&rendered);
            written += 1;
        }

        if written == 0 {
            return Err(EncodeError::EmptyPoint {
                measurement: self.measurement.clone(),
            }
            .into());
        }

        if let Some(timestamp) = self.timestamp {
            line.push(' ');
            line.push_str(&timestamp.to_string());
        }

        Ok(line)
    }
}

/// Renders a batch, one point per line.
///
/// # Errors
///
/// Returns the first [`EncodeError`] encountered.
pub fn encode_batch(points: &[Point]) -> Result<String> {
    let mut lines = Vec::with_capacity(points.len());
    for point in points {
        lines.push(point.to_line_protocol()?);
    }
    Ok(lines.join("\n"))
}

fn render_field(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Metrics(_) => None,
        Value::Float(f) if !f.is_finite() => None,
        Value::Float(f) => Some(f.to_string()),
        Value::Integer(i) => Some(format!("{i}i")),
        Value::Boolean(b) => Some(b.to_string()),
        Value::String(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('"');
            escape_into(&mut out, s, &['"', '\\']);
            out.push('"');
            Some(out)
        }
    }
}

fn escape_into(out: &mut String, text: &str, special: &[char]) {
    for c in text.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapError;

    #[test]
    fn test_field_types() {
        let line = Point::new("m")
            .with_field("b", true)
            .with_field("f", 1.0)
            .with_field("i", -3_i64)
            .with_field("s", r#"say "hi" \o/"#)
            .to_line_protocol()
            .unwrap();
        assert_eq!(line, r#"m b=true,f=1,i=-3i,s="say \"hi\" \\o/""#);
    }

    #[test]
    fn test_tags_are_stringified_and_escaped() {
        let line = Point::new("m")
            .with_tag("core", 3_i64)
            .with_tag("k=v", "a,b")
            .with_tag("empty", "")
            .with_field("x", 1_i64)
            .to_line_protocol()
            .unwrap();
        assert_eq!(line, r"m,core=3,k\=v=a\,b x=1i");
    }

    #[test]
    fn test_value_replaces_declared_value_field() {
        let line = Point::new("m")
            .with_field("value", 1_i64)
            .with_value(2.5)
            .to_line_protocol()
            .unwrap();
        assert_eq!(line, "m value=2.5");
    }

    #[test]
    fn test_empty_point_rejected() {
        let err = Point::new("m")
            .with_tag("host", "a")
            .with_field("n", Value::Null)
            .to_line_protocol()
            .unwrap_err();
        assert!(matches!(err, MapError::Encode(EncodeError::EmptyPoint { .. })));
    }

    #[test]
    fn test_encode_batch() {
        let points = [
            Point::new("a").with_field("x", 1_i64).with_timestamp(1),
            Point::new("b").with_field("y", false),
        ];
        assert_eq!(encode_batch(&points).unwrap(), "a x=1i 1\nb y=false");
    }
}
