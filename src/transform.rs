use serde::{Deserialize, Serialize};
use crate::dataframe::CellValue;

/// Per-column coercion declared in a schema definition's `transformations`
/// table. Keys in that table are source column names: transformations run
/// before any rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Int,
    Float,
    String,
}

/// Coerce a single cell. Numeric coercions turn unparseable input into
/// `Null` rather than failing; string coercion always succeeds.
pub fn coerce(value: &CellValue, kind: TransformKind) -> CellValue {
    match kind {
        TransformKind::Int => coerce_int(value),
        TransformKind::Float => coerce_float(value),
        TransformKind::String => coerce_string(value),
    }
}

fn coerce_int(value: &CellValue) -> CellValue {
    match value {
        CellValue::Null => CellValue::Null,
        CellValue::Int(i) => CellValue::Int(*i),
        CellValue::Bool(b) => CellValue::Int(i64::from(*b)),
        CellValue::Float(x) if x.is_finite() => CellValue::Int(x.trunc() as i64),
        CellValue::Float(_) => CellValue::Null,
        CellValue::Str(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                CellValue::Int(i)
            } else if let Ok(x) = trimmed.parse::<f64>() {
                if x.is_finite() {
                    CellValue::Int(x.trunc() as i64)
                } else {
                    CellValue::Null
                }
            } else {
                CellValue::Null
            }
        }
    }
}

fn coerce_float(value: &CellValue) -> CellValue {
    match value {
        CellValue::Null => CellValue::Null,
        CellValue::Int(i) => CellValue::Float(*i as f64),
        CellValue::Float(x) => CellValue::Float(*x),
        CellValue::Bool(b) => CellValue::Float(if *b { 1.0 } else { 0.0 }),
        CellValue::Str(s) => match s.trim().parse::<f64>() {
            Ok(x) => CellValue::Float(x),
            Err(_) => CellValue::Null,
        },
    }
}

fn coerce_string(value: &CellValue) -> CellValue {
    match value {
        // A null cell has no text representation; it stays null.
        CellValue::Null => CellValue::Null,
        CellValue::Str(s) => CellValue::Str(s.clone()),
        other => CellValue::Str(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_coercion_from_string() {
        assert_eq!(coerce(&"2010".into(), TransformKind::Int), CellValue::Int(2010));
        assert_eq!(coerce(&" 42 ".into(), TransformKind::Int), CellValue::Int(42));
        assert_eq!(coerce(&"9.9".into(), TransformKind::Int), CellValue::Int(9));
    }

    #[test]
    fn test_int_coercion_bad_input_is_null() {
        assert_eq!(coerce(&"not a number".into(), TransformKind::Int), CellValue::Null);
        assert_eq!(coerce(&"".into(), TransformKind::Int), CellValue::Null);
        assert_eq!(coerce(&CellValue::Float(f64::NAN), TransformKind::Int), CellValue::Null);
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(coerce(&"9.1".into(), TransformKind::Float), CellValue::Float(9.1));
        assert_eq!(coerce(&CellValue::Int(3), TransformKind::Float), CellValue::Float(3.0));
        assert_eq!(coerce(&"oops".into(), TransformKind::Float), CellValue::Null);
    }

    #[test]
    fn test_string_coercion_always_succeeds() {
        assert_eq!(
            coerce(&CellValue::Int(1995), TransformKind::String),
            CellValue::Str("1995".to_string())
        );
        assert_eq!(
            coerce(&CellValue::Bool(false), TransformKind::String),
            CellValue::Str("false".to_string())
        );
        assert_eq!(coerce(&CellValue::Null, TransformKind::String), CellValue::Null);
    }

    #[test]
    fn test_null_propagates_through_numeric_kinds() {
        assert_eq!(coerce(&CellValue::Null, TransformKind::Int), CellValue::Null);
        assert_eq!(coerce(&CellValue::Null, TransformKind::Float), CellValue::Null);
    }

    #[test]
    fn test_kind_deserializes_lowercase() {
        let kind: TransformKind = serde_json::from_str("\"int\"").unwrap();
        assert_eq!(kind, TransformKind::Int);
        assert!(serde_json::from_str::<TransformKind>("\"Integer\"").is_err());
    }
}
