//! Decimal parsing that tolerates locale-specific separators.
//!
//! Elevation headers and map exports written on machines with a `,` decimal
//! separator are common; strategies are tried in order until one succeeds.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberError {
    pub literal: String,
}

impl fmt::Display for NumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed numeric literal: {:?}", self.literal)
    }
}

impl std::error::Error for NumberError {}

pub fn parse_f64(literal: &str) -> Result<f64, NumberError> {
    let s = literal.trim();
    let err = || NumberError {
        literal: literal.to_string(),
    };
    if s.is_empty() {
        return Err(err());
    }

    if let Ok(v) = s.parse::<f64>() {
        return Ok(v);
    }

    let has_comma = s.contains(',');
    let has_dot = s.contains('.');

    // "12,5"
    if has_comma && !has_dot && s.matches(',').count() == 1 {
        if let Ok(v) = s.replace(',', ".").parse::<f64>() {
            return Ok(v);
        }
    }

    if has_comma && has_dot {
        let last_comma = s.rfind(',').unwrap_or(0);
        let last_dot = s.rfind('.').unwrap_or(0);
        let candidate = if last_comma > last_dot {
            // "1.234,5"
            s.replace('.', "").replace(',', ".")
        } else {
            // "1,234.5"
            s.replace(',', "")
        };
        if let Ok(v) = candidate.parse::<f64>() {
            return Ok(v);
        }
    }

    Err(err())
}

pub fn parse_usize(literal: &str) -> Result<usize, NumberError> {
    let s = literal.trim();
    if let Ok(v) = s.parse::<usize>() {
        return Ok(v);
    }
    // Some exporters write counts as floats ("512.0" or "512,0").
    let v = parse_f64(s)?;
    if v >= 0.0 && v.fract() == 0.0 && v <= usize::MAX as f64 {
        return Ok(v as usize);
    }
    Err(NumberError {
        literal: literal.to_string(),
    })
}
