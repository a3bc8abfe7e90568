//! # Message Parser Module
//!
//! Turns an inbound chat message into a validated [`ReceiptRequest`]. The
//! keyed-alias variant is selected by a case-insensitive "LLAVEB" prefix;
//! everything else is a standard receipt of exactly three fields separated
//! by "|" (or "," as a fallback).

use thiserror::Error;

use crate::layout::LayoutVariant;
use crate::renderer::ReceiptRequest;

const KEYED_PREFIX: &str = "LLAVEB";

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no field delimiter found")]
    MissingDelimiter,
    #[error("expected {expected} fields, got {got}")]
    FieldCount { expected: usize, got: usize },
    #[error("empty required field: {0}")]
    EmptyField(&'static str),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl ParseError {
    /// Spanish guidance sent back to the user when their message does not
    /// parse. The renderer is never invoked for these.
    pub fn user_message(&self) -> String {
        match self {
            ParseError::MissingDelimiter => "❌ Formato incorrecto. Usa:\n\
                 `Nombre | Monto | Número`\n\n\
                 Ejemplo: `Juan Perez | 150.50 | 3121234567`"
                .to_string(),
            ParseError::FieldCount { expected: 4, .. } => "❌ Para comprobante con llave necesito 4 datos:\n\
                 1. Nombre\n2. Monto\n3. Número\n4. Llave\n\n\
                 Ejemplo: `LLAVEB Juan Perez | 150.50 | 3121234567 | @juanp`"
                .to_string(),
            ParseError::FieldCount { .. } => "❌ Necesito exactamente 3 datos:\n\
                 1. Nombre\n2. Monto\n3. Número\n\n\
                 Separados por | o ,"
                .to_string(),
            ParseError::EmptyField(_) => "❌ Todos los campos son obligatorios".to_string(),
            ParseError::InvalidAmount(raw) => {
                format!("❌ El monto `{raw}` no es un número válido")
            }
        }
    }
}

/// Parse an inbound message into a receipt request.
pub fn parse_receipt_message(text: &str) -> Result<ReceiptRequest, ParseError> {
    let trimmed = text.trim();
    // Byte-wise prefix check: a match is pure ASCII, so slicing after it
    // stays on a char boundary.
    if trimmed.len() >= KEYED_PREFIX.len()
        && trimmed.as_bytes()[..KEYED_PREFIX.len()].eq_ignore_ascii_case(KEYED_PREFIX.as_bytes())
    {
        parse_keyed_alias(&trimmed[KEYED_PREFIX.len()..])
    } else {
        parse_standard(trimmed)
    }
}

fn parse_standard(text: &str) -> Result<ReceiptRequest, ParseError> {
    // "|" is the primary delimiter, "," the secondary.
    let fields: Vec<&str> = if text.contains('|') {
        text.split('|').map(str::trim).collect()
    } else if text.contains(',') {
        text.split(',').map(str::trim).collect()
    } else {
        return Err(ParseError::MissingDelimiter);
    };

    if fields.len() != 3 {
        return Err(ParseError::FieldCount {
            expected: 3,
            got: fields.len(),
        });
    }

    Ok(ReceiptRequest {
        recipient_name: required(fields[0], "nombre")?,
        amount: valid_amount(fields[1])?,
        phone_number: required(fields[2], "numero")?,
        variant: LayoutVariant::Standard,
        alias_key: None,
    })
}

fn parse_keyed_alias(rest: &str) -> Result<ReceiptRequest, ParseError> {
    // Accept both "LLAVEB Nombre | ..." and "LLAVEB | Nombre | ...".
    let rest = rest.trim_start().trim_start_matches([':', '|']).trim_start();
    let fields: Vec<&str> = rest.split('|').map(str::trim).collect();

    if fields.len() != 4 {
        return Err(ParseError::FieldCount {
            expected: 4,
            got: fields.len(),
        });
    }

    Ok(ReceiptRequest {
        recipient_name: required(fields[0], "nombre")?,
        amount: valid_amount(fields[1])?,
        phone_number: required(fields[2], "numero")?,
        variant: LayoutVariant::KeyedAlias,
        alias_key: Some(required(fields[3], "llave")?),
    })
}

fn required(field: &str, name: &'static str) -> Result<String, ParseError> {
    if field.is_empty() {
        return Err(ParseError::EmptyField(name));
    }
    Ok(field.to_string())
}

fn valid_amount(field: &str) -> Result<String, ParseError> {
    if field.is_empty() {
        return Err(ParseError::EmptyField("monto"));
    }
    let value: f64 = field
        .parse()
        .map_err(|_| ParseError::InvalidAmount(field.to_string()))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ParseError::InvalidAmount(field.to_string()));
    }
    Ok(field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_with_pipes() {
        let request = parse_receipt_message("Juan Perez | 107000 | 3120004444").unwrap();
        assert_eq!(request.recipient_name, "Juan Perez");
        assert_eq!(request.amount, "107000");
        assert_eq!(request.phone_number, "3120004444");
        assert_eq!(request.variant, LayoutVariant::Standard);
        assert!(request.alias_key.is_none());
    }

    #[test]
    fn test_standard_with_commas() {
        let request = parse_receipt_message("Dora Valencia, 100.00, 3122122032").unwrap();
        assert_eq!(request.recipient_name, "Dora Valencia");
        assert_eq!(request.variant, LayoutVariant::Standard);
    }

    #[test]
    fn test_standard_without_delimiter() {
        assert_eq!(
            parse_receipt_message("Juan Perez 107000"),
            Err(ParseError::MissingDelimiter)
        );
    }

    #[test]
    fn test_standard_wrong_field_count() {
        assert_eq!(
            parse_receipt_message("Juan | 100"),
            Err(ParseError::FieldCount {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            parse_receipt_message("a | b | c | d"),
            Err(ParseError::FieldCount {
                expected: 3,
                got: 4
            })
        );
    }

    #[test]
    fn test_standard_empty_field_rejected() {
        assert_eq!(
            parse_receipt_message(" | 100 | 3120004444"),
            Err(ParseError::EmptyField("nombre"))
        );
        assert_eq!(
            parse_receipt_message("Juan | 100 | "),
            Err(ParseError::EmptyField("numero"))
        );
    }

    #[test]
    fn test_standard_invalid_amount_rejected() {
        assert!(matches!(
            parse_receipt_message("Juan | cien | 3120004444"),
            Err(ParseError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_receipt_message("Juan | -50 | 3120004444"),
            Err(ParseError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_receipt_message("Juan | 0 | 3120004444"),
            Err(ParseError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_keyed_alias_prefix_detection() {
        let request =
            parse_receipt_message("LLAVEB Maria Lopez | 55000 | 3009998877 | @mlopez").unwrap();
        assert_eq!(request.variant, LayoutVariant::KeyedAlias);
        assert_eq!(request.recipient_name, "Maria Lopez");
        assert_eq!(request.alias_key.as_deref(), Some("@mlopez"));
    }

    #[test]
    fn test_keyed_alias_prefix_is_case_insensitive() {
        for text in [
            "llaveb Maria | 55000 | 3009998877 | @m",
            "LlaveB Maria | 55000 | 3009998877 | @m",
        ] {
            let request = parse_receipt_message(text).unwrap();
            assert_eq!(request.variant, LayoutVariant::KeyedAlias);
        }
    }

    #[test]
    fn test_keyed_alias_with_leading_pipe() {
        let request =
            parse_receipt_message("LLAVEB | Maria | 55000 | 3009998877 | @mlopez").unwrap();
        assert_eq!(request.recipient_name, "Maria");
        assert_eq!(request.alias_key.as_deref(), Some("@mlopez"));
    }

    #[test]
    fn test_keyed_alias_missing_key_rejected() {
        // Only three fields after the prefix: the render path is never
        // reached without the alias key.
        assert_eq!(
            parse_receipt_message("LLAVEB Maria | 55000 | 3009998877"),
            Err(ParseError::FieldCount {
                expected: 4,
                got: 3
            })
        );
        assert_eq!(
            parse_receipt_message("LLAVEB Maria | 55000 | 3009998877 | "),
            Err(ParseError::EmptyField("llave"))
        );
    }

    #[test]
    fn test_user_messages_are_spanish_guidance() {
        assert!(ParseError::MissingDelimiter
            .user_message()
            .contains("Formato incorrecto"));
        assert!(ParseError::EmptyField("nombre")
            .user_message()
            .contains("obligatorios"));
        assert!(ParseError::InvalidAmount("abc".into())
            .user_message()
            .contains("abc"));
    }
}
