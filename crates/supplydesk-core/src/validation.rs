//! Input validation and identifier formatting.

use url::Url;
use uuid::Uuid;

use crate::error::{SupplyError, SupplyResult};
use crate::models::supplier::SupplierInput;
use crate::plan::SupplierFields;

pub const SUPPLIER_NAME_MIN: usize = 2;
pub const SUPPLIER_NAME_MAX: usize = 255;
pub const SEGMENT_NAME_MIN: usize = 2;
pub const SEGMENT_NAME_MAX: usize = 100;

/// Digits in an unformatted identifier.
pub const IDENTIFIER_DIGITS: usize = 14;

/// Group sizes of the canonical `NN.NNN.NNN/NNNN-NN` layout and the
/// separator that follows each group.
const IDENTIFIER_GROUPS: [(usize, Option<char>); 5] = [
    (2, Some('.')),
    (3, Some('.')),
    (3, Some('/')),
    (4, Some('-')),
    (2, None),
];

/// A submission that passed validation, with identifiers canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSupplier {
    pub fields: SupplierFields,
    pub identifiers: Vec<String>,
    pub segment_ids: Vec<Uuid>,
}

fn validate_length(field: &str, value: &str, min: usize, max: usize) -> SupplyResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(SupplyError::validation(format!(
            "{field} must be between {min} and {max} characters (got {len})"
        )));
    }
    Ok(())
}

pub fn validate_supplier_name(name: &str) -> SupplyResult<()> {
    validate_length("supplier name", name, SUPPLIER_NAME_MIN, SUPPLIER_NAME_MAX)
}

pub fn validate_segment_name(name: &str) -> SupplyResult<()> {
    validate_length("segment name", name, SEGMENT_NAME_MIN, SEGMENT_NAME_MAX)
}

/// Checks the logo URL. An empty string counts as no logo.
pub fn validate_logo(logo: Option<&str>) -> SupplyResult<Option<String>> {
    let Some(raw) = logo.filter(|l| !l.is_empty()) else {
        return Ok(None);
    };
    let url = Url::parse(raw)
        .map_err(|e| SupplyError::validation(format!("logo must be an absolute URL: {e}")))?;
    if url.host_str().is_none() {
        return Err(SupplyError::validation(format!(
            "logo must be an absolute URL with a host: {raw}"
        )));
    }
    Ok(Some(raw.to_owned()))
}

/// Formats a raw identifier into its canonical layout.
///
/// Separators and other non-digit characters are dropped; what remains
/// must be exactly 14 ASCII digits.
pub fn canonicalize_identifier(raw: &str) -> SupplyResult<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != IDENTIFIER_DIGITS {
        return Err(SupplyError::validation(format!(
            "identifier must contain exactly {IDENTIFIER_DIGITS} digits (got {}): {raw:?}",
            digits.len()
        )));
    }

    let mut formatted = String::with_capacity(18);
    let mut rest = digits.as_str();
    for (width, separator) in IDENTIFIER_GROUPS {
        let (group, tail) = rest.split_at(width);
        formatted.push_str(group);
        if let Some(sep) = separator {
            formatted.push(sep);
        }
        rest = tail;
    }
    Ok(formatted)
}

/// Validates a full supplier submission before anything is written.
///
/// Duplicate identifiers are kept as submitted.
pub fn canonicalize_supplier(input: SupplierInput) -> SupplyResult<CanonicalSupplier> {
    validate_supplier_name(&input.name)?;
    let logo = validate_logo(input.logo.as_deref())?;
    let identifiers = input
        .identifiers
        .iter()
        .map(|raw| canonicalize_identifier(raw))
        .collect::<SupplyResult<Vec<_>>>()?;

    Ok(CanonicalSupplier {
        fields: SupplierFields {
            name: input.name,
            logo,
        },
        identifiers,
        segment_ids: input.segment_ids,
    })
}
