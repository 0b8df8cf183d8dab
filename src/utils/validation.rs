//! Boundary validation helpers

use bigdecimal::BigDecimal;

use crate::types::{CoreError, CoreResult};

/// Format-check a GSTIN: 15 characters, two-digit state code followed by
/// alphanumerics. This is an opaque format check, not a checksum
/// verification; the checksum belongs to the portal, not the core.
pub fn validate_gstin(gstin: &str) -> CoreResult<()> {
    if gstin.len() != 15 {
        return Err(CoreError::Validation(format!(
            "GSTIN must be 15 characters, got {}",
            gstin.len()
        )));
    }
    let mut chars = gstin.chars();
    let state_digits = chars.by_ref().take(2).all(|c| c.is_ascii_digit());
    if !state_digits {
        return Err(CoreError::Validation(
            "GSTIN must start with a two-digit state code".to_string(),
        ));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::Validation(
            "GSTIN must be alphanumeric".to_string(),
        ));
    }
    Ok(())
}

/// GST state codes are two digits
pub fn validate_state_code(code: &str) -> CoreResult<()> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "state code must be two digits, got '{code}'"
        )));
    }
    Ok(())
}

/// Sanity checks for a document line before pricing. Quantity may be
/// negative (credit note lines) but not zero; the unit rate must be
/// nonnegative; the GST rate is a percentage.
pub fn validate_item(
    quantity: &BigDecimal,
    rate: &BigDecimal,
    gst_rate: &BigDecimal,
) -> CoreResult<()> {
    let zero = BigDecimal::from(0);
    if *quantity == zero {
        return Err(CoreError::Validation(
            "item quantity cannot be zero".to_string(),
        ));
    }
    if *rate < zero {
        return Err(CoreError::Validation(
            "item rate must be nonnegative".to_string(),
        ));
    }
    if *gst_rate < zero || *gst_rate > BigDecimal::from(100) {
        return Err(CoreError::Validation(format!(
            "GST rate must be between 0 and 100, got {gst_rate}"
        )));
    }
    Ok(())
}
