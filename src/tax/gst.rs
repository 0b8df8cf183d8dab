//! GST (Goods and Services Tax) calculation engine for Indian tax compliance
//!
//! Intra-state supplies split the tax evenly into CGST + SGST; inter-state
//! supplies carry the full rate as IGST. In both branches the component sum
//! equals `round(amount * rate / 100, 2)`, which is the invariant everything
//! downstream (invoice totals, GSTR aggregation) relies on.

use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};

use crate::types::{CoreError, CoreResult};

/// Round a monetary value to two decimal places, half away from zero
pub fn round2(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Whether a supply crosses state lines, decided by the GST state codes of
/// the two parties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyType {
    IntraState,
    InterState,
}

impl SupplyType {
    /// Derive the supply type from seller and buyer state codes
    pub fn from_states(seller_state: &str, buyer_state: &str) -> Self {
        if seller_state == buyer_state {
            SupplyType::IntraState
        } else {
            SupplyType::InterState
        }
    }
}

/// CGST/SGST/IGST split of one tax computation, each component rounded to
/// two decimal places
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GstBreakup {
    pub cgst: BigDecimal,
    pub sgst: BigDecimal,
    pub igst: BigDecimal,
}

impl GstBreakup {
    /// Total tax across all three components
    pub fn total(&self) -> BigDecimal {
        &self.cgst + &self.sgst + &self.igst
    }
}

/// Split tax on a taxable amount at the given GST percentage rate.
///
/// The total is rounded first, then divided, so `cgst + sgst + igst` always
/// equals the rounded total even when half the total lands on an odd paisa.
/// Negative amounts (credit notes) propagate their sign through unchanged;
/// a zero rate yields zero on all three components.
pub fn split_tax(
    amount: &BigDecimal,
    rate: &BigDecimal,
    supply_type: SupplyType,
) -> CoreResult<GstBreakup> {
    if *rate < BigDecimal::from(0) {
        return Err(CoreError::Validation(format!(
            "GST rate must be nonnegative, got {rate}"
        )));
    }

    let total = round2(&((amount * rate) / BigDecimal::from(100)));

    Ok(match supply_type {
        SupplyType::IntraState => {
            let cgst = round2(&(&total / BigDecimal::from(2)));
            let sgst = &total - &cgst;
            GstBreakup {
                cgst,
                sgst,
                igst: BigDecimal::from(0),
            }
        }
        SupplyType::InterState => GstBreakup {
            cgst: BigDecimal::from(0),
            sgst: BigDecimal::from(0),
            igst: total,
        },
    })
}

/// Recover the taxable base from a tax-inclusive gross amount
pub fn base_from_gross(gross: &BigDecimal, rate: &BigDecimal) -> CoreResult<BigDecimal> {
    if *rate < BigDecimal::from(0) {
        return Err(CoreError::Validation(format!(
            "GST rate must be nonnegative, got {rate}"
        )));
    }
    let divisor = BigDecimal::from(100) + rate;
    Ok(round2(&((gross * BigDecimal::from(100)) / divisor)))
}

/// Standard GST rate slabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GstSlab {
    /// Essential items - 0%
    Exempt,
    /// Reduced rate items - 5%
    Reduced,
    /// Standard rate items - 12%
    Standard,
    /// Higher rate items - 18%
    Higher,
    /// Luxury/sin goods - 28%
    Luxury,
}

impl GstSlab {
    pub fn rate(&self) -> BigDecimal {
        match self {
            GstSlab::Exempt => BigDecimal::from(0),
            GstSlab::Reduced => BigDecimal::from(5),
            GstSlab::Standard => BigDecimal::from(12),
            GstSlab::Higher => BigDecimal::from(18),
            GstSlab::Luxury => BigDecimal::from(28),
        }
    }
}

/// Taxable amount and tax split for one document line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTax {
    pub taxable_amount: BigDecimal,
    pub breakup: GstBreakup,
}

/// Compute the taxable amount and tax for a quantity/rate line with an
/// optional flat discount. Document-level tax totals must be the sum of
/// these per-line rounded components, never a re-rounded aggregate, or they
/// drift off the statutory report by a paisa.
pub fn compute_line(
    quantity: &BigDecimal,
    unit_rate: &BigDecimal,
    discount: Option<&BigDecimal>,
    gst_rate: &BigDecimal,
    supply_type: SupplyType,
) -> CoreResult<LineTax> {
    let zero = BigDecimal::from(0);
    if let Some(d) = discount {
        if *d < zero {
            return Err(CoreError::Validation(
                "discount must be nonnegative".to_string(),
            ));
        }
    }

    let gross = quantity * unit_rate;
    let taxable_amount = match discount {
        Some(d) => round2(&(gross - d)),
        None => round2(&gross),
    };
    let breakup = split_tax(&taxable_amount, gst_rate, supply_type)?;

    Ok(LineTax {
        taxable_amount,
        breakup,
    })
}
