/**
 * Order Pricing
 *
 * ```text
 * subtotal = unit_price * quantity * days
 * tax      = subtotal * tax_percent / 100, rounded half up
 * total    = subtotal + tax
 * ```
 *
 * Amounts are whole currency units. Arithmetic is checked; an overflow is
 * reported instead of wrapping.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amounts {
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order amount is out of range")]
pub struct AmountOverflow;

pub fn price(
    unit_price: i64,
    quantity: i64,
    days: i64,
    tax_percent: u32,
) -> Result<Amounts, AmountOverflow> {
    let subtotal = unit_price
        .checked_mul(quantity)
        .and_then(|v| v.checked_mul(days))
        .ok_or(AmountOverflow)?;
    let tax = subtotal
        .checked_mul(i64::from(tax_percent))
        .and_then(|v| v.checked_add(50))
        .map(|v| v / 100)
        .ok_or(AmountOverflow)?;
    let total = subtotal.checked_add(tax).ok_or(AmountOverflow)?;
    Ok(Amounts {
        subtotal,
        tax,
        total,
    })
}
