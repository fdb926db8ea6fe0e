use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::entities::invoice::PaymentStatus;
use crate::errors::ServiceError;

/// Total freight charge for one consignment. Inputs are validated
/// non-negative at the DTO layer.
pub fn consignment_total(
    freight_amount: Decimal,
    surcharge: Decimal,
    other_charges: Decimal,
    gr_charge: Decimal,
) -> Decimal {
    freight_amount + surcharge + other_charges + gr_charge
}

/// Invoice total over the snapshot line items plus the invoice-level charge.
pub fn invoice_total(subtotal: Decimal, gr_charge: Decimal) -> Decimal {
    subtotal + gr_charge
}

/// Derives the payment status of an invoice from its amounts and due date.
///
/// Precedence: a zero balance is Paid; a partial payment is Partial even
/// past the due date; an unpaid invoice is Overdue once today is past the
/// due date, otherwise Pending. Every payment and amendment mutation goes
/// through this function rather than patching the status directly.
pub fn derive_payment_status(
    total_amount: Decimal,
    paid_amount: Decimal,
    due_date: NaiveDate,
    today: NaiveDate,
) -> PaymentStatus {
    if total_amount - paid_amount == Decimal::ZERO {
        PaymentStatus::Paid
    } else if paid_amount > Decimal::ZERO && paid_amount < total_amount {
        PaymentStatus::Partial
    } else if today > due_date {
        PaymentStatus::Overdue
    } else {
        PaymentStatus::Pending
    }
}

/// Rejects negative monetary input with a field-named validation error.
pub fn ensure_non_negative(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

/// Rejects zero or negative monetary input with a field-named validation
/// error.
pub fn ensure_positive(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(())
}

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

fn spell_two_digit(n: u64) -> String {
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{} {}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

/// Indian-system cardinal spelling: crore, lakh, thousand, hundred.
fn spell_cardinal(mut n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }
    let mut words: Vec<String> = Vec::new();
    if n >= 10_000_000 {
        words.push(spell_cardinal(n / 10_000_000));
        words.push("Crore".to_string());
        n %= 10_000_000;
    }
    if n >= 100_000 {
        words.push(spell_two_digit(n / 100_000));
        words.push("Lakh".to_string());
        n %= 100_000;
    }
    if n >= 1_000 {
        words.push(spell_two_digit(n / 1_000));
        words.push("Thousand".to_string());
        n %= 1_000;
    }
    if n >= 100 {
        words.push(ONES[(n / 100) as usize].to_string());
        words.push("Hundred".to_string());
        n %= 100;
    }
    if n > 0 {
        words.push(spell_two_digit(n));
    }
    words.join(" ")
}

/// Renders a monetary amount as words for printed documents, e.g.
/// `1600` -> "One Thousand Six Hundred Rupees Only" and
/// `1234.50` -> "One Thousand Two Hundred Thirty Four Rupees and Fifty
/// Paise Only". Amounts are rounded to two decimal places first.
pub fn amount_in_words(amount: Decimal) -> String {
    let amount = amount.abs().round_dp(2);
    let rupees = amount.trunc();
    let paise = ((amount - rupees) * Decimal::from(100))
        .to_u64()
        .unwrap_or(0);
    let rupee_words = spell_cardinal(rupees.to_u64().unwrap_or(0));

    if paise > 0 {
        format!(
            "{} Rupees and {} Paise Only",
            rupee_words,
            spell_cardinal(paise)
        )
    } else {
        format!("{} Rupees Only", rupee_words)
    }
}
