//! Per-model token pricing (USD per token).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Known prices, longest prefix first so `gpt-4o-mini` wins over `gpt-4o`.
const PRICES: &[(&str, Decimal, Decimal)] = &[
    ("gpt-4o-mini", dec!(0.00000015), dec!(0.0000006)),
    ("gpt-4o", dec!(0.0000025), dec!(0.00001)),
    ("gpt-4.1-mini", dec!(0.0000004), dec!(0.0000016)),
    ("gpt-4.1", dec!(0.000002), dec!(0.000008)),
    ("gpt-4-turbo", dec!(0.00001), dec!(0.00003)),
    ("gpt-4", dec!(0.00003), dec!(0.00006)),
    ("gpt-3.5-turbo", dec!(0.0000005), dec!(0.0000015)),
];

/// `(input, output)` per-token price for `model`, if known.
///
/// Provider prefixes such as `openai/gpt-4o` are ignored.
pub fn model_cost(model: &str) -> Option<(Decimal, Decimal)> {
    let lower = model.to_ascii_lowercase();
    let name = lower.rsplit('/').next().unwrap_or(&lower);
    PRICES
        .iter()
        .find(|(prefix, _, _)| name.starts_with(prefix))
        .map(|(_, input, output)| (*input, *output))
}

/// Like [`model_cost`] but unknown models are free.
pub fn model_cost_or_zero(model: &str) -> (Decimal, Decimal) {
    model_cost(model).unwrap_or((Decimal::ZERO, Decimal::ZERO))
}
