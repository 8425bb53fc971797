use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serializer;

/// Money goes out as a fixed two-place string so JSON consumers never see float drift.
pub fn serialize<S>(decimal: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let rounded = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    serializer.serialize_str(&format!("{:.2}", rounded))
}
