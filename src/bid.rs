use crate::api::ApiError;

pub const BID_PLACED: &str = "Bid placed successfully!";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BidRejection {
    #[error("Please enter a valid bid amount.")]
    Invalid,
    #[error("Your bid must be higher than the current bid of {highest} credits.")]
    TooLow { highest: u64 },
}

pub fn validate(input: &str, highest: u64) -> Result<u64, BidRejection> {
    let amount = parse_amount(input).ok_or(BidRejection::Invalid)?;

    if amount <= highest {
        return Err(BidRejection::TooLow { highest });
    }

    Ok(amount)
}

/// Leading-integer parse of form input, `None` when nothing positive is there.
fn parse_amount(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    let digits_end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '+' || *c == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    let amount: i64 = trimmed[..digits_end].parse().ok()?;
    u64::try_from(amount).ok().filter(|a| *a > 0)
}

pub fn failure_message(err: &ApiError) -> String {
    match err.status() {
        Some(401) => "You need to be logged in to place a bid.".to_string(),
        Some(403) => "You don't have enough credits for this bid.".to_string(),
        Some(400) => "Invalid bid amount or you cannot bid on your own listing.".to_string(),
        _ => format!("Failed to place bid: {}", err),
    }
}
