//! Human-readable formatting helpers for durations and amounts.

use coffer_types::Wei;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Format a wei amount as ether with trailing zeros trimmed, e.g. `0.05 ETH`.
pub fn format_ether(amount: Wei) -> String {
    let unit = Wei::ETHER.raw();
    let whole = amount.raw() / unit;
    let frac = amount.raw() % unit;
    if frac == 0 {
        return format!("{} ETH", whole);
    }
    let digits = format!("{:018}", frac);
    format!("{}.{} ETH", whole, digits.trim_end_matches('0'))
}
