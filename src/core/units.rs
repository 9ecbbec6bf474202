//! Unit-of-bulk arithmetic shared by merge annotation and commit handling.
//!
//! One container (stack) holds 64 base units for most items; a box holds 27
//! containers. A few item families stack to 16 or 1 and are recognized by
//! their display-name suffix, in both the English and the CJK forms the
//! upstream exports use.

use crate::core::error::StockpileError;

pub const UNITS_PER_STACK: u64 = 64;
pub const STACKS_PER_BOX: u64 = 27;
pub const UNITS_PER_BOX: u64 = UNITS_PER_STACK * STACKS_PER_BOX; // 1728

const SUFFIXES_16: &[&str] = &[
    "shulker_box",
    "shulker box",
    "潜影盒",
    "banner",
    "旗帜",
    "armor_stand",
    "armor stand",
    "盔甲架",
    "sign",
    "告示牌",
];

const SUFFIXES_BED: &[&str] = &["bed", "床"];
const SUFFIXES_BUCKET: &[&str] = &["bucket", "桶"];

/// Per-container capacity for a display name. Unknown names use the default
/// stack of 64.
pub fn stack_size(display_name: &str) -> u64 {
    let lower = display_name.to_lowercase();
    if SUFFIXES_16.iter().any(|s| lower.ends_with(s)) {
        return 16;
    }
    if SUFFIXES_BED.iter().any(|s| lower.ends_with(s)) {
        return 1;
    }
    // A bare "bucket" entry is the item family header in some exports; the
    // length guard keeps it on the default stack.
    if SUFFIXES_BUCKET.iter().any(|s| lower.ends_with(s)) && lower.chars().count() >= 2 {
        return 1;
    }
    UNITS_PER_STACK
}

/// Remaining amount rendered as whole boxes plus fractional containers.
/// Display values only; the store keeps raw base units.
pub fn remaining_breakdown(display_name: &str, total: u64, committed: u64) -> (u64, f64) {
    let remaining = total.saturating_sub(committed);
    let boxes = remaining / UNITS_PER_BOX;
    let capacity = stack_size(display_name);
    let containers = (remaining % UNITS_PER_BOX) as f64 / capacity as f64;
    (boxes, (containers * 100.0).round() / 100.0)
}

/// Parse a commit amount with an optional unit suffix into base units.
///
/// Accepted: `120` (items), `3s` / `3stack` / `3组` (stacks of 64),
/// `2b` / `2box` / `2盒` (boxes of 1728), `5个` (items, explicit).
pub fn parse_amount(input: &str) -> Result<u64, StockpileError> {
    let input = input.trim();
    let digits_end = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    let (digits, suffix) = input.split_at(digits_end);
    let count: u64 = digits
        .parse()
        .map_err(|_| StockpileError::UserInput(format!("not an amount: {}", input)))?;
    let multiplier = match suffix.trim() {
        "" | "x" | "i" | "item" | "items" | "个" => 1,
        "s" | "stack" | "stacks" | "组" => UNITS_PER_STACK,
        "b" | "box" | "boxes" | "盒" => UNITS_PER_BOX,
        other => {
            return Err(StockpileError::UserInput(format!(
                "unknown amount unit: {}",
                other
            )))
        }
    };
    count
        .checked_mul(multiplier)
        .ok_or_else(|| StockpileError::UserInput(format!("amount too large: {}", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_sizes_follow_suffix_rules() {
        assert_eq!(stack_size("Purple Shulker Box"), 16);
        assert_eq!(stack_size("White Banner"), 16);
        assert_eq!(stack_size("Oak Sign"), 16);
        assert_eq!(stack_size("Armor Stand"), 16);
        assert_eq!(stack_size("Red Bed"), 1);
        assert_eq!(stack_size("Water Bucket"), 1);
        assert_eq!(stack_size("熔岩桶"), 1);
        assert_eq!(stack_size("桶"), 64);
        assert_eq!(stack_size("Stone"), 64);
    }

    #[test]
    fn parse_amount_units() {
        assert_eq!(parse_amount("120").unwrap(), 120);
        assert_eq!(parse_amount("1个").unwrap(), 1);
        assert_eq!(parse_amount("2s").unwrap(), 128);
        assert_eq!(parse_amount("2组").unwrap(), 128);
        assert_eq!(parse_amount("1b").unwrap(), 1728);
        assert_eq!(parse_amount("1盒").unwrap(), 1728);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("3q").is_err());
    }

    #[test]
    fn breakdown_splits_boxes_and_containers() {
        // 2000 remaining = 1 box + 272 units = 4.25 stacks of 64.
        let (boxes, containers) = remaining_breakdown("Stone", 2000, 0);
        assert_eq!(boxes, 1);
        assert_eq!(containers, 4.25);

        // 16-stack item: 100 units = 6.25 containers.
        let (boxes, containers) = remaining_breakdown("Oak Sign", 100, 0);
        assert_eq!(boxes, 0);
        assert_eq!(containers, 6.25);

        // Over-committed rows clamp to zero remaining.
        let (boxes, containers) = remaining_breakdown("Stone", 100, 150);
        assert_eq!(boxes, 0);
        assert_eq!(containers, 0.0);
    }
}
