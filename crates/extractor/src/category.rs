//! Transaction categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of mobile-money transaction a message describes.
///
/// The set is fixed. `Other` is the catch-all for messages no pattern
/// recognizes, and the bucket unknown stored values are coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Incoming,
    Payment,
    Transfer,
    Deposit,
    Airtime,
    CashPower,
    Withdrawal,
    Bundle,
    Other,
}

/// Which side of the transaction the counterparty is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Money came in; the counterparty is the sender.
    Inbound,
    /// Money went out; the counterparty is the recipient.
    Outbound,
    /// No natural counterparty.
    Neutral,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 9] = [
        Category::Incoming,
        Category::Payment,
        Category::Transfer,
        Category::Deposit,
        Category::Airtime,
        Category::CashPower,
        Category::Withdrawal,
        Category::Bundle,
        Category::Other,
    ];

    /// Canonical storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Incoming => "incoming",
            Category::Payment => "payment",
            Category::Transfer => "transfer",
            Category::Deposit => "deposit",
            Category::Airtime => "airtime",
            Category::CashPower => "cash_power",
            Category::Withdrawal => "withdrawal",
            Category::Bundle => "bundle",
            Category::Other => "other",
        }
    }

    /// Human-readable name for display.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Incoming => "Incoming Money",
            Category::Payment => "Payment",
            Category::Transfer => "Transfer",
            Category::Deposit => "Bank Deposit",
            Category::Airtime => "Airtime Purchase",
            Category::CashPower => "Cash Power Payment",
            Category::Withdrawal => "Withdrawal",
            Category::Bundle => "Bundle Purchase",
            Category::Other => "Other",
        }
    }

    /// Longer description, seeded into the store's reference table.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Incoming => "Money received from another user",
            Category::Payment => "Payment to a merchant or code holder",
            Category::Transfer => "Transfer to another mobile number",
            Category::Deposit => "Bank deposit to MoMo account",
            Category::Airtime => "Airtime purchase",
            Category::CashPower => "Cash power payment",
            Category::Withdrawal => "Cash withdrawal from agent",
            Category::Bundle => "Internet/voice bundle purchase",
            Category::Other => "Other transaction types",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Category::Incoming => Direction::Inbound,
            Category::Payment | Category::Transfer | Category::Withdrawal | Category::Bundle => {
                Direction::Outbound
            }
            Category::Deposit | Category::Airtime | Category::CashPower | Category::Other => {
                Direction::Neutral
            }
        }
    }

    /// Stored names that [`Category::coerce`] maps to this category, in
    /// normalized form (see [`Category::normalize_name`]).
    ///
    /// `Other` lists only its canonical name; it also absorbs every name
    /// no other category claims.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Category::Incoming => &["incoming", "incoming_money", "received"],
            Category::Payment => &["payment"],
            Category::Transfer => &["transfer", "bank_transfer"],
            Category::Deposit => &["deposit", "bank_deposit"],
            Category::Airtime => &["airtime", "airtime_purchase"],
            Category::CashPower => &["cash_power", "cash_power_payment", "cashpower"],
            Category::Withdrawal => &["withdrawal"],
            Category::Bundle => &["bundle", "bundle_purchase"],
            Category::Other => &["other"],
        }
    }

    /// Trim, lower-case, and turn spaces and dashes into underscores.
    pub fn normalize_name(value: &str) -> String {
        value.trim().to_lowercase().replace([' ', '-'], "_")
    }

    /// Lenient conversion used at the persistence boundary.
    ///
    /// Accepts canonical names in any case, the legacy display names, and
    /// maps everything else to [`Category::Other`].
    pub fn coerce(value: &str) -> Category {
        let normalized = Category::normalize_name(value);
        Category::ALL
            .into_iter()
            .find(|category| category.aliases().contains(&normalized.as_str()))
            .unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Category::from_str`] for names outside the canonical set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_strict_parse_rejects_display_names() {
        assert!("Incoming Money".parse::<Category>().is_err());
        assert!("CASH_POWER".parse::<Category>().is_err());
    }

    #[test]
    fn test_coerce_legacy_names() {
        assert_eq!(Category::coerce("Incoming Money"), Category::Incoming);
        assert_eq!(Category::coerce("Cash Power Payment"), Category::CashPower);
        assert_eq!(Category::coerce("Airtime Purchase"), Category::Airtime);
        assert_eq!(Category::coerce("Bank Transfer"), Category::Transfer);
        assert_eq!(Category::coerce(" PAYMENT "), Category::Payment);
    }

    #[test]
    fn test_aliases_coerce_back() {
        for category in Category::ALL {
            assert!(category.aliases().contains(&category.as_str()));
            for alias in category.aliases() {
                assert_eq!(Category::coerce(alias), category, "alias {alias}");
            }
        }
    }

    #[test]
    fn test_coerce_unknown_to_other() {
        assert_eq!(Category::coerce("lottery"), Category::Other);
        assert_eq!(Category::coerce(""), Category::Other);
    }

    #[test]
    fn test_direction() {
        assert_eq!(Category::Incoming.direction(), Direction::Inbound);
        assert_eq!(Category::Bundle.direction(), Direction::Outbound);
        assert_eq!(Category::Withdrawal.direction(), Direction::Outbound);
        assert_eq!(Category::CashPower.direction(), Direction::Neutral);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::CashPower).unwrap();
        assert_eq!(json, "\"cash_power\"");
    }
}
