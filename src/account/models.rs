//! Data models for banks and accounts

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Credit,
    Debit,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::Credit => write!(f, "credit"),
            AccountKind::Debit => write!(f, "debit"),
        }
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(AccountKind::Credit),
            "debit" => Ok(AccountKind::Debit),
            _ => Err(format!("Invalid account kind: {}", s)),
        }
    }
}

/// Optional discount tier on credit accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountTier {
    Pct25,
    Pct30,
    Pct50,
}

impl DiscountTier {
    pub fn percent(self) -> i16 {
        match self {
            DiscountTier::Pct25 => 25,
            DiscountTier::Pct30 => 30,
            DiscountTier::Pct50 => 50,
        }
    }

    pub fn from_percent(v: i16) -> Option<Self> {
        match v {
            25 => Some(DiscountTier::Pct25),
            30 => Some(DiscountTier::Pct30),
            50 => Some(DiscountTier::Pct50),
            _ => None,
        }
    }
}

/// Optional account status tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTier {
    Gold,
    Silver,
    Platinum,
}

impl FromStr for StatusTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gold" => Ok(StatusTier::Gold),
            "silver" => Ok(StatusTier::Silver),
            "platinum" => Ok(StatusTier::Platinum),
            _ => Err(format!("Invalid status tier: {}", s)),
        }
    }
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusTier::Gold => write!(f, "gold"),
            StatusTier::Silver => write!(f, "silver"),
            StatusTier::Platinum => write!(f, "platinum"),
        }
    }
}

/// A bank. Read-only here; the transfer engine only resolves display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    pub id: i64,
    pub name: String,
}

/// An account as read by the transfer engine, bank display name joined in.
///
/// Balance may be negative (debt). It is the only field the transfer
/// engine ever mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub kind: AccountKind,
    pub account_number: String,
    pub bank_id: i64,
    pub bank_name: String,
    pub currency: String,
    pub balance: Decimal,
    pub discount: Option<DiscountTier>,
    pub status: Option<StatusTier>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_kind_from_str() {
        assert_eq!("credit".parse::<AccountKind>().unwrap(), AccountKind::Credit);
        assert_eq!("DEBIT".parse::<AccountKind>().unwrap(), AccountKind::Debit);
        assert!("savings".parse::<AccountKind>().is_err());
    }

    #[test]
    fn test_discount_tier_percent() {
        assert_eq!(DiscountTier::from_percent(25), Some(DiscountTier::Pct25));
        assert_eq!(DiscountTier::from_percent(50).unwrap().percent(), 50);
        assert_eq!(DiscountTier::from_percent(40), None);
    }

    #[test]
    fn test_status_tier_round_trip() {
        for s in ["gold", "silver", "platinum"] {
            let tier: StatusTier = s.parse().unwrap();
            assert_eq!(tier.to_string(), s);
        }
        assert!("bronze".parse::<StatusTier>().is_err());
    }
}
