use std::{fmt, str::FromStr};

use anyhow::anyhow;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(OrderStatus::Pending),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(anyhow!("unknown order status `{other}`")),
        }
    }
}

/// Table of legal `from -> to` status moves.
///
/// Re-asserting the current status is always legal. Anything not listed is
/// rejected by the order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransitions {
    allowed: Vec<(OrderStatus, OrderStatus)>,
}

impl StatusTransitions {
    pub fn new(allowed: impl IntoIterator<Item = (OrderStatus, OrderStatus)>) -> Self {
        let mut allowed: Vec<_> = allowed.into_iter().collect();
        allowed.dedup();
        Self { allowed }
    }

    pub fn is_allowed(&self, from: OrderStatus, to: OrderStatus) -> bool {
        from == to || self.allowed.contains(&(from, to))
    }
}

impl Default for StatusTransitions {
    fn default() -> Self {
        Self::new([
            (OrderStatus::Pending, OrderStatus::Delivered),
            (OrderStatus::Pending, OrderStatus::Cancelled),
        ])
    }
}

/// Parses `pending>delivered,pending>cancelled`.
impl FromStr for StatusTransitions {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut allowed = Vec::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (from, to) = pair
                .split_once('>')
                .ok_or_else(|| anyhow!("invalid status transition `{pair}`, expected `from>to`"))?;
            allowed.push((from.parse()?, to.parse()?));
        }
        Ok(Self::new(allowed))
    }
}

/// What happens to an order's items when the order row is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    #[default]
    Cascade,
    RetainItems,
}

impl FromStr for DeletePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cascade" => Ok(DeletePolicy::Cascade),
            "retain_items" => Ok(DeletePolicy::RetainItems),
            other => Err(anyhow!("unknown order delete policy `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_only_moves_out_of_pending() {
        let table = StatusTransitions::default();
        assert!(table.is_allowed(OrderStatus::Pending, OrderStatus::Delivered));
        assert!(table.is_allowed(OrderStatus::Pending, OrderStatus::Cancelled));
        assert!(!table.is_allowed(OrderStatus::Cancelled, OrderStatus::Delivered));
        assert!(!table.is_allowed(OrderStatus::Delivered, OrderStatus::Pending));
    }

    #[test]
    fn same_status_is_always_allowed() {
        let table = StatusTransitions::new([]);
        assert!(table.is_allowed(OrderStatus::Cancelled, OrderStatus::Cancelled));
        assert!(!table.is_allowed(OrderStatus::Pending, OrderStatus::Delivered));
    }

    #[test]
    fn parses_transition_table() -> anyhow::Result<()> {
        let table: StatusTransitions = "pending>delivered, cancelled>pending".parse()?;
        assert!(table.is_allowed(OrderStatus::Cancelled, OrderStatus::Pending));
        assert!(table.is_allowed(OrderStatus::Pending, OrderStatus::Delivered));
        assert!(!table.is_allowed(OrderStatus::Pending, OrderStatus::Cancelled));
        Ok(())
    }

    #[test]
    fn rejects_malformed_transition_table() {
        assert!("pending-delivered".parse::<StatusTransitions>().is_err());
        assert!("pending>shipped".parse::<StatusTransitions>().is_err());
    }

    #[test]
    fn parses_delete_policy() -> anyhow::Result<()> {
        assert_eq!("cascade".parse::<DeletePolicy>()?, DeletePolicy::Cascade);
        assert_eq!("retain_items".parse::<DeletePolicy>()?, DeletePolicy::RetainItems);
        assert!("soft".parse::<DeletePolicy>().is_err());
        Ok(())
    }
}
