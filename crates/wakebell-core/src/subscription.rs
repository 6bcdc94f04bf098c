//! Premium subscription state and the purchase boundary.
//!
//! The stored record is the single source of truth for the feature gate;
//! it lazily demotes itself to free once the expiration date passes. The
//! actual store transaction (and its receipt validation) lives behind
//! [`PurchaseGateway`] -- a gateway failure degrades to the free tier,
//! it never aborts an alarm flow.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::platform::KvStore;

const SUBSCRIPTION_KEY: &str = "subscription_v1";

pub const PRODUCT_ID_MONTHLY: &str = "com.wakebell.premium.monthly";
pub const PRODUCT_ID_YEARLY: &str = "com.wakebell.premium.yearly";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Free,
    PremiumMonthly,
    PremiumYearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub status: SubscriptionStatus,
    pub product_id: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub is_active: bool,
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            status: SubscriptionStatus::Free,
            product_id: None,
            purchase_date: None,
            expiration_date: None,
            transaction_id: None,
            is_active: false,
        }
    }
}

impl Subscription {
    fn expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration_date, Some(exp) if exp < now)
    }
}

/// A purchase returned by the platform store during restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub product_id: String,
    pub transaction_id: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Outcome of a purchase or restore attempt.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    Completed(PurchaseReceipt),
    Canceled,
    Failed(String),
}

/// Platform in-app-purchase boundary. Receipt validation belongs to the
/// store, not to this crate.
pub trait PurchaseGateway {
    fn purchase(&self, product_id: &str) -> PurchaseOutcome;
    fn restore(&self) -> Result<Vec<PurchaseReceipt>, String>;
}

/// Gateway used when no billing backend is wired up; everything fails
/// softly toward the free tier.
#[derive(Default)]
pub struct UnavailableGateway;

impl PurchaseGateway for UnavailableGateway {
    fn purchase(&self, _product_id: &str) -> PurchaseOutcome {
        PurchaseOutcome::Failed("in-app purchases unavailable".into())
    }
    fn restore(&self) -> Result<Vec<PurchaseReceipt>, String> {
        Err("in-app purchases unavailable".into())
    }
}

pub struct SubscriptionStore<K: KvStore> {
    kv: K,
}

impl<K: KvStore> SubscriptionStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Current subscription. A record read past its expiration date is
    /// demoted to free and the demotion persisted.
    pub fn get(&self, now: DateTime<Utc>) -> Subscription {
        let mut sub = self.load();
        if sub.is_active && sub.expired_at(now) {
            sub.is_active = false;
            sub.status = SubscriptionStatus::Free;
            self.save(&sub);
        }
        sub
    }

    pub fn is_premium(&self, now: DateTime<Utc>) -> bool {
        let sub = self.get(now);
        sub.is_active && sub.status != SubscriptionStatus::Free
    }

    /// Record a successful purchase.
    pub fn activate(
        &self,
        product_id: &str,
        transaction_id: Option<String>,
        purchase_date: DateTime<Utc>,
        expiration_date: Option<DateTime<Utc>>,
    ) -> Subscription {
        let status = if product_id == PRODUCT_ID_MONTHLY {
            SubscriptionStatus::PremiumMonthly
        } else {
            SubscriptionStatus::PremiumYearly
        };
        let sub = Subscription {
            status,
            product_id: Some(product_id.to_string()),
            purchase_date: Some(purchase_date),
            expiration_date,
            transaction_id,
            is_active: true,
        };
        self.save(&sub);
        sub
    }

    /// Debug reset back to the free tier.
    pub fn cancel(&self) -> Subscription {
        let sub = Subscription::default();
        self.save(&sub);
        sub
    }

    /// Re-activate from store purchase history: the newest receipt for a
    /// known product wins. Returns `None` when nothing qualifies.
    pub fn restore(&self, purchases: &[PurchaseReceipt]) -> Option<Subscription> {
        let newest = purchases
            .iter()
            .filter(|p| {
                p.product_id == PRODUCT_ID_MONTHLY || p.product_id == PRODUCT_ID_YEARLY
            })
            .max_by_key(|p| p.purchase_date)?;
        Some(self.activate(
            &newest.product_id,
            newest.transaction_id.clone(),
            newest.purchase_date,
            newest.expiration_date,
        ))
    }

    /// Drive a purchase through the gateway and persist the result.
    /// Gateway failures leave the stored record untouched.
    pub fn purchase<G: PurchaseGateway>(
        &self,
        gateway: &G,
        product_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Subscription, String> {
        match gateway.purchase(product_id) {
            PurchaseOutcome::Completed(receipt) => {
                let expiration = receipt
                    .expiration_date
                    .or_else(|| default_expiration(product_id, now));
                Ok(self.activate(
                    &receipt.product_id,
                    receipt.transaction_id,
                    receipt.purchase_date,
                    expiration,
                ))
            }
            PurchaseOutcome::Canceled => Err("canceled".into()),
            PurchaseOutcome::Failed(message) => Err(message),
        }
    }

    fn load(&self) -> Subscription {
        match self.kv.get(SUBSCRIPTION_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(key = SUBSCRIPTION_KEY, error = %e, "failed to decode subscription");
                Subscription::default()
            }),
            Ok(None) => Subscription::default(),
            Err(e) => {
                warn!(key = SUBSCRIPTION_KEY, error = %e, "failed to load subscription");
                Subscription::default()
            }
        }
    }

    fn save(&self, sub: &Subscription) {
        match serde_json::to_string(sub) {
            Ok(json) => {
                if let Err(e) = self.kv.set(SUBSCRIPTION_KEY, &json) {
                    warn!(key = SUBSCRIPTION_KEY, error = %e, "failed to save subscription");
                }
            }
            Err(e) => warn!(key = SUBSCRIPTION_KEY, error = %e, "failed to encode subscription"),
        }
    }
}

/// Store-side expiration when the receipt carries none: one month for
/// the monthly product, one year otherwise.
fn default_expiration(product_id: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let months = if product_id == PRODUCT_ID_MONTHLY {
        Months::new(1)
    } else {
        Months::new(12)
    };
    now.checked_add_months(months)
}
