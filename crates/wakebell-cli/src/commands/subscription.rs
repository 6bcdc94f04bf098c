use chrono::{Months, Utc};
use clap::{Subcommand, ValueEnum};

use wakebell_core::storage::Database;
use wakebell_core::subscription::{SubscriptionStore, PRODUCT_ID_MONTHLY, PRODUCT_ID_YEARLY};

#[derive(Clone, Copy, ValueEnum)]
pub enum Plan {
    Monthly,
    Yearly,
}

#[derive(Subcommand)]
pub enum SubscriptionAction {
    /// Print the current subscription state as JSON
    Status,
    /// Record a premium purchase made out of band
    Activate {
        /// Subscription term
        plan: Plan,
    },
    /// Reset to the free tier
    Cancel,
}

pub fn run(action: SubscriptionAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SubscriptionStore::new(Database::open()?);
    let now = Utc::now();

    match action {
        SubscriptionAction::Status => {
            let sub = store.get(now);
            println!("{}", serde_json::to_string_pretty(&sub)?);
        }
        SubscriptionAction::Activate { plan } => {
            let (product_id, term) = match plan {
                Plan::Monthly => (PRODUCT_ID_MONTHLY, Months::new(1)),
                Plan::Yearly => (PRODUCT_ID_YEARLY, Months::new(12)),
            };
            let sub = store.activate(product_id, None, now, now.checked_add_months(term));
            println!("{}", serde_json::to_string_pretty(&sub)?);
        }
        SubscriptionAction::Cancel => {
            store.cancel();
            println!("subscription reset to free");
        }
    }
    Ok(())
}
