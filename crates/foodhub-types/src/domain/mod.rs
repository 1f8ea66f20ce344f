pub mod cart;
pub mod error;
pub mod identity;
pub mod meal;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod transitions;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the microsecond precision every store keeps.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
