//! Monthly cost aggregation

use crate::models::Subscription;

/// Total monthly cost of the active subscriptions in `subscriptions`
///
/// Weekly charges count 4.33 times a month and yearly charges a twelfth;
/// inactive subscriptions contribute nothing.
pub fn monthly_cost(subscriptions: &[Subscription]) -> f64 {
    subscriptions.iter().map(Subscription::monthly_amount).sum()
}
