mod broadcaster;

pub use broadcaster::{ProgressBroadcaster, SubscriberId, Subscription};
