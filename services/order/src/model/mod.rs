mod feature_flag;
mod order;

pub use feature_flag::{FeatureFlagModel, FeatureFlagSet};
pub use order::{OrderModel, StoreModel};
