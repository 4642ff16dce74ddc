use std::collections::HashMap;

use derive_more::{Display, From, Into};

/// Unique identifier of a user.
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct UserId(pub u64);

/// Unique identifier of an item.
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct ItemId(pub u64);

/// Ratings (or predictions) of items grouped by user.
pub type Ratings = HashMap<UserId, HashMap<ItemId, f32>>;
