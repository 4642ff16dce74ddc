//! The parameter store of the learners.

mod in_memory;
mod init;

use feature_vector::FeatureVector;
#[cfg(test)]
use mockall::automock;

use crate::{
    data::{ItemId, UserId},
    error::Error,
};

pub use self::in_memory::InMemoryFeatureVectorModel;

/// The slots of a factor vector besides the latent factors: the unused slot `0` and the two
/// bias slots.
pub const RESERVED_SLOTS: usize = 3;

/// The slot of a user factor vector which holds the constant `1`.
///
/// It meets the item bias of the item factor vectors.
pub const USER_INTERCEPT_INDEX: usize = 1;

/// The slot of an item factor vector which holds the constant `1`.
///
/// It meets the user bias of the user factor vectors.
pub const ITEM_INTERCEPT_INDEX: usize = 2;

/// Stores the parameters and side information of users and items.
///
/// The parameter getters are get-or-create: parameters of unknown users and items are
/// initialized and stored on first access, factors randomly and side information parameters
/// with zeros. Setters replace the stored vectors wholesale.
#[cfg_attr(test, automock)]
pub trait FeatureVectorModel {
    /// The number of response classes, `1` for numerical responses.
    fn number_of_classes(&self) -> usize;

    /// The number of vectors per parameter family.
    fn class_vectors(&self) -> usize;

    /// Initializes the factors of the user unless they exist already.
    fn initialize_user_if_needed(&mut self, user: UserId);

    /// Initializes the factors of the item unless they exist already.
    fn initialize_item_if_needed(&mut self, item: ItemId);

    fn contains_user(&self, user: UserId) -> bool;

    fn contains_item(&self, item: ItemId) -> bool;

    /// All users with factors, in ascending order.
    fn user_ids(&self) -> Vec<UserId>;

    /// All items with factors, in ascending order.
    fn item_ids(&self) -> Vec<ItemId>;

    /// The cuts of the ordinal thresholds.
    fn cuts(&self) -> Vec<f32>;

    fn set_cuts(&mut self, cuts: Vec<f32>);

    /// Sets a single cut.
    ///
    /// # Errors
    /// Fails if the index is not a cut index.
    fn set_cut(&mut self, index: usize, cut: f32) -> Result<(), Error>;

    /// The factors of the user.
    fn alphas(&mut self, user: UserId) -> Vec<FeatureVector>;

    fn set_alphas(&mut self, user: UserId, alphas: Vec<FeatureVector>);

    /// The factors of the item.
    fn betas(&mut self, item: ItemId) -> Vec<FeatureVector>;

    fn set_betas(&mut self, item: ItemId, betas: Vec<FeatureVector>);

    /// The parameters of the user projecting the item side information.
    fn thetas_on_t(&mut self, user: UserId) -> Vec<FeatureVector>;

    fn set_thetas_on_t(&mut self, user: UserId, thetas: Vec<FeatureVector>);

    /// The parameters of the user projecting the dynamic side information.
    fn thetas_on_z(&mut self, user: UserId) -> Vec<FeatureVector>;

    fn set_thetas_on_z(&mut self, user: UserId, thetas: Vec<FeatureVector>);

    /// The parameters of the item projecting the user side information.
    fn gammas_on_x(&mut self, item: ItemId) -> Vec<FeatureVector>;

    fn set_gammas_on_x(&mut self, item: ItemId, gammas: Vec<FeatureVector>);

    /// The parameters of the item projecting the dynamic side information.
    fn gammas_on_z(&mut self, item: ItemId) -> Vec<FeatureVector>;

    fn set_gammas_on_z(&mut self, item: ItemId, gammas: Vec<FeatureVector>);

    /// The side information of the user, empty if not set.
    fn x(&self, user: UserId) -> FeatureVector;

    fn set_x(&mut self, user: UserId, x: FeatureVector);

    fn has_x(&self, user: UserId) -> bool;

    /// The side information of the item, empty if not set.
    fn t(&self, item: ItemId) -> FeatureVector;

    fn set_t(&mut self, item: ItemId, t: FeatureVector);

    fn has_t(&self, item: ItemId) -> bool;

    /// The dynamic side information of the user and item pair, empty if not set.
    fn z(&self, user: UserId, item: ItemId) -> FeatureVector;

    fn set_z(&mut self, user: UserId, item: ItemId, z: FeatureVector);

    fn has_z(&self, user: UserId, item: ItemId) -> bool;

    /// Removes the dynamic side information of the user and item pair.
    fn remove_z(&mut self, user: UserId, item: ItemId) -> Option<FeatureVector>;
}
