use std::collections::HashMap;

use feature_vector::FeatureVector;
use log::debug;

use crate::{
    data::{ItemId, UserId},
    model::FeatureVectorModel,
};

/// Loads side information into a model without overwriting what is there already.
///
/// The setters report whether the side information was set, the bulk setters how many
/// vectors were set.
pub struct SideInfoSetup<'a, M: ?Sized> {
    model: &'a mut M,
}

impl<'a, M> SideInfoSetup<'a, M>
where
    M: FeatureVectorModel + ?Sized,
{
    pub fn new(model: &'a mut M) -> Self {
        Self { model }
    }

    /// Sets the side information of the user unless it is known already.
    pub fn set_x(&mut self, user: UserId, x: FeatureVector) -> bool {
        if self.model.has_x(user) {
            debug!("keeping the known side information of user {}", user);
            false
        } else {
            self.model.set_x(user, x);
            true
        }
    }

    /// Sets the side information of the item unless it is known already.
    pub fn set_t(&mut self, item: ItemId, t: FeatureVector) -> bool {
        if self.model.has_t(item) {
            debug!("keeping the known side information of item {}", item);
            false
        } else {
            self.model.set_t(item, t);
            true
        }
    }

    /// Sets the dynamic side information of the pair unless it is known already.
    pub fn set_z(&mut self, user: UserId, item: ItemId, z: FeatureVector) -> bool {
        if self.model.has_z(user, item) {
            debug!(
                "keeping the known side information of user {} and item {}",
                user, item,
            );
            false
        } else {
            self.model.set_z(user, item, z);
            true
        }
    }

    pub fn set_xs(&mut self, xs: impl IntoIterator<Item = (UserId, FeatureVector)>) -> usize {
        let mut set = 0;
        for (user, x) in xs {
            if self.set_x(user, x) {
                set += 1;
            }
        }
        set
    }

    pub fn set_ts(&mut self, ts: impl IntoIterator<Item = (ItemId, FeatureVector)>) -> usize {
        let mut set = 0;
        for (item, t) in ts {
            if self.set_t(item, t) {
                set += 1;
            }
        }
        set
    }

    /// Sets the dynamic side information of all users.
    pub fn set_zs(&mut self, zs: HashMap<UserId, HashMap<ItemId, FeatureVector>>) -> usize {
        zs.into_iter()
            .map(|(user, zs)| self.set_user_zs(user, zs))
            .sum()
    }

    /// Sets the dynamic side information of one user.
    pub fn set_user_zs(
        &mut self,
        user: UserId,
        zs: impl IntoIterator<Item = (ItemId, FeatureVector)>,
    ) -> usize {
        let mut set = 0;
        for (item, z) in zs {
            if self.set_z(user, item, z) {
                set += 1;
            }
        }
        set
    }
}
