use std::collections::HashMap;

use feature_vector::FeatureVector;
use log::trace;
use rand::{rngs::StdRng, Rng};

use crate::{
    config::{Config, ConfigError},
    data::{ItemId, UserId},
    error::Error,
    hypothesis::HypothesisKind,
    model::{
        init::{initial_cuts, random_factors},
        FeatureVectorModel,
        ITEM_INTERCEPT_INDEX,
        USER_INTERCEPT_INDEX,
    },
};

/// A [`FeatureVectorModel`] keeping all parameters in memory.
///
/// The random number generator used for the initialization of the factors is injected, a
/// seeded generator makes the model reproducible.
pub struct InMemoryFeatureVectorModel<R = StdRng> {
    classes: usize,
    class_vectors: usize,
    factor_size: usize,
    cuts: Vec<f32>,
    alphas: HashMap<UserId, Vec<FeatureVector>>,
    betas: HashMap<ItemId, Vec<FeatureVector>>,
    thetas_on_t: HashMap<UserId, Vec<FeatureVector>>,
    thetas_on_z: HashMap<UserId, Vec<FeatureVector>>,
    gammas_on_x: HashMap<ItemId, Vec<FeatureVector>>,
    gammas_on_z: HashMap<ItemId, Vec<FeatureVector>>,
    xs: HashMap<UserId, FeatureVector>,
    ts: HashMap<ItemId, FeatureVector>,
    zs: HashMap<UserId, HashMap<ItemId, FeatureVector>>,
    rng: R,
}

impl<R> InMemoryFeatureVectorModel<R>
where
    R: Rng,
{
    /// Creates an empty model.
    ///
    /// Numerical responses have `0` or `1` classes. Ordinal and binary models share a single
    /// vector per parameter family, multinomial models have one per class.
    ///
    /// # Errors
    /// Fails if an ordinal model has less than two classes.
    pub fn new(
        factor_size: usize,
        classes: usize,
        ordinal: bool,
        mut rng: R,
    ) -> Result<Self, Error> {
        if ordinal && classes < 2 {
            return Err(ConfigError::Classes {
                hypothesis: HypothesisKind::Ordinal,
                classes,
            }
            .into());
        }
        let classes = classes.max(1);
        let class_vectors = if ordinal || classes <= 2 { 1 } else { classes };
        let cuts = initial_cuts(&mut rng, classes, ordinal);

        Ok(Self {
            classes,
            class_vectors,
            factor_size,
            cuts,
            alphas: HashMap::new(),
            betas: HashMap::new(),
            thetas_on_t: HashMap::new(),
            thetas_on_z: HashMap::new(),
            gammas_on_x: HashMap::new(),
            gammas_on_z: HashMap::new(),
            xs: HashMap::new(),
            ts: HashMap::new(),
            zs: HashMap::new(),
            rng,
        })
    }

    /// Creates an empty model for the configured hypothesis.
    ///
    /// # Errors
    /// Fails if an ordinal model has less than two classes.
    pub fn from_config(config: &Config, rng: R) -> Result<Self, Error> {
        Self::new(
            config.factor_size(),
            config.classes(),
            config.hypothesis() == HypothesisKind::Ordinal,
            rng,
        )
    }

    fn zeros(&self) -> Vec<FeatureVector> {
        vec![FeatureVector::empty_sparse(); self.class_vectors]
    }
}

impl<R> FeatureVectorModel for InMemoryFeatureVectorModel<R>
where
    R: Rng,
{
    fn number_of_classes(&self) -> usize {
        self.classes
    }

    fn class_vectors(&self) -> usize {
        self.class_vectors
    }

    fn initialize_user_if_needed(&mut self, user: UserId) {
        let (rng, factor_size, class_vectors) =
            (&mut self.rng, self.factor_size, self.class_vectors);
        self.alphas.entry(user).or_insert_with(|| {
            trace!("initializing the factors of user {}", user);
            random_factors(rng, factor_size, class_vectors, USER_INTERCEPT_INDEX)
        });
    }

    fn initialize_item_if_needed(&mut self, item: ItemId) {
        let (rng, factor_size, class_vectors) =
            (&mut self.rng, self.factor_size, self.class_vectors);
        self.betas.entry(item).or_insert_with(|| {
            trace!("initializing the factors of item {}", item);
            random_factors(rng, factor_size, class_vectors, ITEM_INTERCEPT_INDEX)
        });
    }

    fn contains_user(&self, user: UserId) -> bool {
        self.alphas.contains_key(&user)
    }

    fn contains_item(&self, item: ItemId) -> bool {
        self.betas.contains_key(&item)
    }

    fn user_ids(&self) -> Vec<UserId> {
        let mut ids = self.alphas.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    fn item_ids(&self) -> Vec<ItemId> {
        let mut ids = self.betas.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    fn cuts(&self) -> Vec<f32> {
        self.cuts.clone()
    }

    fn set_cuts(&mut self, cuts: Vec<f32>) {
        self.cuts = cuts;
    }

    fn set_cut(&mut self, index: usize, cut: f32) -> Result<(), Error> {
        let len = self.cuts.len();
        let entry = self.cuts.get_mut(index).ok_or_else(|| {
            Error::shape("cuts", len, "the cut index is out of bounds")
        })?;
        *entry = cut;
        Ok(())
    }

    fn alphas(&mut self, user: UserId) -> Vec<FeatureVector> {
        self.initialize_user_if_needed(user);
        self.alphas.get(&user).cloned().unwrap_or_default()
    }

    fn set_alphas(&mut self, user: UserId, alphas: Vec<FeatureVector>) {
        self.alphas.insert(user, alphas);
    }

    fn betas(&mut self, item: ItemId) -> Vec<FeatureVector> {
        self.initialize_item_if_needed(item);
        self.betas.get(&item).cloned().unwrap_or_default()
    }

    fn set_betas(&mut self, item: ItemId, betas: Vec<FeatureVector>) {
        self.betas.insert(item, betas);
    }

    fn thetas_on_t(&mut self, user: UserId) -> Vec<FeatureVector> {
        let zeros = self.zeros();
        self.thetas_on_t.entry(user).or_insert(zeros).clone()
    }

    fn set_thetas_on_t(&mut self, user: UserId, thetas: Vec<FeatureVector>) {
        self.thetas_on_t.insert(user, thetas);
    }

    fn thetas_on_z(&mut self, user: UserId) -> Vec<FeatureVector> {
        let zeros = self.zeros();
        self.thetas_on_z.entry(user).or_insert(zeros).clone()
    }

    fn set_thetas_on_z(&mut self, user: UserId, thetas: Vec<FeatureVector>) {
        self.thetas_on_z.insert(user, thetas);
    }

    fn gammas_on_x(&mut self, item: ItemId) -> Vec<FeatureVector> {
        let zeros = self.zeros();
        self.gammas_on_x.entry(item).or_insert(zeros).clone()
    }

    fn set_gammas_on_x(&mut self, item: ItemId, gammas: Vec<FeatureVector>) {
        self.gammas_on_x.insert(item, gammas);
    }

    fn gammas_on_z(&mut self, item: ItemId) -> Vec<FeatureVector> {
        let zeros = self.zeros();
        self.gammas_on_z.entry(item).or_insert(zeros).clone()
    }

    fn set_gammas_on_z(&mut self, item: ItemId, gammas: Vec<FeatureVector>) {
        self.gammas_on_z.insert(item, gammas);
    }

    fn x(&self, user: UserId) -> FeatureVector {
        self.xs
            .get(&user)
            .cloned()
            .unwrap_or_else(FeatureVector::empty_sparse)
    }

    fn set_x(&mut self, user: UserId, x: FeatureVector) {
        self.xs.insert(user, x);
    }

    fn has_x(&self, user: UserId) -> bool {
        self.xs.contains_key(&user)
    }

    fn t(&self, item: ItemId) -> FeatureVector {
        self.ts
            .get(&item)
            .cloned()
            .unwrap_or_else(FeatureVector::empty_sparse)
    }

    fn set_t(&mut self, item: ItemId, t: FeatureVector) {
        self.ts.insert(item, t);
    }

    fn has_t(&self, item: ItemId) -> bool {
        self.ts.contains_key(&item)
    }

    fn z(&self, user: UserId, item: ItemId) -> FeatureVector {
        self.zs
            .get(&user)
            .and_then(|zs| zs.get(&item))
            .cloned()
            .unwrap_or_else(FeatureVector::empty_sparse)
    }

    fn set_z(&mut self, user: UserId, item: ItemId, z: FeatureVector) {
        self.zs.entry(user).or_default().insert(item, z);
    }

    fn has_z(&self, user: UserId, item: ItemId) -> bool {
        self.zs
            .get(&user)
            .map_or(false, |zs| zs.contains_key(&item))
    }

    fn remove_z(&mut self, user: UserId, item: ItemId) -> Option<FeatureVector> {
        let zs = self.zs.get_mut(&user)?;
        let z = zs.remove(&item);
        if zs.is_empty() {
            self.zs.remove(&user);
        }
        z
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use test_utils::assert_approx_eq;

    use super::*;

    fn model(classes: usize, ordinal: bool) -> InMemoryFeatureVectorModel {
        InMemoryFeatureVectorModel::new(5, classes, ordinal, StdRng::seed_from_u64(7)).unwrap()
    }

    #[test]
    fn test_alphas_are_created_on_read() {
        let mut model = model(1, false);
        let user = UserId(3);
        assert!(!model.contains_user(user));

        let alphas = model.alphas(user);
        assert!(model.contains_user(user));
        assert_eq!(model.user_ids(), [user]);
        assert_eq!(alphas.len(), 1);
        assert_eq!(alphas[0].cardinality(), Some(8));
        assert_approx_eq!(f32, alphas[0].get(0), 0.);
        assert_approx_eq!(f32, alphas[0].get(USER_INTERCEPT_INDEX), 1.);
        assert_eq!(model.alphas(user), alphas);
    }

    #[test]
    fn test_betas_are_created_on_read() {
        let mut model = model(1, false);
        let item = ItemId(4);
        assert!(!model.contains_item(item));

        let betas = model.betas(item);
        assert!(model.contains_item(item));
        assert_eq!(model.item_ids(), [item]);
        assert_approx_eq!(f32, betas[0].get(0), 0.);
        assert_approx_eq!(f32, betas[0].get(ITEM_INTERCEPT_INDEX), 1.);
    }

    #[test]
    fn test_initialization_is_idempotent() {
        let mut model = model(1, false);
        let user = UserId(1);
        let alphas = vec![FeatureVector::from(vec![0., 1., 2., 3., 4., 5., 6., 7.])];
        model.set_alphas(user, alphas.clone());
        model.initialize_user_if_needed(user);
        assert_eq!(model.alphas(user), alphas);
    }

    #[test]
    fn test_seeded_models_are_reproducible() {
        let mut first = model(3, false);
        let mut second = model(3, false);
        assert_eq!(first.alphas(UserId(1)), second.alphas(UserId(1)));
        assert_eq!(first.betas(ItemId(1)), second.betas(ItemId(1)));
    }

    #[test]
    fn test_class_vectors() {
        assert_eq!(model(0, false).number_of_classes(), 1);
        assert_eq!(model(0, false).class_vectors(), 1);
        assert_eq!(model(2, false).class_vectors(), 1);
        assert_eq!(model(5, false).class_vectors(), 5);
        assert_eq!(model(5, true).class_vectors(), 1);
        assert_eq!(model(5, true).number_of_classes(), 5);
        assert_eq!(model(5, false).alphas(UserId(0)).len(), 5);
    }

    #[test]
    fn test_cuts() {
        assert!(model(1, false).cuts().is_empty());
        assert_approx_eq!(f32, model(3, false).cuts(), [0., 0.]);

        let mut model = model(4, true);
        let cuts = model.cuts();
        assert_eq!(cuts.len(), 3);
        assert!(cuts.iter().all(|cut| *cut > 0.));

        model.set_cut(2, 0.5).unwrap();
        assert_approx_eq!(f32, model.cuts()[2], 0.5);
        assert!(model.set_cut(3, 0.5).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_ordinal_needs_two_classes() {
        let error = InMemoryFeatureVectorModel::new(5, 1, true, StdRng::seed_from_u64(7))
            .err()
            .unwrap();
        assert!(matches!(error, Error::Config(ConfigError::Classes { .. })));
    }

    #[test]
    fn test_side_info_parameters_are_zeros() {
        let mut model = model(4, false);
        let user = UserId(1);
        let item = ItemId(2);

        for parameters in [
            model.thetas_on_t(user),
            model.thetas_on_z(user),
            model.gammas_on_x(item),
            model.gammas_on_z(item),
        ] {
            assert_eq!(parameters, vec![FeatureVector::empty_sparse(); 4]);
        }

        let thetas = vec![FeatureVector::sparse(vec![(1, 2.)]); 4];
        model.set_thetas_on_t(user, thetas.clone());
        assert_eq!(model.thetas_on_t(user), thetas);
    }

    #[test]
    fn test_side_info() {
        let mut model = model(1, false);
        let user = UserId(1);
        let item = ItemId(2);
        assert!(!model.has_x(user));
        assert_eq!(model.x(user), FeatureVector::empty_sparse());
        assert_eq!(model.t(item), FeatureVector::empty_sparse());
        assert_eq!(model.z(user, item), FeatureVector::empty_sparse());
        assert!(!model.has_x(user));
        assert!(!model.has_t(item));
        assert!(!model.has_z(user, item));

        let x = FeatureVector::sparse(vec![(0, 1.), (5, 2.)]);
        model.set_x(user, x.clone());
        assert!(model.has_x(user));
        assert_eq!(model.x(user), x);

        let t = FeatureVector::sparse(vec![(3, 1.)]);
        model.set_t(item, t.clone());
        assert!(model.has_t(item));
        assert_eq!(model.t(item), t);

        let z = FeatureVector::sparse(vec![(1, 4.)]);
        model.set_z(user, item, z.clone());
        assert!(model.has_z(user, item));
        assert!(!model.has_z(user, ItemId(3)));
        assert_eq!(model.z(user, item), z);

        assert_eq!(model.remove_z(user, item), Some(z));
        assert!(!model.has_z(user, item));
        assert_eq!(model.remove_z(user, item), None);
    }
}
