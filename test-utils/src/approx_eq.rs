use ndarray::{ArrayBase, Data, Dimension, IntoDimension};

/// Asserts that two float "things" are approximately equal.
///
/// Both sides are flattened into their leaf values together with the position of each leaf,
/// positions must match exactly and values must be approximately equal.
///
/// ```
/// use test_utils::assert_approx_eq;
/// assert_approx_eq!(f32, 0.15039155, 0.1503916, ulps = 3);
/// assert_approx_eq!(f32, &[0.1, 0.2], vec![0.1, 0.2]);
/// assert_approx_eq!(f32, vec![-0.2001, 0.15], [-0.2, 0.15], epsilon = 1e-3);
/// ```
///
/// ```
/// use ndarray::arr1;
/// use test_utils::assert_approx_eq;
/// assert_approx_eq!(f32, arr1(&[1., 2.]), [1., 2.]);
/// ```
///
/// `epsilon` defaults to `0` and `ulps` to `2`. Two NaN values are treated as equal.
#[macro_export]
macro_rules! assert_approx_eq {
    ($t:ty, $left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = 0., ulps = 2)
    };
    ($t:ty, $left:expr, $right:expr, ulps = $ulps:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = 0., ulps = $ulps)
    };
    ($t:ty, $left:expr, $right:expr, epsilon = $epsilon:expr $(,)?) => {
        $crate::assert_approx_eq!($t, $left, $right, epsilon = $epsilon, ulps = 2)
    };
    ($t:ty, $left:expr, $right:expr, epsilon = $epsilon:expr, ulps = $ulps:expr $(,)?) => {{
        let epsilon = $epsilon;
        let ulps = $ulps;
        let left = $crate::ApproxLeaves::leaves(&$left);
        let right = $crate::ApproxLeaves::leaves(&$right);
        std::assert_eq!(
            left.len(),
            right.len(),
            "number of values differs: {:?} != {:?}",
            left,
            right,
        );
        for ((left_position, lv), (right_position, rv)) in left.into_iter().zip(right) {
            std::assert_eq!(
                left_position, right_position,
                "shapes differ: {:?} != {:?}",
                left_position, right_position,
            );
            if !(lv.is_nan() && rv.is_nan()) {
                std::assert!(
                    $crate::approx_eq!($t, lv, rv, ulps = ulps, epsilon = epsilon),
                    "approx equal assertion failed at {:?}: {:?} == {:?} (ulps={:?}, eps={:?})",
                    left_position,
                    lv,
                    rv,
                    ulps,
                    epsilon,
                );
            }
        }
    }};
}

/// Flattens a value into its float leaves for [`assert_approx_eq!`].
///
/// Each leaf is paired with its position, i.e. the index into every nesting level.
pub trait ApproxLeaves {
    fn leaves(&self) -> Vec<(Vec<usize>, f32)>;
}

impl ApproxLeaves for f32 {
    fn leaves(&self) -> Vec<(Vec<usize>, f32)> {
        vec![(Vec::new(), *self)]
    }
}

impl<T> ApproxLeaves for &T
where
    T: ApproxLeaves + ?Sized,
{
    fn leaves(&self) -> Vec<(Vec<usize>, f32)> {
        (**self).leaves()
    }
}

impl<T> ApproxLeaves for [T]
where
    T: ApproxLeaves,
{
    fn leaves(&self) -> Vec<(Vec<usize>, f32)> {
        self.iter()
            .enumerate()
            .flat_map(|(index, nested)| {
                nested.leaves().into_iter().map(move |(mut position, leaf)| {
                    position.insert(0, index);
                    (position, leaf)
                })
            })
            .collect()
    }
}

impl<T, const N: usize> ApproxLeaves for [T; N]
where
    T: ApproxLeaves,
{
    fn leaves(&self) -> Vec<(Vec<usize>, f32)> {
        self[..].leaves()
    }
}

impl<T> ApproxLeaves for Vec<T>
where
    T: ApproxLeaves,
{
    fn leaves(&self) -> Vec<(Vec<usize>, f32)> {
        self[..].leaves()
    }
}

impl<T> ApproxLeaves for Option<T>
where
    T: ApproxLeaves,
{
    fn leaves(&self) -> Vec<(Vec<usize>, f32)> {
        self.as_ref().map(ApproxLeaves::leaves).unwrap_or_default()
    }
}

impl<S, D> ApproxLeaves for ArrayBase<S, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    fn leaves(&self) -> Vec<(Vec<usize>, f32)> {
        self.indexed_iter()
            .map(|(position, leaf)| (position.into_dimension().as_array_view().to_vec(), *leaf))
            .collect()
    }
}
