//! Random forest regression
//!
//! Bagged CART regression trees split on variance reduction. Every tree gets
//! its own seed drawn up front from one seeded generator, so a fit is
//! reproducible no matter how rayon schedules the trees.

use crate::error::{ForecastError, Result};
use crate::models::{validate_training_set, FeatureVector, Regressor, FEATURE_COUNT};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature
    All,
    /// Square root of the feature count
    Sqrt,
    /// Base-2 logarithm of the feature count
    Log2,
    /// A fixed number of features
    Count(usize),
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Count(k) => *k,
        };
        k.clamp(1, n_features)
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split
    pub min_samples_split: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    /// Features tried at each split
    pub max_features: MaxFeatures,
    /// Sample rows with replacement for each tree
    pub bootstrap: bool,
    /// Seed for the whole forest
    pub random_state: u64,
    /// Worker threads, all cores when `None`
    pub n_jobs: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 60,
            max_depth: None,
            min_samples_split: 20,
            min_samples_leaf: 5,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: 42,
            n_jobs: None,
        }
    }
}

impl ForestParams {
    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_leaf must be positive".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "max_depth must be positive".to_string(),
            ));
        }
        if matches!(self.max_features, MaxFeatures::Count(0)) {
            return Err(ForecastError::InvalidParameter(
                "max_features must be positive".to_string(),
            ));
        }
        if self.n_jobs == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "n_jobs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

/// A single fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn fit(
        features: &[FeatureVector],
        target: &[f64],
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let n = features.len();
        let sample: Vec<usize> = if params.bootstrap {
            (0..n).map(|_| rng.gen_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        let k = params.max_features.resolve(FEATURE_COUNT);

        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut pending = vec![(0usize, sample, 0usize)];

        while let Some((id, indices, depth)) = pending.pop() {
            let mean = indices.iter().map(|&i| target[i]).sum::<f64>() / indices.len() as f64;
            let first = target[indices[0]];
            let splittable = indices.len() >= params.min_samples_split
                && indices.len() >= 2 * params.min_samples_leaf
                && params.max_depth.map_or(true, |max| depth < max)
                && indices.iter().any(|&i| target[i] != first);

            let split = if splittable {
                // the first k features of a random order are tried together; the
                // rest only one at a time while no valid split has been found
                let order = index::sample(rng, FEATURE_COUNT, FEATURE_COUNT).into_vec();
                let (drawn, rest) = order.split_at(k);
                let min_leaf = params.min_samples_leaf;
                best_split(features, target, &indices, mean, drawn, min_leaf).or_else(|| {
                    rest.iter().find_map(|&feature| {
                        best_split(features, target, &indices, mean, &[feature], min_leaf)
                    })
                })
            } else {
                None
            };

            match split {
                Some(split) => {
                    let (left, right): (Vec<usize>, Vec<usize>) = indices
                        .into_iter()
                        .partition(|&i| features[i][split.feature] <= split.threshold);
                    let left_id = nodes.len();
                    let right_id = left_id + 1;
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes[id] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left: left_id,
                        right: right_id,
                    };
                    pending.push((left_id, left, depth + 1));
                    pending.push((right_id, right, depth + 1));
                }
                None => nodes[id] = Node::Leaf { value: mean },
            }
        }

        Self { nodes }
    }

    /// Predict one row
    pub fn predict(&self, row: &FeatureVector) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }
}

/// Best variance-reducing split over the candidate features.
///
/// Targets are centred on the node mean, so maximising
/// `sum_left^2 / n_left + sum_right^2 / n_right` minimises the children's
/// squared error.
fn best_split(
    features: &[FeatureVector],
    target: &[f64],
    indices: &[usize],
    mean: f64,
    candidates: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let mut best: Option<SplitCandidate> = None;

    for &feature in candidates {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (features[i][feature], target[i] - mean))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total: f64 = pairs.iter().map(|(_, y)| y).sum();
        let mut left_sum = 0.0;

        for size in 1..n {
            left_sum += pairs[size - 1].1;
            if size < min_leaf || n - size < min_leaf {
                continue;
            }
            let (lo, hi) = (pairs[size - 1].0, pairs[size].0);
            if lo >= hi {
                continue;
            }

            let right_sum = total - left_sum;
            let score =
                left_sum * left_sum / size as f64 + right_sum * right_sum / (n - size) as f64;
            if score > best.map_or(0.0, |b| b.score) {
                let midpoint = lo + (hi - lo) / 2.0;
                best = Some(SplitCandidate {
                    feature,
                    threshold: if midpoint < hi { midpoint } else { lo },
                    score,
                });
            }
        }
    }

    best
}

/// Random forest regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    /// Name of the model
    name: String,
    /// Hyperparameters
    params: ForestParams,
    /// Fitted trees, empty until `fit`
    trees: Vec<RegressionTree>,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl RandomForestRegressor {
    /// Create an unfitted forest
    pub fn new(params: ForestParams) -> Self {
        Self {
            name: format!("Random Forest ({} trees)", params.n_estimators),
            params,
            trees: Vec::new(),
        }
    }

    /// Hyperparameters
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fitted trees
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Check if the forest has been fitted
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn predict_row(&self, row: &FeatureVector) -> f64 {
        self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>() / self.trees.len() as f64
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, features: &[FeatureVector], target: &[f64]) -> Result<()> {
        validate_training_set(features, target)?;
        self.params.validate()?;

        let mut seeder = StdRng::seed_from_u64(self.params.random_state);
        let seeds: Vec<u64> = (0..self.params.n_estimators).map(|_| seeder.gen()).collect();
        let params = &self.params;

        let grow = || {
            seeds
                .par_iter()
                .map(|&seed| {
                    let mut rng = StdRng::seed_from_u64(seed);
                    RegressionTree::fit(features, target, params, &mut rng)
                })
                .collect::<Vec<_>>()
        };

        let trees = match params.n_jobs {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ForecastError::ModelError(e.to_string()))?
                .install(grow),
            None => grow(),
        };

        debug!(
            trees = trees.len(),
            rows = features.len(),
            leaves = trees.iter().map(RegressionTree::leaf_count).sum::<usize>(),
            "fitted random forest"
        );
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(ForecastError::ModelError(
                "model must be fitted before predicting".to_string(),
            ));
        }
        Ok(features.par_iter().map(|row| self.predict_row(row)).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn step_data() -> (Vec<FeatureVector>, Vec<f64>) {
        let features: Vec<FeatureVector> = (0..200)
            .map(|i| {
                let x = i as f64;
                [x % 4.0, x, x, 0.0, 0.0, 0.0, 1.0, 2024.0]
            })
            .collect();
        let target = features
            .iter()
            .map(|row| if row[1] < 100.0 { 10.0 } else { 50.0 })
            .collect();
        (features, target)
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(8), 2);
        assert_eq!(MaxFeatures::Log2.resolve(8), 3);
        assert_eq!(MaxFeatures::All.resolve(8), 8);
        assert_eq!(MaxFeatures::Count(20).resolve(8), 8);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = RandomForestRegressor::default();
        assert!(matches!(
            model.predict(&[[0.0; 8]]),
            Err(ForecastError::ModelError(_))
        ));
    }

    #[test]
    fn test_learns_step_function() {
        let (features, target) = step_data();
        let mut model = RandomForestRegressor::new(ForestParams {
            max_features: MaxFeatures::All,
            ..ForestParams::default()
        });
        model.fit(&features, &target).unwrap();

        assert_eq!(model.trees().len(), 60);
        let low = model.predict_one(&[1.0, 20.0, 20.0, 0.0, 0.0, 0.0, 1.0, 2024.0]).unwrap();
        let high = model.predict_one(&[1.0, 180.0, 180.0, 0.0, 0.0, 0.0, 1.0, 2024.0]).unwrap();
        assert_relative_eq!(low, 10.0, epsilon = 1e-9);
        assert_relative_eq!(high, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_splits_on_the_only_informative_feature() {
        // every column but lag_1 is constant
        let features: Vec<FeatureVector> = (0..200)
            .map(|i| [3.0, i as f64, 50.0, 0.0, 0.0, 0.0, 1.0, 2024.0])
            .collect();
        let target: Vec<f64> = features
            .iter()
            .map(|row| if row[1] < 100.0 { 10.0 } else { 50.0 })
            .collect();

        let mut model = RandomForestRegressor::default();
        model.fit(&features, &target).unwrap();

        assert!(model.trees().iter().all(|tree| tree.leaf_count() > 1));
        let low = model.predict_one(&[3.0, 20.0, 50.0, 0.0, 0.0, 0.0, 1.0, 2024.0]).unwrap();
        let high = model.predict_one(&[3.0, 180.0, 50.0, 0.0, 0.0, 0.0, 1.0, 2024.0]).unwrap();
        assert_relative_eq!(low, 10.0, epsilon = 1e-9);
        assert_relative_eq!(high, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_refit_is_reproducible() {
        let (features, target) = step_data();
        let mut first = RandomForestRegressor::default();
        let mut second = RandomForestRegressor::new(ForestParams {
            n_jobs: Some(2),
            ..ForestParams::default()
        });
        first.fit(&features, &target).unwrap();
        second.fit(&features, &target).unwrap();
        assert_eq!(first.trees(), second.trees());

        let before = first.trees().to_vec();
        first.fit(&features, &target).unwrap();
        assert_eq!(first.trees(), before.as_slice());
    }

    #[test]
    fn test_leaves_respect_min_samples_leaf() {
        let (features, target) = step_data();
        let mut model = RandomForestRegressor::new(ForestParams {
            n_estimators: 1,
            bootstrap: false,
            ..ForestParams::default()
        });
        model.fit(&features, &target).unwrap();
        // 200 rows, leaves hold at least 5 rows
        assert!(model.trees()[0].leaf_count() <= 40);
    }

    #[test]
    fn test_invalid_params() {
        let params = ForestParams {
            n_estimators: 0,
            ..ForestParams::default()
        };
        assert!(params.validate().is_err());
    }
}
