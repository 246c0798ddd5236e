/// Random forest, cross-validated grid search and scoring.
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::error::Failed;
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::{debug, info};

/// Hyperparameters for one ensemble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl ForestParams {
    /// Features tried at each split: `floor(sqrt(n_features))`, at least one.
    pub fn max_features(n_features: usize) -> usize {
        ((n_features as f64).sqrt().floor() as usize).max(1)
    }

    fn to_smartcore(&self, n_features: usize) -> Result<RandomForestClassifierParameters, Failed> {
        let n_trees = u16::try_from(self.n_trees)
            .map_err(|_| Failed::fit(&format!("{} trees is too many", self.n_trees)))?;
        let max_depth = u16::try_from(self.max_depth)
            .map_err(|_| Failed::fit(&format!("max depth {} is too deep", self.max_depth)))?;
        Ok(RandomForestClassifierParameters::default()
            .with_n_trees(n_trees)
            .with_max_depth(max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_m(Self::max_features(n_features))
            .with_seed(self.seed))
    }
}

/// Values searched for each hyperparameter
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub n_trees: Vec<usize>,
    pub max_depth: Vec<usize>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        ParamGrid {
            n_trees: vec![100, 200],
            max_depth: vec![5, 10, 15],
            min_samples_split: vec![2, 5],
            min_samples_leaf: vec![1, 2],
        }
    }
}

impl ParamGrid {
    /// Every combination, parameter names taken alphabetically
    /// (max_depth, min_samples_leaf, min_samples_split, n_trees) with the
    /// last one varying fastest.
    pub fn candidates(&self, seed: u64) -> Vec<ForestParams> {
        let mut out = Vec::new();
        for &max_depth in &self.max_depth {
            for &min_samples_leaf in &self.min_samples_leaf {
                for &min_samples_split in &self.min_samples_split {
                    for &n_trees in &self.n_trees {
                        out.push(ForestParams {
                            n_trees,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                            seed,
                        });
                    }
                }
            }
        }
        out
    }
}

type Classifier = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

fn dense(x: &Array2<f64>) -> DenseMatrix<f64> {
    let rows: Vec<Vec<f64>> = x.rows().into_iter().map(|r| r.to_vec()).collect();
    DenseMatrix::from_2d_vec(&rows)
}

/// Bootstrap-aggregated CART trees with features sampled at every split.
/// Home wins are class 1. Fitting is fully determined by `params.seed`.
pub struct RandomForest {
    params: ForestParams,
    forest: Classifier,
}

impl RandomForest {
    pub fn fit(params: &ForestParams, x: &Array2<f64>, y: &Array1<bool>) -> Result<Self, Failed> {
        let (n, p) = x.dim();
        if n == 0 || p == 0 {
            return Err(Failed::fit("cannot fit a forest on an empty matrix"));
        }
        let labels: Vec<u32> = y.iter().map(|&home| u32::from(home)).collect();
        let forest = Classifier::fit(&dense(x), &labels, params.to_smartcore(p)?)?;
        Ok(RandomForest { params: *params, forest })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// `true` where the forest's majority vote is a home win.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<bool>, Failed> {
        if x.nrows() == 0 {
            return Ok(Array1::from(vec![]));
        }
        let pred = self.forest.predict(&dense(x))?;
        Ok(pred.into_iter().map(|c| c == 1).collect())
    }
}

/// Fraction of predictions matching the truth.
pub fn accuracy(predicted: &Array1<bool>, truth: &Array1<bool>) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(truth.iter()).filter(|(p, t)| p == t).count();
    correct as f64 / truth.len() as f64
}

/// Non-shuffled stratified k-fold. Returns the held-out row indices of each
/// fold. Rows are ordered by class, then by position, and dealt to the folds
/// in turn, so every fold gets its share of each class.
pub fn stratified_folds(y: &Array1<bool>, k: usize) -> Vec<Vec<usize>> {
    let mut folds = vec![Vec::new(); k];
    let ordered = (0..y.len())
        .filter(|&i| !y[i])
        .chain((0..y.len()).filter(|&i| y[i]));
    for (pos, i) in ordered.enumerate() {
        folds[pos % k].push(i);
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

fn fold_score(
    params: &ForestParams,
    x: &Array2<f64>,
    y: &Array1<bool>,
    held_out: &[usize],
) -> Result<f64, Failed> {
    let train: Vec<usize> = (0..y.len()).filter(|i| held_out.binary_search(i).is_err()).collect();
    let forest = RandomForest::fit(params, &x.select(Axis(0), &train), &y.select(Axis(0), &train))?;
    let pred = forest.predict(&x.select(Axis(0), held_out))?;
    Ok(accuracy(&pred, &y.select(Axis(0), held_out)))
}

/// Index of the first candidate with the highest score.
fn first_best(scores: &[(ForestParams, f64)]) -> usize {
    let mut best = 0;
    for (i, (_, score)) in scores.iter().enumerate() {
        if *score > scores[best].1 {
            best = i;
        }
    }
    best
}

/// Outcome of a grid search
pub struct SearchResult {
    pub best: RandomForest,
    pub best_score: f64,
    /// Mean fold accuracy per candidate, in candidate order
    pub scores: Vec<(ForestParams, f64)>,
}

/// input: training matrix, targets, grid, fold count, seed
/// output: the best candidate refit on all rows, plus every candidate's score
/// logic: score each (candidate, fold) pair in parallel, average per
/// candidate, keep the first highest mean, refit it.
pub fn grid_search(
    x: &Array2<f64>,
    y: &Array1<bool>,
    grid: &ParamGrid,
    folds: usize,
    seed: u64,
) -> Result<SearchResult, Failed> {
    if folds < 2 || y.len() < folds {
        return Err(Failed::fit(&format!("{} rows cannot be split into {} folds", y.len(), folds)));
    }
    let candidates = grid.candidates(seed);
    if candidates.is_empty() {
        return Err(Failed::fit("empty parameter grid"));
    }
    let splits = stratified_folds(y, folds);
    info!(candidates = candidates.len(), folds, fits = candidates.len() * folds, "starting grid search");

    let jobs: Vec<(usize, usize)> = (0..candidates.len())
        .flat_map(|c| (0..folds).map(move |f| (c, f)))
        .collect();
    let fold_scores: Vec<f64> = jobs
        .par_iter()
        .map(|&(c, f)| fold_score(&candidates[c], x, y, &splits[f]))
        .collect::<Result<_, _>>()?;

    let scores: Vec<(ForestParams, f64)> = candidates
        .iter()
        .zip(fold_scores.chunks(folds))
        .map(|(params, s)| (*params, s.iter().sum::<f64>() / folds as f64))
        .collect();
    for (params, score) in &scores {
        debug!(?params, score, "candidate scored");
    }

    let (best_params, best_score) = scores[first_best(&scores)];
    info!(?best_params, best_score, "grid search finished");

    let best = RandomForest::fit(&best_params, x, y)?;
    Ok(SearchResult { best, best_score, scores })
}
