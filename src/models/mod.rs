//! Classifier implementations and the fixed candidate catalog.
//!
//! The catalog maps each family name to a constructor plus its
//! hyperparameter search space, so the trainer iterates generically and
//! adding a family never touches the selection logic.

pub mod adaboost;
pub mod forest;
pub mod gradient;
pub mod imputer;
pub mod logistic;
pub mod tree;

pub use adaboost::AdaBoostClassifier;
pub use forest::RandomForestClassifier;
pub use gradient::GradientBoostingClassifier;
pub use imputer::KnnImputer;
pub use logistic::LogisticRegressionClassifier;
pub use tree::{DecisionTreeClassifier, SplitCriterion};

use anyhow::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

/// A concrete parameter assignment drawn from a grid.
pub type ParamSet = HashMap<String, Value>;

/// A classifier family, configured and possibly fitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedClassifier {
    RandomForest(RandomForestClassifier),
    DecisionTree(DecisionTreeClassifier),
    GradientBoosting(GradientBoostingClassifier),
    LogisticRegression(LogisticRegressionClassifier),
    AdaBoost(AdaBoostClassifier),
}

impl TrainedClassifier {
    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        match self {
            Self::RandomForest(m) => m.fit(x, y),
            Self::DecisionTree(m) => m.fit(x, y),
            Self::GradientBoosting(m) => m.fit(x, y),
            Self::LogisticRegression(m) => m.fit(x, y),
            Self::AdaBoost(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        match self {
            Self::RandomForest(m) => m.predict(x),
            Self::DecisionTree(m) => m.predict(x),
            Self::GradientBoosting(m) => m.predict(x),
            Self::LogisticRegression(m) => m.predict(x),
            Self::AdaBoost(m) => m.predict(x),
        }
    }
}

/// One catalog entry: a family name, its hyperparameter grid, and a
/// constructor turning a parameter assignment into an unfitted model.
pub struct CandidateModel {
    pub name: &'static str,
    pub grid: Vec<(&'static str, Vec<Value>)>,
    pub build: fn(&ParamSet) -> TrainedClassifier,
}

/// The fixed candidate catalog, in selection tie-break order.
pub fn model_catalog() -> Vec<CandidateModel> {
    vec![
        CandidateModel {
            name: "random_forest",
            grid: vec![(
                "n_estimators",
                vec![json!(8), json!(16), json!(32), json!(64)],
            )],
            build: |params| {
                TrainedClassifier::RandomForest(RandomForestClassifier::new(usize_param(
                    params,
                    "n_estimators",
                    100,
                )))
            },
        },
        CandidateModel {
            name: "decision_tree",
            grid: vec![(
                "criterion",
                vec![json!("gini"), json!("entropy"), json!("log_loss")],
            )],
            build: |params| {
                let criterion = SplitCriterion::from_name(&str_param(params, "criterion", "gini"));
                TrainedClassifier::DecisionTree(DecisionTreeClassifier::new(criterion))
            },
        },
        CandidateModel {
            name: "gradient_boosting",
            grid: vec![
                ("learning_rate", vec![json!(0.1), json!(0.05)]),
                ("subsample", vec![json!(0.7), json!(0.9)]),
                ("n_estimators", vec![json!(16), json!(32)]),
            ],
            build: |params| {
                TrainedClassifier::GradientBoosting(GradientBoostingClassifier::new(
                    usize_param(params, "n_estimators", 100),
                    f64_param(params, "learning_rate", 0.1),
                    f64_param(params, "subsample", 1.0),
                ))
            },
        },
        CandidateModel {
            name: "logistic_regression",
            grid: Vec::new(),
            build: |_| TrainedClassifier::LogisticRegression(LogisticRegressionClassifier::new()),
        },
        CandidateModel {
            name: "ada_boost",
            grid: vec![
                ("learning_rate", vec![json!(0.5), json!(1.0)]),
                ("n_estimators", vec![json!(16), json!(32), json!(64)]),
            ],
            build: |params| {
                TrainedClassifier::AdaBoost(AdaBoostClassifier::new(
                    usize_param(params, "n_estimators", 50),
                    f64_param(params, "learning_rate", 1.0),
                ))
            },
        },
    ]
}

pub fn usize_param(params: &ParamSet, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

pub fn f64_param(params: &ParamSet, key: &str, default: f64) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(default)
}

pub fn str_param(params: &ParamSet, key: &str, default: &str) -> String {
    params
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
