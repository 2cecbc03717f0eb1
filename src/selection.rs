use crate::error::SelectionError;
use crate::models::{Algorithm, Disease};
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref ALGORITHM_DESCRIPTIONS: HashMap<&'static str, &'static str> = HashMap::from([
        (
            "logistic_regression",
            "A statistical model that uses a logistic function to model binary outcomes.",
        ),
        (
            "random_forest",
            "An ensemble learning method that builds multiple decision trees during training.",
        ),
        (
            "svm",
            "A supervised learning model that analyzes data for classification and regression.",
        ),
        (
            "neural_network",
            "A series of algorithms that attempt to recognize underlying relationships in data through processes that mimic the human brain.",
        ),
    ]);
}

pub fn algorithm_description(id: &str) -> &'static str {
    ALGORITHM_DESCRIPTIONS
        .get(id)
        .copied()
        .unwrap_or("A machine learning algorithm for classification")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonPlan {
    Train {
        disease: String,
        algorithms: Vec<String>,
    },
    Compare {
        diseases: Vec<String>,
        algorithms: Vec<String>,
    },
}

/// Checked ids, in the order they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub diseases: Vec<String>,
    pub algorithms: Vec<String>,
}

fn toggle(ids: &mut Vec<String>, id: &str, checked: bool) {
    let present = ids.iter().any(|x| x == id);
    if checked && !present {
        ids.push(id.to_string());
    } else if !checked {
        ids.retain(|x| x != id);
    }
}

impl Selection {
    pub fn with_defaults(diseases: &[Disease], algorithms: &[Algorithm]) -> Self {
        Selection {
            diseases: diseases.first().map(|d| d.id.clone()).into_iter().collect(),
            algorithms: algorithms.iter().map(|a| a.id.clone()).collect(),
        }
    }

    pub fn toggle_disease(&mut self, id: &str, checked: bool) {
        toggle(&mut self.diseases, id, checked);
    }

    pub fn toggle_algorithm(&mut self, id: &str, checked: bool) {
        toggle(&mut self.algorithms, id, checked);
    }

    pub fn has_disease(&self, id: &str) -> bool {
        self.diseases.iter().any(|x| x == id)
    }

    pub fn has_algorithm(&self, id: &str) -> bool {
        self.algorithms.iter().any(|x| x == id)
    }

    pub fn is_ready(&self) -> bool {
        !self.diseases.is_empty() && !self.algorithms.is_empty()
    }

    pub fn plan(&self) -> Result<ComparisonPlan, SelectionError> {
        if !self.is_ready() {
            return Err(SelectionError::Empty);
        }
        Ok(match self.diseases.as_slice() {
            [disease] => ComparisonPlan::Train {
                disease: disease.clone(),
                algorithms: self.algorithms.clone(),
            },
            diseases => ComparisonPlan::Compare {
                diseases: diseases.to_vec(),
                algorithms: self.algorithms.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> (Vec<Disease>, Vec<Algorithm>) {
        let diseases = ["diabetes", "heart_disease"]
            .iter()
            .map(|id| Disease {
                id: id.to_string(),
                name: id.to_string(),
                description: String::new(),
            })
            .collect();
        let algorithms = ["svm", "random_forest"]
            .iter()
            .map(|id| Algorithm {
                id: id.to_string(),
                name: id.to_string(),
            })
            .collect();
        (diseases, algorithms)
    }

    #[test]
    fn defaults_pick_first_disease_all_algorithms() {
        let (d, a) = catalog();
        let sel = Selection::with_defaults(&d, &a);
        assert_eq!(sel.diseases, ["diabetes"]);
        assert_eq!(sel.algorithms, ["svm", "random_forest"]);
    }

    #[test]
    fn defaults_on_empty_catalog() {
        let sel = Selection::with_defaults(&[], &[]);
        assert!(!sel.is_ready());
    }

    #[test]
    fn toggling_is_idempotent() {
        let mut sel = Selection::default();
        sel.toggle_disease("diabetes", true);
        sel.toggle_disease("diabetes", true);
        assert_eq!(sel.diseases, ["diabetes"]);
        sel.toggle_disease("diabetes", false);
        assert!(sel.diseases.is_empty());
    }

    #[test]
    fn empty_selection_rejected() {
        let mut sel = Selection::default();
        sel.toggle_algorithm("svm", true);
        assert_eq!(sel.plan(), Err(SelectionError::Empty));
        assert_eq!(
            sel.plan().unwrap_err().to_string(),
            "Please select at least one disease and one algorithm"
        );
    }

    #[test]
    fn cardinality_picks_endpoint() {
        let mut sel = Selection::default();
        sel.toggle_algorithm("svm", true);
        sel.toggle_disease("diabetes", true);
        assert!(matches!(sel.plan(), Ok(ComparisonPlan::Train { ref disease, .. }) if disease == "diabetes"));

        sel.toggle_disease("heart_disease", true);
        match sel.plan().unwrap() {
            ComparisonPlan::Compare { diseases, algorithms } => {
                assert_eq!(diseases, ["diabetes", "heart_disease"]);
                assert_eq!(algorithms, ["svm"]);
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn unknown_algorithm_has_fallback_description() {
        assert!(algorithm_description("svm").starts_with("A supervised"));
        assert_eq!(
            algorithm_description("xgboost"),
            "A machine learning algorithm for classification"
        );
    }
}
