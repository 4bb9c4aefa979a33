//! Session scoring pipeline: derive features, then classify

use std::sync::Arc;

use crate::error::ScoringError;
use crate::features::{derive_features, FeatureRecord};
use crate::model::ModelBundle;
use crate::session::{Prediction, SessionInput};

/// Scores sessions against one loaded model bundle
///
/// Cheap to clone; clones share the bundle. Holds no mutable state, so a
/// single instance serves concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ModelBundle>,
}

impl Predictor {
    pub fn new(bundle: ModelBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Derived features for a session, as the classifier will see them
    pub fn features(&self, input: &SessionInput) -> FeatureRecord {
        derive_features(input, self.bundle.features())
    }

    /// Score one session
    pub fn predict(&self, input: &SessionInput) -> Result<Prediction, ScoringError> {
        let record = self.features(input);
        tracing::debug!(session_id = %input.session_id, ?record, "derived features");

        let prediction = self.bundle.predict(&record)?;
        Ok(Prediction {
            session_id: input.session_id.clone(),
            prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{IS_SOCIAL, IS_WEEKEND};
    use crate::model::bundle::tests::SHIPPED_BUNDLE;
    use crate::session::tests::sample_session;

    fn predictor() -> Predictor {
        Predictor::new(ModelBundle::from_json(SHIPPED_BUNDLE).unwrap())
    }

    #[test]
    fn test_echoes_session_id() {
        let prediction = predictor().predict(&sample_session()).unwrap();
        assert_eq!(
            prediction,
            Prediction {
                session_id: "s1".to_string(),
                prediction: 1
            }
        );
    }

    #[test]
    fn test_identical_input_identical_output() {
        let predictor = predictor();
        let input = sample_session();

        let first = serde_json::to_vec(&predictor.predict(&input).unwrap()).unwrap();
        let second = serde_json::to_vec(&predictor.predict(&input).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_features_use_bundle_settings() {
        let record = predictor().features(&sample_session());
        assert_eq!(record.numeric(IS_SOCIAL), Some(1.0));
        assert_eq!(record.numeric(IS_WEEKEND), Some(1.0));
    }

    #[test]
    fn test_malformed_inputs_still_score() {
        let mut input = sample_session();
        input.visit_date = "yesterday".to_string();
        input.device_screen_resolution = "(not set)".to_string();

        let prediction = predictor().predict(&input).unwrap();
        assert_eq!(prediction.session_id, "s1");
    }

    #[test]
    fn test_clones_share_bundle() {
        let predictor = predictor();
        let clone = predictor.clone();
        assert!(std::ptr::eq(predictor.bundle(), clone.bundle()));
    }
}
