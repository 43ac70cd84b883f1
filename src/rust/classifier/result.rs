use super::error::ClassifierError;
use super::model::{ModelOutput, Observation};

/// Ranked classification for one image. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    observations: Vec<Observation>,
}

impl ClassificationResult {
    /// Interprets a raw model output.
    ///
    /// Observations are ranked by confidence, highest first. The sort is stable,
    /// so an output that is already ranked keeps its order.
    ///
    /// # Errors
    /// - `ClassificationUnavailable` if the output is not a classification
    /// - `ClassificationUnavailable` if the output holds no observations
    /// - `ClassificationUnavailable` if any confidence is NaN or infinite
    pub fn from_output(output: ModelOutput) -> Result<Self, ClassifierError> {
        let mut observations = match output {
            ModelOutput::Classifications(observations) => observations,
            ModelOutput::Other { kind } => {
                return Err(ClassifierError::ClassificationUnavailable(format!(
                    "expected classification observations, got {}",
                    kind
                )));
            }
        };

        if observations.is_empty() {
            return Err(ClassifierError::ClassificationUnavailable(
                "model returned no observations".into(),
            ));
        }

        if let Some(bad) = observations.iter().find(|o| !o.confidence.is_finite()) {
            return Err(ClassifierError::ClassificationUnavailable(format!(
                "confidence for '{}' is {}",
                bad.identifier, bad.confidence
            )));
        }

        observations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(Self { observations })
    }

    pub fn top(&self) -> &Observation {
        &self.observations[0]
    }

    pub fn label(&self) -> &str {
        &self.top().identifier
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_is_highest_confidence() {
        let result = ClassificationResult::from_output(ModelOutput::Classifications(vec![
            Observation::new("cat", 0.2),
            Observation::new("dog", 0.8),
        ]))
        .unwrap();
        assert_eq!(result.label(), "dog");
        assert_eq!(result.observations()[1].identifier, "cat");
    }

    #[test]
    fn test_ties_keep_model_order() {
        let result = ClassificationResult::from_output(ModelOutput::Classifications(vec![
            Observation::new("cat", 0.5),
            Observation::new("dog", 0.5),
        ]))
        .unwrap();
        assert_eq!(result.label(), "cat");
    }

    #[test]
    fn test_empty_output_is_unavailable() {
        let result = ClassificationResult::from_output(ModelOutput::Classifications(vec![]));
        assert!(matches!(result, Err(ClassifierError::ClassificationUnavailable(_))));
    }

    #[test]
    fn test_wrong_output_type_is_unavailable() {
        let result = ClassificationResult::from_output(ModelOutput::Other {
            kind: "feature vector".into(),
        });
        let err = result.unwrap_err();
        assert!(err.to_string().contains("feature vector"));
    }

    #[test]
    fn test_nan_confidence_is_unavailable() {
        let result = ClassificationResult::from_output(ModelOutput::Classifications(vec![
            Observation::new("cat", 0.9),
            Observation::new("dog", f32::NAN),
        ]));
        match result {
            Err(ClassifierError::ClassificationUnavailable(msg)) => assert!(msg.contains("dog")),
            other => panic!("expected unavailable classification, got {:?}", other),
        }

        let result = ClassificationResult::from_output(ModelOutput::Classifications(vec![
            Observation::new("cat", f32::INFINITY),
        ]));
        assert!(matches!(result, Err(ClassifierError::ClassificationUnavailable(_))));
    }
}
