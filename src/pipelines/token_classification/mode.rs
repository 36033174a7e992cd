use std::{fmt::Display, str::FromStr};

/// The execution mode the model function runs in
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Mode {
    /// Compute the loss so the learner can step the optimizer
    Train,

    /// Compute the loss and evaluation metrics
    Eval,

    /// Produce predictions
    Predict,
}

impl Mode {
    /// Dropout is only active while training
    pub fn is_training(&self) -> bool {
        matches!(self, Mode::Train)
    }

    /// The string token that identifies this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Eval => "eval",
            Mode::Predict => "predict",
        }
    }
}

impl FromStr for Mode {
    type Err = ModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "train" => Ok(Mode::Train),
            "eval" => Ok(Mode::Eval),
            "predict" => Ok(Mode::Predict),
            _ => Err(ModeError::Unsupported(value.to_string())),
        }
    }
}

impl TryFrom<&str> for Mode {
    type Error = ModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mode Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ModeError {
    /// The mode string is not one of train, eval or predict
    #[error("only train, eval and predict modes are supported: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!("train".parse(), Ok(Mode::Train));
        assert_eq!("EVAL".parse(), Ok(Mode::Eval));
        assert_eq!(Mode::try_from("predict"), Ok(Mode::Predict));
    }

    #[test]
    fn rejects_unknown_modes() {
        let err = "export".parse::<Mode>().unwrap_err();

        assert_eq!(err, ModeError::Unsupported("export".to_string()));
        assert!(err.to_string().contains("export"));

        assert_eq!(
            "infer".parse::<Mode>(),
            Err(ModeError::Unsupported("infer".to_string()))
        );
    }

    #[test]
    fn only_train_is_training() {
        assert!(Mode::Train.is_training());
        assert!(!Mode::Eval.is_training());
        assert!(!Mode::Predict.is_training());
    }

    #[test]
    fn displays_as_its_token() {
        for mode in [Mode::Train, Mode::Eval, Mode::Predict] {
            assert_eq!(mode.to_string().parse(), Ok(mode));
        }
    }
}
