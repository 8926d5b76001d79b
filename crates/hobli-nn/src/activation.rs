//! Element-wise activation functions.

/// Activation applied to a dense layer's pre-activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Activation {
    /// Rectified linear unit, `max(0, z)`.
    Relu,
    /// Identity.
    Linear,
}

impl Activation {
    /// Apply the activation to a single pre-activation.
    #[inline]
    #[must_use]
    pub fn apply(self, z: f64) -> f64 {
        match self {
            Self::Relu => z.max(0.0),
            Self::Linear => z,
        }
    }

    /// Derivative with respect to the pre-activation.
    ///
    /// The ReLU subgradient at zero is taken as 0.
    #[inline]
    #[must_use]
    pub fn derivative(self, z: f64) -> f64 {
        match self {
            Self::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Linear => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_clips_negative() {
        assert_eq!(Activation::Relu.apply(-3.0), 0.0);
        assert_eq!(Activation::Relu.apply(2.5), 2.5);
        assert_eq!(Activation::Relu.derivative(-1.0), 0.0);
        assert_eq!(Activation::Relu.derivative(0.0), 0.0);
        assert_eq!(Activation::Relu.derivative(0.1), 1.0);
    }

    #[test]
    fn linear_is_identity() {
        assert_eq!(Activation::Linear.apply(-7.0), -7.0);
        assert_eq!(Activation::Linear.derivative(123.0), 1.0);
    }
}
