//! Per-layer gradient magnitude statistics for spotting vanishing or
//! exploding gradients.

use ndarray::{ArrayD, ArrayViewD};

/// Vertical window of the chart, zoomed on typical gradient magnitudes.
pub const Y_WINDOW: (f32, f32) = (-0.001, 0.02);

/// A trainable tensor whose gradient can be inspected.
pub trait GradientParameter {
    fn shape(&self) -> Vec<usize>;

    fn requires_grad(&self) -> bool;

    /// Accumulated gradient, if backward has populated one.
    fn grad(&self) -> Option<ArrayViewD<'_, f32>>;
}

/// Owned copy of a parameter's shape and gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub shape: Vec<usize>,
    pub requires_grad: bool,
    pub grad: Option<ArrayD<f32>>,
}

impl ParameterSnapshot {
    /// Trainable parameter with a populated gradient.
    pub fn with_grad(grad: ArrayD<f32>) -> Self {
        Self {
            shape: grad.shape().to_vec(),
            requires_grad: true,
            grad: Some(grad),
        }
    }

    /// Trainable parameter that backward has not reached.
    pub fn without_grad(shape: Vec<usize>) -> Self {
        Self {
            shape,
            requires_grad: true,
            grad: None,
        }
    }

    /// Parameter excluded from training.
    pub fn frozen(shape: Vec<usize>) -> Self {
        Self {
            shape,
            requires_grad: false,
            grad: None,
        }
    }
}

impl GradientParameter for ParameterSnapshot {
    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    fn grad(&self) -> Option<ArrayViewD<'_, f32>> {
        self.grad.as_ref().map(|g| g.view())
    }
}

/// Mean and max absolute gradient of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradient {
    pub name: String,
    pub mean: f32,
    pub max: f32,
}

/// Bar chart of gradient flow: one bar pair (max behind mean) per layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientFlowChart {
    pub layers: Vec<LayerGradient>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_window: (f32, f32),
}

impl GradientFlowChart {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.name.as_str())
    }

    pub fn layer(&self, name: &str) -> Option<&LayerGradient> {
        self.layers.iter().find(|l| l.name == name)
    }
}

/// Reduce every trainable, non-bias parameter to its mean and max absolute
/// gradient.
///
/// Parameters without a gradient (or with an empty one) are logged with their
/// shape and skipped. Nothing is mutated.
pub fn gradient_flow<'a, S, P, I>(named_parameters: I) -> GradientFlowChart
where
    S: AsRef<str>,
    P: GradientParameter + 'a,
    I: IntoIterator<Item = (S, &'a P)>,
{
    let mut layers = Vec::new();

    for (name, param) in named_parameters {
        let name = name.as_ref();
        if !param.requires_grad() || name.contains("bias") {
            continue;
        }

        match param.grad().filter(|g| !g.is_empty()) {
            Some(grad) => {
                let (mean, max) = abs_mean_max(&grad);
                layers.push(LayerGradient {
                    name: name.to_string(),
                    mean,
                    max,
                });
            }
            None => {
                tracing::warn!(
                    parameter = name,
                    shape = ?param.shape(),
                    "parameter has no gradient, skipping"
                );
            }
        }
    }

    GradientFlowChart {
        layers,
        title: "Gradient flow".to_string(),
        x_label: "Layers".to_string(),
        y_label: "average gradient".to_string(),
        y_window: Y_WINDOW,
    }
}

fn abs_mean_max(grad: &ArrayViewD<'_, f32>) -> (f32, f32) {
    let (sum, max) = grad
        .iter()
        .fold((0.0f64, 0.0f32), |(sum, max), &g| (sum + g.abs() as f64, max.max(g.abs())));
    ((sum / grad.len() as f64) as f32, max)
}
