//! Training diagnostics.
//!
//! [`gradient_flow`] reduces named parameters to per-layer gradient
//! magnitudes; a [`ChartRenderer`] such as [`SvgRenderer`] turns the result
//! into a figure. Call it after the backward pass:
//!
//! ```
//! use murmur_train::{ChartRenderer, ParameterSnapshot, SvgRenderer, gradient_flow};
//! use ndarray::{ArrayD, IxDyn};
//!
//! let weight = ParameterSnapshot::with_grad(ArrayD::from_elem(IxDyn(&[4, 4]), 0.01));
//! let chart = gradient_flow([("encoder.weight", &weight)]);
//! let svg = SvgRenderer::default().render(&chart);
//! assert!(svg.contains("encoder.weight"));
//! ```

pub mod grad_flow;
pub mod render;

pub use grad_flow::{
    GradientFlowChart, GradientParameter, LayerGradient, ParameterSnapshot, Y_WINDOW, gradient_flow,
};
pub use render::{ChartRenderer, SvgRenderer};
