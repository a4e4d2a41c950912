use murmur_train::{ChartRenderer, GradientParameter, SvgRenderer, gradient_flow};
use ndarray::{ArrayViewD, IxDyn};

/// A parameter that borrows its gradient from a flat buffer, the way a
/// framework tensor would expose host memory.
struct BorrowedParam {
    shape: Vec<usize>,
    grad: Option<Vec<f32>>,
}

impl GradientParameter for BorrowedParam {
    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn requires_grad(&self) -> bool {
        true
    }

    fn grad(&self) -> Option<ArrayViewD<'_, f32>> {
        self.grad
            .as_ref()
            .and_then(|g| ArrayViewD::from_shape(IxDyn(&self.shape), g).ok())
    }
}

#[test]
fn test_weight_and_bias_chart() {
    let weight = BorrowedParam {
        shape: vec![3],
        grad: Some(vec![1.0, -2.0, 3.0]),
    };
    let bias = BorrowedParam {
        shape: vec![1],
        grad: Some(vec![5.0]),
    };
    let params = vec![("layer1.weight", &weight), ("layer1.bias", &bias)];

    let chart = gradient_flow(params);
    assert_eq!(chart.layers.len(), 1);
    assert_eq!(chart.layers[0].name, "layer1.weight");
    assert_eq!(chart.layers[0].mean, 2.0);
    assert_eq!(chart.layers[0].max, 3.0);

    let svg = SvgRenderer::default().render(&chart);
    assert!(svg.contains("layer1.weight"));
    assert!(!svg.contains("layer1.bias"));
}

#[test]
fn test_order_preserved_and_missing_skipped() {
    let params: Vec<(String, BorrowedParam)> = (0..4)
        .map(|i| {
            let grad = (i != 2).then(|| vec![0.001 * (i + 1) as f32; 6]);
            (
                format!("blocks.{i}.attn.weight"),
                BorrowedParam {
                    shape: vec![2, 3],
                    grad,
                },
            )
        })
        .collect();

    let chart = gradient_flow(params.iter().map(|(n, p)| (n.as_str(), p)));
    assert_eq!(
        chart.names().collect::<Vec<_>>(),
        vec!["blocks.0.attn.weight", "blocks.1.attn.weight", "blocks.3.attn.weight"]
    );
    assert!((chart.layers[2].mean - 0.004).abs() < 1e-7);
}
