use crate::common::*;

#[derive(Debug)]
pub struct TransferLoss {
    pub content: Tensor,
    pub style: Tensor,
    pub total: Tensor,
}

/// Channel correlation matrix of one activation tensor: the `[d, h*w]`
/// flattening multiplied with its own transpose, giving a symmetric
/// `[d, d]` style signature independent of spatial arrangement.
pub fn gram_matrix(features: &Tensor) -> Tensor {
    let (channels, spatial) = match features.size().as_slice() {
        &[batch, channels, height, width] => {
            debug_assert_eq!(batch, 1);
            (channels, height * width)
        }
        &[channels, height, width] => (channels, height * width),
        _ => unreachable!(),
    };

    let flat = features.view([channels, spatial]);
    flat.matmul(&flat.transpose(0, 1))
}

pub fn content_loss(target_feature: &Tensor, content_feature: &Tensor) -> Tensor {
    target_feature.mse_loss(content_feature, Reduction::Mean)
}

/// Weighted sum over the configured layers of the squared Gram distance to
/// the cached style Grams, each term normalized by the layer's
/// `channels * height * width`.
pub fn style_loss(
    target_features: &HashMap<String, Tensor>,
    style_grams: &HashMap<String, Tensor>,
    layer_weights: &[(String, f64)],
) -> Result<Tensor> {
    let mut loss_sum = None;

    for (name, weight) in layer_weights {
        let target_feature = target_features
            .get(name)
            .ok_or_else(|| anyhow!("layer {} was not captured", name))?;
        let style_gram = style_grams
            .get(name)
            .ok_or_else(|| anyhow!("no style gram for layer {}", name))?;

        let (_batch, channels, height, width) = target_feature.size4()?;
        let target_gram = gram_matrix(target_feature);
        let layer_loss = *weight * target_gram.mse_loss(style_gram, Reduction::Mean)
            / (channels * height * width) as f64;

        loss_sum = match loss_sum {
            Some(sum) => Some(sum + layer_loss),
            None => Some(layer_loss),
        };
    }

    loss_sum.ok_or_else(|| anyhow!("no style layers configured"))
}

pub fn compose(content: Tensor, style: Tensor, content_weight: f64, style_weight: f64) -> TransferLoss {
    let total = content_weight * &content + style_weight * &style;
    TransferLoss {
        content,
        style,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gram_matrix_is_symmetric() {
        let features = Tensor::rand(&[1, 4, 6, 5], (Kind::Float, Device::Cpu));
        let gram = gram_matrix(&features);
        assert!(gram.allclose(&gram.transpose(0, 1), 1e-5, 1e-7, false));
    }

    #[test]
    fn gram_matrix_is_square_in_channels() {
        let features = Tensor::rand(&[1, 4, 6, 5], (Kind::Float, Device::Cpu));
        assert_eq!(gram_matrix(&features).size(), vec![4, 4]);

        let unbatched = Tensor::rand(&[7, 3, 2], (Kind::Float, Device::Cpu));
        assert_eq!(gram_matrix(&unbatched).size(), vec![7, 7]);
    }

    #[test]
    fn gram_matrix_of_ones_counts_positions() {
        let features = Tensor::ones(&[1, 2, 3, 3], (Kind::Float, Device::Cpu));
        let expected = Tensor::ones(&[2, 2], (Kind::Float, Device::Cpu)) * 9.0;
        assert!(gram_matrix(&features).allclose(&expected, 1e-5, 1e-7, false));
    }

    #[test]
    fn content_loss_is_nonnegative_and_zero_on_identity() {
        let feature = Tensor::rand(&[1, 8, 4, 4], (Kind::Float, Device::Cpu));
        let other = Tensor::rand(&[1, 8, 4, 4], (Kind::Float, Device::Cpu));

        assert_eq!(content_loss(&feature, &feature).double_value(&[]), 0.0);
        assert!(content_loss(&feature, &other).double_value(&[]) >= 0.0);
    }

    #[test]
    fn style_loss_is_zero_against_own_grams() {
        let feature = Tensor::rand(&[1, 4, 8, 8], (Kind::Float, Device::Cpu));
        let features = hashmap! { "conv1_1".to_string() => feature.shallow_clone() };
        let grams = hashmap! { "conv1_1".to_string() => gram_matrix(&feature) };
        let weights = vec![("conv1_1".to_string(), 1.0)];

        let loss = style_loss(&features, &grams, &weights).unwrap();
        assert!(loss.double_value(&[]).abs() < 1e-6);
    }

    #[test]
    fn style_loss_is_nonnegative_per_layer() {
        let target = Tensor::rand(&[1, 4, 8, 8], (Kind::Float, Device::Cpu));
        let style = Tensor::rand(&[1, 4, 8, 8], (Kind::Float, Device::Cpu));
        let features = hashmap! { "conv1_1".to_string() => target };
        let grams = hashmap! { "conv1_1".to_string() => gram_matrix(&style) };
        let weights = vec![("conv1_1".to_string(), 0.75)];

        let loss = style_loss(&features, &grams, &weights).unwrap();
        assert!(loss.double_value(&[]) >= 0.0);
    }

    #[test]
    fn style_loss_requires_captured_layers() {
        let features = HashMap::new();
        let grams = HashMap::new();
        let weights = vec![("conv1_1".to_string(), 1.0)];
        assert!(style_loss(&features, &grams, &weights).is_err());

        let no_weights: Vec<(String, f64)> = vec![];
        assert!(style_loss(&features, &grams, &no_weights).is_err());
    }

    #[test]
    fn compose_weights_both_terms() {
        let content = Tensor::from(2.0);
        let style = Tensor::from(3.0);
        let loss = compose(content, style, 1.0, 1e6);
        assert!((loss.total.double_value(&[]) - (2.0 + 3e6)).abs() < 1e-3);
    }
}
