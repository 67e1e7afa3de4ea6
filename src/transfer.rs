use crate::{
    common::*,
    config::{Config, OptimizationConfig},
    model, objective, params,
    trace::LossTrace,
    vision,
};

#[derive(Debug, Clone)]
pub struct TransferInit {
    pub content_image: PathBuf,
    pub style_image: PathBuf,
    pub weights_file: PathBuf,
    pub optimization: OptimizationConfig,
}

pub struct TransferOutput {
    pub image: Tensor,
    pub trace: LossTrace,
}

impl TransferInit {
    pub fn from_config(config: &Config) -> Self {
        Self {
            content_image: config.content_image.clone(),
            style_image: config.style_image.clone(),
            weights_file: config.weights_file.clone(),
            optimization: config.optimization.clone(),
        }
    }

    pub fn run(
        self,
        device: Device,
        shutdown_flag: &AtomicBool,
        output_dir: &Path,
    ) -> Result<TransferOutput> {
        let Self {
            content_image,
            style_image,
            weights_file,
            optimization:
                OptimizationConfig {
                    learning_rate,
                    num_steps,
                    progress_steps,
                    content_weight,
                    style_weight,
                    max_image_size,
                    style_layer_weights,
                },
        } = self;

        // frozen feature network
        let capture = model::capture_layers(
            style_layer_weights
                .iter()
                .map(|(name, _weight)| name.as_str())
                .chain(iter::once(params::CONTENT_LAYER)),
        )?;

        let mut net_vs = VarStore::new(device);
        let extract = model::vgg19_features(&net_vs.root(), capture);
        net_vs.load(&weights_file).with_context(|| {
            format!("unable to load network weights {}", weights_file.display())
        })?;
        net_vs.freeze();

        // The style image is resized to the content shape so the two feature
        // sets agree spatially at every captured layer.
        let content = vision::load_image(&content_image, max_image_size)?.to_device(device);
        let (_batch, _channels, height, width) = content.size4()?;
        let style = vision::load_image_sized(&style_image, height, width)?.to_device(device);
        debug!(
            "content {:?}, style {:?} on {:?}",
            content.size(),
            style.size(),
            device
        );

        vision::save_side_by_side(&content, &style, &output_dir.join("inputs.png"))?;

        // fixed targets: content activation and per-layer style grams
        let (content_feature, style_grams) = tch::no_grad(|| -> Result<_> {
            let mut content_features = extract(&content);
            let content_feature = content_features
                .remove(params::CONTENT_LAYER)
                .ok_or_else(|| anyhow!("layer {} was not captured", params::CONTENT_LAYER))?;

            let style_features = extract(&style);
            let style_grams = style_layer_weights
                .iter()
                .map(|(name, _weight)| {
                    let feature = style_features
                        .get(name)
                        .ok_or_else(|| anyhow!("style layer {} was not captured", name))?;
                    Ok((name.clone(), objective::gram_matrix(feature)))
                })
                .collect::<Result<HashMap<_, _>>>()?;

            Ok((content_feature, style_grams))
        })?;

        // The target image starts as a copy of the content image and is the
        // only variable the optimizer updates.
        let target_vs = VarStore::new(device);
        let target = target_vs.root().var_copy("target", &content);
        let mut opt = Adam::default().build(&target_vs, learning_rate)?;

        let mut trace = LossTrace::new();
        let start = Instant::now();

        for step in 1..=num_steps {
            if shutdown_flag.load(Ordering::SeqCst) {
                warn!("optimization interrupted at step {}", step);
                break;
            }

            let target_features = extract(&target);
            let content_term = objective::content_loss(
                target_features
                    .get(params::CONTENT_LAYER)
                    .ok_or_else(|| anyhow!("layer {} was not captured", params::CONTENT_LAYER))?,
                &content_feature,
            );
            let style_term =
                objective::style_loss(&target_features, &style_grams, &style_layer_weights)?;
            let loss = objective::compose(content_term, style_term, content_weight, style_weight);

            opt.backward_step(&loss.total);

            trace.push(
                loss.content.double_value(&[]),
                loss.style.double_value(&[]),
                loss.total.double_value(&[]),
            );

            if step % progress_steps == 0 {
                info!(
                    "step: {}\telapsed: {}s\tcontent_loss: {:.6}\tstyle_loss: {:.6e}\ttotal_loss: {:.3}",
                    step,
                    start.elapsed().as_secs(),
                    loss.content.double_value(&[]),
                    loss.style.double_value(&[]),
                    loss.total.double_value(&[]),
                );
                vision::save_image(&target, &output_dir.join(format!("step-{:0>6}.png", step)))?;
            }
        }

        Ok(TransferOutput {
            image: target.detach(),
            trace,
        })
    }
}
