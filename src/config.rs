use crate::{common::*, params};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub content_image: PathBuf,
    pub style_image: PathBuf,
    pub weights_file: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(
        serialize_with = "serialize_device",
        deserialize_with = "deserialize_device",
        default = "default_device"
    )]
    pub device: Device,
    #[serde(default)]
    pub optimization: OptimizationConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config: Self = json5::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let OptimizationConfig {
            learning_rate,
            num_steps,
            progress_steps,
            content_weight: _,
            style_weight: _,
            max_image_size,
            ref style_layer_weights,
        } = self.optimization;

        ensure!(learning_rate > 0.0, "learning_rate must be positive");
        ensure!(num_steps > 0, "num_steps must be positive");
        ensure!(progress_steps > 0, "progress_steps must be positive");
        ensure!(max_image_size >= 2, "max_image_size must be at least 2");
        ensure!(
            !style_layer_weights.is_empty(),
            "at least one style layer is required"
        );
        for (name, weight) in style_layer_weights {
            ensure!(
                name != params::CONTENT_LAYER,
                "layer {} is reserved for the content loss",
                name
            );
            ensure!(*weight > 0.0, "style layer {} has nonpositive weight", name);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_num_steps")]
    pub num_steps: i64,
    #[serde(default = "default_progress_steps")]
    pub progress_steps: i64,
    #[serde(default = "default_content_weight")]
    pub content_weight: f64,
    #[serde(default = "default_style_weight")]
    pub style_weight: f64,
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u32,
    #[serde(default = "default_style_layer_weights")]
    pub style_layer_weights: Vec<(String, f64)>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            num_steps: default_num_steps(),
            progress_steps: default_progress_steps(),
            content_weight: default_content_weight(),
            style_weight: default_style_weight(),
            max_image_size: default_max_image_size(),
            style_layer_weights: default_style_layer_weights(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_device() -> Device {
    Device::cuda_if_available()
}

fn default_learning_rate() -> f64 {
    params::ADAM_LR
}

fn default_num_steps() -> i64 {
    params::NUM_STEPS
}

fn default_progress_steps() -> i64 {
    params::PROGRESS_STEPS
}

fn default_content_weight() -> f64 {
    params::CONTENT_WEIGHT
}

fn default_style_weight() -> f64 {
    params::STYLE_WEIGHT
}

fn default_max_image_size() -> u32 {
    params::MAX_IMAGE_SIZE
}

fn default_style_layer_weights() -> Vec<(String, f64)> {
    params::STYLE_LAYER_WEIGHTS
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}

fn serialize_device<S>(device: &Device, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let text = match device {
        Device::Cpu => "cpu".into(),
        Device::Cuda(n) => format!("cuda({})", n),
    };
    text.serialize(serializer)
}

fn deserialize_device<'de, D>(deserializer: D) -> Result<Device, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    let device = match name.as_str() {
        "cpu" => Device::Cpu,
        _ => {
            let prefix = "cuda(";
            let suffix = ")";
            if name.starts_with(prefix) && name.ends_with(suffix) {
                let number: usize = name[(prefix.len())..(name.len() - suffix.len())]
                    .parse()
                    .map_err(|_err| D::Error::custom(format!("invalid device name {}", name)))?;
                Device::Cuda(number)
            } else {
                return Err(D::Error::custom(format!("invalid device name {}", name)));
            }
        }
    };
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_optimization() {
        let config: OptimizationConfig = json5::from_str("{}").unwrap();
        assert_eq!(config.learning_rate, params::ADAM_LR);
        assert_eq!(config.num_steps, params::NUM_STEPS);
        assert_eq!(config.progress_steps, params::PROGRESS_STEPS);
        assert_eq!(config.max_image_size, params::MAX_IMAGE_SIZE);
        assert_eq!(
            config.style_layer_weights.len(),
            params::STYLE_LAYER_WEIGHTS.len()
        );
    }

    #[test]
    fn parse_full_config() {
        let text = r#"{
            content_image: "images/content.jpg",
            style_image: "images/style.jpg",
            weights_file: "vgg19.ot",
            device: "cpu",
            optimization: {
                num_steps: 100,
                progress_steps: 20,
            },
        }"#;
        let config: Config = json5::from_str(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.optimization.num_steps, 100);
        assert_eq!(config.optimization.learning_rate, params::ADAM_LR);
    }

    #[test]
    fn reject_content_layer_in_style_set() {
        let config = Config {
            content_image: PathBuf::from("c.jpg"),
            style_image: PathBuf::from("s.jpg"),
            weights_file: PathBuf::from("vgg19.ot"),
            output_dir: default_output_dir(),
            device: Device::Cpu,
            optimization: OptimizationConfig {
                style_layer_weights: vec![(params::CONTENT_LAYER.to_string(), 1.0)],
                ..Default::default()
            },
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_zero_steps() {
        let config = Config {
            content_image: PathBuf::from("c.jpg"),
            style_image: PathBuf::from("s.jpg"),
            weights_file: PathBuf::from("vgg19.ot"),
            output_dir: default_output_dir(),
            device: Device::Cpu,
            optimization: OptimizationConfig {
                num_steps: 0,
                ..Default::default()
            },
        };
        assert!(config.validate().is_err());
    }
}
