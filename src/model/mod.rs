mod vgg;

pub use vgg::{capture_layers, layer_index, vgg19_features};
