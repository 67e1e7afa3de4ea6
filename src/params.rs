// image preprocessing
pub const MAX_IMAGE_SIZE: u32 = 400; // bound on the longer side of the content image
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

// feature capture
pub const CONTENT_LAYER: &str = "conv4_2"; // excluded from the style layer set
pub const STYLE_LAYER_WEIGHTS: [(&str, f64); 5] = [
    ("conv1_1", 1.0),
    ("conv2_1", 0.75),
    ("conv3_1", 0.2),
    ("conv4_1", 0.2),
    ("conv5_1", 0.2),
];

// loss composition
pub const CONTENT_WEIGHT: f64 = 1.0;
pub const STYLE_WEIGHT: f64 = 1e6; // style term is tiny after per-layer normalization

// hyper-parameters: ADAM optimization
pub const ADAM_LR: f64 = 0.003;
pub const NUM_STEPS: i64 = 2000;
pub const PROGRESS_STEPS: i64 = 400; // log/snapshot interval
