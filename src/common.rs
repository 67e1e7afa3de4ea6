pub use anyhow::{anyhow, bail, ensure, Context as _, Result};
pub use argh::FromArgs;
pub use image::{
    imageops::FilterType, io::Reader as ImageReader, DynamicImage, GenericImageView, ImageBuffer,
    Rgb, RgbImage,
};
pub use itertools::Itertools;
pub use log::{debug, error, info, warn};
pub use maplit::hashmap;
pub use serde::{de::Error as DeserializeError, Deserialize, Deserializer, Serialize, Serializer};
pub use std::{
    borrow::Borrow,
    collections::HashMap,
    fs, iter,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};
pub use tch::{
    nn::{self, Adam, OptimizerConfig, VarStore},
    Device, Kind, Reduction, Tensor,
};
