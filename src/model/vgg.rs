use crate::common::*;
use itertools::izip;

// torchvision indices of the conv layers in each `features` block, so a
// converted vgg19 weight file loads without renaming
const BLOCK_CONV_INDEXES: [&[i64]; 5] = [
    &[0, 2],
    &[5, 7],
    &[10, 12, 14, 16],
    &[19, 21, 23, 25],
    &[28, 30, 32, 34],
];
const BLOCK_CHANNELS: [i64; 5] = [64, 128, 256, 512, 512];

/// Resolves a `convN_M` layer name to its torchvision `features` index.
pub fn layer_index(name: &str) -> Result<i64> {
    let invalid = || anyhow!("unknown layer name {}", name);

    let rest = name.strip_prefix("conv").ok_or_else(invalid)?;
    let (block, conv) = rest.split_once('_').ok_or_else(invalid)?;
    let block: usize = block.parse().map_err(|_err| invalid())?;
    let conv: usize = conv.parse().map_err(|_err| invalid())?;

    let index = block
        .checked_sub(1)
        .and_then(|block| BLOCK_CONV_INDEXES.get(block))
        .and_then(|indexes| conv.checked_sub(1).and_then(|conv| indexes.get(conv)))
        .ok_or_else(invalid)?;
    Ok(*index)
}

pub fn capture_layers<'a, I>(names: I) -> Result<HashMap<i64, String>>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|name| Ok((layer_index(name)?, name.to_string())))
        .collect()
}

/// Builds the VGG-19 `features` stack and returns a forward closure that
/// captures the conv outputs named in `capture`, stopping at the deepest
/// captured layer. The caller owns the `VarStore`, loads the pretrained
/// weights into it and freezes it, so no gradient reaches the network
/// parameters.
pub fn vgg19_features<'p, P>(
    path: P,
    capture: HashMap<i64, String>,
) -> Box<dyn Fn(&Tensor) -> HashMap<String, Tensor> + Send>
where
    P: Borrow<nn::Path<'p>>,
{
    let path = path.borrow();
    let features = path / "features";

    let conv_config = nn::ConvConfig {
        padding: 1,
        ..Default::default()
    };

    let blocks: Vec<Vec<(i64, nn::Conv2D)>> = {
        let mut in_channels = 3;
        izip!(&BLOCK_CONV_INDEXES, &BLOCK_CHANNELS)
            .map(|(indexes, &out_channels)| {
                indexes
                    .iter()
                    .map(|&index| {
                        let conv = nn::conv2d(
                            &features / index.to_string(),
                            in_channels,
                            out_channels,
                            3,
                            conv_config,
                        );
                        in_channels = out_channels;
                        (index, conv)
                    })
                    .collect()
            })
            .collect()
    };

    let last_index = capture.keys().copied().max();

    Box::new(move |image| {
        let mut captured = HashMap::new();
        let mut net = image.shallow_clone();

        'blocks: for block in &blocks {
            for (index, conv) in block {
                net = net.apply(conv);
                if let Some(name) = capture.get(index) {
                    captured.insert(name.clone(), net.shallow_clone());
                }
                if Some(*index) == last_index {
                    break 'blocks;
                }
                net = net.relu();
            }
            net = net.max_pool2d_default(2);
        }

        captured
    })
}
