use crate::{common::*, params};
use image::imageops;

/// Decodes an image and scales it so the longer side does not exceed
/// `max_size`, preserving aspect ratio. Returns a normalized `[1, 3, H, W]`
/// float tensor.
pub fn load_image<P>(path: P, max_size: u32) -> Result<Tensor>
where
    P: AsRef<Path>,
{
    let image = open_image(path.as_ref())?;
    let (width, height) = image.dimensions();
    let image = if width.max(height) > max_size {
        image.resize(max_size, max_size, FilterType::CatmullRom)
    } else {
        image
    };
    Ok(to_tensor(&image.to_rgb8()))
}

/// Like [`load_image`], but resized exactly to the given spatial shape.
pub fn load_image_sized<P>(path: P, height: i64, width: i64) -> Result<Tensor>
where
    P: AsRef<Path>,
{
    let image = open_image(path.as_ref())?.resize_exact(
        width as u32,
        height as u32,
        FilterType::CatmullRom,
    );
    Ok(to_tensor(&image.to_rgb8()))
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    let image = ImageReader::open(path)
        .with_context(|| format!("unable to open image {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("unable to decode image {}", path.display()))?;
    Ok(image)
}

pub fn to_tensor(image: &RgbImage) -> Tensor {
    let (width, height) = image.dimensions();
    let pixels = Tensor::of_slice(image.as_raw())
        .view([height as i64, width as i64, 3])
        .permute(&[2, 0, 1])
        .to_kind(Kind::Float)
        / 255.0;
    normalize(&pixels).unsqueeze(0)
}

/// Inverse of [`to_tensor`]: batch dimension dropped, channels de-normalized
/// and clipped to `[0, 1]`, layout restored to height-width-channel.
pub fn to_rgb_image(tensor: &Tensor) -> Result<RgbImage> {
    let (batch, channels, height, width) = tensor.size4()?;
    ensure!(
        batch == 1 && channels == 3,
        "expected a [1, 3, H, W] image tensor, got {:?}",
        tensor.size()
    );

    let pixels = denormalize(&tensor.detach().to_device(Device::Cpu).select(0, 0))
        .clamp(0.0, 1.0)
        * 255.0;
    let pixels = pixels.permute(&[1, 2, 0]).to_kind(Kind::Uint8).contiguous();

    let numel = pixels.numel();
    let mut buf = vec![0_u8; numel];
    pixels.copy_data(&mut buf, numel);

    RgbImage::from_vec(width as u32, height as u32, buf)
        .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", width, height))
}

pub fn save_image<P>(tensor: &Tensor, path: P) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    to_rgb_image(tensor)?
        .save(path)
        .with_context(|| format!("unable to write image {}", path.display()))?;
    Ok(())
}

/// Writes the two input images next to each other in one canvas.
pub fn save_side_by_side<P>(left: &Tensor, right: &Tensor, path: P) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let left = to_rgb_image(left)?;
    let right = to_rgb_image(right)?;
    ensure!(
        left.height() == right.height(),
        "images of heights {} and {} cannot share a canvas",
        left.height(),
        right.height()
    );

    let mut canvas = RgbImage::new(left.width() + right.width(), left.height());
    imageops::replace(&mut canvas, &left, 0, 0);
    imageops::replace(&mut canvas, &right, left.width() as i64, 0);
    canvas
        .save(path)
        .with_context(|| format!("unable to write image {}", path.display()))?;
    Ok(())
}

pub fn normalize(pixels: &Tensor) -> Tensor {
    let (mean, std) = channel_stats(pixels.device());
    (pixels - mean) / std
}

pub fn denormalize(pixels: &Tensor) -> Tensor {
    let (mean, std) = channel_stats(pixels.device());
    pixels * std + mean
}

fn channel_stats(device: Device) -> (Tensor, Tensor) {
    let mean = Tensor::of_slice(&params::IMAGENET_MEAN)
        .view([3, 1, 1])
        .to_device(device);
    let std = Tensor::of_slice(&params::IMAGENET_STD)
        .view([3, 1, 1])
        .to_device(device);
    (mean, std)
}
