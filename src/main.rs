use nstrs::{common::*, config::Config, transfer::TransferInit, vision};

lazy_static::lazy_static! {
    static ref SHUTDOWN_FLAG: AtomicBool = AtomicBool::new(false);
}

/// Neural style transfer over a frozen VGG-19 feature extractor.
#[derive(FromArgs)]
struct Args {
    /// the config file.
    #[argh(option, default = "PathBuf::from(\"config.json5\")")]
    config: PathBuf,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    // Set signal handler
    ctrlc::set_handler(|| {
        warn!("Interrupted by user");
        SHUTDOWN_FLAG.store(true, Ordering::SeqCst);
    })?;

    // Parse arguments
    let args: Args = argh::from_env();

    // load config
    let config = Config::open(&args.config)?;
    fs::create_dir_all(&config.output_dir)?;

    let device = config.device;
    info!("running on {:?}", device);

    let output_dir = config.output_dir.clone();
    let output = TransferInit::from_config(&config).run(device, &SHUTDOWN_FLAG, &output_dir)?;

    let image_path = output_dir.join("stylized.png");
    vision::save_image(&output.image, &image_path)?;
    info!("stylized image written to {}", image_path.display());

    if output.trace.is_empty() {
        warn!("no optimization steps completed, skipping loss curves");
    } else {
        let curves_path = output_dir.join("losses.png");
        output.trace.render(&curves_path)?;
        info!("loss curves written to {}", curves_path.display());
    }

    Ok(())
}
