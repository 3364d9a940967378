//! Encode one image and print its latent code.
//!
//! ```text
//! cargo run -p iriscode --example basic_encode -- eye.jpg [crop_size]
//! ```

use std::path::PathBuf;

use iriscode::{FeatureSchema, IrisEncoder, PipelineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let image: PathBuf = args
        .next()
        .ok_or("usage: basic_encode <image> [crop_size]")?
        .into();
    let config = match args.next() {
        Some(size) => PipelineConfig::with_crop_size(size.parse()?),
        None => PipelineConfig::default(),
    };

    let encoder = IrisEncoder::with_config(config)?;
    let analysis = encoder.encode_path(&image)?;

    println!("{}", analysis.code());
    println!("confidence: {:.3}", analysis.confidence());
    for (key, value) in analysis.features().iter() {
        println!("  {key:>5} = {value:.6}");
    }
    println!(
        "legacy: {}",
        serde_json::to_string(&analysis.features_json(FeatureSchema::Legacy))?
    );
    Ok(())
}
