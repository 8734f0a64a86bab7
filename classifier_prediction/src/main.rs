use classifier_prediction::{config, start_app, telemetry};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::get_configuration()?;
    telemetry::init_subscriber(&config.log_level);

    let image_paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if image_paths.is_empty() {
        tracing::warn!("No image paths given, nothing to classify");
    }

    start_app(config, image_paths).await
}
