use crate::{
    config::Config,
    model::Model,
    ort_model::OrtModel,
    prediction_service::PredictionService,
    preprocessing::{ImagePreprocessor, InputImage},
};
use std::{error::Error, path::PathBuf, sync::Arc};

pub async fn start_app(config: Config, image_paths: Vec<PathBuf>) -> Result<(), Box<dyn Error>> {
    let model: Model = match OrtModel::new(&config.model, &config.labels) {
        Ok(model) => Arc::new(model),
        Err(e) => {
            tracing::error!("Failed to load classification model: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let preprocessor = ImagePreprocessor::new(&config.preprocessing);
    let service = PredictionService::new(preprocessor, Some(model));

    let mut results = service.subscribe();
    let watcher = tokio::spawn(async move {
        while results.changed().await.is_ok() {
            match results.borrow_and_update().as_ref() {
                Some(candidate) => tracing::info!(
                    label = %candidate.label,
                    confidence = candidate.confidence,
                    "Classification updated"
                ),
                None => tracing::info!("Classification cleared"),
            }
        }
    });

    for path in image_paths {
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to read {:?}: {}", path, e);
                continue;
            }
        };

        let published = service.predict(InputImage::encoded(bytes)).await?;
        match published {
            Some(candidate) => println!(
                "{}\t{}\t{:.3}",
                path.display(),
                candidate.label,
                candidate.confidence
            ),
            None => println!("{}\t-", path.display()),
        }
    }

    drop(service);
    watcher.await?;

    Ok(())
}
