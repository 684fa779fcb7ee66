use std::io::Cursor;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::FoodiSettings;
use crate::models::NutrientFacts;
use crate::service::caching::collections::nutrients;
use crate::service::caching::RedisCache;

pub mod classes;

pub use classes::{label_for_scores, query_for_label, FOOD_CLASSES};

/// Side length the classifier expects.
pub const MODEL_INPUT_SIZE: u32 = 224;

#[derive(Debug, thiserror::Error)]
pub enum FoodScanError {
    #[error("Invalid image data provided: {0}")]
    InvalidImage(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("Classifier error: {0}")]
    Classifier(String),
    #[error("Nutrient lookup error: {0}")]
    Nutrients(String),
    #[error("No nutrient information for {0}")]
    NoNutrients(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifierResponse {
    Label { label: String },
    Predictions { predictions: Vec<Vec<f64>> },
}

impl ClassifierResponse {
    fn into_label(self) -> Option<String> {
        match self {
            ClassifierResponse::Label { label } => {
                let label = label.trim().to_string();
                (!label.is_empty()).then_some(label)
            }
            ClassifierResponse::Predictions { predictions } => predictions
                .first()
                .and_then(|scores| label_for_scores(scores))
                .map(str::to_string),
        }
    }
}

/// Image in, nutrient facts out.
pub struct FoodScanner {
    http: reqwest::Client,
    settings: FoodiSettings,
    cache: Option<RedisCache>,
}

impl FoodScanner {
    pub fn new(settings: FoodiSettings, cache: Option<RedisCache>) -> Result<Self, FoodScanError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| FoodScanError::Classifier(format!("failed to build client: {e}")))?;
        Ok(Self {
            http,
            settings,
            cache,
        })
    }

    /// Classify a base64 image (bare or `data:` URL) and look up its nutrients.
    pub async fn scan(&self, image_b64: &str) -> Result<NutrientFacts, FoodScanError> {
        let bytes = decode_base64_image(image_b64)?;
        let jpeg = tokio::task::spawn_blocking(move || prepare_jpeg(&bytes))
            .await
            .map_err(|e| FoodScanError::InvalidImage(format!("image task failed: {e}")))??;

        let label = self.classify(jpeg).await?;
        info!("Food classifier predicted {}", label);
        self.nutrients_for(&label).await
    }

    async fn classify(&self, jpeg: Vec<u8>) -> Result<String, FoodScanError> {
        let url = self
            .settings
            .classifier_url
            .as_deref()
            .ok_or(FoodScanError::NotConfigured("FOODI_CLASSIFIER_URL"))?;

        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(jpeg)
            .send()
            .await
            .map_err(|e| {
                warn!("Classifier request failed: {}", e);
                FoodScanError::Classifier(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Classifier returned error status {}", status);
            return Err(FoodScanError::Classifier(format!("status {status}")));
        }

        let parsed: ClassifierResponse = resp
            .json()
            .await
            .map_err(|e| FoodScanError::Classifier(format!("unexpected response: {e}")))?;
        parsed
            .into_label()
            .ok_or_else(|| FoodScanError::Classifier("no prediction in response".into()))
    }

    /// Nutrient facts for a classifier label, served from redis when cached.
    pub async fn nutrients_for(&self, label: &str) -> Result<NutrientFacts, FoodScanError> {
        if let Some(cache) = &self.cache {
            match nutrients::load(cache, label).await {
                Ok(Some(facts)) => return Ok(facts),
                Ok(None) => {}
                Err(err) => warn!("Nutrient cache read failed for {}: {}", label, err),
            }
        }

        let data = self.lookup_nutrients(label).await?;
        let facts = facts_from_lookup(&data).ok_or_else(|| FoodScanError::NoNutrients(label.to_string()))?;

        if let Some(cache) = &self.cache {
            if let Err(err) = nutrients::store(cache, label, &facts).await {
                warn!("Nutrient cache write failed for {}: {}", label, err);
            }
        }
        Ok(facts)
    }

    async fn lookup_nutrients(&self, label: &str) -> Result<Value, FoodScanError> {
        let app_id = self
            .settings
            .app_id
            .as_deref()
            .ok_or(FoodScanError::NotConfigured("FOODI_APP_ID"))?;
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(FoodScanError::NotConfigured("FOODI_API_KEY"))?;

        info!("Looking up nutrients for {}", label);
        let resp = self
            .http
            .post(&self.settings.nutrients_url)
            .header("x-app-id", app_id)
            .header("x-app-key", api_key)
            .json(&json!({ "query": query_for_label(label) }))
            .send()
            .await
            .map_err(|e| {
                warn!("Nutrient lookup failed for {}: {}", label, e);
                FoodScanError::Nutrients(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Nutrient API returned error status {} for {}", status, label);
            return Err(FoodScanError::Nutrients(format!("status {status}")));
        }

        resp.json()
            .await
            .map_err(|e| FoodScanError::Nutrients(format!("unexpected response: {e}")))
    }
}

/// Accepts bare base64 or a `data:image/...;base64,` URL.
pub fn decode_base64_image(raw: &str) -> Result<Vec<u8>, FoodScanError> {
    let trimmed = raw.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| FoodScanError::InvalidImage("malformed data url".into()))?,
        None => trimmed,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(FoodScanError::InvalidImage("empty image".into()));
    }

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| FoodScanError::InvalidImage(e.to_string()))
}

/// Decode, resize to the model input size and re-encode as JPEG.
pub fn prepare_jpeg(bytes: &[u8]) -> Result<Vec<u8>, FoodScanError> {
    let img = image::load_from_memory(bytes).map_err(|e| FoodScanError::InvalidImage(e.to_string()))?;
    let resized = img.resize_exact(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::Triangle);
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| FoodScanError::InvalidImage(e.to_string()))?;
    Ok(out.into_inner())
}

/// Pull the first food's facts out of a nutrient lookup response.
pub fn facts_from_lookup(data: &Value) -> Option<NutrientFacts> {
    let food = data.get("foods")?.as_array()?.first()?;
    let text = |key: &str| food.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let number = |key: &str| food.get(key).and_then(|v| v.as_f64());

    Some(NutrientFacts {
        food_name: text("food_name"),
        serving_qty: number("serving_qty"),
        serving_unit: text("serving_unit"),
        calories: number("nf_calories"),
        total_fat: number("nf_total_fat"),
        cholesterol: number("nf_cholesterol"),
        protein: number("nf_protein"),
        sodium: number("nf_sodium"),
        total_carbohydrate: number("nf_total_carbohydrate"),
        sugars: number("nf_sugars"),
    })
}
