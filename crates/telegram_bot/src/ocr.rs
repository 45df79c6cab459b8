//! Client for an HTTP OCR service.
//!
//! The service takes `{"image": <base64>, "languages": "eng+ind"}` and answers
//! `{"text": "..."}`.

use base64::Engine;
use engine::{BoxFuture, OcrError, TextRecognizer};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use crate::BotError;

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    image: String,
    languages: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone, Debug)]
pub struct HttpRecognizer {
    client: Client,
    url: String,
}

impl HttpRecognizer {
    pub fn new(url: &str, api_key: Option<&str>) -> Result<Self, BotError> {
        let mut headers = header::HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let mut auth = header::HeaderValue::try_from(format!("Bearer {key}"))
                .map_err(|err| BotError::Config(format!("invalid ocr api key: {err}")))?;
            auth.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth);
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

fn request_body<'a>(image: &[u8], languages: &'a str) -> RecognizeRequest<'a> {
    RecognizeRequest {
        image: base64::prelude::BASE64_STANDARD.encode(image),
        languages,
    }
}

impl TextRecognizer for HttpRecognizer {
    fn recognize<'a>(
        &'a self,
        image: &'a [u8],
        languages: &'a str,
    ) -> BoxFuture<'a, Result<String, OcrError>> {
        Box::pin(async move {
            if image.is_empty() {
                return Err(OcrError::EmptyImage);
            }

            let resp = self
                .client
                .post(&self.url)
                .json(&request_body(image, languages))
                .send()
                .await
                .map_err(|err| OcrError::Request(format!("network error: {err}")))?;

            let status = resp.status();
            if !status.is_success() {
                let message = match resp.json::<ErrorBody>().await {
                    Ok(body) => body.error,
                    Err(_) => "ocr service error".to_string(),
                };
                return Err(OcrError::Request(format!("{status}: {message}")));
            }

            let body = resp
                .json::<RecognizeResponse>()
                .await
                .map_err(|err| OcrError::Request(format!("invalid response: {err}")))?;
            Ok(body.text)
        })
    }
}
