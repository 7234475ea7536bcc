//! Registration of scraped collections with the ingestion API.
use crate::error::CollectionError;
use crate::model::CollectionInfo;
use crate::thumbnail::Thumbnail;
use harvest_http::{Auth, HttpClient, HttpError, RawResponse, RequestOpts};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

/// Multipart part carrying the image bytes.
pub const THUMBNAIL_PART: &str = "thumbnailImage";
/// Multipart part carrying the serialized [`CollectionInfo`].
pub const JSON_PART: &str = "json";

#[derive(Clone)]
pub struct CollectionSubmitter {
    http: HttpClient,
    endpoint: String,
    auth_key: String,
}

impl CollectionSubmitter {
    pub fn new(http: HttpClient, endpoint: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            auth_key: auth_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the thumbnail and metadata once and return the raw response.
    pub async fn submit_collection(
        &self,
        thumbnail: &Thumbnail,
        info: &CollectionInfo,
    ) -> Result<RawResponse, CollectionError> {
        let json = serde_json::to_string(info)?;
        let image = Part::bytes(thumbnail.bytes().to_vec())
            .file_name(thumbnail.file_name())
            .mime_str(&thumbnail.format().mime())
            .map_err(|e| HttpError::Build(e.to_string()))?;
        let form = Form::new().part(THUMBNAIL_PART, image).text(JSON_PART, json);

        let resp = self
            .http
            .post_multipart(
                &self.endpoint,
                form,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.auth_key)),
                    accept_json: true,
                    ..Default::default()
                },
            )
            .await?;

        info!(
            target: "harvest.submit",
            collection = %info.name,
            status = resp.status.as_u16(),
            "collection submitted"
        );
        Ok(resp)
    }
}

/// Whether the ingestion API created the collection.
pub fn is_created(resp: &RawResponse) -> bool {
    resp.status == StatusCode::OK
}

#[derive(Deserialize)]
struct CreateResponse {
    collection: CreatedRef,
}

#[derive(Deserialize)]
struct CreatedRef {
    id: RawId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

/// Read `collection.id` from a successful response; numeric ids become strings.
pub fn created_collection_id(resp: &RawResponse) -> Result<String, CollectionError> {
    let missing = || CollectionError::MissingCollectionId {
        body: String::from_utf8_lossy(&resp.body).chars().take(200).collect(),
    };
    let parsed: CreateResponse = resp.json().map_err(|_| missing())?;
    match parsed.collection.id {
        RawId::Text(id) if !id.trim().is_empty() => Ok(id),
        RawId::Text(_) => Err(missing()),
        RawId::Number(n) => Ok(n.to_string()),
    }
}
