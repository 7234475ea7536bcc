mod common;

use common::PNG_BYTES;
use harvest_http::HttpClient;
use harvest_marketplace::submit::{created_collection_id, is_created};
use harvest_marketplace::{CollectionInfo, CollectionSubmitter, CollectionType, ImageFormat, Thumbnail};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn uploads_thumbnail_and_metadata_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/collections"))
        .and(header("authorization", "Bearer secret"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"collection":{"id":"c-1"}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let submitter = CollectionSubmitter::new(
        HttpClient::new().unwrap(),
        format!("{}/api/collections", server.uri()),
        "secret",
    );
    assert_eq!(submitter.endpoint(), format!("{}/api/collections", server.uri()));
    let thumbnail = Thumbnail::new(PNG_BYTES.to_vec(), ImageFormat::Png);
    let info = CollectionInfo::new("Moonbirds", "Owls.", CollectionType::Erc721);

    let resp = submitter.submit_collection(&thumbnail, &info).await.unwrap();
    assert!(is_created(&resp));
    assert_eq!(created_collection_id(&resp).unwrap(), "c-1");

    let requests = server.received_requests().await.unwrap();
    let req = &requests[0];
    let content_type = req.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");

    let body = String::from_utf8_lossy(&req.body);
    assert!(body.contains(r#"name="thumbnailImage"; filename="thumbnail.png""#), "{body}");
    assert!(body.contains("Content-Type: image/png") || body.contains("content-type: image/png"), "{body}");
    assert!(body.contains(r#"name="json""#), "{body}");
    assert!(
        body.contains(r#"{"name":"Moonbirds","symbol":"MOO","description":"Owls.","type":"erc721"}"#),
        "{body}"
    );
    assert!(!body.contains("collection_id"));
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"message":"bad token"}"#))
        .mount(&server)
        .await;

    let submitter = CollectionSubmitter::new(HttpClient::new().unwrap(), server.uri(), "wrong");
    let thumbnail = Thumbnail::new(PNG_BYTES.to_vec(), ImageFormat::Png);
    let info = CollectionInfo::new("X", "", CollectionType::Erc1155);

    let resp = submitter.submit_collection(&thumbnail, &info).await.unwrap();
    assert!(!is_created(&resp));
    assert_eq!(resp.error_message(), "bad token");
}
