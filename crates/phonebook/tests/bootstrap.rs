//! Configuration to running pipeline, without a socket.

use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use phonebook::{bootstrap, ConfigLoader, FileRepository, ContactRepository};

#[tokio::test]
async fn file_backed_server_persists_created_contacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("data").join("contacts.json");
    let dist = dir.path().join("dist");
    std::fs::create_dir(&dist).unwrap();
    std::fs::write(dist.join("index.html"), "<html></html>").unwrap();

    let toml = format!(
        r#"
[server]
http_addr = "127.0.0.1:0"

[storage]
backend = "file"
path = "{}"

[static_files]
root = "{}"

[logging]
enabled = false
"#,
        store.display().to_string().replace('\\', "/"),
        dist.display().to_string().replace('\\', "/"),
    );
    let config = ConfigLoader::new().with_string(&toml, "toml").unwrap().load().unwrap();
    let server = bootstrap(&config).await.unwrap();

    let response = server
        .dispatch(
            Request::builder()
                .method(Method::POST)
                .uri("/api/persons")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Bytes::from_static(br#"{"name":"Ada Lovelace","number":"040-123456"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let index = server
        .dispatch(Request::builder().uri("/").body(Bytes::new()).unwrap())
        .await;
    assert_eq!(index.status(), StatusCode::OK);
    let body = index.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"<html></html>");

    let reopened = FileRepository::open(&store).await.unwrap();
    let contacts = reopened.find_all().await.unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].name, "Ada Lovelace");
}
