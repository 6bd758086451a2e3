//! End-to-end tests for the `/thumbnail` endpoint.
//!
//! Each test builds the full app (routes + config + HTTP client) against a
//! scratch uploads directory and drives it through actix's test service.
//! Image fixtures are synthesized with the `image` crate; the EXIF fixture
//! splices a writer-generated APP1 segment into a plain JPEG.

use actix_web::{App, test, web};
use base64::Engine as _;
use serde_json::Value;
use std::io::{Read, Write};
use thumbsmith::config::ServiceConfig;
use thumbsmith::server;

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

fn test_config(uploads_dir: &std::path::Path) -> ServiceConfig {
    ServiceConfig {
        uploads_dir: uploads_dir.to_path_buf(),
        ..ServiceConfig::default()
    }
}

/// Encode a synthetic JPEG of the given dimensions.
fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

/// A JPEG with an embedded EXIF `Make` tag, built by splicing an APP1
/// segment (Exif header + writer-generated TIFF body) right after SOI.
fn test_jpeg_with_make(width: u32, height: u32, make: &str) -> Vec<u8> {
    let jpeg = test_jpeg(width, height);

    let make_field = exif::Field {
        tag: exif::Tag::Make,
        ifd_num: exif::In::PRIMARY,
        value: exif::Value::Ascii(vec![make.as_bytes().to_vec()]),
    };
    let mut writer = exif::experimental::Writer::new();
    writer.push_field(&make_field);
    let mut tiff = std::io::Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff.into_inner());

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]); // SOI
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Build a multipart/form-data body. `filename: Some(..)` marks file parts.
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Serve one HTTP response with the given body on an ephemeral local port,
/// and return a URL for it ending in `path`.
fn serve_one_response(body: Vec<u8>, path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        }
    });
    format!("http://{addr}{path}")
}

/// Decode a `data:image/jpeg;base64,` URI back into image dimensions.
fn decode_data_uri(uri: &str) -> (u32, u32) {
    let encoded = uri
        .strip_prefix("data:image/jpeg;base64,")
        .expect("thumbnailUrl must be a JPEG data URI");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    (img.width(), img.height())
}

#[actix_web::test]
async fn missing_source_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post().uri("/thumbnail").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing imageUrl or image file");
}

#[actix_web::test]
async fn empty_upload_filename_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let body = multipart_body(&[("image", Some(""), &test_jpeg(20, 20))]);
    let req = test::TestRequest::post()
        .uri("/thumbnail")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No selected file");
}

#[actix_web::test]
async fn unreachable_image_url_is_rejected_with_cause() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    // Port 9 (discard) refuses connections immediately
    let req = test::TestRequest::post()
        .uri("/thumbnail")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("imageUrl=http%3A%2F%2F127.0.0.1%3A9%2Fnone.jpg")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(
        message.starts_with("Error downloading image from URL:"),
        "{message}"
    );
}

#[actix_web::test]
async fn unparseable_image_url_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/thumbnail")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("imageUrl=not%20a%20url")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn corrupt_upload_fails_thumbnail_generation() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let body = multipart_body(&[("image", Some("broken.jpg"), b"definitely not a jpeg")]);
    let req = test::TestRequest::post()
        .uri("/thumbnail")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Failed to generate thumbnail");
}

#[actix_web::test]
async fn non_numeric_width_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let body = multipart_body(&[
        ("width", None, b"ten"),
        ("image", Some("photo.jpg"), &test_jpeg(20, 20)),
    ]);
    let req = test::TestRequest::post()
        .uri("/thumbnail")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn upload_with_exif_yields_bounded_thumbnail_and_tags() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let jpeg = test_jpeg_with_make(400, 300, "TestCam");
    let body = multipart_body(&[
        ("width", None, b"100"),
        ("height", None, b"100"),
        ("image", Some("camera shot.jpg"), &jpeg),
    ]);
    let req = test::TestRequest::post()
        .uri("/thumbnail")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let (w, h) = decode_data_uri(body["thumbnailUrl"].as_str().unwrap());
    assert_eq!((w, h), (100, 75), "aspect-preserved fit of 400x300");
    assert_eq!(body["metadata"]["Make"], "TestCam");

    // The uploaded original stays in the uploads directory
    let stored: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(stored.len(), 1, "{stored:?}");
    assert!(stored[0].starts_with("camera_shot-"), "{stored:?}");
}

#[actix_web::test]
async fn upload_without_exif_yields_empty_metadata() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let body = multipart_body(&[("image", Some("plain.jpg"), &test_jpeg(50, 50))]);
    let req = test::TestRequest::post()
        .uri("/thumbnail")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["metadata"], serde_json::json!({}));
    // 50x50 already fits the default 100x100 bounds
    let (w, h) = decode_data_uri(body["thumbnailUrl"].as_str().unwrap());
    assert_eq!((w, h), (50, 50));
}

#[actix_web::test]
async fn url_source_is_thumbnailed_and_temp_file_removed() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let image_url = serve_one_response(test_jpeg(300, 400), "/remote.jpg");
    let encoded_url: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("imageUrl", &image_url)
        .append_pair("width", "100")
        .append_pair("height", "100")
        .finish();

    let req = test::TestRequest::post()
        .uri("/thumbnail")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(encoded_url)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let (w, h) = decode_data_uri(body["thumbnailUrl"].as_str().unwrap());
    assert_eq!((w, h), (75, 100), "aspect-preserved fit of 300x400");

    // The URL-derived temp file must be gone after the response
    let leftover = std::fs::read_dir(tmp.path()).unwrap().count();
    assert_eq!(leftover, 0, "temp file should have been removed");
}

#[actix_web::test]
async fn get_with_query_string_fields_works() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let image_url = serve_one_response(test_jpeg(200, 200), "/square.jpg");
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("imageUrl", &image_url)
        .append_pair("width", "64")
        .finish();

    let req = test::TestRequest::get()
        .uri(&format!("/thumbnail?{query}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let (w, h) = decode_data_uri(body["thumbnailUrl"].as_str().unwrap());
    // width 64, height defaulted to 100 → square source bounded by 64
    assert_eq!((w, h), (64, 64));
}

#[actix_web::test]
async fn health_probe_responds() {
    let tmp = tempfile::TempDir::new().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config(tmp.path())))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}
