use httpmock::prelude::*;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use webex_bg_logo::app;
use webex_bg_logo::core::command::parse_command;
use webex_bg_logo::core::text::TrueTypeFont;
use webex_bg_logo::core::xapi::BLUR_PAYLOAD;
use webex_bg_logo::{
    AppSettings, LocalStorage, LogoEngine, LogoError, RunOutcome, TomlConfig, XapiClient,
};

const PARTICIPANTS_XML: &str = r#"<?xml version="1.0"?>
<Command><ParticipantListSearchResult status="OK">
  <Participant item="1"><Email>me@mycompany.com</Email></Participant>
  <Participant item="2"><Email>buyer@customer.io</Email></Participant>
  <Participant item="3"><Email>cfo@customer.io</Email></Participant>
  <Participant item="4"><Email>friend@gmail.com</Email></Participant>
</ParticipantListSearchResult></Command>"#;

const OK_XML: &str = r#"<Command><Result status="OK"/></Command>"#;

fn settings_for(dir: &Path, device: &str, logo_service: &str, logo_end: &str) -> AppSettings {
    let content = format!(
        r#"
[settings]
endpoint_address = '{device}'
background_file = '{background}'
cache_folder = '{cache}'
xapi_token = "dXNlcjpwYXNz"
background_slot = "User3"
ignored_domains = ["mycompany.com"]
logo_start = "500x100"
logo_end = "{logo_end}"
scale_logo = true
font_size = 48
font_color = "white"
font_file = ""
logo_service_url = '{logo_service}'
request_timeout_seconds = 5
"#,
        background = dir.join("background.jpg").display(),
        cache = dir.join("cache").display(),
    );
    TomlConfig::from_toml_str(&content)
        .unwrap()
        .into_app_settings()
        .unwrap()
}

fn write_background(dir: &Path) {
    RgbImage::from_pixel(800, 600, Rgb([20, 40, 160]))
        .save(dir.join("background.jpg"))
        .unwrap();
}

fn logo_png() -> Vec<u8> {
    let logo = RgbaImage::from_pixel(40, 20, Rgba([250, 250, 250, 255]));
    let mut buffer = Cursor::new(Vec::new());
    logo.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

fn engine_for(settings: AppSettings) -> LogoEngine<LocalStorage, XapiClient> {
    let storage = LocalStorage::new(settings.cache_folder.clone());
    storage.ensure_dir().unwrap();
    let channel = XapiClient::new(
        &settings.endpoint_address,
        &settings.xapi_token,
        settings.request_timeout,
    )
    .unwrap();
    LogoEngine::new(settings, storage, channel).unwrap()
}

#[tokio::test]
async fn test_auto_detect_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    write_background(temp_dir.path());

    let device = MockServer::start();
    let participants_mock = device.mock(|when, then| {
        when.method(POST)
            .path("/putxml")
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body_contains("<ParticipantList>");
        then.status(200).body(PARTICIPANTS_XML);
    });
    let upload_mock = device.mock(|when, then| {
        when.method(POST)
            .path("/putxml")
            .body_contains("<Upload><Image>User3</Image><body>");
        then.status(200).body(OK_XML);
    });
    let blur_mock = device.mock(|when, then| {
        when.method(POST).path("/putxml").body(BLUR_PAYLOAD);
        then.status(200).body(OK_XML);
    });
    let switch_mock = device.mock(|when, then| {
        when.method(POST)
            .path("/putxml")
            .body_contains("<Set><Image>User3</Image><Mode>Image</Mode>");
        then.status(200).body(OK_XML);
    });

    let logos = MockServer::start();
    let logo_mock = logos.mock(|when, then| {
        when.method(GET).path("/logos/customer.io");
        then.status(200)
            .header("Content-Type", "image/png")
            .body(logo_png());
    });

    let settings = settings_for(
        temp_dir.path(),
        &device.base_url(),
        &format!("{}/logos/{{domain}}", logos.base_url()),
        "700x300",
    );
    let engine = engine_for(settings);

    let outcome = engine.run(parse_command("").unwrap()).await.unwrap();

    participants_mock.assert();
    logo_mock.assert();
    upload_mock.assert();
    blur_mock.assert();
    switch_mock.assert();

    let result_file = match outcome {
        RunOutcome::Uploaded { result_file, .. } => result_file,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert!(temp_dir.path().join("cache").join("customer.io.png").is_file());

    let result = image::open(&result_file).unwrap();
    assert_eq!((result.width(), result.height()), (800, 600));
}

#[tokio::test]
async fn test_second_run_uses_cache_and_gives_same_result() {
    let temp_dir = TempDir::new().unwrap();
    write_background(temp_dir.path());

    let device = MockServer::start();
    device.mock(|when, then| {
        when.method(POST).path("/putxml");
        then.status(200).body(OK_XML);
    });

    let logos = MockServer::start();
    let logo_mock = logos.mock(|when, then| {
        when.method(GET).path("/logos/acme.org");
        then.status(200).body(logo_png());
    });

    let settings = settings_for(
        temp_dir.path(),
        &device.base_url(),
        &format!("{}/logos/{{domain}}", logos.base_url()),
        "700x300",
    );
    let engine = engine_for(settings);
    let command = parse_command("sales@acme.org").unwrap();

    engine.run(command.clone()).await.unwrap();
    let result_path = temp_dir.path().join("cache").join("_result.jpg");
    let first = std::fs::read(&result_path).unwrap();

    engine.run(command).await.unwrap();
    let second = std::fs::read(&result_path).unwrap();

    logo_mock.assert_hits(1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_logo_area_outside_canvas_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    write_background(temp_dir.path());

    let device = MockServer::start();
    let device_mock = device.mock(|when, then| {
        when.method(POST).path("/putxml");
        then.status(200).body(OK_XML);
    });

    let settings = settings_for(
        temp_dir.path(),
        &device.base_url(),
        "http://127.0.0.1:9/{domain}",
        "900x500",
    );
    let engine = engine_for(settings);
    std::fs::write(temp_dir.path().join("cache").join("acme.org.png"), logo_png()).unwrap();

    let err = engine
        .run(parse_command("acme.org").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, LogoError::InputValidationError { .. }));
    device_mock.assert_hits(0);
}

#[tokio::test]
async fn test_device_rejecting_upload_stops_the_run() {
    let temp_dir = TempDir::new().unwrap();
    write_background(temp_dir.path());

    let device = MockServer::start();
    let upload_mock = device.mock(|when, then| {
        when.method(POST).path("/putxml").body_contains("<Upload>");
        then.status(401);
    });
    let blur_mock = device.mock(|when, then| {
        when.method(POST).path("/putxml").body(BLUR_PAYLOAD);
        then.status(200).body(OK_XML);
    });

    let settings = settings_for(
        temp_dir.path(),
        &device.base_url(),
        "http://127.0.0.1:9/{domain}",
        "700x300",
    );
    let engine = engine_for(settings);

    let err = engine.run(parse_command("clear").unwrap()).await.unwrap_err();

    assert!(matches!(err, LogoError::NetworkError { .. }));
    upload_mock.assert();
    blur_mock.assert_hits(0);
}

#[tokio::test]
async fn test_text_is_embedded() {
    if TrueTypeFont::locate(None).is_err() {
        eprintln!("no system font available, skipping");
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    write_background(temp_dir.path());

    let device = MockServer::start();
    let upload_mock = device.mock(|when, then| {
        when.method(POST).path("/putxml").body_contains("<Upload>");
        then.status(200).body(OK_XML);
    });
    device.mock(|when, then| {
        when.method(POST).path("/putxml").body_contains("<Set>");
        then.status(200).body(OK_XML);
    });

    let settings = settings_for(
        temp_dir.path(),
        &device.base_url(),
        "http://127.0.0.1:9/{domain}",
        "700x300",
    );
    let engine = engine_for(settings);

    engine
        .run(parse_command("text Welcome##ACME Corp").unwrap())
        .await
        .unwrap();

    upload_mock.assert();
}

#[tokio::test]
async fn test_help_has_no_side_effects() {
    let temp_dir = TempDir::new().unwrap();

    let device = MockServer::start();
    let device_mock = device.mock(|when, then| {
        when.method(POST).path("/putxml");
        then.status(200).body(OK_XML);
    });

    let settings = settings_for(
        temp_dir.path(),
        &device.base_url(),
        "http://127.0.0.1:9/{domain}",
        "700x300",
    );
    let outcome = app::run(settings, "help").await.unwrap();

    assert_eq!(outcome, RunOutcome::Help);
    assert!(!temp_dir.path().join("cache").exists());
    device_mock.assert_hits(0);
}

#[tokio::test]
async fn test_app_run_creates_cache_and_switches() {
    let temp_dir = TempDir::new().unwrap();

    let device = MockServer::start();
    let switch_mock = device.mock(|when, then| {
        when.method(POST)
            .path("/putxml")
            .body_contains("<Set><Image>User1</Image><Mode>Image</Mode>");
        then.status(200).body(OK_XML);
    });

    let settings = settings_for(
        temp_dir.path(),
        &device.base_url(),
        "http://127.0.0.1:9/{domain}",
        "700x300",
    );
    let outcome = app::run(settings, "user1").await.unwrap();

    assert!(matches!(outcome, RunOutcome::Switched(_)));
    assert!(temp_dir.path().join("cache").is_dir());
    switch_mock.assert();
}

#[test]
fn test_missing_settings_file_writes_template() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("webexlogo_settings.toml");

    let err = TomlConfig::load_or_create(&path).unwrap_err();
    assert!(matches!(err, LogoError::SettingsTemplateCreated { .. }));
    assert!(!err.alerts());
    assert!(path.is_file());

    // the template still carries placeholders
    let err = TomlConfig::load_or_create(&path).unwrap_err();
    assert!(matches!(err, LogoError::ConfigError { .. }));
}
