#[cfg(all(test, unix))]
mod integration_tests {
    use crate::{
        build_router, AppState, CaptureEngine, CaptureError, CaptureRequest, Config,
        DeliveryMode, EngineKind, FetchConvertEngine, RendererSettings, RequestHeaders,
        ScreenshotService, PNG_SIGNATURE,
    };
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::collections::HashSet;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex, OnceLock};
    use std::time::Duration;
    use tiny_http::{Response, Server};
    use tower::ServiceExt;

    const PAGE: &str = "<!DOCTYPE html><html><head><title>Test Page</title></head>\
                        <body><h1>Hello from Test Server</h1></body></html>";

    const LATIN1_PAGE: &[u8] =
        b"<html><head><meta charset=\"iso-8859-1\"></head><body>Caf\xe9 cr\xe8me</body></html>";

    struct Renderers {
        ok: PathBuf,
        failing: PathBuf,
        silent: PathBuf,
    }

    /// Fake wkhtmltoimage scripts. All are written before any test spawns a
    /// process so no child inherits an open write handle to them.
    fn renderers() -> &'static Renderers {
        static RENDERERS: OnceLock<Renderers> = OnceLock::new();
        RENDERERS.get_or_init(|| {
            let dir = tempfile::tempdir().unwrap().into_path();
            let write = |name: &str, body: &str| {
                let path = dir.join(name);
                std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
                path
            };
            Renderers {
                ok: write(
                    "ok-renderer",
                    "prev=''; last=''\n\
                     for arg; do prev=\"$last\"; last=\"$arg\"; done\n\
                     cp \"$prev\" \"$last.source.html\"\n\
                     printf '\\211PNG\\r\\n\\032\\nfake-image-data' > \"$last\"",
                ),
                failing: write(
                    "failing-renderer",
                    "echo 'renderer exploded: missing fonts' >&2\nexit 3",
                ),
                silent: write("silent-renderer", "exit 0"),
            }
        })
    }

    /// Local target site; records the headers of every request it receives.
    fn start_target_server() -> (String, Arc<Mutex<Vec<(String, String)>>>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();

        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                {
                    let mut seen = recorder.lock().unwrap();
                    for header in request.headers() {
                        seen.push((
                            header.field.as_str().as_str().to_ascii_lowercase(),
                            header.value.as_str().to_string(),
                        ));
                    }
                }

                let response = match request.url() {
                    "/" => Response::from_string(PAGE).with_header(
                        "Content-Type: text/html; charset=utf-8"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    "/latin1" => Response::from_data(LATIN1_PAGE).with_header(
                        "Content-Type: text/html; charset=iso-8859-1"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    "/error" => Response::from_string("Internal Server Error").with_status_code(500),
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });

        (format!("http://127.0.0.1:{port}"), seen)
    }

    fn unreachable_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/")
    }

    fn fetch_config(dir: &Path, renderer: &Path) -> Config {
        Config {
            engine: EngineKind::FetchConvert,
            static_dir: dir.join("static"),
            scratch_dir: dir.join("scratch"),
            fetch_timeout: Duration::from_secs(5),
            renderer: RendererSettings {
                program: renderer.display().to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Copy of the scratch HTML the ok renderer left beside its output.
    fn rendered_source(static_dir: &Path) -> PathBuf {
        let name = dir_entries(static_dir)
            .into_iter()
            .find(|name| name.ends_with(".source.html"))
            .unwrap_or_else(|| panic!("renderer left no source copy in {}", static_dir.display()));
        static_dir.join(name)
    }

    fn assert_generated_url(file_url: &str) {
        let token = file_url
            .strip_prefix("/static/screenshot_")
            .and_then(|rest| rest.strip_suffix(".png"))
            .unwrap_or_else(|| panic!("unexpected file_url {file_url}"));
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_fetch_convert_persists_png_and_removes_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service =
            ScreenshotService::new(fetch_config(dir.path(), &renderers().ok)).unwrap();

        let artifact = service
            .capture(CaptureRequest {
                output_filename: Some("home".to_string()),
                ..CaptureRequest::new(format!("{base_url}/"))
            })
            .await
            .unwrap();

        assert_eq!(artifact.file_name, "home.png");
        let bytes = std::fs::read(&artifact.path).unwrap();
        assert!(bytes.starts_with(PNG_SIGNATURE));

        // The renderer saw the fetched body verbatim.
        let source = std::fs::read(rendered_source(&dir.path().join("static"))).unwrap();
        assert_eq!(source, PAGE.as_bytes());

        assert!(dir_entries(&dir.path().join("scratch")).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_convert_merges_headers() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, seen) = start_target_server();
        let engine = FetchConvertEngine::new(fetch_config(dir.path(), &renderers().ok)).unwrap();
        std::fs::create_dir_all(dir.path().join("static")).unwrap();

        let mut headers = RequestHeaders::new();
        headers.insert("X-Api-Key".to_string(), "secret".to_string());
        let url = url::Url::parse(&format!("{base_url}/")).unwrap();
        let output = dir.path().join("static/headers.png");
        engine.capture(&url, &headers, &output).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.contains(&("x-api-key".to_string(), "secret".to_string())));
        assert!(seen
            .iter()
            .any(|(name, value)| name == "user-agent" && value.starts_with("Mozilla/5.0")));
    }

    #[tokio::test]
    async fn test_non_utf8_page_reaches_renderer_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service =
            ScreenshotService::new(fetch_config(dir.path(), &renderers().ok)).unwrap();

        service
            .capture(CaptureRequest::new(format!("{base_url}/latin1")))
            .await
            .unwrap();

        let source = std::fs::read(rendered_source(&dir.path().join("static"))).unwrap();
        assert_eq!(source, LATIN1_PAGE);
    }

    #[tokio::test]
    async fn test_oversized_page_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service = ScreenshotService::new(Config {
            max_page_bytes: 16,
            ..fetch_config(dir.path(), &renderers().ok)
        })
        .unwrap();

        let err = service
            .capture(CaptureRequest::new(format!("{base_url}/")))
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Fetch(ref m) if m.contains("page size limit")), "{err}");
        assert!(dir_entries(&dir.path().join("static")).is_empty());
        assert!(dir_entries(&dir.path().join("scratch")).is_empty());
    }

    #[tokio::test]
    async fn test_target_error_status_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service =
            ScreenshotService::new(fetch_config(dir.path(), &renderers().ok)).unwrap();

        let err = service
            .capture(CaptureRequest {
                output_filename: Some("server-error".to_string()),
                ..CaptureRequest::new(format!("{base_url}/error"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Fetch(ref m) if m.contains("500")), "{err}");
        assert!(err.is_client_error());
        // Renderer never ran: it would have left a .source.html next to the output.
        assert!(dir_entries(&dir.path().join("static")).is_empty());
        assert!(dir_entries(&dir.path().join("scratch")).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_target_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let service =
            ScreenshotService::new(fetch_config(dir.path(), &renderers().ok)).unwrap();

        let err = service
            .capture(CaptureRequest::new(unreachable_url()))
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Fetch(_)), "{err}");
        assert!(dir_entries(&dir.path().join("static")).is_empty());
        assert!(dir_entries(&dir.path().join("scratch")).is_empty());
    }

    #[tokio::test]
    async fn test_renderer_failure_reports_stderr_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service =
            ScreenshotService::new(fetch_config(dir.path(), &renderers().failing)).unwrap();

        let err = service
            .capture(CaptureRequest::new(format!("{base_url}/")))
            .await
            .unwrap_err();

        assert!(
            matches!(err, CaptureError::Render(ref m) if m.contains("renderer exploded: missing fonts")),
            "{err}"
        );
        assert!(!err.is_client_error());
        assert!(dir_entries(&dir.path().join("scratch")).is_empty());
        assert!(dir_entries(&dir.path().join("static")).is_empty());
    }

    #[tokio::test]
    async fn test_renderer_without_output_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service =
            ScreenshotService::new(fetch_config(dir.path(), &renderers().silent)).unwrap();

        let err = service
            .capture(CaptureRequest::new(format!("{base_url}/")))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Render(_)), "{err}");
        assert!(dir_entries(&dir.path().join("scratch")).is_empty());
    }

    #[tokio::test]
    async fn test_missing_renderer_binary_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service = ScreenshotService::new(fetch_config(
            dir.path(),
            &dir.path().join("no-such-renderer"),
        ))
        .unwrap();

        let err = service
            .capture(CaptureRequest::new(format!("{base_url}/")))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Render(ref m) if m.contains("failed to spawn")));
        assert!(dir_entries(&dir.path().join("scratch")).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_captures_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service =
            ScreenshotService::new(fetch_config(dir.path(), &renderers().ok)).unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                let url = format!("{base_url}/");
                tokio::spawn(async move { service.capture(CaptureRequest::new(url)).await })
            })
            .collect();

        let mut names = HashSet::new();
        for task in tasks {
            let artifact = task.await.unwrap().unwrap();
            assert!(std::fs::read(&artifact.path).unwrap().starts_with(PNG_SIGNATURE));
            names.insert(artifact.file_name);
        }

        assert_eq!(names.len(), 16);
        assert!(dir_entries(&dir.path().join("scratch")).is_empty());
    }

    // HTTP boundary

    fn app(config: Config) -> axum::Router {
        let service = ScreenshotService::new(config).unwrap();
        build_router(AppState {
            service,
            metrics: None,
        })
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_http_capture_serve_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let app = app(fetch_config(dir.path(), &renderers().ok));

        let response = app
            .clone()
            .oneshot(post_json(
                "/screenshot/",
                serde_json::json!({ "url": format!("{base_url}/") }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let file_url = body["file_url"].as_str().unwrap().to_string();
        assert_generated_url(&file_url);

        let response = app.clone().oneshot(empty("GET", &file_url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(PNG_SIGNATURE));

        let response = app.clone().oneshot(empty("DELETE", &file_url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(empty("DELETE", &file_url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["detail"], "File not found");
    }

    #[tokio::test]
    async fn test_http_invalid_url_is_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(fetch_config(dir.path(), &renderers().ok));

        let response = app
            .clone()
            .oneshot(post_json(
                "/screenshot/",
                serde_json::json!({ "url": "not-a-url" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["detail"].is_string());
        assert!(dir_entries(&dir.path().join("static")).is_empty());

        let response = app
            .oneshot(post_json("/screenshot/", serde_json::json!({ "nope": 1 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_http_traversal_filename_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let app = app(fetch_config(dir.path(), &renderers().ok));

        let response = app
            .oneshot(post_json(
                "/screenshot/",
                serde_json::json!({
                    "url": format!("{base_url}/"),
                    "output_filename": "../../escape"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!dir.path().join("escape.png").exists());
    }

    #[tokio::test]
    async fn test_http_fetch_failure_maps_to_400() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let app = app(fetch_config(dir.path(), &renderers().ok));

        let response = app
            .oneshot(post_json(
                "/screenshot/",
                serde_json::json!({ "url": format!("{base_url}/error") }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_http_render_failure_maps_to_500() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let app = app(fetch_config(dir.path(), &renderers().failing));

        let response = app
            .oneshot(post_json(
                "/screenshot/",
                serde_json::json!({ "url": format!("{base_url}/") }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("renderer exploded"));
    }

    #[tokio::test]
    async fn test_http_inline_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let config = Config {
            delivery: DeliveryMode::Inline,
            ..fetch_config(dir.path(), &renderers().ok)
        };
        let app = app(config);

        let response = app
            .oneshot(post_json(
                "/screenshot/bearer",
                serde_json::json!({ "url": format!("{base_url}/"), "bearer_token": "abc" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(PNG_SIGNATURE));

        let leftovers: Vec<_> = dir_entries(&dir.path().join("static"))
            .into_iter()
            .filter(|name| name.ends_with(".png"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[tokio::test]
    async fn test_http_static_stays_inside_artifact_dir() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        std::fs::write(&secret, "outside the static directory").unwrap();
        std::fs::create_dir_all(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/kept.png"), PNG_SIGNATURE).unwrap();
        let app = app(fetch_config(dir.path(), &renderers().ok));

        let encoded = secret.display().to_string().replace('/', "%2F");
        for uri in [
            format!("/static/{encoded}"),
            "/static/..%2F..%2Fetc%2Fpasswd".to_string(),
            "/static/%2E%2E%2Fkept.png".to_string(),
        ] {
            let response = app.clone().oneshot(empty("GET", &uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }

        let response = app
            .clone()
            .oneshot(empty("DELETE", &format!("/static/{encoded}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(secret.exists());

        let response = app
            .clone()
            .oneshot(empty("GET", "/static/kept.png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(empty("DELETE", "/static/.")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(dir.path().join("static/kept.png").exists());
    }

    #[tokio::test]
    async fn test_http_health_docs_and_missing_delete() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(fetch_config(dir.path(), &renderers().ok));

        let response = app.clone().oneshot(empty("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "status": "healthy" }));

        let response = app.clone().oneshot(empty("GET", "/")).await.unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()["location"], "/docs");

        let response = app.clone().oneshot(empty("GET", "/docs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty("DELETE", "/static/missing.png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(empty("GET", "/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_browser_capture_of_local_page() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, seen) = start_target_server();
        let service = ScreenshotService::new(Config {
            engine: EngineKind::Browser,
            static_dir: dir.path().join("static"),
            ..Default::default()
        })
        .unwrap();

        let mut headers = RequestHeaders::new();
        headers.insert("X-Api-Key".to_string(), "secret".to_string());
        let artifact = service
            .capture(CaptureRequest {
                url: format!("{base_url}/"),
                headers: Some(headers),
                output_filename: None,
            })
            .await
            .unwrap();

        let bytes = std::fs::read(&artifact.path).unwrap();
        assert!(bytes.starts_with(PNG_SIGNATURE));
        assert!(seen
            .lock()
            .unwrap()
            .contains(&("x-api-key".to_string(), "secret".to_string())));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_browser_capture_of_error_page_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (base_url, _) = start_target_server();
        let service = ScreenshotService::new(Config {
            engine: EngineKind::Browser,
            static_dir: dir.path().join("static"),
            ..Default::default()
        })
        .unwrap();

        let err = service
            .capture(CaptureRequest::new(format!("{base_url}/error")))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Fetch(_)), "{err}");
        assert!(dir_entries(&dir.path().join("static")).is_empty());

        let err = service
            .capture(CaptureRequest::new(unreachable_url()))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Fetch(_)), "{err}");
    }
}

#[cfg(test)]
mod config_tests {
    use crate::{get_chrome_args, Config, DeliveryMode, EngineKind};
    use std::time::Duration;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.engine, EngineKind::Browser);
        assert_eq!(config.delivery, DeliveryMode::Persist);
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.renderer.width, 1280);
        assert_eq!(config.renderer.quality, 90);
        assert!(config.max_concurrent_captures > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = Config {
            max_concurrent_captures: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            fetch_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_page_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            bind: "not an address".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_kind_parsing() {
        assert_eq!("browser".parse::<EngineKind>().unwrap(), EngineKind::Browser);
        assert_eq!(
            "fetch-convert".parse::<EngineKind>().unwrap(),
            EngineKind::FetchConvert
        );
        assert!("webkit".parse::<EngineKind>().is_err());

        let parsed: Config = serde_json::from_str(r#"{"engine": "fetch_convert"}"#).unwrap();
        assert_eq!(parsed.engine, EngineKind::FetchConvert);
    }

    #[test]
    fn test_chrome_args_generation() {
        let config = Config::default();
        let args = get_chrome_args(&config);

        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--ignore-certificate-errors".to_string()));
        assert!(args.contains(&format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        )));
    }

    #[test]
    fn test_browser_config_creation() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            chrome_path: Some("/usr/bin/chromium".to_string()),
            ..Default::default()
        };
        assert!(crate::create_browser_config(&config, dir.path()).is_ok());
    }

    #[test]
    fn test_capture_request_defaults() {
        let request: crate::CaptureRequest =
            serde_json::from_str(r#"{"url": "https://example.com"}"#).unwrap();
        assert_eq!(request.url, "https://example.com");
        assert!(request.headers.is_none());
        assert!(request.output_filename.is_none());

        let request: crate::CaptureRequest = serde_json::from_str(
            r#"{"url": "https://example.com", "headers": {"Accept-Language": "en"}}"#,
        )
        .unwrap();
        assert_eq!(request.headers.unwrap()["Accept-Language"], "en");
    }
}
