//! REST API implementation using rouille.
//!
//! # Thread safety
//!
//! Handlers run on rouille's worker threads. The only shared state they
//! touch is the coordinator (mutex-guarded slots and settings) and the
//! asset cache (immutable after boot). Command handlers never block on
//! hardware and never report post-acceptance failures - the response says
//! "accepted", not "succeeded".
//!
//! # Used by
//!
//! - `server/mod.rs` - re-exports public types
//! - `main.rs` - calls `ApiServer::start()` before entering the main loop

use crate::assets::AssetCache;
use crate::coordinator::Coordinator;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;

/// Request body for the speak endpoint
#[derive(Debug, Deserialize)]
struct SayRequest {
    text: String,
}

/// Generic API response
#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn ok() -> Self {
        Self { success: true, message: None, error: None }
    }

    fn ok_msg(msg: &str) -> Self {
        Self { success: true, message: Some(msg.to_string()), error: None }
    }

    fn err(msg: &str) -> Self {
        Self { success: false, message: None, error: Some(msg.to_string()) }
    }
}

/// HTTP adapter server
pub struct ApiServer {
    port: u16,
    coordinator: Arc<Coordinator>,
    cache: Arc<AssetCache>,
}

impl ApiServer {
    /// Start the server in a background thread and return its handle.
    pub fn start(
        port: u16,
        coordinator: Arc<Coordinator>,
        cache: Arc<AssetCache>,
    ) -> thread::JoinHandle<()> {
        let server = ApiServer {
            port,
            coordinator,
            cache,
        };

        thread::Builder::new()
            .name("moodbox-api".into())
            .spawn(move || server.run())
            .expect("Failed to spawn API server thread")
    }

    fn run(self) {
        let addr = format!("0.0.0.0:{}", self.port);
        log::info!("API server starting on http://{}", addr);

        let coordinator = self.coordinator;
        let cache = self.cache;

        rouille::start_server(&addr, move |request| {
            Self::handle_request(request, &coordinator, &cache)
        });
    }

    pub(crate) fn handle_request(
        request: &Request,
        coordinator: &Arc<Coordinator>,
        cache: &Arc<AssetCache>,
    ) -> Response {
        // Handle preflight
        if request.method() == "OPTIONS" {
            return Response::empty_204()
                .with_additional_header("Access-Control-Allow-Origin", "*")
                .with_additional_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
                .with_additional_header("Access-Control-Allow-Headers", "Content-Type");
        }

        // Handle paths with parameters manually (router! doesn't capture well)
        let path = request.url();
        if request.method() == "POST" {
            // /api/face/{name}
            if let Some(name) = path.strip_prefix("/api/face/") {
                return Self::handle_face(coordinator, name)
                    .with_additional_header("Access-Control-Allow-Origin", "*");
            }
            // /api/sound/{name}
            if let Some(name) = path.strip_prefix("/api/sound/") {
                return Self::handle_sound(coordinator, name)
                    .with_additional_header("Access-Control-Allow-Origin", "*");
            }
            // /api/brightness/{n}
            if let Some(level) = path.strip_prefix("/api/brightness/") {
                return Self::handle_brightness(coordinator, level)
                    .with_additional_header("Access-Control-Allow-Origin", "*");
            }
            // /api/volume/{n}
            if let Some(level) = path.strip_prefix("/api/volume/") {
                return Self::handle_volume(coordinator, level)
                    .with_additional_header("Access-Control-Allow-Origin", "*");
            }
        }

        let response = rouille::router!(request,
            // Speech takes a JSON body
            (POST) ["/api/say"] => {
                Self::handle_say(request, coordinator)
            },

            // Status endpoints
            (GET) ["/api/status"] => {
                Response::json(&coordinator.status(cache.len(), cache.total_bytes()))
            },
            (GET) ["/api/health"] => {
                Response::json(&ApiResponse::ok_msg("moodbox API server"))
            },

            // Fallback: static content straight from the boot-time cache
            _ => {
                Self::serve_asset(request, cache)
            }
        );

        // Add CORS headers to response
        response.with_additional_header("Access-Control-Allow-Origin", "*")
    }

    fn handle_face(coordinator: &Arc<Coordinator>, name: &str) -> Response {
        if name.is_empty() {
            return Response::json(&ApiResponse::err("Missing face name")).with_status_code(400);
        }
        coordinator.face.request(name.to_string());
        Response::json(&ApiResponse::ok())
    }

    fn handle_sound(coordinator: &Arc<Coordinator>, name: &str) -> Response {
        if name.is_empty() {
            return Response::json(&ApiResponse::err("Missing sound name")).with_status_code(400);
        }
        coordinator.sound.request(name.to_string());
        Response::json(&ApiResponse::ok())
    }

    fn handle_say(request: &Request, coordinator: &Arc<Coordinator>) -> Response {
        match rouille::input::json_input::<SayRequest>(request) {
            Ok(req) if req.text.trim().is_empty() => {
                Response::json(&ApiResponse::err("Empty text")).with_status_code(400)
            }
            Ok(req) => {
                coordinator.speech.request(req.text);
                Response::json(&ApiResponse::ok())
            }
            Err(e) => Response::json(&ApiResponse::err(&format!("Invalid JSON: {}", e)))
                .with_status_code(400),
        }
    }

    fn handle_brightness(coordinator: &Arc<Coordinator>, level: &str) -> Response {
        match level.parse::<u8>() {
            Ok(level) => {
                coordinator.set_brightness(level);
                Response::json(&ApiResponse::ok())
            }
            Err(_) => Response::json(&ApiResponse::err("Invalid brightness value"))
                .with_status_code(400),
        }
    }

    fn handle_volume(coordinator: &Arc<Coordinator>, level: &str) -> Response {
        match level.parse::<u8>() {
            Ok(level) => {
                coordinator.set_volume(level);
                Response::json(&ApiResponse::ok())
            }
            Err(_) => {
                Response::json(&ApiResponse::err("Invalid volume value")).with_status_code(400)
            }
        }
    }

    fn serve_asset(request: &Request, cache: &Arc<AssetCache>) -> Response {
        if request.method() != "GET" {
            return Response::json(&ApiResponse::err("Not found")).with_status_code(404);
        }
        match cache.find(&request.url()) {
            Some(asset) => {
                Response::from_data(asset.content_type.mime(), asset.bytes.clone())
            }
            None => Response::json(&ApiResponse::err("Not found")).with_status_code(404),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::DeviceSettings;
    use rouille::Request;

    fn fixtures() -> (Arc<Coordinator>, Arc<AssetCache>) {
        let coordinator = Arc::new(Coordinator::new(
            DeviceSettings {
                brightness: 255,
                volume: 128,
            },
            "pleased",
        ));
        (coordinator, Arc::new(AssetCache::default()))
    }

    fn post(url: &str) -> Request {
        Request::fake_http("POST", url, vec![], vec![])
    }

    #[test]
    fn test_face_endpoint_fills_slot() {
        let (coord, cache) = fixtures();
        let resp = ApiServer::handle_request(&post("/api/face/happy"), &coord, &cache);

        assert_eq!(resp.status_code, 200);
        assert_eq!(coord.face.try_drain().as_deref(), Some("happy"));
    }

    #[test]
    fn test_sound_endpoint_fills_slot() {
        let (coord, cache) = fixtures();
        let resp = ApiServer::handle_request(&post("/api/sound/bell"), &coord, &cache);

        assert_eq!(resp.status_code, 200);
        assert_eq!(coord.sound.try_drain().as_deref(), Some("bell"));
    }

    #[test]
    fn test_say_endpoint_json_body() {
        let (coord, cache) = fixtures();
        let request = Request::fake_http(
            "POST",
            "/api/say",
            vec![("Content-Type".into(), "application/json".into())],
            br#"{"text": "hello world"}"#.to_vec(),
        );
        let resp = ApiServer::handle_request(&request, &coord, &cache);

        assert_eq!(resp.status_code, 200);
        assert_eq!(coord.speech.try_drain().as_deref(), Some("hello world"));
    }

    #[test]
    fn test_say_rejects_empty_text() {
        let (coord, cache) = fixtures();
        let request = Request::fake_http(
            "POST",
            "/api/say",
            vec![("Content-Type".into(), "application/json".into())],
            br#"{"text": "  "}"#.to_vec(),
        );
        let resp = ApiServer::handle_request(&request, &coord, &cache);

        assert_eq!(resp.status_code, 400);
        assert!(!coord.speech.is_pending());
    }

    #[test]
    fn test_brightness_and_volume_parse() {
        let (coord, cache) = fixtures();

        let resp = ApiServer::handle_request(&post("/api/brightness/80"), &coord, &cache);
        assert_eq!(resp.status_code, 200);
        let resp = ApiServer::handle_request(&post("/api/volume/300"), &coord, &cache);
        assert_eq!(resp.status_code, 400);

        let settings = coord.settings();
        assert_eq!(settings.brightness, 80);
        assert_eq!(settings.volume, 128);
    }

    #[test]
    fn test_acceptance_always_succeeds_even_twice() {
        // Fire-and-forget: a second request before any drain still reports
        // success (latest-write-wins downstream).
        let (coord, cache) = fixtures();
        let r1 = ApiServer::handle_request(&post("/api/face/happy"), &coord, &cache);
        let r2 = ApiServer::handle_request(&post("/api/face/angry"), &coord, &cache);

        assert_eq!(r1.status_code, 200);
        assert_eq!(r2.status_code, 200);
        assert_eq!(coord.face.try_drain().as_deref(), Some("angry"));
    }

    #[test]
    fn test_static_asset_served_from_cache() {
        use crate::assets::{CACHE_FOLDERS, AssetCache};
        use std::fs;

        let root = std::env::temp_dir().join("moodbox_api_static");
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("www/assets/mm")).unwrap();
        fs::write(root.join("www/assets/mm/happy.png"), b"png-bytes").unwrap();

        let cache = Arc::new(AssetCache::load(&root, CACHE_FOLDERS).unwrap());
        let (coord, _) = fixtures();

        let request = Request::fake_http("GET", "/www/assets/mm/happy.png", vec![], vec![]);
        let resp = ApiServer::handle_request(&request, &coord, &cache);
        assert_eq!(resp.status_code, 200);

        let (mut reader, _) = resp.data.into_reader_and_size();
        let mut body = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut body).unwrap();
        assert_eq!(body, b"png-bytes");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_unknown_url_404() {
        let (coord, cache) = fixtures();
        let request = Request::fake_http("GET", "/www/assets/absent.png", vec![], vec![]);
        let resp = ApiServer::handle_request(&request, &coord, &cache);
        assert_eq!(resp.status_code, 404);
    }
}
