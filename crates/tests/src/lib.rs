//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - wire contract snapshots
//! - registry over real TCP with the reqwest transport
//! - a full sharing session: simulated source -> reporter -> registry

#[cfg(test)]
mod contract_tests {
    use contracts::{BusNumber, ErrorResponse, PositionUpdateRequest, StopSharingRequest};

    #[test]
    fn test_request_bodies_use_camel_case() {
        let body = serde_json::to_value(StopSharingRequest::new(BusNumber::new("42")))
            .expect("serialize");
        assert_eq!(body, serde_json::json!({"busNumber": "42"}));

        let parsed: PositionUpdateRequest =
            serde_json::from_str(r#"{"busNumber":"7","latitude":1.5}"#).expect("deserialize");
        assert_eq!(parsed.bus_number.as_deref(), Some("7"));
        assert_eq!(parsed.latitude, Some(1.5));
        assert_eq!(parsed.longitude, None);
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorResponse::new("Bus introuvable")).expect("serialize");
        assert_eq!(body, serde_json::json!({"error": "Bus introuvable"}));
    }

    #[test]
    fn test_default_config_round_trips_through_loader() {
        let blueprint = contracts::TrackerBlueprint::default();
        let toml = config_loader::ConfigLoader::to_toml(&blueprint).expect("to toml");
        let reloaded =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .expect("reload");
        assert_eq!(reloaded.server.port, 10000);
        assert_eq!(reloaded.reporter.queue_capacity, 64);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        BusNumber, ContractError, LocationFix, PositionSample, PositionTransport, ServerConfig,
    };
    use registry::{RegistryHandle, RegistryServer};
    use reporter::{
        HttpTransport, Reporter, ReporterSettings, SessionController, SimulatedConfig,
        SimulatedLocationSource, UploadQueue,
    };

    async fn start_registry(record_ttl_secs: Option<u64>) -> RegistryHandle {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            record_ttl_secs,
            sweep_interval_secs: 1,
            lines_path: None,
        };
        RegistryServer::bind(&config)
            .await
            .expect("bind registry")
            .spawn()
            .expect("spawn registry")
    }

    fn transport(registry: &RegistryHandle) -> HttpTransport {
        HttpTransport::new(
            &registry.base_url(),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .expect("transport")
    }

    /// POST -> GET -> stopSharing -> GET 404, through the reqwest client
    #[tokio::test]
    async fn test_transport_against_live_registry() {
        let registry = start_registry(None).await;
        let client = transport(&registry);
        let bus = BusNumber::new("42");

        let sample = PositionSample::new(bus.clone(), LocationFix::now(48.85, 2.35))
            .expect("valid sample");
        client.send_position(&sample).await.expect("upload");

        let record = client.fetch_position(&bus).await.expect("fetch");
        assert_eq!(record.latitude, 48.85);
        assert_eq!(record.longitude, 2.35);

        client.stop_sharing(&bus).await.expect("stop");
        let err = client.fetch_position(&bus).await.expect_err("gone");
        assert!(err.is_not_found());

        let err = client.stop_sharing(&bus).await.expect_err("already gone");
        assert!(matches!(err, ContractError::NotFound { .. }));

        registry.shutdown().await.expect("shutdown");
    }

    /// Raw HTTP: exact bodies and CORS header
    #[tokio::test]
    async fn test_wire_format_over_tcp() {
        let registry = start_registry(None).await;
        let http = reqwest::Client::new();
        let base = registry.base_url();

        let response = http
            .post(format!("{base}/api/position"))
            .header("origin", "https://driver.example.org")
            .json(&serde_json::json!({"busNumber": "42", "latitude": 48.85, "longitude": 2.35}))
            .send()
            .await
            .expect("post");
        assert_eq!(response.status(), 200);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let body: serde_json::Value = response.json().await.expect("json");
        assert_eq!(body, serde_json::json!({"message": "Position enregistrée"}));

        let response = http
            .post(format!("{base}/api/stopSharing"))
            .json(&serde_json::json!({"busNumber": "42"}))
            .send()
            .await
            .expect("stop");
        let body: serde_json::Value = response.json().await.expect("json");
        assert_eq!(body, serde_json::json!({"message": "Partage arrêté pour le bus 42"}));

        let response = http
            .get(format!("{base}/api/position/42"))
            .send()
            .await
            .expect("get");
        assert_eq!(response.status(), 404);
        let body: serde_json::Value = response.json().await.expect("json");
        assert_eq!(body, serde_json::json!({"error": "Bus introuvable"}));

        registry.shutdown().await.expect("shutdown");
    }

    /// Simulated source -> SessionController -> UploadQueue -> registry
    #[tokio::test]
    async fn test_sharing_session_end_to_end() {
        let registry = start_registry(None).await;
        let uploads = UploadQueue::spawn(transport(&registry), 16, 4);
        let reporter = Arc::new(Reporter::new(
            SimulatedLocationSource::new(SimulatedConfig::default()),
            ReporterSettings {
                min_update_interval: Duration::from_millis(20),
                ..ReporterSettings::default()
            },
            uploads,
        ));
        let session = SessionController::new(Arc::clone(&reporter), Duration::from_millis(50));

        session.start("L7").expect("start sharing");

        let mut shared = None;
        for _ in 0..100 {
            if let Ok(record) = registry.store().read("L7") {
                shared = Some(record);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let record = shared.expect("position reached the registry");
        assert!((record.latitude - 48.8566).abs() < 0.01);

        let stopped = session
            .finish(&transport(&registry))
            .await
            .expect("stop sharing");
        assert_eq!(stopped.as_deref(), Some("L7"));

        assert!(registry.store().read("L7").is_err());
        let metrics = reporter.uploads().metrics().snapshot();
        assert!(metrics.sent >= 2);
        assert_eq!(metrics.failed, 0);

        registry.shutdown().await.expect("shutdown");
    }

    /// Unreachable registry: uploads fail, the loop keeps running
    #[tokio::test]
    async fn test_upload_failures_do_not_stop_the_loop() {
        let registry = start_registry(None).await;
        let client = transport(&registry);
        registry.shutdown().await.expect("shutdown");

        let source = SimulatedLocationSource::new(SimulatedConfig::default());
        let uploads = UploadQueue::spawn(client, 16, 2);
        let reporter = Arc::new(Reporter::new(
            source,
            ReporterSettings {
                min_update_interval: Duration::from_millis(10),
                ..ReporterSettings::default()
            },
            uploads,
        ));
        let session = SessionController::new(Arc::clone(&reporter), Duration::from_millis(30));

        session.start("offline").expect("start sharing");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(session.is_active());
        assert!(reporter.source().fetch_count() >= 3);

        session.stop();
        reporter.uploads().shutdown().await;
        let metrics = reporter.uploads().metrics().snapshot();
        assert!(metrics.failed >= 1);
        assert_eq!(metrics.sent, 0);
    }

    /// Records older than the TTL disappear
    #[tokio::test]
    async fn test_ttl_expiry_over_http() {
        let registry = start_registry(Some(1)).await;
        let client = transport(&registry);
        let bus = BusNumber::new("night-bus");

        let sample = PositionSample::new(bus.clone(), LocationFix::now(1.0, 1.0))
            .expect("valid sample");
        client.send_position(&sample).await.expect("upload");
        assert!(client.fetch_position(&bus).await.is_ok());

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(client.fetch_position(&bus).await.expect_err("expired").is_not_found());
        assert!(registry.store().is_empty());

        registry.shutdown().await.expect("shutdown");
    }
}
