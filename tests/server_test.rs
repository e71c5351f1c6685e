//! Integration tests for the heart-rate statistics server

#[cfg(feature = "server")]
mod server_tests {
    use ecg_fhir_bridge::server::{run, ServerConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    async fn start_server(observations_path: PathBuf) -> (std::net::SocketAddr, tokio::sync::oneshot::Sender<()>) {
        let config = ServerConfig::new(0, observations_path);
        let handle = run(config).await.expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let (addr, shutdown_tx) = start_server(dir.path().join("observations.json")).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_heart_data_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let (addr, shutdown_tx) = start_server(dir.path().join("observations.json")).await;

        let client = reqwest::Client::new();

        // A normal series: out-of-band readings are filtered before the
        // average is taken.
        let response = client
            .post(format!("http://{}/api/heart-data", addr))
            .json(&serde_json::json!({"heart_rate": [80.0, 90.0, 100.0, 500.0]}))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["analysis"]["average_heart_rate"], 90.0);
        assert_eq!(body["analysis"]["status"], "normal");

        // No data at all.
        let response = client
            .post(format!("http://{}/api/heart-data", addr))
            .json(&serde_json::json!({"heart_rate": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "NO_DATA");

        // Data entirely outside the plausible band.
        let response = client
            .post(format!("http://{}/api/heart-data", addr))
            .json(&serde_json::json!({"heart_rate": [5.0, 700.0]}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "NO_VALID_DATA");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_upload_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let (addr, shutdown_tx) = start_server(dir.path().join("observations.json")).await;

        let export = "# OpenSignals Text File Format\n\
                      # device: 98:D3:21:FC:8B:12\n\
                      0\t1\t0\t0\t0\t0\t72.5\n\
                      1\t1\t0\t0\t0\t0\t73.0\n\
                      2\t1\t0\t0\t0\t0\t900.0\n";

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/api/upload", addr))
            .body(export.to_string())
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body["heart_rate"],
            serde_json::json!([72.5, 73.0]),
            "out-of-band reading should be filtered"
        );
        assert_eq!(body["analysis"]["status"], "normal");

        // A malformed body is rejected with context.
        let response = client
            .post(format!("http://{}/api/upload", addr))
            .body("not\ttabular".to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "BAD_UPLOAD");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_observations_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let observations_path = dir.path().join("observations.json");
        let (addr, shutdown_tx) = start_server(observations_path.clone()).await;

        let client = reqwest::Client::new();

        // Nothing generated yet.
        let response = client
            .get(format!("http://{}/api/observations", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["code"], "OBSERVATIONS_UNAVAILABLE");

        // After a conversion the file is served verbatim.
        std::fs::write(
            &observations_path,
            r#"[{"resourceType": "Observation", "id": "0"}]"#,
        )
        .unwrap();

        let response = client
            .get(format!("http://{}/api/observations", addr))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body[0]["resourceType"], "Observation");
        assert_eq!(body[0]["id"], "0");

        let _ = shutdown_tx.send(());
    }
}
