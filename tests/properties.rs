/// Property tests for the conversion engine and config rendering, plus the
/// health aggregation contract against a real listener.
use proptest::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

use timonel::config::HealthEndpoint;
use timonel::health::HealthProber;
use timonel::proxy::ReverseProxyConfig;
use timonel::ModuleConverter;

fn identifier() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9]{0,6}").unwrap()
}

/// One convertible source line.
fn source_line() -> impl Strategy<Value = String> {
    prop_oneof![
        identifier().prop_map(|n| format!("import {n} from \"{n}\";")),
        identifier().prop_map(|n| format!("import {{ {n} }} from \"mod\";")),
        identifier().prop_map(|n| format!("import * as {n} from \"mod\";")),
        identifier().prop_map(|n| format!("export const {n} = 1;")),
        identifier().prop_map(|n| format!("export default {n};")),
        identifier().prop_map(|n| format!("export function {n}() {{ return 1; }}")),
        identifier().prop_map(|n| format!("const {n} = import.meta.env.VITE_URL;")),
        identifier().prop_map(|n| format!("{n}();")),
        Just("console.log(import.meta.env.MODE);".to_string()),
    ]
}

proptest! {
    /// transform(transform(t)) == transform(t): the second pass finds no
    /// dialect indicators and returns the text unchanged.
    #[test]
    fn conversion_is_idempotent(lines in prop::collection::vec(source_line(), 1..10)) {
        let text = lines.join("\n");
        let converter = ModuleConverter::default();

        let first = converter.convert("gen.js", &text);
        prop_assert!(first.report.passed(), "violations: {:?}", first.report.violations);

        let second = converter.convert("gen.js", &first.text);
        prop_assert!(!second.report.converted);
        prop_assert_eq!(second.text, first.text);
    }

    /// Field-for-field equal configs render byte-identical text.
    #[test]
    fn config_rendering_is_deterministic(
        port in 1u16..,
        name in "[a-z]{3,12}",
        production in any::<bool>(),
        gzip in any::<bool>(),
    ) {
        let make = || ReverseProxyConfig {
            server_names: vec![format!("{name}.example.com")],
            listen_port: port,
            document_root: PathBuf::from("/srv/dist/frontend"),
            index_file: "index.html".to_string(),
            backend_upstream: "http://127.0.0.1:3000".to_string(),
            frontend_upstream: "http://127.0.0.1:5173".to_string(),
            gzip,
            security_headers: true,
            static_caching: true,
            proxy_api: true,
            production,
            tls: None,
        };

        let a = make();
        let b = make();
        prop_assert_eq!(a.render(), a.render());
        prop_assert_eq!(a.render(), b.render());
    }
}

/// Minimal HTTP responder used to get genuinely healthy probes.
async fn spawn_ok_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                use tokio::io::{AsyncReadExt, AsyncWriteExt};
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                    .await;
            });
        }
    });
    format!("http://{addr}")
}

/// Listener that accepts connections but never answers, to force probe
/// timeouts.
async fn spawn_stalling_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_health_aggregation_mixed_results() {
    let base_a = spawn_ok_server().await;
    let base_b = spawn_ok_server().await;
    let base_slow = spawn_stalling_server().await;

    let endpoints = vec![
        HealthEndpoint {
            name: "a".to_string(),
            url: format!("{base_a}/health"),
        },
        HealthEndpoint {
            name: "b".to_string(),
            url: format!("{base_b}/health"),
        },
        HealthEndpoint {
            name: "slow".to_string(),
            url: format!("{base_slow}/health"),
        },
    ];

    let prober = HealthProber::new(Duration::from_millis(500));
    let results = prober.probe_all(&endpoints).await;

    // Exactly one entry per requested endpoint, in order; the stalled
    // endpoint is reported as a timeout rather than raising
    assert_eq!(results.len(), 3);
    assert!(results[0].healthy);
    assert!(results[1].healthy);
    assert!(!results[2].healthy);
    assert_eq!(results[2].detail.as_deref(), Some("timed out"));
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_connection_detail() {
    let prober = HealthProber::new(Duration::from_secs(2));
    let endpoints = vec![HealthEndpoint {
        name: "dead".to_string(),
        url: "http://127.0.0.1:1/health".to_string(),
    }];

    let results = prober.probe_all(&endpoints).await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].healthy);
    assert_ne!(results[0].detail.as_deref(), Some("timed out"));
    assert!(results[0].detail.is_some());
}
