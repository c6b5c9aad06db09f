/* demos/axum.rs */

use axum::{
    Router,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use clientip::{ClientIp, ClientIpLayer, ClientIpResolver, header};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let resolver = match ClientIpResolver::new().with_trusted_proxies(["127.0.0.1", "::1"]) {
        Ok(resolver) => Arc::new(resolver),
        Err(err) => {
            eprintln!("Invalid trusted proxies: {}", err);
            return;
        }
    };

    let app = create_app(resolver);
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();

    println!("Server starting on http://localhost:3000");
    println!("Test endpoints:");
    println!("  • GET  /ip        - JSON response with the resolved client IP");
    println!("  • GET  /cdn       - Same, preferring the CF-Connecting-IP header");
    println!("  • POST /trusted   - Replace trusted proxies (JSON array of IPs/CIDRs)");
    println!();
    println!("Test with headers:");
    println!("  curl -H 'X-Forwarded-For: 203.0.113.42' http://localhost:3000/ip");
    println!("  curl -H 'Forwarded: for=198.51.100.1' http://localhost:3000/ip");
    println!("  curl -H 'CF-Connecting-IP: 192.0.2.100' http://localhost:3000/cdn");
    println!("  curl -d '[\"10.0.0.0/8\"]' -H 'Content-Type: application/json' http://localhost:3000/trusted");
    println!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

fn create_app(resolver: Arc<ClientIpResolver>) -> Router {
    let default_router = Router::new()
        .route("/ip", get(ip_handler))
        .layer(ClientIpLayer::with_resolver(Arc::clone(&resolver)));

    let cdn_router = Router::new()
        .route("/", get(ip_handler))
        .layer(
            ClientIpLayer::with_resolver(Arc::clone(&resolver))
                .with_extra_header(header::CF_CONNECTING_IP),
        );

    let admin_router = Router::new()
        .route("/trusted", post(trusted_handler))
        .with_state(resolver);

    default_router
        .nest("/cdn", cdn_router)
        .merge(admin_router)
}

/// Handler that returns the resolved client IP in JSON format
async fn ip_handler(
    client_ip: ClientIp,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Json<serde_json::Value> {
    Json(json!({
        "client_ip": client_ip.as_str(),
        "known": !client_ip.is_unknown(),
        "ip_version": match client_ip.ip() {
            Some(std::net::IpAddr::V4(_)) => "IPv4",
            Some(std::net::IpAddr::V6(_)) => "IPv6",
            None => "unknown",
        },
        "peer": addr.to_string(),
    }))
}

/// Handler replacing the trusted proxy set
async fn trusted_handler(
    State(resolver): State<Arc<ClientIpResolver>>,
    Json(proxies): Json<Vec<String>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    resolver
        .set_trusted_proxies(&proxies)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    Ok(Json(json!({
        "trusted_proxies": resolver
            .trusted_proxies()
            .networks()
            .iter()
            .map(|network| network.to_string())
            .collect::<Vec<_>>(),
    })))
}
