//! Simple HTTP GET through the forced resolver.
//!
//! Usage: `cargo run --example simple_get -- [URL]`
//!
//! Upstream servers come from `FORCEDNS_SERVERS` (comma-separated), falling
//! back to Google Public DNS. Certificate verification is disabled.

use forcedns::dns::ResolverConfig;
use forcedns::Client;
use http_body_util::BodyExt;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://www.ssllabs.com".to_string());

    let config = ResolverConfig::from_env()?;
    println!("Upstream DNS: {:?}", config.servers());

    let client = Client::builder()
        .resolver_config(config)
        .timeout(Duration::from_secs(5))
        .build()?;

    println!("Fetching {}...", url);
    let response = client.get(&url).send().await?;
    println!("Status: {}", response.status());
    println!("Headers:");
    for (name, value) in response.headers() {
        println!("  {}: {:?}", name, value);
    }

    let body = response.into_body().collect().await?.to_bytes();
    println!("Body: {} bytes", body.len());
    println!("{}", String::from_utf8_lossy(&body[..body.len().min(512)]));

    Ok(())
}
