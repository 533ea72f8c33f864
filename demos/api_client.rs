/// Example HTTP client demonstrating how to call the load board server API
///
/// Run the server first:
/// ```bash
/// LOADBOARD_API_KEY=demo-key FMCSA_API_KEY=your-webkey cargo run --bin server
/// ```
///
/// Then run this example:
/// ```bash
/// LOADBOARD_API_KEY=demo-key cargo run --example api_client
/// ```
use serde::Deserialize;

#[derive(Deserialize, Debug)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize, Debug)]
struct LoadSummary {
    load_id: String,
    origin: String,
    destination: String,
    equipment_type: String,
    loadboard_rate: f64,
}

#[derive(Deserialize, Debug)]
struct CarrierVerification {
    mc_number: String,
    is_eligible: bool,
    status: String,
    company_name: Option<String>,
    message: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let api_key = std::env::var("LOADBOARD_API_KEY").unwrap_or_else(|_| "demo-key".into());
    let auth = format!("ApiKey {}", api_key);

    let client = reqwest::Client::new();

    let health: HealthResponse = client
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;
    println!("Server {} ({})", health.status, health.version);

    let loads: Vec<LoadSummary> = client
        .get(format!("{}/api/v1/loads/search", base))
        .query(&[("origin", "Chicago"), ("equipment_type", "Dry Van"), ("max_results", "3")])
        .header("Authorization", &auth)
        .send()
        .await?
        .json()
        .await?;

    println!("\nChicago Dry Van loads:");
    for load in &loads {
        println!(
            "  {} | {} -> {} | {} | ${:.2}",
            load.load_id, load.origin, load.destination, load.equipment_type, load.loadboard_rate
        );
    }

    let verification = client
        .get(format!("{}/api/v1/verify-carrier/123456", base))
        .header("Authorization", &auth)
        .send()
        .await?;

    if verification.status().is_success() {
        let v: CarrierVerification = verification.json().await?;
        println!(
            "\nMC {}: {} (eligible: {}) {} - {}",
            v.mc_number,
            v.status,
            v.is_eligible,
            v.company_name.as_deref().unwrap_or("unknown"),
            v.message
        );
    } else {
        println!(
            "\nCarrier verification failed: {}",
            verification.status()
        );
    }

    Ok(())
}
