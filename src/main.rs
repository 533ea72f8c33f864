use std::env;

use anyhow::Result;
use loadboard_rs::search::{self, SearchCriteria};
use loadboard_rs::store;
use loadboard_rs::types::EquipmentType;
use loadboard_rs::FmcsaClient;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!("  verify <mc_number>          Verify a carrier against FMCSA");
    eprintln!("                              (requires FMCSA_API_KEY)");
    eprintln!("  search [origin] [destination] [equipment] [max]");
    eprintln!("                              Search the local load board");
    eprintln!("                              (reads LOADS_FILE, default loads.json)");
    eprintln!("                              Use '-' to skip a filter");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    match args[1].as_str() {
        "verify" => {
            let mc_number = args.get(2).unwrap_or_else(|| usage(&args[0]));
            let web_key = env::var("FMCSA_API_KEY").unwrap_or_default();
            if web_key.is_empty() {
                eprintln!("Error: FMCSA_API_KEY is not set");
                std::process::exit(1);
            }

            let client = FmcsaClient::new(web_key)?;
            let record = client.verify(mc_number).await?;

            println!("MC {}: {}", record.mc_number, record.status);
            if let Some(name) = &record.company_name {
                println!("  Company: {}", name);
            }
            if let Some(status) = &record.operating_status {
                println!("  Operating status: {}", status);
            }
            if let Some(rating) = &record.safety_rating {
                println!("  Safety rating: {}", rating);
            }
            println!("  {}", record.message);
        }
        "search" => {
            let loads_file =
                env::var("LOADS_FILE").unwrap_or_else(|_| store::DEFAULT_LOADS_FILE.into());
            let loads = store::load_loads_from_file(&loads_file)?;

            // '-' means no filter for that position
            let arg_filter = |i: usize| {
                args.get(i)
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty() && *s != "-")
                    .map(|s| s.to_string())
            };

            let equipment = match arg_filter(4) {
                Some(s) => match s.parse::<EquipmentType>() {
                    Ok(e) => Some(e),
                    Err(_) => {
                        eprintln!(
                            "Unknown equipment type: {}. Expected Dry Van, Flatbed, or Reefer.",
                            s
                        );
                        std::process::exit(1);
                    }
                },
                None => None,
            };
            let max_results = args.get(5).and_then(|s| s.parse().ok());

            let criteria =
                SearchCriteria::new(arg_filter(2), arg_filter(3), equipment, max_results);
            let results = search::search(&criteria, &loads);

            println!("{} load(s) matched:", results.len());
            for load in &results {
                println!(
                    "  {} | {} -> {} | {} | ${:.2} | {} mi",
                    load.load_id,
                    load.origin,
                    load.destination,
                    load.equipment_type,
                    load.loadboard_rate,
                    load.miles
                );
            }
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            usage(&args[0]);
        }
    }

    Ok(())
}
