use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "hub-cli")]
#[command(about = "Management CLI for the Environmental Telemetry Hub", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check hub liveness and poll status
    Status,
    /// Show the latest reading, alerts, and thresholds
    Latest,
    /// Print the time series for one field
    Series {
        field: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Dump the raw sample snapshot
    Samples {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// List dates with recorded history
    Dates,
    /// Download a day's samples as CSV
    Export {
        /// Date partition (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Trigger a poll cycle now
    Refresh,
    /// Clear today's samples
    Reset,
    /// Read or replace the alert thresholds
    Thresholds {
        #[command(subcommand)]
        command: ThresholdCommands,
    },
}

#[derive(Subcommand)]
enum ThresholdCommands {
    /// Show the current limits
    Get,
    /// Replace the limits (omitted fields stop alerting)
    Set {
        #[arg(long)]
        temp: Option<f64>,
        #[arg(long)]
        hum: Option<f64>,
        #[arg(long)]
        aqi: Option<f64>,
        #[arg(long)]
        gas: Option<f64>,
        #[arg(long)]
        noise: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/healthz", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Latest => {
            let res = client
                .get(format!("{}/api/latest", cli.url))
                .send()
                .await?;
            print_latest(res).await?;
        }
        Commands::Series { field, limit } => {
            let mut req = client.get(format!("{}/api/series/{}", cli.url, field));
            if let Some(limit) = limit {
                req = req.query(&[("limit", limit)]);
            }
            print_response(req.send().await?).await?;
        }
        Commands::Samples { limit } => {
            let mut req = client.get(format!("{}/api/samples", cli.url));
            if let Some(limit) = limit {
                req = req.query(&[("limit", limit)]);
            }
            print_response(req.send().await?).await?;
        }
        Commands::Dates => {
            let res = client
                .get(format!("{}/api/history/dates", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Export { date, output } => {
            let url = match &date {
                Some(date) => format!("{}/api/export/{}", cli.url, date),
                None => format!("{}/api/export", cli.url),
            };
            let res = client.get(url).send().await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: hub returned status {}", status);
                if let Ok(text) = res.text().await {
                    eprintln!("Response: {}", text);
                }
                return Ok(());
            }
            let csv = res.text().await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &csv).await?;
                    println!("Saved {} bytes to {}", csv.len(), path);
                }
                None => print!("{}", csv),
            }
        }
        Commands::Refresh => {
            let res = client
                .post(format!("{}/api/refresh", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reset => {
            let res = client
                .post(format!("{}/api/reset", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Thresholds { command } => match command {
            ThresholdCommands::Get => {
                let res = client
                    .get(format!("{}/api/thresholds", cli.url))
                    .send()
                    .await?;
                print_response(res).await?;
            }
            ThresholdCommands::Set {
                temp,
                hum,
                aqi,
                gas,
                noise,
            } => {
                let body = json!({
                    "temp": temp,
                    "hum": hum,
                    "aqi": aqi,
                    "gas": gas,
                    "noise": noise,
                });
                let res = client
                    .put(format!("{}/api/thresholds", cli.url))
                    .json(&body)
                    .send()
                    .await?;
                print_response(res).await?;
            }
        },
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: hub returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Render the latest reading the way the dashboard's metric cards do,
/// with "--" standing in for anything the sample does not carry.
async fn print_latest(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: hub returned status {}", status);
        return Ok(());
    }

    let body: Value = res.json().await?;
    let Some(latest) = body.get("latest").filter(|v| !v.is_null()) else {
        println!("No sensor data yet.");
        return Ok(());
    };

    let labels = [
        ("temp", "Temperature (°C)"),
        ("hum", "Humidity (%)"),
        ("aqi", "AQI"),
        ("gas", "Gas (%)"),
        ("noise", "Noise (dB)"),
        ("value", "Value"),
    ];
    let reading = |field: &str| -> String {
        latest["readings"]
            .as_array()
            .and_then(|readings| {
                readings
                    .iter()
                    .find(|r| r["field"] == field)
                    .and_then(|r| r["value"].as_f64())
            })
            .map(|v| v.to_string())
            .unwrap_or_else(|| "--".to_string())
    };

    println!("Time:    {}", latest["timestamp"].as_str().unwrap_or("--"));
    for (field, label) in labels {
        println!("{:<17} {}", format!("{}:", label), reading(field));
    }
    println!("Status:  {}", latest["status"].as_str().unwrap_or("No status"));
    println!("Action:  {}", latest["action"].as_str().unwrap_or("N/A"));

    if let Some(alerts) = body["alerts"].as_array() {
        if !alerts.is_empty() {
            println!("Alerts:");
            for alert in alerts {
                println!(
                    "  {} {} > {}",
                    alert["field"].as_str().unwrap_or("?"),
                    alert["value"],
                    alert["limit"]
                );
            }
        }
    }

    Ok(())
}
