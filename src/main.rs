use outbound::cli::{Args, Commands, ConfigDiscovery, OutboundConfig};
use outbound::client::{HttpMethod, RequestSpec};
use outbound::integration::Integrations;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("outbound=info")
        .init();

    let args = Args::parse();

    match args.command {
        Some(Commands::Status { config }) => run_status(config).await,
        Some(Commands::Probe {
            service,
            path,
            method,
            body,
            deadline_ms,
            config,
        }) => run_probe(service, path, method, body, deadline_ms, config).await,
        Some(Commands::ShowConfig) => {
            ConfigDiscovery::show_discovery_info();
            Ok(())
        }
        None => {
            eprintln!("No command specified. Use 'outbound --help' to see available commands.");
            std::process::exit(1);
        }
    }
}

fn load_config(
    config_override: Option<PathBuf>,
) -> Result<OutboundConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_override {
        info!("Loading configuration override from: {:?}", path);
        let mut config = OutboundConfig::from_toml_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    } else {
        ConfigDiscovery::discover_config()
    }
}

async fn run_status(config_override: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_override)?;
    let integrations = Integrations::new(config.services)?;

    let status = integrations.system_status();
    if status.services.is_empty() {
        println!(
            "No services configured. Run 'outbound show-config' to see where configuration is read from."
        );
        return Ok(());
    }

    println!("\n📊 Outbound Client Status:");
    println!(
        "  Overall: {}",
        if status.healthy {
            "✅ Healthy"
        } else {
            "❌ Degraded"
        }
    );
    for report in &status.services {
        println!(
            "  {}: {} | queue {} | tokens {:.1}{}",
            report.health.service,
            if report.health.healthy {
                "✅ healthy"
            } else {
                "❌ circuit open"
            },
            report.queue.queue_length,
            report.queue.tokens,
            match &report.rate_limit {
                Some(info) => format!(" | upstream {}/{} remaining", info.remaining, info.limit),
                None => String::new(),
            }
        );
    }

    Ok(())
}

async fn run_probe(
    service: String,
    path: String,
    method: String,
    body: Option<String>,
    deadline_ms: Option<u64>,
    config_override: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_override)?;
    let integrations = Integrations::new(config.services)?;

    let Some(client) = integrations.client(&service) else {
        eprintln!(
            "Unknown service '{}'. Configured services: {:?}",
            service,
            integrations.services()
        );
        std::process::exit(1);
    };

    let method = parse_method(&method)?;
    let mut spec = RequestSpec::new(method, path);
    if let Some(body) = body {
        spec.body = Some(serde_json::from_str(&body)?);
    }
    if let Some(ms) = deadline_ms {
        spec = spec.with_deadline(Duration::from_millis(ms));
    }

    info!("Probing {} through the full pipeline", client.service());
    match client.request(spec).await {
        Ok(response) => {
            println!("✅ {} responded with {}", service, response.status);
            if !response.body.is_empty() {
                println!("{}", response.body);
            }
            Ok(())
        }
        Err(error) => {
            println!("❌ Probe failed: {}", error);
            std::process::exit(1);
        }
    }
}

fn parse_method(method: &str) -> Result<HttpMethod, Box<dyn std::error::Error>> {
    match method.to_uppercase().as_str() {
        "GET" => Ok(HttpMethod::Get),
        "POST" => Ok(HttpMethod::Post),
        "PUT" => Ok(HttpMethod::Put),
        "PATCH" => Ok(HttpMethod::Patch),
        "DELETE" => Ok(HttpMethod::Delete),
        other => Err(format!("unsupported HTTP method '{}'", other).into()),
    }
}
