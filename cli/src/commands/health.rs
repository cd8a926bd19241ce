use anyhow::Result;
use colored::*;
use serde_json::json;

/// Execute the health check command
pub async fn execute(url: String, format: String) -> Result<()> {
    let health_status = check_server_health(&url).await;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&health_status)?);
        }
        _ => {
            print_health_status_text(&health_status);
        }
    }

    Ok(())
}

/// Ask the server for its health report
async fn check_server_health(base_url: &str) -> serde_json::Value {
    let endpoint = format!("{}/api/v1/health", base_url.trim_end_matches('/'));
    let mut status = json!({
        "status": "offline",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "endpoint": base_url,
        "components": {}
    });

    let response = match reqwest::get(&endpoint).await {
        Ok(response) => response,
        Err(_) => {
            status["components"]["api"] = json!({
                "status": "offline",
                "message": "API server is not running or not reachable"
            });
            return status;
        }
    };

    if !response.status().is_success() {
        status["status"] = json!("unhealthy");
        status["components"]["api"] = json!({
            "status": "unhealthy",
            "message": format!("API server returned status: {}", response.status())
        });
        return status;
    }

    let report: serde_json::Value = match response.json().await {
        Ok(report) => report,
        Err(e) => {
            status["status"] = json!("unhealthy");
            status["components"]["api"] = json!({
                "status": "unhealthy",
                "message": format!("Unreadable health report: {}", e)
            });
            return status;
        }
    };

    status["components"]["api"] = json!({
        "status": "healthy",
        "message": format!(
            "API server {} is running",
            report["version"].as_str().unwrap_or("unknown")
        )
    });
    let connected = report["database"]["connected"].as_bool().unwrap_or(false);
    status["components"]["database"] = json!({
        "status": if connected { "healthy" } else { "unhealthy" },
        "message": report["database"]["message"].clone()
    });
    status["status"] = report["status"].clone();

    status
}

/// Print health status in a formatted text output
fn print_health_status_text(status: &serde_json::Value) {
    println!("{}", "=== Inkpress Health Check ===".bold());
    println!();

    let overall_status = status["status"].as_str().unwrap_or("unknown");
    let status_display = match overall_status {
        "healthy" => "HEALTHY".green().bold(),
        "degraded" => "DEGRADED".yellow().bold(),
        "unhealthy" => "UNHEALTHY".red().bold(),
        "offline" => "OFFLINE".white().bold(),
        _ => "UNKNOWN".white().bold(),
    };

    println!("Overall Status: {}", status_display);
    println!("Endpoint: {}", status["endpoint"].as_str().unwrap_or(""));
    println!("Timestamp: {}", status["timestamp"].as_str().unwrap_or(""));
    println!();

    println!("{}", "Components:".bold());
    println!("{}", "-".repeat(50));

    if let Some(components) = status["components"].as_object() {
        for (name, component) in components {
            let comp_status = component["status"].as_str().unwrap_or("unknown");
            let status_icon = match comp_status {
                "healthy" => "✓".green(),
                "unhealthy" => "✗".red(),
                "offline" => "○".white(),
                _ => "?".white(),
            };

            println!("{} {} ({})", status_icon, name.to_uppercase().bold(), comp_status);
            if let Some(message) = component["message"].as_str() {
                println!("  {}", message);
            }
            println!();
        }
    }
}
