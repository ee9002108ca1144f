use std::sync::Arc;

use interview_scout::config::AppConfig;
use interview_scout::pipeline::Orchestrator;
use interview_scout::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export ARCADE_API_KEY=... ARCADE_USER_ID=you@example.com");
        std::process::exit(1);
    });

    let once = std::env::args().nth(1).is_some_and(|arg| arg == "once");

    eprintln!("🔎 Interview Scout v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Mail tool: {}", config.mail.tool_name);
    if let Some(ref dir) = config.pipeline.output_dir {
        eprintln!("   Output: {}", dir.display());
    }

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);

    if once {
        match orchestrator.run().await? {
            Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
            None => {
                eprintln!("No interview emails found or research failed");
                std::process::exit(2);
            }
        }
        return Ok(());
    }

    let addr = config.server.bind_addr();
    eprintln!("   API: http://{addr}/interview-research\n");
    server::serve(orchestrator, &addr).await?;
    Ok(())
}
