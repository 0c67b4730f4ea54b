use std::{net::SocketAddr, path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use wicket::{
    GatewayService, GracefulShutdown, HttpAuthVerifier, HttpClientAdapter, HttpHandler,
    build_router,
    config::{ConfigValidator, GatewayConfig, load_config},
    tracing_setup,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "gateway.yaml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "gateway.yaml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "gateway.yaml")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "gateway.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve(&config).await,
        None => serve(&args.config).await,
    }
}

async fn serve(config_path: &str) -> Result<()> {
    let config: GatewayConfig = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    tracing_setup::init_tracing(config.is_development())
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;
    tracing::info!(
        "Loaded configuration from {config_path} (environment: {})",
        config.environment
    );

    ConfigValidator::validate(&config).map_err(|e| eyre!("{e}"))?;

    let backend_timeout = config
        .backend_timeout_duration()
        .context("Invalid backend_timeout")?;
    let auth_timeout = config
        .auth
        .timeout_duration()
        .context("Invalid auth.timeout")?;

    let gateway_service = Arc::new(
        GatewayService::new(Arc::new(config)).context("Failed to build route table")?,
    );

    for route in gateway_service.routes().iter() {
        tracing::info!(
            "Configured route: {} {} -> {}{} (auth: {})",
            route.method,
            route.proxy_path,
            route.service_name,
            route.actual_path,
            if route.auth_required { "required" } else { "public" }
        );
    }

    let http_client = Arc::new(
        HttpClientAdapter::new(backend_timeout).context("Failed to create HTTP client adapter")?,
    );
    let auth_verifier = Arc::new(
        HttpAuthVerifier::new(gateway_service.auth_verify_url(), auth_timeout)
            .context("Failed to create auth verifier")?,
    );

    let addr = gateway_service.config().app_url();
    let http_handler = Arc::new(HttpHandler::new(
        gateway_service,
        http_client,
        auth_verifier,
    ));
    let app = build_router(http_handler);

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!("Wicket gateway listening on {}", addr);

    let shutdown = graceful_shutdown.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let reason = shutdown.wait_for_shutdown_signal().await;
        tracing::info!("Shutdown signal received: {:?}, draining connections", reason);
    })
    .await
    .context("Server error")?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = ConfigValidator::validate(&config) {
        eprintln!("❌ Configuration validation failed:");
        eprintln!("{e}");
        println!();
        println!("💡 Common fixes:");
        println!("   • Every route's service must be listed under 'services'");
        println!("   • proxy_path must start with '/' and may only end in '/*'");
        println!("   • Methods are uppercase verbs such as GET or POST");
        println!("   • Timeouts use units, e.g. '5s' or '1m'");
        std::process::exit(1);
    }

    let summary = (
        config.app_url(),
        config.environment.clone(),
        config.services.len(),
        config.routes.len(),
        config.routes.iter().filter(|r| !r.auth_required).count(),
    );
    match GatewayService::new(Arc::new(config)) {
        Ok(gateway) => {
            let (listen, environment, services, routes, public) = summary;
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {listen}");
            println!("   • Environment: {environment}");
            println!("   • Services: {services}");
            println!("   • Routes: {routes} ({public} public)");
            println!("   • Auth Endpoint: {}", gateway.auth_verify_url());
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Route table could not be built: {e}");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Wicket API Gateway Configuration
# APP_HOST, APP_PORT and ENV environment variables override the values below.

app_host: 0.0.0.0
app_port: 8080
environment: production
backend_timeout: 30s

# Service that answers POST {"jwt": "..."} with {"verified": true|false}
auth:
  service: auth-go
  verify_path: /verify
  timeout: 5s

services:
  auth-go:
    host: auth-go
    port: 3000
  email-service:
    host: email-service
    port: 3001

routes:
  # Public route: no credential check
  - proxy_path: /auth/api/v1/login
    service: auth-go
    actual_path: /login
    method: POST
    auth_required: false

  # Protected route (auth_required defaults to true)
  - proxy_path: /email/api/v1/send
    service: email-service
    actual_path: /api/v1/send
    method: POST

  # Prefix route: /email/files/a/b -> /files/a/b
  # - proxy_path: /email/files/*
  #   service: email-service
  #   actual_path: /files/*
  #   method: [GET, HEAD]
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'wicket serve --config {config_path}' to start the server");
    Ok(())
}
