// hortifruti-server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use hortifruti_server::config::{AppConfig, PaymentProviderKind};
use hortifruti_server::services::mercado_pago::MercadoPagoGateway;
use hortifruti_server::services::payment_gateway::PaymentGateway;
use hortifruti_server::services::payment_mock::MockPaymentGateway;
use hortifruti_server::state::AppState;
use hortifruti_server::store::{MemoryStore, PgStore, Store};
use hortifruti_server::{seed, web};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` filters, `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
  let builder = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE);
  let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();

  tracing::info!("Starting Hortifruti Digital server...");

  let app_config = AppConfig::from_env().context("failed to load configuration")?;
  tracing::info!(config = ?app_config, "Configuration loaded.");

  let store: Arc<dyn Store> = match &app_config.database_url {
    Some(url) => {
      let pg = PgStore::connect(url).await.context("failed to connect to the database")?;
      tracing::info!("Connected to PostgreSQL.");
      if app_config.run_migrations {
        pg.migrate().await.context("failed to run migrations")?;
        tracing::info!("Migrations applied.");
      }
      if app_config.seed_catalog {
        tracing::warn!("SEED_CATALOG is ignored with a database; seed it through migrations instead.");
      }
      Arc::new(pg)
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using the in-memory store. Data is lost on restart.");
      let memory = MemoryStore::new();
      if app_config.seed_catalog {
        seed::seed_catalog(&memory).await.context("failed to seed the demo catalog")?;
      }
      Arc::new(memory)
    }
  };

  let gateway: Arc<dyn PaymentGateway> = match app_config.payment_provider {
    PaymentProviderKind::MercadoPago => {
      Arc::new(MercadoPagoGateway::new(&app_config).context("failed to build the payment provider client")?)
    }
    PaymentProviderKind::Mock => {
      tracing::warn!("Using the mock payment provider.");
      Arc::new(MockPaymentGateway::new())
    }
  };
  if !gateway.is_configured() {
    tracing::warn!(provider = gateway.name(), "Payment provider has no access token; PIX endpoints will fail closed.");
  }

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::new(app_config, store, gateway);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("failed to bind {}", server_address))?
  .run()
  .await?;

  Ok(())
}
