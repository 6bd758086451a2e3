use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use clap::Parser;
use thumbsmith::config::ServiceConfig;
use thumbsmith::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thumbsmith")]
#[command(about = "HTTP thumbnail service: image in, inline JPEG thumbnail + EXIF tags out")]
#[command(long_about = "\
HTTP thumbnail service: image in, inline JPEG thumbnail + EXIF tags out

Exposes a single endpoint, /thumbnail (GET or POST), accepting:

  width     target width in pixels (optional, default 100)
  height    target height in pixels (optional, default 100)
  imageUrl  remote image to fetch
  image     multipart file upload (used when imageUrl is absent)

and responding with:

  { \"thumbnailUrl\": \"data:image/jpeg;base64,...\", \"metadata\": { ... } }

Uploaded images are kept in the uploads directory; URL-fetched images pass
through it temporarily and are removed when the request completes.")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind
    #[arg(long, default_value_t = 5002)]
    port: u16,

    /// Directory for uploaded and fetched images
    #[arg(long, default_value = "uploads")]
    uploads_dir: std::path::PathBuf,

    /// JPEG quality for generated thumbnails (1-100)
    #[arg(long, default_value_t = 85)]
    jpeg_quality: u8,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig {
        host: cli.host,
        port: cli.port,
        uploads_dir: cli.uploads_dir,
        jpeg_quality: cli.jpeg_quality.clamp(1, 100),
        ..ServiceConfig::default()
    };
    config.ensure_uploads_dir()?;

    let client = reqwest::Client::new();
    let bind_address = (config.host.clone(), config.port);
    info!(
        host = %config.host,
        port = config.port,
        uploads_dir = %config.uploads_dir.display(),
        "starting thumbnail service"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(client.clone()))
            // The endpoint is meant to be called straight from browsers
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .wrap(middleware::Logger::default())
            .configure(server::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
