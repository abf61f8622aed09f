use career_assistant_lib::{config, host};

#[tokio::main]
async fn main() {
    career_assistant_lib::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let result = match host::HostOptions::parse(std::env::args().skip(1)) {
        Ok(options) => host::run(options).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Career assistant exited with an error");
        std::process::exit(1);
    }
}
