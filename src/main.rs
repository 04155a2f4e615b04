use anyhow::Result;
use sprig::engine::core::EngineConfig;
use sprig::games::SandboxGame;
use sprig::EngineApp;

fn main() -> Result<()> {
    init_tracing();

    let config = match std::env::args_os().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let app = EngineApp::new(config, SandboxGame::new());
    app.run()
}

fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}
