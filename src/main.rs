use bitscrunch_metrics::cli::Args;
use bitscrunch_metrics::config::{FileSettings, Settings};
use bitscrunch_metrics::{Credential, Dispatcher, Result};

fn run(args: &Args) -> Result<()> {
    let file = FileSettings::discover(args.config.as_deref())?;
    let settings = Settings::resolve(file, args.overrides());

    let credential = Credential::load(&settings.key_path)?;
    tracing::debug!(
        "Loaded access key '{}' from {}",
        credential.name(),
        settings.key_path.display()
    );

    let dispatcher = Dispatcher::new(&settings.endpoint, &credential)?;
    let mut stdout = std::io::stdout().lock();
    let sent = dispatcher.run(settings.count, &mut stdout)?;
    tracing::info!("Completed {} requests to {}", sent, dispatcher.url());
    Ok(())
}

fn main() {
    let args = match Args::parse_normalized(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    // Logs go to stderr; stdout only carries response bodies
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
