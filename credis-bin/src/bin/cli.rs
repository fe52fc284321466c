use clap::Parser;
use credis_lib::{Client, Config, DEFAULT_PORT};
use std::num::ParseIntError;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "credis-cli", version, author, about = "Issue Redis commands")]
struct CliCommand {
    #[arg(long, default_value = "127.0.0.1", env = "CREDIS_HOST")]
    host: String,

    #[arg(long, default_value_t = DEFAULT_PORT, env = "CREDIS_PORT")]
    port: u16,

    /// ACL username sent with `--password`.
    #[arg(long, env = "CREDIS_USER")]
    user: Option<String>,

    /// Sent with `AUTH` right after connecting.
    #[arg(long, env = "CREDIS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// `redis://[[user]:password@]host:port`; overrides `--host` and `--port`.
    #[arg(long, value_parser = Config::from_url)]
    url: Option<Config>,

    /// Connect timeout in milliseconds.
    #[arg(long, default_value = "5000", value_parser = duration_from)]
    connect_timeout: Duration,

    /// Per-reply read timeout in milliseconds. Waits forever when omitted.
    #[arg(long, value_parser = duration_from)]
    read_timeout: Option<Duration>,

    /// Command name followed by its arguments, e.g. `SET key value`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn duration_from(src: &str) -> Result<Duration, ParseIntError> {
    let ms = src.parse::<u64>()?;
    Ok(Duration::from_millis(ms))
}

impl CliCommand {
    fn config(&self) -> Config {
        let config = match &self.url {
            Some(config) => config.clone(),
            None => Config::new(&self.host, self.port),
        };

        let config = config
            .with_connect_timeout(self.connect_timeout)
            .with_read_timeout(self.read_timeout);

        match &self.password {
            Some(password) => config.with_credentials(self.user.clone(), password),
            None => config,
        }
    }
}

/// `flavor = "current_thread"` is used here to make CLI lighter instead of multi-threads.
#[tokio::main(flavor = "current_thread")]
async fn main() -> credis_lib::Result<()> {
    // Enable logging, filtered by `RUST_LOG`. Replies go to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()?;

    let cli = CliCommand::parse();
    let client = Client::connect(&cli.config()).await?;

    let (name, args) = cli
        .command
        .split_first()
        .ok_or("a command must be provided")?;

    match client.execute(name, args).await {
        Ok(reply) => println!("{reply}"),
        // A rejected command is an answer, not a failure of the tool.
        Err(err) if !err.is_fatal() => println!("(error) {err}"),
        Err(err) => return Err(err.into()),
    }

    client.close().await;

    Ok(())
}
