use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};

use aero_conformance::backend::TcpConnector;
use aero_conformance::config::*;
use aero_conformance::corpus;
use aero_conformance::orchestrator::run_profile;
use aero_conformance::registry::Registry;
use aero_conformance::tools;
use aero_imap_client::{Client, ClientOptions};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    #[clap(short, long = "config", env = "AERO_CONFORMANCE_CONFIG")]
    /// TOML file replacing the built-in server profiles
    config_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append every message of a corpus and store the BODY and BODYSTRUCTURE answers
    Run(RunArgs),

    /// Print the server profiles in use
    Profiles,

    #[clap(subcommand)]
    /// Corpus preparation helpers
    Tools(ToolsCommand),
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// A profile identifier, or `all`
    target: String,

    /// Directory holding the messages
    corpus: PathBuf,

    #[clap(long, default_value = "eml")]
    extension: String,

    #[clap(long)]
    host: Option<String>,

    #[clap(long)]
    port: Option<u16>,

    #[clap(long)]
    user: Option<String>,

    #[clap(long, env = "AERO_CONFORMANCE_PASSWORD")]
    password: Option<String>,

    #[clap(long)]
    mailbox: Option<String>,

    #[clap(long, conflicts_with = "no-tls")]
    tls: bool,

    #[clap(long)]
    no_tls: bool,

    /// PEM bundle to verify server certificates, any certificate is accepted otherwise
    #[clap(long)]
    ca_file: Option<PathBuf>,

    /// Seconds to wait for a connection or a command
    #[clap(long, default_value = "30")]
    timeout: u64,
}

impl RunArgs {
    fn overrides(&self) -> Overrides {
        let transport = match (self.tls, self.no_tls) {
            (true, _) => Some(Transport::Tls),
            (_, true) => Some(Transport::Plain),
            _ => None,
        };
        Overrides {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            mailbox: self.mailbox.clone(),
            transport,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ToolsCommand {
    /// Write a .eml beside each .txt, without its EXPECTED STRUCTURE part
    StripExpected { dir: PathBuf },

    /// Convert a file from LF to CRLF line endings
    Unix2dos { file: PathBuf },

    /// Append every message of an mbox file to a mailbox
    MboxToImap {
        mbox: PathBuf,

        #[clap(short = 'H', long, default_value = "localhost")]
        host: String,

        #[clap(short, long, default_value = "143")]
        port: u16,

        #[clap(short, long)]
        user: String,

        #[clap(short = 's', long, env = "AERO_CONFORMANCE_PASSWORD")]
        password: String,

        #[clap(short, long, default_value = "INBOX")]
        mailbox: String,

        #[clap(short, long)]
        tls: bool,

        #[clap(long, default_value = "30")]
        timeout: u64,
    },
}

fn tracer() {
    tracing_subscriber::fmt::init();
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "aero_conformance=info,aero_imap_client=info")
    }

    // Abort on panic (same behavior as in Go)
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("{}", panic_info);
        eprintln!("{:?}", backtrace::Backtrace::new());
        std::process::abort();
    }));

    tracer();

    let args = Args::parse();

    match args.command {
        Command::Run(run) => {
            let registry = load_registry(args.config_file)?;
            conformance(registry, run).await
        }
        Command::Profiles => {
            let registry = load_registry(args.config_file)?;
            for p in registry.profiles() {
                println!(
                    "{}\t{}://{}:{}\tuser={}\tmailbox={}\tsuffix={}",
                    p.id, p.transport, p.host, p.port, p.user, p.mailbox, p.suffix
                );
            }
            Ok(())
        }
        Command::Tools(ToolsCommand::StripExpected { dir }) => {
            let written = tools::strip_expected(&dir).await?;
            tracing::info!(count = written.len(), "emails extracted");
            Ok(())
        }
        Command::Tools(ToolsCommand::Unix2dos { file }) => tools::unix2dos(&file).await,
        Command::Tools(ToolsCommand::MboxToImap {
            mbox,
            host,
            port,
            user,
            password,
            mailbox,
            tls,
            timeout,
        }) => {
            let content = tokio::fs::read(&mbox)
                .await
                .with_context(|| format!("unable to read {}", mbox.display()))?;
            let messages = tools::split_mbox(&content);

            let opts = ClientOptions {
                transport: if tls { Transport::Tls } else { Transport::Plain },
                host,
                port,
                ca_file: None,
                timeout: Duration::from_secs(timeout),
            };
            let mut client = Client::connect(&opts).await?;
            let accepted =
                tools::mbox_to_imap(&mut client, &user, &password, &mailbox, &messages).await?;
            tracing::info!(accepted=accepted, total=messages.len(), mailbox=%mailbox, "mbox imported");
            Ok(())
        }
    }
}

fn load_registry(config_file: Option<PathBuf>) -> Result<Registry> {
    match config_file {
        Some(path) => {
            let file: ProfileFile = read_config(path.clone())
                .with_context(|| format!("unable to load profiles from {}", path.display()))?;
            Ok(Registry::new(file.profiles)?)
        }
        None => Ok(Registry::builtin()?),
    }
}

async fn conformance(registry: Registry, run: RunArgs) -> Result<()> {
    // Nothing is contacted before the target and the corpus are known good
    let overrides = run.overrides();
    let profiles = registry
        .select(&run.target)?
        .into_iter()
        .map(|p| overrides.apply(p))
        .collect::<Vec<_>>();
    let messages = corpus::load(&run.corpus, &run.extension).await?;
    if messages.is_empty() {
        tracing::warn!(dir=%run.corpus.display(), ext=%run.extension, "no message found in corpus");
    }

    let connector = TcpConnector {
        ca_file: run.ca_file.clone(),
        timeout: Duration::from_secs(run.timeout),
    };

    let mut aborted = vec![];
    for profile in profiles.iter() {
        match run_profile(&connector, profile, &messages).await {
            Ok(report) => {
                for failure in report.failures.iter() {
                    tracing::info!(profile=%report.profile, failure=%failure, "failed message");
                }
            }
            Err(err) => {
                tracing::error!(profile=%profile.id, err=%err, "profile aborted");
                aborted.push(profile.id.clone());
            }
        }
    }

    if !aborted.is_empty() {
        bail!("{} profile(s) aborted: {}", aborted.len(), aborted.join(", "));
    }
    Ok(())
}
