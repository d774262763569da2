use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use signatom_relay_client::{RelayClient, Step};

#[derive(Debug, Clone, ValueEnum)]
enum Command {
    GenerateKey,
    Sign,
    Verify,
    KeylessSign,
    KeylessVerify,
    /// generate-key, sign, verify
    KeyFlow,
    /// keyless-sign, keyless-verify
    KeylessFlow,
}

impl Command {
    fn steps(&self) -> &'static [Step] {
        match self {
            Command::GenerateKey => &[Step::GenerateKey],
            Command::Sign => &[Step::SignWithKey],
            Command::Verify => &[Step::VerifyWithKey],
            Command::KeylessSign => &[Step::KeylessSign],
            Command::KeylessVerify => &[Step::KeylessVerify],
            Command::KeyFlow => &Step::KEY_FLOW,
            Command::KeylessFlow => &Step::KEYLESS_FLOW,
        }
    }
}

#[derive(Parser)]
struct Args {
    #[clap(long, default_value = "127.0.0.1")]
    host: String,
    #[clap(long, default_value = "8080")]
    port: u16,
    #[clap(long, env = "RELAY_CLIENT_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,
    #[clap(value_enum)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let client = RelayClient::new(
        format!("http://{}:{}", args.host, args.port),
        Duration::from_secs(args.timeout_secs),
    )?;

    let outcomes = client.run_sequence(args.command.steps()).await?;
    for outcome in &outcomes {
        println!("{:?} {} {}", outcome.step, outcome.status, outcome.body);
    }

    let ok = outcomes.iter().all(|outcome| outcome.is_success());
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
