use anyhow::Result;
use clap::{Parser, Subcommand};
use crosspost_common::NetworkKind;
use crosspost_common::observability::init_logging;
use crosspost_social::Registration;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod setup;

#[derive(Parser)]
#[command(name = "crosspost")]
#[command(about = "Register Mastodon and Misskey accounts and post to all of them at once", long_about = None)]
struct Cli {
    /// YAML config file (default: <config dir>/crosspost/crosspost.yaml, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Confirm an account with its instance and remember it
    Register {
        /// mastodon or misskey
        #[arg(long)]
        kind: NetworkKind,
        /// Instance host, e.g. mastodon.social
        #[arg(long)]
        instance: String,
        /// Required for Misskey; ignored by Mastodon
        #[arg(long, default_value = "")]
        username: String,
        /// Access token (Mastodon) or API key (Misskey)
        #[arg(long, env = "CROSSPOST_ACCESS_KEY", hide_env_values = true)]
        key: String,
    },
    /// List registered accounts without contacting any instance
    Accounts,
    /// Fetch the current profile of every registered account
    Profiles,
    /// Post to every registered account
    Post {
        /// Text to post; read from stdin when omitted or `-`
        text: Option<String>,
    },
    /// Interactive terminal form (default)
    Tui,
}

fn exit_code(all_ok: bool) -> ExitCode {
    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);
    let interactive = matches!(command, Command::Tui);

    let cfg = setup::load_config(cli.config.as_deref())?;
    let log_path = init_logging(setup::log_config(&cfg.logging, interactive)?)?;
    tracing::info!(log = %log_path.display(), version = ?cfg.version, "crosspost.start");

    let gateway = setup::gateway(&cfg);
    let mut store = setup::open_store(&cfg)?;
    let mut out = io::stdout().lock();

    let code = match command {
        Command::Register {
            kind,
            instance,
            username,
            key,
        } => {
            let registration = Registration::new(kind, instance, username, key);
            commands::register(&mut store, &gateway, registration, &mut out).await?;
            ExitCode::SUCCESS
        }
        Command::Accounts => {
            commands::accounts(store.sessions(), &mut out)?;
            ExitCode::SUCCESS
        }
        Command::Profiles => {
            exit_code(commands::profiles(&gateway, store.sessions(), &mut out).await?)
        }
        Command::Post { text } => {
            let text = commands::read_post_text(text, io::stdin().lock())?;
            exit_code(commands::post(&gateway, store.sessions(), &text, &mut out).await?)
        }
        Command::Tui => {
            drop(out);
            crosspost_tui::run_tui(store, gateway).await?;
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_command_means_tui() {
        let cli = Cli::try_parse_from(["crosspost"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn register_parses_kind_case_insensitively() {
        let cli = Cli::try_parse_from([
            "crosspost",
            "register",
            "--kind",
            "Misskey",
            "--instance",
            "misskey.io",
            "--username",
            "bob",
            "--key",
            "k",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Register { kind, username, .. }) => {
                assert_eq!(kind, NetworkKind::Misskey);
                assert_eq!(username, "bob");
            }
            _ => panic!("expected register"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let parsed = Cli::try_parse_from([
            "crosspost",
            "register",
            "--kind",
            "friendica",
            "--instance",
            "x",
            "--key",
            "k",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["crosspost", "post", "hello", "--config", "c.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.yaml")));
        assert!(matches!(cli.command, Some(Command::Post { text: Some(t) }) if t == "hello"));
    }
}
