//! `nashprobe`: normalize model replies from files (or stdin) into JSON.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use env_flags::env_flags;
use once_cell::sync::OnceCell;
use serde_json::json;
use tokio::io::AsyncReadExt as _;
use tracing_subscriber::Layer as _;
use tracing_subscriber::Registry;
use tracing_subscriber::fmt::MakeWriter;

use nashprobe::config::{LoggingCfg, UserConfig, expand_home, load_user_config};
use nashprobe::normalize;
use nashprobe::provider::default::default_base_url;
use nashprobe::provider::{HttpProvider, Prompt, ProviderId, ReplyClient};

const USAGE: &str = "\
usage:
  nashprobe [FILE...]                        normalize each file (stdin if none), one JSON mapping per line
  nashprobe --providers                      resolved provider settings (keys redacted)
  nashprobe --ask PROVIDER [--system FILE] [FILE]
                                             send FILE (or stdin) as the user prompt and normalize the reply
  nashprobe --help";

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Providers,
    Normalize {
        files: Vec<String>,
    },
    Ask {
        provider: ProviderId,
        system: Option<String>,
        user: Option<String>,
    },
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut files = Vec::new();
    let mut ask = None;
    let mut system = None;
    let mut providers = false;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--providers" => providers = true,
            "--ask" => {
                let name = it.next().context("--ask needs a provider name")?;
                ask = Some(name.parse::<ProviderId>()?);
            }
            "--system" => {
                system = Some(it.next().context("--system needs a file")?.clone());
            }
            flag if flag.starts_with("--") => {
                anyhow::bail!("unknown option '{flag}'\n{USAGE}");
            }
            _ => files.push(arg.clone()),
        }
    }

    if providers {
        if ask.is_some() || !files.is_empty() {
            anyhow::bail!("--providers takes no other arguments\n{USAGE}");
        }
        return Ok(Command::Providers);
    }
    match ask {
        Some(provider) => {
            if files.len() > 1 {
                anyhow::bail!("--ask takes at most one prompt file\n{USAGE}");
            }
            Ok(Command::Ask {
                provider,
                system,
                user: files.pop(),
            })
        }
        None if system.is_some() => anyhow::bail!("--system requires --ask\n{USAGE}"),
        None => Ok(Command::Normalize { files }),
    }
}

#[derive(Debug, Clone, Copy)]
enum LogStyle {
    Json,
    Compact,
    Pretty,
    Full,
}

type BoxedLayer = Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(writer: W, style: LogStyle, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(writer);
    match style {
        LogStyle::Json => base.json().boxed(),
        LogStyle::Compact => base.compact().boxed(),
        LogStyle::Pretty => base.pretty().boxed(),
        LogStyle::Full => base.boxed(),
    }
}

fn init_tracing(home: &Path, logging: Option<&LoggingCfg>) {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Preferred filter env (alias). If set, overrides RUST_LOG.
        TRACING_FILTER: &str = "";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true).
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
        /// If true, also log to file under <NASHPROBE_HOME>/logs or LOG_DIR
        LOG_TO_FILE: bool = false;
        /// Optional explicit log directory (absolute). Defaults to <NASHPROBE_HOME>/logs
        LOG_DIR: &str = "";
    }

    use tracing_subscriber::{EnvFilter, prelude::*};

    let env_set = |k: &str| std::env::var_os(k).is_some();

    let mut level = if !(*TRACING_FILTER).is_empty() {
        (*TRACING_FILTER).to_string()
    } else {
        (*RUST_LOG).to_string()
    };
    let mut json = *TRACING_JSON;
    let mut compact = *TRACING_COMPACT;
    let mut pretty = *TRACING_PRETTY;
    let mut to_file = *LOG_TO_FILE;
    let mut log_dir: Option<PathBuf> = if !(*LOG_DIR).is_empty() {
        Some(PathBuf::from((*LOG_DIR).to_string()))
    } else {
        None
    };

    // Env wins; config fills in what env leaves unset.
    if let Some(cfg) = logging {
        if !(env_set("TRACING_FILTER") || env_set("RUST_LOG"))
            && let Some(l) = cfg.level.as_ref()
        {
            level = l.clone();
        }
        if !env_set("TRACING_JSON")
            && let Some(v) = cfg.json
        {
            json = v;
        }
        if !env_set("TRACING_COMPACT")
            && let Some(v) = cfg.compact
        {
            compact = v;
        }
        if !env_set("TRACING_PRETTY")
            && let Some(v) = cfg.pretty
        {
            pretty = v;
        }
        if !env_set("LOG_TO_FILE")
            && let Some(v) = cfg.to_file
        {
            to_file = v;
        }
        if !env_set("LOG_DIR")
            && let Some(dir) = cfg.dir.as_ref()
        {
            log_dir = Some(expand_home(dir));
        }
    }

    let style = if json {
        LogStyle::Json
    } else if compact {
        LogStyle::Compact
    } else if pretty {
        LogStyle::Pretty
    } else {
        LogStyle::Full
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
    // Stderr only: stdout carries the normalized JSON.
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(std::io::stderr, style, true)];
    let mut dir_error = None;
    if to_file {
        let dir = log_dir.unwrap_or_else(|| home.join("logs"));
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&dir, "nashprobe.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                layers.push(fmt_layer(nb, style, false));
            }
            Err(e) => dir_error = Some((dir, e)),
        }
    }

    if let Err(e) = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
    {
        tracing::debug!("tracing already set: {:?}", e);
    }
    if let Some((dir, e)) = dir_error {
        tracing::warn!("failed to create log dir {}: {}", dir.display(), e);
    }
}

fn resolve_home(explicit: &str) -> PathBuf {
    if !explicit.is_empty() {
        return expand_home(explicit);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".nashprobe");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".nashprobe")
}

fn print_json(value: &impl serde::Serialize, pretty: bool) -> anyhow::Result<()> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{s}");
    Ok(())
}

fn print_providers(cfg: &UserConfig, pretty: bool) -> anyhow::Result<()> {
    for id in ProviderId::ALL {
        let s = cfg.provider_settings(id);
        let key_state = if s.api_key.is_some() { "<set>" } else { "<missing>" };
        let value = json!({
            "provider": s.id,
            "model": s.model,
            "base_url": s.base_url.as_deref().unwrap_or(default_base_url(id)),
            "temperature": s.temperature,
            "max_output_tokens": s.max_output_tokens,
            "api_key": key_state,
        });
        print_json(&value, pretty)?;
    }
    Ok(())
}

async fn read_input(path: Option<&str>) -> anyhow::Result<String> {
    match path {
        Some(p) => {
            let path = expand_home(p);
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

async fn ask(
    cfg: &UserConfig,
    id: ProviderId,
    system: Option<&str>,
    user: Option<&str>,
    pretty: bool,
) -> anyhow::Result<()> {
    let system = match system {
        Some(path) => read_input(Some(path)).await?,
        None => String::new(),
    };
    let user = read_input(user).await?;
    let client = ReplyClient::new(HttpProvider::new(cfg.provider_settings(id))?);
    let reply = client.ask(&Prompt::new(system, user)).await?;
    print_json(&reply, pretty)
}

async fn normalize_files(files: &[String], pretty: bool) -> anyhow::Result<()> {
    if files.is_empty() {
        let input = read_input(None).await?;
        let reply = normalize(&input);
        tracing::info!("stdin: origin={:?}", reply.origin());
        return print_json(&reply, pretty);
    }

    let mut fallbacks = 0usize;
    let mut skipped = 0usize;
    for arg in files {
        let content = match read_input(Some(arg.as_str())).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", arg, e);
                skipped += 1;
                continue;
            }
        };
        let reply = normalize(&content);
        if reply.is_fallback() {
            fallbacks += 1;
        }
        tracing::debug!("{}: origin={:?}", arg, reply.origin());
        print_json(&reply, pretty)?;
    }
    tracing::info!(
        "normalized {} inputs ({} unparsed, {} skipped)",
        files.len() - skipped,
        fallbacks,
        skipped
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_flags! {
        /// nashprobe home directory (absolute). Defaults to $HOME/.nashprobe
        NASHPROBE_HOME: &str = "";
        /// Pretty-print JSON output instead of one mapping per line
        NORMALIZE_PRETTY: bool = false;
    }

    let home = resolve_home(*NASHPROBE_HOME);
    let (user_cfg, cfg_error) = match load_user_config(&home) {
        Ok(cfg) => (cfg.unwrap_or_default(), None),
        Err(e) => (UserConfig::default(), Some(e)),
    };
    init_tracing(&home, user_cfg.logging.as_ref());
    if let Some(e) = cfg_error {
        tracing::warn!("ignoring user config: {:#}", e);
    }
    tracing::debug!("nashprobe_home={}", home.display());

    let pretty = *NORMALIZE_PRETTY;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match parse_args(&args)? {
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Command::Providers => print_providers(&user_cfg, pretty),
        Command::Normalize { files } => normalize_files(&files, pretty).await,
        Command::Ask {
            provider,
            system,
            user,
        } => ask(&user_cfg, provider, system.as_deref(), user.as_deref(), pretty).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_arguments_are_files() {
        assert_eq!(
            parse_args(&args(&["a.txt", "b.json"])).expect("parse"),
            Command::Normalize {
                files: args(&["a.txt", "b.json"])
            }
        );
        assert_eq!(
            parse_args(&[]).expect("parse"),
            Command::Normalize { files: vec![] }
        );
    }

    #[test]
    fn unknown_flags_are_rejected_with_usage() {
        let err = parse_args(&args(&["--verbose", "a.txt"])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown option '--verbose'"), "{msg}");
        assert!(msg.contains("usage:"), "{msg}");
    }

    #[test]
    fn help_and_providers_flags() {
        assert_eq!(parse_args(&args(&["--help"])).expect("parse"), Command::Help);
        assert_eq!(parse_args(&args(&["-h", "x"])).expect("parse"), Command::Help);
        assert_eq!(
            parse_args(&args(&["--providers"])).expect("parse"),
            Command::Providers
        );
        assert!(parse_args(&args(&["--providers", "a.txt"])).is_err());
    }

    #[test]
    fn ask_resolves_provider_alias() {
        assert_eq!(
            parse_args(&args(&["--ask", "claude", "--system", "sys.txt", "user.txt"]))
                .expect("parse"),
            Command::Ask {
                provider: ProviderId::Anthropic,
                system: Some("sys.txt".to_string()),
                user: Some("user.txt".to_string()),
            }
        );
        assert!(parse_args(&args(&["--ask"])).is_err());
        assert!(parse_args(&args(&["--ask", "llama"])).is_err());
        assert!(parse_args(&args(&["--system", "sys.txt"])).is_err());
    }
}
