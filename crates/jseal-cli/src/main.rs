//! jseal: inspect and maintain documents with sealed fields
//!
//! Commands:
//!   inspect <file>             - list sealed blocks (JSON pointer, mode, size)
//!   verify <file>              - open every block; exit status 2 on a wrong passphrase
//!   open <file> [-o <out>]     - write the document with every block opened
//!   seal <file> -p <pointer>   - seal plaintext values in place
//!   rekey <file>               - re-seal every keyed block under a new passphrase
//!   config show                - display current configuration

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::{alphabet, Engine};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use zeroize::Zeroizing;

use jseal_codec::fs::write_atomic;
use jseal_codec::{
    format, tree, CipherContext, CodecError, EnvKey, Format, KeySource, ModeRegistry, Options, Value,
};
use jseal_core::config::JsealConfig;

/// Standard alphabet, padding optional
const SALT_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Exit status for "wrong passphrase or corrupted ciphertext"
const EXIT_WRONG_PASSPHRASE: u8 = 2;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "jseal",
    version,
    about = "Inspect and maintain JSON/YAML documents with sealed fields",
    long_about = "jseal: list, verify, open, seal and re-key the encrypted blocks \
                  embedded in JSON or YAML documents"
)]
struct Cli {
    /// Path to jseal.toml configuration file
    #[arg(long, short = 'c', env = "JSEAL_CONFIG", default_value = "jseal.toml")]
    config: PathBuf,

    /// Document format (default: file extension, then codec.format from config)
    #[arg(long, short = 'f', global = true)]
    format: Option<Format>,

    /// Log filter, overriding JSEAL_LOG and log.level (e.g. "debug")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the sealed blocks in a document
    Inspect {
        file: PathBuf,
    },

    /// Open every block without writing anything
    Verify {
        file: PathBuf,
    },

    /// Write the document with every block replaced by its plaintext
    Open {
        file: PathBuf,
        /// Output file (default: stdout). Written owner-only.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Seal plaintext values in place
    Seal {
        file: PathBuf,
        /// JSON pointer of a value to seal (repeatable), e.g. /creds/password
        #[arg(long = "pointer", short = 'p', required = true)]
        pointers: Vec<String>,
        /// Encryption mode for the new blocks
        #[arg(long, default_value = jseal_codec::AES_MODE)]
        mode: String,
    },

    /// Re-seal every keyed block under a new passphrase
    Rekey {
        file: PathBuf,
        /// Environment variable holding the new passphrase
        #[arg(long, default_value = "JSEAL_NEW_PASSPHRASE")]
        new_env: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match JsealConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(cli.log_level.as_deref(), &config);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

fn run(cli: Cli, config: &JsealConfig) -> Result<()> {
    let format_flag = cli.format;

    match cli.command {
        Commands::Inspect { file } => cmd_inspect(&file, resolve_format(&file, format_flag, config)),
        Commands::Verify { file } => {
            cmd_verify(config, &file, resolve_format(&file, format_flag, config))
        }
        Commands::Open { file, output } => cmd_open(
            config,
            &file,
            resolve_format(&file, format_flag, config),
            output.as_deref(),
        ),
        Commands::Seal { file, pointers, mode } => cmd_seal(
            config,
            &file,
            resolve_format(&file, format_flag, config),
            &pointers,
            &mode,
        ),
        Commands::Rekey { file, new_env } => cmd_rekey(
            config,
            &file,
            resolve_format(&file, format_flag, config),
            &new_env,
        ),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(config, &cli.config),
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CodecError>() {
        Some(e) if e.is_wrong_passphrase() => EXIT_WRONG_PASSPHRASE,
        _ => 1,
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// Filter precedence: `--log-level`, then `JSEAL_LOG`, then `log.level`.
fn init_logging(flag: Option<&str>, config: &JsealConfig) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = match flag {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env("JSEAL_LOG")
            .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.log.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

// ── Passphrases and options ───────────────────────────────────────────────────

/// Reads a passphrase from an environment variable, falling back to a
/// terminal prompt when allowed.
struct Passphrase {
    env: EnvKey,
    prompt: Option<&'static str>,
    confirm: bool,
}

impl Passphrase {
    fn current(config: &JsealConfig) -> Self {
        Self {
            env: EnvKey::new(&config.key.env),
            prompt: config.key.prompt.then_some("Passphrase: "),
            confirm: false,
        }
    }

    fn replacement(config: &JsealConfig, env: &str) -> Self {
        Self {
            env: EnvKey::new(env),
            prompt: config.key.prompt.then_some("New passphrase: "),
            confirm: true,
        }
    }
}

impl KeySource for Passphrase {
    fn passphrase(&self) -> Result<Zeroizing<Vec<u8>>> {
        if std::env::var_os(self.env.var()).is_some() {
            return self.env.passphrase();
        }
        let Some(prompt) = self.prompt else {
            bail!("${} is not set and key.prompt is disabled", self.env.var());
        };

        let entered = Zeroizing::new(rpassword::prompt_password(prompt).context("reading passphrase")?);
        if self.confirm {
            let again = Zeroizing::new(
                rpassword::prompt_password("Repeat passphrase: ").context("reading passphrase")?,
            );
            if *entered != *again {
                bail!("passphrases do not match");
            }
        }
        Ok(Zeroizing::new(entered.as_bytes().to_vec()))
    }
}

fn decode_salt(config: &JsealConfig) -> Result<Option<Vec<u8>>> {
    match &config.codec.salt_b64 {
        Some(encoded) => {
            let salt = SALT_B64
                .decode(encoded.trim())
                .context("decoding codec.salt_b64")?;
            if salt.is_empty() {
                bail!("codec.salt_b64 decodes to an empty salt");
            }
            Ok(Some(salt))
        }
        None => {
            tracing::warn!("codec.salt_b64 is not set; keys are derived with the built-in default salt");
            Ok(None)
        }
    }
}

fn build_options(config: &JsealConfig, format: Format, key: Passphrase) -> Result<Options> {
    let mut options = Options::new().with_format(format).with_key_source(key);
    options.salt = decode_salt(config)?;
    Ok(options)
}

// ── Document I/O ──────────────────────────────────────────────────────────────

/// `--format`, else the file extension, else `codec.format`.
fn resolve_format(path: &Path, flag: Option<Format>, config: &JsealConfig) -> Format {
    flag.or_else(|| Format::from_extension(path.extension().and_then(|e| e.to_str())))
        .unwrap_or(config.codec.format)
}

fn read_document(path: &Path, format: Format) -> Result<Value> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    format::parse(&bytes, format).with_context(|| format!("parsing {} as {format}", path.display()))
}

fn write_document(path: &Path, doc: &Value, format: Format) -> Result<()> {
    let mut bytes = format::render(doc, format)?;
    if format == Format::Json {
        bytes.push(b'\n');
    }
    write_atomic(path, &bytes).with_context(|| format!("writing {}", path.display()))
}

fn display_pointer(pointer: &str) -> &str {
    if pointer.is_empty() {
        "(root)"
    } else {
        pointer
    }
}

// ── `jseal inspect` ───────────────────────────────────────────────────────────

fn cmd_inspect(path: &Path, format: Format) -> Result<()> {
    let doc = read_document(path, format)?;
    let found = tree::blocks(&doc, &ModeRegistry::default());

    if found.is_empty() {
        println!("{}: no sealed blocks", path.display());
        return Ok(());
    }

    println!("{:<40} {:<6} {:>8}", "POINTER", "MODE", "BYTES");
    for block in &found {
        println!(
            "{:<40} {:<6} {:>8}",
            display_pointer(&block.pointer),
            block.mode,
            block.len
        );
    }
    println!("\n{} block(s)", found.len());
    Ok(())
}

// ── `jseal verify` ────────────────────────────────────────────────────────────

fn cmd_verify(config: &JsealConfig, path: &Path, format: Format) -> Result<()> {
    let mut doc = read_document(path, format)?;
    let options = build_options(config, format, Passphrase::current(config))?;
    let mut ctx = CipherContext::new(&options);

    let opened = tree::open_all(&mut doc, &mut ctx)
        .with_context(|| format!("verifying {}", path.display()))?;
    println!("{}: {opened} block(s) verified", path.display());
    Ok(())
}

// ── `jseal open` ──────────────────────────────────────────────────────────────

fn cmd_open(config: &JsealConfig, path: &Path, format: Format, output: Option<&Path>) -> Result<()> {
    let mut doc = read_document(path, format)?;
    let options = build_options(config, format, Passphrase::current(config))?;
    let mut ctx = CipherContext::new(&options);

    let opened = tree::open_all(&mut doc, &mut ctx)
        .with_context(|| format!("opening {}", path.display()))?;
    tracing::info!(blocks = opened, "opened document");

    match output {
        Some(out) => {
            let out_format = Format::from_extension(out.extension().and_then(|e| e.to_str()))
                .unwrap_or(format);
            write_document(out, &doc, out_format)?;
            eprintln!("{opened} block(s) opened → {}", out.display());
        }
        None => {
            let text = match format {
                Format::Json => serde_json::to_string_pretty(&doc).context("rendering json")?,
                Format::Yaml => String::from_utf8(format::render(&doc, format)?)
                    .context("rendering yaml")?,
            };
            println!("{}", text.trim_end());
        }
    }
    Ok(())
}

// ── `jseal seal` ──────────────────────────────────────────────────────────────

fn cmd_seal(
    config: &JsealConfig,
    path: &Path,
    format: Format,
    pointers: &[String],
    mode: &str,
) -> Result<()> {
    let mut doc = read_document(path, format)?;
    let options = build_options(config, format, Passphrase::current(config))?;
    let mut ctx = CipherContext::new(&options);

    let mut sealed = 0;
    for pointer in pointers {
        if tree::seal_path(&mut doc, pointer, mode, &mut ctx)
            .with_context(|| format!("sealing {pointer}"))?
        {
            sealed += 1;
        } else {
            println!("{pointer}: already sealed, skipped");
        }
    }

    if sealed > 0 {
        write_document(path, &doc, format)?;
    }
    println!("{}: {sealed} value(s) sealed with {mode}", path.display());
    Ok(())
}

// ── `jseal rekey` ─────────────────────────────────────────────────────────────

fn cmd_rekey(config: &JsealConfig, path: &Path, format: Format, new_env: &str) -> Result<()> {
    let mut doc = read_document(path, format)?;
    let old = build_options(config, format, Passphrase::current(config))?;
    let new = build_options(config, format, Passphrase::replacement(config, new_env))?;

    let resealed = tree::reseal(
        &mut doc,
        &mut CipherContext::new(&old),
        &mut CipherContext::new(&new),
    )
    .with_context(|| format!("re-keying {}", path.display()))?;

    if resealed > 0 {
        write_document(path, &doc, format)?;
    }
    println!("{}: {resealed} block(s) re-sealed", path.display());
    Ok(())
}

// ── `jseal config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &JsealConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    if config.codec.salt_b64.is_none() {
        println!("# warning: no codec.salt_b64; the built-in default salt is in use");
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
