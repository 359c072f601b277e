//! OFS CLI Client
//!
//! Command-line interface for an OFS file server. Runs one command per
//! invocation, or an interactive console with `shell`.

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ofs_client::protocol::{is_streaming_line, SENTINEL};
use ofs_client::{Client, ClientConfig, Command, Framing, OfsError, Response, Role};
use tracing_subscriber::{fmt, EnvFilter};

/// OFS CLI
#[derive(Parser, Debug)]
#[command(name = "ofs-cli")]
#[command(about = "CLI for the OFS remote file store")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Read/write timeout in milliseconds (0 waits forever)
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Take each reply from a single socket read
    #[arg(long)]
    single_read: bool,

    /// Log in as this user before running the command
    #[arg(short, long, requires = "password")]
    user: Option<String>,

    /// Password for --user
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in
    Login { user: String, password: String },

    /// Log out (the server closes the connection afterwards)
    Logout,

    /// Create a user
    CreateUser {
        user: String,
        password: String,
        /// 0/user or 1/admin
        #[arg(value_parser = parse_role)]
        role: Role,
    },

    /// Delete a user
    DeleteUser { user: String },

    /// List users
    ListUsers,

    /// Show the current session
    Session,

    /// Create a directory
    Mkdir { path: String },

    /// List a directory
    Ls { path: String },

    /// Remove a directory
    Rmdir { path: String },

    /// Check that a directory exists
    DirExists { path: String },

    /// Create a file; content from --file or stdin
    Create {
        path: String,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print a file
    Read { path: String },

    /// Write content into a file at a byte index; content from --file or stdin
    Edit {
        path: String,
        index: u32,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete a file
    Delete { path: String },

    /// Rename a file
    Rename { from: String, to: String },

    /// Check that a file exists
    FileExists { path: String },

    /// Empty a file
    Truncate { path: String },

    /// Show file metadata
    Metadata { path: String },

    /// Set file permissions
    Chmod { path: String, permissions: u32 },

    /// Show file system statistics
    Stats,

    /// Interactive console: type raw commands, one per line
    Shell,
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse().map_err(|e: OfsError| e.to_string())
}

fn main() -> ExitCode {
    // Logs go to stderr so replies on stdout stay clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let framing = if args.single_read {
        Framing::SingleRead {
            buffer_size: ofs_client::config::DEFAULT_READ_BUFFER_SIZE,
        }
    } else {
        Framing::default()
    };
    let config = ClientConfig::builder()
        .host(&args.host)
        .port(args.port)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .framing(framing)
        .build();

    let mut client = Client::new(config);
    let greeting = match client.connect() {
        Ok(greeting) => greeting,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Server greeting: {}", greeting);

    if let (Some(user), Some(password)) = (args.user, args.password) {
        let login = Command::Login { user, password };
        match client.run(&login) {
            Ok(response) if response.is_ok() => {}
            Ok(response) => return report(&response),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let code = match args.command {
        Commands::Shell => {
            println!("{}", greeting);
            match shell(&mut client) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        other => match one_shot(&mut client, other) {
            Ok(response) => report(&response),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                ExitCode::FAILURE
            }
        },
    };

    client.close();
    code
}

/// Run a single subcommand
fn one_shot(client: &mut Client, command: Commands) -> ofs_client::Result<Response> {
    let (command, content) = match command {
        Commands::Login { user, password } => (Command::Login { user, password }, None),
        Commands::Logout => (Command::Logout, None),
        Commands::CreateUser { user, password, role } => {
            (Command::CreateUser { user, password, role }, None)
        }
        Commands::DeleteUser { user } => (Command::DeleteUser { user }, None),
        Commands::ListUsers => (Command::ListUsers, None),
        Commands::Session => (Command::GetSessionInfo, None),
        Commands::Mkdir { path } => (Command::Mkdir { path }, None),
        Commands::Ls { path } => (Command::Ls { path }, None),
        Commands::Rmdir { path } => (Command::Rmdir { path }, None),
        Commands::DirExists { path } => (Command::DirExists { path }, None),
        Commands::Create { path, file } => (Command::Create { path }, Some(read_content(file)?)),
        Commands::Read { path } => (Command::Read { path }, None),
        Commands::Edit { path, index, file } => {
            (Command::Edit { path, index }, Some(read_content(file)?))
        }
        Commands::Delete { path } => (Command::Delete { path }, None),
        Commands::Rename { from, to } => (Command::Rename { from, to }, None),
        Commands::FileExists { path } => (Command::FileExists { path }, None),
        Commands::Truncate { path } => (Command::Truncate { path }, None),
        Commands::Metadata { path } => (Command::GetMetadata { path }, None),
        Commands::Chmod { path, permissions } => {
            (Command::SetPermissions { path, permissions }, None)
        }
        Commands::Stats => (Command::GetStats, None),
        Commands::Shell => {
            return Err(OfsError::InvalidCommand(
                "shell is interactive, not a single command".to_string(),
            ))
        }
    };

    match content {
        Some(content) => Ok(client.upload(&command, &content)?.into_response()),
        None => client.run(&command),
    }
}

/// Content from a local file, or stdin when no file is given
fn read_content(file: Option<PathBuf>) -> ofs_client::Result<String> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn report(response: &Response) -> ExitCode {
    println!("{}", response);
    if response.is_err() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Interactive console.
///
/// `CREATE`/`EDIT` lines are followed by content lines, ended with a
/// `<<<EOF>>>` line.
fn shell(client: &mut Client) -> ofs_client::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "ofs> ")?;
        stdout.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = if is_streaming_line(line) {
            let mut content = Vec::new();
            for body in lines.by_ref() {
                let body = body?;
                if body.trim() == SENTINEL {
                    break;
                }
                content.push(body);
            }
            client.send_stream(line, &content.join("\n"))
        } else {
            client.send(line)
        };
        writeln!(stdout, "> {}\n{}", line, reply)?;

        if !client.is_connected() {
            writeln!(stdout, "Connection lost, reconnecting...")?;
            match client.connect() {
                Ok(greeting) => writeln!(stdout, "{}", greeting)?,
                Err(e) => return Err(e),
            }
        }
    }

    Ok(())
}
