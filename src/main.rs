use clap::{Args, CommandFactory, Parser, Subcommand};
use midicap::{
    logger, ClientOptions, EventFilter, MidiClient, MidiCommand, MidiEvent, SessionState,
};
use std::{io::Write, path::PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    opts: CommonOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct CommonOptions {
    /// Log verbosity level
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    /// Log to a file, `~/.midicap/log/midicap.log` when no path is given
    #[arg(long, global = true)]
    log: Option<Option<PathBuf>>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List MIDI input devices
    List(ListOptions),
    /// Print the events of a MIDI input device
    Capture(CaptureOptions),
    /// `midicap completions --generate=zsh > midicap.zsh`
    Completions(Completions),
}

#[derive(Args, Debug)]
struct ListOptions {
    /// Name announced to the platform MIDI service
    #[arg(long, default_value = midicap::client::DEFAULT_CLIENT_NAME)]
    client_name: String,
}

#[derive(Args, Debug)]
struct CaptureOptions {
    /// Index of the device, as printed by `midicap list`
    #[arg(long, short)]
    device: usize,

    /// Only keep these commands, e.g. `note-on,note-off`
    #[arg(long, short, value_delimiter = ',')]
    filter: Vec<MidiCommand>,

    /// Capacity of the event queue
    #[arg(long, default_value_t = 512)]
    buffer: usize,

    /// Name announced to the platform MIDI service
    #[arg(long, default_value = midicap::client::DEFAULT_CLIENT_NAME)]
    client_name: String,
}

#[derive(Debug, Parser)]
#[command(arg_required_else_help(true))]
struct Completions {
    /// shell to generate the completion script for
    #[arg(long = "generate", value_enum)]
    shell: Option<clap_complete::Shell>,
}

impl Completions {
    fn generate(&self) -> anyhow::Result<()> {
        let Some(shell) = self.shell else {
            anyhow::bail!("no shell specified for autocompletion generation");
        };

        let mut stdout = std::io::stdout();
        stdout.flush()?;

        let mut cli = Cli::command();
        clap_complete::generate(shell, &mut cli, "midicap", &mut stdout);

        Ok(())
    }
}

fn start_logger(opts: &CommonOptions) -> anyhow::Result<()> {
    match &opts.log {
        Some(Some(file)) => logger::start("midicap", file, opts.verbose),
        Some(None) => {
            let Some(file) = midicap::locations::log_file("midicap") else {
                anyhow::bail!("failed to resolve the home directory");
            };
            logger::start("midicap", file, opts.verbose)
        }
        None if opts.verbose => logger::start_console("midicap", true),
        None => Ok(()),
    }
}

fn list(opts: ListOptions) -> anyhow::Result<()> {
    let client = MidiClient::new(ClientOptions::default().with_client_name(opts.client_name));

    for (id, device) in client.list_devices()?.iter().enumerate() {
        if device.manufacturer.is_empty() {
            println!("{id} : {}", device.name);
        } else {
            println!("{id} : {} ({})", device.name, device.manufacturer);
        }
    }

    Ok(())
}

fn capture(opts: CaptureOptions) -> anyhow::Result<()> {
    if opts.buffer == 0 {
        anyhow::bail!("the event buffer needs room for at least one event");
    }

    let client = MidiClient::new(
        ClientOptions::default()
            .with_client_name(opts.client_name)
            .with_filter(EventFilter::new(opts.filter)),
    );

    client.select_device(opts.device)?;

    let (sender, events) = crossbeam::channel::bounded::<MidiEvent>(opts.buffer);
    client.start_capture(sender);
    if client.state() != SessionState::Capturing {
        anyhow::bail!("failed to start capturing device {}", opts.device);
    }

    let (quit_tx, quit_rx) = crossbeam::channel::bounded::<()>(1);
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = quit_tx.try_send(());
    });

    eprintln!("capturing device {}, press Enter to stop", opts.device);

    let mut stdout = std::io::stdout().lock();
    loop {
        crossbeam::select! {
            recv(events) -> event => match event {
                Ok(event) => print_event(&mut stdout, &event)?,
                Err(_) => break,
            },
            recv(quit_rx) -> _ => break,
        }
    }

    client.stop();

    let stats = client.stats();
    log::info!(
        "[ MIDI ] : {} delivered, {} filtered, {} dropped, {} incomplete",
        stats.delivered,
        stats.filtered,
        stats.dropped,
        stats.incomplete
    );

    Ok(())
}

fn print_event(out: &mut impl Write, event: &MidiEvent) -> std::io::Result<()> {
    let kind = event
        .kind()
        .map(|cmd| cmd.to_string())
        .unwrap_or_else(|| format!("0x{:02X}", event.command));

    writeln!(
        out,
        "{} : {kind} : channel {} : {} {}",
        event.timestamp,
        event.channel() + 1,
        event.note,
        event.velocity
    )
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    if let Commands::Completions(ref c) = args.command {
        return c.generate();
    }

    let app_result = start_logger(&args.opts).and_then(|_| match args.command {
        Commands::List(opts) => list(opts),
        Commands::Capture(opts) => capture(opts),
        Commands::Completions(_) => Ok(()),
    });

    if let Err(e) = app_result {
        if logger::is_active() {
            log::error!("{e}");
        } else {
            use colored::*;
            eprintln!("{} {}", "Error:".red().bold(), format!("{e}").bold());
        }
    }

    Ok(())
}
