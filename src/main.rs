//! Purpose: `busobject` CLI entry point for exercising composed objects on an in-process bus.
//! Role: Binary crate root; parses args, runs a lifecycle, emits bus events as JSON lines on stdout.
//! Invariants: stdout carries only JSON lines; logs and errors go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod event_json;

use busobject::api::{
    Action, BusObject, CompositionBuilder, Connection, Error, MemoryBus, ObjectPath, SignalKind,
    to_exit_code,
};
use event_json::{error_json, event_json};

#[derive(Parser, Debug)]
#[command(name = "busobject", version, about = "Compose interfaces into bus objects and trace their signals")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an object on an in-process bus, drop it, and print every bus event.
    Demo(DemoArgs),
    /// Validate an object path.
    CheckPath {
        path: String,
    },
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Object path shared by every interface.
    #[arg(long, default_value = "/org/example/Object")]
    path: String,
    /// Interface to compose; repeat in declared order.
    #[arg(long = "interface", short = 'i')]
    interfaces: Vec<String>,
    /// Signal policy applied at construction.
    #[arg(long, value_enum, default_value_t = ActionArg::EmitObjectAdded)]
    action: ActionArg,
    /// Call `emit_object_added` after construction.
    #[arg(long)]
    emit_later: bool,
    /// Make registration of this interface fail.
    #[arg(long)]
    fail_at: Option<String>,
    /// Make the removal broadcast fail at teardown.
    #[arg(long)]
    fail_removed: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ActionArg {
    EmitObjectAdded,
    EmitInterfaceAdded,
    DeferEmit,
}

impl From<ActionArg> for Action {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::EmitObjectAdded => Action::EmitObjectAdded,
            ActionArg::EmitInterfaceAdded => Action::EmitInterfaceAdded,
            ActionArg::DeferEmit => Action::DeferEmit,
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Demo(args) => run_demo(args),
        Command::CheckPath { path } => {
            let path = ObjectPath::parse(path)?;
            println!("{}", json!({ "path": path.as_str(), "valid": true }));
            Ok(())
        }
    }
}

fn run_demo(args: DemoArgs) -> Result<(), Error> {
    let path = ObjectPath::parse(args.path.as_str())?;
    let bus = MemoryBus::new();
    if let Some(interface) = &args.fail_at {
        bus.fail_registration_of(interface.clone());
    }
    let connection = Connection::from_bus(bus.clone());

    let result = lifecycle(&connection, &bus, path, &args);
    print_events(&bus);
    result
}

fn lifecycle(
    connection: &Connection,
    bus: &MemoryBus,
    path: ObjectPath,
    args: &DemoArgs,
) -> Result<(), Error> {
    let builder = args
        .interfaces
        .iter()
        .fold(CompositionBuilder::new(), |builder, name| {
            builder.with_interface(name.clone())
        });
    let composition = builder.build(connection, &path)?;
    let mut object = BusObject::from_composition(composition, connection, path, args.action.into());
    if args.emit_later {
        object.emit_object_added()?;
    }
    if args.fail_removed {
        bus.fail_next_signal(SignalKind::ObjectRemoved);
    }
    drop(object);
    Ok(())
}

fn print_events(bus: &MemoryBus) {
    let time = time_now();
    for (seq, event) in bus.events().iter().enumerate() {
        let value = event_json(seq, event, time.as_deref());
        let json = serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"event\":{\"kind\":\"encode_failed\"}}".to_string());
        println!("{json}");
    }
}

fn time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"encode_failed\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
