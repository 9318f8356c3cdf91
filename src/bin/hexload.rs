//! Hexload serial console command line interface.

use std::{io, process, thread};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings::*, Arg,
};
use console::style;
use log::{debug, trace, warn, LevelFilter};
use simplelog::*;

use hexload::{
    self as hl,
    shell::{self, ConsoleLines},
    transport::{Session, Shutdown},
    SettingsBuilder,
};

fn main() {
    println!("[HL] hexload v{}", crate_version!());

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Hexload opens the serial port at 57600 baud, 8N1 and goes into a \
            simple terminal mode. Any line it gets from stdin is passed to \
            the board on the other side of the serial line, and any data it \
            gets from the board is printed to stdout.\n\
            \n\
            Two commands are handled locally:\n\
               \t* `LOAD <path>` pushes the 8192 bytes image at <path>: \
            the line `LOAD` is sent, then after 1 second the raw image \n\
               \t* `EXIT` closes the port and terminates\n\
            \n\
            Use `LIST` as the port name to enumerate the available serial \
            ports. When no port is given, one can be selected \
            interactively.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("PORT")
                .help("the serial port to use, or LIST")
                .long_help(
                    "the serial port to use (e.g. /dev/ttyUSB0 or COM3); \
                     `LIST` enumerates the available ports instead",
                )
                .index(1),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'hexload -v -v -v' or 'hexload -vvv' vs 'hexload -v'
    let verbosity = matches.occurrences_of("v");
    let log_level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if TermLogger::init(log_level, Config::default(), TerminalMode::Mixed).is_err() {
        eprintln!("logger already initialized");
    }

    trace!("{:#?}", matches);

    let port = match matches.value_of("PORT") {
        Some(name) if name.eq_ignore_ascii_case("LIST") => process::exit(list(verbosity > 0)),
        Some(name) => name.to_owned(),
        None => match hl::select_port() {
            Ok(Some(name)) => name,
            Ok(None) => {
                println!("Error: No serial COM ports found");
                process::exit(1);
            }
            Err(e) => fail(&e),
        },
    };

    let settings = SettingsBuilder::new().path(port).finalize();
    let mut session = match Session::open(&settings) {
        Ok(session) => session,
        Err(e) => fail(&e),
    };
    println!(
        "{}",
        style(format!(
            "[HL] 🔌 Connected to {} (type EXIT to quit)",
            session.name()
        ))
        .green()
    );

    let cancel = session.cancel_token();
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("🛑 received Ctrl+C!");
        on_interrupt.request();
    }) {
        warn!("could not install the Ctrl+C handler: {}", e);
    }

    // The console task is not joined: it may be blocked on stdin when the
    // session ends, and it holds nothing but a submitting handle.
    let outbox = session.outbox();
    let capacity = settings.console_line_capacity;
    let spawned = thread::Builder::new()
        .name("console-reader".into())
        .spawn(move || shell::run(ConsoleLines::new(io::stdin(), capacity), &outbox, &cancel));
    if let Err(e) = spawned {
        fail(&e.into());
    }

    let shutdown = session.wait();
    session.close();
    debug!("shutdown: {:?}", shutdown);

    match shutdown {
        Shutdown::Requested => process::exit(0),
        Shutdown::Failed => {
            println!(
                "{}",
                style("[HL] 💥 Unrecoverable error on the serial port!").red()
            );
            println!("[HL] 🔌 Disconnect and reconnect the device!");
            process::exit(1);
        }
    }
}

fn list(detailed: bool) -> i32 {
    match hl::list_ports() {
        Ok(ports) if ports.is_empty() => {
            println!("Error: No serial COM ports found");
            1
        }
        Ok(ports) => {
            for port in &ports {
                if detailed {
                    println!("{}", hl::describe_port(port));
                } else {
                    println!("{}", port.port_name);
                }
            }
            0
        }
        Err(e) => {
            println!("{}", style(format!("[HL] 💥 Error: {}", e)).red());
            1
        }
    }
}

fn fail(e: &hl::Error) -> ! {
    println!("{}", style(format!("[HL] 💥 Error: {}", e)).red());
    process::exit(1);
}
