//! Hexload image encoder command line interface.

use std::{env, ffi::OsString, path::Path, process};

use clap::{crate_authors, crate_version, App, AppSettings::*, Arg};
use console::style;
use log::{debug, trace, LevelFilter};
use simplelog::*;

use hexload::{
    encoder::{self, ByteTransform},
    Error,
};

fn main() {
    let matches = App::new("hex2bin")
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about("Convert hex dumps into binary firmware images")
        .long_about(
            "\n\
            Each input file is a text hex dump, every line a run of hex digit \
            pairs. The decoded bytes are written to a file with the same name \
            and a `.bin` extension. A trailing odd digit on a line is \
            ignored.\n\
            \n\
            After each file, the checksum diagnostic is printed: `Ok` when \
            the bytes of the image add up to zero (modulo 256), otherwise \
            the byte that would balance them.\n\
            \n\
            The legacy single-dash spellings `-swap` and `-inv` are \
            accepted too. Transform flags apply to every file of the \
            invocation, wherever they appear.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("SWAP")
                .help("swap the two nibbles of every byte")
                .long("swap"),
        )
        .arg(
            Arg::with_name("INV")
                .help("reverse the bit order of every byte")
                .long_help(
                    "reverse the bit order of every byte; when combined with \
                     `--swap`, bits are reversed first",
                )
                .long("inv"),
        )
        .arg(
            Arg::with_name("FILES")
                .help("hex dump files to convert")
                .required(true)
                .multiple(true)
                .index(1),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches_from(normalize_args(env::args_os()));

    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if TermLogger::init(log_level, Config::default(), TerminalMode::Mixed).is_err() {
        eprintln!("logger already initialized");
    }

    trace!("{:#?}", matches);

    let transform =
        ByteTransform::from_flags(matches.is_present("INV"), matches.is_present("SWAP"));
    debug!("transform: {:?}", transform);

    let mut failures = 0;
    for name in matches.values_of_os("FILES").into_iter().flatten() {
        if !convert_one(Path::new(name), transform) {
            failures += 1;
        }
    }

    debug!("{} file(s) failed", failures);
    process::exit(if failures == 0 { 0 } else { 1 });
}

/// Converts one file and prints its progress line. Returns `false` on failure,
/// which never stops the rest of the batch.
fn convert_one(input: &Path, transform: ByteTransform) -> bool {
    match encoder::convert_file(input, transform) {
        Ok(report) => {
            println!(
                "{} => {} ... {}",
                display_name(&report.input),
                display_name(&report.output),
                style(report.checksum).green()
            );
            true
        }
        Err(Error::FileMissing(_)) => {
            println!("{} is not a valid file", input.display());
            false
        }
        Err(e) => {
            println!(
                "{} => {} ... {}",
                display_name(input),
                display_name(&encoder::output_path(input)),
                style(e).red()
            );
            false
        }
    }
}

/// The file name alone, as shown in progress lines.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Rewrites the legacy `-swap` / `-inv` flags, in any case, into their long
/// forms so they are not parsed as bundles of short flags.
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(flag) if flag.eq_ignore_ascii_case("-swap") => "--swap".into(),
            Some(flag) if flag.eq_ignore_ascii_case("-inv") => "--inv".into(),
            _ => arg,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn legacy_flags_anywhere() {
        assert_eq!(
            normalize_args(args(&["hex2bin", "a.hex", "-SWAP", "b.hex", "-Inv"])),
            args(&["hex2bin", "a.hex", "--swap", "b.hex", "--inv"])
        );
    }

    #[test]
    fn other_arguments_untouched() {
        let list = args(&["hex2bin", "-v", "--swap", "-swapped.hex"]);
        assert_eq!(normalize_args(list.clone()), list);
    }
}
