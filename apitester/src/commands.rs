use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

const REPORT_FORMATS: [&str; 4] = ["text", "json", "csv", "markdown"];

fn input_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-i --"input" <PATH>)
            .required(false)
            .help("File containing copied DevTools data (default: read from stdin)")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(-c --"config" <PATH>)
            .required(false)
            .help("Path to the config file (default: ~/.config/apitester/config.json)")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(-b --"blacklist" <DOMAIN>)
            .required(false)
            .help("Skip URLs containing this domain; may be repeated")
            .action(clap::ArgAction::Append),
    )
    .arg(
        arg!(--"user-agent" <AGENT>)
            .required(false)
            .help("User-Agent header sent with every request"),
    )
    .arg(
        arg!(-o --"output" <PATH>)
            .required(false)
            .help("Save report to file (default: display to screen)")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(-f --"format" <FORMAT>)
            .required(false)
            .help("Report format: text, json, csv, markdown")
            .value_parser(REPORT_FORMATS)
            .default_value("text"),
    )
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("apitester")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("apitester")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes a default configuration file")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the config file")
                        .default_value("~/.config/apitester/config.json"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrite an existing config file at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(input_args(
            command!("extract")
                .about("List the API endpoints found in copied DevTools data. Sends no requests."),
        ))
        .subcommand(
            input_args(command!("scan").about(
                "Extract API endpoints from copied DevTools data and test each one in turn.",
            ))
            .arg(
                arg!(-t --"timeout" <SECONDS>)
                    .required(false)
                    .help("Request timeout in seconds, fractions allowed")
                    .value_parser(clap::value_parser!(f64)),
            )
            .arg(
                arg!(-m --"max-apis" <COUNT>)
                    .required(false)
                    .help("Maximum number of endpoints to test")
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                arg!(-d --"delay" <SECONDS>)
                    .required(false)
                    .help("Pause between two requests, fractions allowed")
                    .value_parser(clap::value_parser!(f64)),
            )
            .arg(
                arg!(--"verify-tls")
                    .required(false)
                    .help("Verify TLS certificates (default: accept any certificate)")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                arg!(--"no-redirects")
                    .required(false)
                    .help("Do not follow HTTP redirects")
                    .action(clap::ArgAction::SetTrue),
            ),
        )
}
