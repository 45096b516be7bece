use crate::CLAP_STYLING;
use clap::{arg, command};
use stackscan::handlers::DEFAULT_CONFIG_DIR;
use stackscan_core::collect::{DEFAULT_AREA, DEFAULT_EXPERIENCE, DEFAULT_QUERY};
use stackscan_fetcher::client::{DEFAULT_API_URL, DEFAULT_USER_AGENT};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("stackscan")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("stackscan")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Log more (-v info, -vv debug); RUST_LOG overrides")
                .required(false)
                .action(clap::ArgAction::Count),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Installs the default keyword dictionary on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the keyword dictionary")
                        .default_value(DEFAULT_CONFIG_DIR),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing keyword dictionary without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("keywords")
                .about("Show the keyword dictionary grouped by technology")
                .arg(
                    arg!(-k --"keywords" <PATH>)
                        .required(false)
                        .help("JSON file mapping tokens to technology labels")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("scan")
                .about(
                    "Fetch vacancies, count the technologies they mention and write summary \
                and detailed tables.",
                )
                .arg(
                    arg!(-t --"text" <QUERY>)
                        .required(false)
                        .help("Search text sent to the vacancies endpoint")
                        .default_value(DEFAULT_QUERY),
                )
                .arg(
                    arg!(-a --"area" <AREA_ID>)
                        .required(false)
                        .help("Region identifier; repeat or comma-separate for several")
                        .action(clap::ArgAction::Append)
                        .default_value(DEFAULT_AREA),
                )
                .arg(
                    arg!(-p --"pages" <NUM_PAGES>)
                        .required(false)
                        .help("Number of result pages to scan per region")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("7"),
                )
                .arg(
                    arg!(--"per-page" <NUM>)
                        .required(false)
                        .help("Vacancies per result page")
                        .value_parser(clap::value_parser!(u32).range(1..=100))
                        .default_value("50"),
                )
                .arg(
                    arg!(--"experience" <LEVEL>)
                        .required(false)
                        .help("Experience filter: noExperience, between1And3, between3And6, moreThan6")
                        .default_value(DEFAULT_EXPERIENCE),
                )
                .arg(
                    arg!(--"pause" <MILLIS>)
                        .required(false)
                        .help("Pause after each processed vacancy, in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("500"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("15"),
                )
                .arg(
                    arg!(--"api-url" <URL>)
                        .required(false)
                        .help("Base URL of the job-listing API")
                        .value_parser(clap::value_parser!(url::Url))
                        .default_value(DEFAULT_API_URL),
                )
                .arg(
                    arg!(--"user-agent" <UA>)
                        .required(false)
                        .help("User-Agent header sent with every request")
                        .default_value(DEFAULT_USER_AGENT),
                )
                .arg(
                    arg!(-k --"keywords" <PATH>)
                        .required(false)
                        .help("JSON file mapping tokens to technology labels (default: installed or built-in dictionary)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory for the summary and detailed tables")
                        .default_value("."),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Table format: csv, json")
                        .value_parser(["csv", "json"])
                        .default_value("csv"),
                )
                .arg(
                    arg!(--"top" <NUM>)
                        .required(false)
                        .help("Number of technologies to print when done")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Disable the progress spinner")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
