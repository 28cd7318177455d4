use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let path_arg = |arg: clap::Arg| arg.global(true).value_parser(clap::value_parser!(std::path::PathBuf));

    let mut cmd = clap::Command::new("palimpsest")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Palimpsest Contributors")
        .about("Track how a website's content changed across web archive captures")
        .subcommand_required(true)
        .arg(path_arg(clap::arg!(--config <FILE> "JSON config file")))
        .arg(path_arg(clap::arg!(--"data-dir" <DIR> "Where snapshots and the index are stored")))
        .arg(path_arg(clap::arg!(--"reports-dir" <DIR> "Where report tables are written")))
        .arg(clap::arg!(--"base-url" <URL> "Site whose pages are tracked").global(true))
        .arg(clap::arg!(--from <DATE> "First day of the capture window (YYYYMMDD)").global(true))
        .arg(clap::arg!(--to <DATE> "Last day of the capture window (YYYYMMDD)").global(true))
        .arg(
            clap::arg!(--path <PATH> "Path to track; repeat for several")
                .global(true)
                .action(clap::ArgAction::Append),
        )
        .arg(
            clap::arg!(--sampling <MODE> "Sampling mode")
                .global(true)
                .value_parser(["all", "yearly", "quarterly", "monthly"]),
        )
        .arg(clap::arg!(--threshold <NUM> "Distance at or above which a change is significant").global(true))
        .arg(path_arg(clap::arg!(--keywords <FILE> "Keyword registry JSON file")))
        .arg(clap::arg!(--"delay-ms" <MS> "Pause after each download, in milliseconds").global(true))
        .arg(clap::arg!(--timezone <TZ> "IANA timezone for local timestamps").global(true))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").global(true))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").global(true))
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(
            clap::Command::new("run")
                .about("Analyze existing snapshots, collecting them first when none are usable")
                .arg(clap::arg!(--refresh "Collect again even if a usable index exists")),
        )
        .subcommand(clap::Command::new("collect").about("List, sample, download and normalize captures"))
        .subcommand(clap::Command::new("analyze").about("Compare consecutive snapshots and write the report tables"))
        .subcommand(
            clap::Command::new("normalize")
                .about("Print the normalized text of one page")
                .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
                .arg(clap::arg!(--taglines "Print the extracted taglines as JSON instead"))
                .arg(
                    clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            clap::Command::new("sample")
                .about("Sample a listing down to one capture per period")
                .arg(clap::arg!([INPUT] "Listing file, or '-' for stdin").default_value("-")),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "palimpsest", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "palimpsest", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "palimpsest", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "palimpsest", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
