use std::process;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

mod client;

use client::ControlClient;
use ndngate_core::{EntryStatus, FaceStatus, Name};

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = Command::new("ndngate")
        .version("0.1.0")
        .about("ndngate CLI - control the ndngate daemon's FIB liveness table")
        .arg(
            Arg::new("socket")
                .short('s')
                .long("socket")
                .value_name("PATH")
                .help("Daemon control socket path")
                .default_value("/var/run/ndngated.sock")
                .global(true),
        )
        .subcommand(
            Command::new("status")
                .about("FIB entry status commands")
                .subcommand(
                    Command::new("get")
                        .about("Get the status of an entry")
                        .arg(Arg::new("name").required(true).help("NDN name URI")),
                )
                .subcommand(
                    Command::new("set")
                        .about("Set the status of an entry")
                        .arg(Arg::new("name").required(true).help("NDN name URI"))
                        .arg(
                            Arg::new("status")
                                .required(true)
                                .help("active, inactive or suspended"),
                        ),
                ),
        )
        .subcommand(
            Command::new("face")
                .about("Per-face status commands")
                .subcommand(
                    Command::new("set")
                        .about("Set the status of one face on an entry")
                        .arg(Arg::new("name").required(true).help("NDN name URI"))
                        .arg(Arg::new("face-id").required(true).help("Face identifier"))
                        .arg(
                            Arg::new("status")
                                .required(true)
                                .help("active or inactive"),
                        ),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Show FIB status statistics")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit JSON instead of text")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("cleanup").about("Remove all inactive FIB entries now"))
        .get_matches();

    if let Err(e) = run(&matches).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let socket = matches
        .get_one::<String>("socket")
        .map(String::as_str)
        .unwrap_or("/var/run/ndngated.sock");
    let client = ControlClient::new(socket);

    match matches.subcommand() {
        Some(("status", sub)) => match sub.subcommand() {
            Some(("get", args)) => {
                let name = parse_name(args)?;
                let status = client.get_status(&name).await?;
                println!("{} {}", name, status);
                Ok(())
            }
            Some(("set", args)) => {
                let name = parse_name(args)?;
                let status: EntryStatus = parse_status(args)?;
                client.set_status(&name, status).await?;
                println!("{} set to {}", name, status);
                Ok(())
            }
            _ => anyhow::bail!("missing status subcommand, see --help"),
        },
        Some(("face", sub)) => match sub.subcommand() {
            Some(("set", args)) => {
                let name = parse_name(args)?;
                let face_id: u16 = args
                    .get_one::<String>("face-id")
                    .map(String::as_str)
                    .unwrap_or_default()
                    .parse()
                    .context("face-id must be an integer in 0..=65535")?;
                let status: FaceStatus = parse_status(args)?;
                client.set_face_status(&name, face_id, status).await?;
                println!("face {} on {} set to {}", face_id, name, status);
                Ok(())
            }
            _ => anyhow::bail!("missing face subcommand, see --help"),
        },
        Some(("stats", args)) => {
            let counts = client.statistics().await?;
            if args.get_flag("json") {
                let json = serde_json::json!({
                    "active": counts.active,
                    "inactive": counts.inactive,
                    "suspended": counts.suspended,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("FIB Status Statistics:");
                println!("  Active entries:    {}", counts.active);
                println!("  Inactive entries:  {}", counts.inactive);
                println!("  Suspended entries: {}", counts.suspended);
            }
            Ok(())
        }
        Some(("cleanup", _)) => {
            client.cleanup().await?;
            println!("cleanup requested");
            Ok(())
        }
        _ => anyhow::bail!("missing command, see --help"),
    }
}

fn parse_name(args: &ArgMatches) -> Result<Name> {
    let uri = args
        .get_one::<String>("name")
        .map(String::as_str)
        .unwrap_or_default();
    Name::from_uri(uri).with_context(|| format!("invalid name {:?}", uri))
}

fn parse_status<T>(args: &ArgMatches) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    args.get_one::<String>("status")
        .map(String::as_str)
        .unwrap_or_default()
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
}
