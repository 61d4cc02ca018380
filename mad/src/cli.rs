use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use mad_config::{Config, OverridableConfig};
use mad_metrics::{Record, TypeRegistry};

use crate::cliapp::make_app;
use crate::setup;

/// The config folder used when `--config` is not passed.
const DEFAULT_CONFIG_PATH: &str = ".mad";

/// Runs the command line application.
pub fn execute() -> Result<()> {
    let app = make_app();
    let matches = app.get_matches();
    let config_path = matches
        .get_one::<PathBuf>("config")
        .map_or(Path::new(DEFAULT_CONFIG_PATH), PathBuf::as_path);

    let mut config = Config::from_path(config_path)?;
    config.apply_override(extract_config_args(&matches))?;

    setup::init_logging(&config);
    setup::dump_spawn_infos(&config);

    match matches.subcommand() {
        Some(("decode", matches)) => decode(&config, matches),
        Some(("types", _)) => print_types(config.type_registry(), &mut io::stdout().lock()),
        _ => unreachable!(),
    }
}

/// Extract config arguments from a parsed command line arguments object.
pub fn extract_config_args(matches: &ArgMatches) -> OverridableConfig {
    OverridableConfig {
        log_level: matches.get_one("log_level").cloned(),
        log_format: matches.get_one("log_format").cloned(),
    }
}

fn read_datagram(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path)
            .with_context(|| format!("could not read datagram from {}", path.display())),
        None => {
            let mut datagram = Vec::new();
            io::stdin()
                .read_to_end(&mut datagram)
                .context("could not read datagram from stdin")?;
            Ok(datagram)
        }
    }
}

pub fn decode(config: &Config, matches: &ArgMatches) -> Result<()> {
    let datagram = read_datagram(matches.get_one("file"))?;

    let decoder = config.statsd_decoder();
    let records = decoder
        .decode(&datagram, &mut rand::rng())
        .context("rejected statsd datagram")?;

    mad_log::debug!("decoded {} records", records.len());
    write_records(&records, &mut io::stdout().lock())
}

/// Writes records as JSON lines.
fn write_records<W: Write>(records: &[Record], writer: &mut W) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}

fn print_types<W: Write>(registry: &TypeRegistry, writer: &mut W) -> Result<()> {
    writeln!(writer, "{:<8}{:<12}{:<14}sampled", "token", "kind", "unit")?;
    for ty in registry.iter() {
        writeln!(
            writer,
            "{:<8}{:<12}{:<14}{}",
            ty.token,
            ty.kind.to_string(),
            ty.unit.to_string(),
            if ty.sampled { "yes" } else { "no" }
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use mad_metrics::{FixedClock, StatsdDecoder};

    use super::*;

    #[test]
    fn test_write_records() {
        let time = Utc.with_ymd_and_hms(2017, 5, 9, 21, 3, 12).unwrap();
        let decoder = StatsdDecoder::default().with_clock(FixedClock(time));
        let records = decoder
            .decode(b"hits:1|c|#host:web1\nlatency:2.5|ms", &mut rand::rng())
            .unwrap();

        let mut output = Vec::new();
        write_records(&records, &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        let parsed: Vec<Record> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, records);

        insta::assert_json_snapshot!(records, {"[].id" => "[id]"}, @r#"
        [
          {
            "id": "[id]",
            "time": "2017-05-09T21:03:12Z",
            "dimensions": {
              "host": "web1"
            },
            "metrics": {
              "hits": {
                "type": "counter",
                "values": [
                  {
                    "value": 1.0
                  }
                ]
              }
            }
          },
          {
            "id": "[id]",
            "time": "2017-05-09T21:03:12Z",
            "dimensions": {},
            "metrics": {
              "latency": {
                "type": "timer",
                "values": [
                  {
                    "value": 2.5,
                    "unit": "millisecond"
                  }
                ]
              }
            }
          }
        ]
        "#);
    }

    #[test]
    fn test_print_types() {
        let mut output = Vec::new();
        print_types(&TypeRegistry::default(), &mut output).unwrap();

        insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        token   kind        unit          sampled
        c       counter     none          yes
        g       gauge       none          no
        h       histogram   none          yes
        m       meter       none          no
        ms      timer       millisecond   yes
        ");
    }

    #[test]
    fn test_read_datagram_missing_file() {
        let error = read_datagram(Some(&PathBuf::from("/nonexistent/datagram"))).unwrap_err();
        assert!(error.to_string().starts_with("could not read datagram from"));
    }
}
