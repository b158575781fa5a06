pub mod cli;
pub mod toml_config;

pub use cli::LocalStorage;
pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
mod args {
    use crate::app::quote_flow::QuoteInputs;
    use crate::core::resolver::LocationInput;
    use crate::domain::model::{GeoPoint, PackageType};
    use chrono::{NaiveDate, NaiveTime};
    use clap::{ArgGroup, Args, Parser, Subcommand};
    use std::path::PathBuf;

    fn parse_point(value: &str) -> Result<GeoPoint, String> {
        GeoPoint::parse(value).map_err(|e| e.to_string())
    }

    fn parse_time(value: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(value, "%H:%M")
            .map_err(|e| format!("expected HH:MM, got '{}': {}", value, e))
    }

    #[derive(Debug, Parser)]
    #[command(name = "courier-quote")]
    #[command(about = "Courier quote wizard with address lookup and route estimates")]
    #[command(version)]
    pub struct CliConfig {
        #[arg(long, global = true, default_value = "courier-quote.toml")]
        pub config: PathBuf,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Subcommand)]
    pub enum Command {
        /// List the available services
        Services,
        /// Great-circle distance and drive time between two points
        Distance {
            #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
            from: GeoPoint,
            #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
            to: GeoPoint,
        },
        /// Look up an address
        Geocode {
            #[arg(required = true, num_args = 1..)]
            query: Vec<String>,
        },
        /// Look up the address at a coordinate
        Reverse {
            #[arg(value_parser = parse_point, allow_hyphen_values = true)]
            point: GeoPoint,
        },
        /// Run the whole quote wizard and submit
        Quote(QuoteArgs),
    }

    #[derive(Debug, Args)]
    #[command(group(ArgGroup::new("pickup_source").required(true).args(["pickup", "pickup_at", "pickup_here"])))]
    #[command(group(ArgGroup::new("dropoff_source").required(true).args(["dropoff", "dropoff_at", "dropoff_here"])))]
    pub struct QuoteArgs {
        #[arg(long)]
        pub service: u32,

        #[arg(long)]
        pub pickup: Option<String>,
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        pub pickup_at: Option<GeoPoint>,
        #[arg(long)]
        pub pickup_here: bool,

        #[arg(long)]
        pub dropoff: Option<String>,
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        pub dropoff_at: Option<GeoPoint>,
        #[arg(long)]
        pub dropoff_here: bool,

        #[arg(long, help = "Pickup date (YYYY-MM-DD), defaults to tomorrow")]
        pub date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_time, help = "Pickup time (HH:MM), defaults to 10:00")]
        pub time: Option<NaiveTime>,

        #[arg(long, help = "Package volume in cubic metres (0-10)")]
        pub volume: Option<f64>,

        #[arg(long, help = "Package weight in kilograms (0-20)")]
        pub weight: Option<f64>,

        #[arg(long)]
        pub package_type: Option<PackageType>,

        #[arg(long)]
        pub notes: Option<String>,
    }

    fn location_input(address: Option<String>, at: Option<GeoPoint>, here: bool) -> LocationInput {
        match (address, at) {
            (Some(address), _) => LocationInput::Address(address),
            (None, Some(point)) => LocationInput::Coordinates(point),
            // clap 的 ArgGroup 保證三者擇一
            (None, None) => {
                debug_assert!(here);
                LocationInput::CurrentPosition
            }
        }
    }

    impl QuoteArgs {
        pub fn into_inputs(self) -> QuoteInputs {
            QuoteInputs {
                service_id: self.service,
                pickup: location_input(self.pickup, self.pickup_at, self.pickup_here),
                dropoff: location_input(self.dropoff, self.dropoff_at, self.dropoff_here),
                date: self.date,
                time: self.time,
                volume_m3: self.volume,
                weight_kg: self.weight,
                package_type: self.package_type,
                notes: self.notes,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_quote_command() {
            let cli = CliConfig::try_parse_from([
                "courier-quote",
                "quote",
                "--service",
                "1",
                "--pickup",
                "Sydney Opera House",
                "--dropoff-at",
                "-33.8523,151.2108",
                "--time",
                "14:30",
                "--package-type",
                "fragile-item",
            ])
            .unwrap();

            let Command::Quote(args) = cli.command else {
                panic!("expected quote command");
            };
            let inputs = args.into_inputs();
            assert_eq!(inputs.service_id, 1);
            assert_eq!(inputs.pickup, LocationInput::Address("Sydney Opera House".to_string()));
            assert_eq!(
                inputs.dropoff,
                LocationInput::Coordinates(GeoPoint::new(-33.8523, 151.2108).unwrap())
            );
            assert_eq!(inputs.time, NaiveTime::from_hms_opt(14, 30, 0));
            assert_eq!(inputs.package_type, Some(PackageType::FragileItem));
        }

        #[test]
        fn test_quote_requires_one_pickup_source() {
            let missing = CliConfig::try_parse_from([
                "courier-quote", "quote", "--service", "1", "--dropoff-here",
            ]);
            assert!(missing.is_err());

            let both = CliConfig::try_parse_from([
                "courier-quote", "quote", "--service", "1", "--pickup", "a", "--pickup-here",
                "--dropoff-here",
            ]);
            assert!(both.is_err());
        }

        #[test]
        fn test_distance_accepts_negative_coordinates() {
            let cli = CliConfig::try_parse_from([
                "courier-quote",
                "--verbose",
                "distance",
                "--from",
                "-33.8688,151.2093",
                "--to",
                "-33.8568,151.2153",
            ])
            .unwrap();
            assert!(cli.verbose);
            assert!(matches!(cli.command, Command::Distance { .. }));
        }
    }
}

#[cfg(feature = "cli")]
pub use args::{CliConfig, Command, QuoteArgs};
