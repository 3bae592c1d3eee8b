use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("gatehouse")
        .about("Session-gated authentication front")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("GATEHOUSE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("idp-url")
                .long("idp-url")
                .help("Identity provider base URL, example: https://auth.tld/api/auth")
                .env("GATEHOUSE_IDP_URL")
                .required(true),
        )
        .arg(
            Arg::new("public-url")
                .long("public-url")
                .help("Public base URL of this service; https enables the Secure cookie flag")
                .default_value("http://localhost:8080")
                .env("GATEHOUSE_PUBLIC_URL"),
        )
        .arg(
            Arg::new("session-ttl")
                .long("session-ttl")
                .help("Session cookie lifetime in seconds")
                .default_value("43200")
                .env("GATEHOUSE_SESSION_TTL")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("submit-timeout")
                .long("submit-timeout")
                .help("Upper bound in seconds for a single identity provider call")
                .default_value("30")
                .env("GATEHOUSE_SUBMIT_TIMEOUT")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("GATEHOUSE_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
