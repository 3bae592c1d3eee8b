use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        idp_url: matches
            .get_one("idp-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --idp-url"))?,
        public_url: matches
            .get_one("public-url")
            .map_or_else(|| "http://localhost:8080".to_string(), |s: &String| s.to_string()),
        session_ttl_seconds: matches
            .get_one::<i64>("session-ttl")
            .copied()
            .unwrap_or(43_200),
        submit_timeout_seconds: matches
            .get_one::<u64>("submit-timeout")
            .copied()
            .unwrap_or(30),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn handler_builds_the_server_action() {
        temp_env::with_vars(
            [
                ("GATEHOUSE_PORT", None::<String>),
                ("GATEHOUSE_PUBLIC_URL", None),
                ("GATEHOUSE_SESSION_TTL", None),
                ("GATEHOUSE_SUBMIT_TIMEOUT", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "gatehouse",
                    "--idp-url",
                    "https://auth.tld/api/auth",
                    "--session-ttl",
                    "600",
                    "--submit-timeout",
                    "5",
                ]);

                let action = handler(&matches).expect("server action");
                let Action::Server {
                    port,
                    idp_url,
                    public_url,
                    session_ttl_seconds,
                    submit_timeout_seconds,
                } = action;
                assert_eq!(port, 8080);
                assert_eq!(idp_url, "https://auth.tld/api/auth");
                assert_eq!(public_url, "http://localhost:8080");
                assert_eq!(session_ttl_seconds, 600);
                assert_eq!(submit_timeout_seconds, 5);
            },
        );
    }
}
