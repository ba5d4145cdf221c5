/// Interactive setup wizard
///
/// Collects the Cloudflare credentials and preferences on stdin and writes
/// the configuration file, so normal runs can start from a known-good
/// config instead of half-set flags.
use crate::args::Args;
use crate::config::{self, Config};
use std::error::Error;
use std::io::{self, BufRead, Write};

const PROTOCOL_CHOICES: &[&str] = &["IPv4 Only", "IPv6 Only", "Both"];

pub fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    println!("Refer to this guide to find your Account and Zone IDs:");
    println!("  https://developers.cloudflare.com/fundamentals/account/find-account-and-zone-ids/");
    println!();

    let stdin = io::stdin();
    let mut input = stdin.lock();

    let api_key = prompt_required(&mut input, "Cloudflare API Key")?;
    let zone_id = prompt_required(&mut input, "Zone ID")?;
    let dns_record = prompt_required(&mut input, "DNS Record")?;
    let protocols = prompt_protocols(&mut input)?;
    let pushover_user_token =
        prompt(&mut input, "Pushover User Token (leave blank to disable)")?;

    let config = Config {
        zone_id,
        dns_record,
        api_key,
        protocols: protocols.to_string(),
        pushover_user_token,
    };

    let path = config::config_path(args.config.as_deref())?;
    config
        .save(&path)
        .map_err(|e| format!("Could not write configuration: {}", e))?;

    println!("Configuration written to {}", path.display());
    Ok(())
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<String, Box<dyn Error>> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_required(input: &mut impl BufRead, label: &str) -> Result<String, Box<dyn Error>> {
    loop {
        let value = prompt(input, label)?;
        if !value.is_empty() {
            return Ok(value);
        }
        println!("A value is required.");
    }
}

fn prompt_protocols(input: &mut impl BufRead) -> Result<&'static str, Box<dyn Error>> {
    println!("Which IP protocols do you update?");
    for (i, choice) in PROTOCOL_CHOICES.iter().enumerate() {
        println!("  {}) {}", i + 1, choice);
    }

    loop {
        let answer = prompt(input, "Choice [1-3]")?;
        if let Some(choice) = parse_protocol_choice(&answer) {
            return Ok(choice);
        }
        println!("Please enter 1, 2 or 3.");
    }
}

fn parse_protocol_choice(answer: &str) -> Option<&'static str> {
    match answer.trim() {
        "1" => Some(PROTOCOL_CHOICES[0]),
        "2" => Some(PROTOCOL_CHOICES[1]),
        "3" => Some(PROTOCOL_CHOICES[2]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_protocol_choice() {
        assert_eq!(parse_protocol_choice("1"), Some("IPv4 Only"));
        assert_eq!(parse_protocol_choice("2"), Some("IPv6 Only"));
        assert_eq!(parse_protocol_choice("3"), Some("Both"));
        assert_eq!(parse_protocol_choice(" 3 "), Some("Both"));
        assert_eq!(parse_protocol_choice("4"), None);
        assert_eq!(parse_protocol_choice("both"), None);
        assert_eq!(parse_protocol_choice(""), None);
    }

    #[test]
    fn test_prompt_required_retries_until_non_empty() {
        let mut input = io::Cursor::new(b"\n\nzone123\n".to_vec());
        let value = prompt_required(&mut input, "Zone ID").unwrap();
        assert_eq!(value, "zone123");
    }

    #[test]
    fn test_prompt_protocols_retries_on_junk() {
        let mut input = io::Cursor::new(b"x\n9\n2\n".to_vec());
        let choice = prompt_protocols(&mut input).unwrap();
        assert_eq!(choice, "IPv6 Only");
    }

    #[test]
    fn test_prompt_trims_whitespace() {
        let mut input = io::Cursor::new(b"  hello world  \n".to_vec());
        let value = prompt(&mut input, "Anything").unwrap();
        assert_eq!(value, "hello world");
    }
}
