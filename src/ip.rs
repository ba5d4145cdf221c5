/// Public IP discovery by consensus
///
/// Each enabled address family is resolved by asking several independent
/// what's-my-IP services and taking the majority answer. A single service
/// being down, slow, or lying does not break the run; zero usable answers
/// for an enabled family does.
use std::error::Error;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

// Family-pinned endpoints; a dual-stack host would otherwise answer an
// IPv4 query over IPv6 and vice versa.
const IPV4_SERVICES: &[&str] = &[
    "https://ipv4.icanhazip.com",
    "https://api.ipify.org",
    "https://ipv4.seeip.org",
    "https://v4.ident.me",
];

const IPV6_SERVICES: &[&str] = &[
    "https://ipv6.icanhazip.com",
    "https://api6.ipify.org",
    "https://ipv6.seeip.org",
    "https://v6.ident.me",
];

/// Determine the current public IPv4 address.
pub fn discover_ipv4() -> Result<Ipv4Addr, Box<dyn Error>> {
    discover("IPv4", IPV4_SERVICES)
}

/// Determine the current public IPv6 address.
pub fn discover_ipv6() -> Result<Ipv6Addr, Box<dyn Error>> {
    discover("IPv6", IPV6_SERVICES)
}

fn discover<T>(family: &str, services: &[&str]) -> Result<T, Box<dyn Error>>
where
    T: FromStr + PartialEq + Copy,
{
    let mut answers = Vec::new();

    for service in services {
        match try_service(service) {
            Ok(body) => match body.trim().parse::<T>() {
                Ok(ip) => answers.push(ip),
                Err(_) => {
                    log::debug!("{} returned a non-{} answer: {}", service, family, body.trim())
                }
            },
            Err(e) => log::debug!("Failed to get IP from {}: {}", service, e),
        }
    }

    majority(&answers).ok_or_else(|| {
        format!(
            "could not determine public {} address from any service",
            family
        )
        .into()
    })
}

fn try_service(url: &str) -> Result<String, Box<dyn Error>> {
    let resp = minreq::get(url)
        .with_header("User-Agent", crate::USER_AGENT)
        .with_timeout(10)
        .send()?;
    Ok(resp.as_str()?.to_string())
}

/// Pick the most common answer; ties go to the earliest answer that reached
/// the winning count. `None` when there are no answers at all.
fn majority<T: PartialEq + Copy>(answers: &[T]) -> Option<T> {
    let mut best: Option<(T, usize)> = None;

    for &answer in answers {
        let count = answers.iter().filter(|&&a| a == answer).count();
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((answer, count)),
        }
    }

    best.map(|(answer, _)| answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_majority_simple() {
        let answers = [
            "203.0.113.5".parse::<Ipv4Addr>().unwrap(),
            "203.0.113.5".parse().unwrap(),
            "198.51.100.1".parse().unwrap(),
        ];
        assert_eq!(majority(&answers), Some("203.0.113.5".parse().unwrap()));
    }

    #[test]
    fn test_majority_unanimous() {
        let ip: Ipv6Addr = "2001:db8::2".parse().unwrap();
        assert_eq!(majority(&[ip, ip, ip]), Some(ip));
    }

    #[test]
    fn test_majority_tie_prefers_first() {
        let a: Ipv4Addr = "203.0.113.5".parse().unwrap();
        let b: Ipv4Addr = "198.51.100.1".parse().unwrap();
        assert_eq!(majority(&[a, b]), Some(a));
        assert_eq!(majority(&[b, a, b, a]), Some(b));
    }

    #[test]
    fn test_majority_empty() {
        let answers: [Ipv4Addr; 0] = [];
        assert_eq!(majority(&answers), None);
    }

    #[test]
    fn test_wrong_family_answers_do_not_parse() {
        // An IPv6 answer must never be accepted as an IPv4 consensus vote
        assert!("2001:db8::2".parse::<Ipv4Addr>().is_err());
        assert!("203.0.113.5".parse::<Ipv6Addr>().is_err());
    }
}
