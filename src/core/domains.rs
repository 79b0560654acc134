use crate::utils::error::{LogoError, Result};
use std::collections::HashSet;

/// Public e-mail providers; participants on these are never "the customer".
pub const PUBLIC_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com", "yahoo.com", "hotmail.com", "aol.com", "hotmail.co.uk", "hotmail.fr", "msn.com",
    "yahoo.fr", "wanadoo.fr", "orange.fr", "comcast.net", "yahoo.co.uk", "yahoo.com.br",
    "yahoo.co.in", "live.com", "rediffmail.com", "free.fr", "gmx.de", "web.de", "yandex.ru",
    "ymail.com", "libero.it", "outlook.com", "uol.com.br", "bol.com.br", "mail.ru", "cox.net",
    "hotmail.it", "sbcglobal.net", "sfr.fr", "live.fr", "verizon.net", "live.co.uk",
    "googlemail.com", "yahoo.es", "ig.com.br", "live.nl", "bigpond.com", "terra.com.br",
    "yahoo.it", "neuf.fr", "yahoo.de", "alice.it", "rocketmail.com", "att.net", "laposte.net",
    "facebook.com", "bellsouth.net", "yahoo.in", "hotmail.es", "charter.net", "yahoo.ca",
    "yahoo.com.au", "rambler.ru", "hotmail.de", "tiscali.it", "shaw.ca", "yahoo.co.jp", "sky.com",
    "earthlink.net", "optonline.net", "freenet.de", "t-online.de", "aliceadsl.fr", "virgilio.it",
    "home.nl", "qq.com", "telenet.be", "me.com", "yahoo.com.ar", "tiscali.co.uk", "yahoo.com.mx",
    "voila.fr", "gmx.net", "mail.com", "planet.nl", "tin.it", "live.it", "ntlworld.com", "arcor.de",
    "yahoo.co.id", "frontiernet.net", "hetnet.nl", "live.com.au", "yahoo.com.sg", "zonnet.nl",
    "club-internet.fr", "juno.com", "optusnet.com.au", "blueyonder.co.uk", "bluewin.ch",
    "skynet.be", "sympatico.ca", "windstream.net", "mac.com", "centurytel.net", "chello.nl",
    "live.ca", "aim.com", "bigpond.net.au",
];

/// Domains to skip: the public providers plus the user's own exclusions.
#[derive(Debug, Clone)]
pub struct DomainFilter {
    ignored: HashSet<String>,
}

impl DomainFilter {
    pub fn new(extra: &[String]) -> Self {
        let ignored = PUBLIC_EMAIL_DOMAINS
            .iter()
            .map(|d| d.to_string())
            .chain(
                extra
                    .iter()
                    .map(|d| d.trim().to_lowercase())
                    .filter(|d| !d.is_empty()),
            )
            .collect();
        Self { ignored }
    }

    /// Only the given domains, without the public provider list.
    pub fn only(domains: &[String]) -> Self {
        Self {
            ignored: domains.iter().map(|d| d.trim().to_lowercase()).collect(),
        }
    }

    pub fn is_ignored(&self, domain: &str) -> bool {
        self.ignored.contains(domain)
    }
}

/// Domain part of an e-mail address, lower-cased.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.trim().rsplit_once('@')?;
    let domain = domain.trim().to_lowercase();
    (!domain.is_empty()).then_some(domain)
}

/// Returns the most frequent non-ignored domain. On a tie the domain that
/// appeared first in the participant list wins.
pub fn most_common_domain<S: AsRef<str>>(emails: &[S], filter: &DomainFilter) -> Result<String> {
    // 依出現順序累計，避免 HashMap 的不定順序影響平手結果
    let mut counts: Vec<(String, usize)> = Vec::new();

    for email in emails {
        let email = email.as_ref();
        let Some(domain) = email_domain(email) else {
            tracing::warn!("skipping participant address without a domain: '{}'", email);
            continue;
        };
        tracing::info!("user email: {} ---- domain: {}", email, domain);
        if filter.is_ignored(&domain) {
            continue;
        }
        match counts.iter_mut().find(|(d, _)| *d == domain) {
            Some((_, count)) => *count += 1,
            None => counts.push((domain, 1)),
        }
    }

    let mut best: Option<&(String, usize)> = None;
    for entry in &counts {
        let better = match best {
            None => true,
            Some((_, max)) => entry.1 > *max,
        };
        if better {
            best = Some(entry);
        }
    }

    best.map(|(domain, _)| domain.clone())
        .ok_or(LogoError::NoExternalParticipants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_common_domain() {
        let emails = ["a@x.com", "b@x.com", "c@y.com"];
        let domain = most_common_domain(&emails, &DomainFilter::only(&[])).unwrap();
        assert_eq!(domain, "x.com");
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let emails = ["a@y.com", "b@x.com", "c@x.com", "d@y.com"];
        let domain = most_common_domain(&emails, &DomainFilter::only(&[])).unwrap();
        assert_eq!(domain, "y.com");
    }

    #[test]
    fn test_public_and_configured_domains_are_ignored() {
        let filter = DomainFilter::new(&["Mycompany.com".to_string()]);
        let emails = [
            "me@mycompany.com",
            "colleague@mycompany.com",
            "someone@gmail.com",
            "other@hotmail.com",
            "buyer@customer.io",
        ];
        assert_eq!(most_common_domain(&emails, &filter).unwrap(), "customer.io");
    }

    #[test]
    fn test_only_ignored_domains_fails() {
        let filter = DomainFilter::new(&["mycompany.com".to_string()]);
        let emails = ["a@gmail.com", "b@mycompany.com"];
        let err = most_common_domain(&emails, &filter).unwrap_err();
        assert!(matches!(err, LogoError::NoExternalParticipants));

        let none: [&str; 0] = [];
        assert!(most_common_domain(&none, &filter).is_err());
    }

    #[test]
    fn test_malformed_addresses_are_skipped() {
        let emails = ["no-at-sign", "trailing@", "x@Example.COM"];
        let domain = most_common_domain(&emails, &DomainFilter::only(&[])).unwrap();
        assert_eq!(domain, "example.com");
    }
}
