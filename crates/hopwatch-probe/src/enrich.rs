use std::net::IpAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use hopwatch_model::OwnershipInfo;
use regex::Regex;

use crate::error::ProbeError;
use crate::runner::CommandRunner;

pub const WHOIS_TIMEOUT: Duration = Duration::from_secs(5);

static ORG_FIELD: OnceLock<Regex> = OnceLock::new();
static COUNTRY_FIELD: OnceLock<Regex> = OnceLock::new();

/// Looks up who owns a public hop address.
pub struct HopEnricher {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl HopEnricher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: WHOIS_TIMEOUT,
        }
    }

    pub fn enrich(&self, ip: &str) -> OwnershipInfo {
        if is_private_address(ip) {
            return OwnershipInfo::default();
        }

        match self.lookup(ip) {
            Ok(info) => info,
            Err(err) => {
                tracing::debug!(ip, error = %err, "ownership lookup skipped");
                OwnershipInfo::default()
            }
        }
    }

    fn lookup(&self, ip: &str) -> Result<OwnershipInfo, ProbeError> {
        let output = self.runner.run("whois", &[ip.to_string()], self.timeout)?;
        if !output.exit_ok {
            return Err(ProbeError::LookupFailure {
                ip: ip.to_string(),
                reason: "whois exited unsuccessfully".to_string(),
            });
        }
        let info = parse_whois(&output.stdout);
        if info == OwnershipInfo::default() {
            return Err(ProbeError::LookupFailure {
                ip: ip.to_string(),
                reason: "no organization or country field".to_string(),
            });
        }
        Ok(info)
    }
}

/// Addresses that never go to the registry: RFC 1918 space, loopback, link-local,
/// unspecified, and anything that is not an address at all (e.g. "Timed Out").
pub fn is_private_address(ip: &str) -> bool {
    match ip.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        Ok(IpAddr::V6(v6)) => {
            v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
        Err(_) => true,
    }
}

/// Pulls organization and country out of free-form registry text. First match wins.
pub fn parse_whois(text: &str) -> OwnershipInfo {
    let org_re = ORG_FIELD.get_or_init(|| {
        Regex::new(r"(?im)^\s*(?:OrgName|org-name|organization|descr):[ \t]+(\S.*?)\s*$")
            .expect("valid org regex")
    });
    let country_re = COUNTRY_FIELD.get_or_init(|| {
        Regex::new(r"(?im)^\s*country:[ \t]+(\S.*?)\s*$").expect("valid country regex")
    });

    let mut info = OwnershipInfo::default();
    if let Some(caps) = org_re.captures(text) {
        info.org_name = caps[1].to_string();
    }
    if let Some(caps) = country_re.captures(text) {
        info.country = caps[1].to_string();
    }
    info
}
