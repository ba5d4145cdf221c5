/// Update decision and reconciliation
///
/// One pass per invocation: load the persisted state, discover the public
/// address for each enabled family, decide which families actually changed,
/// push those changes to Cloudflare, then persist the new state and notify.
/// The decision steps are pure functions over plain data so they can be
/// tested without any network in play.
use crate::args::Args;
use crate::cloudflare::{CloudflareClient, DnsRecord};
use crate::config::Config;
use crate::state::{self, State};
use crate::{ip, pushover};
use std::error::Error;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

/// Addresses discovered for this run. A family is present only when it is
/// enabled in the configuration and discovery succeeded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discovered {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

/// The subset of address families that need a remote update, each carrying
/// the address to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none()
    }

    /// The changed addresses in IPv4-then-IPv6 order, for log and
    /// notification text.
    pub fn addresses(&self) -> Vec<String> {
        self.ipv4
            .iter()
            .chain(self.ipv6.iter())
            .cloned()
            .collect()
    }
}

/// Which families actually had a matching remote record rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub ipv4: bool,
    pub ipv6: bool,
}

/// Decide which enabled families need updating. A family is changed when it
/// was discovered and either the force flag is set or the discovered address
/// differs from the persisted one. State written for a different record name
/// cannot vouch for this one, so a name mismatch acts like a forced run.
pub fn detect_changes(
    discovered: Discovered,
    state: &State,
    config: &Config,
    force: bool,
) -> ChangeSet {
    let force = force || state.dns_record != config.dns_record;
    let mut changes = ChangeSet::default();

    if config.ipv4_enabled() {
        if let Some(ipv4) = discovered.ipv4 {
            let current = ipv4.to_string();
            if force || current != state.last_ipv4 {
                changes.ipv4 = Some(current);
            }
        }
    }

    if config.ipv6_enabled() {
        if let Some(ipv6) = discovered.ipv6 {
            let current = ipv6.to_string();
            if force || current != state.last_ipv6 {
                changes.ipv6 = Some(current);
            }
        }
    }

    changes
}

/// A single record mutation to push upstream.
#[derive(Debug)]
pub struct PendingUpdate<'a> {
    pub record: &'a DnsRecord,
    pub content: &'a str,
}

/// Pair the retrieved records with the changed families: every exactly-named
/// A record picks up a pending IPv4, every AAAA a pending IPv6. Also reports
/// which families found at least one record to land on.
pub fn pair_records<'a>(
    records: &'a [DnsRecord],
    changes: &'a ChangeSet,
    record_name: &str,
) -> (Vec<PendingUpdate<'a>>, Applied) {
    let mut pending = Vec::new();
    let mut applied = Applied::default();

    for record in records {
        if record.name != record_name {
            continue;
        }

        match record.record_type.as_str() {
            "A" => {
                if let Some(ipv4) = &changes.ipv4 {
                    pending.push(PendingUpdate {
                        record,
                        content: ipv4,
                    });
                    applied.ipv4 = true;
                }
            }
            "AAAA" => {
                if let Some(ipv6) = &changes.ipv6 {
                    pending.push(PendingUpdate {
                        record,
                        content: ipv6,
                    });
                    applied.ipv6 = true;
                }
            }
            _ => {}
        }
    }

    (pending, applied)
}

/// Push the changed addresses to Cloudflare. The target records must already
/// exist; a missing record *type* for one family is logged and skipped while
/// the other family proceeds, but a failing API call aborts immediately.
pub fn reconcile(
    client: &CloudflareClient,
    config: &Config,
    changes: &ChangeSet,
) -> Result<Applied, Box<dyn Error>> {
    let records = client.list_records(&config.dns_record)?;

    if records.is_empty() {
        return Err(format!(
            "no DNS record found for {} in Zone {}. make sure they exist before attempting to update",
            config.dns_record, config.zone_id
        )
        .into());
    }

    let (pending, applied) = pair_records(&records, changes, &config.dns_record);

    for update in &pending {
        client
            .update_record(update.record, update.content)
            .map_err(|e| {
                format!(
                    "could not update {} record: {}",
                    update.record.record_type, e
                )
            })?;
    }

    if changes.ipv4.is_some() && !applied.ipv4 {
        log::error!(
            "Could not find IPv4 (A) record for {} in Zone {}",
            config.dns_record,
            config.zone_id
        );
    }
    if changes.ipv6.is_some() && !applied.ipv6 {
        log::error!(
            "Could not find IPv6 (AAAA) record for {} in Zone {}",
            config.dns_record,
            config.zone_id
        );
    }

    Ok(applied)
}

/// Fold the outcome of a reconciliation back into the state and persist it.
/// Only families that actually landed on a record are merged; the record
/// name and timestamp always advance. The remote side already changed by
/// the time this runs, so a failed write has to be loud: the operator must
/// reconcile manually.
pub fn commit_state(
    state: &mut State,
    changes: &ChangeSet,
    applied: Applied,
    dns_record: &str,
    state_file: &Path,
) -> Result<(), Box<dyn Error>> {
    if applied.ipv4 {
        if let Some(ipv4) = &changes.ipv4 {
            state.last_ipv4 = ipv4.clone();
        }
    }
    if applied.ipv6 {
        if let Some(ipv6) = &changes.ipv6 {
            state.last_ipv6 = ipv6.clone();
        }
    }
    state.dns_record = dns_record.to_string();
    state.last_update_time = state::current_timestamp();

    state.save(state_file).map_err(|e| -> Box<dyn Error> {
        format!(
            "Cloudflare was updated but the state file could not be written ({}): {}",
            state_file.display(),
            e
        )
        .into()
    })
}

/// The whole reconciliation pass: state in, decisions, remote updates,
/// state out, notification.
pub fn run(args: &Args, config: &Config) -> Result<(), Box<dyn Error>> {
    let state_file = state::state_path(args.state_file.as_deref())?;
    let mut state = State::load(&state_file);
    log::trace!("State: {:?}", state);

    // Attempt every enabled family before bailing, so a broken IPv6 path
    // still logs alongside a working IPv4 one.
    let mut discovered = Discovered::default();
    let mut discovery_failed = false;

    if config.ipv4_enabled() {
        match ip::discover_ipv4() {
            Ok(ipv4) => discovered.ipv4 = Some(ipv4),
            Err(e) => {
                log::error!("{}", e);
                discovery_failed = true;
            }
        }
    }

    if config.ipv6_enabled() {
        match ip::discover_ipv6() {
            Ok(ipv6) => discovered.ipv6 = Some(ipv6),
            Err(e) => {
                log::error!("{}", e);
                discovery_failed = true;
            }
        }
    }

    if discovery_failed {
        return Err("public IP discovery failed for an enabled protocol".into());
    }

    let changes = detect_changes(discovered, &state, config, args.force);

    if changes.is_empty() {
        log::info!("IP hasn't changed, not updating Cloudflare");
        return Ok(());
    }

    if let Some(ipv4) = &changes.ipv4 {
        log::info!("Updating IPv4 to {}", ipv4);
    }
    if let Some(ipv6) = &changes.ipv6 {
        log::info!("Updating IPv6 to {}", ipv6);
    }

    let client = CloudflareClient::new(config);
    let applied = reconcile(&client, config, &changes)
        .map_err(|e| format!("Could not update Cloudflare: {}", e))?;

    // Notification comes after this point, so a failed state write also
    // suppresses it.
    commit_state(
        &mut state,
        &changes,
        applied,
        &config.dns_record,
        &state_file,
    )?;

    if !config.pushover_user_token.is_empty() {
        pushover::notify(
            &config.pushover_user_token,
            &config.dns_record,
            &changes.addresses(),
        );
    }

    Ok(())
}
