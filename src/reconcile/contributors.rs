//! Organization invitations for repository contributors.
//!
//! Everyone who contributed to a tracked repository and is neither an
//! organization member, a member of a configured team, nor a bot gets an
//! invitation. Nobody is ever removed.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use crate::config::TeamSpec;
use crate::error::Result;
use crate::github::{is_bot, GithubOperations};

/// Contributors to invite, login to account id.
pub fn plan_contributors(
    ops: &dyn GithubOperations,
    repos: &[String],
    teams: &[TeamSpec],
) -> Result<BTreeMap<String, u64>> {
    let mut contributors = BTreeMap::new();
    for repo in repos {
        contributors.extend(ops.list_contributors(repo)?);
    }

    let mut known: BTreeSet<String> = ops.list_org_members()?;
    for team in teams {
        match ops.list_team_members(&team.slug) {
            Ok(members) => known.extend(members),
            Err(e) if e.is_not_found() => debug!("team {} does not exist yet", team.slug),
            Err(e) => return Err(e),
        }
    }

    contributors.retain(|login, _| !known.contains(login) && !is_bot(login));
    Ok(contributors)
}

pub fn apply_contributors(ops: &dyn GithubOperations, invitations: &BTreeMap<String, u64>) -> Result<()> {
    for (login, id) in invitations {
        ops.invite_org_member(*id)?;
        info!("invited {} ({}) to {}", login, id, ops.owner());
    }
    Ok(())
}

/// Invites every outside contributor. Returns who was invited.
pub fn sync_contributors(
    ops: &dyn GithubOperations,
    repos: &[String],
    teams: &[TeamSpec],
) -> Result<BTreeMap<String, u64>> {
    let invitations = plan_contributors(ops, repos, teams)?;
    apply_contributors(ops, &invitations)?;
    Ok(invitations)
}
