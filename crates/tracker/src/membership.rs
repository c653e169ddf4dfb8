use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storage::StoreGateway;
use storage::models::{Group, GroupId};
use tracing::info;

use crate::error::Result;

const GROUP_ID_PREFIX: &str = "fam-";

/// Who is acting, as supplied by the sign-in provider. Only `member_id` is
/// ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub member_id: String,
    pub display_name: String,
}

impl Identity {
    pub fn new(member_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// `fam-` followed by the millisecond timestamp in base 36.
pub fn new_group_id(now: DateTime<Utc>) -> GroupId {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    GroupId::new(format!("{}{}", GROUP_ID_PREFIX, to_base36(millis)))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.iter().rev().map(|d| *d as char).collect()
}

/// Found a new group with `identity` as its only member.
pub async fn create_group<G: StoreGateway + ?Sized>(
    gateway: &G,
    identity: &Identity,
) -> Result<GroupId> {
    let group_id = new_group_id(Utc::now());
    gateway
        .join_group(&group_id, &identity.member_id, true)
        .await?;
    info!(group_id = %group_id, member = %identity.member_id, "group created");
    Ok(group_id)
}

/// Join an existing group. Fails with `NotFound` when it does not exist.
pub async fn join_group<G: StoreGateway + ?Sized>(
    gateway: &G,
    group_id: &GroupId,
    identity: &Identity,
) -> Result<Group> {
    let group = gateway
        .join_group(group_id, &identity.member_id, false)
        .await?;
    info!(group_id = %group_id, member = %identity.member_id, "joined group");
    Ok(group)
}
