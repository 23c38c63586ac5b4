use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::Mutex;

use super::{Group, GroupError, GroupKey, Member, NewMember};

const MEMBER_ID_LEN: usize = 20;

/// Where group records live. Keyed by [`GroupKey::record_id`].
pub trait GroupStore {
    fn create_if_absent(
        &self,
        key: &GroupKey,
        now_ms: u64,
    ) -> impl Future<Output = Result<(), GroupError>> + Send;

    /// Fails with `DuplicateName` if a member of that name exists, `GroupNotFound` if the group does not.
    fn append_member(
        &self,
        key: &GroupKey,
        member: NewMember,
    ) -> impl Future<Output = Result<Member, GroupError>> + Send;

    /// Members ordered by creation time.
    fn list_members(&self, key: &GroupKey) -> impl Future<Output = Result<Group, GroupError>> + Send;

    fn delete_member(
        &self,
        key: &GroupKey,
        member_id: &str,
    ) -> impl Future<Output = Result<(), GroupError>> + Send;
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct GroupRecord {
    name: String,
    created_at: u64,
    members: Vec<Member>,
}

/// Keeps every group in memory and rewrites one JSON file after each change.
#[derive(Debug)]
pub struct JsonGroupStore {
    path: Option<PathBuf>,
    groups: Mutex<BTreeMap<String, GroupRecord>>,
}

impl JsonGroupStore {
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            groups: Mutex::new(BTreeMap::new()),
        }
    }

    /// Opens the file at `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, GroupError> {
        let path = path.into();
        let groups = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path: Some(path),
            groups: Mutex::new(groups),
        })
    }

    /// Writes `groups` next to the store file and renames it over the old one,
    /// so a crash mid-write never leaves a torn file behind.
    async fn flush(&self, groups: &BTreeMap<String, GroupRecord>) -> Result<(), GroupError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(groups)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Applies `change` to a copy of the groups and keeps it only once it is on disk.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, GroupRecord>) -> Result<Option<T>, GroupError>,
    ) -> Result<Option<T>, GroupError> {
        let mut groups = self.groups.lock().await;
        let mut next = groups.clone();
        let Some(value) = change(&mut next)? else {
            return Ok(None);
        };
        self.flush(&next).await?;
        *groups = next;
        Ok(Some(value))
    }
}

fn new_member_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(MEMBER_ID_LEN)
        .map(char::from)
        .collect()
}

impl GroupStore for JsonGroupStore {
    async fn create_if_absent(&self, key: &GroupKey, now_ms: u64) -> Result<(), GroupError> {
        let created = self
            .commit(|groups| {
                if groups.contains_key(&key.record_id()) {
                    return Ok(None);
                }
                groups.insert(
                    key.record_id(),
                    GroupRecord {
                        name: key.name.clone(),
                        created_at: now_ms,
                        members: Vec::new(),
                    },
                );
                Ok(Some(()))
            })
            .await?;
        if created.is_some() {
            log::info!("Created group {}", key.name);
        }
        Ok(())
    }

    async fn append_member(&self, key: &GroupKey, member: NewMember) -> Result<Member, GroupError> {
        let appended = self
            .commit(|groups| {
                let record = groups
                    .get_mut(&key.record_id())
                    .ok_or(GroupError::GroupNotFound)?;
                if record.members.iter().any(|m| m.name == member.name) {
                    return Err(GroupError::DuplicateName(member.name));
                }

                let member = Member {
                    id: new_member_id(),
                    name: member.name,
                    type_code: member.type_code.to_string(),
                    note: member.note,
                    created_at: member.created_at,
                };
                record.members.push(member.clone());
                Ok(Some(member))
            })
            .await?;
        appended.ok_or(GroupError::GroupNotFound)
    }

    async fn list_members(&self, key: &GroupKey) -> Result<Group, GroupError> {
        let groups = self.groups.lock().await;
        let record = groups
            .get(&key.record_id())
            .ok_or(GroupError::GroupNotFound)?;

        let mut members = record.members.clone();
        members.sort_by_key(|m| m.created_at);
        let name = if record.name.is_empty() {
            key.name.clone()
        } else {
            record.name.clone()
        };
        Ok(Group { name, members })
    }

    async fn delete_member(&self, key: &GroupKey, member_id: &str) -> Result<(), GroupError> {
        self.commit(|groups| {
            let record = groups
                .get_mut(&key.record_id())
                .ok_or(GroupError::GroupNotFound)?;
            record.members.retain(|m| m.id != member_id);
            Ok(Some(()))
        })
        .await?;
        Ok(())
    }
}
