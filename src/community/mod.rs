pub mod analysis;
pub mod store;

use std::fmt;

use crate::quiz::catalog::TypeCatalog;
use crate::quiz::type_code::TypeCode;
use store::GroupStore;

/// Group name plus passphrase. Both are used verbatim, whitespace included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub name: String,
    pub passphrase: String,
}

impl GroupKey {
    pub fn new(name: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Record id: any difference in either part yields a different group.
    pub fn record_id(&self) -> String {
        format!("{}_{}", self.name, self.passphrase)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Kept as stored text; older or hand-edited records may not parse as a type.
    #[serde(rename = "type")]
    pub type_code: String,
    #[serde(default)]
    pub note: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub name: String,
    pub type_code: TypeCode,
    pub note: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Debug)]
pub enum GroupError {
    MissingField,
    MissingType,
    DuplicateName(String),
    GroupNotFound,
    Forbidden,
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField => write!(f, "please fill in every field"),
            Self::MissingType => write!(
                f,
                "finish the test or pick a type from the type list first"
            ),
            Self::DuplicateName(name) => write!(
                f,
                "the name \"{name}\" is already taken in this group, please choose another"
            ),
            Self::GroupNotFound => write!(f, "no such group, or the passphrase is wrong"),
            Self::Forbidden => write!(f, "not allowed"),
            Self::Io(err) => write!(f, "group store io: {err}"),
            Self::Json(err) => write!(f, "group store json: {err}"),
        }
    }
}

impl std::error::Error for GroupError {}

impl From<std::io::Error> for GroupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for GroupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Adds the caller's type to a group, creating the group on first use.
pub async fn save_result<S: GroupStore>(
    store: &S,
    key: &GroupKey,
    member_name: &str,
    type_code: Option<TypeCode>,
    types: Option<&TypeCatalog>,
    now_ms: u64,
) -> Result<Member, GroupError> {
    let name = member_name.trim();
    if name.is_empty() || key.name.is_empty() || key.passphrase.is_empty() {
        return Err(GroupError::MissingField);
    }
    let type_code = type_code.ok_or(GroupError::MissingType)?;

    let note = types
        .and_then(|catalog| catalog.get(&type_code))
        .map(|profile| {
            if profile.summary.is_empty() {
                profile.name.clone()
            } else {
                profile.summary.clone()
            }
        })
        .unwrap_or_default();

    store.create_if_absent(key, now_ms).await?;
    let member = store
        .append_member(
            key,
            NewMember {
                name: name.to_string(),
                type_code,
                note,
                created_at: now_ms,
            },
        )
        .await?;
    log::info!("Saved {} ({}) to group {}", member.name, member.type_code, key.name);
    Ok(member)
}

pub async fn load_members<S: GroupStore>(store: &S, key: &GroupKey) -> Result<Group, GroupError> {
    if key.name.is_empty() || key.passphrase.is_empty() {
        return Err(GroupError::MissingField);
    }
    store.list_members(key).await
}

pub async fn remove_member<S: GroupStore>(
    store: &S,
    key: &GroupKey,
    member_id: &str,
) -> Result<(), GroupError> {
    store.delete_member(key, member_id).await.map_err(|err| match err {
        GroupError::GroupNotFound => GroupError::Forbidden,
        other => other,
    })
}
