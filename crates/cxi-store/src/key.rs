use std::fmt;
use std::path::PathBuf;

use cxi_types::{EntityId, IdShape};

/// Address of one persisted record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    /// Pages, blog posts and space descriptions.
    Page(i64),
    Space(i64),
    SpacePermission { space: i64, permission: i64 },
    Attachment { page: i64, attachment: i64 },
    /// Generic objects of any other class.
    Object(i64),
    InternalUser(i64),
    UserImpl(String),
    Group(i64),
    ContentPermissionSet(i64),
    /// Stored at `contentPermissionSets/<set>/<set>/<permission>`. The
    /// permission id is one level below the bare
    /// `contentPermissionSets/<set>/<set>` directory so that several
    /// permissions of one set do not overwrite each other.
    ContentPermission { set: i64, permission: i64 },
}

impl RecordKey {
    /// Logical path segments of the record directory.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Self::Page(id) => vec!["pages".into(), id.to_string()],
            Self::Space(id) => vec!["spaces".into(), id.to_string()],
            Self::SpacePermission { space, permission } => vec![
                "spaces".into(),
                space.to_string(),
                "permissions".into(),
                permission.to_string(),
            ],
            Self::Attachment { page, attachment } => {
                vec![page.to_string(), "attachments".into(), attachment.to_string()]
            }
            Self::Object(id) => vec!["objects".into(), id.to_string()],
            Self::InternalUser(id) => vec!["internalusers".into(), id.to_string()],
            Self::UserImpl(key) => vec!["userimpls".into(), escape_key(key)],
            Self::Group(id) => vec!["groups".into(), id.to_string()],
            Self::ContentPermissionSet(id) => vec!["contentPermissionSets".into(), id.to_string()],
            // Readers expect `contentPermissionSets/<setId>/<setId>/`.
            Self::ContentPermission { set, permission } => vec![
                "contentPermissionSets".into(),
                set.to_string(),
                set.to_string(),
                permission.to_string(),
            ],
        }
    }

    /// Relative directory of the record inside a store root.
    pub fn relative_dir(&self) -> PathBuf {
        self.segments().into_iter().collect()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("/"))
    }
}

/// A family of records enumerable by id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordSet {
    Pages,
    Spaces,
    SpacePermissions { space: i64 },
    Attachments { page: i64 },
    Objects,
    InternalUsers,
    UserImpls,
    Groups,
    ContentPermissionSets,
    ContentPermissions { set: i64 },
}

impl RecordSet {
    /// Shape of the ids in this set.
    pub fn shape(&self) -> IdShape {
        match self {
            Self::UserImpls => IdShape::Key,
            _ => IdShape::Numeric,
        }
    }

    /// Logical path segments of the directory holding the set's records.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Self::Pages => vec!["pages".into()],
            Self::Spaces => vec!["spaces".into()],
            Self::SpacePermissions { space } => {
                vec!["spaces".into(), space.to_string(), "permissions".into()]
            }
            Self::Attachments { page } => vec![page.to_string(), "attachments".into()],
            Self::Objects => vec!["objects".into()],
            Self::InternalUsers => vec!["internalusers".into()],
            Self::UserImpls => vec!["userimpls".into()],
            Self::Groups => vec!["groups".into()],
            Self::ContentPermissionSets => vec!["contentPermissionSets".into()],
            Self::ContentPermissions { set } => vec![
                "contentPermissionSets".into(),
                set.to_string(),
                set.to_string(),
            ],
        }
    }

    /// Relative directory of the set inside a store root.
    pub fn relative_dir(&self) -> PathBuf {
        self.segments().into_iter().collect()
    }

    /// Build the key of a member of this set.
    pub fn key(&self, id: &EntityId) -> Option<RecordKey> {
        let key = match (self, id) {
            (Self::UserImpls, EntityId::Key(k)) => RecordKey::UserImpl(k.clone()),
            (_, EntityId::Key(_)) | (Self::UserImpls, _) => return None,
            (set, EntityId::Numeric(n)) => {
                let n = *n;
                match set {
                    Self::Pages => RecordKey::Page(n),
                    Self::Spaces => RecordKey::Space(n),
                    Self::SpacePermissions { space } => RecordKey::SpacePermission {
                        space: *space,
                        permission: n,
                    },
                    Self::Attachments { page } => RecordKey::Attachment {
                        page: *page,
                        attachment: n,
                    },
                    Self::Objects => RecordKey::Object(n),
                    Self::InternalUsers => RecordKey::InternalUser(n),
                    Self::Groups => RecordKey::Group(n),
                    Self::ContentPermissionSets => RecordKey::ContentPermissionSet(n),
                    Self::ContentPermissions { set } => RecordKey::ContentPermission {
                        set: *set,
                        permission: n,
                    },
                    Self::UserImpls => return None,
                }
            }
        };
        Some(key)
    }

    /// The id of `key` within this set, if `key` belongs to it.
    pub fn member_id(&self, key: &RecordKey) -> Option<EntityId> {
        let id = match (self, key) {
            (Self::Pages, RecordKey::Page(n))
            | (Self::Spaces, RecordKey::Space(n))
            | (Self::Objects, RecordKey::Object(n))
            | (Self::InternalUsers, RecordKey::InternalUser(n))
            | (Self::Groups, RecordKey::Group(n))
            | (Self::ContentPermissionSets, RecordKey::ContentPermissionSet(n)) => {
                EntityId::Numeric(*n)
            }
            (Self::SpacePermissions { space }, RecordKey::SpacePermission { space: s, permission })
                if space == s =>
            {
                EntityId::Numeric(*permission)
            }
            (Self::Attachments { page }, RecordKey::Attachment { page: p, attachment })
                if page == p =>
            {
                EntityId::Numeric(*attachment)
            }
            (Self::ContentPermissions { set }, RecordKey::ContentPermission { set: s, permission })
                if set == s =>
            {
                EntityId::Numeric(*permission)
            }
            (Self::UserImpls, RecordKey::UserImpl(k)) => EntityId::Key(k.clone()),
            _ => return None,
        };
        Some(id)
    }

    /// Decode a directory name listed under this set back into an id.
    pub fn parse_dir_name(&self, name: &str) -> Option<EntityId> {
        match self.shape() {
            IdShape::Numeric => name.parse().ok().map(EntityId::Numeric),
            IdShape::Key => unescape_key(name).map(EntityId::Key),
        }
    }
}

/// Make an opaque key safe as a single path segment.
///
/// Alphanumerics, `-`, `_` and `.` pass through (except a leading `.`);
/// everything else is written as `%XX` per UTF-8 byte.
pub(crate) fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let plain = byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_') || (byte == b'.' && i > 0);
        if plain {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Inverse of [`escape_key`]. Returns `None` for malformed escapes.
pub(crate) fn unescape_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_keyspace() {
        assert_eq!(RecordKey::Page(1).to_string(), "pages/1");
        assert_eq!(
            RecordKey::SpacePermission { space: 2, permission: 3 }.to_string(),
            "spaces/2/permissions/3"
        );
        assert_eq!(
            RecordKey::Attachment { page: 4, attachment: 5 }.to_string(),
            "4/attachments/5"
        );
        assert_eq!(RecordKey::UserImpl("ab12".into()).to_string(), "userimpls/ab12");
        assert_eq!(
            RecordKey::ContentPermission { set: 7, permission: 8 }.to_string(),
            "contentPermissionSets/7/7/8"
        );
    }

    #[test]
    fn set_and_key_agree() {
        let sets = [
            (RecordSet::Pages, EntityId::from(1)),
            (RecordSet::SpacePermissions { space: 2 }, EntityId::from(3)),
            (RecordSet::Attachments { page: 4 }, EntityId::from(5)),
            (RecordSet::UserImpls, EntityId::from("k/1")),
            (RecordSet::ContentPermissions { set: 7 }, EntityId::from(8)),
        ];
        for (set, id) in sets {
            let key = set.key(&id).unwrap();
            assert_eq!(set.member_id(&key), Some(id.clone()));
            let mut parent = key.segments();
            let leaf = parent.pop().unwrap();
            assert_eq!(parent, set.segments());
            assert_eq!(set.parse_dir_name(&leaf), Some(id));
        }
    }

    #[test]
    fn member_id_rejects_other_parents() {
        let key = RecordKey::Attachment { page: 4, attachment: 5 };
        assert_eq!(RecordSet::Attachments { page: 9 }.member_id(&key), None);
        assert_eq!(RecordSet::Pages.member_id(&key), None);
    }

    #[test]
    fn key_rejects_wrong_shape() {
        assert!(RecordSet::Pages.key(&EntityId::from("x")).is_none());
        assert!(RecordSet::UserImpls.key(&EntityId::from(1)).is_none());
    }

    #[test]
    fn escape_roundtrip() {
        for key in ["plain", "with/slash", "..", "ünï", "a b%c"] {
            let escaped = escape_key(key);
            assert!(!escaped.contains('/'));
            assert!(!escaped.starts_with('.'));
            assert_eq!(unescape_key(&escaped).as_deref(), Some(key));
        }
    }

    #[test]
    fn unescape_rejects_truncated() {
        assert_eq!(unescape_key("abc%2"), None);
        assert_eq!(unescape_key("%zz"), None);
    }
}
