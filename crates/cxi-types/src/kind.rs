use std::fmt;

use crate::id::IdShape;

/// Classes that are persisted as generic objects and may be referenced by
/// other objects. References to any of these decode to an id.
const GENERIC_CLASSES: &[&str] = &[
    "BodyContent",
    "Comment",
    "ContentProperty",
    "CustomContentEntityObject",
    "Draft",
    "Label",
    "Labelling",
    "Notification",
    "OutgoingLink",
    "PageTemplate",
    "ReferralLink",
    "User",
];

/// The kind of a decoded object, selected by its declared class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Page,
    BlogPost,
    Space,
    /// Space description, stored as a page flagged as home page.
    SpaceDescription,
    Attachment,
    InternalUser,
    /// User implementation keyed by an opaque credential key.
    UserImpl,
    InternalGroup,
    /// Group membership link; folded into the parent group record.
    Membership,
    SpacePermission,
    ContentPermission,
    ContentPermissionSet,
    /// Catch-all for any other class, carrying the declared class name.
    Object(String),
}

impl EntityKind {
    /// Select the kind for a declared object class.
    pub fn from_class(class: &str) -> Self {
        match class {
            "Page" => Self::Page,
            "BlogPost" => Self::BlogPost,
            "Space" => Self::Space,
            "SpaceDescription" => Self::SpaceDescription,
            "Attachment" => Self::Attachment,
            "InternalUser" => Self::InternalUser,
            "ConfluenceUserImpl" => Self::UserImpl,
            "InternalGroup" => Self::InternalGroup,
            "HibernateMembership" => Self::Membership,
            "SpacePermission" => Self::SpacePermission,
            "ContentPermission" => Self::ContentPermission,
            "ContentPermissionSet" => Self::ContentPermissionSet,
            other => Self::Object(other.to_string()),
        }
    }

    /// Returns `true` when a property declared with `class` is a reference
    /// to a persisted entity rather than an unsupported value to skip.
    pub fn is_reference_class(class: &str) -> bool {
        !matches!(Self::from_class(class), Self::Object(_)) || GENERIC_CLASSES.contains(&class)
    }

    /// The declared class name this kind was decoded from.
    pub fn class_name(&self) -> &str {
        match self {
            Self::Page => "Page",
            Self::BlogPost => "BlogPost",
            Self::Space => "Space",
            Self::SpaceDescription => "SpaceDescription",
            Self::Attachment => "Attachment",
            Self::InternalUser => "InternalUser",
            Self::UserImpl => "ConfluenceUserImpl",
            Self::InternalGroup => "InternalGroup",
            Self::Membership => "HibernateMembership",
            Self::SpacePermission => "SpacePermission",
            Self::ContentPermission => "ContentPermission",
            Self::ContentPermissionSet => "ContentPermissionSet",
            Self::Object(class) => class,
        }
    }

    /// Shape of the id this kind is addressed by.
    pub fn id_shape(&self) -> IdShape {
        match self {
            Self::UserImpl => IdShape::Key,
            _ => IdShape::Numeric,
        }
    }

    /// Returns `true` for the kinds whose current versions are indexed per
    /// space.
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Page | Self::BlogPost)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_classes_map_to_kinds() {
        assert_eq!(EntityKind::from_class("Page"), EntityKind::Page);
        assert_eq!(EntityKind::from_class("ConfluenceUserImpl"), EntityKind::UserImpl);
        assert_eq!(
            EntityKind::from_class("HibernateMembership"),
            EntityKind::Membership
        );
    }

    #[test]
    fn unknown_class_is_generic_object() {
        let kind = EntityKind::from_class("BodyContent");
        assert_eq!(kind, EntityKind::Object("BodyContent".into()));
        assert_eq!(kind.class_name(), "BodyContent");
    }

    #[test]
    fn reference_classes() {
        assert!(EntityKind::is_reference_class("Space"));
        assert!(EntityKind::is_reference_class("ConfluenceUserImpl"));
        assert!(EntityKind::is_reference_class("BodyContent"));
        assert!(!EntityKind::is_reference_class("java.lang.String"));
        assert!(!EntityKind::is_reference_class("SomethingElse"));
    }

    #[test]
    fn only_user_impl_is_key_shaped() {
        assert_eq!(EntityKind::UserImpl.id_shape(), IdShape::Key);
        assert_eq!(EntityKind::Page.id_shape(), IdShape::Numeric);
        assert_eq!(EntityKind::Object("Label".into()).id_shape(), IdShape::Numeric);
    }

    #[test]
    fn class_name_roundtrips() {
        for class in [
            "Page",
            "BlogPost",
            "Space",
            "SpaceDescription",
            "Attachment",
            "InternalUser",
            "ConfluenceUserImpl",
            "InternalGroup",
            "HibernateMembership",
            "SpacePermission",
            "ContentPermission",
            "ContentPermissionSet",
            "Label",
        ] {
            assert_eq!(EntityKind::from_class(class).class_name(), class);
        }
    }
}
