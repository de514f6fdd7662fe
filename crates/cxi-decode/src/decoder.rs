use std::collections::HashMap;
use std::io::Read;

use cxi_range::IdRangeList;
use cxi_store::{ExportIndex, IndexBuilder, PropertyStore, RecordKey};
use cxi_types::{EntityId, EntityKind, PropertyRecord, PropertyValue};
use tracing::{debug, info, trace, warn};

use crate::error::{DecodeError, DecodeResult};
use crate::progress::{ImportListener, NoopListener, ProgressTracker};
use crate::xml::{ObjectReader, RawObject};

/// Marks a page or blog post as a historical revision.
pub const ORIGINAL_VERSION: &str = "originalVersion";
/// Flag set on space descriptions stored as pages.
pub const HOMEPAGE: &str = "homepage";

const ATTACHMENT_OWNERS: &[&str] = &["containerContent", "content"];
const ATTACHMENT_VERSIONS: &[&str] = &["attachmentVersion", "version"];

/// Version number of a stored attachment record, if it carries one.
pub fn attachment_version(record: &PropertyRecord) -> Option<i64> {
    ATTACHMENT_VERSIONS.iter().find_map(|p| record.long(p))
}

/// Single-pass decoder from an object graph stream into a property store.
///
/// ```
/// use cxi_decode::ExportDecoder;
/// use cxi_store::{InMemoryPropertyStore, PropertyStore, RecordKey};
///
/// let xml = r#"<hibernate-generic>
///   <object class="Space" package="p"><id name="id">1</id><property name="key">DOC</property></object>
///   <object class="Page" package="p">
///     <id name="id">2</id>
///     <property name="space" class="Space" package="p"><id name="id">1</id></property>
///   </object>
/// </hibernate-generic>"#;
///
/// let store = InMemoryPropertyStore::new();
/// let index = ExportDecoder::new(&store).decode(xml.as_bytes()).unwrap();
/// assert_eq!(index.pages(1), &[2]);
/// assert_eq!(index.space_id("DOC"), Some(1));
/// assert!(store.is_sealed());
/// ```
pub struct ExportDecoder<'a> {
    store: &'a dyn PropertyStore,
    listener: &'a dyn ImportListener,
    ranges: Option<IdRangeList<i64>>,
    total_bytes: Option<u64>,
}

impl<'a> ExportDecoder<'a> {
    pub fn new(store: &'a dyn PropertyStore) -> Self {
        Self {
            store,
            listener: &NoopListener,
            ranges: None,
            total_bytes: None,
        }
    }

    pub fn with_listener(mut self, listener: &'a dyn ImportListener) -> Self {
        self.listener = listener;
        self
    }

    /// Keep only pages and blog posts admitted by `ranges`.
    pub fn with_id_ranges(mut self, ranges: IdRangeList<i64>) -> Self {
        self.ranges = Some(ranges);
        self
    }

    /// Size of the input, used to report progress.
    pub fn with_total_bytes(mut self, total: u64) -> Self {
        self.total_bytes = Some(total);
        self
    }

    /// Consume the whole input, then seal the store.
    pub fn decode<R: Read>(self, input: R) -> DecodeResult<ExportIndex> {
        let mut reader = ObjectReader::new(input);
        let mut pass = Pass {
            store: self.store,
            listener: self.listener,
            ranges: self.ranges,
            index: IndexBuilder::new(),
            members: HashMap::new(),
            progress: ProgressTracker::new(self.total_bytes),
        };

        while let Some(object) = reader.next_object()? {
            pass.handle(object)?;
            pass.progress.update(reader.bytes_read(), pass.listener);
        }
        pass.progress.finish(pass.listener);
        self.store.seal();

        let index = pass.index.finish();
        let stats = index.stats();
        info!(
            objects = stats.objects(),
            records = stats.records_written,
            rejected = stats.rejected_by_range,
            dropped = stats.dropped,
            bytes = reader.bytes_read(),
            "decoded export"
        );
        Ok(index)
    }
}

impl std::fmt::Debug for ExportDecoder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDecoder")
            .field("ranges", &self.ranges.as_ref().map(ToString::to_string))
            .field("total_bytes", &self.total_bytes)
            .finish()
    }
}

/// State owned by one decoding pass.
struct Pass<'a> {
    store: &'a dyn PropertyStore,
    listener: &'a dyn ImportListener,
    ranges: Option<IdRangeList<i64>>,
    index: IndexBuilder,
    /// Members appended to each group by membership objects so far.
    members: HashMap<i64, Vec<(&'static str, PropertyValue)>>,
    progress: ProgressTracker,
}

impl Pass<'_> {
    fn handle(&mut self, object: RawObject) -> DecodeResult<()> {
        self.index.stats_mut().count_object(&object.class);
        self.poll_cancel();

        let RawObject {
            class,
            id,
            properties: record,
        } = object;
        let kind = EntityKind::from_class(&class);
        let Some(id_text) = id else {
            if let EntityKind::Object(_) = kind {
                warn!(class = %class, "object without id, skipping");
                self.index.stats_mut().dropped += 1;
                return Ok(());
            }
            return Err(DecodeError::MissingId {
                class,
                property: "id".into(),
            });
        };

        let id = match EntityId::parse(kind.id_shape(), &id_text) {
            Ok(id) => id,
            Err(_) if matches!(kind, EntityKind::Object(_)) => {
                warn!(class = %class, id = %id_text, "object with unreadable id, skipping");
                self.index.stats_mut().dropped += 1;
                return Ok(());
            }
            Err(_) => {
                return Err(DecodeError::InvalidObjectId {
                    class,
                    text: id_text,
                })
            }
        };

        // Only user impls are keyed by name.
        match id {
            EntityId::Key(key) => self.put(RecordKey::UserImpl(key), &record),
            EntityId::Numeric(id) => self.handle_numeric(kind, id, record),
        }
    }

    fn handle_numeric(&mut self, kind: EntityKind, id: i64, mut record: PropertyRecord) -> DecodeResult<()> {
        match kind {
            EntityKind::Page | EntityKind::BlogPost => self.content(kind, id, &record),
            EntityKind::Space => self.space(id, &record),
            EntityKind::SpaceDescription => {
                record.set(HOMEPAGE, "true");
                self.put(RecordKey::Page(id), &record)
            }
            EntityKind::Attachment => {
                let owner = ATTACHMENT_OWNERS.iter().find_map(|p| record.long(p));
                match owner {
                    Some(page) => self.put(RecordKey::Attachment { page, attachment: id }, &record),
                    None => {
                        warn!(attachment = id, "attachment without owning content, dropping");
                        self.index.stats_mut().dropped += 1;
                        Ok(())
                    }
                }
            }
            EntityKind::InternalUser => self.put(RecordKey::InternalUser(id), &record),
            EntityKind::InternalGroup => {
                for (list, member) in self.members.get(&id).into_iter().flatten() {
                    record.append_to_list(list, member.clone());
                }
                self.put(RecordKey::Group(id), &record)
            }
            EntityKind::Membership => self.membership(id, &record),
            EntityKind::SpacePermission => match record.long("space") {
                Some(space) => self.put(RecordKey::SpacePermission { space, permission: id }, &record),
                None => {
                    debug!(permission = id, "global permission, not stored");
                    Ok(())
                }
            },
            EntityKind::ContentPermissionSet => self.put(RecordKey::ContentPermissionSet(id), &record),
            EntityKind::ContentPermission => match record.long("owningSet") {
                Some(set) => self.put(RecordKey::ContentPermission { set, permission: id }, &record),
                None => {
                    warn!(permission = id, "content permission without set, dropping");
                    self.index.stats_mut().dropped += 1;
                    Ok(())
                }
            },
            EntityKind::Object(_) => self.put(RecordKey::Object(id), &record),
            EntityKind::UserImpl => unreachable!("user impls are keyed by name"),
        }
    }

    fn content(&mut self, kind: EntityKind, id: i64, record: &PropertyRecord) -> DecodeResult<()> {
        if let Some(ranges) = self.ranges.as_mut() {
            if !ranges.push_id(&id) {
                trace!(id, kind = %kind, "outside id ranges");
                self.index.stats_mut().rejected_by_range += 1;
                return Ok(());
            }
        }
        self.put(RecordKey::Page(id), record)?;

        if record.contains(ORIGINAL_VERSION) {
            return Ok(());
        }
        match record.long("space") {
            Some(space) if kind == EntityKind::BlogPost => self.index.add_blog_post(space, id),
            Some(space) => self.index.add_page(space, id),
            None => debug!(id, kind = %kind, "current content without space, not indexed"),
        }
        Ok(())
    }

    fn space(&mut self, id: i64, record: &PropertyRecord) -> DecodeResult<()> {
        self.put(RecordKey::Space(id), record)?;
        let key = record.text("key");
        self.index.register_space(id, key);
        if let Some(key) = key {
            if self.listener.is_space_excluded(key) {
                debug!(space = id, key, "space excluded");
                self.index.exclude_space(id);
            }
        }
        Ok(())
    }

    /// Fold a membership link into its parent group record. The link is also
    /// remembered so a later copy of the group object keeps it.
    fn membership(&mut self, id: i64, record: &PropertyRecord) -> DecodeResult<()> {
        let Some(group) = record.long("parentGroup") else {
            warn!(membership = id, "membership without parent group, dropping");
            self.index.stats_mut().dropped += 1;
            return Ok(());
        };
        let user = record.get("userMember").cloned();
        let member_group = record.get("groupMember").cloned();
        if user.is_none() && member_group.is_none() {
            debug!(membership = id, group, "membership without member");
            return Ok(());
        }

        let appended = self.members.entry(group).or_default();
        appended.extend(user.clone().map(|u| ("users", u)));
        appended.extend(member_group.clone().map(|g| ("groups", g)));

        let key = RecordKey::Group(group);
        self.store.merge(&key, &mut |parent| {
            if let Some(user) = &user {
                parent.append_to_list("users", user.clone());
            }
            if let Some(member) = &member_group {
                parent.append_to_list("groups", member.clone());
            }
        })?;
        self.written(&key);
        Ok(())
    }

    fn put(&mut self, key: RecordKey, record: &PropertyRecord) -> DecodeResult<()> {
        self.store.put(&key, record)?;
        self.written(&key);
        Ok(())
    }

    fn written(&mut self, key: &RecordKey) {
        trace!(key = %key, "stored record");
        self.index.stats_mut().records_written += 1;
    }

    fn poll_cancel(&mut self) {
        if !self.index.is_cancelled() && self.listener.is_cancelled() {
            info!("cancel requested, finishing the pass");
            self.index.mark_cancelled();
        }
    }
}
