use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use cxi_store::{Cleanup, ExportIndex, FsPropertyStore, PropertyStore, RecordKey, Teardown, WorkDir};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::config::ImportConfig;
use crate::decoder::{attachment_version, ExportDecoder};
use crate::descriptor::ExportDescriptor;
use crate::error::{DecodeError, DecodeResult};
use crate::progress::{ExcludingListener, ImportListener};

/// Name of the store directory inside the working directory.
pub const STORE_DIR: &str = "store";
const EXPANDED_DIR: &str = "export";

/// A decoded export: its working directory, its sealed property store and
/// the index snapshot of the pass.
pub struct ExportPackage {
    work_dir: WorkDir,
    source: PathBuf,
    store: FsPropertyStore,
    index: ExportIndex,
    descriptor: Option<ExportDescriptor>,
}

impl ExportPackage {
    /// Expand `path` (a directory or a zip archive) if needed, decode its
    /// object graph into a fresh store and save the index next to it.
    pub fn open(
        path: &Path,
        config: &ImportConfig,
        listener: &dyn ImportListener,
    ) -> DecodeResult<Self> {
        let ranges = config.id_range_list()?;
        let work_dir = WorkDir::create(config.work_dir.as_deref())?;

        let source = if path.is_dir() {
            path.to_path_buf()
        } else {
            let target = work_dir.path().join(EXPANDED_DIR);
            expand_archive(path, &target)?;
            locate_root(&target, &config.entities_file)
        };

        let descriptor_path = source.join(&config.descriptor_file);
        let descriptor = if descriptor_path.is_file() {
            Some(ExportDescriptor::load(&descriptor_path)?)
        } else {
            debug!(path = %descriptor_path.display(), "no export descriptor");
            None
        };

        let entities = source.join(&config.entities_file);
        if !entities.is_file() {
            return Err(DecodeError::MissingEntities(entities));
        }
        let total = fs::metadata(&entities)?.len();

        let store = FsPropertyStore::create(&work_dir.path().join(STORE_DIR))?;
        let listener = ExcludingListener {
            inner: listener,
            keys: &config.excluded_spaces,
        };
        let mut decoder = ExportDecoder::new(&store)
            .with_listener(&listener)
            .with_total_bytes(total);
        if let Some(ranges) = ranges {
            decoder = decoder.with_id_ranges(ranges);
        }
        info!(path = %entities.display(), bytes = total, "decoding export");
        let index = decoder.decode(BufReader::new(File::open(&entities)?))?;
        index.save(store.root())?;

        Ok(Self {
            work_dir,
            source,
            store,
            index,
            descriptor,
        })
    }

    pub fn store(&self) -> &FsPropertyStore {
        &self.store
    }

    pub fn index(&self) -> &ExportIndex {
        &self.index
    }

    pub fn descriptor(&self) -> Option<&ExportDescriptor> {
        self.descriptor.as_ref()
    }

    /// Directory holding the (expanded) export files.
    pub fn source_dir(&self) -> &Path {
        &self.source
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Blob of an attachment version, falling back to version `1`.
    pub fn attachment_path(&self, page: i64, attachment: i64, version: Option<i64>) -> Option<PathBuf> {
        let dir = self
            .source
            .join("attachments")
            .join(page.to_string())
            .join(attachment.to_string());
        version
            .map(|v| dir.join(v.to_string()))
            .filter(|p| p.is_file())
            .or_else(|| Some(dir.join("1")).filter(|p| p.is_file()))
    }

    /// Blob of a stored attachment at the version its record declares.
    /// `None` when the attachment was not stored or no blob exists.
    pub fn attachment_blob(&self, page: i64, attachment: i64) -> DecodeResult<Option<PathBuf>> {
        let key = RecordKey::Attachment { page, attachment };
        let Some(record) = self.store.get(&key)? else {
            return Ok(None);
        };
        Ok(self.attachment_path(page, attachment, attachment_version(&record)))
    }

    /// Release the working directory.
    pub fn close(self, mode: Teardown) -> DecodeResult<Cleanup> {
        Ok(self.work_dir.close(mode)?)
    }
}

impl std::fmt::Debug for ExportPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPackage")
            .field("work_dir", &self.work_dir.path())
            .field("source", &self.source)
            .field("records_written", &self.index.stats().records_written)
            .finish()
    }
}

fn expand_archive(archive: &Path, target: &Path) -> DecodeResult<()> {
    let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
    debug!(archive = %archive.display(), entries = zip.len(), "expanding archive");
    zip.extract(target)?;
    Ok(())
}

/// Exports are sometimes zipped with a single top-level folder.
fn locate_root(expanded: &Path, entities_file: &str) -> PathBuf {
    if expanded.join(entities_file).is_file() {
        return expanded.to_path_buf();
    }
    let children: Vec<PathBuf> = fs::read_dir(expanded)
        .into_iter()
        .flatten()
        .flatten()
        .map(|e| e.path())
        .collect();
    match children.as_slice() {
        [only] if only.join(entities_file).is_file() => only.clone(),
        _ => expanded.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use crate::progress::NoopListener;

    const ENTITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hibernate-generic datetime="2024-01-01 00:00:00">
<object class="Space" package="p"><id name="id">1</id><property name="key"><![CDATA[DOC]]></property></object>
<object class="Space" package="p"><id name="id">2</id><property name="key"><![CDATA[OLD]]></property></object>
<object class="Page" package="p"><id name="id">10</id><property name="space" class="Space" package="p"><id name="id">1</id></property></object>
<object class="Attachment" package="p"><id name="id">50</id><property name="containerContent" class="Page" package="p"><id name="id">10</id></property><property name="version">2</property></object>
</hibernate-generic>
"#;

    const DESCRIPTOR: &str = "exportType=all\nbuildNumber=8703\n";

    fn write_export(dir: &Path) {
        fs::create_dir_all(dir.join("attachments/10/50")).unwrap();
        fs::write(dir.join("entities.xml"), ENTITIES).unwrap();
        fs::write(dir.join("exportDescriptor.properties"), DESCRIPTOR).unwrap();
        fs::write(dir.join("attachments/10/50/1"), b"v1").unwrap();
        fs::write(dir.join("attachments/10/50/2"), b"v2").unwrap();
    }

    fn write_zip(path: &Path, prefix: &str) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, data) in [
            ("entities.xml", ENTITIES.as_bytes()),
            ("exportDescriptor.properties", DESCRIPTOR.as_bytes()),
            ("attachments/10/50/1", b"v1".as_slice()),
        ] {
            zip.start_file(format!("{prefix}{name}"), options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn config(work: &Path) -> ImportConfig {
        ImportConfig {
            work_dir: Some(work.to_path_buf()),
            ..ImportConfig::default()
        }
    }

    #[test]
    fn open_directory_export() {
        let tmp = tempfile::tempdir().unwrap();
        let export = tmp.path().join("export");
        write_export(&export);

        let package = ExportPackage::open(&export, &config(&tmp.path().join("work")), &NoopListener).unwrap();
        assert_eq!(package.index().pages(1), &[10]);
        assert_eq!(package.descriptor().unwrap().export_type(), Some("all"));
        assert!(package.store().is_sealed());
        assert!(package.store().contains(&RecordKey::Attachment { page: 10, attachment: 50 }).unwrap());

        assert_eq!(package.attachment_path(10, 50, Some(2)), Some(export.join("attachments/10/50/2")));
        assert_eq!(package.attachment_path(10, 50, Some(7)), Some(export.join("attachments/10/50/1")));
        assert_eq!(package.attachment_path(10, 50, None), Some(export.join("attachments/10/50/1")));
        assert_eq!(package.attachment_path(10, 51, None), None);
        assert_eq!(
            package.attachment_blob(10, 50).unwrap(),
            Some(export.join("attachments/10/50/2"))
        );
        assert_eq!(package.attachment_blob(10, 51).unwrap(), None);

        let work = package.work_dir().to_path_buf();
        package.close(Teardown::Blocking).unwrap();
        assert!(!work.exists());
        assert!(export.join("entities.xml").is_file());
    }

    #[test]
    fn open_zip_export_and_reopen_store() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("export.zip");
        write_zip(&archive, "");

        let mut config = config(&tmp.path().join("work"));
        config.keep_work_dir = true;
        config.excluded_spaces = vec!["OLD".into()];
        let package = ExportPackage::open(&archive, &config, &NoopListener).unwrap();
        assert!(package.index().is_excluded(2));
        assert!(package.attachment_path(10, 50, None).is_some());

        let store_root = package.store().root().to_path_buf();
        let cleanup = package.close(config.teardown()).unwrap();
        assert!(matches!(cleanup, Cleanup::Kept(_)));

        let store = FsPropertyStore::open(&store_root).unwrap();
        let index = ExportIndex::load(&store_root).unwrap();
        assert_eq!(index.space_id("DOC"), Some(1));
        assert!(index.is_excluded(2));
        assert!(store.get(&RecordKey::Page(10)).unwrap().is_some());
        fs::remove_dir_all(store_root.parent().unwrap()).unwrap();
    }

    #[test]
    fn zip_with_top_level_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("export.zip");
        write_zip(&archive, "Confluence-export/");

        let package = ExportPackage::open(&archive, &config(tmp.path()), &NoopListener).unwrap();
        assert!(package.source_dir().ends_with("Confluence-export"));
        assert_eq!(package.index().pages(1), &[10]);
    }

    #[test]
    fn attachment_blob_prefers_attachment_version() {
        let tmp = tempfile::tempdir().unwrap();
        let export = tmp.path().join("export");
        fs::create_dir_all(export.join("attachments/10/60")).unwrap();
        fs::write(
            export.join("entities.xml"),
            r#"<hibernate-generic>
<object class="Attachment" package="p"><id name="id">60</id><property name="containerContent" class="Page" package="p"><id name="id">10</id></property><property name="attachmentVersion">3</property><property name="version">1</property></object>
</hibernate-generic>"#,
        )
        .unwrap();
        fs::write(export.join("attachments/10/60/1"), b"v1").unwrap();
        fs::write(export.join("attachments/10/60/3"), b"v3").unwrap();

        let package = ExportPackage::open(&export, &config(tmp.path()), &NoopListener).unwrap();
        assert_eq!(
            package.attachment_blob(10, 60).unwrap(),
            Some(export.join("attachments/10/60/3"))
        );
    }

    #[test]
    fn missing_entities_file() {
        let tmp = tempfile::tempdir().unwrap();
        let export = tmp.path().join("export");
        fs::create_dir_all(&export).unwrap();
        let err = ExportPackage::open(&export, &config(tmp.path()), &NoopListener).unwrap_err();
        assert!(matches!(err, DecodeError::MissingEntities(_)));
    }

    #[test]
    fn not_a_zip() {
        let tmp = tempfile::tempdir().unwrap();
        let bogus = tmp.path().join("export.zip");
        fs::write(&bogus, b"definitely not a zip").unwrap();
        let err = ExportPackage::open(&bogus, &config(tmp.path()), &NoopListener).unwrap_err();
        assert!(matches!(err, DecodeError::Zip(_)));
    }

    #[test]
    fn id_ranges_from_config() {
        let tmp = tempfile::tempdir().unwrap();
        let export = tmp.path().join("export");
        write_export(&export);
        let mut config = config(&tmp.path().join("work"));
        config.id_ranges = Some("[99]".into());
        let package = ExportPackage::open(&export, &config, &NoopListener).unwrap();
        assert!(package.index().pages(1).is_empty());
        assert_eq!(package.index().stats().rejected_by_range, 1);
    }
}
