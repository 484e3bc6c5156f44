use super::{list_cks, Library, LibraryError};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::symlink;
use std::path::{Component, Path};
use tracing::trace;

/// Splits a user-typed tag list (`"crypto/snarks, reading"`) into tags.
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_matches('/').to_string())
        .collect()
}

fn validate_tag(tag: &str) -> Result<&str, LibraryError> {
    let path = Path::new(tag);
    let plain = !tag.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(name) if !name.to_string_lossy().starts_with(".git")));
    if plain {
        Ok(tag)
    } else {
        Err(LibraryError::InvalidTag(tag.to_string()))
    }
}

impl Library {
    /// Links `<tag_dir>/<tag>/<ck>.pdf` to the paper's PDF. Returns `false`
    /// when the paper already had that tag.
    pub fn tag(&self, ck: &str, tag: &str) -> Result<bool, LibraryError> {
        let tag_dir = self.tag_dir.join(validate_tag(tag)?);
        fs::create_dir_all(&tag_dir)?;

        let pdf_name = format!("{}.pdf", ck);
        match symlink(self.pdf_path(ck), tag_dir.join(&pdf_name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes one tag from the paper, or all of them when `tag` is `None`.
    /// Returns whether anything was removed.
    pub fn untag(&self, ck: &str, tag: Option<&str>) -> Result<bool, LibraryError> {
        let pdf_name = format!("{}.pdf", ck);

        match tag {
            Some(tag) => {
                let link = self.tag_dir.join(validate_tag(tag)?).join(&pdf_name);
                // symlink_metadata also sees dangling links
                if fs::symlink_metadata(&link).is_ok() {
                    fs::remove_file(&link)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            None => {
                let tags = self.tags_of(ck)?;
                for tag in &tags {
                    fs::remove_file(self.tag_dir.join(tag).join(&pdf_name))?;
                }
                Ok(!tags.is_empty())
            }
        }
    }

    /// Maps every tagged citation key to its tags.
    pub fn tagged(&self) -> Result<BTreeMap<String, Vec<String>>, LibraryError> {
        let mut tagged = BTreeMap::new();
        if self.tag_dir.is_dir() {
            self.collect_tagged(&self.tag_dir, &mut tagged)?;
        }
        Ok(tagged)
    }

    fn collect_tagged(
        &self,
        dir: &Path,
        tagged: &mut BTreeMap<String, Vec<String>>,
    ) -> Result<(), LibraryError> {
        for dir_entry in fs::read_dir(dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            let file_type = dir_entry.file_type()?;

            if file_type.is_dir() {
                self.collect_tagged(&path, tagged)?;
                continue;
            }
            if !file_type.is_symlink() {
                continue;
            }

            let is_pdf = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            let (Some(ck), Ok(tag)) = (
                path.file_stem().and_then(|s| s.to_str()),
                dir.strip_prefix(&self.tag_dir),
            ) else {
                continue;
            };

            if is_pdf {
                trace!(ck, tag = %tag.display(), "found tagged PDF");
                tagged
                    .entry(ck.to_string())
                    .or_insert_with(Vec::new)
                    .push(tag.to_string_lossy().into_owned());
            }
        }
        Ok(())
    }

    pub fn tags_of(&self, ck: &str) -> Result<Vec<String>, LibraryError> {
        let mut tags = self.tagged()?.remove(ck).unwrap_or_default();
        tags.sort();
        Ok(tags)
    }

    /// Every tag, including intermediate ones (`crypto` for `crypto/snarks`).
    pub fn all_tags(&self) -> Result<Vec<String>, LibraryError> {
        let mut tags = Vec::new();
        if self.tag_dir.is_dir() {
            collect_tags(&self.tag_dir, "", &mut tags)?;
        }
        tags.sort();
        Ok(tags)
    }

    /// Keys tagged with `tag`; with `recursive`, also keys that only carry a
    /// sub-tag of it.
    pub fn cks_tagged(&self, tag: &str, recursive: bool) -> Result<Vec<String>, LibraryError> {
        let dir = self.tag_dir.join(validate_tag(tag)?);
        if !dir.is_dir() {
            return Err(LibraryError::UnknownTag(tag.to_string()));
        }
        list_cks(&dir, recursive)
    }

    /// Keys with a PDF but no tag.
    pub fn untagged(&self) -> Result<Vec<String>, LibraryError> {
        let tagged = self.tagged()?;
        Ok(self
            .list_cks()?
            .into_iter()
            .filter(|ck| self.has_pdf(ck) && !tagged.contains_key(ck))
            .collect())
    }
}

fn collect_tags(dir: &Path, prefix: &str, tags: &mut Vec<String>) -> Result<(), LibraryError> {
    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_dir() {
            continue;
        }
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(".git") {
            continue;
        }

        let tag = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        collect_tags(&dir_entry.path(), &tag, tags)?;
        tags.push(tag);
    }
    Ok(())
}
