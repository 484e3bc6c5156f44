use crate::library::tags::parse_tags;
use crate::library::{Library, LibraryError};
use crate::ui::{blog, blog_done, UI};
use anyhow::{bail, Result};

pub fn tag(library: &Library, ck: &str, tags: &str) -> Result<()> {
    if !library.has_pdf(ck) {
        bail!(LibraryError::FileNotFound {
            ck: ck.to_string(),
            path: library.pdf_path(ck),
        });
    }

    let tags = parse_tags(tags);
    if tags.is_empty() {
        bail!("No tags given");
    }

    for tag in &tags {
        if library.tag(ck, tag)? {
            blog_done!("Tagged", "{} with {}", UI::style_ck(ck), UI::style_tags(&[tag]));
        } else {
            blog!("Unchanged", "{} already has {}", UI::style_ck(ck), UI::style_tags(&[tag]));
        }
    }
    Ok(())
}

/// Removes the given tags, or every tag when `tags` is `None`.
pub fn untag(library: &Library, ck: &str, tags: Option<&str>) -> Result<()> {
    match tags {
        None => {
            let removed = library.tags_of(ck)?;
            library.untag(ck, None)?;
            if removed.is_empty() {
                blog!("Unchanged", "{} has no tags", UI::style_ck(ck));
            } else {
                blog_done!("Untagged", "{} from {}", UI::style_ck(ck), UI::style_tags(&removed));
            }
        }
        Some(tags) => {
            for tag in parse_tags(tags) {
                if library.untag(ck, Some(&tag))? {
                    blog_done!("Untagged", "{} from {}", UI::style_ck(ck), UI::style_tags(&[&tag]));
                } else {
                    blog!("Unchanged", "{} was not tagged {}", UI::style_ck(ck), UI::style_tags(&[&tag]));
                }
            }
        }
    }
    Ok(())
}

pub fn tags(library: &Library) -> Result<()> {
    for tag in library.all_tags()? {
        println!("{}", tag);
    }
    Ok(())
}

pub fn untagged(library: &Library) -> Result<()> {
    let cks = library.untagged()?;
    for ck in &cks {
        println!("{}", UI::style_ck(ck));
    }
    blog!("Untagged", "{} papers", cks.len());
    Ok(())
}
