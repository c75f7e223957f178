//! Page-level PDF edits: geometry lookup, resource registration and
//! content stream injection

use crate::constants::{DEFAULT_PAGE_DIMENSIONS, SLICE_XOBJECT_PREFIX};
use crate::placement::Rect;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Guard against cyclic `Parent` chains in malformed files
const MAX_INHERITANCE_DEPTH: usize = 32;

// =============================================================================
// Page Geometry
// =============================================================================

/// Size and origin of every page, in page order
pub fn page_geometries(doc: &Document) -> Result<Vec<PageGeometry>> {
    doc.get_pages()
        .into_values()
        .map(|page_id| page_geometry(doc, page_id))
        .collect()
}

/// Page size from its (possibly inherited) MediaBox
pub fn page_geometry(doc: &Document, page_id: ObjectId) -> Result<PageGeometry> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")?
        .map(|obj| resolve(doc, obj))
        .transpose()?
        .and_then(|obj| obj.as_array().ok())
        .filter(|arr| arr.len() >= 4)
        .and_then(|arr| {
            let coords: Option<Vec<f32>> = arr[..4]
                .iter()
                .map(|obj| resolve(doc, obj).ok().and_then(extract_number))
                .collect();
            coords
        });

    match media_box {
        Some(c) => {
            let (x0, x1) = (c[0].min(c[2]), c[0].max(c[2]));
            let (y0, y1) = (c[1].min(c[3]), c[1].max(c[3]));
            Ok(PageGeometry::new(x1 - x0, y1 - y0).with_origin(x0, y0))
        }
        None => {
            log::warn!(
                "Page {:?} has no usable MediaBox, assuming US Letter",
                page_id
            );
            Ok(PageGeometry::new(
                DEFAULT_PAGE_DIMENSIONS.0,
                DEFAULT_PAGE_DIMENSIONS.1,
            ))
        }
    }
}

/// Look up a page attribute, walking up the page tree for inherited values
fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut node = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Ok(Some(value));
        }
        match node
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|parent| doc.get_dictionary(parent))
        {
            Ok(parent) => node = parent,
            Err(_) => break,
        }
    }
    Ok(None)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Register `image_id` in the page's `/Resources /XObject` dictionary under
/// a fresh name and return that name.
///
/// The resources and their XObject dictionary are copied onto the page as
/// direct objects, so inherited or shared dictionaries are never modified
/// and each page only lists its own slice.
pub(crate) fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
) -> Result<String> {
    let mut resources = page_resources(doc, page_id)?;

    let mut xobjects = match resources.get(b"XObject") {
        Ok(obj) => resolve(doc, obj)?.as_dict().cloned().unwrap_or_default(),
        Err(_) => Dictionary::new(),
    };

    let name = unused_name(&xobjects);
    xobjects.set(name.as_bytes(), Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));

    Ok(name)
}

/// A copy of the page's own or inherited resource dictionary
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let resources = inherited_attribute(doc, page_id, b"Resources")?
        .map(|obj| resolve(doc, obj))
        .transpose()?
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();
    Ok(resources)
}

fn unused_name(xobjects: &Dictionary) -> String {
    (0..)
        .map(|n| format!("{}{}", SLICE_XOBJECT_PREFIX, n))
        .find(|name| !xobjects.has(name.as_bytes()))
        .unwrap_or_else(|| SLICE_XOBJECT_PREFIX.to_string())
}

// =============================================================================
// Content Streams
// =============================================================================

/// Append a content stream drawing the named image into `rect`.
///
/// Existing content is wrapped in `q ... Q` so any graphics state it
/// leaves behind does not leak into the seal.
pub(crate) fn append_image_draw(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    rect: &Rect,
    geometry: &PageGeometry,
) -> Result<()> {
    let existing = existing_contents(doc, page_id)?;
    let draw = generate_draw_command(
        name,
        rect,
        geometry.origin_x_pt + rect.x,
        geometry.origin_y_pt + rect.y,
    );

    let mut contents = Vec::with_capacity(existing.len() + 2);
    let mut body = String::with_capacity(draw.len() + 3);
    if !existing.is_empty() {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        body.push_str("\nQ\n");
    }
    body.push_str(&draw);
    let draw_id = doc.add_object(Stream::new(Dictionary::new(), body.into_bytes()));
    contents.push(Object::Reference(draw_id));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Content stream command drawing the unit-square image `name` scaled to
/// `rect` with its lower-left corner at `(x, y)`
fn generate_draw_command(name: &str, rect: &Rect, x: f32, y: f32) -> String {
    format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        rect.width, rect.height, x, y, name
    )
}

/// The page's content stream references as a flat list
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc.get_dictionary(page_id)?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            // An indirect array of streams
            Object::Array(arr) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_name_skips_taken_names() {
        let mut xobjects = Dictionary::new();
        assert_eq!(unused_name(&xobjects), "SealSlice0");

        xobjects.set("SealSlice0", Object::Null);
        xobjects.set("SealSlice2", Object::Null);
        assert_eq!(unused_name(&xobjects), "SealSlice1");
    }

    #[test]
    fn test_draw_command() {
        let rect = Rect::new(500.0, -10.5, 112.0, 119.0);
        assert_eq!(
            generate_draw_command("SealSlice0", &rect, 510.0, 9.5),
            "q 112 0 0 119 510 9.5 cm /SealSlice0 Do Q\n"
        );
    }

    #[test]
    fn test_media_box_with_indirect_numbers() {
        let mut doc = Document::with_version("1.7");
        let width_id = doc.add_object(Object::Integer(595));
        let height_id = doc.add_object(Object::Real(842.0));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Reference(width_id),
                    Object::Reference(height_id),
                ]),
            ),
        ]));

        assert_eq!(
            page_geometry(&doc, page_id).unwrap(),
            PageGeometry::new(595.0, 842.0)
        );
    }

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number(&Object::Integer(612)), Some(612.0));
        assert_eq!(extract_number(&Object::Real(595.5)), Some(595.5));
        assert_eq!(extract_number(&Object::Null), None);
    }
}
