//! In-memory PDFs for tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Base MediaBox width; page `n` (1-based) is `BASE_WIDTH + n` points wide so tests can tell
/// pages apart after editing.
pub(crate) const BASE_WIDTH: i64 = 600;

/// Build a PDF with one page per entry, each page showing its text in Courier.
pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = pages
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let width = BASE_WIDTH + index as i64 + 1;
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), 842.into()],
            });
            page_id.into()
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save pdf");
    buffer
}

/// Original 1-based page numbers of the pages remaining in `pdf`, in document order.
pub(crate) fn original_page_numbers(pdf: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(pdf).expect("load pdf");
    doc.get_pages()
        .values()
        .map(|page_id| media_box_width(&doc, *page_id) - BASE_WIDTH)
        .collect()
}

fn media_box_width(doc: &Document, page_id: ObjectId) -> i64 {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .expect("page dictionary");
    let media_box = page
        .get(b"MediaBox")
        .and_then(Object::as_array)
        .expect("media box");
    media_box[2].as_i64().expect("width")
}
