//! Shared fixtures for tests.

use crate::dom::mem::MemDocument;
use crate::dom::Rect;
use crate::model::{PageIdentity, PatchRecord};
use crate::overlay::{OverlayFill, OverlaySpec};
use crate::store::{MemBackend, PatchStore};

pub const PRICING_URL: &str = "https://shop.test/pricing?plan=pro";

/// A small pricing page: a heading, a plan list anchored by id, and a logo.
pub const PRICING_SNAPSHOT: &str = r#"{
    "tag": "body",
    "children": [
        { "tag": "h1", "children": ["Pricing"] },
        { "tag": "ul", "attrs": { "id": "plans" }, "children": [
            { "tag": "li", "children": ["Basic $10"] },
            { "tag": "li", "children": ["Pro $20"] }
        ] },
        { "tag": "img", "attrs": { "src": "logo.png" },
          "rect": { "x": 0.0, "y": 0.0, "width": 120.0, "height": 40.0 } }
    ]
}"#;

pub fn pricing_page() -> PageIdentity {
    PageIdentity::from(PRICING_URL)
}

pub fn pricing_doc() -> MemDocument {
    MemDocument::from_json(PRICING_SNAPSHOT).expect("fixture snapshot parses")
}

pub fn mem_store() -> PatchStore<MemBackend> {
    PatchStore::with_backend(MemBackend::new())
}

/// Store holding one edit of each kind for the pricing page.
pub fn seeded_store() -> PatchStore<MemBackend> {
    let store = mem_store();
    let page = pricing_page();
    let records = [
        PatchRecord::text(
            page.clone(),
            "body/h1[1]".parse().expect("fixture path"),
            "Plans",
            "Pricing",
        ),
        PatchRecord::text(
            page.clone(),
            "id(\"plans\")/li[2]".parse().expect("fixture path"),
            "Pro $15",
            "Pro $20",
        ),
        PatchRecord::image(
            page.clone(),
            "body/img[1]".parse().expect("fixture path"),
            "logo-dark.png",
            "logo.png",
        ),
        PatchRecord::overlay(
            page,
            OverlaySpec::new(Rect::new(10.0, 10.0, 80.0, 20.0), OverlayFill::Blur)
                .to_json()
                .expect("overlay spec serializes"),
        ),
    ];
    for record in records {
        store.upsert(record).expect("mem store accepts fixture");
    }
    store
}
